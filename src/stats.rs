use cgol3d::Volume;
use std::time::Instant;

/// Cell counts of one volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sample {
    pub live: usize,
    pub environment: usize,
    pub clusters: usize,
}
impl Sample {
    pub fn of(volume: &Volume) -> Self {
        Self {
            live: volume.live_count(),
            environment: volume.environment_count(),
            clusters: volume.identities().len(),
        }
    }
}

pub trait Recorder {
    type Str: AsRef<str>;

    fn record(&mut self, sample: Sample);

    fn has_report(&self) -> bool;
    fn report(&mut self) -> Self::Str;
}

pub struct SimpleRecord {
    steps: usize,
    last_sample: Sample,
    steps_in_report: usize,
    last_report: Instant,
}
impl SimpleRecord {
    pub fn new(sample: Sample) -> Self {
        Self {
            steps: 0,
            last_sample: sample,
            steps_in_report: 0,
            last_report: Instant::now(),
        }
    }
}
impl Recorder for SimpleRecord {
    type Str = String;

    fn record(&mut self, sample: Sample) {
        self.steps += 1;
        self.steps_in_report += 1;
        self.last_sample = sample;
    }

    fn has_report(&self) -> bool {
        self.last_report.elapsed().as_millis() >= 500
    }
    fn report(&mut self) -> Self::Str {
        let steps_per_sec = self.steps_in_report as f64 / self.last_report.elapsed().as_secs_f64();
        // reset stats for next report
        self.last_report = Instant::now();
        self.steps_in_report = 0;

        format!(
            "{:.02}step/s steps:{}, live:{}, clusters:{}",
            steps_per_sec, self.steps, self.last_sample.live, self.last_sample.clusters
        )
    }
}

pub struct CsvRecord {
    inner: SimpleRecord,
    data: Vec<(u128, Sample)>,
    last: Instant,
}
impl CsvRecord {
    pub fn new(sample: Sample) -> Self {
        Self {
            inner: SimpleRecord::new(sample),
            data: vec![(0, sample)],
            last: Instant::now(),
        }
    }

    fn write_to<W: std::io::Write>(&self, mut out: W) -> std::io::Result<()> {
        out.write_all(b"step,delta_t,live,environment,clusters\n")?;
        for (i, (delta, s)) in self.data.iter().enumerate() {
            let line = format!("{},{},{},{},{}\n", i, delta, s.live, s.environment, s.clusters);
            out.write_all(line.as_bytes())?;
        }
        out.flush()
    }

    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_to(std::io::BufWriter::new(file))
    }
}
impl Recorder for CsvRecord {
    type Str = <SimpleRecord as Recorder>::Str;

    fn record(&mut self, sample: Sample) {
        let delta = self.last.elapsed().as_micros();
        self.last = Instant::now();

        self.data.push((delta, sample));
        self.inner.record(sample);
    }

    fn has_report(&self) -> bool {
        self.inner.has_report()
    }
    fn report(&mut self) -> Self::Str {
        self.inner.report()
    }
}

pub enum SwitchRecorder {
    Csv(CsvRecord),
    Simple(SimpleRecord),
}
impl SwitchRecorder {
    pub fn new(sample: Sample, csv: bool) -> Self {
        if csv {
            Self::Csv(CsvRecord::new(sample))
        } else {
            Self::Simple(SimpleRecord::new(sample))
        }
    }
    /// Writes the CSV history, a no-op unless this is a [`CsvRecord`]
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> std::io::Result<()> {
        match self {
            Self::Csv(r) => r.save(path),
            Self::Simple(_) => Ok(()),
        }
    }
}
impl Recorder for SwitchRecorder {
    type Str = String;

    fn record(&mut self, sample: Sample) {
        match self {
            Self::Csv(r) => r.record(sample),
            Self::Simple(r) => r.record(sample),
        }
    }
    fn has_report(&self) -> bool {
        match self {
            Self::Csv(r) => r.has_report(),
            Self::Simple(r) => r.has_report(),
        }
    }
    fn report(&mut self) -> Self::Str {
        match self {
            Self::Csv(r) => r.report(),
            Self::Simple(r) => r.report(),
        }
    }
}
