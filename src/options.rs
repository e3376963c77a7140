use std::time::Duration;

use cgol3d::rule::{Codebook, CodebookRule, DEFAULT_ENV_ID, Fallback, GeneralizedLifeRule};
use cgol3d::{ColorTable, Pos3, Rule, Shape, Volume};
use rand::{Rng, RngCore, SeedableRng, rngs::StdRng};

/// Color of environment cells
pub const ENVIRONMENT_COLOR: cgol3d::Color = [0.5, 0.5, 0.5];

pub struct Args {
    matches: getopts::Matches,
}

impl Args {
    fn new<T: AsRef<str>>(args: &[T]) -> Option<Self> {
        let mut opts = getopts::Options::new();
        opts.optflag("", "help", "print this help menu");
        opts.optflag("c", "console", "run in console mode");
        opts.optflag("t", "threads", "enables multi-threading");
        opts.optopt("o", "output", "output file", "FILE");
        opts.optopt("i", "input", "input file", "FILE");
        opts.optopt("w", "width", "set grid width (x)", "WIDTH");
        opts.optopt("h", "height", "set grid height (y)", "HEIGHT");
        opts.optopt("d", "depth", "set grid depth (z)", "DEPTH");
        opts.optopt("f", "fill", "set fill type", "random|clusters|empty");
        opts.optopt("", "density", "probability of a filled cell being alive", "P");
        opts.optopt("", "clusters", "number of seeded clusters", "COUNT");
        opts.optopt("", "radius", "radius of seeded clusters", "CELLS");
        opts.optopt("e", "environment", "probability of a dead cell being environment", "P");
        opts.optopt("r", "rule", "rule family", "life|codebook");
        opts.optopt("b", "rulestring", "birth/survival counts", "B3/S23");
        opts.optopt("", "fallback", "codebook fallback", "random|nearest");
        opts.optopt("", "codebook-rules", "number of random codebook entries", "COUNT");
        opts.optopt("", "window", "neighborhood window side", "SIZE");
        opts.optopt("", "seed", "seed for initialization and rules", "SEED");
        opts.optopt(
            "s",
            "sleep",
            "the amount of time to sleep between generations",
            "MILLIS",
        );
        opts.optopt("g", "gens", "max number of generations", "COUNT");
        opts.optopt("", "stats", "write stats csv to file", "FILE");

        let matches = opts.parse(args.iter().map(T::as_ref)).unwrap();
        if matches.opt_present("help") {
            println!("{}", opts.usage("usage: cgol3d [options]"));
            None
        } else {
            Some(Self { matches })
        }
    }
    pub fn from_env() -> Option<Self> {
        let env = std::env::args().collect::<Vec<_>>();
        Self::new(&env[1..])
    }

    fn opt_or<T: std::str::FromStr>(&self, name: &str, default: T) -> T
    where
        T::Err: std::fmt::Debug,
    {
        self.matches.opt_get(name).unwrap().unwrap_or(default)
    }

    pub fn console(&self) -> bool {
        self.matches.opt_present("console")
    }
    pub fn multithreading(&self) -> bool {
        self.matches.opt_present("threads")
    }

    pub fn generations(&self) -> usize {
        self.opt_or("gens", 100)
    }
    pub fn sleep(&self) -> Option<Duration> {
        match self.matches.opt_get("sleep").unwrap() {
            Some(millis) => Some(Duration::from_millis(millis)),
            None if self.console() => Some(Duration::from_millis(100)),
            None => None,
        }
    }

    pub fn grid_size(&self) -> Shape {
        Shape::new(
            self.opt_or("width", 32),
            self.opt_or("height", 32),
            self.opt_or("depth", 32),
        )
    }
    pub fn window(&self) -> usize {
        self.opt_or("window", cgol3d::engine::DEFAULT_WINDOW)
    }
    pub fn seed(&self) -> u64 {
        self.matches
            .opt_get("seed")
            .unwrap()
            .unwrap_or_else(|| rand::rng().next_u64())
    }

    pub fn fill_mode(&self) -> FillMode {
        let mode_str = self.matches.opt_str("fill");
        FillMode::new(mode_str.as_deref().unwrap_or("clusters")).expect("valid fill mode string")
    }
    pub fn fill_params(&self) -> FillParams {
        let defaults = FillParams::default();
        FillParams {
            density: self.opt_or("density", defaults.density).clamp(0.0, 1.0),
            clusters: self.opt_or("clusters", defaults.clusters),
            radius: self.opt_or("radius", defaults.radius),
            environment: self.opt_or("environment", defaults.environment).clamp(0.0, 1.0),
        }
    }

    /// Builds the rule, falling back to `header_rule` for the rulestring
    pub fn rule<R: Rng + ?Sized>(
        &self,
        header_rule: Option<&str>,
        rng: &mut R,
    ) -> cgol3d::Result<Rule> {
        match self.matches.opt_str("rule").as_deref().unwrap_or("life") {
            "life" => {
                let rulestring = self
                    .matches
                    .opt_str("rulestring")
                    .or(header_rule.map(str::to_owned));
                let rule = match rulestring {
                    Some(s) => GeneralizedLifeRule::from_rulestring(&s, DEFAULT_ENV_ID)?,
                    None => GeneralizedLifeRule::conway(),
                };
                Ok(rule.into())
            }
            "codebook" => {
                let fallback: Fallback = self
                    .matches
                    .opt_str("fallback")
                    .as_deref()
                    .unwrap_or("random")
                    .parse()?;
                let codebook = Codebook::random(self.opt_or("codebook-rules", 5), self.window(), rng)?;
                Ok(CodebookRule::new(codebook, fallback)?.into())
            }
            other => Err(cgol3d::Error::InvalidConfiguration(format!(
                "unknown rule family {other:?}"
            ))),
        }
    }

    pub fn output_file(&self) -> Option<String> {
        self.matches.opt_str("output")
    }
    pub fn input_file(&self) -> Option<String> {
        self.matches.opt_str("input")
    }

    pub fn stats_file(&self) -> Option<String> {
        self.matches.opt_str("stats")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillParams {
    pub density: f64,
    pub clusters: usize,
    pub radius: usize,
    pub environment: f64,
}
impl Default for FillParams {
    fn default() -> Self {
        Self {
            density: 0.5,
            clusters: 5,
            radius: 3,
            environment: 0.0,
        }
    }
}

pub enum FillMode {
    Random,
    Clusters,
    Empty,
}
impl FillMode {
    fn new<S: AsRef<str>>(s: S) -> Option<Self> {
        match s.as_ref() {
            "random" => Some(Self::Random),
            "clusters" => Some(Self::Clusters),
            "empty" => Some(Self::Empty),
            _ => None,
        }
    }

    fn random_color<R: Rng + ?Sized>(rng: &mut R) -> cgol3d::Color {
        [rng.random(), rng.random(), rng.random()]
    }

    /// Fills a sphere around a random center with identity `id` at `density`
    fn seed_cluster<R: Rng + ?Sized>(volume: &mut Volume, id: i32, params: &FillParams, rng: &mut R) {
        let shape = volume.shape();
        let r = params.radius;
        let mut axis = |len: usize| {
            // keep the sphere inside the volume when it fits
            let c = if len > 2 * r {
                rng.random_range(r..len - r)
            } else {
                rng.random_range(0..len.max(1))
            };
            c as i32
        };
        let center = Pos3::new(axis(shape.x), axis(shape.y), axis(shape.z));

        let r2 = (r * r) as i32;
        for pos in shape.positions() {
            let d = pos - center;
            if d.x * d.x + d.y * d.y + d.z * d.z <= r2 && rng.random_bool(params.density) {
                volume.set(pos, id);
            }
        }
    }

    pub fn create_volume<R: Rng + ?Sized>(
        &self,
        shape: Shape,
        params: &FillParams,
        rng: &mut R,
    ) -> cgol3d::Result<(Volume, ColorTable)> {
        let mut volume = Volume::zeros(shape)?;
        let mut colors = ColorTable::new();
        match self {
            Self::Random => {
                for pos in shape.positions() {
                    if rng.random_bool(params.density) {
                        volume.set(pos, 1);
                    }
                }
                colors.insert(1, Self::random_color(rng));
            }
            Self::Clusters if !shape.is_empty() => {
                for id in 1..=params.clusters as i32 {
                    Self::seed_cluster(&mut volume, id, params, rng);
                    colors.insert(id, Self::random_color(rng));
                }
            }
            Self::Clusters | Self::Empty => {}
        }

        if params.environment > 0.0 {
            for pos in shape.positions() {
                if volume.get(pos) == Some(0) && rng.random_bool(params.environment) {
                    volume.set(pos, DEFAULT_ENV_ID);
                }
            }
            colors.insert(DEFAULT_ENV_ID, ENVIRONMENT_COLOR);
        }
        Ok((volume, colors))
    }
}

/// Random generator for initialization, seeded for reproducible runs
pub fn init_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
