use std::{error::Error, thread};

mod console;
mod options;
mod stats;

use cgol3d::rule::DEFAULT_ENV_ID;
use cgol3d::{ColorTable, Evolver, Rule, RunLengthEncoded, Volume, VolumeCodec};
use rand::Rng;
use stats::{Recorder, Sample, SwitchRecorder};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Loads the initial volume, its colors and any rule named in the input file
fn args_to_volume<R: Rng>(
    args: &options::Args,
    rng: &mut R,
) -> Result<(Volume, ColorTable, Option<String>), Box<dyn Error>> {
    if let Some(file_name) = args.input_file() {
        let encoded_str = std::fs::read_to_string(file_name)?;
        let (volume, rule) = RunLengthEncoded::parse(&encoded_str)?;

        // files carry no colors, so give every identity a fresh one
        let mut colors = ColorTable::new();
        for id in volume.identities() {
            colors.insert(id, [rng.random(), rng.random(), rng.random()]);
        }
        if volume.environment_count() > 0 {
            colors.insert(DEFAULT_ENV_ID, options::ENVIRONMENT_COLOR);
        }
        return Ok((volume, colors, rule));
    }

    let (volume, colors) =
        args.fill_mode()
            .create_volume(args.grid_size(), &args.fill_params(), rng)?;
    Ok((volume, colors, None))
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let Some(args) = options::Args::from_env() else {
        return Ok(());
    };

    let seed = args.seed();
    let mut rng = options::init_rng(seed);
    let (initial, colors, header_rule) = args_to_volume(&args, &mut rng)?;
    let rule = args.rule(header_rule.as_deref(), &mut rng)?;
    info!(seed, live = initial.live_count(), rule = %rule.name(), "initialized volume");

    let mut evolver = Evolver::seeded(rule, seed)
        .with_window(args.window())
        .with_parallel(args.multithreading());
    let mut stats = SwitchRecorder::new(Sample::of(&initial), args.stats_file().is_some());
    let sleep = args.sleep();
    let gens = args.generations();

    let last = if args.console() {
        let mut console = console::ConsoleRender::new(initial.shape().z as i32 / 2)?;
        console.render(&initial)?;

        let mut last = initial.clone();
        'generations: for next in evolver.steps(initial).take(gens) {
            while let Some(cmd) = console.poll_events()? {
                match cmd {
                    console::ConsoleCommand::Exit => break 'generations,
                    console::ConsoleCommand::Handled => {}
                }
            }

            last = next?;
            stats.record(Sample::of(&last));
            if stats.has_report() {
                console.set_report(stats.report());
            }
            console.render(&last)?;
            if let Some(time) = sleep {
                thread::sleep(time);
            }
        }
        last
    } else {
        let (last, _colors) = evolver.run_with(&initial, gens as i64, colors, |volume, _, _| {
            stats.record(Sample::of(volume));
            if stats.has_report() {
                println!("{}", stats.report());
            }
            if let Some(time) = sleep {
                thread::sleep(time);
            }
        })?;
        last
    };

    if let Some(file_name) = args.stats_file() {
        stats.save(file_name)?;
    }

    if let Some(file_name) = args.output_file() {
        let mut encoder = RunLengthEncoded::default().set_name("cgol3d generated volume");
        if let Rule::GeneralizedLife(rule) = evolver.rule() {
            encoder = encoder.set_rule(rule.rulestring());
        }
        std::fs::write(file_name, encoder.encode(&last))?;
    }

    Ok(())
}
