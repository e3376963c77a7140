mod window;

pub use self::window::Neighborhoods;

use crate::volume::window_radius;
use crate::{Error, Result, Rule, Volume};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Side of the default cubic neighborhood
pub const DEFAULT_WINDOW: usize = 3;

/// A display color, passed through the engine untouched
pub type Color = [f64; 3];
/// Identity to color mapping owned by whoever initialized the volume
pub type ColorTable = BTreeMap<i32, Color>;

/// The full history of a run
#[derive(Debug, Clone, PartialEq)]
pub struct Evolution {
    /// `steps + 1` volumes, the first being the initial volume
    pub volumes: Vec<Volume>,
    pub colors: ColorTable,
}

/// Generator for the draws attributed to one cell in one step
///
/// Every cell gets its own ChaCha stream of the step seed, so the outcome does
/// not depend on the order cells are evaluated in.
fn cell_rng(step_seed: u64, index: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(step_seed);
    rng.set_stream(index as u64);
    rng
}

/// Drives a [`Rule`] over whole volumes, one synchronous step at a time
#[derive(Debug, Clone)]
pub struct Evolver {
    rule: Rule,
    window: usize,
    parallel: bool,
    rng: ChaCha8Rng,
}

impl Evolver {
    /// Creates an evolver seeded from the thread-local generator
    pub fn new(rule: Rule) -> Self {
        Self::from_rng(rule, ChaCha8Rng::from_rng(&mut rand::rng()))
    }

    /// Creates an evolver whose runs are reproducible for a given `seed`
    pub fn seeded(rule: Rule, seed: u64) -> Self {
        Self::from_rng(rule, ChaCha8Rng::seed_from_u64(seed))
    }

    fn from_rng(rule: Rule, rng: ChaCha8Rng) -> Self {
        Self {
            rule,
            window: DEFAULT_WINDOW,
            parallel: false,
            rng,
        }
    }

    /// Sets the neighborhood window side, validated when a step runs
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Evaluates the cells of each step on the rayon thread pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[inline]
    pub fn rule(&self) -> &Rule {
        &self.rule
    }
    #[inline]
    pub fn window(&self) -> usize {
        self.window
    }

    fn validate(&self) -> Result<()> {
        window_radius(self.window)?;
        self.rule.check_window(self.window)
    }

    fn validate_steps(&self, steps: i64) -> Result<usize> {
        self.validate()?;
        usize::try_from(steps)
            .map_err(|_| Error::config(format!("step count must be non-negative, got {steps}")))
    }

    fn next_state(&self, vector: &[i32], step_seed: u64, index: usize) -> Result<i32> {
        let center = vector[vector.len() / 2];
        // environment cells keep their marker under every rule
        if center < 0 {
            return Ok(center);
        }
        let next = self.rule.evaluate(vector, &mut cell_rng(step_seed, index))?;
        if next < 0 {
            return Err(Error::evaluation(format!(
                "rule produced environment marker {next} for a non-environment cell"
            )));
        }
        Ok(next)
    }

    fn apply(&self, volume: &Volume, step_seed: u64) -> Result<Vec<i32>> {
        if !self.parallel {
            return volume
                .neighborhoods(self.window)?
                .enumerate()
                .map(|(i, (_, vector))| self.next_state(&vector, step_seed, i))
                .collect();
        }

        // every cell reads the previous volume and writes only its own slot
        let shape = volume.shape();
        (0..shape.len())
            .into_par_iter()
            .map_init(
                || Vec::with_capacity(self.window.pow(3)),
                |buf, i| {
                    volume.neighborhood_into(shape.pos_of(i), self.window, buf);
                    self.next_state(buf, step_seed, i)
                },
            )
            .collect()
    }

    /// Computes the volume following `volume`
    ///
    /// All cells are evaluated against `volume`, none sees another cell's new
    /// state. `volume` itself is left untouched.
    pub fn step(&mut self, volume: &Volume) -> Result<Volume> {
        self.validate()?;
        let step_seed: u64 = self.rng.random();
        let cells = self.apply(volume, step_seed)?;
        Volume::from_cells(volume.shape(), cells)
    }

    fn logged_step(&mut self, volume: &Volume, step: usize) -> Result<Volume> {
        match self.step(volume) {
            Ok(next) => {
                debug!(step, live = next.live_count(), "step complete");
                Ok(next)
            }
            Err(Error::RuleEvaluationFailure(reason)) => {
                warn!(step, %reason, "step failed");
                Err(Error::evaluation(format!("step {step}: {reason}")))
            }
            Err(e) => Err(e),
        }
    }

    /// Runs `steps` steps and returns every volume, see [`Evolver::evolve_with`]
    pub fn evolve(&mut self, initial: &Volume, steps: i64, colors: ColorTable) -> Result<Evolution> {
        self.evolve_with(initial, steps, colors, |_, _, _| {})
    }

    /// Runs `steps` steps, keeping the whole history
    ///
    /// `hook` sees each new volume with its step index (starting at 1) and the
    /// color table, which is returned unchanged. A negative `steps` fails
    /// before anything is computed.
    pub fn evolve_with<F>(
        &mut self,
        initial: &Volume,
        steps: i64,
        colors: ColorTable,
        mut hook: F,
    ) -> Result<Evolution>
    where
        F: FnMut(&Volume, usize, &ColorTable),
    {
        let steps = self.validate_steps(steps)?;
        let shape = initial.shape();
        info!(
            rule = %self.rule.name(),
            steps,
            x = shape.x,
            y = shape.y,
            z = shape.z,
            "evolving volume"
        );

        let mut volumes = Vec::with_capacity(steps + 1);
        volumes.push(initial.clone());
        for step in 1..=steps {
            let next = self.logged_step(&volumes[step - 1], step)?;
            hook(&next, step, &colors);
            volumes.push(next);
        }

        info!(live = volumes[steps].live_count(), "evolution finished");
        Ok(Evolution { volumes, colors })
    }

    /// Runs `steps` steps holding only the current volume in memory
    ///
    /// History is only observable through `hook`. Returns the last volume and
    /// the unchanged color table.
    pub fn run_with<F>(
        &mut self,
        initial: &Volume,
        steps: i64,
        colors: ColorTable,
        mut hook: F,
    ) -> Result<(Volume, ColorTable)>
    where
        F: FnMut(&Volume, usize, &ColorTable),
    {
        let steps = self.validate_steps(steps)?;
        info!(rule = %self.rule.name(), steps, "running volume");

        let mut current = initial.clone();
        for step in 1..=steps {
            current = self.logged_step(&current, step)?;
            hook(&current, step, &colors);
        }
        Ok((current, colors))
    }

    /// An open-ended sequence of volumes following `initial`
    ///
    /// The caller may stop pulling at any point; every yielded volume is
    /// complete. The sequence ends after the first error.
    pub fn steps(&mut self, initial: Volume) -> Steps<'_> {
        Steps {
            evolver: self,
            current: Some(initial),
            step: 0,
        }
    }
}

/// Iterator returned by [`Evolver::steps`]
pub struct Steps<'a> {
    evolver: &'a mut Evolver,
    current: Option<Volume>,
    step: usize,
}

impl Iterator for Steps<'_> {
    type Item = Result<Volume>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        self.step += 1;
        let next = self.evolver.logged_step(&current, self.step);
        if let Ok(volume) = &next {
            self.current = Some(volume.clone());
        }
        Some(next)
    }
}

/// One-shot evolution with an entropy-seeded [`Evolver`] and the default window
pub fn evolve(
    initial: &Volume,
    rule: Rule,
    steps: i64,
    colors: ColorTable,
) -> Result<Evolution> {
    Evolver::new(rule).evolve(initial, steps, colors)
}
