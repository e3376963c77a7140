//! Exact-pattern lookup rule with a configurable fallback.

use super::index::{MAX_PATTERN_LEN, PatternKey};
use crate::volume::window_radius;
use crate::{Error, Result};
use indexmap::IndexMap;
use rand::Rng;
use std::str::FromStr;

/// The states a codebook rule can produce on its own
pub const ALPHABET: [i32; 2] = [0, 1];

/// A table mapping exact neighborhood patterns to a next state
///
/// Keys keep their insertion order; re-inserting a pattern replaces its state
/// but not its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Codebook {
    size: usize,
    entries: IndexMap<PatternKey, i32>,
}

impl Codebook {
    /// Creates an empty codebook for windows of side `size`
    pub fn new(size: usize) -> Result<Self> {
        window_radius(size)?;
        if size.pow(3) > MAX_PATTERN_LEN {
            return Err(Error::config(format!(
                "codebook window {size} exceeds {MAX_PATTERN_LEN} cells"
            )));
        }
        Ok(Self {
            size,
            entries: IndexMap::new(),
        })
    }

    /// Builds `num_rules` random binary patterns, each mapped to a random state
    ///
    /// Patterns drawn twice keep the later state.
    pub fn random<R: Rng + ?Sized>(num_rules: usize, size: usize, rng: &mut R) -> Result<Self> {
        let mut codebook = Self::new(size)?;
        let mut pattern = vec![0; codebook.pattern_len()];
        for _ in 0..num_rules {
            pattern.iter_mut().for_each(|v| *v = random_state(rng));
            let state = random_state(rng);
            codebook.insert(&pattern, state)?;
        }
        Ok(codebook)
    }

    /// Side length of the window this codebook is keyed on
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }
    /// Number of entries in every key
    #[inline]
    pub fn pattern_len(&self) -> usize {
        self.size.pow(3)
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn key(&self, vector: &[i32]) -> Option<PatternKey> {
        if vector.len() != self.pattern_len() {
            return None;
        }
        PatternKey::from_vector(vector)
    }

    /// Maps `pattern` to `state`, returning the state it replaced
    pub fn insert(&mut self, pattern: &[i32], state: i32) -> Result<Option<i32>> {
        let key = self.key(pattern).ok_or_else(|| {
            Error::config(format!(
                "pattern of {} entries does not fit a codebook of {}",
                pattern.len(),
                self.pattern_len()
            ))
        })?;
        Ok(self.entries.insert(key, state))
    }

    /// Exact lookup of a vector's canonical pattern
    pub fn get(&self, vector: &[i32]) -> Option<i32> {
        self.entries.get(&self.key(vector)?).copied()
    }

    /// State of the key closest to `vector` in squared euclidean distance
    ///
    /// Ties go to the earliest inserted key. Returns [`None`] for an empty
    /// codebook or a vector of the wrong length.
    pub fn nearest(&self, vector: &[i32]) -> Option<i32> {
        let target = self.key(vector)?;
        let mut best: Option<(u32, i32)> = None;
        for (key, &state) in &self.entries {
            let dist = key.distance(target);
            if best.is_none_or(|(d, _)| dist < d) {
                best = Some((dist, state));
            }
        }
        best.map(|(_, state)| state)
    }

    /// Entries as `(pattern, state)` in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (Vec<i32>, i32)> + '_ {
        let len = self.pattern_len();
        self.entries
            .iter()
            .map(move |(key, &state)| (key.to_vector(len), state))
    }
}

#[inline]
fn random_state<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    ALPHABET[rng.random_range(0..ALPHABET.len())]
}

/// What a [`CodebookRule`] does with a pattern missing from its codebook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fallback {
    /// A uniformly random state from [`ALPHABET`]
    #[default]
    Random,
    /// The state of the nearest key (squared euclidean distance)
    Nearest,
}

impl FromStr for Fallback {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "random" => Ok(Self::Random),
            "nearest" | "l2" => Ok(Self::Nearest),
            other => Err(Error::config(format!(
                "unknown fallback {other:?}, expected \"random\" or \"nearest\""
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodebookRule {
    codebook: Codebook,
    fallback: Fallback,
}

impl CodebookRule {
    /// Fails if `fallback` would have to choose among zero entries
    pub fn new(codebook: Codebook, fallback: Fallback) -> Result<Self> {
        if fallback == Fallback::Nearest && codebook.is_empty() {
            return Err(Error::config(
                "nearest fallback requires a non-empty codebook",
            ));
        }
        Ok(Self { codebook, fallback })
    }

    #[inline]
    pub fn codebook(&self) -> &Codebook {
        &self.codebook
    }
    #[inline]
    pub fn fallback(&self) -> Fallback {
        self.fallback
    }

    /// Exact lookup, then fallback
    ///
    /// The random fallback draws from `rng`, so results are only reproducible
    /// when `rng` is seeded the same way.
    pub fn evaluate<R: Rng + ?Sized>(&self, vector: &[i32], rng: &mut R) -> Result<i32> {
        if vector.len() != self.codebook.pattern_len() {
            return Err(Error::evaluation(format!(
                "neighborhood of {} entries, codebook expects {}",
                vector.len(),
                self.codebook.pattern_len()
            )));
        }
        if let Some(state) = self.codebook.get(vector) {
            return Ok(state);
        }

        match self.fallback {
            Fallback::Random => Ok(random_state(rng)),
            Fallback::Nearest => self
                .codebook
                .nearest(vector)
                .ok_or_else(|| Error::evaluation("codebook has no entries")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn pattern(ones: &[usize]) -> Vec<i32> {
        let mut p = vec![0; 27];
        for &i in ones {
            p[i] = 1;
        }
        p
    }

    #[test]
    fn inserted_patterns_always_match() {
        let mut rng = StdRng::seed_from_u64(7);
        let codebook = Codebook::random(50, 3, &mut rng).unwrap();

        for fallback in [Fallback::Random, Fallback::Nearest] {
            let rule = CodebookRule::new(codebook.clone(), fallback).unwrap();
            for (p, state) in codebook.iter() {
                for _ in 0..5 {
                    assert_eq!(rule.evaluate(&p, &mut rng).unwrap(), state);
                }
            }
        }
    }

    #[test]
    fn duplicate_pattern_keeps_last_state() {
        let mut codebook = Codebook::new(3).unwrap();
        assert_eq!(codebook.insert(&pattern(&[0]), 1).unwrap(), None);
        codebook.insert(&pattern(&[1]), 0).unwrap();
        assert_eq!(codebook.insert(&pattern(&[0]), 0).unwrap(), Some(1));

        assert_eq!(codebook.len(), 2);
        assert_eq!(codebook.get(&pattern(&[0])), Some(0));
        // position is unchanged
        assert_eq!(codebook.iter().next().unwrap().0, pattern(&[0]));
    }

    #[test]
    fn lookup_canonicalizes_non_binary_values() {
        let mut codebook = Codebook::new(3).unwrap();
        codebook.insert(&pattern(&[4, 13]), 1).unwrap();

        let mut raw = vec![0; 27];
        raw[4] = 7;
        raw[13] = -1;
        assert_eq!(codebook.get(&raw), Some(1));
    }

    #[test]
    fn nearest_fallback_picks_closest_key() {
        let mut codebook = Codebook::new(3).unwrap();
        codebook.insert(&pattern(&[0, 1, 2, 3]), 0).unwrap();
        codebook.insert(&pattern(&[13]), 1).unwrap();
        let rule = CodebookRule::new(codebook, Fallback::Nearest).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(rule.evaluate(&pattern(&[13, 14]), &mut rng).unwrap(), 1);
        assert_eq!(rule.evaluate(&pattern(&[0, 1, 2]), &mut rng).unwrap(), 0);
    }

    #[test]
    fn nearest_fallback_ties_go_to_first_key() {
        let mut codebook = Codebook::new(3).unwrap();
        codebook.insert(&pattern(&[0]), 1).unwrap();
        codebook.insert(&pattern(&[1]), 0).unwrap();
        let rule = CodebookRule::new(codebook, Fallback::Nearest).unwrap();

        // equally far from both keys
        let probe = pattern(&[]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(rule.evaluate(&probe, &mut rng).unwrap(), 1);
        }
    }

    #[test]
    fn random_fallback_stays_in_alphabet() {
        let rule = CodebookRule::new(Codebook::new(3).unwrap(), Fallback::Random).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = [false; 2];

        for _ in 0..200 {
            let state = rule.evaluate(&pattern(&[5]), &mut rng).unwrap();
            assert!(ALPHABET.contains(&state));
            seen[state as usize] = true;
        }
        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn configuration_errors() {
        assert!(matches!(
            "manhattan".parse::<Fallback>(),
            Err(Error::InvalidConfiguration(_))
        ));
        assert_eq!("l2".parse::<Fallback>().unwrap(), Fallback::Nearest);
        assert!(matches!(
            CodebookRule::new(Codebook::new(3).unwrap(), Fallback::Nearest),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(Codebook::new(2).is_err());
        assert!(Codebook::new(7).is_err());
        assert!(Codebook::new(5).is_ok());
    }

    #[test]
    fn wrong_vector_length_fails_evaluation() {
        let rule = CodebookRule::new(Codebook::new(3).unwrap(), Fallback::Random).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        assert!(matches!(
            rule.evaluate(&[0; 9], &mut rng),
            Err(Error::RuleEvaluationFailure(_))
        ));
    }
}
