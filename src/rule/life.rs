//! Birth/survival rule with cluster identity inheritance.

use crate::{Error, Result};
use indexmap::IndexMap;
use rand::Rng;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

/// Environment sentinel used when none is given
pub const DEFAULT_ENV_ID: i32 = -1;

fn rulestring_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?i)^\s*B([\d,]*)\s*/\s*S([\d,]*)\s*$").unwrap())
}

/// Parses one side of a rulestring
///
/// Without commas every digit is its own count (`23` is {2, 3}), with commas
/// the counts may have several digits (`4,10` is {4, 10}).
fn parse_counts(s: &str) -> Result<BTreeSet<usize>> {
    if s.contains(',') {
        s.split(',')
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<usize>()
                    .map_err(|_| Error::config(format!("invalid neighbor count {part:?}")))
            })
            .collect()
    } else {
        Ok(s.chars()
            .filter_map(|c| c.to_digit(10))
            .map(|d| d as usize)
            .collect())
    }
}

fn format_counts(counts: &BTreeSet<usize>) -> String {
    let strs: Vec<String> = counts.iter().map(usize::to_string).collect();
    if counts.iter().any(|&c| c > 9) {
        strs.join(",")
    } else {
        strs.concat()
    }
}

/// Returns the side of the odd cube with `len` cells, if there is one
fn window_side(len: usize) -> Option<usize> {
    (1..)
        .step_by(2)
        .map(|k: usize| (k, k.pow(3)))
        .take_while(|&(_, cube)| cube <= len)
        .find(|&(_, cube)| cube == len)
        .map(|(k, _)| k)
}

/// The identity held by most of `ids`
///
/// A tie between the top identities is broken uniformly at random among the
/// tied identities. Returns [`None`] if `ids` is empty.
pub(crate) fn majority<R, I>(ids: I, rng: &mut R) -> Option<i32>
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = i32>,
{
    let mut counts: IndexMap<i32, usize> = IndexMap::new();
    for id in ids {
        *counts.entry(id).or_default() += 1;
    }
    let top = counts.values().copied().max()?;
    let tied: Vec<i32> = counts
        .into_iter()
        .filter(|&(_, n)| n == top)
        .map(|(id, _)| id)
        .collect();

    match tied.as_slice() {
        [only] => Some(*only),
        _ => Some(tied[rng.random_range(0..tied.len())]),
    }
}

/// Generalized Game of Life over a 3D window
///
/// Neighbor counts include environment cells, but only live identities can be
/// inherited by a newborn cell. Environment cells never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralizedLifeRule {
    birth: BTreeSet<usize>,
    survival: BTreeSet<usize>,
    env_id: i32,
}

impl GeneralizedLifeRule {
    pub fn new<B, S>(birth: B, survival: S, env_id: i32) -> Result<Self>
    where
        B: IntoIterator<Item = usize>,
        S: IntoIterator<Item = usize>,
    {
        if env_id >= 0 {
            return Err(Error::config(format!(
                "environment id must be negative, got {env_id}"
            )));
        }
        Ok(Self {
            birth: birth.into_iter().collect(),
            survival: survival.into_iter().collect(),
            env_id,
        })
    }

    /// B3/S23, the original Conway numbers
    pub fn conway() -> Self {
        Self {
            birth: BTreeSet::from([3]),
            survival: BTreeSet::from([2, 3]),
            env_id: DEFAULT_ENV_ID,
        }
    }

    /// Parses a `B<counts>/S<counts>` rulestring such as `B3/S23` or `B5,6/S4,5,10`
    pub fn from_rulestring(rule: &str, env_id: i32) -> Result<Self> {
        let caps = rulestring_regex()
            .captures(rule)
            .ok_or_else(|| Error::config(format!("invalid rulestring {rule:?}")))?;
        let birth = parse_counts(&caps[1])?;
        let survival = parse_counts(&caps[2])?;
        Self::new(birth, survival, env_id)
    }

    #[inline]
    pub fn birth_set(&self) -> &BTreeSet<usize> {
        &self.birth
    }
    #[inline]
    pub fn survival_set(&self) -> &BTreeSet<usize> {
        &self.survival
    }
    #[inline]
    pub fn env_id(&self) -> i32 {
        self.env_id
    }

    pub fn rulestring(&self) -> String {
        format!(
            "B{}/S{}",
            format_counts(&self.birth),
            format_counts(&self.survival)
        )
    }

    /// Next state of the center of `vector`
    ///
    /// `rng` is only drawn from when a newborn cell's majority identity is tied.
    pub fn evaluate<R: Rng + ?Sized>(&self, vector: &[i32], rng: &mut R) -> Result<i32> {
        if window_side(vector.len()).is_none() {
            return Err(Error::evaluation(format!(
                "neighborhood of {} entries is not an odd cube",
                vector.len()
            )));
        }
        let center_idx = vector.len() / 2;
        let center = vector[center_idx];
        // env_id and any other negative marker are fixed points
        if center < 0 {
            return Ok(center);
        }

        let neighbors = vector
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != center_idx)
            .map(|(_, &v)| v);
        let live = neighbors.clone().filter(|&v| v != 0).count();

        if center > 0 {
            return Ok(if self.survival.contains(&live) { center } else { 0 });
        }
        if !self.birth.contains(&live) {
            return Ok(0);
        }
        // environment cells count towards birth but cannot be inherited
        let inheritable = neighbors.filter(|&v| v > 0);
        Ok(majority(inheritable, rng).unwrap_or(0))
    }
}

impl Default for GeneralizedLifeRule {
    fn default() -> Self {
        Self::conway()
    }
}

impl fmt::Display for GeneralizedLifeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rulestring())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const ENV: i32 = DEFAULT_ENV_ID;
    const CENTER: usize = 13;

    /// A 3x3x3 vector with `center` and the given neighbor values
    fn hood(center: i32, neighbors: &[i32]) -> Vec<i32> {
        let mut v = vec![0; 27];
        v[CENTER] = center;
        let slots = (0..27).filter(|&i| i != CENTER);
        for (slot, &n) in slots.zip(neighbors) {
            v[slot] = n;
        }
        v
    }

    fn rule(birth: &[usize], survival: &[usize]) -> GeneralizedLifeRule {
        GeneralizedLifeRule::new(birth.iter().copied(), survival.iter().copied(), ENV).unwrap()
    }

    #[test]
    fn environment_center_is_fixed() {
        let r = rule(&[1, 2, 3], &[]);
        let mut rng = StdRng::seed_from_u64(1);

        for neighbors in [vec![], vec![1, 2, 3], vec![5; 26], vec![ENV; 26]] {
            assert_eq!(r.evaluate(&hood(ENV, &neighbors), &mut rng).unwrap(), ENV);
        }
    }

    #[test]
    fn survival_keeps_identity() {
        let r = rule(&[3], &[2, 3]);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(r.evaluate(&hood(4, &[9, 9]), &mut rng).unwrap(), 4);
        assert_eq!(r.evaluate(&hood(4, &[9, ENV, 2]), &mut rng).unwrap(), 4);
        assert_eq!(r.evaluate(&hood(4, &[9]), &mut rng).unwrap(), 0);
        assert_eq!(r.evaluate(&hood(4, &[1, 1, 1, 1]), &mut rng).unwrap(), 0);
    }

    #[test]
    fn birth_requires_inheritable_neighbor() {
        let r = rule(&[3], &[2, 3]);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(r.evaluate(&hood(0, &[ENV, ENV, ENV]), &mut rng).unwrap(), 0);
        assert_eq!(r.evaluate(&hood(0, &[ENV, ENV, 8]), &mut rng).unwrap(), 8);
    }

    #[test]
    fn birth_takes_majority_identity() {
        let r = rule(&[4], &[]);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(r.evaluate(&hood(0, &[5, 5, 5, 7]), &mut rng).unwrap(), 5);
        assert_eq!(r.evaluate(&hood(0, &[7, 5, 5, 5]), &mut rng).unwrap(), 5);
    }

    #[test]
    fn birth_tie_picks_a_tied_identity() {
        let r = rule(&[4], &[]);
        let mut seen = BTreeSet::new();

        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let state = r.evaluate(&hood(0, &[5, 5, 7, 7]), &mut rng).unwrap();
            assert!(state == 5 || state == 7, "unexpected identity {state}");
            seen.insert(state);
        }
        assert_eq!(seen, BTreeSet::from([5, 7]));
    }

    #[test]
    fn tie_is_reproducible_with_same_seed() {
        let r = rule(&[6], &[]);
        let v = hood(0, &[1, 2, 3, 1, 2, 3]);

        let a = r.evaluate(&v, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = r.evaluate(&v, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn majority_ignores_non_top_identities() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..32 {
            let id = majority([2, 2, 3, 3, 9], &mut rng).unwrap();
            assert!(id == 2 || id == 3);
        }
        assert_eq!(majority(std::iter::empty(), &mut rng), None);
    }

    #[test]
    fn dead_cell_without_birth_count_stays_dead() {
        let r = rule(&[3], &[2, 3]);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(r.evaluate(&hood(0, &[1, 1]), &mut rng).unwrap(), 0);
        assert_eq!(r.evaluate(&hood(0, &[1, 1, 1, 1]), &mut rng).unwrap(), 0);
    }

    #[test]
    fn works_on_larger_windows() {
        let r = rule(&[1], &[]);
        let mut v = vec![0; 125];
        v[0] = 6;
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(r.evaluate(&v, &mut rng).unwrap(), 6);
        assert!(matches!(
            r.evaluate(&[0; 26], &mut rng),
            Err(Error::RuleEvaluationFailure(_))
        ));
    }

    #[test]
    fn rulestrings_parse_and_format() {
        let r = GeneralizedLifeRule::from_rulestring("B3/S23", ENV).unwrap();
        assert_eq!(r, GeneralizedLifeRule::conway());
        assert_eq!(r.to_string(), "B3/S23");

        let r = GeneralizedLifeRule::from_rulestring("b5,6/s4,5,10", ENV).unwrap();
        assert_eq!(r.birth_set(), &BTreeSet::from([5, 6]));
        assert_eq!(r.survival_set(), &BTreeSet::from([4, 5, 10]));
        assert_eq!(r.rulestring(), "B56/S4,5,10");

        assert!(GeneralizedLifeRule::from_rulestring("23/3", ENV).is_err());
        assert!(GeneralizedLifeRule::from_rulestring("B3/S2x", ENV).is_err());
        assert!(GeneralizedLifeRule::new([3], [2], 0).is_err());
    }
}
