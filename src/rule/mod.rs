mod codebook;
mod index;
mod life;

pub use self::codebook::{ALPHABET, Codebook, CodebookRule, Fallback};
pub use self::index::{MAX_PATTERN_LEN, PatternKey};
pub use self::life::{DEFAULT_ENV_ID, GeneralizedLifeRule};

use crate::{Error, Result};
use rand::Rng;

/// A local update rule: one neighborhood vector in, one next state out
///
/// Any randomness a rule needs is drawn from the generator passed to
/// [`Rule::evaluate`], never from a global source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Codebook(CodebookRule),
    GeneralizedLife(GeneralizedLifeRule),
}

impl Rule {
    pub fn evaluate<R: Rng + ?Sized>(&self, vector: &[i32], rng: &mut R) -> Result<i32> {
        match self {
            Self::Codebook(rule) => rule.evaluate(vector, rng),
            Self::GeneralizedLife(rule) => rule.evaluate(vector, rng),
        }
    }

    /// Checks that this rule can consume windows of side `window`
    pub fn check_window(&self, window: usize) -> Result<()> {
        match self {
            Self::Codebook(rule) if rule.codebook().size() != window => Err(Error::config(
                format!(
                    "codebook is keyed on {0}x{0}x{0} windows, evolver uses {1}x{1}x{1}",
                    rule.codebook().size(),
                    window
                ),
            )),
            _ => Ok(()),
        }
    }

    /// Short label for logs
    pub fn name(&self) -> String {
        match self {
            Self::Codebook(rule) => format!(
                "codebook({} entries, {:?})",
                rule.codebook().len(),
                rule.fallback()
            ),
            Self::GeneralizedLife(rule) => rule.rulestring(),
        }
    }
}

impl From<CodebookRule> for Rule {
    #[inline]
    fn from(rule: CodebookRule) -> Self {
        Self::Codebook(rule)
    }
}
impl From<GeneralizedLifeRule> for Rule {
    #[inline]
    fn from(rule: GeneralizedLifeRule) -> Self {
        Self::GeneralizedLife(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn codebook_window_must_match() {
        let rule = Rule::from(CodebookRule::new(Codebook::new(3).unwrap(), Fallback::Random).unwrap());

        assert!(rule.check_window(3).is_ok());
        assert!(matches!(
            rule.check_window(5),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(Rule::from(GeneralizedLifeRule::conway()).check_window(5).is_ok());
    }

    #[test]
    fn dispatches_to_variant() {
        let mut codebook = Codebook::new(1).unwrap();
        codebook.insert(&[1], 0).unwrap();
        codebook.insert(&[0], 1).unwrap();
        let flip = Rule::from(CodebookRule::new(codebook, Fallback::Nearest).unwrap());
        let life = Rule::from(GeneralizedLifeRule::conway());
        let mut rng = StdRng::seed_from_u64(0);

        assert_eq!(flip.evaluate(&[1], &mut rng).unwrap(), 0);
        assert_eq!(flip.evaluate(&[0], &mut rng).unwrap(), 1);
        // a lone live cell dies under B3/S23
        assert_eq!(life.evaluate(&[1], &mut rng).unwrap(), 0);
        assert_eq!(life.name(), "B3/S23");
    }
}
