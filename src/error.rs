/// Errors surfaced by the automaton engine
///
/// Both kinds are fatal: configuration errors are raised before any volume is
/// produced, and an evaluation failure aborts the step it occurred in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("rule evaluation failed: {0}")]
    RuleEvaluationFailure(String),
}

impl Error {
    pub(crate) fn config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub(crate) fn evaluation<S: Into<String>>(msg: S) -> Self {
        Self::RuleEvaluationFailure(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
