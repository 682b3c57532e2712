use crate::config::ConfigError;
use puzzlepool_chain::StateError;
use puzzlepool_felt::FieldError;

/// Errors that abort a scenario run.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A deployment, transaction or call failed.
    #[error(transparent)]
    Execution(#[from] StateError),

    #[error(transparent)]
    Field(#[from] FieldError),

    /// The catalog has no definition under this name.
    #[error("unknown contract '{0}'")]
    UnknownContract(String),

    /// Scaling a launch velocity overflowed.
    #[error("velocity {value} times scale {scale} overflows")]
    VelocityOverflow { value: i64, scale: i64 },

    /// The manager still had an unfinished game after the allowed number
    /// of `ContinueMove` transactions.
    #[error("game still unfinished after {limit} ContinueMove calls")]
    ContinueLimit { limit: u32 },

    /// The recorded score differs from the expected one.
    #[error("puzzle {puzzle_id}: expected score {expected}, recorded {actual}")]
    ScoreMismatch {
        puzzle_id: u64,
        expected: u64,
        actual: u64,
    },
}
