use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Missing required column: {column}")]
    MissingColumn { column: &'static str },

    #[error("Invalid timestamp: {value:?} (expected H:MM:SS.fff)")]
    InvalidTimestamp { value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load match {match_id}: {source}")]
    MatchLoad {
        match_id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl CoreError {
    /// Precondition violations are caller bugs; everything else depends on the input data.
    pub fn is_precondition_violation(&self) -> bool {
        match self {
            CoreError::MissingColumn { .. } => true,
            CoreError::InvalidConfig(_) => true,
            CoreError::InvalidTimestamp { .. } => false,
            CoreError::MatchLoad { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
