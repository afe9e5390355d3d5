//! Error type shared by the analysis engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BelError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid graph JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid BEL node '{0}'")]
    InvalidNode(String),

    #[error("node not in graph: {0}")]
    NodeNotFound(String),

    #[error("unknown pipeline function '{0}'")]
    UnknownFunction(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("statistics error: {0}")]
    Statistics(String),

    #[error("heat diffusion stalled before scoring {0}")]
    NoProgress(String),
}

pub type Result<T> = std::result::Result<T, BelError>;

impl BelError {
    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            BelError::Io(_) => 4,
            BelError::Json(_) | BelError::Toml(_) => 2,
            BelError::InvalidNode(_)
            | BelError::NodeNotFound(_)
            | BelError::UnknownFunction(_)
            | BelError::InvalidArgument(_) => 3,
            BelError::Statistics(_) | BelError::NoProgress(_) => 1,
        }
    }
}
