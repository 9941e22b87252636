use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompileError>;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no pipeline named {0}")]
    UnknownContext(String),

    #[error("scenario references unknown entity key: {0}")]
    UnknownEntityKey(String),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("canonical reference collision on {reference}: {first} vs {second}")]
    ReferenceCollision {
        reference: String,
        first: String,
        second: String,
    },
}
