use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Collaborator request failed: {0}")]
    Collaborator(String),

    #[error("Turn contract violation: {0}")]
    Contract(String),

    #[error("History storage error: {0}")]
    Storage(String),

    #[error("A turn request is already in flight")]
    TurnInFlight,

    #[error("No active case session")]
    NoActiveCase,
}

pub type Result<T> = std::result::Result<T, SimError>;
