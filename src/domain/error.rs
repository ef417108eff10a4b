use crate::domain::stage::Stage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WizardError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid subject: {0:?}")]
    InvalidSubject(String),

    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    #[error("{0} is already running")]
    StageBusy(Stage),

    #[error("Cannot advance from {0}")]
    CannotAdvance(Stage),

    #[error("No subject selected")]
    NoSubject,

    #[error("Malformed {stage} response: {reason}")]
    MalformedResponse { stage: Stage, reason: String },

    #[error("Research service error: {0}")]
    Research(String),
}
