use thiserror::Error;

// Core internal errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Store initialization error: {0}")]
    StoreInitialization(String),
    #[error("Failed to clear collection {collection}: {message}")]
    ClearCollection { collection: String, message: String },
    #[error("Record stamping error: {0}")]
    RecordStamping(String),
    #[error("Batch commit error: {0}")]
    BatchCommit(String),
    #[error("Production seeding was not confirmed")]
    ConfirmationDenied,
    #[error("Failed to load {path}: {message}")]
    SourceLoad { path: String, message: String },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}
