use std::fmt::Debug;

mod handler;
pub use handler::HandlerError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Database Error: {0}")]
    Database(String),

    #[error("Serialization Error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown Task Type: '{0}'")]
    UnknownTaskType(String),

    #[error("Resource Not Found: {resource_type} with ID {resource_id}")]
    NotFound {
        resource_type: String,
        resource_id: String,
    },

    #[error("Lock Error: {0}")]
    Lock(String),

    #[error("Lock Release Error: {}", .0.join("; "))]
    LockRelease(Vec<String>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Internal Error: {0}")]
    Internal(String),
}
