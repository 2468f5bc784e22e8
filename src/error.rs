use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config: {message}")]
    Config { message: String },

    #[error("connection: {message}")]
    Connection { message: String },

    #[error("connection: not connected")]
    NotConnected,

    #[error("statement: {message} (sql: {sql})")]
    Statement { sql: String, message: String },

    #[error("fetch: {message}")]
    Fetch { message: String },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl RunError {
    pub fn config(message: impl Into<String>) -> Self {
        RunError::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RunError>;
