use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("query engine error: {0}")]
    Engine(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
