use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database file not found: {0}")]
    DatabaseNotFound(std::path::PathBuf),

    #[error("duckdb error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("unparseable date in debates table: {0}")]
    InvalidDate(String),
}
