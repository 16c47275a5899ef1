#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Malformed report: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}
