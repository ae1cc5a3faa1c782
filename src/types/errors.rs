use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Server errors
    #[error("Duplicate tool: {0}")]
    DuplicateTool(String),
    #[error("Tool execution failed: {0}")]
    ToolFailed(String),
}
