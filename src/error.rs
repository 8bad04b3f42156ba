use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Image resize failed: {0}")]
    Resize(String),

    #[error("Invalid image ({width}x{height})")]
    InvalidImage { width: u32, height: u32 },

    #[error("Surface error: {0}")]
    Surface(String),
}

pub type Result<T> = std::result::Result<T, PreviewError>;
