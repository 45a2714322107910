use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("sensor read timeout")]
    Timeout,
    #[error("sensor stream closed")]
    Closed,
    #[error("serial setup failed: {0}")]
    Setup(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
