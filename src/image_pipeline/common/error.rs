use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to read input file: {0}")]
    InputRead(String),

    #[error("Failed to write output file: {0}")]
    OutputWrite(String),

    #[error("Unrecognized or corrupt container: {0}")]
    Format(String),

    #[error("Unsupported CFA pattern: {0}")]
    UnsupportedCfa(String),

    #[error("Truncated strip data at offset {offset}: expected {expected} bytes, {available} available")]
    TruncatedData {
        offset: u64,
        expected: usize,
        available: usize,
    },

    #[error("Failed to decode RAW image: {0}")]
    Decode(String),

    #[error("Failed to encode TIFF image: {0}")]
    Encode(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Worker pool initialization failed: {0}")]
    WorkerPool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProcessError>;
