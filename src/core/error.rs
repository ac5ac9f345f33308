use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Failed to open frame source {source_name}: {reason}")]
    SourceOpen { source_name: String, reason: String },
    #[error("Failed to decode frame {index}: {reason}")]
    FrameDecode { index: usize, reason: String },
    #[error("Frame buffer has {actual} bytes, expected {expected} for {width}x{height}")]
    FrameShape {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid window bounds: min={min}, max={max} (max must be greater than min)")]
    InvalidWindowBounds { min: f64, max: f64 },
    #[error("Probe ({x}, {y}) outside frame {width}x{height}")]
    OutOfRangeProbe {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
    #[error("Invalid frame rate: {0} Hz")]
    InvalidFrameRate(f64),
    #[error("Frame index {index} out of range (length {length})")]
    IndexOutOfRange { index: usize, length: usize },
    #[error("No frame selected")]
    NoFrameSelected,
    #[error("Invalid display scale factor: {0}")]
    InvalidScaleFactor(f32),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ViewerError>;
