pub mod config;
pub mod error;
pub mod video;

pub use config::{DecoderConfig, LoadConfig, PlaybackConfig, ViewerConfig};
pub use error::{Result, ViewerError};
