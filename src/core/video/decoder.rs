//! 辐射测温值解码
//!
//! The sensor's 16-bit output is split across two 8-bit color channels: one channel carries
//! the full high byte, a second channel carries the low part in its low nibble.

use super::frame::ColorFrame;
use crate::core::config::DecoderConfig;
use crate::core::error::{Result, ViewerError};

const LOW_NIBBLE: u8 = 0x0F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadiometricDecoder {
    high_channel: usize,
    low_channel: usize,
}

impl RadiometricDecoder {
    pub fn new() -> Self {
        let config = DecoderConfig::default();
        Self {
            high_channel: config.high_channel,
            low_channel: config.low_channel,
        }
    }

    pub fn from_config(config: &DecoderConfig) -> Result<Self> {
        let (high, low) = (config.high_channel, config.low_channel);
        if high > 2 || low > 2 || high == low {
            return Err(ViewerError::Config(format!(
                "invalid decoder channels high={} low={}",
                high, low
            )));
        }
        Ok(Self {
            high_channel: high,
            low_channel: low,
        })
    }

    pub fn decode_pixel(&self, pixel: [u8; 3]) -> u16 {
        let high = pixel[self.high_channel] as u16;
        let low = (pixel[self.low_channel] & LOW_NIBBLE) as u16;
        (high << 8) | low
    }

    /// Decode every pixel of `frame`, row-major.
    pub fn decode_frame(&self, frame: &ColorFrame) -> Vec<u16> {
        let mut raw = Vec::with_capacity(frame.pixel_count());
        raw.extend(frame.pixels().map(|p| self.decode_pixel(p)));
        raw
    }
}

impl Default for RadiometricDecoder {
    fn default() -> Self {
        Self::new()
    }
}
