//! 查看器配置

use crate::core::error::{Result, ViewerError};
use log::info;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DecoderConfig {
    /// Byte offset (within a packed pixel) carrying the high byte.
    pub high_channel: usize,
    /// Byte offset whose low nibble carries the low part.
    pub low_channel: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            high_channel: 2,
            low_channel: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackConfig {
    pub frame_rate_hz: f64,
    pub loop_enabled: bool,
    /// Upper bound on ticks a host clock may deliver for one update.
    pub max_catch_up_ticks: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 30.0,
            loop_enabled: false,
            max_catch_up_ticks: 4,
        }
    }
}

impl PlaybackConfig {
    /// Tick period for `hz`. Rates whose period is not a representable, non-zero
    /// `Duration` are rejected.
    pub fn interval_for(hz: f64) -> Result<Duration> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(ViewerError::InvalidFrameRate(hz));
        }
        match Duration::try_from_secs_f64(1.0 / hz) {
            Ok(interval) if !interval.is_zero() => Ok(interval),
            _ => Err(ViewerError::InvalidFrameRate(hz)),
        }
    }

    pub fn for_preview() -> Self {
        Self {
            frame_rate_hz: 60.0,
            loop_enabled: true,
            max_catch_up_ticks: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoadConfig {
    pub decode_threads: usize,
    pub thumbnail_size: u32,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            decode_threads: num_cpus::get().min(4),
            thumbnail_size: 64,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub decoder: DecoderConfig,
    pub playback: PlaybackConfig,
    pub load: LoadConfig,
}

impl ViewerConfig {
    pub fn from_json5_str(text: &str) -> Result<Self> {
        let config: ViewerConfig =
            json5::from_str(text).map_err(|e| ViewerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: ViewerConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// `.json` files are parsed strictly, anything else as JSON5.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("📖 Reading viewer config: {:?}", path);
        let text = std::fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_json5_str(&text)
        }
    }

    pub fn validate(&self) -> Result<()> {
        let DecoderConfig {
            high_channel,
            low_channel,
        } = self.decoder;
        if high_channel > 2 || low_channel > 2 || high_channel == low_channel {
            return Err(ViewerError::Config(format!(
                "decoder channels must be distinct offsets in 0..3 (high={}, low={})",
                high_channel, low_channel
            )));
        }

        PlaybackConfig::interval_for(self.playback.frame_rate_hz)?;

        if self.load.decode_threads == 0 {
            return Err(ViewerError::Config("decode_threads must be at least 1".into()));
        }

        Ok(())
    }
}
