//! 像素探针：坐标 -> 原始测温值

use super::record::FrameRecord;
use crate::core::error::{Result, ViewerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReading {
    pub x: u32,
    pub y: u32,
    pub value: u16,
}

/// Read the raw value at grid coordinates. Coordinates outside the frame are an error.
pub fn probe(record: &FrameRecord, x: i64, y: i64) -> Result<ProbeReading> {
    let (width, height) = record.dimensions();
    let out_of_range = || ViewerError::OutOfRangeProbe {
        x,
        y,
        width,
        height,
    };

    let gx = u32::try_from(x).map_err(|_| out_of_range())?;
    let gy = u32::try_from(y).map_err(|_| out_of_range())?;
    let value = record.raw_at(gx, gy).ok_or_else(out_of_range)?;

    Ok(ProbeReading {
        x: gx,
        y: gy,
        value,
    })
}

/// Like [`probe`], but snaps out-of-range coordinates to the nearest edge pixel.
/// Returns `None` only for an empty frame.
pub fn probe_clamped(record: &FrameRecord, x: i64, y: i64) -> Option<ProbeReading> {
    let (width, height) = record.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let gx = x.clamp(0, width as i64 - 1) as u32;
    let gy = y.clamp(0, height as i64 - 1) as u32;
    record.raw_at(gx, gy).map(|value| ProbeReading {
        x: gx,
        y: gy,
        value,
    })
}

/// Display -> grid coordinate correction for a scaled view with a fixed decoration offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMapping {
    scale_factor: f32,
    offset_x: i32,
    offset_y: i32,
}

impl DisplayMapping {
    pub fn new(scale_factor: f32, offset_x: i32, offset_y: i32) -> Result<Self> {
        if !scale_factor.is_finite() || scale_factor <= 0.0 {
            return Err(ViewerError::InvalidScaleFactor(scale_factor));
        }
        Ok(Self {
            scale_factor,
            offset_x,
            offset_y,
        })
    }

    pub fn identity() -> Self {
        Self {
            scale_factor: 1.0,
            offset_x: 0,
            offset_y: 0,
        }
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    /// `None` when either coordinate is NaN or infinite.
    pub fn to_grid(&self, display_x: f32, display_y: f32) -> Option<(i64, i64)> {
        let gx = ((display_x - self.offset_x as f32) / self.scale_factor).floor();
        let gy = ((display_y - self.offset_y as f32) / self.scale_factor).floor();
        if !gx.is_finite() || !gy.is_finite() {
            return None;
        }
        Some((gx as i64, gy as i64))
    }
}

impl Default for DisplayMapping {
    fn default() -> Self {
        Self::identity()
    }
}
