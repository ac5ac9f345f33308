//! 窗口归一化：16 位原始值 -> 8 位可视化

use crate::core::error::{Result, ViewerError};
use rayon::prelude::*;

/// Grids at least this large are normalized in parallel chunks.
const PARALLEL_THRESHOLD: usize = 64 * 1024;
const CHUNK_SIZE: usize = 16 * 1024;

/// 显示窗口 [min, max]，保证 min < max
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowBounds {
    min: f64,
    max: f64,
}

impl WindowBounds {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || max <= min {
            return Err(ViewerError::InvalidWindowBounds { min, max });
        }
        Ok(Self { min, max })
    }

    /// Default window for a grid: its extrema, widened by one when the grid is uniform.
    pub fn from_extrema(lo: u16, hi: u16) -> Self {
        let min = lo as f64;
        let max = if hi > lo { hi as f64 } else { min + 1.0 };
        Self { min, max }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn with_min(&self, min: f64) -> Result<Self> {
        Self::new(min, self.max)
    }

    pub fn with_max(&self, max: f64) -> Result<Self> {
        Self::new(self.min, max)
    }

    #[inline]
    pub fn map(&self, value: u16) -> u8 {
        let scaled = (value as f64 - self.min) / (self.max - self.min) * 255.0;
        scaled.round().clamp(0.0, 255.0) as u8
    }
}

/// Full reduction over the grid. `None` for an empty grid.
pub fn extrema(raw: &[u16]) -> Option<(u16, u16)> {
    raw.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

pub fn normalize(raw: &[u16], window: &WindowBounds) -> Vec<u8> {
    let mut out = vec![0u8; raw.len()];
    normalize_into(raw, window, &mut out);
    out
}

pub fn normalize_into(raw: &[u16], window: &WindowBounds, out: &mut [u8]) {
    debug_assert_eq!(raw.len(), out.len());

    if raw.len() >= PARALLEL_THRESHOLD {
        out.par_chunks_mut(CHUNK_SIZE)
            .zip(raw.par_chunks(CHUNK_SIZE))
            .for_each(|(dst, src)| map_chunk(src, window, dst));
    } else {
        map_chunk(raw, window, out);
    }
}

fn map_chunk(src: &[u16], window: &WindowBounds, dst: &mut [u8]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = window.map(s);
    }
}
