use super::decoder::RadiometricDecoder;
use super::frame::ColorFrame;
use super::normalizer::{self, WindowBounds};
use crate::core::error::Result;
use image::GrayImage;
use log::debug;

/// 单帧数据：原始测温值 + 当前窗口下的可视化
#[derive(Debug, Clone)]
pub struct FrameRecord {
    width: u32,
    height: u32,
    frame_number: u64,
    raw_values: Vec<u16>,
    visualization: Vec<u8>,
    window: WindowBounds,
}

impl FrameRecord {
    pub fn from_color_frame(
        frame: &ColorFrame,
        decoder: &RadiometricDecoder,
        frame_number: u64,
    ) -> Self {
        let raw = decoder.decode_frame(frame);
        Self::from_raw(frame.width(), frame.height(), raw, frame_number)
    }

    /// `raw_values` must hold exactly `width * height` entries.
    pub fn from_raw(width: u32, height: u32, raw_values: Vec<u16>, frame_number: u64) -> Self {
        debug_assert_eq!(raw_values.len(), width as usize * height as usize);

        let window = Self::default_window(&raw_values);
        let visualization = normalizer::normalize(&raw_values, &window);
        Self {
            width,
            height,
            frame_number,
            raw_values,
            visualization,
            window,
        }
    }

    fn default_window(raw: &[u16]) -> WindowBounds {
        let (lo, hi) = normalizer::extrema(raw).unwrap_or((0, 0));
        WindowBounds::from_extrema(lo, hi)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn raw_values(&self) -> &[u16] {
        &self.raw_values
    }

    pub fn visualization(&self) -> &[u8] {
        &self.visualization
    }

    pub fn window(&self) -> WindowBounds {
        self.window
    }

    pub fn raw_at(&self, x: u32, y: u32) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.raw_values
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Replace the window and regenerate the visualization. Invalid bounds leave the
    /// record untouched.
    pub fn set_window(&mut self, min: f64, max: f64) -> Result<()> {
        let window = WindowBounds::new(min, max)?;
        self.apply_window(window);
        Ok(())
    }

    pub fn set_window_min(&mut self, min: f64) -> Result<()> {
        let window = self.window.with_min(min)?;
        self.apply_window(window);
        Ok(())
    }

    pub fn set_window_max(&mut self, max: f64) -> Result<()> {
        let window = self.window.with_max(max)?;
        self.apply_window(window);
        Ok(())
    }

    /// Restore the window to this frame's own extrema.
    pub fn reset_window(&mut self) {
        let window = Self::default_window(&self.raw_values);
        self.apply_window(window);
    }

    fn apply_window(&mut self, window: WindowBounds) {
        debug!(
            "🎚️ Frame {}: window [{}, {}]",
            self.frame_number,
            window.min(),
            window.max()
        );
        self.window = window;
        normalizer::normalize_into(&self.raw_values, &self.window, &mut self.visualization);
    }

    /// 可视化结果的灰度图（供显示层使用）
    pub fn visualization_image(&self) -> Option<GrayImage> {
        GrayImage::from_raw(self.width, self.height, self.visualization.clone())
    }
}
