use crate::core::error::{Result, ViewerError};

/// 每像素字节数（三通道，按源存储顺序）
pub const BYTES_PER_PIXEL: usize = 3;

/// 帧源输出的原始彩色帧
#[derive(Debug, Clone)]
pub struct ColorFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ColorFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(ViewerError::FrameShape {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a frame where every pixel holds the same packed sample.
    pub fn filled(width: u32, height: u32, pixel: [u8; 3]) -> Self {
        let count = width as usize * height as usize;
        let mut data = Vec::with_capacity(count * BYTES_PER_PIXEL);
        for _ in 0..count {
            data.extend_from_slice(&pixel);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
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

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.data
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|p| [p[0], p[1], p[2]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let frame = ColorFrame::new(4, 2, vec![7u8; 4 * 2 * 3]).unwrap();

        assert_eq!(frame.dimensions(), (4, 2));
        assert_eq!(frame.pixel_count(), 8);
        assert_eq!(frame.pixels().count(), 8);
    }

    #[test]
    fn test_frame_rejects_short_buffer() {
        let err = ColorFrame::new(4, 2, vec![0u8; 10]).unwrap_err();
        assert!(matches!(
            err,
            ViewerError::FrameShape {
                expected: 24,
                actual: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_filled_frame() {
        let frame = ColorFrame::filled(3, 3, [1, 2, 3]);
        assert_eq!(frame.data().len(), 27);
        assert!(frame.pixels().all(|p| p == [1, 2, 3]));
    }

    #[test]
    fn test_from_rgb_image() {
        let img = image::RgbImage::from_pixel(5, 4, image::Rgb([10, 20, 30]));
        let frame = ColorFrame::from_rgb_image(img);
        assert_eq!(frame.dimensions(), (5, 4));
        assert_eq!(frame.pixels().next(), Some([10, 20, 30]));
    }
}
