//! 帧源：向加载流程提供按顺序的彩色帧

use super::frame::ColorFrame;
use crate::core::error::{Result, ViewerError};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

static TRAILING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\D*$").expect("trailing number pattern"));

/// An ordered, finite producer of color frames.
///
/// `open` reports sources that cannot be read at all. After a successful open,
/// `next_frame` yields frames in order; an `Err` item is a single bad frame and
/// the caller may keep reading.
pub trait FrameSource {
    fn describe(&self) -> String;

    fn open(&mut self) -> Result<()>;

    fn next_frame(&mut self) -> Option<Result<ColorFrame>>;
}

/// 内存帧源（宿主自行解码视频后传入）
pub struct MemorySource {
    name: String,
    frames: VecDeque<Result<ColorFrame>>,
    unavailable: Option<String>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, frames: Vec<ColorFrame>) -> Self {
        Self {
            name: name.into(),
            frames: frames.into_iter().map(Ok).collect(),
            unavailable: None,
        }
    }

    /// Frames as the host decoded them, including per-frame failures.
    pub fn with_results(name: impl Into<String>, frames: Vec<Result<ColorFrame>>) -> Self {
        Self {
            name: name.into(),
            frames: frames.into(),
            unavailable: None,
        }
    }

    /// A source that fails to open with `reason`.
    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frames: VecDeque::new(),
            unavailable: Some(reason.into()),
        }
    }
}

impl FrameSource for MemorySource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn open(&mut self) -> Result<()> {
        match &self.unavailable {
            Some(reason) => Err(ViewerError::SourceOpen {
                source_name: self.name.clone(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn next_frame(&mut self) -> Option<Result<ColorFrame>> {
        self.frames.pop_front()
    }
}

/// 图片序列帧源（每个文件一帧）
///
/// An explicit path list must not be empty. A directory that was readable but holds no
/// `*.png` files opens fine and yields zero frames.
pub struct ImageSetSource {
    paths: Vec<PathBuf>,
    dir: Option<PathBuf>,
    cursor: usize,
}

impl ImageSetSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            dir: None,
            cursor: 0,
        }
    }

    /// Collect the `*.png` files of `dir`, ordered by their trailing frame number.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_png = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("png"))
                .unwrap_or(false);
            if path.is_file() && is_png {
                paths.push(path);
            }
        }

        sort_naturally(&mut paths);
        info!("📂 Found {} image frames in {:?}", paths.len(), dir);
        Ok(Self {
            paths,
            dir: Some(dir.to_path_buf()),
            cursor: 0,
        })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl FrameSource for ImageSetSource {
    fn describe(&self) -> String {
        match (self.paths.first(), &self.dir) {
            (Some(first), _) => format!("image set ({} files, first {:?})", self.paths.len(), first),
            (None, Some(dir)) => format!("image set (empty directory {:?})", dir),
            (None, None) => "image set (empty)".to_string(),
        }
    }

    fn open(&mut self) -> Result<()> {
        self.cursor = 0;
        if self.paths.is_empty() && self.dir.is_none() {
            return Err(ViewerError::SourceOpen {
                source_name: self.describe(),
                reason: "no image files given".into(),
            });
        }
        Ok(())
    }

    fn next_frame(&mut self) -> Option<Result<ColorFrame>> {
        let path = self.paths.get(self.cursor)?;
        let index = self.cursor;
        self.cursor += 1;

        debug!("🖼️ Decoding image frame {:?}", path);
        let result = image::open(path)
            .map(|img| ColorFrame::from_rgb_image(img.to_rgb8()))
            .map_err(|e| {
                warn!("⚠️ Cannot decode {:?}: {}", path, e);
                ViewerError::FrameDecode {
                    index,
                    reason: format!("{}: {}", path.display(), e),
                }
            });
        Some(result)
    }
}

/// Sort by trailing number in the file stem, then by full path.
pub fn sort_naturally(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| {
        frame_key(a)
            .cmp(&frame_key(b))
            .then_with(|| a.cmp(b))
    });
}

fn frame_key(path: &Path) -> (String, Option<u64>) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match TRAILING_NUMBER.captures(&stem) {
        Some(caps) => {
            let digits = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let prefix_end = caps.get(1).map(|m| m.start()).unwrap_or(stem.len());
            (stem[..prefix_end].to_string(), digits.parse().ok())
        }
        None => (stem, None),
    }
}
