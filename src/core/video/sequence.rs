//! 帧序列与加载流程

use super::decoder::RadiometricDecoder;
use super::frame::ColorFrame;
use super::record::FrameRecord;
use super::source::FrameSource;
use crate::core::config::ViewerConfig;
use crate::core::error::{Result, ViewerError};
use image::imageops::{self, FilterType};
use image::GrayImage;
use log::{error, info, warn};
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub decoder: RadiometricDecoder,
    pub decode_threads: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            decoder: RadiometricDecoder::new(),
            decode_threads: num_cpus::get().min(4),
        }
    }
}

impl LoadOptions {
    pub fn from_config(config: &ViewerConfig) -> Result<Self> {
        Ok(Self {
            decoder: RadiometricDecoder::from_config(&config.decoder)?,
            decode_threads: config.load.decode_threads.max(1),
        })
    }
}

/// 加载时被跳过的帧
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFrame {
    /// 0-based position in the source.
    pub index: usize,
    pub reason: String,
}

#[derive(Debug)]
pub struct LoadReport {
    pub sequence: FrameSequence,
    pub skipped: Vec<SkippedFrame>,
}

/// 按源顺序排列的帧记录，加载完成后成员不可变
#[derive(Debug, Default)]
pub struct FrameSequence {
    records: Vec<FrameRecord>,
}

impl FrameSequence {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FrameRecord> {
        self.records.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut FrameRecord> {
        self.records.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameRecord> {
        self.records.iter()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.records.first().map(|r| r.dimensions())
    }

    /// List labels, "1 frame", "2 frame", ...
    pub fn labels(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| format!("{} frame", r.frame_number()))
            .collect()
    }

    /// Square previews of each frame's current visualization.
    pub fn thumbnails(&self, size: u32) -> Vec<GrayImage> {
        self.records
            .par_iter()
            .filter_map(|r| r.visualization_image())
            .map(|img| imageops::resize(&img, size, size, FilterType::Triangle))
            .collect()
    }
}

/// Read every frame from `source` and build the sequence.
///
/// A source that cannot be opened is an error. Frames that fail to decode, or whose
/// dimensions differ from the first good frame, are skipped and listed in the report.
pub fn load_from_source(source: &mut dyn FrameSource, options: &LoadOptions) -> Result<LoadReport> {
    let name = source.describe();
    info!("🎬 Loading frames from {}", name);

    source.open().map_err(|e| {
        error!("❌ Error opening frame source {}: {}", name, e);
        e
    })?;

    let mut accepted: Vec<(usize, ColorFrame)> = Vec::new();
    let mut skipped = Vec::new();
    let mut expected_dims: Option<(u32, u32)> = None;
    let mut index = 0usize;

    while let Some(item) = source.next_frame() {
        match item {
            Ok(frame) => {
                let dims = frame.dimensions();
                match expected_dims {
                    Some(expected) if expected != dims => {
                        let reason = format!(
                            "frame is {}x{}, sequence is {}x{}",
                            dims.0, dims.1, expected.0, expected.1
                        );
                        warn!("⚠️ Skipping frame {}: {}", index, reason);
                        skipped.push(SkippedFrame { index, reason });
                    }
                    _ => {
                        expected_dims = Some(dims);
                        accepted.push((index, frame));
                    }
                }
            }
            Err(e) => {
                warn!("⚠️ Skipping frame {}: {}", index, e);
                skipped.push(SkippedFrame {
                    index,
                    reason: e.to_string(),
                });
            }
        }
        index += 1;
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.decode_threads.max(1))
        .build()
        .map_err(|e| {
            error!("❌ Failed to build decode pool: {}", e);
            ViewerError::ThreadPool(e.to_string())
        })?;

    let decoder = options.decoder;
    let records: Vec<FrameRecord> = pool.install(|| {
        accepted
            .par_iter()
            .map(|(i, frame)| FrameRecord::from_color_frame(frame, &decoder, *i as u64 + 1))
            .collect()
    });

    info!(
        "✅ Loaded {} frames from {} ({} skipped)",
        records.len(),
        name,
        skipped.len()
    );

    Ok(LoadReport {
        sequence: FrameSequence { records },
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::video::source::MemorySource;

    fn frame_with_high(high: u8) -> ColorFrame {
        ColorFrame::new(2, 2, vec![0, 0, high, 0, 0, 0, 0, 1, high, 0, 0, 0]).unwrap()
    }

    #[test]
    fn test_load_preserves_order() {
        let frames = (1..=4).map(frame_with_high).collect();
        let mut source = MemorySource::new("mem", frames);
        let report = load_from_source(&mut source, &LoadOptions::default()).unwrap();

        assert_eq!(report.sequence.len(), 4);
        assert!(report.skipped.is_empty());
        for (i, record) in report.sequence.iter().enumerate() {
            assert_eq!(record.raw_values()[0], ((i as u16) + 1) << 8);
            assert_eq!(record.frame_number(), i as u64 + 1);
        }
        assert_eq!(report.sequence.dimensions(), Some((2, 2)));
    }

    #[test]
    fn test_unopenable_source_is_error() {
        let mut source = MemorySource::unavailable("missing.avi", "no such file");
        let result = load_from_source(&mut source, &LoadOptions::default());
        assert!(matches!(result, Err(ViewerError::SourceOpen { .. })));
    }

    #[test]
    fn test_zero_frames_is_empty_sequence() {
        let mut source = MemorySource::new("empty", vec![]);
        let report = load_from_source(&mut source, &LoadOptions::default()).unwrap();
        assert!(report.sequence.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_bad_frame_is_skipped_not_fatal() {
        let mut source = MemorySource::with_results(
            "mixed",
            vec![
                Ok(frame_with_high(1)),
                Err(ViewerError::FrameDecode {
                    index: 1,
                    reason: "corrupt".into(),
                }),
                Ok(frame_with_high(3)),
            ],
        );
        let report = load_from_source(&mut source, &LoadOptions::default()).unwrap();

        assert_eq!(report.sequence.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].index, 1);
        assert!(report.skipped[0].reason.contains("corrupt"));
        // frame numbers keep the source position
        assert_eq!(report.sequence.labels(), vec!["1 frame", "3 frame"]);
    }

    #[test]
    fn test_all_frames_bad_is_empty_sequence() {
        let mut source = MemorySource::with_results(
            "bad",
            vec![Err(ViewerError::FrameDecode {
                index: 0,
                reason: "corrupt".into(),
            })],
        );
        let report = load_from_source(&mut source, &LoadOptions::default()).unwrap();
        assert!(report.sequence.is_empty());
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_mismatched_dimensions_skipped() {
        let frames = vec![frame_with_high(1), ColorFrame::filled(3, 3, [0, 0, 9]), frame_with_high(2)];
        let mut source = MemorySource::new("mem", frames);
        let report = load_from_source(&mut source, &LoadOptions::default()).unwrap();

        assert_eq!(report.sequence.len(), 2);
        assert_eq!(report.skipped[0].index, 1);
    }

    #[test]
    fn test_single_thread_matches_default() {
        let frames: Vec<ColorFrame> = (1..=6).map(frame_with_high).collect();
        let options = LoadOptions {
            decode_threads: 1,
            ..Default::default()
        };

        let a = load_from_source(&mut MemorySource::new("a", frames.clone()), &options).unwrap();
        let b = load_from_source(&mut MemorySource::new("b", frames), &LoadOptions::default())
            .unwrap();

        let raw_a: Vec<_> = a.sequence.iter().map(|r| r.raw_values().to_vec()).collect();
        let raw_b: Vec<_> = b.sequence.iter().map(|r| r.raw_values().to_vec()).collect();
        assert_eq!(raw_a, raw_b);
    }

    #[test]
    fn test_thumbnails() {
        let frames = (1..=3).map(frame_with_high).collect();
        let report = load_from_source(&mut MemorySource::new("mem", frames), &LoadOptions::default())
            .unwrap();

        let thumbs = report.sequence.thumbnails(8);
        assert_eq!(thumbs.len(), 3);
        assert!(thumbs.iter().all(|t| t.dimensions() == (8, 8)));
    }
}
