//! 红外帧查看会话
//!
//! ```ignore
//! let mut session = ViewerSession::new(ViewerConfig::default())?;
//! session.subscribe(|event| { println!("{:?}", event); None });
//! session.load(&mut ImageSetSource::from_dir("frames/")?)?;
//! session.start();
//! // host loop
//! session.advance(elapsed);
//! ```

use crate::core::config::ViewerConfig;
use crate::core::error::{Result, ViewerError};
use crate::core::video::{
    load_from_source, probe, DisplayMapping, FrameRecord, FrameSequence, FrameSource,
    ImageSetSource, LoadOptions, ProbeReading, SkippedFrame, WindowBounds,
};
use crate::playback::{
    FrameClock, PlaybackController, PlaybackEffect, PlaybackEvent, TickScheduler, TimerToken,
};
use image::GrayImage;
use log::{error, info};
use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

/// Transport request a subscriber may issue while handling a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    Start,
    Stop,
}

pub type Subscriber = Box<dyn FnMut(&PlaybackEvent) -> Option<TransportCommand>>;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    pub frames: usize,
    pub skipped: Vec<SkippedFrame>,
}

/// 查看会话：持有帧序列、播放控制器和当前探针位置
pub struct ViewerSession<S: TickScheduler = FrameClock> {
    config: ViewerConfig,
    options: LoadOptions,
    sequence: FrameSequence,
    playback: PlaybackController,
    scheduler: S,
    subscribers: Vec<Subscriber>,
    mapping: DisplayMapping,
    last_probe: Option<ProbeReading>,
}

impl ViewerSession<FrameClock> {
    pub fn new(config: ViewerConfig) -> Result<Self> {
        let clock = FrameClock::new(config.playback.max_catch_up_ticks);
        Self::with_scheduler(config, clock)
    }

    /// Feed elapsed host time; due ticks are processed in order.
    pub fn advance(&mut self, delta: Duration) -> Vec<PlaybackEvent> {
        let mut delivered = Vec::new();
        for token in self.scheduler.advance(delta) {
            delivered.extend(self.on_tick(token));
        }
        delivered
    }
}

impl<S: TickScheduler> ViewerSession<S> {
    pub fn with_scheduler(config: ViewerConfig, scheduler: S) -> Result<Self> {
        config.validate()?;
        let options = LoadOptions::from_config(&config)?;
        let playback = PlaybackController::with_config(&config.playback);
        info!("🎞️ ViewerSession: created");

        Ok(Self {
            config,
            options,
            sequence: FrameSequence::empty(),
            playback,
            scheduler,
            subscribers: Vec::new(),
            mapping: DisplayMapping::identity(),
            last_probe: None,
        })
    }

    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(&PlaybackEvent) -> Option<TransportCommand> + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Replace the current sequence with the frames of `source`.
    ///
    /// Playback is stopped and the previous sequence dropped before reading. When the
    /// source cannot be opened the session is left with an empty sequence.
    pub fn load(&mut self, source: &mut dyn FrameSource) -> Result<LoadSummary> {
        let effects = self.playback.rebind(0);
        self.dispatch(effects);
        self.sequence = FrameSequence::empty();
        self.last_probe = None;

        let report = match load_from_source(source, &self.options) {
            Ok(report) => report,
            Err(e) => {
                error!("❌ Load failed: {}", e);
                return Err(e);
            }
        };

        self.sequence = report.sequence;
        let effects = self.playback.rebind(self.sequence.len());
        self.dispatch(effects);

        Ok(LoadSummary {
            frames: self.sequence.len(),
            skipped: report.skipped,
        })
    }

    pub fn load_image_dir(&mut self, dir: impl AsRef<Path>) -> Result<LoadSummary> {
        let mut source = ImageSetSource::from_dir(dir)?;
        self.load(&mut source)
    }

    pub fn sequence(&self) -> &FrameSequence {
        &self.sequence
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn current_index(&self) -> Option<usize> {
        self.playback.current_index()
    }

    pub fn current_record(&self) -> Option<&FrameRecord> {
        self.current_index().and_then(|i| self.sequence.get(i))
    }

    fn current_record_mut(&mut self) -> Result<&mut FrameRecord> {
        let index = self.current_index().ok_or(ViewerError::NoFrameSelected)?;
        self.sequence
            .get_mut(index)
            .ok_or(ViewerError::NoFrameSelected)
    }

    // ---- transport ----

    pub fn start(&mut self) -> Vec<PlaybackEvent> {
        let effects = self.playback.start();
        self.dispatch(effects)
    }

    pub fn stop(&mut self) -> Vec<PlaybackEvent> {
        let effects = self.playback.stop();
        self.dispatch(effects)
    }

    pub fn on_tick(&mut self, token: TimerToken) -> Vec<PlaybackEvent> {
        let effects = self.playback.on_tick(token);
        self.dispatch(effects)
    }

    pub fn set_frame_rate(&mut self, hz: f64) -> Result<Vec<PlaybackEvent>> {
        let effects = self.playback.set_frame_rate(hz)?;
        Ok(self.dispatch(effects))
    }

    pub fn set_loop(&mut self, enabled: bool) {
        self.playback.set_loop(enabled);
    }

    pub fn seek(&mut self, index: usize) -> Result<Vec<PlaybackEvent>> {
        let effects = self.playback.seek(index)?;
        Ok(self.dispatch(effects))
    }

    // ---- window ----

    pub fn window(&self) -> Option<WindowBounds> {
        self.current_record().map(|r| r.window())
    }

    pub fn set_window(&mut self, min: f64, max: f64) -> Result<()> {
        self.current_record_mut()?.set_window(min, max)
    }

    pub fn set_window_min(&mut self, min: f64) -> Result<()> {
        self.current_record_mut()?.set_window_min(min)
    }

    pub fn set_window_max(&mut self, max: f64) -> Result<()> {
        self.current_record_mut()?.set_window_max(max)
    }

    pub fn reset_window(&mut self) -> Result<()> {
        self.current_record_mut()?.reset_window();
        Ok(())
    }

    pub fn visualization_image(&self) -> Option<GrayImage> {
        self.current_record().and_then(|r| r.visualization_image())
    }

    pub fn thumbnails(&self) -> Vec<GrayImage> {
        self.sequence.thumbnails(self.config.load.thumbnail_size)
    }

    pub fn labels(&self) -> Vec<String> {
        self.sequence.labels()
    }

    // ---- probe ----

    pub fn set_display_mapping(&mut self, mapping: DisplayMapping) {
        self.mapping = mapping;
    }

    /// Probe the current frame at grid coordinates.
    pub fn probe(&mut self, x: i64, y: i64) -> Result<ProbeReading> {
        let record = self.current_record().ok_or(ViewerError::NoFrameSelected)?;
        let reading = probe(record, x, y)?;
        self.last_probe = Some(reading);
        Ok(reading)
    }

    /// Probe the current frame at display coordinates, corrected by the display mapping.
    /// NaN or infinite coordinates are out of range.
    pub fn probe_display(&mut self, display_x: f32, display_y: f32) -> Result<ProbeReading> {
        let (width, height) = self
            .current_record()
            .ok_or(ViewerError::NoFrameSelected)?
            .dimensions();
        match self.mapping.to_grid(display_x, display_y) {
            Some((x, y)) => self.probe(x, y),
            None => Err(ViewerError::OutOfRangeProbe {
                x: i64::MIN,
                y: i64::MIN,
                width,
                height,
            }),
        }
    }

    /// Last successful probe, for the overlay marker.
    pub fn last_probe(&self) -> Option<ProbeReading> {
        self.last_probe
    }

    /// Apply timer requests and deliver notifications in transition order. Commands
    /// returned by subscribers run after the event that produced them has reached every
    /// subscriber; their own effects are queued behind the remaining ones.
    fn dispatch(&mut self, effects: Vec<PlaybackEffect>) -> Vec<PlaybackEvent> {
        let mut pending: VecDeque<PlaybackEffect> = effects.into();
        let mut delivered = Vec::new();

        while let Some(effect) = pending.pop_front() {
            match effect {
                PlaybackEffect::Timer(request) => self.scheduler.apply(&request),
                PlaybackEffect::Notify(event) => {
                    let commands: Vec<TransportCommand> = self
                        .subscribers
                        .iter_mut()
                        .filter_map(|subscriber| subscriber(&event))
                        .collect();
                    delivered.push(event);

                    for command in commands {
                        let more = match command {
                            TransportCommand::Start => self.playback.start(),
                            TransportCommand::Stop => self.playback.stop(),
                        };
                        pending.extend(more);
                    }
                }
            }
        }

        delivered
    }
}

impl<S: TickScheduler> Drop for ViewerSession<S> {
    fn drop(&mut self) {
        info!("🗑️ ViewerSession: released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::video::{ColorFrame, MemorySource};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn frames(count: u8) -> Vec<ColorFrame> {
        // 2x2 frames, pixel i has high byte frame+i
        (0..count)
            .map(|f| {
                let data = (0..4u8).flat_map(|i| [0, i, f + i]).collect();
                ColorFrame::new(2, 2, data).unwrap()
            })
            .collect()
    }

    fn session_with(count: u8) -> ViewerSession {
        let mut session = ViewerSession::new(ViewerConfig::default()).unwrap();
        session.load(&mut MemorySource::new("mem", frames(count))).unwrap();
        session
    }

    #[test]
    fn test_load_selects_first_frame() {
        let session = session_with(3);
        assert_eq!(session.sequence().len(), 3);
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(session.labels(), vec!["1 frame", "2 frame", "3 frame"]);
    }

    #[test]
    fn test_failed_open_leaves_empty_session() {
        let mut session = session_with(3);
        let err = session
            .load(&mut MemorySource::unavailable("x.avi", "cannot open"))
            .unwrap_err();
        assert!(matches!(err, ViewerError::SourceOpen { .. }));
        assert!(session.sequence().is_empty());
        assert_eq!(session.current_index(), None);
        assert!(matches!(
            session.set_window(0.0, 1.0),
            Err(ViewerError::NoFrameSelected)
        ));
    }

    #[test]
    fn test_zero_frames_load_is_ok() {
        let mut session = session_with(3);
        let summary = session.load(&mut MemorySource::new("empty", vec![])).unwrap();
        assert_eq!(summary.frames, 0);
        assert!(session.start().is_empty());
    }

    #[test]
    fn test_load_stops_running_playback() {
        let mut session = session_with(3);
        session.start();
        assert!(session.scheduler().is_active());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        session.subscribe(move |e| {
            sink.borrow_mut().push(*e);
            None
        });

        session.load(&mut MemorySource::new("next", frames(2))).unwrap();
        assert_eq!(*seen.borrow(), vec![PlaybackEvent::Stopped]);
        assert!(!session.playback().is_running());
        assert!(!session.scheduler().is_active());
        assert_eq!(session.sequence().len(), 2);
    }

    #[test]
    fn test_clock_drives_playback() {
        let mut session = session_with(3);
        session.set_frame_rate(10.0).unwrap();
        session.start();

        assert!(session.advance(Duration::from_millis(50)).is_empty());
        assert_eq!(
            session.advance(Duration::from_millis(50)),
            vec![PlaybackEvent::FrameChanged(1)]
        );
        assert_eq!(
            session.advance(Duration::from_millis(200)),
            vec![PlaybackEvent::FrameChanged(2), PlaybackEvent::Stopped]
        );
        assert!(!session.scheduler().is_active());
    }

    #[test]
    fn test_reentrant_stop_from_handler() {
        let mut session = session_with(5);
        session.subscribe(|event| match event {
            PlaybackEvent::FrameChanged(2) => Some(TransportCommand::Stop),
            _ => None,
        });

        session.start();
        let mut events = Vec::new();
        for _ in 0..5 {
            events.extend(session.advance(Duration::from_millis(40)));
        }

        assert_eq!(
            events,
            vec![
                PlaybackEvent::FrameChanged(1),
                PlaybackEvent::FrameChanged(2),
                PlaybackEvent::Stopped,
            ]
        );
        assert_eq!(session.current_index(), Some(2));
        assert!(!session.scheduler().is_active());
    }

    #[test]
    fn test_reentrant_restart_after_end() {
        let mut session = session_with(2);
        session.set_loop(false);
        let mut restarted = false;
        session.subscribe(move |event| {
            if *event == PlaybackEvent::Stopped && !restarted {
                restarted = true;
                return Some(TransportCommand::Start);
            }
            None
        });

        session.start();
        let token = session.playback().active_token().unwrap();
        session.on_tick(token);
        let events = session.on_tick(token);

        assert_eq!(
            events,
            vec![
                PlaybackEvent::Stopped,
                PlaybackEvent::Started,
                PlaybackEvent::FrameChanged(0),
            ]
        );
        assert!(session.playback().is_running());
    }

    #[test]
    fn test_window_belongs_to_current_frame() {
        let mut session = session_with(3);
        session.set_window(10.0, 20.0).unwrap();
        assert_eq!(session.window().unwrap().min(), 10.0);

        session.seek(1).unwrap();
        let other = session.window().unwrap();
        assert_ne!(other.min(), 10.0);

        session.seek(0).unwrap();
        assert_eq!(session.window().unwrap().max(), 20.0);

        session.reset_window().unwrap();
        let record = session.current_record().unwrap();
        assert_eq!(record.visualization()[0], 0);
        assert_eq!(record.visualization()[3], 255);
    }

    #[test]
    fn test_invalid_window_rejected() {
        let mut session = session_with(1);
        let before = session.window();
        assert!(matches!(
            session.set_window(5.0, 5.0),
            Err(ViewerError::InvalidWindowBounds { .. })
        ));
        assert_eq!(session.window(), before);
    }

    #[test]
    fn test_probe_display_with_mapping() {
        let mut session = session_with(1);
        session.set_display_mapping(DisplayMapping::new(2.0, 0, 0).unwrap());

        // grid (1, 1) -> pixel 3 -> high byte 3, low nibble 3
        let reading = session.probe_display(3.0, 3.0).unwrap();
        assert_eq!(reading.value, 0x0303);
        assert_eq!(session.last_probe(), Some(reading));

        assert!(matches!(
            session.probe_display(10.0, 0.0),
            Err(ViewerError::OutOfRangeProbe { .. })
        ));
        assert_eq!(session.last_probe(), Some(reading));
    }

    #[test]
    fn test_non_finite_display_coordinates_rejected() {
        let mut session = session_with(2);
        let reading = session.probe_display(1.0, 0.0).unwrap();

        for (dx, dy) in [
            (f32::NAN, 0.0),
            (0.0, f32::NAN),
            (f32::INFINITY, 0.0),
            (0.0, f32::NEG_INFINITY),
        ] {
            assert!(matches!(
                session.probe_display(dx, dy),
                Err(ViewerError::OutOfRangeProbe { width: 2, height: 2, .. })
            ));
        }
        // the overlay keeps the last valid reading
        assert_eq!(session.last_probe(), Some(reading));
    }

    #[test]
    fn test_thumbnails_use_configured_size() {
        let session = session_with(2);
        let thumbs = session.thumbnails();
        assert_eq!(thumbs.len(), 2);
        assert_eq!(thumbs[0].dimensions(), (64, 64));
    }

    #[test]
    fn test_load_image_dir() {
        let dir = tempfile::tempdir().unwrap();
        for i in 1..=3u8 {
            let img = image::RgbImage::from_fn(4, 3, |x, _| image::Rgb([0, 0x0F, i * 10 + x as u8]));
            img.save(dir.path().join(format!("ir_{:03}.png", i))).unwrap();
        }

        let mut session = ViewerSession::new(ViewerConfig::default()).unwrap();
        let summary = session.load_image_dir(dir.path()).unwrap();
        assert_eq!(summary.frames, 3);
        assert!(summary.skipped.is_empty());

        session.seek(2).unwrap();
        assert_eq!(session.probe(1, 0).unwrap().value, (31u16 << 8) | 0x0F);
    }

    #[test]
    fn test_load_empty_image_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with(2);

        let summary = session.load_image_dir(dir.path()).unwrap();
        assert_eq!(summary.frames, 0);
        assert!(session.sequence().is_empty());
        assert_eq!(session.current_index(), None);
        assert!(session.start().is_empty());
    }
}
