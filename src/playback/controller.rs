use super::state_machine::{
    PlaybackEffect, PlaybackEvent, PlaybackInput, PlaybackState, TimerToken, TransitionContext,
};
use crate::core::config::PlaybackConfig;
use crate::core::error::{Result, ViewerError};
use log::{debug, info, warn};
use std::time::Duration;

/// 播放控制器：按帧率推进当前帧
///
/// The controller never owns a timer. Every operation returns the ordered effects of the
/// transition: timer requests for the host scheduler and notifications for observers.
/// Ticks come back in through [`PlaybackController::on_tick`].
#[derive(Debug)]
pub struct PlaybackController {
    state: PlaybackState,
    length: usize,
    frame_rate_hz: f64,
    interval: Duration,
    loop_enabled: bool,
    next_token: u64,
    tick_counter: u64,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::with_config(&PlaybackConfig::default())
    }

    pub fn with_config(config: &PlaybackConfig) -> Self {
        let (frame_rate_hz, interval) = match PlaybackConfig::interval_for(config.frame_rate_hz) {
            Ok(interval) => (config.frame_rate_hz, interval),
            Err(e) => {
                warn!("⚠️ {}, falling back to default rate", e);
                let hz = PlaybackConfig::default().frame_rate_hz;
                (hz, Duration::from_secs_f64(1.0 / hz))
            }
        };
        Self {
            state: PlaybackState::new(0),
            length: 0,
            frame_rate_hz,
            interval,
            loop_enabled: config.loop_enabled,
            next_token: 1,
            tick_counter: 0,
        }
    }

    pub fn start(&mut self) -> Vec<PlaybackEffect> {
        let effects = self.apply(PlaybackInput::Start);
        if self.state.is_running() && !effects.is_empty() {
            info!(
                "▶️ Playback started at frame {:?} ({} Hz, loop={})",
                self.current_index(),
                self.frame_rate_hz,
                self.loop_enabled
            );
        }
        effects
    }

    pub fn stop(&mut self) -> Vec<PlaybackEffect> {
        let effects = self.apply(PlaybackInput::Stop);
        if !effects.is_empty() {
            info!("⏹️ Playback stopped at frame {:?}", self.current_index());
        }
        effects
    }

    pub fn on_tick(&mut self, token: TimerToken) -> Vec<PlaybackEffect> {
        if self.state.active_token() == Some(token) {
            self.tick_counter += 1;
        }
        let effects = self.apply(PlaybackInput::Tick(token));
        if effects.contains(&PlaybackEffect::Notify(PlaybackEvent::Stopped)) {
            info!("⏹️ Playback reached the last frame");
        }
        effects
    }

    /// Takes effect immediately: a running schedule is replaced with one at the new rate.
    pub fn set_frame_rate(&mut self, hz: f64) -> Result<Vec<PlaybackEffect>> {
        let interval = PlaybackConfig::interval_for(hz)?;
        debug!("Frame rate {} -> {} Hz", self.frame_rate_hz, hz);
        self.frame_rate_hz = hz;
        self.interval = interval;
        Ok(self.apply(PlaybackInput::Reschedule))
    }

    /// Takes effect from the next tick.
    pub fn set_loop(&mut self, enabled: bool) {
        debug!("Loop {}", if enabled { "on" } else { "off" });
        self.loop_enabled = enabled;
    }

    pub fn seek(&mut self, index: usize) -> Result<Vec<PlaybackEffect>> {
        if index >= self.length {
            return Err(ViewerError::IndexOutOfRange {
                index,
                length: self.length,
            });
        }
        Ok(self.apply(PlaybackInput::Seek(index)))
    }

    /// Bind to a new sequence length, stopping any active playback first.
    pub fn rebind(&mut self, length: usize) -> Vec<PlaybackEffect> {
        let effects = self.stop();
        self.length = length;
        self.state = PlaybackState::new(length);
        self.tick_counter = 0;
        debug!("Playback bound to {} frames", length);
        effects
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state.current_index()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn active_token(&self) -> Option<TimerToken> {
        self.state.active_token()
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn frame_rate_hz(&self) -> f64 {
        self.frame_rate_hz
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    /// `1000 / frame_rate_hz` milliseconds.
    pub fn tick_interval(&self) -> Duration {
        self.interval
    }

    /// Honored ticks since the last rebind.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    fn apply(&mut self, input: PlaybackInput) -> Vec<PlaybackEffect> {
        let ctx = TransitionContext {
            length: self.length,
            loop_enabled: self.loop_enabled,
            interval: self.tick_interval(),
            next_token: TimerToken(self.next_token),
        };

        let (state, effects) = self.state.transition(input, &ctx);
        if state.active_token() == Some(ctx.next_token) {
            self.next_token += 1;
        }
        self.state = state;
        effects
    }
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

/// Notifications only, in order.
pub fn events_of(effects: &[PlaybackEffect]) -> Vec<PlaybackEvent> {
    effects
        .iter()
        .filter_map(|e| match e {
            PlaybackEffect::Notify(event) => Some(*event),
            PlaybackEffect::Timer(_) => None,
        })
        .collect()
}
