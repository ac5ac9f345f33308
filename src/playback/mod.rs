//! 播放控制
//!
//! `state_machine` holds the pure transition function, `controller` wraps it with the
//! frame rate and loop settings, `scheduler` is the host-side tick source.

pub mod controller;
pub mod scheduler;
pub mod state_machine;

pub use controller::{events_of, PlaybackController};
pub use scheduler::{FrameClock, TickScheduler};
pub use state_machine::{
    PlaybackEffect, PlaybackEvent, PlaybackInput, PlaybackState, TimerRequest, TimerToken,
};
