use serde::Serialize;
use std::time::Duration;

/// Identifies one recurring tick schedule. Ticks carrying an older token are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimerToken(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "index", rename_all = "snake_case")]
pub enum PlaybackEvent {
    Started,
    Stopped,
    FrameChanged(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRequest {
    Schedule { token: TimerToken, interval: Duration },
    Cancel { token: TimerToken },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEffect {
    Notify(PlaybackEvent),
    Timer(TimerRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackInput {
    Start,
    Stop,
    Tick(TimerToken),
    /// Frame rate changed; replace the running schedule.
    Reschedule,
    /// Caller guarantees `index < length`.
    Seek(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionContext {
    pub length: usize,
    pub loop_enabled: bool,
    pub interval: Duration,
    /// Token handed out if this transition creates a schedule.
    pub next_token: TimerToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped {
        index: Option<usize>,
        /// Set after a non-looping run reached the end; the next start begins at 0.
        rewind_pending: bool,
    },
    Running {
        index: usize,
        token: TimerToken,
    },
}

impl PlaybackState {
    pub fn new(length: usize) -> Self {
        PlaybackState::Stopped {
            index: if length > 0 { Some(0) } else { None },
            rewind_pending: false,
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        match self {
            PlaybackState::Stopped { index, .. } => *index,
            PlaybackState::Running { index, .. } => Some(*index),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, PlaybackState::Running { .. })
    }

    pub fn active_token(&self) -> Option<TimerToken> {
        match self {
            PlaybackState::Running { token, .. } => Some(*token),
            PlaybackState::Stopped { .. } => None,
        }
    }

    pub fn transition(
        &self,
        input: PlaybackInput,
        ctx: &TransitionContext,
    ) -> (PlaybackState, Vec<PlaybackEffect>) {
        use PlaybackEffect::{Notify, Timer};

        match (*self, input) {
            (
                PlaybackState::Stopped {
                    index,
                    rewind_pending,
                },
                PlaybackInput::Start,
            ) => {
                let Some(index) = index.filter(|_| ctx.length > 0) else {
                    return (*self, Vec::new());
                };
                let start_at = if rewind_pending || index >= ctx.length {
                    0
                } else {
                    index
                };
                (
                    PlaybackState::Running {
                        index: start_at,
                        token: ctx.next_token,
                    },
                    vec![
                        Timer(TimerRequest::Schedule {
                            token: ctx.next_token,
                            interval: ctx.interval,
                        }),
                        Notify(PlaybackEvent::Started),
                        Notify(PlaybackEvent::FrameChanged(start_at)),
                    ],
                )
            }

            (PlaybackState::Running { index, token }, PlaybackInput::Stop) => (
                PlaybackState::Stopped {
                    index: Some(index),
                    rewind_pending: false,
                },
                vec![
                    Timer(TimerRequest::Cancel { token }),
                    Notify(PlaybackEvent::Stopped),
                ],
            ),

            (PlaybackState::Running { index, token }, PlaybackInput::Tick(tick))
                if tick == token =>
            {
                if ctx.length == 0 {
                    return (
                        PlaybackState::new(0),
                        vec![
                            Timer(TimerRequest::Cancel { token }),
                            Notify(PlaybackEvent::Stopped),
                        ],
                    );
                }

                let next = index + 1;
                if next < ctx.length {
                    (
                        PlaybackState::Running { index: next, token },
                        vec![Notify(PlaybackEvent::FrameChanged(next))],
                    )
                } else if ctx.loop_enabled {
                    (
                        PlaybackState::Running { index: 0, token },
                        vec![Notify(PlaybackEvent::FrameChanged(0))],
                    )
                } else {
                    (
                        PlaybackState::Stopped {
                            index: Some(ctx.length - 1),
                            rewind_pending: true,
                        },
                        vec![
                            Timer(TimerRequest::Cancel { token }),
                            Notify(PlaybackEvent::Stopped),
                        ],
                    )
                }
            }

            (PlaybackState::Running { index, token }, PlaybackInput::Reschedule) => (
                PlaybackState::Running {
                    index,
                    token: ctx.next_token,
                },
                vec![
                    Timer(TimerRequest::Cancel { token }),
                    Timer(TimerRequest::Schedule {
                        token: ctx.next_token,
                        interval: ctx.interval,
                    }),
                ],
            ),

            (PlaybackState::Running { token, .. }, PlaybackInput::Seek(index)) => (
                PlaybackState::Running { index, token },
                vec![Notify(PlaybackEvent::FrameChanged(index))],
            ),

            (PlaybackState::Stopped { .. }, PlaybackInput::Seek(index)) => (
                PlaybackState::Stopped {
                    index: Some(index),
                    rewind_pending: false,
                },
                vec![Notify(PlaybackEvent::FrameChanged(index))],
            ),

            // Start while running, stop while stopped, stale or idle ticks.
            _ => (*self, Vec::new()),
        }
    }
}
