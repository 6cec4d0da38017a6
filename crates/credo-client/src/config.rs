//! Client configuration.

use std::time::Duration;

use credo_proto::MAX_FRAME_LEN;

/// Session runtime configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval between countdown ticks.
    pub tick_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { tick_interval: Duration::from_millis(100) }
    }
}

/// Framed transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Largest accepted frame payload. Capped at [`MAX_FRAME_LEN`].
    pub max_frame_len: usize,
    /// Game events buffered between the connection and the session loop.
    pub event_buffer: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { max_frame_len: MAX_FRAME_LEN, event_buffer: 64 }
    }
}
