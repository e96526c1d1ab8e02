//! Runtime configuration for the realtime layer.
//!
//! Values arrive from CLI flags and environment variables in the server
//! binary; the builder range-checks them so an out-of-range flag fails
//! at startup instead of misbehaving at runtime.

use std::time::Duration;

/// Configuration of the realtime notification core.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Whether the WebSocket channel accepts connections at all.
    pub enabled: bool,
    /// Interval between server heartbeat frames.
    pub heartbeat_interval: Duration,
    /// Upper bound on enqueueing one frame on one session channel; a
    /// handle that exceeds it is treated as dead.
    pub send_timeout: Duration,
    /// Capacity of each session's outbound frame channel.
    pub channel_buffer: usize,
    /// Maximum accepted inbound text frame size, in bytes.
    pub max_message_size: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            heartbeat_interval: Duration::from_secs(30),
            send_timeout: Duration::from_secs(5),
            channel_buffer: 100,
            max_message_size: 64 * 1024,
        }
    }
}

impl RealtimeConfig {
    pub fn builder() -> RealtimeConfigBuilder {
        RealtimeConfigBuilder::default()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("heartbeat interval must be between 1 and 300 seconds, got {0}s")]
    InvalidHeartbeatInterval(u64),
    #[error("send timeout must be between 1 and 60 seconds, got {0}s")]
    InvalidSendTimeout(u64),
    #[error("channel buffer must be between 1 and 10000, got {0}")]
    InvalidChannelBuffer(usize),
    #[error("max message size must be between 1KB and 1MB, got {0} bytes")]
    InvalidMaxMessageSize(usize),
}

/// Builder with validated setters.
#[derive(Debug, Default)]
pub struct RealtimeConfigBuilder {
    config: RealtimeConfig,
}

impl RealtimeConfigBuilder {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Result<Self, ConfigError> {
        let secs = interval.as_secs();
        if !(1..=300).contains(&secs) {
            return Err(ConfigError::InvalidHeartbeatInterval(secs));
        }
        self.config.heartbeat_interval = interval;
        Ok(self)
    }

    pub fn send_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        let secs = timeout.as_secs();
        if !(1..=60).contains(&secs) {
            return Err(ConfigError::InvalidSendTimeout(secs));
        }
        self.config.send_timeout = timeout;
        Ok(self)
    }

    pub fn channel_buffer(mut self, capacity: usize) -> Result<Self, ConfigError> {
        if !(1..=10_000).contains(&capacity) {
            return Err(ConfigError::InvalidChannelBuffer(capacity));
        }
        self.config.channel_buffer = capacity;
        Ok(self)
    }

    pub fn max_message_size(mut self, bytes: usize) -> Result<Self, ConfigError> {
        if !(1024..=1024 * 1024).contains(&bytes) {
            return Err(ConfigError::InvalidMaxMessageSize(bytes));
        }
        self.config.max_message_size = bytes;
        Ok(self)
    }

    pub fn build(self) -> RealtimeConfig {
        self.config
    }
}
