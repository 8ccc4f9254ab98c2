//! Peer session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::wire::constants::DEFAULT_LOCAL_FEATURES;

/// Tunables for a [`PeerSession`](crate::session::PeerSession).
///
/// Every field has a default, so a partial document such as
/// `{"ping_interval_secs": 5}` deserializes into a complete config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds between keepalive pings (`ping_interval_secs`).
    #[serde(default = "SessionConfig::default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    /// `num_pong_bytes` requested by each keepalive ping.
    #[serde(default = "SessionConfig::default_ping_num_pong_bytes")]
    pub ping_num_pong_bytes: u16,
    /// Random padding bytes carried by each keepalive ping.
    #[serde(default = "SessionConfig::default_ping_padding_len")]
    pub ping_padding_len: u16,
    /// Pause before retrying a failed transport read, in milliseconds.
    #[serde(default = "SessionConfig::default_read_retry_delay_ms")]
    pub read_retry_delay_ms: u64,
    /// Consecutive read or decode failures tolerated before the session
    /// gives up.
    #[serde(default = "SessionConfig::default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    /// Local feature bits announced in the opening `init`.
    #[serde(default = "SessionConfig::default_init_local_features")]
    pub init_local_features: Vec<u8>,
    /// Received messages buffered for the session owner. Once full, newer
    /// messages are dropped (the peer is still answered).
    #[serde(default = "SessionConfig::default_inbound_capacity")]
    pub inbound_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: Self::default_ping_interval_secs(),
            ping_num_pong_bytes: Self::default_ping_num_pong_bytes(),
            ping_padding_len: Self::default_ping_padding_len(),
            read_retry_delay_ms: Self::default_read_retry_delay_ms(),
            max_consecutive_failures: Self::default_max_consecutive_failures(),
            init_local_features: Self::default_init_local_features(),
            inbound_capacity: Self::default_inbound_capacity(),
        }
    }
}

impl SessionConfig {
    fn default_ping_interval_secs() -> u64 { 30 }
    fn default_ping_num_pong_bytes() -> u16 { 10 }
    fn default_ping_padding_len() -> u16 { 1 }
    fn default_read_retry_delay_ms() -> u64 { 100 }
    fn default_max_consecutive_failures() -> u32 { 16 }
    fn default_init_local_features() -> Vec<u8> { vec![DEFAULT_LOCAL_FEATURES] }
    fn default_inbound_capacity() -> usize { 1024 }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn read_retry_delay(&self) -> Duration {
        Duration::from_millis(self.read_retry_delay_ms)
    }
}
