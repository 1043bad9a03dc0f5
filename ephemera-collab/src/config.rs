use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SyncResult;

/// Timing policy of a cursor sync session.
///
/// All fields have defaults, so a partial JSON document such as
/// `{"stale_timeout_ms": 5000}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Minimum spacing between two outbound cursor broadcasts.
    pub throttle_interval_ms: u64,
    /// How often stale remote cursors are evicted.
    pub sweep_interval_ms: u64,
    /// Age after which a remote cursor is considered gone.
    pub stale_timeout_ms: u64,
    /// Drop inbound messages older than the stored entry for the same peer.
    /// Off by default: arrival order wins.
    pub reject_out_of_order: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            throttle_interval_ms: 100,
            sweep_interval_ms: 2_000,
            stale_timeout_ms: crate::registry::DEFAULT_STALE_TIMEOUT_MS,
            reject_out_of_order: false,
        }
    }
}

impl SyncConfig {
    pub fn from_json(json: &str) -> SyncResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_interval_ms)
    }

    /// Never zero: a zero-period interval would panic in tokio.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }
}
