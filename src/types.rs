//! Data model shared by the gateway, the contract proxy and the synchronizer

use std::fmt;

use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, WavePortalError};

/// Connected wallet address. `None` in an `Option<Account>` means "not connected".
pub type Account = Address;

/// One wave as emitted by the contract
///
/// Identity is structural: two events with the same sender, timestamp and
/// message are the same wave.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveEvent {
    /// Address that sent the wave
    pub sender: Address,
    /// Block time of the wave, derived from whole seconds since epoch
    pub timestamp: DateTime<Utc>,
    /// Free-form message attached to the wave
    pub message: String,
}

impl WaveEvent {
    /// Build an event from the raw values the contract reports
    ///
    /// The chain stores whole seconds; the instant is those seconds scaled to
    /// milliseconds.
    pub fn from_chain(sender: Address, timestamp_secs: U256, message: String) -> Result<Self> {
        let secs = u64::try_from(timestamp_secs).map_err(|_| {
            WavePortalError::invalid_response(format!("timestamp {} out of range", timestamp_secs))
        })?;
        Self::from_unix_seconds(sender, secs, message)
    }

    /// Build an event from a seconds-since-epoch timestamp
    pub fn from_unix_seconds(sender: Address, secs: u64, message: String) -> Result<Self> {
        let millis = i64::try_from(secs)
            .ok()
            .and_then(|s| s.checked_mul(1000))
            .ok_or_else(|| {
                WavePortalError::invalid_response(format!("timestamp {} out of range", secs))
            })?;
        let timestamp = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            WavePortalError::invalid_response(format!("timestamp {} out of range", secs))
        })?;

        Ok(Self {
            sender,
            timestamp,
            message,
        })
    }

    /// Timestamp as whole seconds since epoch
    pub fn unix_seconds(&self) -> i64 {
        self.timestamp.timestamp()
    }
}

impl fmt::Display for WaveEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {}: {}",
            self.sender,
            self.timestamp.to_rfc3339(),
            self.message
        )
    }
}

/// Hash of a broadcast wave transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHandle(pub B256);

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusion proof returned once a wave transaction is mined successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHandle,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
}

/// Lifecycle of the single in-flight wave write
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransactionState {
    #[default]
    Idle,
    Submitting,
    Pending(TxHandle),
    Confirmed(TxHandle),
    Failed(String),
}

/// Where the synchronizer sits in its connection / write state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Submitting,
    Submitted(TxHandle),
}

impl SyncPhase {
    /// Stable phases are the only ones observable after an operation returns
    pub fn is_stable(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Connected)
    }
}
