//! Error types for Wave Portal operations
//!
//! Every failure that crosses the wallet provider or the network ends up as a
//! `WavePortalError`. The synchronizer stores the last one as a user-visible
//! label, so the type is cheap to clone and comparable.

use thiserror::Error;

use crate::types::TxHandle;

/// Core error type for wallet, contract and synchronization operations
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum WavePortalError {
    /// No wallet provider is available in this session
    #[error("No wallet provider found, install a wallet extension to continue")]
    NoProvider,

    /// The user declined the account connection prompt
    #[error("Connection request rejected by user")]
    UserRejected,

    /// The user declined to sign the wave transaction
    #[error("Wave submission rejected: {0}")]
    SubmissionRejected(String),

    /// The network refused the call before it could be signed
    #[error("Gas estimation failed: {0}")]
    GasEstimationFailed(String),

    /// The transaction was mined but execution failed
    #[error("Transaction {tx_hash} reverted")]
    TransactionReverted { tx_hash: TxHandle },

    /// The provider connection dropped
    #[error("Provider disconnected: {0}")]
    ProviderDisconnected(String),

    /// A wave needs a message
    #[error("Wave message must not be empty")]
    EmptyMessage,

    /// A write intent arrived without a connected account
    #[error("No connected account")]
    NotConnected,

    /// The provider answered with something that could not be decoded
    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),

    /// Any other provider-reported error
    #[error("Provider request failed ({code}): {message}")]
    Rpc { code: i64, message: String },

    /// The receipt did not show up within the configured attempts
    #[error("Timed out waiting for confirmation of {0}")]
    ConfirmationTimeout(TxHandle),
}

impl WavePortalError {
    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Whether this error ends a live subscription
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::ProviderDisconnected(_))
    }
}
