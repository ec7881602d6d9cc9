//! Chain Gateway
//!
//! Wraps the (optional) wallet provider and exposes account discovery, the
//! user-facing connection request, and construction of a contract proxy whose
//! writes are signed by the wallet.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::PortalConfig;
use crate::contract::WavePortalContract;
use crate::provider::WalletProvider;
use crate::types::Account;
use crate::{Result, WavePortalError};

/// Account side of the wallet, as seen by the synchronizer
#[async_trait]
pub trait AccountGateway: Send + Sync {
    /// Accounts the user already granted to this client. Never prompts.
    ///
    /// An empty list means "not connected".
    async fn list_authorized_accounts(&self) -> Result<Vec<Account>>;

    /// Ask the user to grant an account. May show a wallet prompt.
    async fn request_connection(&self) -> Result<Account>;
}

/// Gateway over an injected wallet provider
pub struct ChainGateway<P> {
    provider: Option<Arc<P>>,
}

impl<P: WalletProvider + 'static> ChainGateway<P> {
    /// Create a gateway from the result of provider detection
    pub fn new(provider: Option<P>) -> Self {
        Self {
            provider: provider.map(Arc::new),
        }
    }

    /// Create a gateway sharing an existing provider handle
    pub fn with_shared(provider: Arc<P>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Whether a wallet provider is present
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    fn provider(&self) -> Result<&Arc<P>> {
        self.provider.as_ref().ok_or(WavePortalError::NoProvider)
    }

    /// Build the contract proxy bound to this gateway's provider
    ///
    /// Writes through the proxy are signed by the wallet behind the provider.
    pub fn bind_contract(&self, config: &PortalConfig) -> Result<WavePortalContract<P>> {
        let provider = self.provider()?;
        log::debug!("📜 Binding WavePortal at {}", config.contract_address);
        Ok(WavePortalContract::new(Arc::clone(provider), config))
    }
}

#[async_trait]
impl<P: WalletProvider + 'static> AccountGateway for ChainGateway<P> {
    async fn list_authorized_accounts(&self) -> Result<Vec<Account>> {
        let provider = self.provider()?;
        let accounts = provider
            .request("eth_accounts", json!([]))
            .await
            .map_err(WavePortalError::from)?;
        let accounts = parse_accounts(&accounts)?;

        if accounts.is_empty() {
            log::info!("🔒 No authorized account found");
        } else {
            log::info!("🔓 Found {} authorized account(s)", accounts.len());
        }
        Ok(accounts)
    }

    async fn request_connection(&self) -> Result<Account> {
        let provider = self.provider()?;
        log::info!("👛 Requesting wallet connection");

        let accounts = provider
            .request("eth_requestAccounts", json!([]))
            .await
            .map_err(|e| {
                if e.is_user_rejection() {
                    log::warn!("   🙅 Connection rejected by user");
                    WavePortalError::UserRejected
                } else {
                    log::error!("   ❌ Connection request failed: {}", e);
                    WavePortalError::from(e)
                }
            })?;

        let account = parse_accounts(&accounts)?
            .into_iter()
            .next()
            .ok_or(WavePortalError::UserRejected)?;
        log::info!("   ✅ Connected {}", account);
        Ok(account)
    }
}

fn parse_accounts(value: &Value) -> Result<Vec<Account>> {
    let entries = value
        .as_array()
        .ok_or_else(|| WavePortalError::invalid_response(format!("expected account list, got {}", value)))?;

    entries
        .iter()
        .map(|entry| {
            let raw = entry.as_str().ok_or_else(|| {
                WavePortalError::invalid_response(format!("account is not a string: {}", entry))
            })?;
            Account::from_str(raw).map_err(|e| {
                WavePortalError::invalid_response(format!("invalid account '{}': {}", raw, e))
            })
        })
        .collect()
}
