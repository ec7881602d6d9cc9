//! Wallet provider port
//!
//! The provider is the only thing that talks to the wallet or the node. It is
//! modelled after the EIP-1193 `request({ method, params })` surface so the
//! same adapters work against an injected wallet bridge, a local dev node, or
//! a scripted mock in tests.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::PortalConfig;
use crate::WavePortalError;

/// User rejected the request
pub const USER_REJECTED_REQUEST: i64 = 4001;
/// The requested account or method has not been authorized
pub const UNAUTHORIZED: i64 = 4100;
/// The provider is disconnected from all chains
pub const DISCONNECTED: i64 = 4900;
/// The provider is not connected to the requested chain
pub const CHAIN_DISCONNECTED: i64 = 4901;

/// Error reported by a wallet provider, with its EIP-1193 / JSON-RPC code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn disconnected(message: impl Into<String>) -> Self {
        Self::new(DISCONNECTED, message)
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED_REQUEST
    }

    pub fn is_disconnect(&self) -> bool {
        matches!(self.code, DISCONNECTED | CHAIN_DISCONNECTED)
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for ProviderError {}

impl From<ProviderError> for WavePortalError {
    fn from(err: ProviderError) -> Self {
        if err.is_disconnect() {
            Self::ProviderDisconnected(err.message)
        } else {
            Self::Rpc {
                code: err.code,
                message: err.message,
            }
        }
    }
}

/// Anything that can answer EIP-1193 style requests
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;
}

#[async_trait]
impl<P: WalletProvider + ?Sized> WalletProvider for Arc<P> {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        (**self).request(method, params).await
    }
}

/// JSON-RPC over HTTP provider
///
/// Useful against a dev node with unlocked accounts or a local wallet bridge
/// exposing the wallet's RPC surface.
pub struct HttpProvider {
    url: String,
    /// reqwest::Client is internally Arc-based
    http_client: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http_client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl WalletProvider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        log::debug!("   ➡️  {} #{}", method, id);

        let response = self
            .http_client
            .post(&self.url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .send()
            .await
            .map_err(|e| {
                log::error!("   ❌ HTTP request failed: {}", e);
                ProviderError::disconnected(format!("HTTP error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            log::error!("   ❌ HTTP error: {}", status);
            return Err(ProviderError::disconnected(format!("HTTP {}", status)));
        }

        let body: Value = response.json().await.map_err(|e| {
            log::error!("   ❌ JSON parse failed: {}", e);
            ProviderError::new(-32700, format!("Invalid JSON: {}", e))
        })?;

        if let Some(error) = body.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(-32603);
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            log::debug!("   ⚠️  {} #{} failed: {} ({})", method, id, message, code);
            return Err(ProviderError::new(code, message));
        }

        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }
}

/// Look up the wallet provider for this session
///
/// Absence is a normal state: this never fails, it returns `None` when no
/// endpoint is configured or the configured one is not a usable URL.
pub fn detect_provider(config: &PortalConfig) -> Option<HttpProvider> {
    let url = config.rpc_url.as_deref()?;
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
            log::info!("👛 Wallet provider detected at {}", url);
            Some(HttpProvider::new(url))
        }
        Ok(parsed) => {
            log::warn!("⚠️  Unsupported provider scheme '{}'", parsed.scheme());
            None
        }
        Err(e) => {
            log::warn!("⚠️  Invalid provider URL '{}': {}", url, e);
            None
        }
    }
}
