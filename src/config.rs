//! Portal configuration from environment variables
//!
//! Controls which endpoint stands in for the wallet provider, which contract
//! the client talks to, and how aggressively it polls the chain.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::Address;

/// Address of the reference WavePortal deployment
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x6e7524a02923209A743E04a036CAe435e634F6c6";

/// Gas ceiling attached to every wave transaction
pub const DEFAULT_GAS_LIMIT: u64 = 300_000;

const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_CONFIRMATION_ATTEMPTS: u32 = 120;

#[derive(Clone, Debug)]
pub struct PortalConfig {
    /// Wallet / node JSON-RPC endpoint. `None` means no provider is present.
    pub rpc_url: Option<String>,
    /// WavePortal contract address
    pub contract_address: Address,
    /// Gas ceiling for `wave(string)`
    pub gas_limit: u64,
    /// Interval between receipt and log-filter polls
    pub poll_interval: Duration,
    /// Receipt polls before giving up on a confirmation
    pub confirmation_attempts: u32,
}

impl PortalConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `WAVE_RPC_URL`: provider endpoint (unset = no wallet available)
    /// - `WAVE_CONTRACT_ADDRESS`: contract address (defaults to the reference deployment)
    /// - `WAVE_GAS_LIMIT`: gas ceiling for waves (default 300000)
    /// - `WAVE_POLL_INTERVAL_MS`: polling interval in milliseconds (default 1000)
    /// - `WAVE_CONFIRMATION_ATTEMPTS`: receipt polls before timing out (default 120)
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Local dev node with unlocked accounts
    /// WAVE_RPC_URL=http://localhost:8545 WAVE_CONTRACT_ADDRESS=0x5FbD... cargo run
    /// ```
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let rpc_url = env::var("WAVE_RPC_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        match &rpc_url {
            Some(url) => log::info!("🔗 Provider endpoint: {}", url),
            None => log::info!("🔌 No provider endpoint configured"),
        }

        let contract_address = match env::var("WAVE_CONTRACT_ADDRESS") {
            Ok(raw) => Address::from_str(raw.trim()).unwrap_or_else(|e| {
                log::warn!(
                    "⚠️  Invalid WAVE_CONTRACT_ADDRESS '{}' ({}), using {}",
                    raw,
                    e,
                    defaults.contract_address
                );
                defaults.contract_address
            }),
            Err(_) => defaults.contract_address,
        };
        log::info!("📜 Contract: {}", contract_address);

        let gas_limit = parse_var("WAVE_GAS_LIMIT", defaults.gas_limit);
        let poll_interval = Duration::from_millis(parse_var(
            "WAVE_POLL_INTERVAL_MS",
            DEFAULT_POLL_INTERVAL_MS,
        ));
        let confirmation_attempts =
            parse_var("WAVE_CONFIRMATION_ATTEMPTS", defaults.confirmation_attempts);

        Self {
            rpc_url,
            contract_address,
            gas_limit,
            poll_interval,
            confirmation_attempts,
        }
    }

    /// Longest time a confirmation wait can take before timing out
    pub fn confirmation_budget(&self) -> Duration {
        self.poll_interval * self.confirmation_attempts
    }
}

fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("⚠️  Invalid {} '{}', using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            contract_address: Address::from_str(DEFAULT_CONTRACT_ADDRESS)
                .unwrap_or(Address::ZERO),
            gas_limit: DEFAULT_GAS_LIMIT,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            confirmation_attempts: DEFAULT_CONFIRMATION_ATTEMPTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets_reference_deployment() {
        let config = PortalConfig::default();
        assert_eq!(
            config.contract_address,
            Address::from_str(DEFAULT_CONTRACT_ADDRESS).unwrap()
        );
        assert_eq!(config.gas_limit, 300_000);
        assert!(config.rpc_url.is_none());
    }

    #[test]
    fn test_confirmation_budget() {
        let config = PortalConfig {
            poll_interval: Duration::from_millis(500),
            confirmation_attempts: 10,
            ..Default::default()
        };
        assert_eq!(config.confirmation_budget(), Duration::from_secs(5));
    }
}
