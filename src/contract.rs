//! Contract Proxy
//!
//! Typed read/write access to the WavePortal contract through a wallet
//! provider. Reads go through `eth_call`, the write is `eth_sendTransaction`
//! signed by the wallet, and the live feed polls a log filter on the
//! `NewWave` event.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use alloy_sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::abi::IWavePortal;
use crate::config::PortalConfig;
use crate::provider::WalletProvider;
use crate::subscription::Subscription;
use crate::types::{Account, Receipt, TxHandle, WaveEvent};
use crate::{Result, WavePortalError};

/// One item delivered by the live feed
///
/// `Err` is only ever `ProviderDisconnected` and is the last item the feed
/// delivers.
pub type LiveWave = Result<WaveEvent>;

/// Push listener for new waves
pub type WaveCallback = Box<dyn Fn(LiveWave) + Send + Sync>;

/// Read/write interface of the deployed contract
#[async_trait]
pub trait WaveContract: Send + Sync {
    /// Total number of waves recorded on chain
    async fn get_total_count(&self) -> Result<u64>;

    /// Every wave ever recorded, in chain order
    async fn list_all_events(&self) -> Result<Vec<WaveEvent>>;

    /// Broadcast a wave signed by `from`. Returns once broadcast, not mined.
    async fn submit_wave(&self, from: Account, message: &str) -> Result<TxHandle>;

    /// Wait until the transaction is mined
    async fn await_confirmation(&self, handle: TxHandle) -> Result<Receipt>;

    /// Register a listener for `NewWave` events emitted from now on
    async fn subscribe_new_wave(&self, callback: WaveCallback) -> Result<Subscription>;
}

/// Provider-backed WavePortal proxy
pub struct WavePortalContract<P> {
    provider: Arc<P>,
    address: Address,
    gas_limit: u64,
    poll_interval: Duration,
    confirmation_attempts: u32,
}

impl<P: WalletProvider + 'static> WavePortalContract<P> {
    pub fn new(provider: Arc<P>, config: &PortalConfig) -> Self {
        Self {
            provider,
            address: config.contract_address,
            gas_limit: config.gas_limit,
            poll_interval: config.poll_interval,
            confirmation_attempts: config.confirmation_attempts.max(1),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Run a view function through `eth_call` and decode its return value
    async fn call<C: SolCall + Send>(&self, call: C) -> Result<C::Return> {
        let data = call.abi_encode();
        let result = self
            .provider
            .request(
                "eth_call",
                json!([
                    { "to": hex_address(&self.address), "data": hex_bytes(&data) },
                    "latest"
                ]),
            )
            .await
            .map_err(|e| {
                log::error!("   ❌ {} failed: {}", C::SIGNATURE, e);
                WavePortalError::from(e)
            })?;

        let bytes = parse_bytes(&result)?;
        C::abi_decode_returns(&bytes).map_err(|e| {
            WavePortalError::invalid_response(format!("cannot decode {}: {}", C::SIGNATURE, e))
        })
    }
}

#[async_trait]
impl<P: WalletProvider + 'static> WaveContract for WavePortalContract<P> {
    async fn get_total_count(&self) -> Result<u64> {
        let total = self.call(IWavePortal::getTotalWavesCall {}).await?;
        let total = u64::try_from(total).map_err(|_| {
            WavePortalError::invalid_response(format!("total wave count {} out of range", total))
        })?;
        log::info!("📊 Retrieved total wave count: {}", total);
        Ok(total)
    }

    async fn list_all_events(&self) -> Result<Vec<WaveEvent>> {
        let waves = self.call(IWavePortal::getAllWavesCall {}).await?;
        log::info!("📥 Retrieved {} historical wave(s)", waves.len());

        waves
            .into_iter()
            .map(|w| WaveEvent::from_chain(w.waver, w.timestamp, w.message))
            .collect()
    }

    async fn submit_wave(&self, from: Account, message: &str) -> Result<TxHandle> {
        log::info!("👋 Submitting wave from {}", from);
        log::debug!("   Message: {} bytes, gas limit {}", message.len(), self.gas_limit);

        let data = IWavePortal::waveCall {
            message: message.to_string(),
        }
        .abi_encode();

        let result = self
            .provider
            .request(
                "eth_sendTransaction",
                json!([{
                    "from": hex_address(&from),
                    "to": hex_address(&self.address),
                    "data": hex_bytes(&data),
                    "gas": format!("{:#x}", self.gas_limit),
                }]),
            )
            .await
            .map_err(|e| {
                log::error!("   ❌ Submission failed: {}", e);
                if e.is_user_rejection() {
                    WavePortalError::SubmissionRejected(e.message)
                } else if e.is_disconnect() {
                    WavePortalError::ProviderDisconnected(e.message)
                } else {
                    WavePortalError::GasEstimationFailed(e.message)
                }
            })?;

        let handle = TxHandle(parse_hash(&result)?);
        log::info!("   ⛏️  Mining... {}", handle);
        Ok(handle)
    }

    async fn await_confirmation(&self, handle: TxHandle) -> Result<Receipt> {
        let params = json!([hex_bytes(handle.0.as_slice())]);

        for attempt in 1..=self.confirmation_attempts {
            let result = self
                .provider
                .request("eth_getTransactionReceipt", params.clone())
                .await
                .map_err(WavePortalError::from)?;

            if result.is_null() {
                log::debug!(
                    "   ⏳ {} not mined yet (attempt {}/{})",
                    handle,
                    attempt,
                    self.confirmation_attempts
                );
                if attempt < self.confirmation_attempts {
                    tokio::time::sleep(self.poll_interval).await;
                }
                continue;
            }

            let status = result.get("status").and_then(Value::as_str).and_then(parse_quantity);
            if status == Some(0) {
                log::error!("   ❌ {} reverted", handle);
                return Err(WavePortalError::TransactionReverted { tx_hash: handle });
            }

            let receipt = Receipt {
                tx_hash: handle,
                block_number: result
                    .get("blockNumber")
                    .and_then(Value::as_str)
                    .and_then(parse_quantity),
                gas_used: result.get("gasUsed").and_then(Value::as_str).and_then(parse_quantity),
            };
            log::info!("   ✅ Mined {} in block {:?}", handle, receipt.block_number);
            return Ok(receipt);
        }

        log::error!("   ❌ Gave up waiting for {}", handle);
        Err(WavePortalError::ConfirmationTimeout(handle))
    }

    async fn subscribe_new_wave(&self, callback: WaveCallback) -> Result<Subscription> {
        let filter = json!([{
            "address": hex_address(&self.address),
            "topics": [hex_bytes(IWavePortal::NewWave::SIGNATURE_HASH.as_slice())],
        }]);

        let filter_id = self
            .provider
            .request("eth_newFilter", filter)
            .await
            .map_err(WavePortalError::from)?;
        let filter_id = filter_id
            .as_str()
            .ok_or_else(|| {
                WavePortalError::invalid_response(format!("invalid filter id: {}", filter_id))
            })?
            .to_string();
        log::info!("🔔 Listening for NewWave events (filter {})", filter_id);

        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let provider = Arc::clone(&self.provider);
        let poll_interval = self.poll_interval;
        let task_filter_id = filter_id.clone();

        tokio::spawn(async move {
            let params = json!([task_filter_id]);
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                tokio::select! {
                    _ = &mut cancel_rx => {
                        if let Err(e) = provider.request("eth_uninstallFilter", params.clone()).await {
                            log::debug!("   Filter {} uninstall failed: {}", task_filter_id, e);
                        }
                        break;
                    }
                    _ = ticker.tick() => {
                        match provider.request("eth_getFilterChanges", params.clone()).await {
                            Ok(logs) => {
                                for entry in logs.as_array().map(Vec::as_slice).unwrap_or_default() {
                                    if entry.get("removed").and_then(Value::as_bool) == Some(true) {
                                        continue;
                                    }
                                    match decode_wave_log(entry) {
                                        Ok(event) => {
                                            log::debug!("   🌊 NewWave {}", event);
                                            callback(Ok(event));
                                        }
                                        Err(e) => log::warn!("⚠️  Skipping undecodable NewWave log: {}", e),
                                    }
                                }
                            }
                            Err(e) if e.is_disconnect() => {
                                log::error!("   ❌ Live feed lost: {}", e);
                                callback(Err(WavePortalError::from(e)));
                                break;
                            }
                            Err(e) => log::warn!("⚠️  Filter poll failed: {}", e),
                        }
                    }
                }
            }
        });

        Ok(Subscription::new(filter_id, move || {
            let _ = cancel_tx.send(());
        }))
    }
}

fn hex_address(address: &Address) -> String {
    hex_bytes(address.as_slice())
}

fn hex_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn parse_bytes(value: &Value) -> Result<Vec<u8>> {
    let raw = value
        .as_str()
        .ok_or_else(|| WavePortalError::invalid_response(format!("expected hex data, got {}", value)))?;
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits)
        .map_err(|e| WavePortalError::invalid_response(format!("invalid hex data: {}", e)))
}

fn parse_hash(value: &Value) -> Result<B256> {
    let raw = value
        .as_str()
        .ok_or_else(|| WavePortalError::invalid_response(format!("expected hash, got {}", value)))?;
    B256::from_str(raw)
        .map_err(|e| WavePortalError::invalid_response(format!("invalid hash '{}': {}", raw, e)))
}

fn parse_quantity(raw: &str) -> Option<u64> {
    u64::from_str_radix(raw.strip_prefix("0x").unwrap_or(raw), 16).ok()
}

fn decode_wave_log(log: &Value) -> Result<WaveEvent> {
    let topics = log
        .get("topics")
        .and_then(Value::as_array)
        .ok_or_else(|| WavePortalError::invalid_response("log without topics"))?
        .iter()
        .map(parse_hash)
        .collect::<Result<Vec<B256>>>()?;
    let data = parse_bytes(log.get("data").unwrap_or(&Value::Null))?;

    let event = IWavePortal::NewWave::decode_raw_log(topics, &data)
        .map_err(|e| WavePortalError::invalid_response(format!("cannot decode NewWave: {}", e)))?;
    WaveEvent::from_chain(event.from, event.timestamp, event.message)
}
