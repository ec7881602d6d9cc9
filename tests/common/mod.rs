//! Common test utilities for Wave Portal integration tests
//!
//! This module provides shared test infrastructure including:
//! - A scripted EIP-1193 provider for exercising the gateway and contract proxy
//! - A fake account gateway and a fake in-memory contract for the synchronizer
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use serde_json::Value;
use wave_portal::{
    Account, AccountGateway, ProviderError, Receipt, Subscription, TxHandle, WaveCallback,
    WaveContract, WaveEvent, WavePortalError, WalletProvider,
};

/// Initialize logging once for the test binary
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

pub fn account(byte: u8) -> Account {
    Address::repeat_byte(byte)
}

pub fn wave(sender: u8, secs: u64, message: &str) -> WaveEvent {
    WaveEvent::from_unix_seconds(account(sender), secs, message.to_string())
        .expect("valid timestamp")
}

pub fn tx(byte: u8) -> TxHandle {
    TxHandle(B256::repeat_byte(byte))
}

// ============================================================================
// Scripted provider
// ============================================================================

type Reply = Result<Value, ProviderError>;

/// Provider answering from per-method queues
///
/// The last queued reply for a method is reused once the queue runs dry, so a
/// single `reply` covers repeated polls. Unscripted methods answer `null`.
#[derive(Default)]
pub struct MockProvider {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, method: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter(|(m, _)| m == method)
            .map(|(_, params)| params)
            .collect()
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params));

        let mut replies = self.replies.lock().unwrap();
        match replies.get_mut(method) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Ok(Value::Null)),
            Some(queue) => queue.front().cloned().unwrap_or(Ok(Value::Null)),
            None => Ok(Value::Null),
        }
    }
}

// ============================================================================
// Fake gateway
// ============================================================================

#[derive(Clone)]
pub struct FakeGateway {
    inner: Arc<FakeGatewayState>,
}

struct FakeGatewayState {
    authorized: Mutex<wave_portal::Result<Vec<Account>>>,
    connection: Mutex<wave_portal::Result<Account>>,
    prompts: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(FakeGatewayState {
                authorized: Mutex::new(Ok(Vec::new())),
                connection: Mutex::new(Err(WavePortalError::UserRejected)),
                prompts: AtomicUsize::new(0),
            }),
        }
    }

    pub fn authorize(&self, accounts: Vec<Account>) {
        *self.inner.authorized.lock().unwrap() = Ok(accounts);
    }

    pub fn fail_listing(&self, err: WavePortalError) {
        *self.inner.authorized.lock().unwrap() = Err(err);
    }

    pub fn on_connect(&self, result: wave_portal::Result<Account>) {
        *self.inner.connection.lock().unwrap() = result;
    }

    /// Number of user-facing prompts shown
    pub fn prompts(&self) -> usize {
        self.inner.prompts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountGateway for FakeGateway {
    async fn list_authorized_accounts(&self) -> wave_portal::Result<Vec<Account>> {
        self.inner.authorized.lock().unwrap().clone()
    }

    async fn request_connection(&self) -> wave_portal::Result<Account> {
        self.inner.prompts.fetch_add(1, Ordering::SeqCst);
        self.inner.connection.lock().unwrap().clone()
    }
}

// ============================================================================
// Fake contract
// ============================================================================

struct Listener {
    alive: Arc<AtomicBool>,
    callback: WaveCallback,
}

struct FakeChainState {
    total: Mutex<u64>,
    history: Mutex<Vec<WaveEvent>>,
    /// Emitted through live listeners while the history is being read
    during_history: Mutex<Vec<WaveEvent>>,
    submit_result: Mutex<wave_portal::Result<TxHandle>>,
    confirm_result: Mutex<wave_portal::Result<Receipt>>,
    /// Total reported after a successful confirmation
    total_after_confirm: Mutex<Option<u64>>,
    subscribe_error: Mutex<Option<WavePortalError>>,
    count_error: Mutex<Option<WavePortalError>>,
    history_error: Mutex<Option<WavePortalError>>,
    listeners: Mutex<Vec<Listener>>,
    submit_calls: AtomicUsize,
    count_reads: AtomicUsize,
}

#[derive(Clone)]
pub struct FakeChain {
    inner: Arc<FakeChainState>,
}

impl FakeChain {
    pub fn new(total: u64, history: Vec<WaveEvent>) -> Self {
        let handle = tx(0x77);
        Self {
            inner: Arc::new(FakeChainState {
                total: Mutex::new(total),
                history: Mutex::new(history),
                during_history: Mutex::new(Vec::new()),
                submit_result: Mutex::new(Ok(handle)),
                confirm_result: Mutex::new(Ok(Receipt {
                    tx_hash: handle,
                    block_number: Some(1),
                    gas_used: Some(21_000),
                })),
                total_after_confirm: Mutex::new(None),
                subscribe_error: Mutex::new(None),
                count_error: Mutex::new(None),
                history_error: Mutex::new(None),
                listeners: Mutex::new(Vec::new()),
                submit_calls: AtomicUsize::new(0),
                count_reads: AtomicUsize::new(0),
            }),
        }
    }

    pub fn set_total(&self, total: u64) {
        *self.inner.total.lock().unwrap() = total;
    }

    pub fn set_history(&self, history: Vec<WaveEvent>) {
        *self.inner.history.lock().unwrap() = history;
    }

    pub fn emit_during_history(&self, events: Vec<WaveEvent>) {
        *self.inner.during_history.lock().unwrap() = events;
    }

    pub fn on_submit(&self, result: wave_portal::Result<TxHandle>) {
        *self.inner.submit_result.lock().unwrap() = result;
    }

    pub fn on_confirm(&self, result: wave_portal::Result<Receipt>) {
        *self.inner.confirm_result.lock().unwrap() = result;
    }

    pub fn total_after_confirm(&self, total: u64) {
        *self.inner.total_after_confirm.lock().unwrap() = Some(total);
    }

    pub fn fail_subscribe(&self, err: WavePortalError) {
        *self.inner.subscribe_error.lock().unwrap() = Some(err);
    }

    pub fn fail_count(&self, err: WavePortalError) {
        *self.inner.count_error.lock().unwrap() = Some(err);
    }

    /// Fail the history read, after any `emit_during_history` events went out
    pub fn fail_history(&self, err: WavePortalError) {
        *self.inner.history_error.lock().unwrap() = Some(err);
    }

    pub fn clear_read_failures(&self) {
        *self.inner.count_error.lock().unwrap() = None;
        *self.inner.history_error.lock().unwrap() = None;
    }

    /// Push a live item to every registered listener; returns how many
    /// listeners were invoked
    pub fn push(&self, item: wave_portal::LiveWave) -> usize {
        let listeners = self.inner.listeners.lock().unwrap();
        let mut invoked = 0;
        for listener in listeners.iter() {
            if listener.alive.load(Ordering::SeqCst) {
                (listener.callback)(item.clone());
                invoked += 1;
            }
        }
        invoked
    }

    pub fn emit(&self, event: WaveEvent) -> usize {
        self.push(Ok(event))
    }

    pub fn active_listeners(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.alive.load(Ordering::SeqCst))
            .count()
    }

    pub fn submit_calls(&self) -> usize {
        self.inner.submit_calls.load(Ordering::SeqCst)
    }

    pub fn count_reads(&self) -> usize {
        self.inner.count_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WaveContract for FakeChain {
    async fn get_total_count(&self) -> wave_portal::Result<u64> {
        self.inner.count_reads.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.inner.count_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(*self.inner.total.lock().unwrap())
    }

    async fn list_all_events(&self) -> wave_portal::Result<Vec<WaveEvent>> {
        let during = std::mem::take(&mut *self.inner.during_history.lock().unwrap());
        for event in during {
            self.emit(event);
        }
        if let Some(err) = self.inner.history_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.inner.history.lock().unwrap().clone())
    }

    async fn submit_wave(&self, _from: Account, _message: &str) -> wave_portal::Result<TxHandle> {
        self.inner.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.submit_result.lock().unwrap().clone()
    }

    async fn await_confirmation(&self, _handle: TxHandle) -> wave_portal::Result<Receipt> {
        let result = self.inner.confirm_result.lock().unwrap().clone();
        if result.is_ok() {
            if let Some(total) = *self.inner.total_after_confirm.lock().unwrap() {
                self.set_total(total);
            }
        }
        result
    }

    async fn subscribe_new_wave(&self, callback: WaveCallback) -> wave_portal::Result<Subscription> {
        if let Some(err) = self.inner.subscribe_error.lock().unwrap().clone() {
            return Err(err);
        }

        let alive = Arc::new(AtomicBool::new(true));
        let mut listeners = self.inner.listeners.lock().unwrap();
        listeners.push(Listener {
            alive: Arc::clone(&alive),
            callback,
        });
        let id = format!("0x{:x}", listeners.len());

        Ok(Subscription::new(id, move || {
            alive.store(false, Ordering::SeqCst);
        }))
    }
}
