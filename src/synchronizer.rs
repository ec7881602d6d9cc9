//! Wave Synchronizer
//!
//! Owns the local view of the portal: connected account, total wave count and
//! the ordered, deduplicated wave list. Every mutation of that view happens
//! through `&mut self`, so the synchronizer is the single writer even though
//! live events, reads and the write path all arrive asynchronously.
//!
//! # Hydration order
//!
//! On entering `Connected` the live subscription is opened first and its
//! events are buffered in a channel. The historical list and total count are
//! read next, and only then is the buffer drained into the list. The history
//! is stored exactly as the chain returns it, and a live event is dropped only
//! when the same triple is already part of that history. Nothing emitted
//! during hydration is lost and nothing already in the history is appended
//! twice. If hydration fails the feed is released along with its buffer, so
//! live events are never applied on top of a list that was not reloaded.
//!
//! # Errors
//!
//! Every operation returns its error and also records it as `last_error`.
//! After any operation returns, the phase is either `Disconnected` or
//! `Connected`.

use std::collections::HashSet;

use tokio::sync::mpsc;

use crate::contract::{LiveWave, WaveContract};
use crate::gateway::AccountGateway;
use crate::subscription::Subscription;
use crate::types::{Account, Receipt, SyncPhase, TransactionState, WaveEvent};
use crate::{Result, WavePortalError};

/// What happened to one item taken from the live feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveOutcome {
    /// A new wave was appended to the list
    Appended(WaveEvent),
    /// The wave is already part of the loaded history and was ignored
    Duplicate,
    /// There is no live feed (never opened, released, or disconnected)
    Closed,
}

pub struct WaveSynchronizer<G, C> {
    gateway: G,
    contract: C,

    phase: SyncPhase,
    account: Option<Account>,
    total_count: Option<u64>,
    waves: Vec<WaveEvent>,
    /// Structural identities of the last loaded history
    seen: HashSet<WaveEvent>,
    transaction: TransactionState,
    last_error: Option<WavePortalError>,

    subscription: Option<Subscription>,
    live_rx: Option<mpsc::UnboundedReceiver<LiveWave>>,
}

impl<G: AccountGateway, C: WaveContract> WaveSynchronizer<G, C> {
    pub fn new(gateway: G, contract: C) -> Self {
        Self {
            gateway,
            contract,
            phase: SyncPhase::Disconnected,
            account: None,
            total_count: None,
            waves: Vec::new(),
            seen: HashSet::new(),
            transaction: TransactionState::Idle,
            last_error: None,
            subscription: None,
            live_rx: None,
        }
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn account(&self) -> Option<Account> {
        self.account
    }

    /// Last total read from the contract, `None` before the first read
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Known waves in chain order
    pub fn waves(&self) -> &[WaveEvent] {
        &self.waves
    }

    pub fn transaction_state(&self) -> &TransactionState {
        &self.transaction
    }

    pub fn last_error(&self) -> Option<&WavePortalError> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn has_live_feed(&self) -> bool {
        self.subscription.as_ref().is_some_and(Subscription::is_active)
    }

    /// Human-readable status for presentation
    pub fn status_label(&self) -> String {
        if let Some(err) = &self.last_error {
            return err.to_string();
        }
        match (&self.phase, &self.transaction) {
            (SyncPhase::Disconnected, _) => "Not connected".to_string(),
            (SyncPhase::Connecting, _) => "Waiting for wallet approval...".to_string(),
            (SyncPhase::Submitting, _) => "Waiting for signature...".to_string(),
            (SyncPhase::Submitted(handle), _) => format!("Mining {}...", handle),
            (SyncPhase::Connected, TransactionState::Confirmed(handle)) => {
                format!("Mined {}", handle)
            }
            (SyncPhase::Connected, _) => match self.account {
                Some(account) => format!("Connected as {}", account),
                None => "Connected".to_string(),
            },
        }
    }

    // ============================================================================
    // Connection
    // ============================================================================

    /// Passive connection check, run at startup and whenever the wallet may
    /// have changed. Never prompts the user.
    ///
    /// Adopts the first authorized account. Zero authorized accounts means the
    /// session is disconnected.
    pub async fn check_connection(&mut self) -> Result<SyncPhase> {
        log::info!("🔍 Checking for an authorized account");

        let accounts = match self.gateway.list_authorized_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                log::warn!("   ⚠️  Account check failed: {}", e);
                if self.account.is_none() {
                    self.phase = SyncPhase::Disconnected;
                }
                return Err(self.record(e));
            }
        };

        match accounts.first().copied() {
            Some(account) if self.account == Some(account) && self.phase == SyncPhase::Connected => {
                log::debug!("   Still connected as {}", account);
            }
            Some(account) => {
                if let Some(previous) = self.account.filter(|previous| *previous != account) {
                    // Switching wallets is a disconnect of the old account first
                    log::warn!("   🔁 Wallet switched from {} to {}", previous, account);
                    self.enter_disconnected();
                }
                self.enter_connected(account).await;
            }
            None => {
                if self.account.is_some() {
                    log::warn!("   🔌 Wallet no longer authorizes this client");
                }
                self.enter_disconnected();
            }
        }
        Ok(self.phase)
    }

    /// User "connect" intent. May show a wallet prompt.
    pub async fn connect(&mut self) -> Result<Account> {
        if let (SyncPhase::Connected, Some(account)) = (self.phase, self.account) {
            log::debug!("Already connected as {}", account);
            return Ok(account);
        }

        self.phase = SyncPhase::Connecting;
        match self.gateway.request_connection().await {
            Ok(account) => {
                self.enter_connected(account).await;
                Ok(account)
            }
            Err(e) => {
                log::warn!("   ⚠️  Connection failed: {}", e);
                self.enter_disconnected();
                Err(self.record(e))
            }
        }
    }

    /// Adopt `account` and hydrate. Hydration failures are recorded and leave
    /// the session connected, without a live feed, so a later `resync()` can
    /// recover.
    async fn enter_connected(&mut self, account: Account) {
        log::info!("🔓 Connected as {}", account);
        self.account = Some(account);
        self.phase = SyncPhase::Connected;
        self.last_error = None;

        if let Err(e) = self.hydrate().await {
            self.record(e);
        }
    }

    fn enter_disconnected(&mut self) {
        self.release_live_feed();
        self.account = None;
        self.phase = SyncPhase::Disconnected;
    }

    // ============================================================================
    // Hydration and live feed
    // ============================================================================

    /// Reload total count and history from the chain and reopen the live feed
    pub async fn resync(&mut self) -> Result<()> {
        if self.phase != SyncPhase::Connected {
            return Err(self.record(WavePortalError::NotConnected));
        }
        match self.hydrate().await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.record(e)),
        }
    }

    async fn hydrate(&mut self) -> Result<()> {
        log::info!("💧 Hydrating wave feed");

        // Any previous listener goes away before a new one is registered
        self.release_live_feed();

        let result = self.load_history().await;
        if let Err(e) = &result {
            log::error!("   ❌ Hydration failed: {}", e);
            // Buffered events must not land on a list that was not reloaded
            self.release_live_feed();
        }
        result
    }

    async fn load_history(&mut self) -> Result<()> {
        let (tx, rx) = mpsc::unbounded_channel::<LiveWave>();
        match self
            .contract
            .subscribe_new_wave(Box::new(move |item| {
                let _ = tx.send(item);
            }))
            .await
        {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                self.live_rx = Some(rx);
            }
            Err(e) => {
                // History is still worth loading without a live feed
                log::warn!("   ⚠️  Live feed unavailable: {}", e);
                self.record(e);
            }
        }

        let total = self.contract.get_total_count().await?;
        let history = self.contract.list_all_events().await?;

        self.total_count = Some(total);
        self.seen.clear();
        self.seen.extend(history.iter().cloned());
        self.waves = history;
        log::info!(
            "   ✅ Hydrated {} wave(s), total count {}",
            self.waves.len(),
            total
        );

        let buffered = self.drain_live_events();
        if buffered > 0 {
            log::debug!("   Merged {} wave(s) received during hydration", buffered);
        }
        Ok(())
    }

    /// Apply every live event already received, without waiting
    ///
    /// Returns the number of waves appended.
    pub fn drain_live_events(&mut self) -> usize {
        let mut appended = 0;
        loop {
            let item = match self.live_rx.as_mut() {
                Some(rx) => match rx.try_recv() {
                    Ok(item) => item,
                    Err(_) => break,
                },
                None => break,
            };
            if let LiveOutcome::Appended(_) = self.apply_live(item) {
                appended += 1;
            }
        }
        appended
    }

    /// Wait for the next live event and apply it
    pub async fn next_live_event(&mut self) -> LiveOutcome {
        let item = match self.live_rx.as_mut() {
            Some(rx) => rx.recv().await,
            None => return LiveOutcome::Closed,
        };
        match item {
            Some(item) => self.apply_live(item),
            None => {
                self.release_live_feed();
                LiveOutcome::Closed
            }
        }
    }

    fn apply_live(&mut self, item: LiveWave) -> LiveOutcome {
        match item {
            Ok(event) => {
                if self.seen.contains(&event) {
                    log::debug!("   Wave already in history: {}", event);
                    return LiveOutcome::Duplicate;
                }
                log::info!("🌊 New wave: {}", event);
                self.waves.push(event.clone());
                LiveOutcome::Appended(event)
            }
            Err(e) => {
                log::error!("   ❌ Live feed closed: {}", e);
                self.release_live_feed();
                self.record(e);
                LiveOutcome::Closed
            }
        }
    }

    fn release_live_feed(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.release();
        }
        self.live_rx = None;
    }

    /// Release the live feed. Call when the owner of the synchronizer goes away.
    pub fn shutdown(&mut self) {
        log::info!("🛑 Shutting down wave synchronizer");
        self.release_live_feed();
    }

    // ============================================================================
    // Write path
    // ============================================================================

    /// User "submit wave" intent
    ///
    /// The local list is not touched: the wave shows up only when the live
    /// feed (or a resync) reports it from the chain. The total count is only
    /// changed by explicit reads before submission and after confirmation.
    pub async fn submit_wave(&mut self, message: &str) -> Result<Receipt> {
        if message.trim().is_empty() {
            return Err(self.record(WavePortalError::EmptyMessage));
        }
        let account = match (self.phase, self.account) {
            (SyncPhase::Connected, Some(account)) => account,
            _ => return Err(self.record(WavePortalError::NotConnected)),
        };
        self.last_error = None;

        match self.contract.get_total_count().await {
            Ok(total) => self.total_count = Some(total),
            Err(e) => {
                log::warn!("   ⚠️  Pre-submission count read failed: {}", e);
                return Err(self.record(e));
            }
        }

        self.phase = SyncPhase::Submitting;
        self.transaction = TransactionState::Submitting;
        let handle = match self.contract.submit_wave(account, message).await {
            Ok(handle) => handle,
            Err(e) => return Err(self.fail_transaction(e)),
        };

        self.phase = SyncPhase::Submitted(handle);
        self.transaction = TransactionState::Pending(handle);
        let receipt = match self.contract.await_confirmation(handle).await {
            Ok(receipt) => receipt,
            Err(e) => return Err(self.fail_transaction(e)),
        };

        self.transaction = TransactionState::Confirmed(handle);
        self.phase = SyncPhase::Connected;
        log::info!("   ✅ Wave confirmed: {}", handle);

        match self.contract.get_total_count().await {
            Ok(total) => self.total_count = Some(total),
            Err(e) => {
                log::warn!("   ⚠️  Post-confirmation count read failed: {}", e);
                self.record(e);
            }
        }
        self.drain_live_events();

        Ok(receipt)
    }

    fn fail_transaction(&mut self, err: WavePortalError) -> WavePortalError {
        log::error!("   ❌ Wave failed: {}", err);
        self.transaction = TransactionState::Failed(err.to_string());
        self.phase = SyncPhase::Connected;
        self.drain_live_events();
        self.record(err)
    }

    fn record(&mut self, err: WavePortalError) -> WavePortalError {
        self.last_error = Some(err.clone());
        err
    }
}
