//! Wave Portal: wallet-backed client for the WavePortal contract
//!
//! Connects a wallet, sends "wave" transactions to the contract and keeps a
//! live, append-only feed of every `NewWave` event the contract emits.
//!
//! # Architecture
//!
//! - **Chain Gateway**: account discovery and connection through the wallet provider
//! - **Contract Proxy**: typed reads, the wave write, and the `NewWave` live feed
//! - **Wave Synchronizer**: hydration, deduplicated merge of live events, and
//!   the submit → pending → confirmed write lifecycle
//!
//! No state is persisted: every session rebuilds its view from the chain.
//!
//! # Example
//!
//! ```ignore
//! use wave_portal::{detect_provider, ChainGateway, PortalConfig, WaveSynchronizer};
//!
//! let config = PortalConfig::from_env();
//! let gateway = ChainGateway::new(detect_provider(&config));
//! let contract = gateway.bind_contract(&config)?;
//! let mut sync = WaveSynchronizer::new(gateway, contract);
//!
//! sync.check_connection().await?;
//! sync.submit_wave("gm").await?;
//! ```

pub mod abi;
pub mod config;
pub mod contract;
pub mod error;
pub mod gateway;
pub mod provider;
pub mod subscription;
pub mod synchronizer;
pub mod types;

// Re-exports for convenience
pub use config::PortalConfig;
pub use contract::{LiveWave, WaveCallback, WaveContract, WavePortalContract};
pub use error::WavePortalError;
pub use gateway::{AccountGateway, ChainGateway};
pub use provider::{detect_provider, HttpProvider, ProviderError, WalletProvider};
pub use subscription::Subscription;
pub use synchronizer::{LiveOutcome, WaveSynchronizer};
pub use types::{Account, Receipt, SyncPhase, TransactionState, TxHandle, WaveEvent};

// Common result type
pub type Result<T> = std::result::Result<T, WavePortalError>;
