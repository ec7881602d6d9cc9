/// Wave Portal runner
///
/// Connects to the configured wallet provider, prints the wave feed, sends a
/// wave when `WAVE_MESSAGE` is set, then follows new waves until Ctrl-C.
use anyhow::{Context, Result};
use std::env;

use wave_portal::{
    detect_provider, ChainGateway, LiveOutcome, PortalConfig, SyncPhase, WavePortalError,
    WaveSynchronizer,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok(); // Load .env file if present

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Wave Portal...");
    let config = PortalConfig::from_env();

    let gateway = ChainGateway::new(detect_provider(&config));
    let contract = match gateway.bind_contract(&config) {
        Ok(contract) => contract,
        Err(WavePortalError::NoProvider) => {
            log::error!("{}", WavePortalError::NoProvider);
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to bind contract"),
    };
    let mut sync = WaveSynchronizer::new(gateway, contract);

    if let Err(e) = sync.check_connection().await {
        log::warn!("Passive connection check failed: {}", e);
    }
    if sync.phase() == SyncPhase::Disconnected {
        sync.connect().await.context("Failed to connect wallet")?;
    }

    for wave in sync.waves() {
        println!("{}", wave);
    }
    if let Some(total) = sync.total_count() {
        println!("Total waves: {}", total);
    }

    if let Ok(message) = env::var("WAVE_MESSAGE") {
        match sync.submit_wave(&message).await {
            Ok(receipt) => log::info!("Wave mined in block {:?}", receipt.block_number),
            Err(e) => log::error!("Wave failed: {}", e),
        }
        log::info!("{}", sync.status_label());
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            outcome = sync.next_live_event() => match outcome {
                LiveOutcome::Appended(wave) => println!("{}", wave),
                LiveOutcome::Duplicate => {}
                LiveOutcome::Closed => {
                    log::warn!("Live feed closed: {}", sync.status_label());
                    break;
                }
            }
        }
    }

    sync.shutdown();
    Ok(())
}
