// src/main.rs
/**
* author : HAMA
* date: 2025. 4. 6.
* description: Connects to monerod and logs every new block header.
**/

use xmr_daemon_rpc::config::Settings;
use xmr_daemon_rpc::coin::monero::model::BlockHeader;
use xmr_daemon_rpc::fetcher::monero_fetcher::MoneroFetcher;
use xmr_daemon_rpc::shutdown::shutdown_signal;
use xmr_daemon_rpc::tasks::spawn_block_watcher;
use xmr_daemon_rpc::types::HeaderReceiver;
use xmr_daemon_rpc::utils::atomic_to_xmr;
use xmr_daemon_rpc::{DaemonError, HttpTransport, MoneroDaemon};

use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

async fn log_headers(mut receiver: HeaderReceiver) {
  while let Some(header) = receiver.recv().await {
    log_header(&header);
  }
}

fn log_header(header: &BlockHeader) {
  info!(
    "Block #{} {} | {} txs | reward {} XMR",
    header.height.unwrap_or_default(),
    header.hash.as_deref().unwrap_or("?"),
    header.num_txs.unwrap_or_default(),
    atomic_to_xmr(header.reward.unwrap_or_default()),
  );
}

#[tokio::main]
async fn main() -> Result<(), DaemonError> {
  // 1. Initialize logging
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
  info!("Application starting...");
  
  // 2. Load configuration
  let settings = Settings::new()?;
  info!("Configuration loaded. Daemon at {}", settings.daemon.uri);
  
  // 3. Create the daemon facade
  let transport = HttpTransport::new(settings.daemon.uri.clone(), Duration::from_secs(settings.daemon.timeout_secs))?;
  let daemon = Arc::new(MoneroDaemon::new(Arc::new(transport)));
  
  match daemon.get_info().await {
    Ok(info) => info!(
      "Connected: {:?} height {} (synchronized: {})",
      info.network_type,
      info.height.unwrap_or_default(),
      info.is_synchronized.unwrap_or_default()
    ),
    Err(e) => warn!("Daemon not reachable yet: {}", e),
  }
  
  if !settings.watcher.enabled {
    info!("Block watcher disabled. Exiting.");
    return Ok(());
  }
  
  // 4. Spawn the watcher and the header logger
  let (sender, receiver) = mpsc::channel::<BlockHeader>(128);
  let fetcher = Arc::new(MoneroFetcher { daemon: daemon.clone() });
  let watcher_handle = spawn_block_watcher(
    fetcher,
    sender,
    settings.watcher.start_height,
    settings.watcher.interval_secs,
  );
  let logger_handle = tokio::spawn(log_headers(receiver));
  
  // 5. Wait for shutdown signal
  shutdown_signal().await;
  info!("Stopping tasks...");
  
  watcher_handle.abort();
  let _ = logger_handle.await;
  
  info!("Application exited cleanly.");
  Ok(())
}
