/**
* filename : tasks
* author : HAMA
* date: 2025. 4. 6.
* description: 
**/
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;

use crate::fetcher::fetcher::HeaderFetcher;
use crate::fetcher::runner::run_block_watcher;
use crate::types::HeaderSender;

pub fn spawn_block_watcher<F: HeaderFetcher + 'static>(
  fetcher: Arc<F>,
  sender: HeaderSender,
  start_height: Option<u64>,
  interval_secs: u64,
) -> JoinHandle<()> {
  tokio::spawn(run_block_watcher(
    fetcher,
    sender,
    start_height,
    Duration::from_secs(interval_secs),
  ))
}
