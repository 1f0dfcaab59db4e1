/**
* filename : runner
* author : HAMA
* date: 2025. 4. 6.
* description: Polls the chain height and forwards every new block header.
**/

use crate::fetcher::fetcher::HeaderFetcher;
use crate::types::HeaderSender;

use log::{info, warn};
use std::sync::Arc;
use tokio::time::{interval, Duration};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Send headers from `start_height` onward, or from the current tip when
/// `start_height` is `None`. Returns once the receiver is dropped.
pub async fn run_block_watcher<F: HeaderFetcher + 'static>(
  fetcher: Arc<F>,
  sender: HeaderSender,
  start_height: Option<u64>,
  interval_duration: Duration,
) {
  // tokio's interval rejects a zero period
  let interval_duration = interval_duration.max(MIN_INTERVAL);
  let mut tick = interval(interval_duration);
  let retry_delay = interval_duration / 2;
  let mut next_height = start_height;
  info!(
    "[{} Watcher] Starting from {:?} with interval {:?}",
    fetcher.chain_name(),
    next_height,
    interval_duration
  );

  loop {
    tick.tick().await;

    let chain_height = match fetcher.fetch_height().await {
      Ok(height) => height,
      Err(e) => {
        warn!("[{} Watcher] Failed to read height: {} | retrying in {:?}", fetcher.chain_name(), e, retry_delay);
        tokio::time::sleep(retry_delay).await;
        continue;
      }
    };
    let mut height = *next_height.get_or_insert(chain_height.saturating_sub(1));

    while height < chain_height {
      match fetcher.fetch_header(height).await {
        Ok(header) => {
          info!("[{} Watcher] Block #{} fetched", fetcher.chain_name(), height);
          if sender.send(header).await.is_err() {
            info!("[{} Watcher] Receiver closed, stopping", fetcher.chain_name());
            return;
          }
          height += 1;
          next_height = Some(height);
        }
        Err(e) => {
          // keep the height and retry after half an interval
          warn!(
            "[{} Watcher] Failed to fetch block #{}: {} | retrying in {:?}",
            fetcher.chain_name(),
            height,
            e,
            retry_delay
          );
          tokio::time::sleep(retry_delay).await;
          break;
        }
      }
    }
  }
}
