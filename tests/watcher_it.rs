use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use xmr_daemon_rpc::coin::monero::model::BlockHeader;
use xmr_daemon_rpc::fetcher::fetcher::HeaderFetcher;
use xmr_daemon_rpc::tasks::spawn_block_watcher;
use xmr_daemon_rpc::fetcher::runner::run_block_watcher;
use xmr_daemon_rpc::{DaemonError, Result};

struct FakeChain {
  height: AtomicU64,
  fail_next: AtomicU64,
}

#[async_trait]
impl HeaderFetcher for FakeChain {
  async fn fetch_height(&self) -> Result<u64> {
    Ok(self.height.load(Ordering::SeqCst))
  }

  async fn fetch_header(&self, height: u64) -> Result<BlockHeader> {
    if self.fail_next.swap(0, Ordering::SeqCst) > 0 {
      return Err(DaemonError::Transport("connection reset".to_string()));
    }
    Ok(BlockHeader {
      height: Some(height),
      hash: Some(format!("h{}", height)),
      ..Default::default()
    })
  }

  fn chain_name(&self) -> &'static str {
    "TEST"
  }
}

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
pub async fn watcher_sends_each_new_header_once() -> eyre::Result<()> {
  let chain = Arc::new(FakeChain {
    height: AtomicU64::new(5),
    fail_next: AtomicU64::new(1),
  });
  let (sender, mut receiver) = mpsc::channel(16);
  let handle = tokio::spawn(run_block_watcher(chain.clone(), sender, Some(3), Duration::from_millis(10)));

  // the first fetch fails and is retried
  let first = timeout(WAIT, receiver.recv()).await?.expect("header 3");
  assert_eq!(first.height, Some(3));
  let second = timeout(WAIT, receiver.recv()).await?.expect("header 4");
  assert_eq!(second.height, Some(4));

  chain.height.store(6, Ordering::SeqCst);
  let third = timeout(WAIT, receiver.recv()).await?.expect("header 5");
  assert_eq!(third.hash.as_deref(), Some("h5"));

  // watcher stops once nobody listens
  drop(receiver);
  chain.height.store(7, Ordering::SeqCst);
  timeout(WAIT, handle).await??;
  Ok(())
}

#[tokio::test]
pub async fn spawned_watcher_starts_at_tip() -> eyre::Result<()> {
  let chain = Arc::new(FakeChain {
    height: AtomicU64::new(10),
    fail_next: AtomicU64::new(0),
  });
  let (sender, mut receiver) = mpsc::channel(16);
  let handle = spawn_block_watcher(chain, sender, None, 1);

  let tip = timeout(WAIT, receiver.recv()).await?.expect("tip header");
  assert_eq!(tip.height, Some(9));
  handle.abort();
  Ok(())
}

#[tokio::test]
pub async fn zero_interval_still_polls() -> eyre::Result<()> {
  let chain = Arc::new(FakeChain {
    height: AtomicU64::new(4),
    fail_next: AtomicU64::new(0),
  });
  let (sender, mut receiver) = mpsc::channel(16);
  let handle = tokio::spawn(run_block_watcher(chain, sender, Some(2), Duration::ZERO));

  let first = timeout(WAIT, receiver.recv()).await?.expect("header 2");
  assert_eq!(first.height, Some(2));
  assert!(!handle.is_finished());
  handle.abort();
  Ok(())
}
