/**
* filename : monero
* author : HAMA
* date: 2025. 4. 6.
* description:
**/

use crate::coin::monero::daemon::MoneroDaemon;
use crate::coin::monero::model::BlockHeader;
use crate::fetcher::fetcher::HeaderFetcher;
use crate::types::Result;

use async_trait::async_trait;
use std::sync::Arc;

pub struct MoneroFetcher {
  pub daemon: Arc<MoneroDaemon>,
}

#[async_trait]
impl HeaderFetcher for MoneroFetcher {
  async fn fetch_height(&self) -> Result<u64> {
    self.daemon.get_height().await
  }

  async fn fetch_header(&self, height: u64) -> Result<BlockHeader> {
    self.daemon.get_block_header_by_height(height).await
  }

  fn chain_name(&self) -> &'static str {
    "XMR"
  }
}
