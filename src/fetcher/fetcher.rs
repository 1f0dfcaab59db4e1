/**
* filename : interface
* author : HAMA
* date: 2025. 4. 6.
* description: What the block watcher needs from a chain.
**/

use async_trait::async_trait;
use crate::coin::monero::model::BlockHeader;
use crate::types::Result;

#[async_trait]
pub trait HeaderFetcher: Send + Sync {
  /// Number of blocks in the chain; the tip is at `height - 1`.
  async fn fetch_height(&self) -> Result<u64>;
  async fn fetch_header(&self, height: u64) -> Result<BlockHeader>;
  fn chain_name(&self) -> &'static str;
}
