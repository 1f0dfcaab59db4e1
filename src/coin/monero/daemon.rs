/**
* filename : daemon
* author : HAMA
* date: 2025. 4. 8.
* description: Typed query surface over monerod. Every call builds fresh
*              entities from its own responses; nothing is cached between
*              calls.
**/

use log::{debug, info};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::coin::coin_trait::{BinaryCodec, DaemonTransport};
use crate::coin::monero::model::{
  Ban, Block, BlockHeader, BlockTemplate, CoinbaseTxSum, Connection, DaemonInfo, HardForkInfo,
  KeyImageSpentStatus, MiningStatus, OutputHistogramEntry, Peer, SubmitTxResult, SyncInfo, Tx,
  UpdateCheckResult, UpdateDownloadResult,
};
use crate::mapper::{
  decode_bool, decode_list, decode_record, decode_str, decode_string_list, decode_u64, map_ban, map_block,
  map_block_template, map_coinbase_tx_sum, map_connection, map_daemon_info, map_hard_fork_info, map_header,
  map_mining_status, map_output_histogram_entry, map_peer, map_submit_tx_result, map_sync_info, map_tx,
  map_update_check_result, map_update_download_result,
};
use crate::merge::merge_tx;
use crate::router::{check_status, Router};
use crate::types::{DaemonError, Result, WireRecord};
use crate::unpack::unpack_blocks;

/// Status text monerod returns for a malformed tx hash.
const BAD_TX_HASH_STATUS: &str = "Failed to parse hex representation of transaction hash";

/// Bandwidth limit argument meaning "back to the daemon default".
const RESET_LIMIT: i64 = -1;

#[derive(Clone)]
pub struct MoneroDaemon {
  router: Router,
}

fn required<'a>(resp: &'a WireRecord, key: &str) -> Result<&'a Value> {
  resp
    .get(key)
    .ok_or_else(|| DaemonError::malformed(format!("response has no '{}'", key)))
}

/// Records under `key`; an absent list is empty.
fn records<'a>(resp: &'a WireRecord, key: &str) -> Result<Vec<&'a WireRecord>> {
  match resp.get(key) {
    Some(val) => decode_list(key, val)?.iter().map(|item| decode_record(key, item)).collect(),
    None => Ok(Vec::new()),
  }
}

fn strings(resp: &WireRecord, key: &str) -> Result<Vec<String>> {
  match resp.get(key) {
    Some(val) => decode_string_list(key, val),
    None => Ok(Vec::new()),
  }
}

fn header_of(result: &WireRecord) -> Result<BlockHeader> {
  let mut header = BlockHeader::default();
  map_header(decode_record("block_header", required(result, "block_header")?)?, &mut header)?;
  Ok(header)
}

fn block_of(result: &WireRecord) -> Result<Block> {
  let mut block = Block::default();
  map_block(result, &mut block)?;
  Ok(block)
}

impl MoneroDaemon {
  pub fn new(transport: Arc<dyn DaemonTransport>) -> Self {
    Self {
      router: Router::new(transport, None),
    }
  }

  /// Facade with binary support through `codec`.
  pub fn with_codec(transport: Arc<dyn DaemonTransport>, codec: Arc<dyn BinaryCodec>) -> Self {
    Self {
      router: Router::new(transport, Some(codec)),
    }
  }

  // ====== Chain ======

  pub async fn is_trusted(&self) -> Result<bool> {
    let resp = self.router.path("get_height", None).await?;
    match resp.get("untrusted") {
      Some(val) => Ok(!decode_bool("untrusted", val)?),
      None => Ok(true),
    }
  }

  pub async fn get_height(&self) -> Result<u64> {
    let result = self.router.json_result("get_block_count", None).await?;
    decode_u64("count", required(&result, "count")?)
  }

  pub async fn get_block_hash(&self, height: u64) -> Result<String> {
    let result = self.router.json_value("on_get_block_hash", Some(json!([height]))).await?;
    Ok(decode_str("result", &result)?.to_string())
  }

  pub async fn get_block_template(&self, wallet_address: &str, reserve_size: Option<u32>) -> Result<BlockTemplate> {
    let mut params = json!({ "wallet_address": wallet_address });
    if let Some(reserve_size) = reserve_size {
      params["reserve_size"] = json!(reserve_size);
    }
    let result = self.router.json_result("get_block_template", Some(params)).await?;
    map_block_template(&result)
  }

  pub async fn get_last_block_header(&self) -> Result<BlockHeader> {
    let result = self.router.json_result("get_last_block_header", None).await?;
    header_of(&result)
  }

  pub async fn get_block_header_by_hash(&self, hash: &str) -> Result<BlockHeader> {
    let result = self
      .router
      .json_result("get_block_header_by_hash", Some(json!({ "hash": hash })))
      .await?;
    header_of(&result)
  }

  pub async fn get_block_header_by_height(&self, height: u64) -> Result<BlockHeader> {
    let result = self
      .router
      .json_result("get_block_header_by_height", Some(json!({ "height": height })))
      .await?;
    header_of(&result)
  }

  pub async fn get_block_headers_by_range(&self, start_height: u64, end_height: u64) -> Result<Vec<BlockHeader>> {
    if start_height > end_height {
      return Err(DaemonError::invalid_argument(format!(
        "start height {} is above end height {}",
        start_height, end_height
      )));
    }
    let params = json!({ "start_height": start_height, "end_height": end_height });
    let result = self.router.json_result("get_block_headers_range", Some(params)).await?;
    records(&result, "headers")?
      .into_iter()
      .map(|record| {
        let mut header = BlockHeader::default();
        map_header(record, &mut header)?;
        Ok(header)
      })
      .collect()
  }

  pub async fn get_block_by_hash(&self, hash: &str) -> Result<Block> {
    let result = self.router.json_result("get_block", Some(json!({ "hash": hash }))).await?;
    block_of(&result)
  }

  pub async fn get_block_by_height(&self, height: u64) -> Result<Block> {
    let result = self.router.json_result("get_block", Some(json!({ "height": height }))).await?;
    block_of(&result)
  }

  /// Blocks with their transactions, in the order of `heights`.
  pub async fn get_blocks_by_height(&self, heights: &[u64]) -> Result<Vec<Block>> {
    if heights.is_empty() {
      return Ok(Vec::new());
    }
    let raw = self
      .router
      .binary("get_blocks_by_height.bin", &json!({ "heights": heights }))
      .await?;
    unpack_blocks(self.router.codec()?, &raw, heights)
  }

  /// Blocks `start..=end`; `start` defaults to 0 and `end` to the chain tip.
  pub async fn get_blocks_by_range(&self, start_height: Option<u64>, end_height: Option<u64>) -> Result<Vec<Block>> {
    let start = start_height.unwrap_or(0);
    let end = match end_height {
      Some(end) => end,
      None => match self.get_height().await?.checked_sub(1) {
        Some(tip) => tip,
        None => return Ok(Vec::new()),
      },
    };
    if start > end {
      return Ok(Vec::new());
    }
    let heights: Vec<u64> = (start..=end).collect();
    self.get_blocks_by_height(&heights).await
  }

  pub async fn get_blocks_by_hash(&self, _hashes: &[String], _start_height: u64, _prune: bool) -> Result<Vec<Block>> {
    Err(DaemonError::Unimplemented("get_blocks_by_hash"))
  }

  pub async fn get_block_hashes(&self, _hashes: &[String], _start_height: u64) -> Result<Vec<String>> {
    Err(DaemonError::Unimplemented("get_block_hashes"))
  }

  // ====== Transactions ======

  pub async fn get_tx(&self, hash: &str, prune: bool) -> Result<Option<Tx>> {
    Ok(self.get_txs(&[hash.to_string()], prune).await?.into_iter().next())
  }

  /// Transactions by hash, merged with whatever the pool knows about them.
  pub async fn get_txs(&self, hashes: &[String], prune: bool) -> Result<Vec<Tx>> {
    if hashes.is_empty() {
      return Err(DaemonError::invalid_argument("must provide at least one transaction hash"));
    }
    let params = json!({ "txs_hashes": hashes, "decode_as_json": true, "prune": prune });
    let resp = self.router.path_unchecked("get_transactions", Some(params)).await?;
    if let Err(err) = check_status(&resp) {
      return Err(match err {
        DaemonError::RpcStatus(status) if status.contains(BAD_TX_HASH_STATUS) => DaemonError::InvalidTransactionId,
        other => other,
      });
    }

    let mut txs = records(&resp, "txs")?
      .into_iter()
      .map(|record| {
        let mut tx = Tx {
          is_coinbase: Some(false),
          ..Default::default()
        };
        map_tx(record, &mut tx)?;
        Ok(tx)
      })
      .collect::<Result<Vec<_>>>()?;

    // the pool reports relay and failure state that get_transactions lacks
    let pool = self.get_tx_pool().await?;
    for tx in txs.iter_mut() {
      let Some(hash) = tx.hash.clone() else {
        continue;
      };
      for pool_tx in pool.iter().filter(|pool_tx| pool_tx.hash.as_deref() == Some(hash.as_str())) {
        *tx = merge_tx(std::mem::take(tx), pool_tx.clone())?;
      }
    }
    Ok(txs)
  }

  /// Full hex per tx, or pruned hex when `prune` is set.
  pub async fn get_tx_hexes(&self, hashes: &[String], prune: bool) -> Result<Vec<Option<String>>> {
    Ok(
      self
        .get_txs(hashes, prune)
        .await?
        .into_iter()
        .map(|tx| if prune { tx.pruned_hex } else { tx.full_hex })
        .collect(),
    )
  }

  /// Emission and fees over `num_blocks` blocks from `height`; defaults to
  /// the whole chain.
  pub async fn get_coinbase_tx_sum(&self, height: u64, num_blocks: Option<u64>) -> Result<CoinbaseTxSum> {
    let count = match num_blocks {
      Some(count) => count,
      None => self.get_height().await?,
    };
    let params = json!({ "height": height, "count": count });
    let result = self.router.json_result("get_coinbase_tx_sum", Some(params)).await?;
    map_coinbase_tx_sum(&result)
  }

  pub async fn get_fee_estimate(&self, grace_blocks: Option<u64>) -> Result<u64> {
    let params = grace_blocks.map(|grace_blocks| json!({ "grace_blocks": grace_blocks }));
    let result = self.router.json_result("get_fee_estimate", params).await?;
    decode_u64("fee", required(&result, "fee")?)
  }

  /// Submit a tx. A rejection comes back as a result with `is_good` false.
  pub async fn submit_tx_hex(&self, tx_hex: &str, do_not_relay: bool) -> Result<SubmitTxResult> {
    let params = json!({ "tx_as_hex": tx_hex, "do_not_relay": do_not_relay });
    let resp = self.router.path_unchecked("send_raw_transaction", Some(params)).await?;
    let mut result = map_submit_tx_result(&resp)?;
    result.is_good = Some(check_status(&resp).is_ok());
    if result.is_good == Some(false) {
      info!("tx rejected: {:?}", result.reason);
    }
    Ok(result)
  }

  pub async fn relay_txs_by_hash(&self, hashes: &[String]) -> Result<()> {
    if hashes.is_empty() {
      return Err(DaemonError::invalid_argument("must provide at least one transaction hash"));
    }
    self.router.json_result("relay_tx", Some(json!({ "txids": hashes }))).await?;
    Ok(())
  }

  pub async fn get_tx_pool(&self) -> Result<Vec<Tx>> {
    let resp = self.router.path("get_transaction_pool", None).await?;
    records(&resp, "transactions")?
      .into_iter()
      .map(|record| {
        let mut tx = Tx::in_pool();
        map_tx(record, &mut tx)?;
        Ok(tx)
      })
      .collect()
  }

  pub async fn get_tx_pool_hashes(&self) -> Result<Vec<String>> {
    let resp = self.router.path("get_transaction_pool_hashes", None).await?;
    strings(&resp, "tx_hashes")
  }

  pub async fn get_tx_pool_backlog(&self) -> Result<Vec<Value>> {
    Err(DaemonError::Unimplemented("get_tx_pool_backlog"))
  }

  pub async fn get_tx_pool_stats(&self) -> Result<Value> {
    Err(DaemonError::Unimplemented("get_tx_pool_stats"))
  }

  pub async fn flush_tx_pool(&self) -> Result<()> {
    self.flush_tx_pool_by_hashes(&[]).await
  }

  /// Drop the given txs from the pool; an empty list flushes everything.
  pub async fn flush_tx_pool_by_hashes(&self, hashes: &[String]) -> Result<()> {
    self.router.json_result("flush_txpool", Some(json!({ "txids": hashes }))).await?;
    Ok(())
  }

  pub async fn get_spent_statuses(&self, key_images: &[String]) -> Result<Vec<KeyImageSpentStatus>> {
    let resp = self
      .router
      .path("is_key_image_spent", Some(json!({ "key_images": key_images })))
      .await?;
    let statuses = decode_list("spent_status", required(&resp, "spent_status")?)?
      .iter()
      .map(|code| KeyImageSpentStatus::from_code(decode_u64("spent_status", code)?))
      .collect::<Result<Vec<_>>>()?;
    if statuses.len() != key_images.len() {
      return Err(DaemonError::malformed(format!(
        "{} spent statuses for {} key images",
        statuses.len(),
        key_images.len()
      )));
    }
    Ok(statuses)
  }

  // ====== Outputs ======

  pub async fn get_outputs(&self, _outputs: &[Value]) -> Result<Vec<Value>> {
    Err(DaemonError::Unimplemented("get_outputs"))
  }

  pub async fn get_output_histogram(
    &self,
    amounts: &[u64],
    min_count: Option<u64>,
    max_count: Option<u64>,
    is_unlocked: Option<bool>,
    recent_cutoff: Option<u64>,
  ) -> Result<Vec<OutputHistogramEntry>> {
    let mut params = Map::new();
    params.insert("amounts".to_string(), json!(amounts));
    if let Some(min_count) = min_count {
      params.insert("min_count".to_string(), json!(min_count));
    }
    if let Some(max_count) = max_count {
      params.insert("max_count".to_string(), json!(max_count));
    }
    if let Some(is_unlocked) = is_unlocked {
      params.insert("unlocked".to_string(), json!(is_unlocked));
    }
    if let Some(recent_cutoff) = recent_cutoff {
      params.insert("recent_cutoff".to_string(), json!(recent_cutoff));
    }
    let result = self
      .router
      .json_result("get_output_histogram", Some(Value::Object(params)))
      .await?;
    records(&result, "histogram")?
      .into_iter()
      .map(map_output_histogram_entry)
      .collect()
  }

  pub async fn get_output_distribution(&self, _amounts: &[u64]) -> Result<Vec<Value>> {
    Err(DaemonError::Unimplemented("get_output_distribution"))
  }

  // ====== Node state ======

  pub async fn get_info(&self) -> Result<DaemonInfo> {
    let result = self.router.json_result("get_info", None).await?;
    map_daemon_info(&result)
  }

  pub async fn get_sync_info(&self) -> Result<SyncInfo> {
    let result = self.router.json_result("sync_info", None).await?;
    map_sync_info(&result)
  }

  pub async fn get_hard_fork_info(&self) -> Result<HardForkInfo> {
    let result = self.router.json_result("hard_fork_info", None).await?;
    map_hard_fork_info(&result)
  }

  pub async fn get_alt_chains(&self) -> Result<Vec<Value>> {
    Err(DaemonError::Unimplemented("get_alt_chains"))
  }

  pub async fn get_alt_block_hashes(&self) -> Result<Vec<String>> {
    let resp = self.router.path("get_alt_blocks_hashes", None).await?;
    strings(&resp, "blks_hashes")
  }

  // ====== Bandwidth ======

  async fn get_limits(&self) -> Result<(u64, u64)> {
    let resp = self.router.path("get_limit", None).await?;
    Ok((
      decode_u64("limit_down", required(&resp, "limit_down")?)?,
      decode_u64("limit_up", required(&resp, "limit_up")?)?,
    ))
  }

  /// 0 leaves a direction unchanged, -1 resets it.
  async fn set_limits(&self, down: i64, up: i64) -> Result<(u64, u64)> {
    let params = json!({ "limit_down": down, "limit_up": up });
    let resp = self.router.path("set_limit", Some(params)).await?;
    Ok((
      decode_u64("limit_down", required(&resp, "limit_down")?)?,
      decode_u64("limit_up", required(&resp, "limit_up")?)?,
    ))
  }

  pub async fn get_download_limit(&self) -> Result<u64> {
    Ok(self.get_limits().await?.0)
  }

  /// Set the download limit in kB/s; -1 resets it.
  pub async fn set_download_limit(&self, limit: i64) -> Result<u64> {
    if limit == RESET_LIMIT {
      return self.reset_download_limit().await;
    }
    if limit <= 0 {
      return Err(DaemonError::invalid_argument("download limit must be greater than 0"));
    }
    Ok(self.set_limits(limit, 0).await?.0)
  }

  pub async fn reset_download_limit(&self) -> Result<u64> {
    Ok(self.set_limits(RESET_LIMIT, 0).await?.0)
  }

  pub async fn get_upload_limit(&self) -> Result<u64> {
    Ok(self.get_limits().await?.1)
  }

  /// Set the upload limit in kB/s; -1 resets it.
  pub async fn set_upload_limit(&self, limit: i64) -> Result<u64> {
    if limit == RESET_LIMIT {
      return self.reset_upload_limit().await;
    }
    if limit <= 0 {
      return Err(DaemonError::invalid_argument("upload limit must be greater than 0"));
    }
    Ok(self.set_limits(0, limit).await?.1)
  }

  pub async fn reset_upload_limit(&self) -> Result<u64> {
    Ok(self.set_limits(0, RESET_LIMIT).await?.1)
  }

  // ====== Peers ======

  pub async fn get_connections(&self) -> Result<Vec<Connection>> {
    let result = self.router.json_result("get_connections", None).await?;
    records(&result, "connections")?.into_iter().map(map_connection).collect()
  }

  /// Gray-list peers (offline when last checked) first, then white-list
  /// peers (online).
  pub async fn get_known_peers(&self) -> Result<Vec<Peer>> {
    let resp = self.router.path("get_peer_list", None).await?;
    let mut peers = Vec::new();
    for record in records(&resp, "gray_list")? {
      peers.push(map_peer(record, false)?);
    }
    for record in records(&resp, "white_list")? {
      peers.push(map_peer(record, true)?);
    }
    Ok(peers)
  }

  pub async fn set_outgoing_peer_limit(&self, limit: i64) -> Result<()> {
    if limit < 0 {
      return Err(DaemonError::invalid_argument("outgoing peer limit must be >= 0"));
    }
    self.router.path("out_peers", Some(json!({ "out_peers": limit }))).await?;
    Ok(())
  }

  pub async fn set_incoming_peer_limit(&self, limit: i64) -> Result<()> {
    if limit < 0 {
      return Err(DaemonError::invalid_argument("incoming peer limit must be >= 0"));
    }
    self.router.path("in_peers", Some(json!({ "in_peers": limit }))).await?;
    Ok(())
  }

  pub async fn get_peer_bans(&self) -> Result<Vec<Ban>> {
    let result = self.router.json_result("get_bans", None).await?;
    records(&result, "bans")?.into_iter().map(map_ban).collect()
  }

  pub async fn set_peer_bans(&self, bans: &[Ban]) -> Result<()> {
    let rpc_bans: Vec<Value> = bans
      .iter()
      .map(|ban| {
        let mut rpc_ban = Map::new();
        if let Some(host) = &ban.host {
          rpc_ban.insert("host".to_string(), json!(host));
        }
        if let Some(ip) = ban.ip {
          rpc_ban.insert("ip".to_string(), json!(ip));
        }
        if let Some(is_banned) = ban.is_banned {
          rpc_ban.insert("ban".to_string(), json!(is_banned));
        }
        if let Some(seconds) = ban.seconds {
          rpc_ban.insert("seconds".to_string(), json!(seconds));
        }
        Value::Object(rpc_ban)
      })
      .collect();
    self.router.json_result("set_bans", Some(json!({ "bans": rpc_bans }))).await?;
    Ok(())
  }

  // ====== Mining ======

  pub async fn start_mining(
    &self,
    address: &str,
    num_threads: u32,
    is_background: bool,
    ignore_battery: bool,
  ) -> Result<()> {
    if address.is_empty() {
      return Err(DaemonError::invalid_argument("must provide an address to mine to"));
    }
    if num_threads == 0 {
      return Err(DaemonError::invalid_argument("number of threads must be greater than 0"));
    }
    let params = json!({
      "miner_address": address,
      "threads_count": num_threads,
      "do_background_mining": is_background,
      "ignore_battery": ignore_battery,
    });
    self.router.path("start_mining", Some(params)).await?;
    Ok(())
  }

  pub async fn stop_mining(&self) -> Result<()> {
    self.router.path("stop_mining", None).await?;
    Ok(())
  }

  pub async fn get_mining_status(&self) -> Result<MiningStatus> {
    let resp = self.router.path("mining_status", None).await?;
    map_mining_status(&resp)
  }

  pub async fn submit_blocks(&self, block_blobs: &[String]) -> Result<()> {
    if block_blobs.is_empty() {
      return Err(DaemonError::invalid_argument("must provide at least one block blob"));
    }
    self.router.json_result("submit_block", Some(json!(block_blobs))).await?;
    Ok(())
  }

  // ====== Daemon ======

  pub async fn check_for_update(&self) -> Result<UpdateCheckResult> {
    let resp = self.router.path("update", Some(json!({ "command": "check" }))).await?;
    map_update_check_result(&resp)
  }

  /// Download an update, to `path` or the daemon's default location.
  pub async fn download_update(&self, path: Option<&str>) -> Result<UpdateDownloadResult> {
    let mut params = json!({ "command": "download" });
    if let Some(path) = path {
      params["path"] = json!(path);
    }
    let resp = self.router.path("update", Some(params)).await?;
    map_update_download_result(&resp)
  }

  pub async fn stop(&self) -> Result<()> {
    self.router.path("stop_daemon", None).await?;
    Ok(())
  }

  /// Poll the height every `poll_interval` until a block lands, then return
  /// that block's header.
  pub async fn wait_for_next_block_header(&self, poll_interval: Duration) -> Result<BlockHeader> {
    let start = self.get_height().await?;
    loop {
      tokio::time::sleep(poll_interval).await;
      let height = self.get_height().await?;
      if height > start {
        debug!("chain advanced from {} to {}", start, height);
        return self.get_block_header_by_height(start).await;
      }
    }
  }
}
