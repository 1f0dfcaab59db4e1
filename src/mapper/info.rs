/**
* filename : info
* author : HAMA
* date: 2025. 4. 8.
* description: Flat node records: peers, sync, mining, bans, update checks.
**/
use super::{
  decode_bool, decode_embedded, decode_list, decode_opt_str, decode_record, decode_str, decode_u32, decode_u64,
  decode_wide_hex, is_envelope_key, warn_unknown, WideNumber,
};
use crate::coin::monero::model::{
  Ban, BlockTemplate, CoinbaseTxSum, Connection, DaemonInfo, HardForkInfo, HardForkState, MiningStatus,
  NetworkType, OutputHistogramEntry, Peer, SubmitTxResult, SyncInfo, UpdateCheckResult, UpdateDownloadResult,
};
use crate::reconcile::assign;
use crate::types::{DaemonError, Result, WireRecord};
use log::warn;
use serde_json::Value;

fn assign_opt_str(field: &'static str, slot: &mut Option<String>, key: &str, val: &Value) -> Result<()> {
  match decode_opt_str(key, val)? {
    Some(s) => assign(field, slot, s),
    None => Ok(()),
  }
}

/// Peer ids arrive as numbers from `get_peer_list` and strings elsewhere.
fn decode_peer_id(key: &str, val: &Value) -> Result<Option<String>> {
  match val {
    Value::Number(n) => Ok(Some(n.to_string())),
    _ => decode_opt_str(key, val),
  }
}

/// Map a `white_list`/`gray_list` entry.
pub fn map_peer(record: &WireRecord, is_online: bool) -> Result<Peer> {
  let mut peer = Peer {
    is_online: Some(is_online),
    ..Default::default()
  };
  for (key, val) in record {
    match key.as_str() {
      "host" => assign_opt_str("peer.host", &mut peer.host, key, val)?,
      "id" => {
        if let Some(id) = decode_peer_id(key, val)? {
          assign("peer.id", &mut peer.id, id)?;
        }
      }
      "ip" => {} // host is consistently a string
      "last_seen" => assign("peer.last_seen_timestamp", &mut peer.last_seen_timestamp, decode_u64(key, val)?)?,
      "port" => assign("peer.port", &mut peer.port, decode_u32(key, val)?)?,
      "rpc_port" => assign("peer.rpc_port", &mut peer.rpc_port, decode_u32(key, val)?)?,
      "pruning_seed" => assign("peer.pruning_seed", &mut peer.pruning_seed, decode_u32(key, val)?)?,
      "rpc_credits_per_hash" => {
        assign("peer.rpc_credits_per_hash", &mut peer.rpc_credits_per_hash, decode_u64(key, val)?)?
      }
      _ => warn_unknown("peer", key, val),
    }
  }
  Ok(peer)
}

pub fn map_connection(record: &WireRecord) -> Result<Connection> {
  let mut connection = Connection::default();
  connection.peer.is_online = Some(true);
  for (key, val) in record {
    let peer = &mut connection.peer;
    match key.as_str() {
      "address" => assign_opt_str("peer.address", &mut peer.address, key, val)?,
      "host" => assign_opt_str("peer.host", &mut peer.host, key, val)?,
      "ip" => {}
      "peer_id" => {
        if let Some(id) = decode_peer_id(key, val)? {
          assign("peer.id", &mut peer.id, id)?;
        }
      }
      "port" => {
        // a decimal string here, unlike the peer list
        let port = match val {
          Value::String(s) if s.is_empty() => None,
          Value::String(s) => Some(
            s.parse::<u32>()
              .map_err(|_| DaemonError::malformed(format!("connection port is not a number: {}", s)))?,
          ),
          _ => Some(decode_u32(key, val)?),
        };
        if let Some(port) = port {
          assign("peer.port", &mut peer.port, port)?;
        }
      }
      "rpc_port" => assign("peer.rpc_port", &mut peer.rpc_port, decode_u32(key, val)?)?,
      "pruning_seed" => assign("peer.pruning_seed", &mut peer.pruning_seed, decode_u32(key, val)?)?,
      "rpc_credits_per_hash" => {
        assign("peer.rpc_credits_per_hash", &mut peer.rpc_credits_per_hash, decode_u64(key, val)?)?
      }
      "connection_id" => assign_opt_str("connection.id", &mut connection.id, key, val)?,
      "address_type" => assign("connection.address_type", &mut connection.address_type, decode_u32(key, val)?)?,
      "avg_download" => assign("connection.avg_download", &mut connection.avg_download, decode_u64(key, val)?)?,
      "avg_upload" => assign("connection.avg_upload", &mut connection.avg_upload, decode_u64(key, val)?)?,
      "current_download" => {
        assign("connection.current_download", &mut connection.current_download, decode_u64(key, val)?)?
      }
      "current_upload" => assign("connection.current_upload", &mut connection.current_upload, decode_u64(key, val)?)?,
      "height" => assign("connection.height", &mut connection.height, decode_u64(key, val)?)?,
      "incoming" => assign("connection.is_incoming", &mut connection.is_incoming, decode_bool(key, val)?)?,
      "live_time" => assign("connection.live_time", &mut connection.live_time, decode_u64(key, val)?)?,
      "local_ip" => assign("connection.is_local_ip", &mut connection.is_local_ip, decode_bool(key, val)?)?,
      "localhost" => assign("connection.is_local_host", &mut connection.is_local_host, decode_bool(key, val)?)?,
      "recv_count" => assign("connection.num_receives", &mut connection.num_receives, decode_u64(key, val)?)?,
      "recv_idle_time" => {
        assign("connection.receive_idle_time", &mut connection.receive_idle_time, decode_u64(key, val)?)?
      }
      "send_count" => assign("connection.num_sends", &mut connection.num_sends, decode_u64(key, val)?)?,
      "send_idle_time" => assign("connection.send_idle_time", &mut connection.send_idle_time, decode_u64(key, val)?)?,
      "state" => assign_opt_str("connection.state", &mut connection.state, key, val)?,
      "support_flags" => {
        assign("connection.num_support_flags", &mut connection.num_support_flags, decode_u32(key, val)?)?
      }
      _ => warn_unknown("connection", key, val),
    }
  }
  Ok(connection)
}

pub fn map_sync_info(record: &WireRecord) -> Result<SyncInfo> {
  let mut info = SyncInfo::default();
  for (key, val) in record {
    match key.as_str() {
      "height" => assign("sync.height", &mut info.height, decode_u64(key, val)?)?,
      "target_height" => assign("sync.target_height", &mut info.target_height, decode_u64(key, val)?)?,
      "next_needed_pruning_seed" => {
        assign("sync.next_needed_pruning_seed", &mut info.next_needed_pruning_seed, decode_u32(key, val)?)?
      }
      "peers" => {
        let connections = decode_list(key, val)?
          .iter()
          .map(|peer| {
            let peer = decode_record(key, peer)?;
            let connection = peer
              .get("info")
              .ok_or_else(|| DaemonError::malformed("sync peer without 'info'"))?;
            map_connection(decode_record("info", connection)?)
          })
          .collect::<Result<Vec<_>>>()?;
        assign("sync.connections", &mut info.connections, connections)?;
      }
      "spans" => {
        if !decode_list(key, val)?.is_empty() {
          return Err(DaemonError::Unimplemented("connection span parsing"));
        }
      }
      "overview" => {
        // "[]" unless the daemon is pruning
        match decode_embedded(key, val) {
          Ok(Some(Value::Array(overview))) if !overview.is_empty() => {
            warn!("ignoring non-empty sync overview: {:?}", overview)
          }
          Ok(_) => {}
          Err(e) => warn!("failed to parse sync overview {}: {}", val, e),
        }
      }
      key if is_envelope_key(key) => {}
      _ => warn_unknown("sync info", key, val),
    }
  }
  Ok(info)
}

pub fn map_hard_fork_info(record: &WireRecord) -> Result<HardForkInfo> {
  let mut info = HardForkInfo::default();
  for (key, val) in record {
    match key.as_str() {
      "earliest_height" => assign("hard_fork.earliest_height", &mut info.earliest_height, decode_u64(key, val)?)?,
      "enabled" => assign("hard_fork.is_enabled", &mut info.is_enabled, decode_bool(key, val)?)?,
      "state" => assign("hard_fork.state", &mut info.state, HardForkState::from_code(decode_u64(key, val)?)?)?,
      "threshold" => assign("hard_fork.threshold", &mut info.threshold, decode_u32(key, val)?)?,
      "version" => assign("hard_fork.version", &mut info.version, decode_u32(key, val)?)?,
      "votes" => assign("hard_fork.num_votes", &mut info.num_votes, decode_u32(key, val)?)?,
      "voting" => assign("hard_fork.voting", &mut info.voting, decode_u32(key, val)?)?,
      "window" => assign("hard_fork.window", &mut info.window, decode_u32(key, val)?)?,
      key if is_envelope_key(key) => {}
      _ => warn_unknown("hard fork info", key, val),
    }
  }
  Ok(info)
}

pub fn map_mining_status(record: &WireRecord) -> Result<MiningStatus> {
  let mut status = MiningStatus::default();
  let mut difficulty = WideNumber::default();
  let mut address: Option<String> = None;
  let mut is_background: Option<bool> = None;
  for (key, val) in record {
    match key.as_str() {
      "active" => assign("mining.is_active", &mut status.is_active, decode_bool(key, val)?)?,
      "speed" => assign("mining.speed", &mut status.speed, decode_u64(key, val)?)?,
      "threads_count" => assign("mining.num_threads", &mut status.num_threads, decode_u32(key, val)?)?,
      "address" => address = decode_opt_str(key, val)?,
      "is_background_mining_enabled" => is_background = Some(decode_bool(key, val)?),
      "pow_algorithm" => assign_opt_str("mining.pow_algorithm", &mut status.pow_algorithm, key, val)?,
      "block_reward" => assign("mining.block_reward", &mut status.block_reward, decode_u64(key, val)?)?,
      "block_target" => assign("mining.block_target", &mut status.block_target, decode_u64(key, val)?)?,
      "difficulty" => difficulty.low = Some(decode_u64(key, val)?),
      "difficulty_top64" => difficulty.top64 = Some(decode_u64(key, val)?),
      "wide_difficulty" => difficulty.wide = Some(decode_wide_hex(key, val)?),
      "bg_idle_threshold" | "bg_ignore_battery" | "bg_min_idle_seconds" | "bg_target" => {}
      key if is_envelope_key(key) => {}
      _ => warn_unknown("mining status", key, val),
    }
  }
  status.difficulty = difficulty.resolve("mining.difficulty")?;
  // address and background flag are stale once mining stops
  if status.is_active == Some(true) {
    status.address = address;
    status.is_background = is_background;
  }
  Ok(status)
}

pub fn map_submit_tx_result(record: &WireRecord) -> Result<SubmitTxResult> {
  let mut result = SubmitTxResult::default();
  for (key, val) in record {
    match key.as_str() {
      "double_spend" => assign("submit.is_double_spend", &mut result.is_double_spend, decode_bool(key, val)?)?,
      "fee_too_low" => assign("submit.is_fee_too_low", &mut result.is_fee_too_low, decode_bool(key, val)?)?,
      "invalid_input" => assign("submit.has_invalid_input", &mut result.has_invalid_input, decode_bool(key, val)?)?,
      "invalid_output" => {
        assign("submit.has_invalid_output", &mut result.has_invalid_output, decode_bool(key, val)?)?
      }
      "too_few_outputs" => {
        assign("submit.has_too_few_outputs", &mut result.has_too_few_outputs, decode_bool(key, val)?)?
      }
      "low_mixin" => assign("submit.is_mixin_too_low", &mut result.is_mixin_too_low, decode_bool(key, val)?)?,
      "not_rct" => assign("submit.is_rct", &mut result.is_rct, !decode_bool(key, val)?)?,
      "not_relayed" => assign("submit.is_relayed", &mut result.is_relayed, !decode_bool(key, val)?)?,
      "overspend" => assign("submit.is_overspend", &mut result.is_overspend, decode_bool(key, val)?)?,
      "too_big" => assign("submit.is_too_big", &mut result.is_too_big, decode_bool(key, val)?)?,
      "sanity_check_failed" => {
        assign("submit.sanity_check_failed", &mut result.sanity_check_failed, decode_bool(key, val)?)?
      }
      "reason" => assign_opt_str("submit.reason", &mut result.reason, key, val)?,
      key if is_envelope_key(key) => {}
      _ => warn_unknown("submit tx result", key, val),
    }
  }
  Ok(result)
}

pub fn map_update_check_result(record: &WireRecord) -> Result<UpdateCheckResult> {
  let mut result = UpdateCheckResult::default();
  for (key, val) in record {
    match key.as_str() {
      "update" => assign("update.is_update_available", &mut result.is_update_available, decode_bool(key, val)?)?,
      "version" => assign_opt_str("update.version", &mut result.version, key, val)?,
      "hash" => assign_opt_str("update.hash", &mut result.hash, key, val)?,
      "auto_uri" => assign_opt_str("update.auto_uri", &mut result.auto_uri, key, val)?,
      "user_uri" => assign_opt_str("update.user_uri", &mut result.user_uri, key, val)?,
      "path" => {} // download result only
      key if is_envelope_key(key) => {}
      _ => warn_unknown("update check result", key, val),
    }
  }
  Ok(result)
}

pub fn map_update_download_result(record: &WireRecord) -> Result<UpdateDownloadResult> {
  let mut result = UpdateDownloadResult {
    check: map_update_check_result(record)?,
    download_path: None,
  };
  if let Some(path) = record.get("path") {
    assign_opt_str("update.download_path", &mut result.download_path, "path", path)?;
  }
  Ok(result)
}

pub fn map_daemon_info(record: &WireRecord) -> Result<DaemonInfo> {
  let mut info = DaemonInfo::default();
  let mut difficulty = WideNumber::default();
  let mut cumulative = WideNumber::default();
  for (key, val) in record {
    match key.as_str() {
      "version" => assign_opt_str("info.version", &mut info.version, key, val)?,
      "nettype" => assign("info.network_type", &mut info.network_type, NetworkType::parse(decode_str(key, val)?)?)?,
      "mainnet" | "testnet" | "stagenet" => {
        if decode_bool(key, val)? {
          assign("info.network_type", &mut info.network_type, NetworkType::parse(key)?)?;
        }
      }
      "height" => assign("info.height", &mut info.height, decode_u64(key, val)?)?,
      "height_without_bootstrap" => {
        assign("info.height_without_bootstrap", &mut info.height_without_bootstrap, decode_u64(key, val)?)?
      }
      "target_height" => assign("info.target_height", &mut info.target_height, decode_u64(key, val)?)?,
      "target" => assign("info.target", &mut info.target, decode_u64(key, val)?)?,
      "top_block_hash" => assign_opt_str("info.top_block_hash", &mut info.top_block_hash, key, val)?,
      "difficulty" => difficulty.low = Some(decode_u64(key, val)?),
      "difficulty_top64" => difficulty.top64 = Some(decode_u64(key, val)?),
      "wide_difficulty" => difficulty.wide = Some(decode_wide_hex(key, val)?),
      "cumulative_difficulty" => cumulative.low = Some(decode_u64(key, val)?),
      "cumulative_difficulty_top64" => cumulative.top64 = Some(decode_u64(key, val)?),
      "wide_cumulative_difficulty" => cumulative.wide = Some(decode_wide_hex(key, val)?),
      "alt_blocks_count" => assign("info.num_alt_blocks", &mut info.num_alt_blocks, decode_u64(key, val)?)?,
      "block_size_limit" => assign("info.block_size_limit", &mut info.block_size_limit, decode_u64(key, val)?)?,
      "block_size_median" => assign("info.block_size_median", &mut info.block_size_median, decode_u64(key, val)?)?,
      "block_weight_limit" => {
        assign("info.block_weight_limit", &mut info.block_weight_limit, decode_u64(key, val)?)?
      }
      "block_weight_median" => {
        assign("info.block_weight_median", &mut info.block_weight_median, decode_u64(key, val)?)?
      }
      "bootstrap_daemon_address" => {
        assign_opt_str("info.bootstrap_daemon_address", &mut info.bootstrap_daemon_address, key, val)?
      }
      "free_space" => assign("info.free_space", &mut info.free_space, decode_u64(key, val)?)?,
      "database_size" => assign("info.database_size", &mut info.database_size, decode_u64(key, val)?)?,
      "grey_peerlist_size" => assign("info.num_offline_peers", &mut info.num_offline_peers, decode_u64(key, val)?)?,
      "white_peerlist_size" => assign("info.num_online_peers", &mut info.num_online_peers, decode_u64(key, val)?)?,
      "incoming_connections_count" => {
        assign("info.num_incoming_connections", &mut info.num_incoming_connections, decode_u64(key, val)?)?
      }
      "outgoing_connections_count" => {
        assign("info.num_outgoing_connections", &mut info.num_outgoing_connections, decode_u64(key, val)?)?
      }
      "rpc_connections_count" => {
        assign("info.num_rpc_connections", &mut info.num_rpc_connections, decode_u64(key, val)?)?
      }
      "tx_count" => assign("info.num_txs", &mut info.num_txs, decode_u64(key, val)?)?,
      "tx_pool_size" => assign("info.num_txs_pool", &mut info.num_txs_pool, decode_u64(key, val)?)?,
      "start_time" => assign("info.start_timestamp", &mut info.start_timestamp, decode_u64(key, val)?)?,
      "offline" => assign("info.is_offline", &mut info.is_offline, decode_bool(key, val)?)?,
      "busy_syncing" => assign("info.is_busy_syncing", &mut info.is_busy_syncing, decode_bool(key, val)?)?,
      "synchronized" => assign("info.is_synchronized", &mut info.is_synchronized, decode_bool(key, val)?)?,
      "was_bootstrap_ever_used" => {
        assign("info.was_bootstrap_ever_used", &mut info.was_bootstrap_ever_used, decode_bool(key, val)?)?
      }
      "update_available" => assign("info.update_available", &mut info.update_available, decode_bool(key, val)?)?,
      key if is_envelope_key(key) => {}
      _ => warn_unknown("daemon info", key, val),
    }
  }
  info.difficulty = difficulty.resolve("info.difficulty")?;
  info.cumulative_difficulty = cumulative.resolve("info.cumulative_difficulty")?;
  Ok(info)
}

pub fn map_block_template(record: &WireRecord) -> Result<BlockTemplate> {
  let mut template = BlockTemplate::default();
  let mut difficulty = WideNumber::default();
  for (key, val) in record {
    match key.as_str() {
      "blocktemplate_blob" => {
        assign_opt_str("template.block_template_blob", &mut template.block_template_blob, key, val)?
      }
      "blockhashing_blob" => {
        assign_opt_str("template.block_hashing_blob", &mut template.block_hashing_blob, key, val)?
      }
      "difficulty" => difficulty.low = Some(decode_u64(key, val)?),
      "difficulty_top64" => difficulty.top64 = Some(decode_u64(key, val)?),
      "wide_difficulty" => difficulty.wide = Some(decode_wide_hex(key, val)?),
      "expected_reward" => assign("template.expected_reward", &mut template.expected_reward, decode_u64(key, val)?)?,
      "height" => assign("template.height", &mut template.height, decode_u64(key, val)?)?,
      "prev_hash" => assign_opt_str("template.prev_hash", &mut template.prev_hash, key, val)?,
      "reserved_offset" => assign("template.reserved_offset", &mut template.reserved_offset, decode_u64(key, val)?)?,
      "seed_height" => assign("template.seed_height", &mut template.seed_height, decode_u64(key, val)?)?,
      "seed_hash" => assign_opt_str("template.seed_hash", &mut template.seed_hash, key, val)?,
      "next_seed_hash" => assign_opt_str("template.next_seed_hash", &mut template.next_seed_hash, key, val)?,
      key if is_envelope_key(key) => {}
      _ => warn_unknown("block template", key, val),
    }
  }
  template.difficulty = difficulty.resolve("template.difficulty")?;
  Ok(template)
}

pub fn map_coinbase_tx_sum(record: &WireRecord) -> Result<CoinbaseTxSum> {
  let mut emission = WideNumber::default();
  let mut fees = WideNumber::default();
  for (key, val) in record {
    match key.as_str() {
      "emission_amount" => emission.low = Some(decode_u64(key, val)?),
      "emission_amount_top64" => emission.top64 = Some(decode_u64(key, val)?),
      "wide_emission_amount" => emission.wide = Some(decode_wide_hex(key, val)?),
      "fee_amount" => fees.low = Some(decode_u64(key, val)?),
      "fee_amount_top64" => fees.top64 = Some(decode_u64(key, val)?),
      "wide_fee_amount" => fees.wide = Some(decode_wide_hex(key, val)?),
      key if is_envelope_key(key) => {}
      _ => warn_unknown("coinbase tx sum", key, val),
    }
  }
  Ok(CoinbaseTxSum {
    emission_sum: emission.resolve("coinbase_sum.emission_sum")?,
    fee_sum: fees.resolve("coinbase_sum.fee_sum")?,
  })
}

pub fn map_output_histogram_entry(record: &WireRecord) -> Result<OutputHistogramEntry> {
  let mut entry = OutputHistogramEntry::default();
  for (key, val) in record {
    match key.as_str() {
      "amount" => assign("histogram.amount", &mut entry.amount, decode_u64(key, val)?)?,
      "total_instances" => assign("histogram.num_instances", &mut entry.num_instances, decode_u64(key, val)?)?,
      "unlocked_instances" => {
        assign("histogram.num_unlocked_instances", &mut entry.num_unlocked_instances, decode_u64(key, val)?)?
      }
      "recent_instances" => {
        assign("histogram.num_recent_instances", &mut entry.num_recent_instances, decode_u64(key, val)?)?
      }
      _ => warn_unknown("output histogram entry", key, val),
    }
  }
  Ok(entry)
}

pub fn map_ban(record: &WireRecord) -> Result<Ban> {
  let mut ban = Ban::default();
  for (key, val) in record {
    match key.as_str() {
      "host" => assign_opt_str("ban.host", &mut ban.host, key, val)?,
      "ip" => assign("ban.ip", &mut ban.ip, decode_u32(key, val)?)?,
      "seconds" => assign("ban.seconds", &mut ban.seconds, decode_u64(key, val)?)?,
      _ => warn_unknown("ban", key, val),
    }
  }
  // get_bans only lists active bans
  ban.is_banned = Some(true);
  Ok(ban)
}
