mod common;

use common::{ScriptedTransport, NULL_HASH};
use serde_json::json;
use std::sync::Arc;
use xmr_daemon_rpc::coin::monero::model::{KeyImageSpentStatus, NetworkType};
use xmr_daemon_rpc::{DaemonError, MoneroDaemon};

const TX_HASH: &str = "abc1230000000000000000000000000000000000000000000000000000000000";

fn daemon(transport: ScriptedTransport) -> (MoneroDaemon, Arc<ScriptedTransport>) {
  let transport = Arc::new(transport);
  (MoneroDaemon::new(transport.clone()), transport)
}

fn empty_pool() -> serde_json::Value {
  json!({ "status": "OK", "untrusted": false })
}

#[tokio::test]
pub async fn get_txs_maps_one_record() -> eyre::Result<()> {
  let (daemon, transport) = daemon(
    ScriptedTransport::new()
      .path(
        "get_transactions",
        json!({
          "status": "OK",
          "untrusted": false,
          "txs": [{ "tx_hash": TX_HASH, "fee": 1000, "version": 2 }]
        }),
      )
      .path("get_transaction_pool", empty_pool()),
  );

  let txs = daemon.get_txs(&[TX_HASH.to_string()], false).await?;
  assert_eq!(txs.len(), 1);
  let tx = &txs[0];
  assert_eq!(tx.hash.as_deref(), Some(TX_HASH));
  assert_eq!(tx.fee, Some(1000));
  assert_eq!(tx.version, Some(2));
  assert_eq!(tx.is_coinbase, Some(false));

  let params = transport.calls_to("get_transactions");
  assert_eq!(
    params,
    vec![Some(json!({ "txs_hashes": [TX_HASH], "decode_as_json": true, "prune": false }))]
  );
  Ok(())
}

#[tokio::test]
pub async fn get_txs_reports_bad_hash_as_invalid_id() {
  let (daemon, _) = daemon(ScriptedTransport::new().path(
    "get_transactions",
    json!({ "status": "Failed to parse hex representation of transaction hash" }),
  ));
  let err = daemon.get_txs(&["zz".to_string()], false).await.unwrap_err();
  assert!(matches!(err, DaemonError::InvalidTransactionId));
}

#[tokio::test]
pub async fn get_txs_passes_other_statuses_through() {
  let (daemon, _) = daemon(ScriptedTransport::new().path("get_transactions", json!({ "status": "BUSY" })));
  let err = daemon.get_txs(&[TX_HASH.to_string()], false).await.unwrap_err();
  assert!(matches!(err, DaemonError::RpcStatus(ref status) if status == "BUSY"));
}

#[tokio::test]
pub async fn get_txs_requires_ids() {
  let (daemon, transport) = daemon(ScriptedTransport::new());
  let err = daemon.get_txs(&[], false).await.unwrap_err();
  assert!(matches!(err, DaemonError::InvalidArgument(_)));
  assert!(transport.calls_to("get_transactions").is_empty());
}

#[tokio::test]
pub async fn get_txs_merges_pool_fields() -> eyre::Result<()> {
  let as_json = json!({
    "version": 2,
    "unlock_time": 0,
    "vin": [{ "key": { "amount": 0, "k_image": "ki", "key_offsets": [1, 2] } }],
    "vout": [{ "amount": 0, "target": { "key": "out0" } }],
    "extra": [2, 33],
    "rct_signatures": { "type": 6 }
  })
  .to_string();
  let (daemon, _) = daemon(
    ScriptedTransport::new()
      .path(
        "get_transactions",
        json!({
          "status": "OK",
          "txs": [{ "tx_hash": TX_HASH, "in_pool": true, "as_hex": "", "pruned_as_hex": "", "prunable_hash": "", "as_json": as_json }]
        }),
      )
      .path(
        "get_transaction_pool",
        json!({
          "status": "OK",
          "transactions": [{
            "id_hash": TX_HASH,
            "fee": 30000,
            "relayed": true,
            "last_relayed_time": 1_700_000_123u64,
            "receive_time": 1_700_000_100u64,
            "do_not_relay": false,
            "kept_by_block": false,
            "double_spend_seen": false,
            "last_failed_height": 0,
            "last_failed_id_hash": NULL_HASH,
            "max_used_block_height": 99,
            "max_used_block_id_hash": "bb"
          }]
        }),
      ),
  );

  let tx = daemon.get_tx(TX_HASH, false).await?.expect("tx");
  assert_eq!(tx.in_tx_pool, Some(true));
  assert_eq!(tx.is_confirmed, Some(false));
  assert_eq!(tx.num_confirmations, Some(0));
  assert_eq!(tx.is_relayed, Some(true));
  assert_eq!(tx.last_relayed_timestamp, Some(1_700_000_123));
  assert_eq!(tx.received_timestamp, Some(1_700_000_100));
  assert_eq!(tx.is_failed, Some(false));
  assert_eq!(tx.fee, Some(30000));
  assert_eq!(tx.version, Some(2));
  assert_eq!(tx.extra, Some(vec![2, 33]));
  assert_eq!(tx.full_hex, None);
  assert_eq!(tx.prunable_hash, None);
  let inputs = tx.inputs.as_ref().expect("inputs");
  assert_eq!(inputs[0].key_image.as_ref().map(|ki| ki.hex.as_str()), Some("ki"));
  assert_eq!(inputs[0].ring_output_indices, Some(vec![1, 2]));
  Ok(())
}

#[tokio::test]
pub async fn pool_reports_failed_txs() -> eyre::Result<()> {
  let (daemon, _) = daemon(ScriptedTransport::new().path(
    "get_transaction_pool",
    json!({
      "status": "OK",
      "transactions": [
        { "id_hash": "aa", "relayed": false, "last_relayed_time": 5, "last_failed_height": 500, "last_failed_id_hash": "ff" },
        { "id_hash": "bb", "relayed": false, "last_failed_height": 0, "last_failed_id_hash": NULL_HASH }
      ]
    }),
  ));

  let pool = daemon.get_tx_pool().await?;
  assert_eq!(pool.len(), 2);
  assert_eq!(pool[0].is_failed, Some(true));
  assert_eq!(pool[0].last_failed_height, Some(500));
  assert_eq!(pool[0].last_failed_hash.as_deref(), Some("ff"));
  // not relayed, so the reported relay time is dropped
  assert_eq!(pool[0].last_relayed_timestamp, None);
  assert_eq!(pool[1].is_failed, Some(false));
  assert_eq!(pool[1].last_failed_height, None);
  for tx in &pool {
    assert_eq!(tx.in_tx_pool, Some(true));
    assert_eq!(tx.is_confirmed, Some(false));
    assert_eq!(tx.num_confirmations, Some(0));
  }
  Ok(())
}

#[tokio::test]
pub async fn header_by_height_checks_status() -> eyre::Result<()> {
  let (ok, _) = daemon(ScriptedTransport::new().json(
    "get_block_header_by_height",
    json!({
      "status": "OK",
      "untrusted": false,
      "block_header": {
        "hash": "h10", "height": 10, "prev_hash": "h9", "timestamp": 1_600_000_000u64,
        "difficulty": 5, "difficulty_top64": 0, "wide_difficulty": "0x5",
        "cumulative_difficulty": 50, "major_version": 16, "minor_version": 16,
        "nonce": 7, "num_txes": 0, "orphan_status": false, "reward": 600000000000u64,
        "pow_hash": "", "miner_tx_hash": "m10", "block_size": 100, "block_weight": 100,
        "long_term_weight": 100, "depth": 3
      }
    }),
  ));
  let header = ok.get_block_header_by_height(10).await?;
  assert_eq!(header.height, Some(10));
  assert_eq!(header.difficulty, Some(5));
  assert_eq!(header.pow_hash, None);
  assert_eq!(header.miner_tx_hash.as_deref(), Some("m10"));

  let (busy, _) = daemon(ScriptedTransport::new().json("get_block_header_by_height", json!({ "status": "BUSY" })));
  let err = busy.get_block_header_by_height(10).await.unwrap_err();
  assert!(matches!(err, DaemonError::RpcStatus(_)));
  Ok(())
}

#[tokio::test]
pub async fn block_by_height_links_coinbase() -> eyre::Result<()> {
  let block_json = json!({
    "major_version": 16,
    "minor_version": 16,
    "timestamp": 1_600_000_000u64,
    "prev_id": "h9",
    "nonce": 7,
    "miner_tx": common::miner_tx(10),
    "tx_hashes": ["t1"]
  })
  .to_string();
  let (daemon, _) = daemon(ScriptedTransport::new().json(
    "get_block",
    json!({
      "status": "OK",
      "blob": "0e0e",
      "block_header": { "hash": "h10", "height": 10, "prev_hash": "h9", "timestamp": 1_600_000_000u64 },
      "miner_tx_hash": "m10",
      "tx_hashes": ["t1"],
      "json": block_json
    }),
  ));

  let block = daemon.get_block_by_height(10).await?;
  assert_eq!(block.hex.as_deref(), Some("0e0e"));
  assert_eq!(block.tx_hashes, Some(vec!["t1".to_string()]));
  assert_eq!(block.header.nonce, Some(7));
  let coinbase = block.coinbase_tx.as_ref().expect("coinbase");
  assert_eq!(coinbase.hash.as_deref(), Some("m10"));
  assert_eq!(coinbase.is_coinbase, Some(true));
  assert_eq!(coinbase.is_confirmed, Some(true));
  assert_eq!(coinbase.height(), Some(10));
  assert_eq!(coinbase.inputs, None);
  assert_eq!(coinbase.outputs.as_ref().map(Vec::len), Some(1));
  Ok(())
}

#[tokio::test]
pub async fn download_limit_arguments() -> eyre::Result<()> {
  let (daemon, transport) = daemon(
    ScriptedTransport::new().path("set_limit", json!({ "status": "OK", "limit_down": 8192, "limit_up": 2048 })),
  );

  assert!(matches!(daemon.set_download_limit(0).await, Err(DaemonError::InvalidArgument(_))));
  assert!(matches!(daemon.set_download_limit(-5).await, Err(DaemonError::InvalidArgument(_))));
  assert!(transport.calls_to("set_limit").is_empty());

  assert_eq!(daemon.set_download_limit(100).await?, 8192);
  assert_eq!(daemon.set_download_limit(-1).await?, 8192);
  assert_eq!(daemon.reset_upload_limit().await?, 2048);
  assert_eq!(
    transport.calls_to("set_limit"),
    vec![
      Some(json!({ "limit_down": 100, "limit_up": 0 })),
      Some(json!({ "limit_down": -1, "limit_up": 0 })),
      Some(json!({ "limit_down": 0, "limit_up": -1 })),
    ]
  );
  Ok(())
}

#[tokio::test]
pub async fn spent_statuses_are_closed() -> eyre::Result<()> {
  let (daemon, _) = daemon(
    ScriptedTransport::new().path("is_key_image_spent", json!({ "status": "OK", "spent_status": [0, 1, 2] })),
  );
  let images: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
  assert_eq!(
    daemon.get_spent_statuses(&images).await?,
    vec![KeyImageSpentStatus::NotSpent, KeyImageSpentStatus::Confirmed, KeyImageSpentStatus::InPool]
  );

  let (bad, _) = self::daemon(ScriptedTransport::new().path("is_key_image_spent", json!({ "status": "OK", "spent_status": [3] })));
  let err = bad.get_spent_statuses(&["a".to_string()]).await.unwrap_err();
  assert!(matches!(err, DaemonError::MalformedResponse(_)));
  Ok(())
}

#[tokio::test]
pub async fn known_peers_and_connections() -> eyre::Result<()> {
  let (daemon, _) = daemon(
    ScriptedTransport::new()
      .path(
        "get_peer_list",
        json!({
          "status": "OK",
          "gray_list": [{ "host": "10.0.0.1", "id": 11, "ip": 16777226, "last_seen": 0, "port": 18080 }],
          "white_list": [{ "host": "10.0.0.2", "id": 12, "ip": 33554442, "last_seen": 1_700_000_000u64, "port": 18080, "rpc_port": 18089, "pruning_seed": 0 }]
        }),
      )
      .json(
        "get_connections",
        json!({
          "status": "OK",
          "connections": [{
            "address": "10.0.0.2:18080", "host": "10.0.0.2", "ip": "10.0.0.2", "port": "18080",
            "peer_id": "0a0b", "connection_id": "c1", "incoming": false, "height": 100,
            "live_time": 30, "state": "normal", "recv_count": 10, "send_count": 12,
            "avg_download": 1, "avg_upload": 2, "current_download": 0, "current_upload": 0,
            "local_ip": false, "localhost": false, "support_flags": 1, "address_type": 1,
            "recv_idle_time": 3, "send_idle_time": 4, "rpc_port": 0, "pruning_seed": 0
          }]
        }),
      ),
  );

  let peers = daemon.get_known_peers().await?;
  assert_eq!(peers.len(), 2);
  assert_eq!(peers[0].is_online, Some(false));
  assert_eq!(peers[0].id.as_deref(), Some("11"));
  assert_eq!(peers[1].is_online, Some(true));
  assert_eq!(peers[1].rpc_port, Some(18089));

  let connections = daemon.get_connections().await?;
  assert_eq!(connections.len(), 1);
  assert_eq!(connections[0].peer.port, Some(18080));
  assert_eq!(connections[0].peer.is_online, Some(true));
  assert_eq!(connections[0].state.as_deref(), Some("normal"));
  Ok(())
}

#[tokio::test]
pub async fn rejected_submission_is_a_result() -> eyre::Result<()> {
  let (daemon, _) = daemon(ScriptedTransport::new().path(
    "send_raw_transaction",
    json!({
      "status": "Failed",
      "reason": "",
      "double_spend": true,
      "fee_too_low": false,
      "invalid_input": false,
      "invalid_output": false,
      "low_mixin": false,
      "not_rct": false,
      "not_relayed": true,
      "overspend": false,
      "too_big": false,
      "too_few_outputs": false,
      "sanity_check_failed": false
    }),
  ));

  let result = daemon.submit_tx_hex("00", false).await?;
  assert_eq!(result.is_good, Some(false));
  assert_eq!(result.is_double_spend, Some(true));
  assert_eq!(result.is_relayed, Some(false));
  assert_eq!(result.is_rct, Some(true));
  assert_eq!(result.reason, None);
  Ok(())
}

#[tokio::test]
pub async fn info_and_mining_status() -> eyre::Result<()> {
  let (daemon, _) = daemon(
    ScriptedTransport::new()
      .json(
        "get_info",
        json!({
          "status": "OK",
          "nettype": "stagenet",
          "stagenet": true,
          "mainnet": false,
          "testnet": false,
          "height": 1_500_000u64,
          "target_height": 0,
          "bootstrap_daemon_address": "",
          "difficulty": 100,
          "wide_difficulty": "0x64",
          "synchronized": true,
          "version": "0.18.3.1"
        }),
      )
      .path(
        "mining_status",
        json!({
          "status": "OK",
          "active": false,
          "address": "5stale",
          "is_background_mining_enabled": true,
          "speed": 0,
          "threads_count": 0
        }),
      ),
  );

  let info = daemon.get_info().await?;
  assert_eq!(info.network_type, Some(NetworkType::Stagenet));
  assert_eq!(info.bootstrap_daemon_address, None);
  assert_eq!(info.difficulty, Some(100));
  assert_eq!(info.version.as_deref(), Some("0.18.3.1"));

  let mining = daemon.get_mining_status().await?;
  assert_eq!(mining.is_active, Some(false));
  assert_eq!(mining.address, None);
  assert_eq!(mining.is_background, None);
  Ok(())
}

#[tokio::test]
pub async fn update_check_drops_empty_strings() -> eyre::Result<()> {
  let (daemon, transport) = daemon(ScriptedTransport::new().path(
    "update",
    json!({ "status": "OK", "update": false, "version": "", "hash": "", "auto_uri": "", "user_uri": "", "path": "" }),
  ));
  let check = daemon.check_for_update().await?;
  assert_eq!(check.is_update_available, Some(false));
  assert_eq!(check.version, None);
  assert_eq!(check.auto_uri, None);

  let download = daemon.download_update(Some("/tmp/monero")).await?;
  assert_eq!(download.download_path, None);
  assert_eq!(
    transport.calls_to("update").last().cloned().flatten(),
    Some(json!({ "command": "download", "path": "/tmp/monero" }))
  );
  Ok(())
}

#[tokio::test]
pub async fn argument_checks_happen_before_any_call() {
  let (daemon, _) = daemon(ScriptedTransport::new());
  assert!(matches!(daemon.start_mining("", 1, false, false).await, Err(DaemonError::InvalidArgument(_))));
  assert!(matches!(daemon.start_mining("5addr", 0, false, false).await, Err(DaemonError::InvalidArgument(_))));
  assert!(matches!(daemon.set_incoming_peer_limit(-1).await, Err(DaemonError::InvalidArgument(_))));
  assert!(matches!(daemon.submit_blocks(&[]).await, Err(DaemonError::InvalidArgument(_))));
}

#[tokio::test]
pub async fn undecodable_operations_are_unimplemented() {
  let (daemon, _) = daemon(ScriptedTransport::new());
  assert!(matches!(daemon.get_alt_chains().await, Err(DaemonError::Unimplemented(_))));
  assert!(matches!(daemon.get_tx_pool_stats().await, Err(DaemonError::Unimplemented(_))));
  assert!(matches!(daemon.get_output_distribution(&[0]).await, Err(DaemonError::Unimplemented(_))));
  assert!(matches!(daemon.get_outputs(&[]).await, Err(DaemonError::Unimplemented(_))));
  // no codec configured
  assert!(matches!(daemon.get_blocks_by_height(&[1]).await, Err(DaemonError::Unimplemented(_))));
}

#[tokio::test]
pub async fn sync_info_with_spans_is_unimplemented() {
  let (daemon, _) = daemon(ScriptedTransport::new().json(
    "sync_info",
    json!({ "status": "OK", "height": 5, "spans": [{ "start_block_height": 1 }] }),
  ));
  assert!(matches!(daemon.get_sync_info().await, Err(DaemonError::Unimplemented(_))));
}

#[tokio::test]
pub async fn bans_round_trip_through_rpc_shape() -> eyre::Result<()> {
  let (daemon, transport) = daemon(
    ScriptedTransport::new()
      .json("get_bans", json!({ "status": "OK", "bans": [{ "host": "1.2.3.4", "ip": 67305985, "seconds": 60 }] }))
      .json("set_bans", json!({ "status": "OK" })),
  );
  let bans = daemon.get_peer_bans().await?;
  assert_eq!(bans[0].host.as_deref(), Some("1.2.3.4"));
  assert_eq!(bans[0].is_banned, Some(true));

  daemon.set_peer_bans(&bans).await?;
  assert_eq!(
    transport.calls_to("set_bans"),
    vec![Some(json!({ "bans": [{ "host": "1.2.3.4", "ip": 67305985, "ban": true, "seconds": 60 }] }))]
  );
  Ok(())
}
