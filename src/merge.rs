/**
* filename : merge
* author : HAMA
* date: 2025. 4. 8.
* description: Merges two partial views of one entity. Tx state fields are
*              directional: merge_tx(existing, newer) takes the legal transition.
**/
use crate::coin::monero::model::{Block, BlockHeader, BlockRef, KeyImage, Output, Tx};
use crate::reconcile::{assign, reconcile, reconcile_non_decreasing, reconcile_toward};
use crate::types::{DaemonError, Result};

fn check_identity<T>(entity: &'static str, existing: &Option<T>, observed: &Option<T>) -> Result<()>
where
  T: PartialEq + std::fmt::Debug,
{
  match (existing, observed) {
    (Some(a), Some(b)) if a != b => Err(DaemonError::IdentityMismatch {
      entity,
      existing: format!("{:?}", a),
      observed: format!("{:?}", b),
    }),
    _ => Ok(()),
  }
}

pub fn merge_header(a: BlockHeader, b: BlockHeader) -> Result<BlockHeader> {
  check_identity("block", &a.hash, &b.hash)?;
  check_identity("block", &a.height, &b.height)?;
  Ok(BlockHeader {
    hash: reconcile("header.hash", a.hash, b.hash)?,
    height: reconcile("header.height", a.height, b.height)?,
    prev_hash: reconcile("header.prev_hash", a.prev_hash, b.prev_hash)?,
    timestamp: reconcile("header.timestamp", a.timestamp, b.timestamp)?,
    difficulty: reconcile("header.difficulty", a.difficulty, b.difficulty)?,
    cumulative_difficulty: reconcile("header.cumulative_difficulty", a.cumulative_difficulty, b.cumulative_difficulty)?,
    size: reconcile("header.size", a.size, b.size)?,
    weight: reconcile("header.weight", a.weight, b.weight)?,
    long_term_weight: reconcile("header.long_term_weight", a.long_term_weight, b.long_term_weight)?,
    // grows as the chain does
    depth: reconcile_non_decreasing("header.depth", a.depth, b.depth)?,
    nonce: reconcile("header.nonce", a.nonce, b.nonce)?,
    major_version: reconcile("header.major_version", a.major_version, b.major_version)?,
    minor_version: reconcile("header.minor_version", a.minor_version, b.minor_version)?,
    num_txs: reconcile("header.num_txs", a.num_txs, b.num_txs)?,
    reward: reconcile("header.reward", a.reward, b.reward)?,
    pow_hash: reconcile("header.pow_hash", a.pow_hash, b.pow_hash)?,
    orphan_status: reconcile("header.orphan_status", a.orphan_status, b.orphan_status)?,
    miner_tx_hash: reconcile("header.miner_tx_hash", a.miner_tx_hash, b.miner_tx_hash)?,
  })
}

/// Merge two views of the same block.
///
/// The coinbase merges as a transaction; `b`'s transactions join `a`'s
/// through [`add_tx_to_block`], so each hash appears once.
pub fn merge_block(a: Block, b: Block) -> Result<Block> {
  let mut merged = Block {
    header: merge_header(a.header, b.header)?,
    hex: reconcile("block.hex", a.hex, b.hex)?,
    tx_hashes: reconcile("block.tx_hashes", a.tx_hashes, b.tx_hashes)?,
    coinbase_tx: match (a.coinbase_tx, b.coinbase_tx) {
      (Some(x), Some(y)) => Some(merge_tx(x, y)?),
      (x, y) => x.or(y),
    },
    txs: Vec::new(),
  };
  for tx in a.txs.into_iter().chain(b.txs) {
    add_tx_to_block(&mut merged, tx)?;
  }
  if let Some(coinbase) = merged.coinbase_tx.as_mut() {
    coinbase.block = Some(BlockRef::of(&merged.header));
  }
  Ok(merged)
}

fn merge_block_ref(a: Option<BlockRef>, b: Option<BlockRef>) -> Result<Option<BlockRef>> {
  match (a, b) {
    (Some(a), Some(b)) => {
      check_identity("block", &a.hash, &b.hash)?;
      check_identity("block", &a.height, &b.height)?;
      Ok(Some(BlockRef {
        hash: reconcile("tx.block.hash", a.hash, b.hash)?,
        height: reconcile("tx.block.height", a.height, b.height)?,
        timestamp: reconcile("tx.block.timestamp", a.timestamp, b.timestamp)?,
      }))
    }
    (a, b) => Ok(a.or(b)),
  }
}

/// Merge an earlier view of a transaction with a newer one.
pub fn merge_tx(existing: Tx, newer: Tx) -> Result<Tx> {
  check_identity("tx", &existing.hash, &newer.hash)?;
  let a = existing;
  let b = newer;
  let is_relayed = reconcile_toward("tx.is_relayed", a.is_relayed, b.is_relayed, true)?;
  let last_relayed_timestamp = if is_relayed == Some(true) {
    reconcile_non_decreasing("tx.last_relayed_timestamp", a.last_relayed_timestamp, b.last_relayed_timestamp)?
  } else {
    None
  };
  Ok(Tx {
    hash: reconcile("tx.hash", a.hash, b.hash)?,
    block: merge_block_ref(a.block, b.block)?,
    version: reconcile("tx.version", a.version, b.version)?,
    is_coinbase: reconcile("tx.is_coinbase", a.is_coinbase, b.is_coinbase)?,
    size: reconcile("tx.size", a.size, b.size)?,
    weight: reconcile("tx.weight", a.weight, b.weight)?,
    fee: reconcile("tx.fee", a.fee, b.fee)?,
    extra: reconcile("tx.extra", a.extra, b.extra)?,
    unlock_time: reconcile("tx.unlock_time", a.unlock_time, b.unlock_time)?,
    full_hex: reconcile("tx.full_hex", a.full_hex, b.full_hex)?,
    pruned_hex: reconcile("tx.pruned_hex", a.pruned_hex, b.pruned_hex)?,
    prunable_hex: reconcile("tx.prunable_hex", a.prunable_hex, b.prunable_hex)?,
    prunable_hash: reconcile("tx.prunable_hash", a.prunable_hash, b.prunable_hash)?,
    signatures: reconcile("tx.signatures", a.signatures, b.signatures)?,
    rct_signatures: reconcile("tx.rct_signatures", a.rct_signatures, b.rct_signatures)?,
    rct_sig_prunable: reconcile("tx.rct_sig_prunable", a.rct_sig_prunable, b.rct_sig_prunable)?,
    is_relayed,
    do_not_relay: reconcile("tx.do_not_relay", a.do_not_relay, b.do_not_relay)?,
    in_tx_pool: reconcile_toward("tx.in_tx_pool", a.in_tx_pool, b.in_tx_pool, false)?,
    is_confirmed: reconcile_toward("tx.is_confirmed", a.is_confirmed, b.is_confirmed, true)?,
    num_confirmations: reconcile_non_decreasing("tx.num_confirmations", a.num_confirmations, b.num_confirmations)?,
    is_double_spend: reconcile("tx.is_double_spend", a.is_double_spend, b.is_double_spend)?,
    is_failed: reconcile_toward("tx.is_failed", a.is_failed, b.is_failed, true)?,
    last_failed_height: reconcile("tx.last_failed_height", a.last_failed_height, b.last_failed_height)?,
    last_failed_hash: reconcile("tx.last_failed_hash", a.last_failed_hash, b.last_failed_hash)?,
    max_used_block_height: reconcile("tx.max_used_block_height", a.max_used_block_height, b.max_used_block_height)?,
    max_used_block_hash: reconcile("tx.max_used_block_hash", a.max_used_block_hash, b.max_used_block_hash)?,
    is_kept_by_block: reconcile("tx.is_kept_by_block", a.is_kept_by_block, b.is_kept_by_block)?,
    received_timestamp: reconcile("tx.received_timestamp", a.received_timestamp, b.received_timestamp)?,
    last_relayed_timestamp,
    output_indices: reconcile("tx.output_indices", a.output_indices, b.output_indices)?,
    inputs: merge_output_lists("tx.inputs", a.inputs, b.inputs)?,
    outputs: merge_output_lists("tx.outputs", a.outputs, b.outputs)?,
  })
}

fn merge_key_image(a: Option<KeyImage>, b: Option<KeyImage>) -> Result<Option<KeyImage>> {
  match (a, b) {
    (Some(a), Some(b)) => Ok(Some(KeyImage {
      hex: reconcile("key_image.hex", Some(a.hex), Some(b.hex))?.unwrap_or_default(),
      signature: reconcile("key_image.signature", a.signature, b.signature)?,
    })),
    (a, b) => Ok(a.or(b)),
  }
}

pub fn merge_output(a: Output, b: Output) -> Result<Output> {
  Ok(Output {
    amount: reconcile("output.amount", a.amount, b.amount)?,
    key_image: merge_key_image(a.key_image, b.key_image)?,
    ring_output_indices: reconcile("output.ring_output_indices", a.ring_output_indices, b.ring_output_indices)?,
    stealth_public_key: reconcile("output.stealth_public_key", a.stealth_public_key, b.stealth_public_key)?,
    view_tag: reconcile("output.view_tag", a.view_tag, b.view_tag)?,
    index: reconcile("output.index", a.index, b.index)?,
  })
}

/// Outputs have no identity of their own; two views pair up by position.
pub fn merge_output_lists(
  field: &'static str,
  existing: Option<Vec<Output>>,
  observed: Option<Vec<Output>>,
) -> Result<Option<Vec<Output>>> {
  match (existing, observed) {
    (Some(existing), Some(observed)) => {
      if existing.len() != observed.len() {
        return Err(DaemonError::DataConflict {
          field,
          existing: format!("{} entries", existing.len()),
          observed: format!("{} entries", observed.len()),
        });
      }
      existing
        .into_iter()
        .zip(observed)
        .map(|(a, b)| merge_output(a, b))
        .collect::<Result<Vec<_>>>()
        .map(Some)
    }
    (existing, observed) => Ok(existing.or(observed)),
  }
}

/// Attach `tx` to `block`.
///
/// Block coordinates the tx carries are reconciled into the header first. A
/// tx whose hash the block already holds is merged into that entry.
pub fn add_tx_to_block(block: &mut Block, mut tx: Tx) -> Result<()> {
  if let Some(linked) = tx.block.take() {
    check_identity("block", &block.header.hash, &linked.hash)?;
    check_identity("block", &block.header.height, &linked.height)?;
    if let Some(hash) = linked.hash {
      assign("header.hash", &mut block.header.hash, hash)?;
    }
    if let Some(height) = linked.height {
      assign("header.height", &mut block.header.height, height)?;
    }
    if let Some(timestamp) = linked.timestamp {
      assign("header.timestamp", &mut block.header.timestamp, timestamp)?;
    }
  }

  let existing = tx
    .hash
    .as_deref()
    .and_then(|hash| block.txs.iter().position(|known| known.hash.as_deref() == Some(hash)));
  match existing {
    Some(pos) => {
      let known = std::mem::take(&mut block.txs[pos]);
      block.txs[pos] = merge_tx(known, tx)?;
    }
    None => block.txs.push(tx),
  }

  let block_ref = BlockRef::of(&block.header);
  for tx in block.txs.iter_mut() {
    tx.block = Some(block_ref.clone());
  }
  Ok(())
}
