/**
* filename : tx
* author : HAMA
* date: 2025. 4. 7.
* description: Transaction and output mapping.
**/
use super::{
  assign_opt, decode_bool, decode_bytes, decode_embedded, decode_list, decode_opt_str, decode_record,
  decode_str, decode_string_list, decode_u32, decode_u64, decode_u64_list, is_envelope_key, warn_unknown,
  NULL_HASH,
};
use crate::coin::monero::model::{BlockRef, KeyImage, Output, Tx};
use crate::merge::merge_output_lists;
use crate::reconcile::assign;
use crate::types::{DaemonError, Result, WireRecord};
use serde_json::Value;

/// Wire keys understood on a transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxField {
  Hash,
  BlockHeight,
  BlockTimestamp,
  Confirmations,
  LastRelayedTime,
  ReceiveTime,
  InPool,
  DoubleSpendSeen,
  Version,
  Extra,
  Inputs,
  Outputs,
  RctSignatures,
  RctSigPrunable,
  UnlockTime,
  EmbeddedJson,
  FullHex,
  PrunedHex,
  PrunableHex,
  PrunableHash,
  Size,
  Weight,
  Fee,
  Relayed,
  DoNotRelay,
  KeptByBlock,
  OutputIndices,
  Signatures,
  LastFailedHeight,
  LastFailedHash,
  MaxUsedBlockHeight,
  MaxUsedBlockHash,
  Envelope,
}

impl TxField {
  fn from_wire(key: &str) -> Option<Self> {
    let field = match key {
      "tx_hash" | "id_hash" => TxField::Hash,
      "block_height" => TxField::BlockHeight,
      "block_timestamp" => TxField::BlockTimestamp,
      "confirmations" => TxField::Confirmations,
      "last_relayed_time" => TxField::LastRelayedTime,
      "receive_time" => TxField::ReceiveTime,
      "in_pool" => TxField::InPool,
      "double_spend_seen" => TxField::DoubleSpendSeen,
      "version" => TxField::Version,
      "extra" => TxField::Extra,
      "vin" => TxField::Inputs,
      "vout" => TxField::Outputs,
      "rct_signatures" => TxField::RctSignatures,
      "rctsig_prunable" => TxField::RctSigPrunable,
      "unlock_time" => TxField::UnlockTime,
      "as_json" | "tx_json" => TxField::EmbeddedJson,
      "as_hex" | "tx_blob" => TxField::FullHex,
      "pruned_as_hex" => TxField::PrunedHex,
      "prunable_as_hex" => TxField::PrunableHex,
      "prunable_hash" => TxField::PrunableHash,
      "blob_size" => TxField::Size,
      "weight" => TxField::Weight,
      "fee" => TxField::Fee,
      "relayed" => TxField::Relayed,
      "do_not_relay" => TxField::DoNotRelay,
      "kept_by_block" => TxField::KeptByBlock,
      "output_indices" => TxField::OutputIndices,
      "signatures" => TxField::Signatures,
      "last_failed_height" => TxField::LastFailedHeight,
      "last_failed_id_hash" => TxField::LastFailedHash,
      "max_used_block_height" => TxField::MaxUsedBlockHeight,
      "max_used_block_id_hash" => TxField::MaxUsedBlockHash,
      key if is_envelope_key(key) => TxField::Envelope,
      _ => return None,
    };
    Some(field)
  }
}

/// Map one transaction record onto `tx`, reconciling against what `tx`
/// already holds.
///
/// Embedded `as_json`/`tx_json` documents are mapped last, through this same
/// function, so their fields reconcile against the outer ones.
pub fn map_tx(record: &WireRecord, tx: &mut Tx) -> Result<()> {
  let mut block: Option<BlockRef> = None;
  let mut failed_height: Option<u64> = None;
  let mut failed_hash: Option<String> = None;
  let mut embedded: Vec<Value> = Vec::new();

  for (key, val) in record {
    let Some(field) = TxField::from_wire(key) else {
      warn_unknown("tx", key, val);
      continue;
    };
    match field {
      TxField::Hash => assign_opt("tx.hash", &mut tx.hash, decode_opt_str(key, val)?)?,
      TxField::BlockHeight => {
        let block = block.get_or_insert_with(BlockRef::default);
        assign("tx.block.height", &mut block.height, decode_u64(key, val)?)?;
      }
      TxField::BlockTimestamp => {
        let block = block.get_or_insert_with(BlockRef::default);
        assign("tx.block.timestamp", &mut block.timestamp, decode_u64(key, val)?)?;
      }
      TxField::Confirmations => assign("tx.num_confirmations", &mut tx.num_confirmations, decode_u64(key, val)?)?,
      TxField::LastRelayedTime => {
        assign("tx.last_relayed_timestamp", &mut tx.last_relayed_timestamp, decode_u64(key, val)?)?
      }
      TxField::ReceiveTime => assign("tx.received_timestamp", &mut tx.received_timestamp, decode_u64(key, val)?)?,
      TxField::InPool => {
        let in_pool = decode_bool(key, val)?;
        assign("tx.is_confirmed", &mut tx.is_confirmed, !in_pool)?;
        assign("tx.in_tx_pool", &mut tx.in_tx_pool, in_pool)?;
      }
      TxField::DoubleSpendSeen => assign("tx.is_double_spend", &mut tx.is_double_spend, decode_bool(key, val)?)?,
      TxField::Version => assign("tx.version", &mut tx.version, decode_u32(key, val)?)?,
      TxField::Extra => assign("tx.extra", &mut tx.extra, decode_bytes(key, val)?)?,
      TxField::Inputs => {
        let vins = decode_list(key, val)?;
        if is_coinbase_input(vins)? {
          continue;
        }
        let inputs = vins
          .iter()
          .map(|vin| map_output(decode_record(key, vin)?))
          .collect::<Result<Vec<_>>>()?;
        tx.inputs = merge_output_lists("tx.inputs", tx.inputs.take(), Some(inputs))?;
      }
      TxField::Outputs => {
        let outputs = decode_list(key, val)?
          .iter()
          .map(|vout| map_output(decode_record(key, vout)?))
          .collect::<Result<Vec<_>>>()?;
        tx.outputs = merge_output_lists("tx.outputs", tx.outputs.take(), Some(outputs))?;
      }
      TxField::RctSignatures => assign("tx.rct_signatures", &mut tx.rct_signatures, val.clone())?,
      TxField::RctSigPrunable => assign("tx.rct_sig_prunable", &mut tx.rct_sig_prunable, val.clone())?,
      TxField::UnlockTime => assign("tx.unlock_time", &mut tx.unlock_time, decode_u64(key, val)?)?,
      TxField::EmbeddedJson => {
        if let Some(doc) = decode_embedded(key, val)? {
          embedded.push(doc);
        }
      }
      TxField::FullHex => assign_opt("tx.full_hex", &mut tx.full_hex, decode_opt_str(key, val)?)?,
      TxField::PrunedHex => assign_opt("tx.pruned_hex", &mut tx.pruned_hex, decode_opt_str(key, val)?)?,
      TxField::PrunableHex => assign_opt("tx.prunable_hex", &mut tx.prunable_hex, decode_opt_str(key, val)?)?,
      TxField::PrunableHash => assign_opt("tx.prunable_hash", &mut tx.prunable_hash, decode_opt_str(key, val)?)?,
      TxField::Size => assign("tx.size", &mut tx.size, decode_u64(key, val)?)?,
      TxField::Weight => assign("tx.weight", &mut tx.weight, decode_u64(key, val)?)?,
      TxField::Fee => assign("tx.fee", &mut tx.fee, decode_u64(key, val)?)?,
      TxField::Relayed => assign("tx.is_relayed", &mut tx.is_relayed, decode_bool(key, val)?)?,
      TxField::DoNotRelay => assign("tx.do_not_relay", &mut tx.do_not_relay, decode_bool(key, val)?)?,
      TxField::KeptByBlock => assign("tx.is_kept_by_block", &mut tx.is_kept_by_block, decode_bool(key, val)?)?,
      TxField::OutputIndices => assign("tx.output_indices", &mut tx.output_indices, decode_u64_list(key, val)?)?,
      TxField::Signatures => assign("tx.signatures", &mut tx.signatures, decode_string_list(key, val)?)?,
      TxField::LastFailedHeight => failed_height = Some(decode_u64(key, val)?),
      TxField::LastFailedHash => failed_hash = Some(decode_str(key, val)?.to_string()),
      TxField::MaxUsedBlockHeight => {
        assign("tx.max_used_block_height", &mut tx.max_used_block_height, decode_u64(key, val)?)?
      }
      TxField::MaxUsedBlockHash => {
        assign_opt("tx.max_used_block_hash", &mut tx.max_used_block_hash, decode_opt_str(key, val)?)?
      }
      TxField::Envelope => {}
    }
  }

  apply_failure(tx, failed_height, failed_hash)?;

  if let Some(observed) = block {
    let linked = tx.block.get_or_insert_with(BlockRef::default);
    if let Some(height) = observed.height {
      assign("tx.block.height", &mut linked.height, height)?;
    }
    if let Some(timestamp) = observed.timestamp {
      assign("tx.block.timestamp", &mut linked.timestamp, timestamp)?;
    }
  }

  // unconfirmed txs come back with block height == block timestamp; such a
  // tx is still pooled unless it already failed
  let misreported = tx
    .block
    .as_ref()
    .map_or(false, |block| block.height.is_some() && block.height == block.timestamp);
  if misreported {
    tx.block = None;
    tx.is_confirmed = Some(false);
    tx.in_tx_pool = Some(tx.is_failed != Some(true));
  }

  match tx.is_confirmed {
    Some(true) => {
      assign("tx.is_relayed", &mut tx.is_relayed, true)?;
      assign("tx.do_not_relay", &mut tx.do_not_relay, false)?;
      assign("tx.is_failed", &mut tx.is_failed, false)?;
    }
    Some(false) => tx.num_confirmations = Some(0),
    None => {}
  }
  if tx.is_failed.is_none() {
    tx.is_failed = Some(false);
  }
  apply_output_indices(tx)?;

  for doc in embedded {
    let inner = doc
      .as_object()
      .ok_or_else(|| DaemonError::malformed(format!("embedded tx json is not a record: {}", doc)))?;
    map_tx(inner, tx)?;
  }

  // daemon reports last_relayed_time even when relayed is false
  if tx.is_relayed != Some(true) {
    tx.last_relayed_timestamp = None;
  }
  Ok(())
}

/// Map one `vin`/`vout` entry.
pub fn map_output(record: &WireRecord) -> Result<Output> {
  let mut output = Output::default();
  for (key, val) in record {
    match key.as_str() {
      "gen" => {
        return Err(DaemonError::malformed("coinbase 'gen' input mixed with spendable inputs"));
      }
      "key" => {
        let rpc_key = decode_record(key, val)?;
        if let Some(amount) = rpc_key.get("amount") {
          assign("output.amount", &mut output.amount, decode_u64("amount", amount)?)?;
        }
        if let Some(k_image) = rpc_key.get("k_image") {
          let key_image = decode_opt_str("k_image", k_image)?.map(KeyImage::new);
          assign_opt("output.key_image", &mut output.key_image, key_image)?;
        }
        if let Some(offsets) = rpc_key.get("key_offsets") {
          assign(
            "output.ring_output_indices",
            &mut output.ring_output_indices,
            decode_u64_list("key_offsets", offsets)?,
          )?;
        }
      }
      "amount" => assign("output.amount", &mut output.amount, decode_u64(key, val)?)?,
      "target" => map_target(decode_record(key, val)?, &mut output)?,
      _ => warn_unknown("output", key, val),
    }
  }
  Ok(output)
}

fn map_target(target: &WireRecord, output: &mut Output) -> Result<()> {
  for (key, val) in target {
    match key.as_str() {
      "key" => assign_opt("output.stealth_public_key", &mut output.stealth_public_key, decode_opt_str(key, val)?)?,
      "tagged_key" => {
        let tagged = decode_record(key, val)?;
        if let Some(stealth) = tagged.get("key") {
          assign_opt("output.stealth_public_key", &mut output.stealth_public_key, decode_opt_str("key", stealth)?)?;
        }
        if let Some(view_tag) = tagged.get("view_tag") {
          assign_opt("output.view_tag", &mut output.view_tag, decode_opt_str("view_tag", view_tag)?)?;
        }
      }
      _ => warn_unknown("output target", key, val),
    }
  }
  Ok(())
}

/// A coinbase `vin` is a single `gen` entry and spends nothing.
fn is_coinbase_input(vins: &[Value]) -> Result<bool> {
  match vins {
    [only] => Ok(decode_record("vin", only)?.contains_key("gen")),
    _ => Ok(false),
  }
}

/// Zero height and the null hash mean "never failed".
fn apply_failure(tx: &mut Tx, height: Option<u64>, hash: Option<String>) -> Result<()> {
  if height.is_none() && hash.is_none() {
    return Ok(());
  }
  let height = height.filter(|height| *height != 0);
  let hash = hash.filter(|hash| hash != NULL_HASH && !hash.is_empty());
  assign("tx.is_failed", &mut tx.is_failed, height.is_some() || hash.is_some())?;
  if let Some(height) = height {
    assign("tx.last_failed_height", &mut tx.last_failed_height, height)?;
  }
  if let Some(hash) = hash {
    assign("tx.last_failed_hash", &mut tx.last_failed_hash, hash)?;
  }
  Ok(())
}

fn apply_output_indices(tx: &mut Tx) -> Result<()> {
  if let (Some(indices), Some(outputs)) = (tx.output_indices.as_ref(), tx.outputs.as_mut()) {
    if indices.len() != outputs.len() {
      return Err(DaemonError::malformed(format!(
        "{} output indices for {} outputs",
        indices.len(),
        outputs.len()
      )));
    }
    for (output, index) in outputs.iter_mut().zip(indices) {
      assign("output.index", &mut output.index, *index)?;
    }
  }
  Ok(())
}
