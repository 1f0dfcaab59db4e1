/**
* filename : block
* author : HAMA
* date: 2025. 4. 7.
* description: 
**/
use super::{
  assign_opt, decode_bool, decode_embedded, decode_opt_str, decode_record, decode_string_list, decode_u32,
  decode_u64, decode_wide_hex, is_envelope_key, map_tx, warn_unknown, WideNumber,
};
use crate::coin::monero::model::{Block, BlockHeader, BlockRef, Tx};
use crate::reconcile::assign;
use crate::types::{DaemonError, Result, WireRecord};
use serde_json::Value;

/// Wire keys understood on a block header record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderField {
  Size,
  Weight,
  LongTermWeight,
  Depth,
  Difficulty,
  DifficultyTop64,
  WideDifficulty,
  CumulativeDifficulty,
  CumulativeDifficultyTop64,
  WideCumulativeDifficulty,
  Hash,
  Height,
  MajorVersion,
  MinorVersion,
  Nonce,
  NumTxs,
  OrphanStatus,
  PrevHash,
  Reward,
  Timestamp,
  PowHash,
  MinerTxHash,
  /// Belongs to the block model; skipped when mapping a bare header.
  BlockBody,
  Envelope,
}

impl HeaderField {
  fn from_wire(key: &str) -> Option<Self> {
    let field = match key {
      "block_size" => HeaderField::Size,
      "block_weight" => HeaderField::Weight,
      "long_term_weight" => HeaderField::LongTermWeight,
      "depth" => HeaderField::Depth,
      "difficulty" => HeaderField::Difficulty,
      "difficulty_top64" => HeaderField::DifficultyTop64,
      "wide_difficulty" => HeaderField::WideDifficulty,
      "cumulative_difficulty" => HeaderField::CumulativeDifficulty,
      "cumulative_difficulty_top64" => HeaderField::CumulativeDifficultyTop64,
      "wide_cumulative_difficulty" => HeaderField::WideCumulativeDifficulty,
      "hash" => HeaderField::Hash,
      "height" => HeaderField::Height,
      "major_version" => HeaderField::MajorVersion,
      "minor_version" => HeaderField::MinorVersion,
      "nonce" => HeaderField::Nonce,
      "num_txes" => HeaderField::NumTxs,
      "orphan_status" => HeaderField::OrphanStatus,
      "prev_hash" | "prev_id" => HeaderField::PrevHash,
      "reward" => HeaderField::Reward,
      "timestamp" => HeaderField::Timestamp,
      "pow_hash" => HeaderField::PowHash,
      "miner_tx_hash" => HeaderField::MinerTxHash,
      "tx_hashes" | "miner_tx" | "blob" | "json" | "block_header" => HeaderField::BlockBody,
      key if is_envelope_key(key) => HeaderField::Envelope,
      _ => return None,
    };
    Some(field)
  }
}

/// Wire keys that only appear on full block records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockField {
  NestedHeader,
  Blob,
  TxHashes,
  MinerTx,
  Json,
}

impl BlockField {
  fn from_wire(key: &str) -> Option<Self> {
    match key {
      "block_header" => Some(BlockField::NestedHeader),
      "blob" => Some(BlockField::Blob),
      "tx_hashes" => Some(BlockField::TxHashes),
      "miner_tx" => Some(BlockField::MinerTx),
      "json" => Some(BlockField::Json),
      _ => None,
    }
  }
}

/// Map a block header record onto `header`.
pub fn map_header(record: &WireRecord, header: &mut BlockHeader) -> Result<()> {
  map_header_entries(record.iter(), header)
}

fn map_header_entries<'a, I>(entries: I, header: &mut BlockHeader) -> Result<()>
where
  I: Iterator<Item = (&'a String, &'a Value)>,
{
  let mut difficulty = WideNumber::default();
  let mut cumulative = WideNumber::default();

  for (key, val) in entries {
    let Some(field) = HeaderField::from_wire(key) else {
      warn_unknown("block header", key, val);
      continue;
    };
    match field {
      HeaderField::Size => assign("header.size", &mut header.size, decode_u64(key, val)?)?,
      HeaderField::Weight => assign("header.weight", &mut header.weight, decode_u64(key, val)?)?,
      HeaderField::LongTermWeight => assign("header.long_term_weight", &mut header.long_term_weight, decode_u64(key, val)?)?,
      HeaderField::Depth => assign("header.depth", &mut header.depth, decode_u64(key, val)?)?,
      HeaderField::Difficulty => difficulty.low = Some(decode_u64(key, val)?),
      HeaderField::DifficultyTop64 => difficulty.top64 = Some(decode_u64(key, val)?),
      HeaderField::WideDifficulty => difficulty.wide = Some(decode_wide_hex(key, val)?),
      HeaderField::CumulativeDifficulty => cumulative.low = Some(decode_u64(key, val)?),
      HeaderField::CumulativeDifficultyTop64 => cumulative.top64 = Some(decode_u64(key, val)?),
      HeaderField::WideCumulativeDifficulty => cumulative.wide = Some(decode_wide_hex(key, val)?),
      HeaderField::Hash => assign_opt("header.hash", &mut header.hash, decode_opt_str(key, val)?)?,
      HeaderField::Height => assign("header.height", &mut header.height, decode_u64(key, val)?)?,
      HeaderField::MajorVersion => assign("header.major_version", &mut header.major_version, decode_u32(key, val)?)?,
      HeaderField::MinorVersion => assign("header.minor_version", &mut header.minor_version, decode_u32(key, val)?)?,
      HeaderField::Nonce => assign("header.nonce", &mut header.nonce, decode_u64(key, val)?)?,
      HeaderField::NumTxs => assign("header.num_txs", &mut header.num_txs, decode_u64(key, val)?)?,
      HeaderField::OrphanStatus => assign("header.orphan_status", &mut header.orphan_status, decode_bool(key, val)?)?,
      HeaderField::PrevHash => assign_opt("header.prev_hash", &mut header.prev_hash, decode_opt_str(key, val)?)?,
      HeaderField::Reward => assign("header.reward", &mut header.reward, decode_u64(key, val)?)?,
      HeaderField::Timestamp => assign("header.timestamp", &mut header.timestamp, decode_u64(key, val)?)?,
      HeaderField::PowHash => assign_opt("header.pow_hash", &mut header.pow_hash, decode_opt_str(key, val)?)?,
      HeaderField::MinerTxHash => {
        assign_opt("header.miner_tx_hash", &mut header.miner_tx_hash, decode_opt_str(key, val)?)?
      }
      HeaderField::BlockBody | HeaderField::Envelope => {}
    }
  }

  if let Some(value) = difficulty.resolve("header.difficulty")? {
    assign("header.difficulty", &mut header.difficulty, value)?;
  }
  if let Some(value) = cumulative.resolve("header.cumulative_difficulty")? {
    assign("header.cumulative_difficulty", &mut header.cumulative_difficulty, value)?;
  }
  Ok(())
}

/// Map a full block record onto `block`.
///
/// Header fields may sit at the top level or under `block_header`. The
/// embedded `json` document is fed back through this function after the
/// outer pass; `miner_tx` records become the coinbase transaction.
pub fn map_block(record: &WireRecord, block: &mut Block) -> Result<()> {
  let mut miner_txs: Vec<&WireRecord> = Vec::new();
  let mut embedded: Option<Value> = None;

  for (key, val) in record {
    let Some(field) = BlockField::from_wire(key) else {
      continue;
    };
    match field {
      BlockField::NestedHeader => map_header(decode_record(key, val)?, &mut block.header)?,
      BlockField::Blob => {
        if let Some(hex) = decode_opt_str(key, val)? {
          assign("block.hex", &mut block.hex, hex)?;
        }
      }
      BlockField::TxHashes => assign("block.tx_hashes", &mut block.tx_hashes, decode_string_list(key, val)?)?,
      BlockField::MinerTx => miner_txs.push(decode_record(key, val)?),
      BlockField::Json => embedded = decode_embedded(key, val)?,
    }
  }
  map_header_entries(
    record.iter().filter(|(key, _)| BlockField::from_wire(key).is_none()),
    &mut block.header,
  )?;

  if let Some(doc) = embedded {
    let inner = doc
      .as_object()
      .ok_or_else(|| DaemonError::malformed(format!("embedded block json is not a record: {}", doc)))?;
    map_block(inner, block)?;
  }

  for miner_tx in miner_txs {
    let mut coinbase = block.coinbase_tx.take().unwrap_or_else(Tx::coinbase);
    map_tx(miner_tx, &mut coinbase)?;
    block.coinbase_tx = Some(coinbase);
  }
  link_coinbase(block)?;

  if block.tx_hashes.is_none() {
    block.tx_hashes = Some(Vec::new());
  }
  Ok(())
}

/// Point the coinbase at its block and give it the header's miner tx hash.
pub(crate) fn link_coinbase(block: &mut Block) -> Result<()> {
  let miner_tx_hash = block.header.miner_tx_hash.clone();
  let block_ref = BlockRef::of(&block.header);
  if let Some(coinbase) = block.coinbase_tx.as_mut() {
    if let Some(hash) = miner_tx_hash {
      assign("coinbase.hash", &mut coinbase.hash, hash)?;
    }
    assign("coinbase.is_coinbase", &mut coinbase.is_coinbase, true)?;
    assign("coinbase.is_confirmed", &mut coinbase.is_confirmed, true)?;
    coinbase.block = Some(block_ref);
  }
  Ok(())
}
