/**
* filename : unpack
* author : HAMA
* date: 2025. 4. 9.
* description: Turns a decoded get_blocks_by_height.bin payload into blocks.
*              `blocks` and `txs` are parallel arrays; tx hashes come from
*              each block's `tx_hashes` by position.
**/
use crate::coin::coin_trait::BinaryCodec;
use crate::coin::monero::model::{Block, Tx};
use crate::mapper::block::link_coinbase;
use crate::mapper::{decode_list, decode_record, map_block, map_tx};
use crate::merge::add_tx_to_block;
use crate::router::check_status;
use crate::types::{DaemonError, Result, WireRecord};
use log::debug;

/// Decode `raw` with `codec` and build one block per requested height.
pub fn unpack_blocks(codec: &dyn BinaryCodec, raw: &[u8], heights: &[u64]) -> Result<Vec<Block>> {
  let decoded = codec.decode_blocks(raw)?;
  check_status(&decoded)?;
  build_blocks(&decoded, heights)
}

/// Build blocks from an already decoded payload. Output order follows
/// `heights`; any length mismatch aborts the whole batch.
pub fn build_blocks(decoded: &WireRecord, heights: &[u64]) -> Result<Vec<Block>> {
  let block_records = match decoded.get("blocks") {
    Some(val) => decode_list("blocks", val)?.as_slice(),
    None => &[],
  };
  let tx_records = match decoded.get("txs") {
    Some(val) => decode_list("txs", val)?.as_slice(),
    None => &[],
  };
  if block_records.len() != tx_records.len() {
    return Err(DaemonError::malformed(format!(
      "{} block records but {} tx record lists",
      block_records.len(),
      tx_records.len()
    )));
  }
  if block_records.len() != heights.len() {
    return Err(DaemonError::malformed(format!(
      "requested {} blocks, received {}",
      heights.len(),
      block_records.len()
    )));
  }

  let mut blocks = Vec::with_capacity(heights.len());
  for ((block_val, txs_val), height) in block_records.iter().zip(tx_records).zip(heights) {
    let mut block = Block::default();
    map_block(decode_record("blocks", block_val)?, &mut block)?;
    // binary records may omit the height
    block.header.height = Some(*height);

    let records = decode_list("txs", txs_val)?;
    let hashes = block.tx_hashes.clone().unwrap_or_default();
    if records.len() > hashes.len() {
      return Err(DaemonError::malformed(format!(
        "block {} has {} tx records but {} tx hashes",
        height,
        records.len(),
        hashes.len()
      )));
    }
    for (record, hash) in records.iter().zip(hashes) {
      let mut tx = Tx::in_block();
      tx.hash = Some(hash);
      map_tx(decode_record("txs", record)?, &mut tx)?;
      add_tx_to_block(&mut block, tx)?;
    }
    link_coinbase(&mut block)?;
    debug!("unpacked block {} with {} txs", height, block.txs.len());
    blocks.push(block);
  }
  Ok(blocks)
}
