/**
* filename : mapper
* author : HAMA
* date: 2025. 4. 7.
* description: Wire record to typed entity mapping. Keys outside an entity's
*              table are logged and skipped.
**/
pub mod block;
pub mod info;
pub mod tx;

pub use block::{map_block, map_header};
pub use info::*;
pub use tx::{map_output, map_tx};

use crate::types::{DaemonError, Result, WireRecord};
use log::warn;
use serde_json::Value;

/// All-zero hash the daemon uses for "no block/tx".
pub const NULL_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Envelope fields present on most responses; handled by the router.
pub(crate) fn is_envelope_key(key: &str) -> bool {
  matches!(key, "status" | "untrusted" | "credits" | "top_hash")
}

pub(crate) fn warn_unknown(entity: &str, key: &str, val: &Value) {
  warn!("ignoring unexpected field in {}: '{}': {}", entity, key, val);
}

pub(crate) fn decode_u64(field: &str, val: &Value) -> Result<u64> {
  val.as_u64()
    .ok_or_else(|| DaemonError::malformed(format!("field '{}' is not an unsigned integer: {}", field, val)))
}

pub(crate) fn decode_u32(field: &str, val: &Value) -> Result<u32> {
  let wide = decode_u64(field, val)?;
  u32::try_from(wide).map_err(|_| DaemonError::malformed(format!("field '{}' out of range: {}", field, wide)))
}

pub(crate) fn decode_bool(field: &str, val: &Value) -> Result<bool> {
  val.as_bool()
    .ok_or_else(|| DaemonError::malformed(format!("field '{}' is not a boolean: {}", field, val)))
}

pub(crate) fn decode_str<'a>(field: &str, val: &'a Value) -> Result<&'a str> {
  val.as_str()
    .ok_or_else(|| DaemonError::malformed(format!("field '{}' is not a string: {}", field, val)))
}

/// String field where `""` means absent.
pub(crate) fn decode_opt_str(field: &str, val: &Value) -> Result<Option<String>> {
  let s = decode_str(field, val)?;
  Ok(if s.is_empty() { None } else { Some(s.to_string()) })
}

pub(crate) fn decode_list<'a>(field: &str, val: &'a Value) -> Result<&'a Vec<Value>> {
  val.as_array()
    .ok_or_else(|| DaemonError::malformed(format!("field '{}' is not a list: {}", field, val)))
}

pub(crate) fn decode_record<'a>(field: &str, val: &'a Value) -> Result<&'a WireRecord> {
  val.as_object()
    .ok_or_else(|| DaemonError::malformed(format!("field '{}' is not a record: {}", field, val)))
}

pub(crate) fn decode_u64_list(field: &str, val: &Value) -> Result<Vec<u64>> {
  decode_list(field, val)?.iter().map(|v| decode_u64(field, v)).collect()
}

pub(crate) fn decode_string_list(field: &str, val: &Value) -> Result<Vec<String>> {
  decode_list(field, val)?
    .iter()
    .map(|v| decode_str(field, v).map(str::to_string))
    .collect()
}

pub(crate) fn decode_bytes(field: &str, val: &Value) -> Result<Vec<u8>> {
  decode_list(field, val)?
    .iter()
    .map(|v| {
      let byte = decode_u64(field, v)?;
      u8::try_from(byte).map_err(|_| DaemonError::malformed(format!("field '{}' has non-byte value {}", field, byte)))
    })
    .collect()
}

/// Decode a string-valued field that carries a JSON document.
/// Empty strings carry nothing.
pub(crate) fn decode_embedded(field: &str, val: &Value) -> Result<Option<Value>> {
  match decode_opt_str(field, val)? {
    Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
    None => Ok(None),
  }
}

/// Assign only when the wire carried a value.
pub(crate) fn assign_opt<T>(field: &'static str, slot: &mut Option<T>, observed: Option<T>) -> Result<()>
where
  T: PartialEq + std::fmt::Debug,
{
  match observed {
    Some(value) => crate::reconcile::assign(field, slot, value),
    None => Ok(()),
  }
}

/// Parse a `wide_*` hex string such as `"0x1e8480"`.
pub(crate) fn decode_wide_hex(field: &str, val: &Value) -> Result<u128> {
  let s = decode_str(field, val)?;
  let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
  u128::from_str_radix(digits, 16)
    .map_err(|e| DaemonError::malformed(format!("field '{}' is not a hex number ({}): {}", field, e, s)))
}

/// A 128-bit quantity split across `x`, `x_top64` and `wide_x`.
#[derive(Debug, Default)]
pub(crate) struct WideNumber {
  pub low: Option<u64>,
  pub top64: Option<u64>,
  pub wide: Option<u128>,
}

impl WideNumber {
  /// Combine the observed parts. A `wide_*` value must agree with the
  /// low/top64 split when both are present.
  pub fn resolve(&self, field: &'static str) -> Result<Option<u128>> {
    let split = self
      .low
      .map(|low| (u128::from(self.top64.unwrap_or(0)) << 64) | u128::from(low));
    crate::reconcile::reconcile(field, split, self.wide)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn empty_strings_are_absent() {
    assert_eq!(decode_opt_str("pow_hash", &json!("")).unwrap(), None);
    assert_eq!(decode_opt_str("pow_hash", &json!("ab")).unwrap(), Some("ab".to_string()));
  }

  #[test]
  fn wrong_types_are_malformed() {
    assert!(matches!(decode_u64("height", &json!("12")), Err(DaemonError::MalformedResponse(_))));
    assert!(matches!(decode_bytes("extra", &json!([1, 256])), Err(DaemonError::MalformedResponse(_))));
  }

  #[test]
  fn wide_number_combines_parts() {
    let number = WideNumber {
      low: Some(5),
      top64: Some(1),
      wide: Some((1u128 << 64) | 5),
    };
    assert_eq!(number.resolve("difficulty").unwrap(), Some((1u128 << 64) | 5));

    let hex = decode_wide_hex("wide_difficulty", &json!("0x10000000000000005")).unwrap();
    assert_eq!(hex, (1u128 << 64) | 5);

    let disagreeing = WideNumber { low: Some(4), top64: None, wide: Some(5) };
    assert!(disagreeing.resolve("difficulty").is_err());
  }
}
