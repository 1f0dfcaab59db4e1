/**
* filename : reconcile
* author : HAMA
* date: 2025. 4. 7.
* description: Field-level merge primitive. A value is accepted when the slot
*              is empty or already holds an equal value; anything else is a
*              DataConflict.
**/
use crate::types::{DaemonError, Result};
use std::fmt::Debug;

/// Unify an existing observation of `field` with a newly observed one.
pub fn reconcile<T>(field: &'static str, existing: Option<T>, observed: Option<T>) -> Result<Option<T>>
where
  T: PartialEq + Debug,
{
  match (existing, observed) {
    (None, observed) => Ok(observed),
    (existing, None) => Ok(existing),
    (Some(existing), Some(observed)) => {
      if existing == observed {
        Ok(Some(existing))
      } else {
        Err(conflict(field, &existing, &observed))
      }
    }
  }
}

/// Reconcile `observed` into `slot` in place.
pub fn assign<T>(field: &'static str, slot: &mut Option<T>, observed: T) -> Result<()>
where
  T: PartialEq + Debug,
{
  let existing = slot.take();
  *slot = reconcile(field, existing, Some(observed))?;
  Ok(())
}

/// Like [`reconcile`], but a flag may move from `!settled` to `settled`.
/// The reverse move is still a conflict.
pub fn reconcile_toward(
  field: &'static str,
  existing: Option<bool>,
  observed: Option<bool>,
  settled: bool,
) -> Result<Option<bool>> {
  match (existing, observed) {
    (Some(old), Some(new)) if old != settled && new == settled => Ok(Some(settled)),
    (existing, observed) => reconcile(field, existing, observed),
  }
}

/// Like [`reconcile`], but the value may grow. A smaller observation conflicts.
pub fn reconcile_non_decreasing<T>(field: &'static str, existing: Option<T>, observed: Option<T>) -> Result<Option<T>>
where
  T: PartialOrd + Debug,
{
  match (existing, observed) {
    (None, observed) => Ok(observed),
    (existing, None) => Ok(existing),
    (Some(old), Some(new)) => {
      if new >= old {
        Ok(Some(new))
      } else {
        Err(conflict(field, &old, &new))
      }
    }
  }
}

fn conflict<T: Debug>(field: &'static str, existing: &T, observed: &T) -> DaemonError {
  DaemonError::DataConflict {
    field,
    existing: format!("{:?}", existing),
    observed: format!("{:?}", observed),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn absent_existing_takes_observed() {
    assert_eq!(reconcile("height", None, Some(7u64)).unwrap(), Some(7));
    assert_eq!(reconcile::<u64>("height", None, None).unwrap(), None);
  }

  #[test]
  fn absent_observed_keeps_existing() {
    assert_eq!(reconcile("hash", Some("ab".to_string()), None).unwrap(), Some("ab".to_string()));
  }

  #[test]
  fn equal_values_unify() {
    assert_eq!(reconcile("fee", Some(1000u64), Some(1000u64)).unwrap(), Some(1000));
  }

  #[test]
  fn unequal_values_conflict_and_name_the_field() {
    let err = reconcile("height", Some(5u64), Some(6u64)).unwrap_err();
    match err {
      DaemonError::DataConflict { field, existing, observed } => {
        assert_eq!(field, "height");
        assert_eq!(existing, "5");
        assert_eq!(observed, "6");
      }
      other => panic!("unexpected error {:?}", other),
    }
    // order does not matter for a conflict
    assert!(reconcile("height", Some(6u64), Some(5u64)).is_err());
  }

  #[test]
  fn assign_fills_and_checks_slot() {
    let mut slot = None;
    assign("version", &mut slot, 2u32).unwrap();
    assign("version", &mut slot, 2u32).unwrap();
    assert_eq!(slot, Some(2));
    assert!(assign("version", &mut slot, 1u32).is_err());
  }

  #[test]
  fn toward_allows_only_the_settling_move() {
    assert_eq!(reconcile_toward("is_confirmed", Some(false), Some(true), true).unwrap(), Some(true));
    assert!(reconcile_toward("is_confirmed", Some(true), Some(false), true).is_err());
    assert_eq!(reconcile_toward("in_tx_pool", Some(true), Some(false), false).unwrap(), Some(false));
    assert!(reconcile_toward("in_tx_pool", Some(false), Some(true), false).is_err());
  }

  #[test]
  fn non_decreasing_rejects_shrinking() {
    assert_eq!(reconcile_non_decreasing("num_confirmations", Some(0u64), Some(3)).unwrap(), Some(3));
    assert!(reconcile_non_decreasing("num_confirmations", Some(3u64), Some(1)).is_err());
  }
}
