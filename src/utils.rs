/**
* filename : utils
* author : HAMA
* date: 2025. 4. 6.
* description: Unit conversions for display.
**/
use rust_decimal::Decimal;

/// Piconero per XMR.
const ATOMIC_UNITS_PER_XMR: u64 = 1_000_000_000_000;

/// Convert atomic units (piconero) to XMR.
pub fn atomic_to_xmr(atomic: u64) -> Decimal {
  Decimal::from(atomic) / Decimal::from(ATOMIC_UNITS_PER_XMR)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::str::FromStr;

  #[test]
  fn converts_piconero() {
    assert_eq!(atomic_to_xmr(600_000_000_000), Decimal::from_str("0.6").unwrap());
    assert_eq!(atomic_to_xmr(0), Decimal::ZERO);
  }
}
