// orderflow/src/model/money.rs

//! Monetary amounts in integer minor units.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

/// Basis points in one whole (100%).
const BPS_PER_WHOLE: i64 = 10_000;

/// An amount of money expressed in cents of the store currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
  pub const ZERO: Money = Money(0);

  pub const fn from_cents(cents: i64) -> Self {
    Money(cents)
  }

  /// Whole currency units, e.g. `Money::from_major(20)` is 20.00.
  pub const fn from_major(units: i64) -> Self {
    Money(units * 100)
  }

  pub const fn cents(self) -> i64 {
    self.0
  }

  pub fn is_negative(self) -> bool {
    self.0 < 0
  }

  pub fn checked_add(self, other: Money) -> Option<Money> {
    self.0.checked_add(other.0).map(Money)
  }

  pub fn checked_mul(self, quantity: u32) -> Option<Money> {
    self.0.checked_mul(i64::from(quantity)).map(Money)
  }

  /// The given fraction of this amount, in basis points, rounded half up to the cent.
  ///
  /// `Money::from_major(270).portion_bps(500)` is 13.50.
  pub fn portion_bps(self, bps: i64) -> Money {
    let scaled = i128::from(self.0) * i128::from(bps);
    let whole = i128::from(BPS_PER_WHOLE);
    let rounded = if scaled >= 0 {
      (scaled + whole / 2) / whole
    } else {
      (scaled - whole / 2) / whole
    };
    Money(rounded as i64)
  }
}

impl Add for Money {
  type Output = Money;

  fn add(self, rhs: Money) -> Money {
    Money(self.0 + rhs.0)
  }
}

impl Sub for Money {
  type Output = Money;

  fn sub(self, rhs: Money) -> Money {
    Money(self.0 - rhs.0)
  }
}

impl Sum for Money {
  fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
    iter.fold(Money::ZERO, |acc, m| acc + m)
  }
}

impl fmt::Display for Money {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let sign = if self.0 < 0 { "-" } else { "" };
    let abs = self.0.unsigned_abs();
    write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn portion_rounds_half_up() {
    assert_eq!(Money::from_major(270).portion_bps(500), Money::from_cents(1350));
    // 0.05 * 0.10 = 0.005 -> 0.01
    assert_eq!(Money::from_cents(10).portion_bps(500), Money::from_cents(1));
    assert_eq!(Money::from_cents(9).portion_bps(500), Money::ZERO);
  }

  #[test]
  fn display_uses_two_decimals() {
    assert_eq!(Money::from_cents(25650).to_string(), "256.50");
    assert_eq!(Money::from_cents(5).to_string(), "0.05");
    assert_eq!(Money::from_cents(-120).to_string(), "-1.20");
  }

  #[test]
  fn checked_mul_detects_overflow() {
    assert_eq!(Money::from_major(100).checked_mul(2), Some(Money::from_major(200)));
    assert_eq!(Money::from_cents(i64::MAX).checked_mul(2), None);
  }
}
