//! Demand: the backpressure signal a subscriber sends upstream.
//!
//! A `Demand` is either a finite number of values or `Unlimited`. Demand only
//! ever accumulates: adding two demands saturates at `usize::MAX`, and adding
//! anything to `Unlimited` stays `Unlimited`.

use std::{
  fmt::{Display, Formatter},
  ops::{Add, AddAssign},
};

use crate::error::ContractViolation;

/// The number of values a subscriber is willing to receive next.
///
/// Variant order matters for the derived ordering: every finite demand is
/// smaller than `Unlimited`.
///
/// ```rust
/// use rxflow::prelude::*;
///
/// assert_eq!(Demand::max(2) + Demand::max(3), Demand::max(5));
/// assert_eq!(Demand::max(usize::MAX) + Demand::max(1), Demand::max(usize::MAX));
/// assert_eq!(Demand::max(7) + Demand::unlimited(), Demand::unlimited());
/// assert!(Demand::max(usize::MAX) < Demand::unlimited());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Demand {
  /// At most this many further values.
  Max(usize),
  /// Any number of values.
  Unlimited,
}

impl Demand {
  /// No demand at all.
  #[inline]
  pub const fn none() -> Self { Demand::Max(0) }

  #[inline]
  pub const fn unlimited() -> Self { Demand::Unlimited }

  #[inline]
  pub const fn max(count: usize) -> Self { Demand::Max(count) }

  #[inline]
  pub fn is_none(&self) -> bool { matches!(self, Demand::Max(0)) }

  #[inline]
  pub fn is_unlimited(&self) -> bool { matches!(self, Demand::Unlimited) }

  /// The finite bound, or `None` for unlimited demand.
  #[inline]
  pub fn max_value(&self) -> Option<usize> {
    match self {
      Demand::Max(count) => Some(*count),
      Demand::Unlimited => None,
    }
  }

  /// Whether this demand allows `count` values in total.
  #[inline]
  pub fn covers(&self, count: usize) -> bool {
    match self {
      Demand::Max(max) => count <= *max,
      Demand::Unlimited => true,
    }
  }

  /// The part of `self` that `have` does not already cover.
  ///
  /// `Unlimited` is only covered by `Unlimited`.
  pub(crate) fn shortfall(self, have: Demand) -> Demand {
    match (self, have) {
      (Demand::Max(want), Demand::Max(have)) => Demand::Max(want.saturating_sub(have)),
      (Demand::Unlimited, Demand::Max(_)) => Demand::Unlimited,
      (_, Demand::Unlimited) => Demand::none(),
    }
  }

  /// Consume one unit of demand. Returns `false` when there was none left.
  #[inline]
  pub(crate) fn consume(&mut self) -> bool {
    match self {
      Demand::Max(0) => false,
      Demand::Max(count) => {
        *count -= 1;
        true
      }
      Demand::Unlimited => true,
    }
  }
}

impl Default for Demand {
  #[inline]
  fn default() -> Self { Demand::none() }
}

impl Add for Demand {
  type Output = Demand;

  fn add(self, rhs: Demand) -> Demand {
    match (self, rhs) {
      (Demand::Max(a), Demand::Max(b)) => Demand::Max(a.saturating_add(b)),
      _ => Demand::Unlimited,
    }
  }
}

impl Add<usize> for Demand {
  type Output = Demand;

  #[inline]
  fn add(self, rhs: usize) -> Demand { self + Demand::Max(rhs) }
}

impl AddAssign for Demand {
  #[inline]
  fn add_assign(&mut self, rhs: Demand) { *self = *self + rhs; }
}

impl AddAssign<usize> for Demand {
  #[inline]
  fn add_assign(&mut self, rhs: usize) { *self = *self + rhs; }
}

impl From<usize> for Demand {
  #[inline]
  fn from(count: usize) -> Self { Demand::Max(count) }
}

impl TryFrom<i64> for Demand {
  type Error = ContractViolation;

  fn try_from(count: i64) -> Result<Self, Self::Error> {
    usize::try_from(count)
      .map(Demand::Max)
      .map_err(|_| ContractViolation::NegativeDemand(count))
  }
}

impl Display for Demand {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Demand::Max(count) => write!(f, "max({count})"),
      Demand::Unlimited => f.write_str("unlimited"),
    }
  }
}
