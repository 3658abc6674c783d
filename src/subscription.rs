//! Subscriptions: the live connection between one publisher and one
//! subscriber.
//!
//! A subscriber receives its subscription exactly once, before any value or
//! completion, and uses it to `request` more values or to `cancel`.

use std::{
  fmt::{Debug, Formatter},
  sync::Arc,
};

use crate::{cancellable::Cancellable, demand::Demand};

mod outlet;
mod slot;

pub(crate) use outlet::{Delivery, Outlet};
pub(crate) use slot::SubscriptionSlot;

/// The subscriber's side of a connection.
///
/// `cancel` comes from the [`Cancellable`] supertrait. Both methods may be
/// called from any thread, including from inside the subscriber's own
/// `receive` call.
pub trait Subscription: Cancellable {
  /// Ask for `demand` more values. Requests accumulate; a zero request is a
  /// no-op.
  fn request(&self, demand: Demand);

  /// Where the connection is in its lifecycle.
  fn state(&self) -> SubscriptionState;
}

/// Lifecycle of a subscription.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SubscriptionState {
  /// Subscribed with no outstanding demand.
  Idle,
  /// Outstanding demand is greater than zero.
  Active,
  /// A completion was delivered.
  Completed,
  /// Cancelled by the subscriber or an operator.
  Cancelled,
}

impl SubscriptionState {
  pub fn is_terminal(&self) -> bool {
    matches!(self, SubscriptionState::Completed | SubscriptionState::Cancelled)
  }
}

/// A shared, type-erased subscription handle.
///
/// Cloning is cheap; every clone refers to the same connection.
#[derive(Clone)]
pub struct AnySubscription(Arc<dyn Subscription>);

impl AnySubscription {
  pub fn new(subscription: impl Subscription + 'static) -> Self { Self(Arc::new(subscription)) }

  /// Whether both handles point at the same connection.
  pub fn ptr_eq(&self, other: &AnySubscription) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
  }
}

impl<S: Subscription + 'static> From<Arc<S>> for AnySubscription {
  #[inline]
  fn from(subscription: Arc<S>) -> Self { Self(subscription) }
}

impl Cancellable for AnySubscription {
  #[inline]
  fn cancel(&self) { self.0.cancel() }
}

impl Subscription for AnySubscription {
  #[inline]
  fn request(&self, demand: Demand) { self.0.request(demand) }

  #[inline]
  fn state(&self) -> SubscriptionState { self.0.state() }
}

impl Debug for AnySubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AnySubscription").finish_non_exhaustive()
  }
}
