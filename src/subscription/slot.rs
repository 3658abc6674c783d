use std::sync::Arc;

use parking_lot::Mutex;

use super::AnySubscription;
use crate::cancellable::Cancellable;

#[derive(Default)]
enum SlotState {
  #[default]
  Pending,
  Ready(AnySubscription),
  Closed,
}

/// Holds the subscription a subscriber is handed, so the subscriber and its
/// cancellation handle can share it.
///
/// A slot closed before the subscription arrives cancels the subscription on
/// arrival.
#[derive(Clone, Default)]
pub(crate) struct SubscriptionSlot(Arc<Mutex<SlotState>>);

impl SubscriptionSlot {
  pub(crate) fn new() -> Self { Self::default() }

  /// Store the subscription. Returns `false` if the slot was already closed,
  /// in which case the subscription has been cancelled.
  pub(crate) fn fill(&self, subscription: AnySubscription) -> bool {
    let mut state = self.0.lock();
    match &*state {
      SlotState::Pending => {
        *state = SlotState::Ready(subscription);
        true
      }
      _ => {
        drop(state);
        subscription.cancel();
        false
      }
    }
  }

  /// Close the slot without cancelling, after the upstream completed.
  pub(crate) fn release(&self) { *self.0.lock() = SlotState::Closed; }
}

impl Cancellable for SubscriptionSlot {
  fn cancel(&self) {
    let prev = std::mem::replace(&mut *self.0.lock(), SlotState::Closed);
    if let SlotState::Ready(subscription) = prev {
      subscription.cancel();
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;
  use crate::{
    demand::Demand,
    subscription::{Subscription, SubscriptionState},
  };

  #[derive(Default)]
  struct Counting {
    cancelled: AtomicUsize,
  }

  impl Cancellable for Counting {
    fn cancel(&self) { self.cancelled.fetch_add(1, Ordering::SeqCst); }
  }

  impl Subscription for Counting {
    fn request(&self, _demand: Demand) {}

    fn state(&self) -> SubscriptionState { SubscriptionState::Idle }
  }

  #[test]
  fn cancel_before_fill_cancels_on_arrival() {
    let slot = SubscriptionSlot::new();
    slot.cancel();
    let counting = Arc::new(Counting::default());
    assert!(!slot.fill(AnySubscription::from(counting.clone())));
    assert_eq!(counting.cancelled.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn cancel_reaches_the_subscription_once() {
    let slot = SubscriptionSlot::new();
    let counting = Arc::new(Counting::default());
    assert!(slot.fill(AnySubscription::from(counting.clone())));
    slot.cancel();
    slot.cancel();
    assert!(!slot.fill(AnySubscription::from(counting.clone())));
    assert_eq!(counting.cancelled.load(Ordering::SeqCst), 2);
  }

  #[test]
  fn release_does_not_cancel() {
    let slot = SubscriptionSlot::new();
    let counting = Arc::new(Counting::default());
    slot.fill(AnySubscription::from(counting.clone()));
    slot.release();
    slot.cancel();
    assert_eq!(counting.cancelled.load(Ordering::SeqCst), 0);
  }
}
