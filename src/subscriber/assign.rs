use std::sync::Arc;

use super::{Completion, Never, Subscriber};
use crate::{
  cancellable::AnyCancellable,
  demand::Demand,
  subscription::{AnySubscription, Subscription, SubscriptionSlot},
};

/// Writes every received value into a retained root object through an
/// explicit setter.
///
/// The root is kept alive for as long as the subscription is.
///
/// ```rust
/// use std::sync::Arc;
///
/// use parking_lot::Mutex;
/// use rxflow::prelude::*;
///
/// #[derive(Default)]
/// struct Label {
///   text: Mutex<String>,
/// }
///
/// let label = Arc::new(Label::default());
/// let _c = just(42).map(|v| v.to_string()).assign(label.clone(), |l: &Label, v| {
///   *l.text.lock() = v
/// });
/// assert_eq!(*label.text.lock(), "42");
/// ```
pub struct Assign<R, A> {
  slot: SubscriptionSlot,
  root: Arc<R>,
  setter: A,
}

impl<R, A> Assign<R, A> {
  pub fn new(root: Arc<R>, setter: A) -> (Self, AnyCancellable) {
    let slot = SubscriptionSlot::new();
    let handle = AnyCancellable::from_cancellable(slot.clone());
    (Self { slot, root, setter }, handle)
  }
}

impl<T, R, A> Subscriber<T, Never> for Assign<R, A>
where
  R: Send + Sync + 'static,
  A: FnMut(&R, T) + Send + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    if self.slot.fill(subscription.clone()) {
      subscription.request(Demand::unlimited());
    }
  }

  fn receive(&mut self, input: T) -> Demand {
    (self.setter)(&self.root, input);
    Demand::none()
  }

  fn receive_completion(self, _completion: Completion<Never>) { self.slot.release(); }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
  };

  use crate::prelude::*;

  #[test]
  fn assign_follows_a_current_value_subject() {
    let target = Arc::new(AtomicI32::new(0));
    let subject = CurrentValueSubject::<i32, Never>::new(1);

    let handle = subject
      .clone()
      .assign(target.clone(), |t: &AtomicI32, v| t.store(v, Ordering::SeqCst));
    assert_eq!(target.load(Ordering::SeqCst), 1);

    subject.send(5);
    assert_eq!(target.load(Ordering::SeqCst), 5);

    handle.cancel();
    subject.send(9);
    assert_eq!(target.load(Ordering::SeqCst), 5);
  }
}
