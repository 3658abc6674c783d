use super::{Completion, Subscriber};
use crate::{
  cancellable::AnyCancellable,
  demand::Demand,
  subscription::{AnySubscription, Subscription, SubscriptionSlot},
};

/// A closure-driven subscriber that requests unlimited demand.
///
/// Created by [`Publisher::sink`] and [`Publisher::sink_completion`]; the
/// returned [`AnyCancellable`] keeps the subscription alive until it is
/// cancelled or dropped.
///
/// [`Publisher::sink`]: crate::publisher::Publisher::sink
/// [`Publisher::sink_completion`]: crate::publisher::Publisher::sink_completion
pub struct Sink<V, C> {
  slot: SubscriptionSlot,
  receive_value: V,
  receive_completion: C,
}

impl<V, C> Sink<V, C> {
  pub fn new(receive_completion: C, receive_value: V) -> (Self, AnyCancellable) {
    let slot = SubscriptionSlot::new();
    let handle = AnyCancellable::from_cancellable(slot.clone());
    (Self { slot, receive_value, receive_completion }, handle)
  }
}

impl<T, F, V, C> Subscriber<T, F> for Sink<V, C>
where
  V: FnMut(T) + Send + 'static,
  C: FnOnce(Completion<F>) + Send + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    if self.slot.fill(subscription.clone()) {
      subscription.request(Demand::unlimited());
    }
  }

  fn receive(&mut self, input: T) -> Demand {
    (self.receive_value)(input);
    Demand::none()
  }

  fn receive_completion(self, completion: Completion<F>) {
    self.slot.release();
    (self.receive_completion)(completion)
  }
}
