use std::sync::Arc;

use parking_lot::Mutex;

use super::{Completion, Subscriber};
use crate::{
  cancellable::Cancellable,
  demand::Demand,
  subscription::{AnySubscription, Subscription, SubscriptionState},
};

/// One notification seen by a [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<T, F> {
  Subscribed,
  Value(T),
  Completion(Completion<F>),
}

struct RecorderState<T, F> {
  events: Vec<Event<T, F>>,
  subscription: Option<AnySubscription>,
}

/// A subscriber that records everything it receives.
///
/// It requests `initial` demand when subscribed and answers every value with
/// `per_value` more. The paired [`RecorderHandle`] reads the recording and can
/// drive demand and cancellation by hand, which makes it the tool of choice
/// for checking how a publisher honours backpressure.
///
/// ```rust
/// use rxflow::prelude::*;
///
/// let (recorder, handle) = Recorder::new(Demand::max(2));
/// from_iter(1..=5).subscribe(recorder);
/// assert_eq!(handle.values(), vec![1, 2]);
///
/// handle.request(Demand::max(10));
/// assert_eq!(handle.values(), vec![1, 2, 3, 4, 5]);
/// assert_eq!(handle.completion(), Some(Completion::Finished));
/// ```
pub struct Recorder<T, F> {
  state: Arc<Mutex<RecorderState<T, F>>>,
  initial: Demand,
  per_value: Demand,
}

/// Read side of a [`Recorder`].
pub struct RecorderHandle<T, F> {
  state: Arc<Mutex<RecorderState<T, F>>>,
}

impl<T, F> Clone for RecorderHandle<T, F> {
  fn clone(&self) -> Self { Self { state: self.state.clone() } }
}

impl<T, F> Recorder<T, F> {
  /// Request `initial` once and nothing per value.
  pub fn new(initial: Demand) -> (Self, RecorderHandle<T, F>) {
    Self::with_demand(initial, Demand::none())
  }

  pub fn unlimited() -> (Self, RecorderHandle<T, F>) { Self::new(Demand::unlimited()) }

  pub fn with_demand(initial: Demand, per_value: Demand) -> (Self, RecorderHandle<T, F>) {
    let state = Arc::new(Mutex::new(RecorderState { events: vec![], subscription: None }));
    let handle = RecorderHandle { state: state.clone() };
    (Self { state, initial, per_value }, handle)
  }
}

impl<T, F> Subscriber<T, F> for Recorder<T, F>
where
  T: Send + 'static,
  F: Send + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    {
      let mut state = self.state.lock();
      state.events.push(Event::Subscribed);
      state.subscription = Some(subscription.clone());
    }
    subscription.request(self.initial);
  }

  fn receive(&mut self, input: T) -> Demand {
    self.state.lock().events.push(Event::Value(input));
    self.per_value
  }

  fn receive_completion(self, completion: Completion<F>) {
    self.state.lock().events.push(Event::Completion(completion));
  }
}

impl<T, F> RecorderHandle<T, F> {
  pub fn is_subscribed(&self) -> bool {
    matches!(self.state.lock().events.first(), Some(Event::Subscribed))
  }

  pub fn value_count(&self) -> usize {
    let state = self.state.lock();
    state.events.iter().filter(|e| matches!(e, Event::Value(_))).count()
  }

  /// Ask the recorded subscription for more values.
  pub fn request(&self, demand: Demand) {
    let subscription = self.state.lock().subscription.clone();
    if let Some(subscription) = subscription {
      subscription.request(demand);
    }
  }

  pub fn cancel(&self) {
    let subscription = self.state.lock().subscription.clone();
    if let Some(subscription) = subscription {
      subscription.cancel();
    }
  }

  /// Lifecycle of the recorded subscription, `None` before the handshake.
  pub fn state(&self) -> Option<SubscriptionState> {
    let subscription = self.state.lock().subscription.clone();
    subscription.map(|subscription| subscription.state())
  }
}

impl<T: Clone, F: Clone> RecorderHandle<T, F> {
  pub fn events(&self) -> Vec<Event<T, F>> { self.state.lock().events.clone() }

  pub fn values(&self) -> Vec<T> {
    let state = self.state.lock();
    state
      .events
      .iter()
      .filter_map(|e| match e {
        Event::Value(v) => Some(v.clone()),
        _ => None,
      })
      .collect()
  }

  pub fn completion(&self) -> Option<Completion<F>> {
    let state = self.state.lock();
    state.events.iter().find_map(|e| match e {
      Event::Completion(c) => Some(c.clone()),
      _ => None,
    })
  }
}
