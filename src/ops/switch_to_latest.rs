//! SwitchToLatest operator
//!
//! Subscribes to a publisher of publishers and forwards values from only the
//! most recently received inner publisher. When a new inner publisher
//! arrives, the previous inner subscription is cancelled.
//!
//! Behavior summary:
//! - Only the latest inner publisher's values are forwarded downstream.
//! - The operator finishes only after the outer publisher finishes and the
//!   current inner publisher finishes.
//! - A failure of the outer publisher or of the current inner publisher fails
//!   the operator immediately and cancels the other side.
//! - Downstream demand that the previous inner publisher did not use carries
//!   over to the next one.
//! - An inner publisher that sends more than it was asked for breaks the
//!   demand contract. The operator is terminated: both upstreams are
//!   cancelled and the downstream subscription ends up cancelled.
//!
//! ```rust
//! use rxflow::prelude::*;
//!
//! let query = PassthroughSubject::<&str, Never>::new();
//! let (recorder, handle) = Recorder::unlimited();
//! query
//!   .clone()
//!   .flat_map_latest(|q| from_iter(vec![format!("{q}-1"), format!("{q}-2")]))
//!   .subscribe(recorder);
//!
//! query.send("rust");
//! assert_eq!(handle.values(), vec!["rust-1", "rust-2"]);
//! ```

use std::{marker::PhantomData, sync::Arc};

use parking_lot::Mutex;
use tracing::warn;

use crate::{
  cancellable::Cancellable,
  demand::Demand,
  error::ContractViolation,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::{AnySubscription, Outlet, Subscription, SubscriptionState},
};

/// Publisher returned by [`Publisher::switch_to_latest`].
#[derive(Clone)]
pub struct SwitchToLatest<P> {
  upstream: P,
}

impl<P> SwitchToLatest<P> {
  pub(crate) fn new(upstream: P) -> Self { Self { upstream } }
}

impl<P> Publisher for SwitchToLatest<P>
where
  P: Publisher,
  P::Output: Publisher<Failure = P::Failure>,
{
  type Output = <P::Output as Publisher>::Output;
  type Failure = P::Failure;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Self::Output, Self::Failure>,
  {
    let switch = Arc::new(SwitchInner { state: Mutex::new(SwitchState::default()), outlet: Outlet::new(subscriber) });
    switch
      .outlet
      .start(AnySubscription::from(switch.clone()));
    self
      .upstream
      .subscribe(OuterSubscriber { switch, _p: PhantomData });
  }
}

#[derive(Default)]
struct SwitchState {
  outer: Option<AnySubscription>,
  inner: Option<AnySubscription>,
  /// Demand requested from the current inner publisher and not yet used.
  /// Kept equal to the downstream demand that is still open.
  inner_demand: Demand,
  /// Bumped for every inner publisher; stale inner subscribers compare
  /// against it and go quiet.
  generation: u64,
  inner_live: bool,
  outer_finished: bool,
  terminated: bool,
}

struct SwitchInner<S, T, F> {
  state: Mutex<SwitchState>,
  outlet: Outlet<S, T, F>,
}

impl<S, T, F> SwitchInner<S, T, F>
where
  S: Subscriber<T, F>,
  T: Send + 'static,
  F: Send + 'static,
{
  fn fail(&self, err: F) {
    let (outer, inner) = {
      let mut state = self.state.lock();
      if state.terminated {
        return;
      }
      state.terminated = true;
      self.outlet.complete(Completion::Failed(err));
      (state.outer.take(), state.inner.take())
    };
    for subscription in [outer, inner].into_iter().flatten() {
      subscription.cancel();
    }
    self.outlet.flush();
  }

  /// Finish downstream if both the outer and the current inner publisher are
  /// done. Must be called with the state lock held.
  fn finish_if_done(&self, state: &mut SwitchState) {
    if state.outer_finished && !state.inner_live && !state.terminated {
      state.terminated = true;
      self.outlet.complete(Completion::Finished);
    }
  }

  /// Ask the current inner publisher for whatever downstream demand it has
  /// not been asked for yet.
  ///
  /// Downstream demand grows outside the state lock when a value is answered
  /// with more demand, so every path that delivers calls this afterwards.
  fn top_up(&self) {
    let (inner, demand) = {
      let mut state = self.state.lock();
      if state.terminated {
        return;
      }
      let Some(inner) = state.inner.clone() else {
        return;
      };
      let demand = self.outlet.demand().shortfall(state.inner_demand);
      if demand.is_none() {
        return;
      }
      state.inner_demand += demand;
      (inner, demand)
    };
    inner.request(demand);
  }
}

impl<S, T, F> Cancellable for SwitchInner<S, T, F>
where
  S: Subscriber<T, F>,
  T: Send + 'static,
  F: Send + 'static,
{
  fn cancel(&self) {
    if !self.outlet.cancel() {
      return;
    }
    let (outer, inner) = {
      let mut state = self.state.lock();
      state.terminated = true;
      (state.outer.take(), state.inner.take())
    };
    for subscription in [outer, inner].into_iter().flatten() {
      subscription.cancel();
    }
  }
}

impl<S, T, F> Subscription for SwitchInner<S, T, F>
where
  S: Subscriber<T, F>,
  T: Send + 'static,
  F: Send + 'static,
{
  fn request(&self, demand: Demand) {
    if demand.is_none() {
      return;
    }
    {
      let state = self.state.lock();
      if state.terminated {
        return;
      }
      self.outlet.grant(demand);
    }
    self.top_up();
  }

  fn state(&self) -> SubscriptionState { self.outlet.state() }
}

// ==================== Outer Subscriber ====================

struct OuterSubscriber<S, T, F, Inner> {
  switch: Arc<SwitchInner<S, T, F>>,
  _p: PhantomData<fn() -> Inner>,
}

impl<S, T, F, Inner> Subscriber<Inner, F> for OuterSubscriber<S, T, F, Inner>
where
  S: Subscriber<T, F>,
  T: Send + 'static,
  F: Send + 'static,
  Inner: Publisher<Output = T, Failure = F> + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    {
      let mut state = self.switch.state.lock();
      if !state.terminated {
        state.outer = Some(subscription.clone());
        drop(state);
        subscription.request(Demand::unlimited());
        return;
      }
    }
    subscription.cancel();
  }

  fn receive(&mut self, input: Inner) -> Demand {
    let (generation, previous) = {
      let mut state = self.switch.state.lock();
      if state.terminated {
        return Demand::none();
      }
      state.generation += 1;
      state.inner_live = true;
      state.inner_demand = Demand::none();
      (state.generation, state.inner.take())
    };
    if let Some(previous) = previous {
      previous.cancel();
    }
    input.subscribe(InnerSubscriber { switch: self.switch.clone(), generation });
    Demand::none()
  }

  fn receive_completion(self, completion: Completion<F>) {
    match completion {
      Completion::Finished => {
        {
          let mut state = self.switch.state.lock();
          state.outer_finished = true;
          state.outer = None;
          self.switch.finish_if_done(&mut state);
        }
        self.switch.outlet.flush();
      }
      Completion::Failed(err) => self.switch.fail(err),
    }
  }
}

// ==================== Inner Subscriber ====================

struct InnerSubscriber<S, T, F> {
  switch: Arc<SwitchInner<S, T, F>>,
  generation: u64,
}

impl<S, T, F> InnerSubscriber<S, T, F> {
  fn is_current(&self, state: &SwitchState) -> bool {
    !state.terminated && state.generation == self.generation
  }
}

impl<S, T, F> Subscriber<T, F> for InnerSubscriber<S, T, F>
where
  S: Subscriber<T, F>,
  T: Send + 'static,
  F: Send + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    let demand = {
      let mut state = self.switch.state.lock();
      if self.is_current(&state) {
        let demand = self.switch.outlet.demand();
        state.inner = Some(subscription.clone());
        state.inner_demand = demand;
        Some(demand)
      } else {
        None
      }
    };
    match demand {
      Some(demand) => subscription.request(demand),
      None => subscription.cancel(),
    }
  }

  fn receive(&mut self, input: T) -> Demand {
    let accepted = {
      let mut state = self.switch.state.lock();
      if !self.is_current(&state) {
        return Demand::none();
      }
      if state.inner_demand.consume() {
        self.switch.outlet.enqueue(input)
      } else {
        Err(ContractViolation::EmissionWithoutDemand)
      }
    };
    if let Err(violation) = accepted {
      warn!(violation = violation.as_label(), "switch_to_latest terminated");
      self.switch.cancel();
      return Demand::none();
    }
    self.switch.outlet.flush();
    self.switch.top_up();
    Demand::none()
  }

  fn receive_completion(self, completion: Completion<F>) {
    match completion {
      Completion::Finished => {
        {
          let mut state = self.switch.state.lock();
          if !self.is_current(&state) {
            return;
          }
          state.inner_live = false;
          state.inner = None;
          state.inner_demand = Demand::none();
          self.switch.finish_if_done(&mut state);
        }
        self.switch.outlet.flush();
      }
      Completion::Failed(err) => {
        if self.is_current(&self.switch.state.lock()) {
          self.switch.fail(err);
        }
      }
    }
  }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  type Inner = PassthroughSubject<i32, &'static str>;

  #[test]
  fn only_the_latest_inner_reaches_downstream() {
    let outer = PassthroughSubject::<Inner, &'static str>::new();
    let x = Inner::new();
    let y = Inner::new();
    let (recorder, handle) = Recorder::unlimited();
    outer.clone().switch_to_latest().subscribe(recorder);

    outer.send(x.clone());
    assert_eq!(x.subscriber_count(), 1);
    outer.send(y.clone());
    assert_eq!(x.subscriber_count(), 0);

    x.send(1);
    y.send(2);
    x.send(3);
    y.send(4);
    assert_eq!(handle.values(), vec![2, 4]);
  }

  #[test]
  fn finishes_after_outer_and_current_inner() {
    let outer = PassthroughSubject::<Inner, &'static str>::new();
    let inner = Inner::new();
    let (recorder, handle) = Recorder::unlimited();
    outer.clone().switch_to_latest().subscribe(recorder);

    outer.send(inner.clone());
    outer.send_completion(Completion::Finished);
    assert_eq!(handle.completion(), None);

    inner.send(1);
    inner.send_completion(Completion::Finished);
    assert_eq!(handle.values(), vec![1]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }

  #[test]
  fn finishes_at_once_without_an_inner() {
    let (recorder, handle) = Recorder::<i32, Never>::unlimited();
    empty::<Sequence<std::vec::IntoIter<i32>, Never>>()
      .switch_to_latest()
      .subscribe(recorder);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }

  #[test]
  fn inner_failure_cancels_the_outer() {
    let outer = PassthroughSubject::<Inner, &'static str>::new();
    let inner = Inner::new();
    let (recorder, handle) = Recorder::unlimited();
    outer.clone().switch_to_latest().subscribe(recorder);

    outer.send(inner.clone());
    inner.send_completion(Completion::Failed("inner"));

    assert_eq!(handle.completion(), Some(Completion::Failed("inner")));
    assert_eq!(outer.subscriber_count(), 0);
  }

  #[test]
  fn outer_failure_cancels_the_inner() {
    let outer = PassthroughSubject::<Inner, &'static str>::new();
    let inner = Inner::new();
    let (recorder, handle) = Recorder::unlimited();
    outer.clone().switch_to_latest().subscribe(recorder);

    outer.send(inner.clone());
    outer.send_completion(Completion::Failed("outer"));

    assert_eq!(handle.completion(), Some(Completion::Failed("outer")));
    assert_eq!(inner.subscriber_count(), 0);
  }

  #[test]
  fn unused_demand_carries_over_to_the_next_inner() {
    let (recorder, handle) = Recorder::<i32, Never>::new(Demand::max(2));
    from_iter(vec![1, 2])
      .flat_map_latest(|v| from_iter(v * 10..v * 10 + 3))
      .subscribe(recorder);
    assert_eq!(handle.values(), vec![10, 11]);
    assert_eq!(handle.completion(), None);

    handle.request(Demand::max(2));
    assert_eq!(handle.values(), vec![10, 11, 20, 21]);

    handle.request(Demand::max(5));
    assert_eq!(handle.values(), vec![10, 11, 20, 21, 22]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }
}
