//! Zip operator implementation
//!
//! Zip combines values from two publishers pairwise, emitting a tuple when
//! both sides have a value waiting.
//!
//! An upstream that sends more values than zip requested breaks the demand
//! contract. That terminates the zip: both upstreams are cancelled and the
//! downstream subscription ends up cancelled, with no further signal.

use std::{collections::VecDeque, sync::Arc};

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

// ==================== Zip Operator ====================

/// Publisher returned by [`Publisher::zip`].
///
/// Downstream demand is requested from both upstreams, so neither buffer
/// grows beyond what downstream asked for. Zip finishes as soon as one side
/// has finished and has nothing left to pair; it fails as soon as either side
/// fails. In both cases the other upstream is cancelled.
#[derive(Clone)]
pub struct Zip<A, B> {
  a: A,
  b: B,
}

impl<A, B> Zip<A, B> {
  pub(crate) fn new(a: A, b: B) -> Self { Self { a, b } }
}

impl<A, B> Publisher for Zip<A, B>
where
  A: Publisher,
  B: Publisher<Failure = A::Failure>,
{
  type Output = (A::Output, B::Output);
  type Failure = A::Failure;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Self::Output, Self::Failure>,
  {
    let inner = Arc::new(ZipInner { state: Mutex::new(ZipState::default()), outlet: Outlet::new(subscriber) });
    inner
      .outlet
      .start(AnySubscription::from(inner.clone()));
    self.a.subscribe(ZipLeft(inner.clone()));
    self.b.subscribe(ZipRight(inner));
  }
}

// ==================== Shared State ====================

struct ZipState<A, B> {
  buffer_a: VecDeque<A>,
  buffer_b: VecDeque<B>,
  finished_a: bool,
  finished_b: bool,
  upstream_a: Option<AnySubscription>,
  upstream_b: Option<AnySubscription>,
  /// Demand forwarded to each upstream so far.
  granted: Demand,
  received_a: usize,
  received_b: usize,
  done: bool,
}

impl<A, B> Default for ZipState<A, B> {
  fn default() -> Self {
    Self {
      buffer_a: VecDeque::new(),
      buffer_b: VecDeque::new(),
      finished_a: false,
      finished_b: false,
      upstream_a: None,
      upstream_b: None,
      granted: Demand::none(),
      received_a: 0,
      received_b: 0,
      done: false,
    }
  }
}

impl<A, B> ZipState<A, B> {
  /// One side finished and has nothing left to pair.
  fn is_exhausted(&self) -> bool {
    (self.finished_a && self.buffer_a.is_empty()) || (self.finished_b && self.buffer_b.is_empty())
  }

  fn upstreams(&self) -> [Option<AnySubscription>; 2] {
    [self.upstream_a.clone(), self.upstream_b.clone()]
  }

  /// Stop for good and hand back the upstreams to cancel.
  fn shut(&mut self) -> [Option<AnySubscription>; 2] {
    self.done = true;
    self.buffer_a.clear();
    self.buffer_b.clear();
    [self.upstream_a.take(), self.upstream_b.take()]
  }
}

#[derive(Clone, Copy, Debug)]
enum Side {
  A,
  B,
}

struct ZipInner<S, A, B, F> {
  state: Mutex<ZipState<A, B>>,
  outlet: Outlet<S, (A, B), F>,
}

impl<S, A, B, F> ZipInner<S, A, B, F>
where
  S: Subscriber<(A, B), F>,
  A: Send + 'static,
  B: Send + 'static,
  F: Send + 'static,
{
  fn receive_upstream(&self, side: Side, subscription: AnySubscription) {
    let granted = {
      let mut state = self.state.lock();
      if state.done {
        None
      } else {
        let slot = match side {
          Side::A => &mut state.upstream_a,
          Side::B => &mut state.upstream_b,
        };
        *slot = Some(subscription.clone());
        Some(state.granted)
      }
    };
    match granted {
      None => subscription.cancel(),
      Some(granted) => subscription.request(granted),
    }
  }

  /// Buffer a value from `side`, unless it exceeds what that side was asked
  /// for.
  fn push(&self, side: Side, store: impl FnOnce(&mut ZipState<A, B>)) {
    let within_demand = {
      let mut state = self.state.lock();
      if state.done {
        return;
      }
      let received = match side {
        Side::A => &mut state.received_a,
        Side::B => &mut state.received_b,
      };
      *received += 1;
      let received = *received;
      let within_demand = state.granted.covers(received);
      if within_demand {
        store(&mut state);
      }
      within_demand
    };
    if within_demand {
      self.settle();
    } else {
      let violation = ContractViolation::EmissionWithoutDemand;
      warn!(violation = violation.as_label(), ?side, "zip terminated");
      self.cancel();
    }
  }

  fn finish(&self, side: Side, completion: Completion<F>) {
    match completion {
      Completion::Finished => {
        {
          let mut state = self.state.lock();
          if state.done {
            return;
          }
          match side {
            Side::A => state.finished_a = true,
            Side::B => state.finished_b = true,
          }
        }
        self.settle();
      }
      Completion::Failed(err) => {
        let upstreams = {
          let mut state = self.state.lock();
          if state.done {
            return;
          }
          self.outlet.complete(Completion::Failed(err));
          state.shut()
        };
        cancel_all(upstreams);
        self.outlet.flush();
      }
    }
  }

  /// Emit every pair downstream has room for, complete when no further pair
  /// is possible, and pass any demand downstream returns on to both sides.
  fn settle(&self) {
    loop {
      let upstreams = {
        let mut state = self.state.lock();
        while !state.buffer_a.is_empty()
          && !state.buffer_b.is_empty()
          && !self.outlet.demand().is_none()
        {
          let (Some(a), Some(b)) = (state.buffer_a.pop_front(), state.buffer_b.pop_front()) else {
            break;
          };
          if let Err(violation) = self.outlet.enqueue((a, b)) {
            warn!(violation = violation.as_label(), "zip terminated");
            drop(state);
            self.cancel();
            return;
          }
        }
        if !state.done && state.is_exhausted() {
          self.outlet.complete(Completion::Finished);
          state.shut()
        } else {
          [None, None]
        }
      };
      cancel_all(upstreams);
      match self.outlet.flush() {
        Some(extra) if !extra.is_none() => self.forward(extra),
        _ => break,
      }
    }
  }

  fn forward(&self, demand: Demand) {
    let upstreams = {
      let mut state = self.state.lock();
      if state.done {
        return;
      }
      state.granted += demand;
      state.upstreams()
    };
    for subscription in upstreams.into_iter().flatten() {
      subscription.request(demand);
    }
  }
}

fn cancel_all(subscriptions: [Option<AnySubscription>; 2]) {
  for subscription in subscriptions.into_iter().flatten() {
    subscription.cancel();
  }
}

impl<S, A, B, F> Cancellable for ZipInner<S, A, B, F>
where
  S: Subscriber<(A, B), F>,
  A: Send + 'static,
  B: Send + 'static,
  F: Send + 'static,
{
  fn cancel(&self) {
    if self.outlet.cancel() {
      let upstreams = self.state.lock().shut();
      cancel_all(upstreams);
    }
  }
}

impl<S, A, B, F> Subscription for ZipInner<S, A, B, F>
where
  S: Subscriber<(A, B), F>,
  A: Send + 'static,
  B: Send + 'static,
  F: Send + 'static,
{
  fn request(&self, demand: Demand) {
    if demand.is_none() {
      return;
    }
    let upstreams = {
      let mut state = self.state.lock();
      if state.done {
        return;
      }
      self.outlet.grant(demand);
      state.granted += demand;
      state.upstreams()
    };
    for subscription in upstreams.into_iter().flatten() {
      subscription.request(demand);
    }
    self.settle();
  }

  fn state(&self) -> SubscriptionState { self.outlet.state() }
}

// ==================== Subscriber Structs ====================

/// Subscriber for source A
struct ZipLeft<S, A, B, F>(Arc<ZipInner<S, A, B, F>>);

/// Subscriber for source B
struct ZipRight<S, A, B, F>(Arc<ZipInner<S, A, B, F>>);

impl<S, A, B, F> Subscriber<A, F> for ZipLeft<S, A, B, F>
where
  S: Subscriber<(A, B), F>,
  A: Send + 'static,
  B: Send + 'static,
  F: Send + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.0.receive_upstream(Side::A, subscription)
  }

  fn receive(&mut self, input: A) -> Demand {
    self.0.push(Side::A, |state| state.buffer_a.push_back(input));
    Demand::none()
  }

  fn receive_completion(self, completion: Completion<F>) { self.0.finish(Side::A, completion) }
}

impl<S, A, B, F> Subscriber<B, F> for ZipRight<S, A, B, F>
where
  S: Subscriber<(A, B), F>,
  A: Send + 'static,
  B: Send + 'static,
  F: Send + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.0.receive_upstream(Side::B, subscription)
  }

  fn receive(&mut self, input: B) -> Demand {
    self.0.push(Side::B, |state| state.buffer_b.push_back(input));
    Demand::none()
  }

  fn receive_completion(self, completion: Completion<F>) { self.0.finish(Side::B, completion) }
}

// ==================== Tests ====================
