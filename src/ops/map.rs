//! Map operator implementation
//!
//! Transforms every value with a closure. Demand, the subscription and the
//! completion pass through untouched.

use std::marker::PhantomData;

use crate::{
  demand::Demand,
  publisher::Publisher,
  subscriber::{Completion, Subscriber},
  subscription::AnySubscription,
};

// ==================== Map Operator ====================

/// Publisher returned by [`Publisher::map`].
#[derive(Clone)]
pub struct Map<P, F> {
  upstream: P,
  transform: F,
}

impl<P, F> Map<P, F> {
  pub(crate) fn new(upstream: P, transform: F) -> Self { Self { upstream, transform } }
}

impl<P, F, B> Publisher for Map<P, F>
where
  P: Publisher,
  F: FnMut(P::Output) -> B + Send + 'static,
  B: Send + 'static,
{
  type Output = B;
  type Failure = P::Failure;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<B, P::Failure>,
  {
    self
      .upstream
      .subscribe(MapSubscriber { downstream: subscriber, transform: self.transform, _p: PhantomData })
  }
}

// ==================== Subscriber ====================

/// The upstream subscription is handed downstream as is, so one unit of
/// downstream demand is one unit upstream.
pub struct MapSubscriber<S, F, B> {
  downstream: S,
  transform: F,
  _p: PhantomData<fn() -> B>,
}

impl<S, F, A, B, Failure> Subscriber<A, Failure> for MapSubscriber<S, F, B>
where
  S: Subscriber<B, Failure>,
  F: FnMut(A) -> B + Send + 'static,
  B: 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.downstream.receive_subscription(subscription)
  }

  fn receive(&mut self, input: A) -> Demand { self.downstream.receive((self.transform)(input)) }

  fn receive_completion(self, completion: Completion<Failure>) {
    self.downstream.receive_completion(completion)
  }
}

// ==================== Tests ====================
