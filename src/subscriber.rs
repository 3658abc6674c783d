//! Subscriber trait and implementations
//!
//! A subscriber is the consuming end of a stream. It is handed its
//! subscription once, receives values (answering each with additional
//! demand), and finally receives at most one completion.

use crate::{demand::Demand, subscription::AnySubscription};

mod assign;
mod recorder;
mod sink;

pub use assign::Assign;
pub use recorder::{Event, Recorder, RecorderHandle};
pub use sink::Sink;

/// Failure type of streams that cannot fail.
pub type Never = std::convert::Infallible;

/// Terminal signal of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<F> {
  /// The stream ended normally.
  Finished,
  /// The stream ended with an error.
  Failed(F),
}

impl<F> Completion<F> {
  pub fn is_finished(&self) -> bool { matches!(self, Completion::Finished) }

  pub fn is_failed(&self) -> bool { matches!(self, Completion::Failed(_)) }

  /// Convert the failure, keeping `Finished` as is.
  pub fn map_failure<E>(self, f: impl FnOnce(F) -> E) -> Completion<E> {
    match self {
      Completion::Finished => Completion::Finished,
      Completion::Failed(err) => Completion::Failed(f(err)),
    }
  }

  pub fn into_result(self) -> Result<(), F> {
    match self {
      Completion::Finished => Ok(()),
      Completion::Failed(err) => Err(err),
    }
  }
}

// ============================================================================
// Subscriber Trait
// ============================================================================

/// The consumer of a stream.
///
/// The call order is fixed: `receive_subscription` exactly once, then any
/// number of `receive`, then at most one `receive_completion`. Calls to one
/// subscriber never overlap.
pub trait Subscriber<Input, Failure>: Send + 'static {
  /// Accept the subscription. Nothing is delivered until demand is requested
  /// through it.
  fn receive_subscription(&mut self, subscription: AnySubscription);

  /// Accept one value and return how many more values are wanted, on top of
  /// what is already outstanding.
  fn receive(&mut self, input: Input) -> Demand;

  /// Accept the terminal completion.
  ///
  /// This consumes the subscriber, as nothing can be delivered after it.
  fn receive_completion(self, completion: Completion<Failure>);
}

// ============================================================================
// DynSubscriber Trait - Object-safe Subscriber
// ============================================================================

/// Object-safe mirror of [`Subscriber`].
///
/// `receive_completion` takes `self` by value, so boxed subscribers complete
/// through `self: Box<Self>` instead.
pub trait DynSubscriber<Input, Failure>: Send {
  fn box_receive_subscription(&mut self, subscription: AnySubscription);
  fn box_receive(&mut self, input: Input) -> Demand;
  fn box_receive_completion(self: Box<Self>, completion: Completion<Failure>);
}

impl<S, Input, Failure> DynSubscriber<Input, Failure> for S
where
  S: Subscriber<Input, Failure>,
{
  fn box_receive_subscription(&mut self, subscription: AnySubscription) {
    self.receive_subscription(subscription)
  }

  fn box_receive(&mut self, input: Input) -> Demand { self.receive(input) }

  fn box_receive_completion(self: Box<Self>, completion: Completion<Failure>) {
    (*self).receive_completion(completion)
  }
}

/// A type-erased subscriber.
///
/// The `(Input, Failure)` pairing stays part of the type, so erasure never
/// loosens what may be bound to it.
pub struct AnySubscriber<Input, Failure>(Box<dyn DynSubscriber<Input, Failure>>);

impl<Input, Failure> AnySubscriber<Input, Failure> {
  pub fn new(subscriber: impl Subscriber<Input, Failure>) -> Self { Self(Box::new(subscriber)) }
}

impl<Input, Failure> Subscriber<Input, Failure> for AnySubscriber<Input, Failure>
where
  Input: 'static,
  Failure: 'static,
{
  #[inline]
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    self.0.box_receive_subscription(subscription)
  }

  #[inline]
  fn receive(&mut self, input: Input) -> Demand { self.0.box_receive(input) }

  #[inline]
  fn receive_completion(self, completion: Completion<Failure>) {
    self.0.box_receive_completion(completion)
  }
}

// ============================================================================
// Tests
// ============================================================================
