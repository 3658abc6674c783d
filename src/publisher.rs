//! Publisher trait and source publishers
//!
//! A publisher is an immutable description of a stream. Every call to
//! [`Publisher::subscribe`] builds an independent subscription, except for
//! subjects, whose subscribers share one live broadcast.

use std::sync::Arc;

use crate::{
  cancellable::AnyCancellable,
  ops::{FlatMapLatest, Map, SwitchToLatest, Zip, Zip3},
  subscriber::{Assign, Completion, Never, Sink, Subscriber},
};

mod any;
mod sequence;
#[cfg(feature = "stream")]
mod values;

pub use any::{AnyPublisher, DynPublisher};
pub use sequence::{empty, fail, from_iter, just, Sequence};
#[cfg(feature = "stream")]
pub use values::Values;

// ============================================================================
// Publisher Trait
// ============================================================================

/// The producing end of a stream.
///
/// `Output` and `Failure` fix the pairing a subscriber must accept; it is
/// checked when the subscriber is bound, never per value.
pub trait Publisher: Sized {
  type Output: Send + 'static;
  type Failure: Send + 'static;

  /// Bind `subscriber` to this publisher.
  ///
  /// The subscriber receives its subscription exactly once before anything
  /// else, and nothing more until it requests demand.
  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<Self::Output, Self::Failure>;

  // ==========================================================================
  // Operators
  // ==========================================================================

  /// Transform every value.
  ///
  /// ```rust
  /// use rxflow::prelude::*;
  ///
  /// let (recorder, handle) = Recorder::unlimited();
  /// from_iter(1..=3).map(|v| v * 10).subscribe(recorder);
  /// assert_eq!(handle.values(), vec![10, 20, 30]);
  /// ```
  fn map<B, F>(self, transform: F) -> Map<Self, F>
  where
    F: FnMut(Self::Output) -> B + Send + 'static,
    B: Send + 'static,
  {
    Map::new(self, transform)
  }

  /// Pair values of two publishers by position.
  fn zip<Other>(self, other: Other) -> Zip<Self, Other>
  where
    Other: Publisher<Failure = Self::Failure>,
  {
    Zip::new(self, other)
  }

  /// Combine values of three publishers by position.
  fn zip3<B, C>(self, b: B, c: C) -> Zip3<Self, B, C>
  where
    B: Publisher<Failure = Self::Failure>,
    C: Publisher<Failure = Self::Failure>,
  {
    crate::ops::zip3(self, b, c)
  }

  /// Treat every value as a publisher and forward only the most recent one.
  fn switch_to_latest(self) -> SwitchToLatest<Self>
  where
    Self::Output: Publisher<Failure = Self::Failure>,
  {
    SwitchToLatest::new(self)
  }

  /// Map every value to a publisher and forward only the most recent one.
  fn flat_map_latest<Inner, F>(self, transform: F) -> FlatMapLatest<Self, F>
  where
    F: FnMut(Self::Output) -> Inner + Send + 'static,
    Inner: Publisher<Failure = Self::Failure> + Send + 'static,
  {
    self.map(transform).switch_to_latest()
  }

  /// Hide the concrete publisher type.
  fn erase(self) -> AnyPublisher<Self::Output, Self::Failure>
  where
    Self: Clone + Send + Sync + 'static,
  {
    AnyPublisher::new(self)
  }

  // ==========================================================================
  // Terminal subscribers
  // ==========================================================================

  /// Subscribe with unlimited demand and a value closure.
  fn sink<V>(self, receive_value: V) -> AnyCancellable
  where
    Self: Publisher<Failure = Never>,
    V: FnMut(Self::Output) + Send + 'static,
  {
    let (sink, handle) = Sink::new(|_: Completion<Never>| {}, receive_value);
    self.subscribe(sink);
    handle
  }

  /// Subscribe with unlimited demand, a completion closure and a value
  /// closure.
  fn sink_completion<C, V>(self, receive_completion: C, receive_value: V) -> AnyCancellable
  where
    C: FnOnce(Completion<Self::Failure>) + Send + 'static,
    V: FnMut(Self::Output) + Send + 'static,
  {
    let (sink, handle) = Sink::new(receive_completion, receive_value);
    self.subscribe(sink);
    handle
  }

  /// Write every value into `root` through `setter`.
  fn assign<R, A>(self, root: Arc<R>, setter: A) -> AnyCancellable
  where
    Self: Publisher<Failure = Never>,
    R: Send + Sync + 'static,
    A: FnMut(&R, Self::Output) + Send + 'static,
  {
    let (assign, handle) = Assign::new(root, setter);
    self.subscribe(assign);
    handle
  }

  /// Pull values as an async stream, one request per poll.
  #[cfg(feature = "stream")]
  fn values(self) -> Values<Self::Output, Self::Failure> { Values::new(self) }
}
