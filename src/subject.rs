//! Subjects: publishers you can push values into.
//!
//! A subject is shared state. Cloning a subject yields another handle to the
//! same broadcast; every subscriber attached through any handle sees the
//! same values in the same order. Each subscriber keeps its own demand, and
//! what happens to a value sent while a subscriber has none is decided by the
//! subject's [`OverflowPolicy`].
//!
//! - [`PassthroughSubject`] keeps nothing; late subscribers see only what is
//!   sent after they attach.
//! - [`CurrentValueSubject`] keeps the latest value and replays it to every
//!   new subscriber.
//!
//! A subject is also a [`Subscriber`](crate::subscriber::Subscriber): it can
//! be attached to any publisher with the same value and failure types, in
//! which case it requests unlimited demand and relays everything it receives.

mod current_value;
mod passthrough;
mod subject_core;
mod subscribers;

pub use current_value::CurrentValueSubject;
pub use passthrough::PassthroughSubject;

/// What a subject does with a value sent to a subscriber that has no
/// outstanding demand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
  /// Drop the value for that subscriber only.
  #[default]
  Drop,
  /// Keep up to this many of the most recent undelivered values per
  /// subscriber and deliver them as demand arrives. `BufferLatest(0)` behaves
  /// like `Drop`.
  BufferLatest(usize),
}

/// Runtime options of a subject.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubjectConfig {
  pub overflow: OverflowPolicy,
}

impl SubjectConfig {
  #[must_use]
  pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
    self.overflow = overflow;
    self
  }
}

/// Implements `Publisher` and `Subscriber` for a subject handle that wraps
/// an `Arc<SubjectCore<..>>` in its first field.
macro_rules! impl_subject_roles {
  ($ty:ident) => {
    impl<T, F> $crate::publisher::Publisher for $ty<T, F>
    where
      T: Clone + Send + 'static,
      F: Clone + Send + 'static,
    {
      type Output = T;
      type Failure = F;

      fn subscribe<S>(self, subscriber: S)
      where
        S: $crate::subscriber::Subscriber<T, F>,
      {
        self.0.attach(subscriber)
      }
    }

    impl<T, F> $crate::subscriber::Subscriber<T, F> for $ty<T, F>
    where
      T: Clone + Send + 'static,
      F: Clone + Send + 'static,
    {
      fn receive_subscription(&mut self, subscription: $crate::subscription::AnySubscription) {
        self.0.retain_upstream(subscription)
      }

      fn receive(&mut self, input: T) -> $crate::demand::Demand {
        self.0.send(input);
        $crate::demand::Demand::none()
      }

      fn receive_completion(self, completion: $crate::subscriber::Completion<F>) {
        self.0.send_completion(completion)
      }
    }
  };
}

use impl_subject_roles;
