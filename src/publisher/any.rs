use std::sync::Arc;

use super::Publisher;
use crate::subscriber::{AnySubscriber, Subscriber};

/// Object-safe mirror of [`Publisher`].
///
/// Subscribing through a shared reference works on a clone of the publisher,
/// so every subscription still starts from the same descriptor.
pub trait DynPublisher<T, F>: Send + Sync {
  fn dyn_subscribe(&self, subscriber: AnySubscriber<T, F>);
}

impl<P> DynPublisher<P::Output, P::Failure> for P
where
  P: Publisher + Clone + Send + Sync,
{
  fn dyn_subscribe(&self, subscriber: AnySubscriber<P::Output, P::Failure>) {
    self.clone().subscribe(subscriber)
  }
}

/// A type-erased, cloneable publisher.
///
/// ```rust
/// use rxflow::prelude::*;
///
/// let sources: Vec<AnyPublisher<i32, Never>> =
///   vec![just(1).erase(), from_iter(vec![2, 3]).map(|v| v * 2).erase()];
///
/// let (recorder, handle) = Recorder::unlimited();
/// sources[1].clone().subscribe(recorder);
/// assert_eq!(handle.values(), vec![4, 6]);
/// ```
pub struct AnyPublisher<T, F>(Arc<dyn DynPublisher<T, F>>);

impl<T, F> AnyPublisher<T, F> {
  pub fn new<P>(publisher: P) -> Self
  where
    P: Publisher<Output = T, Failure = F> + Clone + Send + Sync + 'static,
  {
    Self(Arc::new(publisher))
  }
}

impl<T, F> Clone for AnyPublisher<T, F> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T, F> Publisher for AnyPublisher<T, F>
where
  T: Send + 'static,
  F: Send + 'static,
{
  type Output = T;
  type Failure = F;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<T, F>,
  {
    self.0.dyn_subscribe(AnySubscriber::new(subscriber))
  }

  fn erase(self) -> AnyPublisher<T, F> { self }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[test]
  fn erased_publishers_keep_the_protocol() {
    let erased = from_iter(1..=4).erase();
    let (recorder, handle) = Recorder::<i32, Never>::new(Demand::max(2));
    erased.clone().subscribe(recorder);
    assert_eq!(handle.values(), vec![1, 2]);

    let (recorder, handle) = Recorder::<i32, Never>::unlimited();
    erased.subscribe(recorder);
    assert_eq!(handle.values(), vec![1, 2, 3, 4]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }

  #[test]
  fn erased_subject_shares_the_broadcast() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let erased = subject.clone().erase();
    let (recorder, handle) = Recorder::<i32, Never>::unlimited();
    erased.subscribe(recorder);

    subject.send(1);
    subject.send_completion(Completion::Finished);
    assert_eq!(handle.values(), vec![1]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
  }
}
