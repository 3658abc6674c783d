use std::{iter::Peekable, sync::Arc};

use parking_lot::Mutex;
use tracing::warn;

use super::Publisher;
use crate::{
  cancellable::Cancellable,
  demand::Demand,
  subscriber::{Completion, Never, Subscriber},
  subscription::{AnySubscription, Outlet, Subscription, SubscriptionState},
};

/// A publisher that emits the items of an iterator, then completes.
///
/// Items are pulled from the iterator only against granted demand, so an
/// unbounded iterator is fine as long as demand stays bounded. Completion
/// does not need demand: it is sent as soon as the iterator is exhausted.
///
/// Every subscription iterates its own clone of the iterator.
#[derive(Clone)]
pub struct Sequence<I, F> {
  iter: I,
  completion: Completion<F>,
}

impl<I: Iterator, F> Sequence<I, F> {
  /// Emit the items of `iter`, then finish.
  pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
    Self { iter: iter.into_iter(), completion: Completion::Finished }
  }

  /// Emit the items of `iter`, then fail with `err`.
  pub fn failing(iter: impl IntoIterator<IntoIter = I>, err: F) -> Self {
    Self { iter: iter.into_iter(), completion: Completion::Failed(err) }
  }
}

/// Creates a publisher that emits every item of `iter`, then finishes.
///
/// ```rust
/// use rxflow::prelude::*;
///
/// let (recorder, handle) = Recorder::unlimited();
/// from_iter(vec!["a", "b"]).subscribe(recorder);
/// assert_eq!(handle.values(), vec!["a", "b"]);
/// assert_eq!(handle.completion(), Some(Completion::Finished));
/// ```
pub fn from_iter<T>(iter: T) -> Sequence<T::IntoIter, Never>
where
  T: IntoIterator,
{
  Sequence::new(iter)
}

/// Creates a publisher that emits `value` once, then finishes.
pub fn just<T>(value: T) -> Sequence<std::iter::Once<T>, Never> { Sequence::new(std::iter::once(value)) }

/// Creates a publisher that finishes without emitting.
pub fn empty<T>() -> Sequence<std::iter::Empty<T>, Never> { Sequence::new(std::iter::empty()) }

/// Creates a publisher that fails immediately with `err`.
pub fn fail<T, F>(err: F) -> Sequence<std::iter::Empty<T>, F> {
  Sequence::failing(std::iter::empty(), err)
}

impl<I, F> Publisher for Sequence<I, F>
where
  I: Iterator + Send + 'static,
  I::Item: Send + 'static,
  F: Send + 'static,
{
  type Output = I::Item;
  type Failure = F;

  fn subscribe<S>(self, subscriber: S)
  where
    S: Subscriber<I::Item, F>,
  {
    let subscription = Arc::new(SequenceSubscription {
      source: Mutex::new(Source {
        iter: self.iter.peekable(),
        completion: Some(self.completion),
        pulls: 0,
      }),
      outlet: Outlet::new(subscriber),
    });
    subscription
      .outlet
      .start(AnySubscription::from(subscription.clone()));
    subscription.pump();
  }
}

struct Source<I: Iterator, F> {
  iter: Peekable<I>,
  completion: Option<Completion<F>>,
  pulls: u64,
}

struct SequenceSubscription<S, I: Iterator, F> {
  source: Mutex<Source<I, F>>,
  outlet: Outlet<S, I::Item, F>,
}

impl<S, I, F> SequenceSubscription<S, I, F>
where
  S: Subscriber<I::Item, F>,
  I: Iterator,
{
  /// Pull one item per step while there is demand.
  ///
  /// Stops as soon as another frame is delivering. That frame delivers what
  /// was pulled here, sees the pull count move and keeps pulling itself, so
  /// neither items nor the completion are left behind.
  fn pump(&self) {
    loop {
      if self.outlet.is_terminated() {
        break;
      }
      let (pulled, pulls) = {
        let mut source = self.source.lock();
        let pulled = if self.outlet.demand().is_none() {
          if source.iter.peek().is_none() {
            self.finish(&mut source);
          }
          false
        } else if let Some(item) = source.iter.next() {
          source.pulls += 1;
          if let Err(violation) = self.outlet.enqueue(item) {
            warn!(violation = violation.as_label(), "sequence subscription terminated");
            drop(source);
            self.outlet.cancel();
            break;
          }
          true
        } else {
          self.finish(&mut source);
          false
        };
        (pulled, source.pulls)
      };
      if self.outlet.flush().is_none() {
        break;
      }
      if !pulled && self.source.lock().pulls == pulls {
        break;
      }
    }
  }

  fn finish(&self, source: &mut Source<I, F>) {
    if let Some(completion) = source.completion.take() {
      self.outlet.complete(completion);
    }
  }
}

impl<S, I, F> Cancellable for SequenceSubscription<S, I, F>
where
  S: Subscriber<I::Item, F>,
  I: Iterator + Send,
  I::Item: Send,
  F: Send,
{
  fn cancel(&self) { self.outlet.cancel(); }
}

impl<S, I, F> Subscription for SequenceSubscription<S, I, F>
where
  S: Subscriber<I::Item, F>,
  I: Iterator + Send,
  I::Item: Send,
  F: Send,
{
  fn request(&self, demand: Demand) {
    self.outlet.grant(demand);
    self.pump();
  }

  fn state(&self) -> SubscriptionState { self.outlet.state() }
}
