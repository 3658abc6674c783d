use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::{subscribers::Subscribers, OverflowPolicy, SubjectConfig};
use crate::{
  cancellable::Cancellable,
  demand::Demand,
  subscriber::{Completion, Subscriber},
  subscription::{AnySubscription, Delivery, Outlet, Subscription, SubscriptionState},
};

// ============================================================================
// Retained value
// ============================================================================

/// What a subject keeps for subscribers that attach later.
pub(crate) trait Retain<T>: Send + 'static {
  fn retain(&mut self, value: &T);
  fn replay(&self) -> Option<T>;
}

/// Keeps nothing.
impl<T> Retain<T> for () {
  fn retain(&mut self, _value: &T) {}
  fn replay(&self) -> Option<T> { None }
}

/// Keeps the most recent value.
pub(crate) struct Latest<T>(pub(crate) T);

impl<T: Clone + Send + 'static> Retain<T> for Latest<T> {
  fn retain(&mut self, value: &T) { self.0 = value.clone(); }
  fn replay(&self) -> Option<T> { Some(self.0.clone()) }
}

// ============================================================================
// Links
// ============================================================================

/// The subject's view of one attached subscription.
pub(crate) trait Link<T, F>: Send + Sync {
  fn offer(&self, value: T, policy: OverflowPolicy) -> Delivery;
  fn complete(&self, completion: Completion<F>);
  fn flush(&self);
}

/// One subscriber attached to a subject.
struct Conduit<S, T, F, R> {
  id: usize,
  outlet: Outlet<S, T, F>,
  core: Weak<SubjectCore<T, F, R>>,
}

impl<S, T, F, R> Link<T, F> for Conduit<S, T, F, R>
where
  S: Subscriber<T, F>,
  T: Send + 'static,
  F: Send + 'static,
  R: Send + 'static,
{
  fn offer(&self, value: T, policy: OverflowPolicy) -> Delivery { self.outlet.offer(value, policy) }

  fn complete(&self, completion: Completion<F>) { self.outlet.complete(completion) }

  fn flush(&self) { self.outlet.flush(); }
}

impl<S, T, F, R> Cancellable for Conduit<S, T, F, R>
where
  S: Subscriber<T, F>,
  T: Send + 'static,
  F: Send + 'static,
  R: Send + 'static,
{
  fn cancel(&self) {
    if self.outlet.cancel() {
      if let Some(core) = self.core.upgrade() {
        core.detach(self.id);
      }
    }
  }
}

impl<S, T, F, R> Subscription for Conduit<S, T, F, R>
where
  S: Subscriber<T, F>,
  T: Send + 'static,
  F: Send + 'static,
  R: Send + 'static,
{
  fn request(&self, demand: Demand) { self.outlet.request(demand); }

  fn state(&self) -> SubscriptionState { self.outlet.state() }
}

// ============================================================================
// SubjectCore
// ============================================================================

struct SubjectState<T, F, R> {
  subscribers: Subscribers<Arc<dyn Link<T, F>>>,
  retained: R,
  completion: Option<Completion<F>>,
  upstream: Vec<AnySubscription>,
}

/// Shared state behind every subject handle.
///
/// Values are offered to all subscribers under the subject lock, so every
/// subscriber observes sends in the same order. Delivery itself happens after
/// the lock is released.
pub(crate) struct SubjectCore<T, F, R> {
  state: Mutex<SubjectState<T, F, R>>,
  config: SubjectConfig,
}

type LinkList<T, F> = SmallVec<[Arc<dyn Link<T, F>>; 2]>;

impl<T, F, R> SubjectCore<T, F, R>
where
  T: Clone + Send + 'static,
  F: Clone + Send + 'static,
  R: Retain<T>,
{
  pub(crate) fn new(retained: R, config: SubjectConfig) -> Self {
    Self {
      state: Mutex::new(SubjectState {
        subscribers: Subscribers::default(),
        retained,
        completion: None,
        upstream: vec![],
      }),
      config,
    }
  }

  pub(crate) fn send(&self, value: T) {
    let links: LinkList<T, F> = {
      let mut state = self.state.lock();
      if state.completion.is_some() {
        return;
      }
      state.retained.retain(&value);
      let policy = self.config.overflow;
      let mut dropped = 0;
      state.subscribers.broadcast(value, |link, value| {
        if link.offer(value, policy) == Delivery::Dropped {
          dropped += 1;
        }
      });
      if dropped > 0 {
        trace!(dropped, "subject value dropped for subscribers without demand");
      }
      state.subscribers.iter().cloned().collect()
    };
    for link in links {
      link.flush();
    }
  }

  pub(crate) fn send_completion(&self, completion: Completion<F>) {
    let (links, upstream) = {
      let mut state = self.state.lock();
      if state.completion.is_some() {
        return;
      }
      state.completion = Some(completion.clone());
      let links: LinkList<T, F> = state.subscribers.drain().collect();
      (links, std::mem::take(&mut state.upstream))
    };
    debug!(
      subscribers = links.len(),
      failed = completion.is_failed(),
      "subject completed"
    );
    for subscription in upstream {
      subscription.cancel();
    }
    for link in links {
      link.complete(completion.clone());
      link.flush();
    }
  }

  pub(crate) fn attach<S>(self: &Arc<Self>, subscriber: S)
  where
    S: Subscriber<T, F>,
  {
    let mut state = self.state.lock();
    let id = state.subscribers.reserve_id();
    let conduit = Arc::new(Conduit { id, outlet: Outlet::new(subscriber), core: Arc::downgrade(self) });
    if let Some(completion) = &state.completion {
      conduit.outlet.complete(completion.clone());
    } else {
      if let Some(value) = state.retained.replay() {
        conduit.outlet.replay(value);
      }
      state.subscribers.insert(id, conduit.clone());
    }
    drop(state);
    conduit.outlet.start(AnySubscription::from(conduit.clone()));
  }

  /// Keep an upstream subscription feeding this subject and ask it for
  /// everything.
  pub(crate) fn retain_upstream(&self, subscription: AnySubscription) {
    let mut state = self.state.lock();
    if state.completion.is_some() {
      drop(state);
      subscription.cancel();
      return;
    }
    state.upstream.push(subscription.clone());
    drop(state);
    subscription.request(Demand::unlimited());
  }

  pub(crate) fn subscriber_count(&self) -> usize { self.state.lock().subscribers.len() }

  pub(crate) fn is_completed(&self) -> bool { self.state.lock().completion.is_some() }
}

impl<T: Clone, F> SubjectCore<T, F, Latest<T>> {
  pub(crate) fn current(&self) -> T { self.state.lock().retained.0.clone() }
}

impl<T, F, R> SubjectCore<T, F, R> {
  fn detach(&self, id: usize) {
    let removed = self.state.lock().subscribers.remove(id);
    if removed.is_some() {
      trace!(id, "subscriber detached from subject");
    }
  }
}
