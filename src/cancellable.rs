//! Cancellation handles.
//!
//! A [`Cancellable`] owns exactly one cancel capability. Cancelling is
//! idempotent and synchronous: once `cancel` returns, the underlying resource
//! has been severed.
//!
//! [`AnyCancellable`] wraps an arbitrary teardown closure and cancels when it
//! is dropped. [`CancelBag`] aggregates many handles into one.

use std::fmt::{Debug, Formatter};

use parking_lot::Mutex;
use smallvec::SmallVec;

/// Something that can be cancelled.
pub trait Cancellable: Send + Sync {
  /// Cancel the activity. Calling this more than once has no further effect.
  fn cancel(&self);
}

type Teardown = Box<dyn FnOnce() + Send>;

/// A type-erased cancellation handle.
///
/// The teardown runs at most once: on the first `cancel` call or when the
/// handle is dropped, whichever comes first.
///
/// ```rust
/// use std::sync::{
///   atomic::{AtomicUsize, Ordering},
///   Arc,
/// };
///
/// use rxflow::prelude::*;
///
/// let hits = Arc::new(AtomicUsize::new(0));
/// let c_hits = hits.clone();
/// let handle = AnyCancellable::new(move || {
///   c_hits.fetch_add(1, Ordering::SeqCst);
/// });
/// handle.cancel();
/// handle.cancel();
/// drop(handle);
/// assert_eq!(hits.load(Ordering::SeqCst), 1);
/// ```
#[must_use = "dropping an AnyCancellable cancels it immediately"]
pub struct AnyCancellable {
  teardown: Mutex<Option<Teardown>>,
}

impl AnyCancellable {
  /// Wrap a teardown closure.
  pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
    Self { teardown: Mutex::new(Some(Box::new(teardown))) }
  }

  /// Wrap any other cancellable.
  pub fn from_cancellable(cancellable: impl Cancellable + 'static) -> Self {
    Self::new(move || cancellable.cancel())
  }

  /// Hand this handle over to a bag; it will be cancelled with the bag.
  pub fn store_in(self, bag: &CancelBag) { bag.insert(self); }

  pub fn is_cancelled(&self) -> bool { self.teardown.lock().is_none() }
}

impl Cancellable for AnyCancellable {
  fn cancel(&self) {
    let teardown = self.teardown.lock().take();
    if let Some(teardown) = teardown {
      teardown();
    }
  }
}

impl Drop for AnyCancellable {
  fn drop(&mut self) { self.cancel(); }
}

impl Debug for AnyCancellable {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AnyCancellable")
      .field("is_cancelled", &self.is_cancelled())
      .finish()
  }
}

struct BagState {
  closed: bool,
  members: SmallVec<[AnyCancellable; 2]>,
}

/// A collection of cancellables acting as one.
///
/// Cancelling the bag cancels every member exactly once. Members inserted
/// after the bag was cancelled are cancelled on insertion. The bag cancels
/// itself when dropped.
pub struct CancelBag {
  inner: Mutex<BagState>,
}

impl Default for CancelBag {
  fn default() -> Self {
    Self { inner: Mutex::new(BagState { closed: false, members: SmallVec::new() }) }
  }
}

impl CancelBag {
  pub fn new() -> Self { Self::default() }

  /// Add a member. Members that are already cancelled are pruned.
  pub fn insert(&self, cancellable: AnyCancellable) {
    let mut inner = self.inner.lock();
    if inner.closed {
      drop(inner);
      cancellable.cancel();
    } else {
      inner.members.retain(|member| !member.is_cancelled());
      inner.members.push(cancellable);
    }
  }

  /// Number of live members.
  pub fn len(&self) -> usize {
    self
      .inner
      .lock()
      .members
      .iter()
      .filter(|member| !member.is_cancelled())
      .count()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  pub fn is_cancelled(&self) -> bool { self.inner.lock().closed }
}

impl Cancellable for CancelBag {
  fn cancel(&self) {
    let members = {
      let mut inner = self.inner.lock();
      if inner.closed {
        return;
      }
      inner.closed = true;
      std::mem::take(&mut inner.members)
    };
    for member in members {
      member.cancel();
    }
  }
}

impl Drop for CancelBag {
  fn drop(&mut self) { self.cancel(); }
}

impl FromIterator<AnyCancellable> for CancelBag {
  fn from_iter<I: IntoIterator<Item = AnyCancellable>>(iter: I) -> Self {
    let bag = CancelBag::new();
    for cancellable in iter {
      bag.insert(cancellable);
    }
    bag
  }
}

impl Debug for CancelBag {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("CancelBag")
      .field("closed", &self.is_cancelled())
      .field("members", &self.len())
      .finish()
  }
}
