use std::collections::VecDeque;

use parking_lot::{Mutex, MutexGuard};
use tracing::trace;

use super::{AnySubscription, SubscriptionState};
use crate::{
  demand::Demand,
  error::ContractViolation,
  subject::OverflowPolicy,
  subscriber::{Completion, Subscriber},
};

/// What happened to a value offered to an [`Outlet`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Delivery {
  /// Demand was available; the value is queued for delivery.
  Queued,
  /// No demand; the value waits in the backlog.
  Buffered,
  /// No demand; the value was discarded for this subscriber.
  Dropped,
  /// The subscription is already terminated.
  Closed,
}

/// The delivery end of one subscription.
///
/// An outlet owns the downstream subscriber and the demand ledger of a single
/// connection:
///
/// - `demand` is the outstanding, not yet claimed demand. Enqueuing a value
///   claims one unit, so `ready` never holds more than was granted.
/// - `replay` holds the value a subject hands a new subscriber, `backlog` the
///   values kept by a buffering policy. Both move to `ready` as demand is
///   granted, the replay value first. Later values never displace it.
/// - Delivery is serialized with the `emitting` flag. Whoever finds the flag
///   clear becomes the emitter and delivers until nothing is deliverable;
///   everyone else only enqueues. No lock is held while the subscriber runs,
///   so a subscriber may call back into its subscription from `receive`.
///
/// Order of delivery is always: subscription, values, completion.
pub(crate) struct Outlet<S, T, F> {
  state: Mutex<OutletState<S, T, F>>,
}

struct OutletState<S, T, F> {
  subscriber: Option<S>,
  handshake: Option<AnySubscription>,
  subscribed: bool,
  emitting: bool,
  terminal: Option<SubscriptionState>,
  demand: Demand,
  granted: Demand,
  emitted: usize,
  ready: VecDeque<T>,
  replay: Option<T>,
  backlog: VecDeque<T>,
  completion: Option<Completion<F>>,
}

impl<S, T, F> OutletState<S, T, F> {
  /// No further values are accepted once a completion is pending.
  fn is_closed(&self) -> bool { self.terminal.is_some() || self.completion.is_some() }

  fn add_demand(&mut self, demand: Demand) {
    self.demand += demand;
    self.granted += demand;
    self.release_backlog();
  }

  fn has_pending(&self) -> bool { self.replay.is_some() || !self.backlog.is_empty() }

  fn release_backlog(&mut self) {
    if self.replay.is_some() && self.demand.consume() {
      self.ready.extend(self.replay.take());
    }
    if self.replay.is_some() {
      return;
    }
    while !self.backlog.is_empty() && self.demand.consume() {
      if let Some(value) = self.backlog.pop_front() {
        self.ready.push_back(value);
      }
    }
  }
}

impl<S, T, F> Outlet<S, T, F> {
  pub(crate) fn new(subscriber: S) -> Self {
    Self {
      state: Mutex::new(OutletState {
        subscriber: Some(subscriber),
        handshake: None,
        subscribed: false,
        emitting: false,
        terminal: None,
        demand: Demand::none(),
        granted: Demand::none(),
        emitted: 0,
        ready: VecDeque::new(),
        replay: None,
        backlog: VecDeque::new(),
        completion: None,
      }),
    }
  }

  /// Outstanding demand that has not been claimed by a queued value.
  pub(crate) fn demand(&self) -> Demand {
    let state = self.state.lock();
    if state.is_closed() { Demand::none() } else { state.demand }
  }

  pub(crate) fn is_terminated(&self) -> bool { self.state.lock().terminal.is_some() }

  pub(crate) fn state(&self) -> SubscriptionState {
    let state = self.state.lock();
    match state.terminal {
      Some(terminal) => terminal,
      None if state.demand.is_none() => SubscriptionState::Idle,
      None => SubscriptionState::Active,
    }
  }

  /// Add demand without delivering anything.
  pub(crate) fn grant(&self, demand: Demand) {
    if demand.is_none() {
      return;
    }
    let mut state = self.state.lock();
    if state.terminal.is_none() {
      state.add_demand(demand);
    }
  }

  /// Queue a value against outstanding demand.
  ///
  /// Values sent to a terminated outlet are silently discarded. A value
  /// without demand is a publisher-side contract violation and is rejected.
  pub(crate) fn enqueue(&self, value: T) -> Result<(), ContractViolation> {
    let mut state = self.state.lock();
    if state.is_closed() {
      return Ok(());
    }
    if !state.demand.consume() {
      return Err(ContractViolation::EmissionWithoutDemand);
    }
    state.ready.push_back(value);
    Ok(())
  }

  /// Queue a value if there is demand, otherwise apply `policy`.
  pub(crate) fn offer(&self, value: T, policy: OverflowPolicy) -> Delivery {
    let mut state = self.state.lock();
    if state.is_closed() {
      return Delivery::Closed;
    }
    if !state.has_pending() && state.demand.consume() {
      state.ready.push_back(value);
      return Delivery::Queued;
    }
    match policy {
      OverflowPolicy::BufferLatest(capacity) if capacity > 0 => {
        state.backlog.push_back(value);
        if state.backlog.len() > capacity {
          state.backlog.pop_front();
        }
        Delivery::Buffered
      }
      _ => Delivery::Dropped,
    }
  }

  /// Hold `value` for delivery ahead of everything offered later. It is
  /// released as soon as demand allows.
  pub(crate) fn replay(&self, value: T) {
    let mut state = self.state.lock();
    if !state.is_closed() {
      state.replay = Some(value);
      state.release_backlog();
    }
  }

  /// Record the terminal completion. `Finished` is delivered after the values
  /// already queued; `Failed` discards them. Only the first completion counts.
  pub(crate) fn complete(&self, completion: Completion<F>) {
    let mut state = self.state.lock();
    if state.is_closed() {
      return;
    }
    if matches!(completion, Completion::Failed(_)) {
      state.ready.clear();
    }
    state.replay = None;
    state.backlog.clear();
    state.completion = Some(completion);
  }

  /// Terminate the subscription. Returns `true` for the call that actually
  /// cancelled, so the owner releases upstream resources exactly once.
  pub(crate) fn cancel(&self) -> bool {
    let mut state = self.state.lock();
    if state.terminal.is_some() {
      return false;
    }
    state.terminal = Some(SubscriptionState::Cancelled);
    state.handshake = None;
    state.completion = None;
    let ready = std::mem::take(&mut state.ready);
    let replay = state.replay.take();
    let backlog = std::mem::take(&mut state.backlog);
    let subscriber = state.subscriber.take();
    drop(state);
    trace!(
      undelivered = ready.len() + backlog.len() + usize::from(replay.is_some()),
      "subscription cancelled"
    );
    drop(subscriber);
    true
  }
}

impl<S, T, F> Outlet<S, T, F>
where
  S: Subscriber<T, F>,
{
  /// Hand the subscription to the subscriber, then deliver whatever is
  /// already deliverable.
  pub(crate) fn start(&self, subscription: AnySubscription) -> Option<Demand> {
    let mut state = self.state.lock();
    if state.terminal.is_some() || state.subscribed || state.handshake.is_some() {
      return Some(Demand::none());
    }
    state.handshake = Some(subscription);
    self.drain(state)
  }

  /// Grant demand and deliver.
  pub(crate) fn request(&self, demand: Demand) -> Option<Demand> {
    let mut state = self.state.lock();
    if state.terminal.is_some() {
      return Some(Demand::none());
    }
    if !demand.is_none() {
      state.add_demand(demand);
    }
    self.drain(state)
  }

  /// Deliver everything deliverable.
  ///
  /// Returns `None` when another caller is currently emitting; that caller
  /// will deliver what this one queued. Otherwise returns the additional
  /// demand the subscriber handed back from `receive` during this pass.
  pub(crate) fn flush(&self) -> Option<Demand> {
    let state = self.state.lock();
    self.drain(state)
  }

  fn drain<'a>(&'a self, mut state: MutexGuard<'a, OutletState<S, T, F>>) -> Option<Demand> {
    if state.emitting {
      return None;
    }
    state.emitting = true;
    let mut extra = Demand::none();

    loop {
      let Some(mut subscriber) = state.subscriber.take() else {
        state.emitting = false;
        return Some(extra);
      };

      if let Some(subscription) = state.handshake.take() {
        drop(state);
        subscriber.receive_subscription(subscription);
        state = self.state.lock();
        state.subscribed = true;
      } else if !state.subscribed {
        state.subscriber = Some(subscriber);
        state.emitting = false;
        return Some(extra);
      } else if let Some(value) = state.ready.pop_front() {
        state.emitted += 1;
        debug_assert!(state.granted.covers(state.emitted));
        drop(state);
        let more = subscriber.receive(value);
        state = self.state.lock();
        if state.terminal.is_none() && !more.is_none() {
          state.add_demand(more);
          extra += more;
        }
      } else if let Some(completion) = state.completion.take() {
        state.terminal = Some(SubscriptionState::Completed);
        state.emitting = false;
        drop(state);
        subscriber.receive_completion(completion);
        return Some(extra);
      } else {
        state.subscriber = Some(subscriber);
        state.emitting = false;
        return Some(extra);
      }

      if state.terminal.is_some() {
        state.emitting = false;
        drop(state);
        drop(subscriber);
        return Some(extra);
      }
      state.subscriber = Some(subscriber);
    }
  }
}
