use std::sync::Arc;

use super::{
  impl_subject_roles,
  subject_core::{Latest, SubjectCore},
  SubjectConfig,
};
use crate::subscriber::Completion;

/// A subject that holds a current value.
///
/// The value starts as the one given at construction and is replaced by
/// every `send`. A subscriber that attaches receives the current value as
/// soon as it requests demand, before anything sent afterwards. Values sent
/// while that replay is still waiting for demand go through the overflow
/// policy; they never displace the replay.
///
/// ```rust
/// use rxflow::prelude::*;
///
/// let subject = CurrentValueSubject::<i32, Never>::new(0);
/// subject.send(1);
/// subject.send(2);
///
/// let (recorder, handle) = Recorder::unlimited();
/// subject.clone().subscribe(recorder);
/// subject.send(3);
/// assert_eq!(handle.values(), vec![2, 3]);
/// assert_eq!(subject.value(), 3);
/// ```
pub struct CurrentValueSubject<T, F>(Arc<SubjectCore<T, F, Latest<T>>>);

impl<T, F> Clone for CurrentValueSubject<T, F> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T, F> CurrentValueSubject<T, F>
where
  T: Clone + Send + 'static,
  F: Clone + Send + 'static,
{
  pub fn new(initial: T) -> Self { Self::with_config(initial, SubjectConfig::default()) }

  pub fn with_config(initial: T, config: SubjectConfig) -> Self {
    Self(Arc::new(SubjectCore::new(Latest(initial), config)))
  }

  /// The most recently sent value, or the initial one.
  pub fn value(&self) -> T { self.0.current() }

  /// Replace the current value and deliver it to every attached subscriber
  /// that has demand. Does nothing once the subject has completed.
  pub fn send(&self, value: T) { self.0.send(value) }

  /// Complete every attached subscriber and detach them. Only the first
  /// completion has an effect.
  pub fn send_completion(&self, completion: Completion<F>) { self.0.send_completion(completion) }

  pub fn subscriber_count(&self) -> usize { self.0.subscriber_count() }

  pub fn is_completed(&self) -> bool { self.0.is_completed() }
}

impl_subject_roles!(CurrentValueSubject);

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use parking_lot::Mutex;

  use crate::prelude::*;

  #[test]
  fn late_subscriber_receives_the_latest_value_first() {
    let subject = CurrentValueSubject::<i32, Never>::new(0);
    subject.send(1);
    subject.send(2);
    subject.send(3);

    let (recorder, handle) = Recorder::unlimited();
    subject.clone().subscribe(recorder);
    assert_eq!(handle.values(), vec![3]);

    subject.send(4);
    assert_eq!(handle.values(), vec![3, 4]);
  }

  #[test]
  fn initial_value_is_replayed_when_nothing_was_sent() {
    let subject = CurrentValueSubject::<&str, Never>::new("init");
    let (recorder, handle) = Recorder::unlimited();
    subject.clone().subscribe(recorder);
    assert_eq!(handle.values(), vec!["init"]);
    assert_eq!(subject.value(), "init");
  }

  #[test]
  fn replay_waits_for_demand_and_comes_first() {
    let subject = CurrentValueSubject::<i32, Never>::new(1);
    let (recorder, handle) = Recorder::new(Demand::none());
    subject.clone().subscribe(recorder);
    assert!(handle.values().is_empty());

    subject.send(2);
    handle.request(Demand::max(1));
    assert_eq!(handle.values(), vec![1]);

    subject.send(3);
    assert_eq!(handle.values(), vec![1]);
    handle.request(Demand::max(1));
    subject.send(4);
    assert_eq!(handle.values(), vec![1, 4]);
    assert_eq!(subject.value(), 4);
  }

  #[test]
  fn replay_buffers_later_values_behind_it() {
    let config = SubjectConfig::default().with_overflow(OverflowPolicy::BufferLatest(1));
    let subject = CurrentValueSubject::<i32, Never>::with_config(1, config);
    let (recorder, handle) = Recorder::new(Demand::none());
    subject.clone().subscribe(recorder);

    subject.send(2);
    subject.send(3);
    handle.request(Demand::unlimited());
    assert_eq!(handle.values(), vec![1, 3]);
  }

  /// Sends into the subject it is subscribing to before asking for values.
  struct SendsDuringHandshake {
    subject: CurrentValueSubject<i32, Never>,
    seen: Arc<Mutex<Vec<i32>>>,
  }

  impl Subscriber<i32, Never> for SendsDuringHandshake {
    fn receive_subscription(&mut self, subscription: AnySubscription) {
      self.subject.send(4);
      subscription.request(Demand::unlimited());
    }

    fn receive(&mut self, input: i32) -> Demand {
      self.seen.lock().push(input);
      Demand::none()
    }

    fn receive_completion(self, _completion: Completion<Never>) {}
  }

  #[test]
  fn send_during_the_handshake_keeps_the_replay() {
    let subject = CurrentValueSubject::<i32, Never>::new(3);
    let seen = Arc::new(Mutex::new(vec![]));
    subject
      .clone()
      .subscribe(SendsDuringHandshake { subject: subject.clone(), seen: seen.clone() });
    assert_eq!(*seen.lock(), vec![3]);
    assert_eq!(subject.value(), 4);

    subject.send(5);
    assert_eq!(*seen.lock(), vec![3, 5]);
  }

  #[test]
  fn value_survives_completion() {
    let subject = CurrentValueSubject::<i32, Never>::new(1);
    subject.send(5);
    subject.send_completion(Completion::Finished);
    subject.send(6);
    assert_eq!(subject.value(), 5);

    let (recorder, handle) = Recorder::unlimited();
    subject.clone().subscribe(recorder);
    assert_eq!(
      handle.events(),
      vec![Event::Subscribed, Event::Completion(Completion::Finished)]
    );
  }
}
