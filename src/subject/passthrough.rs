use std::sync::Arc;

use super::{impl_subject_roles, subject_core::SubjectCore, SubjectConfig};
use crate::subscriber::Completion;

/// A subject that relays values to the subscribers attached at the time of
/// the send and keeps nothing for later ones.
///
/// ```rust
/// use rxflow::prelude::*;
///
/// let subject = PassthroughSubject::<i32, Never>::new();
/// subject.send(1);
///
/// let (recorder, handle) = Recorder::unlimited();
/// subject.clone().subscribe(recorder);
/// subject.send(2);
/// assert_eq!(handle.values(), vec![2]);
/// ```
pub struct PassthroughSubject<T, F>(Arc<SubjectCore<T, F, ()>>);

impl<T, F> Clone for PassthroughSubject<T, F> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T, F> Default for PassthroughSubject<T, F>
where
  T: Clone + Send + 'static,
  F: Clone + Send + 'static,
{
  fn default() -> Self { Self::new() }
}

impl<T, F> PassthroughSubject<T, F>
where
  T: Clone + Send + 'static,
  F: Clone + Send + 'static,
{
  pub fn new() -> Self { Self::with_config(SubjectConfig::default()) }

  pub fn with_config(config: SubjectConfig) -> Self { Self(Arc::new(SubjectCore::new((), config))) }

  /// Deliver `value` to every attached subscriber that has demand. Does
  /// nothing once the subject has completed.
  pub fn send(&self, value: T) { self.0.send(value) }

  /// Complete every attached subscriber and detach them. Only the first
  /// completion has an effect.
  pub fn send_completion(&self, completion: Completion<F>) { self.0.send_completion(completion) }

  pub fn subscriber_count(&self) -> usize { self.0.subscriber_count() }

  pub fn is_completed(&self) -> bool { self.0.is_completed() }
}

impl_subject_roles!(PassthroughSubject);

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[test]
  fn late_subscriber_sees_only_later_values() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let (early, early_handle) = Recorder::unlimited();
    subject.clone().subscribe(early);

    subject.send(1);
    subject.send(2);
    let (late, late_handle) = Recorder::unlimited();
    subject.clone().subscribe(late);
    subject.send(3);

    assert_eq!(early_handle.values(), vec![1, 2, 3]);
    assert_eq!(late_handle.values(), vec![3]);
  }

  #[test]
  fn values_without_demand_are_dropped_per_subscriber() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let (hungry, hungry_handle) = Recorder::unlimited();
    let (picky, picky_handle) = Recorder::new(Demand::max(1));
    subject.clone().subscribe(hungry);
    subject.clone().subscribe(picky);

    subject.send(1);
    subject.send(2);
    picky_handle.request(Demand::max(1));
    subject.send(3);

    assert_eq!(hungry_handle.values(), vec![1, 2, 3]);
    assert_eq!(picky_handle.values(), vec![1, 3]);
  }

  #[test]
  fn buffer_latest_keeps_recent_values() {
    let config = SubjectConfig::default().with_overflow(OverflowPolicy::BufferLatest(2));
    let subject = PassthroughSubject::<i32, Never>::with_config(config);
    let (recorder, handle) = Recorder::new(Demand::none());
    subject.clone().subscribe(recorder);

    for v in 1..=4 {
      subject.send(v);
    }
    assert!(handle.values().is_empty());
    handle.request(Demand::max(5));
    assert_eq!(handle.values(), vec![3, 4]);
    subject.send(5);
    assert_eq!(handle.values(), vec![3, 4, 5]);
  }

  #[test]
  fn completion_reaches_everyone_once_and_clears_the_list() {
    let subject = PassthroughSubject::<i32, &'static str>::new();
    let (first, first_handle) = Recorder::unlimited();
    let (second, second_handle) = Recorder::new(Demand::none());
    subject.clone().subscribe(first);
    subject.clone().subscribe(second);
    assert_eq!(subject.subscriber_count(), 2);

    subject.send_completion(Completion::Failed("boom"));
    subject.send_completion(Completion::Finished);
    subject.send(1);

    assert_eq!(subject.subscriber_count(), 0);
    assert!(subject.is_completed());
    for handle in [first_handle, second_handle] {
      assert_eq!(
        handle.events(),
        vec![Event::Subscribed, Event::Completion(Completion::Failed("boom"))]
      );
    }
  }

  #[test]
  fn late_subscriber_to_completed_subject_gets_the_completion() {
    let subject = PassthroughSubject::<i32, Never>::new();
    subject.send_completion(Completion::Finished);

    let (recorder, handle) = Recorder::unlimited();
    subject.clone().subscribe(recorder);
    assert_eq!(
      handle.events(),
      vec![Event::Subscribed, Event::Completion(Completion::Finished)]
    );
    assert_eq!(subject.subscriber_count(), 0);
  }

  #[test]
  fn relays_an_upstream_publisher() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let (recorder, handle) = Recorder::unlimited();
    subject.clone().subscribe(recorder);

    from_iter(1..=3).subscribe(subject.clone());

    assert_eq!(handle.values(), vec![1, 2, 3]);
    assert_eq!(handle.completion(), Some(Completion::Finished));
    assert!(subject.is_completed());
  }

  #[test]
  fn subscriber_may_send_from_inside_receive() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let (recorder, handle) = Recorder::unlimited();
    subject.clone().subscribe(recorder);

    let echo = subject.clone();
    let _c = subject.clone().sink(move |v| {
      if v < 3 {
        echo.send(v + 1);
      }
    });
    subject.send(1);

    assert_eq!(handle.values(), vec![1, 2, 3]);
  }
}
