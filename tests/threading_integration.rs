//! Integration tests for sending, requesting and cancelling across threads.

use std::{
  sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
  },
  thread,
};

use parking_lot::Mutex;
use rxflow::prelude::*;

#[test]
fn concurrent_senders_keep_their_own_order() {
  const SENDERS: usize = 4;
  const PER_SENDER: usize = 500;

  let subject = PassthroughSubject::<(usize, usize), Never>::new();
  let (recorder, handle) = Recorder::unlimited();
  subject.clone().subscribe(recorder);

  let workers: Vec<_> = (0..SENDERS)
    .map(|sender| {
      let subject = subject.clone();
      thread::spawn(move || {
        for i in 0..PER_SENDER {
          subject.send((sender, i));
        }
      })
    })
    .collect();
  for worker in workers {
    worker.join().unwrap();
  }

  let values = handle.values();
  assert_eq!(values.len(), SENDERS * PER_SENDER);
  for sender in 0..SENDERS {
    let own: Vec<_> = values.iter().filter(|(s, _)| *s == sender).map(|(_, i)| *i).collect();
    assert_eq!(own, (0..PER_SENDER).collect::<Vec<_>>());
  }
}

#[test]
fn deliveries_to_one_subscriber_never_overlap() {
  let subject = PassthroughSubject::<usize, Never>::new();
  let busy = Arc::new(AtomicBool::new(false));
  let overlaps = Arc::new(AtomicUsize::new(0));
  let received = Arc::new(AtomicUsize::new(0));

  let (c_busy, c_overlaps, c_received) = (busy.clone(), overlaps.clone(), received.clone());
  let _c = subject.clone().sink(move |_| {
    if c_busy.swap(true, Ordering::SeqCst) {
      c_overlaps.fetch_add(1, Ordering::SeqCst);
    }
    thread::yield_now();
    c_received.fetch_add(1, Ordering::SeqCst);
    c_busy.store(false, Ordering::SeqCst);
  });

  let workers: Vec<_> = (0..4)
    .map(|_| {
      let subject = subject.clone();
      thread::spawn(move || {
        for i in 0..250 {
          subject.send(i);
        }
      })
    })
    .collect();
  for worker in workers {
    worker.join().unwrap();
  }

  assert_eq!(overlaps.load(Ordering::SeqCst), 0);
  assert_eq!(received.load(Ordering::SeqCst), 1000);
}

#[test]
fn cancel_racing_with_send_allows_at_most_one_in_flight_value() {
  let subject = PassthroughSubject::<usize, Never>::new();
  let received = Arc::new(AtomicUsize::new(0));
  let c_received = received.clone();
  let handle = subject.clone().sink(move |_| {
    c_received.fetch_add(1, Ordering::SeqCst);
  });

  let sender = {
    let subject = subject.clone();
    thread::spawn(move || {
      for i in 0..100_000 {
        subject.send(i);
      }
    })
  };

  while received.load(Ordering::SeqCst) < 100 {
    thread::yield_now();
  }
  handle.cancel();
  let at_cancel = received.load(Ordering::SeqCst);
  sender.join().unwrap();

  assert!(received.load(Ordering::SeqCst) <= at_cancel + 1);
  assert_eq!(subject.subscriber_count(), 0);
}

#[test]
fn zip_pairs_values_sent_from_two_threads() {
  let a = PassthroughSubject::<usize, Never>::new();
  let b = PassthroughSubject::<usize, Never>::new();
  let (recorder, handle) = Recorder::unlimited();
  a.clone().zip(b.clone()).subscribe(recorder);

  let feed = |subject: PassthroughSubject<usize, Never>| {
    thread::spawn(move || {
      for i in 0..1000 {
        subject.send(i);
      }
      subject.send_completion(Completion::Finished);
    })
  };
  let (ta, tb) = (feed(a), feed(b));
  ta.join().unwrap();
  tb.join().unwrap();

  let pairs = handle.values();
  assert_eq!(pairs.len(), 1000);
  assert!(pairs.iter().all(|(x, y)| x == y));
  assert_eq!(handle.completion(), Some(Completion::Finished));
}

#[test]
fn requests_from_another_thread_release_values() {
  let (recorder, handle) = Recorder::<usize, Never>::new(Demand::none());
  from_iter(0..1000).subscribe(recorder);

  let requesters: Vec<_> = (0..4)
    .map(|_| {
      let handle = handle.clone();
      thread::spawn(move || {
        for _ in 0..250 {
          handle.request(Demand::max(1));
        }
      })
    })
    .collect();
  for requester in requesters {
    requester.join().unwrap();
  }

  assert_eq!(handle.values(), (0..1000).collect::<Vec<_>>());
  assert_eq!(handle.completion(), Some(Completion::Finished));
}

#[test]
fn switching_while_another_thread_drains_keeps_demand_exact() {
  let outer = PassthroughSubject::<AnyPublisher<usize, Never>, Never>::new();
  let (recorder, handle) = Recorder::with_demand(Demand::none(), Demand::max(1));
  outer.clone().switch_to_latest().subscribe(recorder);

  let switcher = {
    let outer = outer.clone();
    thread::spawn(move || {
      for _ in 0..200 {
        outer.send(from_iter(0..50).erase());
      }
    })
  };
  let requester = {
    let handle = handle.clone();
    thread::spawn(move || {
      for _ in 0..200 {
        handle.request(Demand::max(1));
      }
    })
  };
  switcher.join().unwrap();
  requester.join().unwrap();
  assert_ne!(handle.state(), Some(SubscriptionState::Cancelled));

  outer.send(from_iter(0..3).erase());
  outer.send_completion(Completion::Finished);
  let values = handle.values();
  assert_eq!(values[values.len() - 3..], [0, 1, 2]);
  assert_eq!(handle.completion(), Some(Completion::Finished));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn switch_to_latest_across_tasks() {
  let outer = PassthroughSubject::<PassthroughSubject<usize, Never>, Never>::new();
  let seen = Arc::new(Mutex::new(vec![]));
  let c_seen = seen.clone();
  let _c = outer.clone().switch_to_latest().sink(move |v| c_seen.lock().push(v));

  let first = PassthroughSubject::new();
  let second = PassthroughSubject::new();
  outer.send(first.clone());

  let producer = {
    let first = first.clone();
    tokio::spawn(async move {
      for i in 0..100 {
        first.send(i);
        tokio::task::yield_now().await;
      }
    })
  };
  producer.await.unwrap();
  outer.send(second.clone());
  first.send(1000);
  second.send(2000);

  let seen = seen.lock().clone();
  assert_eq!(seen.len(), 101);
  assert_eq!(seen.last(), Some(&2000));
  assert!(!seen.contains(&1000));
  assert_eq!(first.subscriber_count(), 0);
}
