use std::{
  collections::VecDeque,
  pin::Pin,
  sync::Arc,
  task::{Context, Poll, Waker},
};

use futures::Stream;
use parking_lot::Mutex;

use super::Publisher;
use crate::{
  cancellable::Cancellable,
  demand::Demand,
  subscriber::{Completion, Subscriber},
  subscription::{AnySubscription, Subscription},
};

struct ValuesState<T, F> {
  subscription: Option<AnySubscription>,
  items: VecDeque<T>,
  completion: Option<Completion<F>>,
  waker: Option<Waker>,
  requested: bool,
  done: bool,
}

impl<T, F> ValuesState<T, F> {
  fn wake(&mut self) {
    if let Some(waker) = self.waker.take() {
      waker.wake();
    }
  }
}

/// A publisher consumed as an async [`Stream`].
///
/// Every poll that finds nothing buffered requests exactly one value, so the
/// upstream never produces more than the consumer pulls. A failure is yielded
/// as the last `Err` item. Dropping the stream cancels the subscription.
///
/// ```rust
/// use futures::{executor::block_on, StreamExt};
/// use rxflow::prelude::*;
///
/// let values: Vec<_> = block_on(from_iter(1..=3).values().collect());
/// assert_eq!(values, vec![Ok(1), Ok(2), Ok(3)]);
/// ```
pub struct Values<T, F> {
  state: Arc<Mutex<ValuesState<T, F>>>,
}

impl<T, F> Values<T, F>
where
  T: Send + 'static,
  F: Send + 'static,
{
  pub(crate) fn new<P>(publisher: P) -> Self
  where
    P: Publisher<Output = T, Failure = F>,
  {
    let state = Arc::new(Mutex::new(ValuesState {
      subscription: None,
      items: VecDeque::new(),
      completion: None,
      waker: None,
      requested: false,
      done: false,
    }));
    publisher.subscribe(ValuesSubscriber { state: state.clone() });
    Self { state }
  }
}

impl<T, F> Stream for Values<T, F> {
  type Item = Result<T, F>;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    loop {
      let mut state = self.state.lock();
      if let Some(item) = state.items.pop_front() {
        state.requested = false;
        return Poll::Ready(Some(Ok(item)));
      }
      if let Some(completion) = state.completion.take() {
        state.done = true;
        state.subscription = None;
        return match completion {
          Completion::Finished => Poll::Ready(None),
          Completion::Failed(err) => Poll::Ready(Some(Err(err))),
        };
      }
      if state.done {
        return Poll::Ready(None);
      }
      state.waker = Some(cx.waker().clone());
      let subscription = match &state.subscription {
        Some(subscription) if !state.requested => subscription.clone(),
        _ => return Poll::Pending,
      };
      state.requested = true;
      drop(state);
      subscription.request(Demand::max(1));
    }
  }
}

impl<T, F> Drop for Values<T, F> {
  fn drop(&mut self) {
    let subscription = {
      let mut state = self.state.lock();
      state.done = true;
      state.subscription.take()
    };
    if let Some(subscription) = subscription {
      subscription.cancel();
    }
  }
}

struct ValuesSubscriber<T, F> {
  state: Arc<Mutex<ValuesState<T, F>>>,
}

impl<T, F> Subscriber<T, F> for ValuesSubscriber<T, F>
where
  T: Send + 'static,
  F: Send + 'static,
{
  fn receive_subscription(&mut self, subscription: AnySubscription) {
    let mut state = self.state.lock();
    if state.done {
      drop(state);
      subscription.cancel();
    } else {
      state.subscription = Some(subscription);
      state.wake();
    }
  }

  fn receive(&mut self, input: T) -> Demand {
    let mut state = self.state.lock();
    state.items.push_back(input);
    state.wake();
    Demand::none()
  }

  fn receive_completion(self, completion: Completion<F>) {
    let mut state = self.state.lock();
    state.subscription = None;
    state.completion = Some(completion);
    state.wake();
  }
}

#[cfg(test)]
mod tests {
  use futures::{executor::block_on, StreamExt};

  use crate::prelude::*;

  #[test]
  fn failure_is_the_last_item() {
    let values: Vec<_> = block_on(Sequence::failing(vec![1, 2], "boom").values().collect());
    assert_eq!(values, vec![Ok(1), Ok(2), Err("boom")]);
  }

  #[test]
  fn pulls_one_value_per_poll() {
    block_on(async {
      let mut stream = from_iter(0..).values();
      assert_eq!(stream.next().await, Some(Ok(0)));
      assert_eq!(stream.next().await, Some(Ok(1)));
    });
  }

  #[tokio::test]
  async fn receives_values_sent_from_another_task() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let mut stream = subject.clone().values();

    let sender = subject.clone();
    let producer = tokio::spawn(async move {
      let mut sent = 0;
      while sent < 3 {
        if sender.subscriber_count() > 0 {
          sender.send(sent);
          sent += 1;
        }
        tokio::task::yield_now().await;
      }
      sender.send_completion(Completion::Finished);
    });

    let mut received = vec![];
    while let Some(Ok(v)) = stream.next().await {
      received.push(v);
    }
    producer.await.unwrap();
    assert!(received.len() <= 3);
    assert!(received.windows(2).all(|w| w[0] < w[1]));
  }

  #[test]
  fn dropping_the_stream_cancels() {
    let subject = PassthroughSubject::<i32, Never>::new();
    let stream = subject.clone().values();
    assert_eq!(subject.subscriber_count(), 1);
    drop(stream);
    assert_eq!(subject.subscriber_count(), 0);
  }
}
