//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Cancellation
pub use crate::cancellable::{AnyCancellable, CancelBag, Cancellable};
// Demand and contract errors
pub use crate::demand::Demand;
pub use crate::error::ContractViolation;
// Operators
pub use crate::ops::{FlatMapLatest, Map, SwitchToLatest, Zip, Zip3};
// Publishers
#[cfg(feature = "stream")]
pub use crate::publisher::Values;
pub use crate::publisher::{
  empty, fail, from_iter, just, AnyPublisher, DynPublisher, Publisher, Sequence,
};
// Subjects
pub use crate::subject::{CurrentValueSubject, OverflowPolicy, PassthroughSubject, SubjectConfig};
// Subscribers
pub use crate::subscriber::{
  AnySubscriber, Assign, Completion, DynSubscriber, Event, Never, Recorder, RecorderHandle, Sink,
  Subscriber,
};
// Subscription
pub use crate::subscription::{AnySubscription, Subscription, SubscriptionState};
