//! # rxflow: backpressure-aware reactive streams
//!
//! Publishers describe streams, subscribers consume them, and the
//! subscription between the two carries demand: a publisher never sends more
//! values than its subscriber asked for.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxflow::prelude::*;
//!
//! let (recorder, handle) = Recorder::new(Demand::max(2));
//! from_iter(1..=10).map(|v| v * 2).subscribe(recorder);
//! assert_eq!(handle.values(), vec![2, 4]);
//!
//! handle.request(Demand::max(1));
//! assert_eq!(handle.values(), vec![2, 4, 6]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Publisher`] | Stream descriptor; `subscribe` binds a subscriber |
//! | [`Subscriber`] | Receives the subscription, values and one completion |
//! | [`Subscription`] | `request` more values or `cancel` |
//! | [`Demand`] | How many more values a subscriber accepts |
//! | [`PassthroughSubject`] / [`CurrentValueSubject`] | Push values into a stream by hand |
//! | [`AnyCancellable`] / [`CancelBag`] | Explicit, deterministic teardown |
//!
//! ## Threading
//!
//! Everything is `Send + Sync`. Values may be sent from any thread; calls to
//! a single subscriber never overlap and arrive in order. The crate brings no
//! scheduler of its own: values are delivered on whatever thread sends them.
//!
//! ## Feature Flags
//!
//! - **`stream`** (default): [`Publisher::values`] turns a publisher into a
//!   `futures::Stream` that pulls one value per poll.
//!
//! [`Publisher`]: publisher::Publisher
//! [`Publisher::values`]: publisher::Publisher::values
//! [`Subscriber`]: subscriber::Subscriber
//! [`Subscription`]: subscription::Subscription
//! [`Demand`]: demand::Demand
//! [`PassthroughSubject`]: subject::PassthroughSubject
//! [`CurrentValueSubject`]: subject::CurrentValueSubject
//! [`AnyCancellable`]: cancellable::AnyCancellable
//! [`CancelBag`]: cancellable::CancelBag

pub mod cancellable;
pub mod demand;
pub mod error;
pub mod ops;
pub mod prelude;
pub mod publisher;
pub mod subject;
pub mod subscriber;
pub mod subscription;

// Re-export the prelude module
pub use prelude::*;
