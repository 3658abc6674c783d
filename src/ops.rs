//! Operators: publishers built on top of other publishers.
//!
//! Operators are reached through the provided methods of
//! [`Publisher`](crate::publisher::Publisher); the types here are what those
//! methods return.

pub mod map;
pub mod switch_to_latest;
pub mod zip;

pub use map::Map;
pub use switch_to_latest::SwitchToLatest;
pub use zip::Zip;

use crate::publisher::Publisher;

/// Three-way zip, realised as `zip(zip(a, b), c)` followed by a flattening
/// map.
pub type Zip3<A, B, C> = Map<
  Zip<Zip<A, B>, C>,
  fn(
    ((<A as Publisher>::Output, <B as Publisher>::Output), <C as Publisher>::Output),
  ) -> (<A as Publisher>::Output, <B as Publisher>::Output, <C as Publisher>::Output),
>;

/// `map` followed by `switch_to_latest`.
pub type FlatMapLatest<P, F> = SwitchToLatest<Map<P, F>>;

fn flatten3<A, B, C>(((a, b), c): ((A, B), C)) -> (A, B, C) { (a, b, c) }

pub(crate) fn zip3<A, B, C>(a: A, b: B, c: C) -> Zip3<A, B, C>
where
  A: Publisher,
  B: Publisher<Failure = A::Failure>,
  C: Publisher<Failure = A::Failure>,
{
  Map::new(Zip::new(Zip::new(a, b), c), flatten3 as fn(_) -> _)
}
