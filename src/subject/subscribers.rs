use smallvec::SmallVec;

/// Subscribers attached to a subject, in attach order.
///
/// Every entry carries an id handed out by [`Subscribers::reserve_id`], so a
/// subscription can detach itself later without holding a reference to its
/// own entry.
pub(crate) struct Subscribers<L> {
  entries: SmallVec<[(usize, L); 2]>,
  next_id: usize,
}

impl<L> Default for Subscribers<L> {
  fn default() -> Self { Self { entries: SmallVec::new(), next_id: 0 } }
}

impl<L> Subscribers<L> {
  /// Allocate the id for an entry that is about to be inserted.
  #[inline]
  pub(crate) fn reserve_id(&mut self) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    id
  }

  #[inline]
  pub(crate) fn insert(&mut self, id: usize, link: L) { self.entries.push((id, link)); }

  pub(crate) fn remove(&mut self, id: usize) -> Option<L> {
    let pos = self.entries.iter().position(|(i, _)| *i == id)?;
    Some(self.entries.remove(pos).1)
  }

  /// Take every entry, leaving the list empty.
  pub(crate) fn drain(&mut self) -> impl Iterator<Item = L> + '_ {
    self.entries.drain(..).map(|(_, link)| link)
  }

  pub(crate) fn iter(&self) -> impl Iterator<Item = &L> + '_ { self.entries.iter().map(|(_, l)| l) }

  #[inline]
  pub(crate) fn len(&self) -> usize { self.entries.len() }

  /// Hand `value` to every entry in order.
  ///
  /// Every entry but the last gets a clone; the last one gets the value
  /// itself.
  pub(crate) fn broadcast<T: Clone>(&self, value: T, mut deliver: impl FnMut(&L, T)) {
    let mut iter = self.iter().peekable();
    while let Some(link) = iter.next() {
      if iter.peek().is_some() {
        deliver(link, value.clone());
      } else {
        deliver(link, value);
        break;
      }
    }
  }
}
