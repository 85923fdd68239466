//! Copy-on-write ordered lists.
//!
//! # Role
//!
//! Backs the fallback chain and the bulk converter sets. Readers iterate a pinned
//! snapshot; writers clone the list, edit the clone, and publish it with a CAS loop.
//!
//! # Invariants
//!
//! - A reader never observes a partially edited list.
//! - Concurrent writers never lose each other's edits (see `invariants::test_fallback_chain_no_lost_updates`).

use std::sync::Arc;

use arc_swap::ArcSwap;

pub(crate) struct CowList<T> {
	snap: ArcSwap<Vec<T>>,
}

impl<T: Clone> CowList<T> {
	pub(crate) fn new() -> Self {
		Self {
			snap: ArcSwap::from_pointee(Vec::new()),
		}
	}

	/// Returns the current list. Later writes do not affect the returned snapshot.
	#[inline]
	pub(crate) fn load(&self) -> Arc<Vec<T>> {
		self.snap.load_full()
	}

	pub(crate) fn len(&self) -> usize {
		self.snap.load().len()
	}

	/// Applies `edit` to a copy of the list and publishes it. `edit` returning false
	/// abandons the write.
	pub(crate) fn update(&self, mut edit: impl FnMut(&mut Vec<T>) -> bool) -> bool {
		loop {
			let cur = self.snap.load_full();
			let mut next = Vec::with_capacity(cur.len() + 1);
			next.extend(cur.iter().cloned());
			if !edit(&mut next) {
				return false;
			}
			let prev = self.snap.compare_and_swap(&cur, Arc::new(next));
			if Arc::ptr_eq(&prev, &cur) {
				return true;
			}
		}
	}

	pub(crate) fn push_front(&self, item: T) {
		self.update(|list| {
			list.insert(0, item.clone());
			true
		});
	}

	pub(crate) fn replace_all(&self, items: Vec<T>) {
		self.snap.store(Arc::new(items));
	}
}
