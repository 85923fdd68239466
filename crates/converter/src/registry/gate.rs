//! Run-once gate for converter loaders.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::ReentrantMutex;

use crate::error::LoaderError;

#[derive(Default)]
struct GateState {
	/// Set while the loaders run; nested calls from the loading thread pass straight through.
	running: bool,
	failure: Option<LoaderError>,
}

/// Runs the loaders once. A failure is remembered and reported to every later caller
/// until [`LoadGate::reset`].
#[derive(Default)]
pub(crate) struct LoadGate {
	loaded: AtomicBool,
	state: ReentrantMutex<RefCell<GateState>>,
}

impl LoadGate {
	#[inline]
	pub(crate) fn is_loaded(&self) -> bool {
		self.loaded.load(Ordering::Acquire)
	}

	pub(crate) fn run(&self, load: impl FnOnce() -> Result<(), LoaderError>) -> Result<(), LoaderError> {
		if self.is_loaded() {
			return Ok(());
		}

		let guard = self.state.lock();
		{
			let state = guard.borrow();
			if state.running {
				return Ok(());
			}
			if let Some(failure) = &state.failure {
				return Err(failure.clone());
			}
		}
		if self.is_loaded() {
			return Ok(());
		}

		guard.borrow_mut().running = true;
		let outcome = load();
		let mut state = guard.borrow_mut();
		state.running = false;
		match &outcome {
			Ok(()) => self.loaded.store(true, Ordering::Release),
			Err(failure) => state.failure = Some(failure.clone()),
		}
		outcome
	}

	pub(crate) fn reset(&self) {
		let guard = self.state.lock();
		*guard.borrow_mut() = GateState::default();
		self.loaded.store(false, Ordering::Release);
	}
}
