use std::sync::{Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

/// Owns the cancellation handle of the newest search chain.
///
/// Starting a chain for a newer version cancels the previous holder under the same lock, so at
/// most one chain is ever live.
#[derive(Debug, Default)]
pub struct Supersession {
	slot: Mutex<Slot>,
}

#[derive(Debug, Default)]
struct Slot {
	version: u64,
	cancel: Option<CancellationToken>,
}

impl Supersession {
	pub fn new() -> Self {
		Self::default()
	}

	/// Cancels the current holder and installs a token for `version`.
	///
	/// A version that is not newer than the holder's receives a token that is already canceled.
	pub fn start_new(&self, version: u64) -> CancellationToken {
		let mut slot = self.lock();
		let token = CancellationToken::new();

		if version <= slot.version {
			token.cancel();

			return token;
		}
		if let Some(previous) = slot.cancel.take() {
			previous.cancel();
		}

		slot.version = version;
		slot.cancel = Some(token.clone());

		token
	}

	/// Releases the slot if it still belongs to `version`.
	pub fn finish(&self, version: u64) {
		let mut slot = self.lock();

		if slot.version == version {
			slot.cancel = None;
		}
	}

	pub fn cancel_all(&self) {
		if let Some(cancel) = self.lock().cancel.take() {
			cancel.cancel();
		}
	}

	/// Version of the newest chain ever started.
	#[cfg(test)]
	fn version(&self) -> u64 {
		self.lock().version
	}

	pub fn has_live_chain(&self) -> bool {
		self.lock().cancel.is_some()
	}

	fn lock(&self) -> MutexGuard<'_, Slot> {
		self.slot.lock().unwrap_or_else(|err| err.into_inner())
	}
}
