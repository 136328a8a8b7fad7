use std::{
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
	time::Duration,
};

use tokio::{
	sync::{OwnedSemaphorePermit, Semaphore},
	time,
};
use tokio_util::sync::CancellationToken;

use crate::version::VersionCounter;

#[derive(Debug)]
pub enum Admission {
	Admitted(GatePermit),
	/// The previous search did not vacate the gate in time.
	TimedOut,
	/// The gate was acquired but a newer query exists; the permit was released.
	Stale,
	/// The wait was abandoned because the chain was superseded.
	Canceled,
}

/// Single-flight admission control. At most one search holds the gate at any time.
#[derive(Debug, Clone)]
pub struct SearchGate {
	permits: Arc<Semaphore>,
	active: Arc<AtomicU64>,
}

/// Proof of admission. Dropping it, on any path, frees the gate.
#[derive(Debug)]
pub struct GatePermit {
	version: u64,
	active: Arc<AtomicU64>,
	_permit: OwnedSemaphorePermit,
}

impl SearchGate {
	pub fn new() -> Self {
		Self { permits: Arc::new(Semaphore::new(1)), active: Arc::new(AtomicU64::new(0)) }
	}

	pub async fn admit(
		&self,
		version: u64,
		timeout: Duration,
		versions: &VersionCounter,
		cancel: &CancellationToken,
	) -> Admission {
		let acquire = time::timeout(timeout, self.permits.clone().acquire_owned());
		let permit = tokio::select! {
			biased;
			_ = cancel.cancelled() => return Admission::Canceled,
			acquired = acquire => match acquired {
				Ok(Ok(permit)) => permit,
				// The semaphore is never closed; treat it like a shutdown.
				Ok(Err(_)) => return Admission::Canceled,
				Err(_) => return Admission::TimedOut,
			},
		};

		if cancel.is_cancelled() {
			return Admission::Canceled;
		}
		if !versions.is_current(version) {
			return Admission::Stale;
		}

		self.active.store(version, Ordering::SeqCst);

		Admission::Admitted(GatePermit { version, active: self.active.clone(), _permit: permit })
	}

	/// Version of the search currently holding the gate.
	pub fn active_version(&self) -> Option<u64> {
		match self.active.load(Ordering::SeqCst) {
			0 => None,
			version => Some(version),
		}
	}

	#[cfg(test)]
	fn is_idle(&self) -> bool {
		self.permits.available_permits() == 1
	}
}
impl Default for SearchGate {
	fn default() -> Self {
		Self::new()
	}
}

impl GatePermit {
	pub fn version(&self) -> u64 {
		self.version
	}
}
impl Drop for GatePermit {
	fn drop(&mut self) {
		let _ = self.active.compare_exchange(self.version, 0, Ordering::SeqCst, Ordering::SeqCst);
	}
}
