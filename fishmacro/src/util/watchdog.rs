//! Freeze detection for the worker thread.
//!
//! The fishing loop calls [`Watchdog::heartbeat`]; a monitor thread warns when
//! heartbeats stop arriving while the run flag is set.

use std::{
	sync::{Arc, Condvar, Mutex},
	thread::JoinHandle,
	time::{Duration, Instant},
};

use super::timing::RunFlag;

#[derive(Debug)]
struct Beat {
	last: Instant,
	activity: String,
	frozen_since: Option<Instant>,
	shutdown: bool,
}

type Shared = Arc<(Mutex<Beat>, Condvar)>;

pub struct Watchdog {
	shared: Shared,
	handle: Option<JoinHandle<()>>,
}

impl Watchdog {
	pub const DEFAULT_THRESHOLD: Duration = Duration::from_secs(3);
	pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

	pub fn start(name: &str, flag: RunFlag, freeze_threshold: Duration, check_interval: Duration) -> Self {
		let shared: Shared = Arc::new((
			Mutex::new(Beat {
				last: Instant::now(),
				activity: String::from("starting"),
				frozen_since: None,
				shutdown: false,
			}),
			Condvar::new(),
		));

		let thread_shared = shared.clone();
		let name = name.to_string();
		let handle = std::thread::Builder::new()
			.name(format!("{name}-watchdog"))
			.spawn(move || monitor(&name, &thread_shared, &flag, freeze_threshold, check_interval));
		let handle = match handle {
			Ok(handle) => Some(handle),
			Err(err) => {
				tracing::warn!(error = %err, "failed to spawn watchdog thread");
				None
			}
		};

		Self { shared, handle }
	}

	pub fn heartbeat(&self) {
		let mut beat = lock(&self.shared);
		let now = Instant::now();
		if let Some(since) = beat.frozen_since.take() {
			tracing::info!(
				activity = %beat.activity,
				frozen_for_ms = now.duration_since(since).as_millis() as u64,
				"watchdog: recovered from freeze"
			);
		}
		beat.last = now;
	}

	pub fn set_activity(&self, activity: &str) {
		let mut beat = lock(&self.shared);
		activity.clone_into(&mut beat.activity);
	}

	pub fn stop(&mut self) {
		lock(&self.shared).shutdown = true;
		self.shared.1.notify_all();
		if let Some(handle) = self.handle.take() {
			let _ = handle.join();
		}
	}
}

impl Drop for Watchdog {
	fn drop(&mut self) {
		self.stop();
	}
}

fn lock(shared: &Shared) -> std::sync::MutexGuard<'_, Beat> {
	shared.0.lock().unwrap_or_else(|e| e.into_inner())
}

fn monitor(name: &str, shared: &Shared, flag: &RunFlag, threshold: Duration, interval: Duration) {
	let (mutex, cv) = &**shared;
	let mut beat = mutex.lock().unwrap_or_else(|e| e.into_inner());
	loop {
		let (guard, _) = cv
			.wait_timeout(beat, interval)
			.unwrap_or_else(|e| e.into_inner());
		beat = guard;
		if beat.shutdown {
			return;
		}
		if !flag.is_running() || beat.frozen_since.is_some() {
			continue;
		}
		let idle = beat.last.elapsed();
		if idle > threshold {
			tracing::warn!(
				watchdog = name,
				activity = %beat.activity,
				idle_ms = idle.as_millis() as u64,
				"watchdog: freeze detected"
			);
			beat.frozen_since = Some(beat.last);
		}
	}
}
