use std::{
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc,
	},
	time::{Duration, Instant},
};

use crate::engine::{MacroError, MacroResult};

const SLICE: Duration = Duration::from_millis(100);

/// Shared running/paused flags checked by every wait in the cycle.
#[derive(Debug, Clone, Default)]
pub struct RunFlag {
	running: Arc<AtomicBool>,
	paused: Arc<AtomicBool>,
}

impl RunFlag {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn is_running(&self) -> bool {
		self.running.load(Ordering::SeqCst)
	}

	pub fn is_paused(&self) -> bool {
		self.paused.load(Ordering::SeqCst)
	}

	pub fn start(&self) {
		self.paused.store(false, Ordering::SeqCst);
		self.running.store(true, Ordering::SeqCst);
	}

	pub fn stop(&self) {
		self.running.store(false, Ordering::SeqCst);
	}

	pub fn set_paused(&self, paused: bool) {
		self.paused.store(paused, Ordering::SeqCst);
	}

	/// `Err(Stopped)` once the flag is cleared.
	pub fn check(&self) -> MacroResult {
		if self.is_running() { Ok(()) } else { Err(MacroError::Stopped) }
	}
}

/// Sleep for `dur`, waking every 100 ms to check the flag.
pub fn interruptible_sleep(dur: Duration, flag: &RunFlag) -> MacroResult {
	let end = Instant::now() + dur;
	loop {
		flag.check()?;
		let now = Instant::now();
		if now >= end {
			return Ok(());
		}
		std::thread::sleep((end - now).min(SLICE));
	}
}

/// Longest delay a setting can ask for.
pub const MAX_SETTING_SECS: f64 = 3600.0;

/// Seconds from settings as a [`Duration`]: negative and NaN become zero, anything
/// larger (including infinity) is capped at [`MAX_SETTING_SECS`].
pub fn secs(v: f64) -> Duration {
	if v.is_nan() {
		return Duration::ZERO;
	}
	Duration::from_secs_f64(v.clamp(0.0, MAX_SETTING_SECS))
}

/// [`interruptible_sleep`] for a duration in seconds, see [`secs`].
pub fn sleep_secs(secs: f64, flag: &RunFlag) -> MacroResult {
	interruptible_sleep(self::secs(secs), flag)
}

/// Block while paused.
pub fn wait_while_paused(flag: &RunFlag) -> MacroResult {
	while flag.is_paused() {
		flag.check()?;
		std::thread::sleep(SLICE);
	}
	flag.check()
}

/// Plain sleep for sequences that must complete once started.
pub fn sleep_uninterruptible(dur: Duration) {
	std::thread::sleep(dur);
}
