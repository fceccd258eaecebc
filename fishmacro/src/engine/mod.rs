//! Worker lifecycle.
//!
//! The engine owns the worker thread and its state machine. The UI talks to it
//! through non-blocking `start`/`stop` calls and drains [`EngineEvent`]s once per
//! frame.

mod error;
pub use error::{MacroError, MacroResult};
mod state;
pub use state::MacroState;

use std::{
	sync::{
		mpsc::{self, Receiver, Sender},
		Arc, Mutex,
	},
	thread::JoinHandle,
	time::{Duration, Instant},
};

use crate::util::timing::RunFlag;

pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
	StateChanged { from: MacroState, to: MacroState },
	Started,
	Stopped,
	Failed(String),
}

pub type EventReceiver = Receiver<EngineEvent>;

struct Shared {
	state: Mutex<MacroState>,
	events: Sender<EngineEvent>,
}

impl Shared {
	fn state(&self) -> MacroState {
		*self.state.lock().unwrap_or_else(|e| e.into_inner())
	}

	fn transition(&self, to: MacroState) {
		let from = {
			let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
			std::mem::replace(&mut *state, to)
		};
		if from != to {
			tracing::debug!(%from, %to, "engine state");
			let _ = self.events.send(EngineEvent::StateChanged { from, to });
		}
	}

	fn emit(&self, event: EngineEvent) {
		let _ = self.events.send(event);
	}
}

pub struct Engine {
	shared: Arc<Shared>,
	flag: RunFlag,
	worker: Option<JoinHandle<()>>,
	done: Option<Receiver<()>>,
	started_at: Option<Instant>,
}

impl Engine {
	pub fn new() -> (Self, EventReceiver) {
		let (tx, rx) = mpsc::channel();
		let engine = Self {
			shared: Arc::new(Shared {
				state: Mutex::new(MacroState::Stopped),
				events: tx,
			}),
			flag: RunFlag::new(),
			worker: None,
			done: None,
			started_at: None,
		};
		(engine, rx)
	}

	pub fn state(&self) -> MacroState {
		self.shared.state()
	}

	pub fn is_running(&self) -> bool {
		self.flag.is_running() && self.state() == MacroState::Running
	}

	pub fn uptime(&self) -> Duration {
		self.started_at.map(|t| t.elapsed()).unwrap_or_default()
	}

	pub fn run_flag(&self) -> RunFlag {
		self.flag.clone()
	}

	/// Spawn `worker` on a background thread. Returns false if already active.
	pub fn start<F>(&mut self, worker: F) -> bool
	where
		F: FnOnce(RunFlag) -> MacroResult + Send + 'static,
	{
		let state = self.state();
		if !state.can_start() {
			tracing::warn!(%state, "start ignored");
			return false;
		}

		self.reap();
		self.shared.transition(MacroState::Starting);
		self.flag.start();
		// Running is published before the worker exists, so its own Error always comes later.
		self.shared.transition(MacroState::Running);
		self.shared.emit(EngineEvent::Started);
		self.started_at = Some(Instant::now());

		let flag = self.flag.clone();
		let shared = self.shared.clone();
		let (done_tx, done_rx) = mpsc::channel();
		let spawned = std::thread::Builder::new()
			.name("fishmacro-worker".into())
			.spawn(move || {
				let result = worker(flag.clone());
				match result {
					Ok(()) | Err(MacroError::Stopped) => {
						tracing::info!("worker finished");
					}
					Err(err) => {
						tracing::error!(error = %err, "worker failed");
						flag.stop();
						shared.transition(MacroState::Error);
						shared.emit(EngineEvent::Failed(err.to_string()));
					}
				}
				let _ = done_tx.send(());
			});

		match spawned {
			Ok(handle) => {
				self.worker = Some(handle);
				self.done = Some(done_rx);
			}
			Err(err) => {
				tracing::error!(error = %err, "failed to spawn worker");
				self.flag.stop();
				self.started_at = None;
				self.shared.transition(MacroState::Error);
				self.shared
					.emit(EngineEvent::Failed(MacroError::Thread(err.to_string()).to_string()));
				return false;
			}
		}

		tracing::info!("engine started");
		true
	}

	/// Clear the run flag and wait up to `timeout` for the worker.
	///
	/// Returns false only when the worker did not finish in time; it is then
	/// detached.
	pub fn stop(&mut self, timeout: Duration) -> bool {
		if !self.state().can_stop() {
			return true;
		}

		self.shared.transition(MacroState::Stopping);
		self.flag.stop();

		let finished = match &self.done {
			Some(done) => !matches!(done.recv_timeout(timeout), Err(mpsc::RecvTimeoutError::Timeout)),
			None => true,
		};

		if finished {
			if let Some(handle) = self.worker.take() {
				let _ = handle.join();
			}
		} else {
			tracing::warn!(timeout_ms = timeout.as_millis() as u64, "worker did not stop in time; detaching");
			self.worker = None;
		}
		self.done = None;
		self.started_at = None;

		self.shared.transition(MacroState::Stopped);
		self.shared.emit(EngineEvent::Stopped);
		tracing::info!("engine stopped");
		finished
	}

	pub fn pause(&mut self) -> bool {
		tracing::warn!("pause is not supported");
		false
	}

	pub fn resume(&mut self) -> bool {
		tracing::warn!("resume is not supported");
		false
	}

	/// Join a worker that already exited on its own (after an error).
	fn reap(&mut self) {
		if let Some(handle) = self.worker.take()
			&& handle.is_finished()
		{
			let _ = handle.join();
		}
		self.done = None;
	}
}

impl Drop for Engine {
	fn drop(&mut self) {
		self.stop(DEFAULT_STOP_TIMEOUT);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::util::timing::interruptible_sleep;

	fn drain(rx: &EventReceiver) -> Vec<EngineEvent> {
		rx.try_iter().collect()
	}

	#[test]
	fn start_then_stop() {
		let (mut engine, rx) = Engine::new();
		assert!(engine.start(|flag| {
			while flag.is_running() {
				interruptible_sleep(Duration::from_millis(10), &flag)?;
			}
			Ok(())
		}));
		assert!(engine.is_running());
		assert!(!engine.start(|_| Ok(())));

		assert!(engine.stop(Duration::from_secs(2)));
		assert_eq!(engine.state(), MacroState::Stopped);
		assert_eq!(engine.uptime(), Duration::ZERO);

		let events = drain(&rx);
		assert!(events.contains(&EngineEvent::Started));
		assert_eq!(events.last(), Some(&EngineEvent::Stopped));
	}

	#[test]
	fn stop_when_idle_is_noop() {
		let (mut engine, rx) = Engine::new();
		assert!(engine.stop(DEFAULT_STOP_TIMEOUT));
		assert!(drain(&rx).is_empty());
	}

	#[test]
	fn worker_error_moves_to_error_state() {
		let (mut engine, rx) = Engine::new();
		assert!(engine.start(|_| Err(MacroError::Capture("no monitor".into()))));

		let failed = rx
			.iter()
			.find(|e| matches!(e, EngineEvent::Failed(_)))
			.unwrap();
		assert_eq!(failed, EngineEvent::Failed("screen capture failed: no monitor".into()));

		// Give the worker a moment to finish its bookkeeping.
		std::thread::sleep(Duration::from_millis(20));
		assert_eq!(engine.state(), MacroState::Error);
		assert!(!engine.run_flag().is_running());

		// Error allows a restart.
		assert!(engine.start(|_| Ok(())));
		engine.stop(Duration::from_secs(1));
	}

	#[test]
	fn failure_is_reported_after_start() {
		for _ in 0..20 {
			let (mut engine, rx) = Engine::new();
			assert!(engine.start(|_| Err(MacroError::Capture("gone".into()))));
			let events = rx
				.iter()
				.take_while(|e| !matches!(e, EngineEvent::Failed(_)))
				.collect::<Vec<_>>();
			assert!(events.contains(&EngineEvent::Started), "{events:?}");
			assert!(!events.contains(&EngineEvent::StateChanged {
				from: MacroState::Error,
				to: MacroState::Running
			}));
			std::thread::sleep(Duration::from_millis(20));
			assert_eq!(engine.state(), MacroState::Error);
		}
	}

	#[test]
	fn stop_times_out_on_stuck_worker() {
		let (mut engine, _rx) = Engine::new();
		engine.start(|_| {
			std::thread::sleep(Duration::from_millis(300));
			Ok(())
		});
		assert!(!engine.stop(Duration::from_millis(20)));
		assert_eq!(engine.state(), MacroState::Stopped);
	}

	#[test]
	fn pause_is_unsupported() {
		let (mut engine, _rx) = Engine::new();
		assert!(!engine.pause());
		assert!(!engine.resume());
	}
}
