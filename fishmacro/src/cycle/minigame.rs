use std::time::{Duration, Instant};

use vision::{
	antimacro,
	minigame::{self, BarReading},
};

use super::{secs, FishingCycle};
use crate::{
	config::Area,
	engine::MacroResult,
	input,
	util::timing::{interruptible_sleep, sleep_secs, RunFlag},
};

const FRAME_BUDGET: Duration = Duration::from_micros(16_667);
const RESEND_EVERY: Duration = Duration::from_millis(500);
/// Lost frames tolerated with the last mouse state before releasing.
const LOST_FRAMES_BEFORE_RELEASE: u32 = 3;

impl FishingCycle {
	/// Watch `area` until the minigame shows up. False on timeout or an anti-macro screen.
	pub fn wait_for_minigame(&mut self, area: Area, flag: &RunFlag) -> MacroResult<bool> {
		let timeout = secs(self.settings.casting.recast_timeout);
		let poll = secs(self.settings.advanced.fruit_detection_delay.max(0.05));
		let started = Instant::now();
		let mut frame = 0u64;

		while started.elapsed() < timeout {
			flag.check()?;
			frame += 1;
			if frame % 3 != 0 {
				interruptible_sleep(Duration::from_millis(30), flag)?;
				continue;
			}
			self.heartbeat();

			if let Some(image) = self.screen.capture_area(area, false) {
				if antimacro::is_black_screen(&image, antimacro::DEFAULT_BLACK_THRESHOLD) {
					tracing::warn!("anti-macro screen while waiting for the minigame");
					self.handle_anti_macro(area, flag)?;
					return Ok(false);
				}
				if minigame::minigame_visible(&image) {
					tracing::debug!(waited_ms = started.elapsed().as_millis() as u64, "minigame detected");
					return Ok(true);
				}
			}
			interruptible_sleep(poll, flag)?;
		}

		tracing::info!(timeout_s = timeout.as_secs_f64(), "no minigame before the recast timeout");
		Ok(false)
	}

	/// Process one minigame frame. False once the bar is gone.
	pub fn fish_minigame(&mut self, area: Area, auto_craft: bool, flag: &RunFlag) -> MacroResult<bool> {
		flag.check()?;
		let frame_started = Instant::now();

		let Some(image) = self.screen.capture_area(area, false) else {
			tracing::debug!("minigame capture failed");
			self.pace_frame(frame_started, auto_craft, flag)?;
			return Ok(true);
		};

		match minigame::analyze_bar(&image) {
			BarReading::NoBar => {
				self.mouse.release(&mut *self.input);
				self.pd.reset();
				self.lost_frames = 0;
				if auto_craft {
					// The auto-craft sequence counts the catch after its fruit check.
				} else if self.first_catch {
					self.first_catch = false;
					tracing::debug!("first catch of the session not counted");
				} else {
					self.count_fish();
					self.end_cycle_timer();
				}
				return Ok(false);
			}
			BarReading::NoFrame { .. } => {}
			BarReading::NoWhite { .. } => {
				self.mouse.set(&mut *self.input, true);
				self.pd.reset_error();
			}
			BarReading::Lost { .. } if auto_craft => {
				self.mouse.set(&mut *self.input, true);
				self.pd.reset_error();
			}
			BarReading::Lost { .. } => {
				self.lost_frames += 1;
				if self.lost_frames > LOST_FRAMES_BEFORE_RELEASE {
					self.mouse.set(&mut *self.input, false);
					self.pd.reset_error();
				}
			}
			BarReading::Tracked { error, .. } => {
				self.lost_frames = 0;
				let now = Instant::now();
				if let Some(out) = self.pd.update(error as f64, now)
					&& self.mouse.set(&mut *self.input, out.hold)
				{
					self.last_resend = now;
				}
				if now.duration_since(self.last_resend) >= RESEND_EVERY {
					let held = self.mouse.is_held();
					self.mouse.force(&mut *self.input, held);
					self.last_resend = now;
				}
			}
		}

		self.pace_frame(frame_started, auto_craft, flag)?;
		Ok(true)
	}

	fn pace_frame(&mut self, frame_started: Instant, auto_craft: bool, flag: &RunFlag) -> MacroResult {
		self.fps_frames += 1;
		let since = self.fps_since.elapsed();
		if since >= Duration::from_secs(1) {
			self.counters.set_fps(self.fps_frames as f32 / since.as_secs_f32());
			self.fps_frames = 0;
			self.fps_since = Instant::now();
		}
		self.heartbeat();

		let floor = if auto_craft {
			secs(self.settings.advanced.fruit_detection_delay)
		} else {
			Duration::from_millis(1)
		};
		let wait = FRAME_BUDGET.saturating_sub(frame_started.elapsed()).max(floor);
		interruptible_sleep(wait, flag)
	}

	/// Run [`Self::handle_anti_macro`] if `area` is currently black.
	pub(super) fn check_anti_macro(&mut self, area: Area, flag: &RunFlag) -> MacroResult {
		let black = self
			.screen
			.capture_area(area, false)
			.is_some_and(|image| antimacro::is_black_screen(&image, antimacro::DEFAULT_BLACK_THRESHOLD));
		if black {
			self.handle_anti_macro(area, flag)?;
		}
		Ok(())
	}

	/// Tap the deselect hotkey until the black overlay clears.
	pub fn handle_anti_macro(&mut self, area: Area, flag: &RunFlag) -> MacroResult<bool> {
		self.activity("anti-macro");
		let mut taps = 0u32;
		loop {
			flag.check()?;
			self.heartbeat();
			let black = match self.screen.capture_area(area, false) {
				Some(image) => antimacro::is_black_screen(&image, antimacro::DEFAULT_BLACK_THRESHOLD),
				None => true,
			};
			if !black {
				if taps > 0 {
					tracing::info!(taps, "anti-macro screen cleared");
				}
				sleep_secs(0.5, flag)?;
				return Ok(true);
			}
			taps += 1;
			input::tap_hotkey(&mut *self.input, &self.settings.hotkeys.everything_else, flag)?;
			sleep_secs(0.25, flag)?;
		}
	}
}
