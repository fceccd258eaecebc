//! Synthetic mouse and keyboard input.
//!
//! [`Input`] is the only way the automation touches the mouse or keyboard. The
//! helpers below compose it into the timed gestures the game needs.

mod device;
pub use device::EnigoInput;
mod window;
pub use window::{focus_window, GAME_WINDOW_TITLE};

use std::time::Duration;

use crate::{
	config::Point,
	engine::MacroResult,
	util::timing::{interruptible_sleep, sleep_uninterruptible, RunFlag},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
	Char(char),
	Shift,
	Backspace,
	Enter,
}

impl Key {
	/// Parse a hotkey setting. The first character wins.
	pub fn from_hotkey(hotkey: &str) -> Option<Self> {
		hotkey.chars().next().map(Self::Char)
	}
}

pub trait Input: Send {
	fn move_to(&mut self, p: Point);
	fn move_relative(&mut self, dx: i32, dy: i32);
	fn left_down(&mut self);
	fn left_up(&mut self);
	fn right_down(&mut self);
	fn right_up(&mut self);
	/// Positive notches zoom in.
	fn scroll(&mut self, notches: i32);
	fn key_down(&mut self, key: Key);
	fn key_up(&mut self, key: Key);
	fn focus_game_window(&mut self) -> bool;
}

const TAP_HOLD: Duration = Duration::from_millis(50);

fn ms(v: u64) -> Duration {
	Duration::from_millis(v)
}

pub fn tap(input: &mut dyn Input, key: Key, flag: &RunFlag) -> MacroResult {
	input.key_down(key);
	let res = interruptible_sleep(TAP_HOLD, flag);
	input.key_up(key);
	res
}

/// Tap a hotkey setting such as `"1"`. Empty hotkeys are skipped.
pub fn tap_hotkey(input: &mut dyn Input, hotkey: &str, flag: &RunFlag) -> MacroResult {
	match Key::from_hotkey(hotkey) {
		Some(key) => tap(input, key, flag),
		None => {
			tracing::warn!("empty hotkey skipped");
			Ok(())
		}
	}
}

/// Move, nudge by one pixel so the game registers the hover, then click.
pub fn click(input: &mut dyn Input, p: Point, hold: Duration, flag: &RunFlag) -> MacroResult {
	input.move_to(p);
	interruptible_sleep(ms(50), flag)?;
	input.move_relative(1, 0);
	interruptible_sleep(ms(50), flag)?;
	input.left_down();
	input.left_up();
	interruptible_sleep(hold, flag)
}

pub fn drag(input: &mut dyn Input, from: Point, to: Point, flag: &RunFlag) -> MacroResult {
	input.move_to(from);
	interruptible_sleep(ms(80), flag)?;
	input.move_relative(1, 0);
	interruptible_sleep(ms(120), flag)?;
	input.left_down();
	interruptible_sleep(ms(200), flag)?;
	input.move_to(to);
	interruptible_sleep(ms(80), flag)?;
	input.move_relative(1, 0);
	interruptible_sleep(ms(300), flag)?;
	input.left_up();
	interruptible_sleep(ms(120), flag)
}

/// Scroll `ticks` notches (negative zooms out), pausing `delay` between them.
pub fn zoom(input: &mut dyn Input, ticks: i32, delay: Duration, flag: &RunFlag) -> MacroResult {
	let step = ticks.signum();
	for _ in 0..ticks.unsigned_abs() {
		input.scroll(step);
		interruptible_sleep(delay, flag)?;
	}
	Ok(())
}

/// [`zoom`] that ignores the run flag, for sequences that must leave the camera restored.
pub fn zoom_uninterruptible(input: &mut dyn Input, ticks: i32, delay: Duration) {
	let step = ticks.signum();
	for _ in 0..ticks.unsigned_abs() {
		input.scroll(step);
		sleep_uninterruptible(delay);
	}
}

/// Drag the camera with the right button, `steps` moves of `dx` pixels.
pub fn rotate_camera(input: &mut dyn Input, steps: u32, dx: i32, step_delay: Duration, flag: &RunFlag) -> MacroResult {
	input.right_down();
	let mut res = Ok(());
	for _ in 0..steps {
		input.move_relative(dx, 0);
		res = interruptible_sleep(step_delay, flag);
		if res.is_err() {
			break;
		}
	}
	input.right_up();
	res
}

/// Tracks the held state of the left button so presses are not re-sent.
#[derive(Debug, Default, Clone, Copy)]
pub struct MouseState {
	held: bool,
}

impl MouseState {
	pub fn is_held(&self) -> bool {
		self.held
	}

	/// Press or release to reach `hold`. Returns true if an event was sent.
	pub fn set(&mut self, input: &mut dyn Input, hold: bool) -> bool {
		if self.held == hold {
			return false;
		}
		self.force(input, hold);
		true
	}

	/// Send the event for `hold` regardless of the tracked state.
	pub fn force(&mut self, input: &mut dyn Input, hold: bool) {
		if hold {
			input.left_down();
		} else {
			input.left_up();
		}
		self.held = hold;
	}

	pub fn release(&mut self, input: &mut dyn Input) {
		self.set(input, false);
	}
}

#[cfg(test)]
pub mod fake {
	use super::*;

	#[derive(Debug, Clone, PartialEq)]
	pub enum Event {
		Move(Point),
		MoveRelative(i32, i32),
		LeftDown,
		LeftUp,
		RightDown,
		RightUp,
		Scroll(i32),
		KeyDown(Key),
		KeyUp(Key),
		Focus,
	}

	/// Records every input event.
	#[derive(Debug, Default)]
	pub struct RecordingInput {
		pub events: Vec<Event>,
	}

	impl RecordingInput {
		pub fn taps(&self) -> Vec<Key> {
			self.events
				.iter()
				.filter_map(|e| match e {
					Event::KeyDown(k) => Some(*k),
					_ => None,
				})
				.collect()
		}

		pub fn count(&self, event: &Event) -> usize {
			self.events.iter().filter(|e| *e == event).count()
		}
	}

	impl Input for RecordingInput {
		fn move_to(&mut self, p: Point) {
			self.events.push(Event::Move(p));
		}
		fn move_relative(&mut self, dx: i32, dy: i32) {
			self.events.push(Event::MoveRelative(dx, dy));
		}
		fn left_down(&mut self) {
			self.events.push(Event::LeftDown);
		}
		fn left_up(&mut self) {
			self.events.push(Event::LeftUp);
		}
		fn right_down(&mut self) {
			self.events.push(Event::RightDown);
		}
		fn right_up(&mut self) {
			self.events.push(Event::RightUp);
		}
		fn scroll(&mut self, notches: i32) {
			self.events.push(Event::Scroll(notches));
		}
		fn key_down(&mut self, key: Key) {
			self.events.push(Event::KeyDown(key));
		}
		fn key_up(&mut self, key: Key) {
			self.events.push(Event::KeyUp(key));
		}
		fn focus_game_window(&mut self) -> bool {
			self.events.push(Event::Focus);
			true
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{fake::*, *};

	fn running() -> RunFlag {
		let flag = RunFlag::new();
		flag.start();
		flag
	}

	#[test]
	fn click_nudges_before_pressing() {
		let mut input = RecordingInput::default();
		click(&mut input, Point::new(10, 20), Duration::ZERO, &running()).unwrap();
		assert_eq!(
			input.events,
			vec![
				Event::Move(Point::new(10, 20)),
				Event::MoveRelative(1, 0),
				Event::LeftDown,
				Event::LeftUp
			]
		);
	}

	#[test]
	fn zoom_sends_one_event_per_tick() {
		let mut input = RecordingInput::default();
		zoom(&mut input, -3, Duration::ZERO, &running()).unwrap();
		assert_eq!(input.count(&Event::Scroll(-1)), 3);
		zoom_uninterruptible(&mut input, 2, Duration::ZERO);
		assert_eq!(input.count(&Event::Scroll(1)), 2);
	}

	#[test]
	fn rotate_releases_button_when_stopped() {
		let mut input = RecordingInput::default();
		let stopped = RunFlag::new();
		assert!(rotate_camera(&mut input, 8, 100, Duration::from_millis(10), &stopped).is_err());
		assert_eq!(input.events.last(), Some(&Event::RightUp));
	}

	#[test]
	fn mouse_state_skips_redundant_events() {
		let mut input = RecordingInput::default();
		let mut mouse = MouseState::default();
		assert!(mouse.set(&mut input, true));
		assert!(!mouse.set(&mut input, true));
		mouse.release(&mut input);
		mouse.release(&mut input);
		assert_eq!(input.events, vec![Event::LeftDown, Event::LeftUp]);
	}

	#[test]
	fn hotkeys_parse_first_char() {
		assert_eq!(Key::from_hotkey("2"), Some(Key::Char('2')));
		assert_eq!(Key::from_hotkey(""), None);
	}
}
