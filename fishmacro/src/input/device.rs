use enigo::{Enigo, KeyboardControllable, MouseButton, MouseControllable};

use super::{Input, Key};
use crate::config::Point;

/// [`Input`] backed by `enigo`.
///
/// A fresh `Enigo` handle is created per event, which keeps this type `Send`
/// on every platform.
#[derive(Debug, Default)]
pub struct EnigoInput;

impl EnigoInput {
	pub fn new() -> Self {
		Self
	}
}

fn enigo_key(key: Key) -> enigo::Key {
	match key {
		Key::Char(c) => enigo::Key::Layout(c),
		Key::Shift => enigo::Key::Shift,
		Key::Backspace => enigo::Key::Backspace,
		Key::Enter => enigo::Key::Return,
	}
}

impl Input for EnigoInput {
	fn move_to(&mut self, p: Point) {
		Enigo::new().mouse_move_to(p.x, p.y);
	}

	fn move_relative(&mut self, dx: i32, dy: i32) {
		Enigo::new().mouse_move_relative(dx, dy);
	}

	fn left_down(&mut self) {
		Enigo::new().mouse_down(MouseButton::Left);
	}

	fn left_up(&mut self) {
		Enigo::new().mouse_up(MouseButton::Left);
	}

	fn right_down(&mut self) {
		Enigo::new().mouse_down(MouseButton::Right);
	}

	fn right_up(&mut self) {
		Enigo::new().mouse_up(MouseButton::Right);
	}

	fn scroll(&mut self, notches: i32) {
		// enigo scrolls down for positive values; wheel-up zooms in.
		Enigo::new().mouse_scroll_y(-notches);
	}

	fn key_down(&mut self, key: Key) {
		Enigo::new().key_down(enigo_key(key));
	}

	fn key_up(&mut self, key: Key) {
		Enigo::new().key_up(enigo_key(key));
	}

	fn focus_game_window(&mut self) -> bool {
		super::focus_window(super::GAME_WINDOW_TITLE)
	}
}
