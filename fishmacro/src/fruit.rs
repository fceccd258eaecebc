//! Fruit detection and storage.

use std::time::Duration;

use vision::Color;

use crate::{
	capture::Screen,
	config::{Point, Settings},
	engine::MacroResult,
	input::{self, Input, Key},
	util::timing::{sleep_secs, RunFlag},
};

const INVENTORY_KEY: Key = Key::Char('`');

/// True when the pixel at `point` matches the fruit colour within `tol`.
pub fn check_fruit(screen: &mut dyn Screen, point: Point, color: Color, tol: u8) -> bool {
	let Some(current) = screen.capture_pixel(point) else {
		tracing::debug!(?point, "fruit pixel capture failed");
		return false;
	};
	let is_fruit = vision::color::check_color_match(current, color, tol);
	tracing::debug!(
		?current,
		expected = ?color,
		deviation = current.deviation(color),
		is_fruit,
		"fruit colour check"
	);
	is_fruit
}

/// Store the held fruit: drag it into the inventory, or drop it with backspace.
pub fn store_fruit(input: &mut dyn Input, settings: &Settings, screen: (u32, u32), flag: &RunFlag) -> MacroResult {
	let precast = &settings.precast;
	let advanced = &settings.advanced;

	if let Some(fruit) = precast.fruit_point {
		input::click(input, fruit, Duration::from_millis(100), flag)?;
		sleep_secs(advanced.store_click_delay, flag)?;
	}

	match (precast.store_in_inventory, precast.inventory_fruit_point) {
		(true, Some(from)) => {
			let to = precast
				.inventory_center_point
				.unwrap_or(Point::new(screen.0 as i32 / 2, screen.1 as i32 / 2));
			tracing::info!(?from, ?to, "storing fruit in inventory");
			input::tap(input, INVENTORY_KEY, flag)?;
			sleep_secs(0.5, flag)?;
			input::drag(input, from, to, flag)?;
			sleep_secs(0.4, flag)?;
			input::tap(input, INVENTORY_KEY, flag)?;
			sleep_secs(0.5, flag)
		}
		(store, _) => {
			if store {
				tracing::warn!("inventory storage enabled without an inventory point; dropping fruit");
			}
			input::tap(input, Key::Backspace, flag)?;
			sleep_secs(advanced.backspace_delay, flag)
		}
	}
}
