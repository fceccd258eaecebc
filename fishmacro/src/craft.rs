//! Bait crafting sequence for auto-craft mode.

use std::time::Duration;

use crate::{
	config::{Point, Settings},
	engine::MacroResult,
	input::{self, Input},
	util::timing::{sleep_secs, RunFlag},
};

/// The game refuses to hold more than this many of one bait.
pub const MAX_CRAFT_QUANTITY: u32 = 280;

const CLICK_HOLD: Duration = Duration::from_millis(100);

fn capped(quantity: u32) -> u32 {
	quantity.min(MAX_CRAFT_QUANTITY)
}

#[derive(Debug, Default)]
pub struct CraftAutomation {
	runs: u64,
}

impl CraftAutomation {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn runs(&self) -> u64 {
		self.runs
	}

	/// Open the craft menu and craft each configured bait, common first.
	///
	/// Returns `Ok(false)` when the craft, plus or fish-icon buttons are not set.
	pub fn run(&mut self, input: &mut dyn Input, settings: &Settings, flag: &RunFlag) -> MacroResult<bool> {
		let craft = &settings.auto_craft;
		let (Some(craft_button), Some(plus), Some(fish_icon)) = (craft.craft_button, craft.plus_button, craft.fish_icon)
		else {
			tracing::warn!("craft buttons are not configured; skipping craft");
			return Ok(false);
		};

		input::tap_hotkey(input, &settings.hotkeys.rod, flag)?;
		sleep_secs(0.3, flag)?;
		sleep_secs(craft.craft_menu_delay, flag)?;

		let queue: [(&str, Option<Point>, u32); 3] = [
			("common", craft.common_bait, craft.common_quantity),
			("rare", craft.rare_bait, craft.rare_quantity),
			("legendary", craft.legendary_bait, craft.legendary_quantity),
		];

		for (name, bait, quantity) in queue {
			flag.check()?;
			let Some(bait) = bait else { continue };
			if quantity == 0 {
				continue;
			}
			let quantity = capped(quantity);

			tracing::info!(bait = name, quantity, "crafting");
			for p in [bait, plus, fish_icon] {
				input::click(input, p, CLICK_HOLD, flag)?;
				sleep_secs(craft.craft_click_speed, flag)?;
			}
			for _ in 0..quantity {
				input::click(input, craft_button, CLICK_HOLD, flag)?;
				sleep_secs(craft.craft_click_speed, flag)?;
			}
		}

		self.runs += 1;
		Ok(true)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::input::fake::{Event, RecordingInput};

	fn settings() -> Settings {
		let mut s = Settings::default();
		s.auto_craft.craft_menu_delay = 0.0;
		s.auto_craft.craft_click_speed = 0.0;
		s.auto_craft.craft_button = Some(Point::new(100, 100));
		s.auto_craft.plus_button = Some(Point::new(200, 200));
		s.auto_craft.fish_icon = Some(Point::new(300, 300));
		s
	}

	fn running() -> RunFlag {
		let flag = RunFlag::new();
		flag.start();
		flag
	}

	#[test]
	fn missing_buttons_skip_craft() {
		let mut input = RecordingInput::default();
		let mut craft = CraftAutomation::new();
		let ok = craft.run(&mut input, &Settings::default(), &running()).unwrap();
		assert!(!ok);
		assert!(input.events.is_empty());
	}

	#[test]
	fn crafts_configured_baits_in_order() {
		let mut s = settings();
		s.auto_craft.common_bait = Some(Point::new(1, 1));
		s.auto_craft.common_quantity = 2;
		s.auto_craft.legendary_bait = Some(Point::new(3, 3));
		s.auto_craft.legendary_quantity = 1;
		// Rare has no coordinates and is skipped.
		s.auto_craft.rare_quantity = 5;

		let mut input = RecordingInput::default();
		let mut craft = CraftAutomation::new();
		assert!(craft.run(&mut input, &s, &running()).unwrap());
		assert_eq!(craft.runs(), 1);

		let moves = input
			.events
			.iter()
			.filter_map(|e| match e {
				Event::Move(p) => Some(*p),
				_ => None,
			})
			.collect::<Vec<_>>();
		assert_eq!(
			moves,
			vec![
				Point::new(1, 1),
				Point::new(200, 200),
				Point::new(300, 300),
				Point::new(100, 100),
				Point::new(100, 100),
				Point::new(3, 3),
				Point::new(200, 200),
				Point::new(300, 300),
				Point::new(100, 100),
			]
		);
		assert_eq!(input.taps().first(), Some(&crate::input::Key::Char('1')));
	}

	#[test]
	fn quantity_is_capped() {
		assert_eq!(capped(1000), MAX_CRAFT_QUANTITY);
		assert_eq!(capped(5), 5);
	}
}
