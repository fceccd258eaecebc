use std::time::Duration;

use super::{secs, should_craft, FishingCycle};
use crate::{
	config::{Area, Point},
	engine::MacroResult,
	fruit,
	input::{self, Key},
	util::timing::{sleep_secs, RunFlag},
};

const FRUIT_TOLERANCE: u8 = 15;
const CLOSE_ZOOM: i32 = 9;
const FRUIT_ZOOM: i32 = 6;

impl FishingCycle {
	/// One complete auto-craft cycle: craft when due, cast, fish zoomed in, check for fruit.
	///
	/// False when the minigame never appeared; the caller retries.
	pub fn auto_craft_pre_cast(&mut self, flag: &RunFlag) -> MacroResult<bool> {
		self.start_cycle_timer();

		let fish = self.counters.fish();
		let every = self.settings.auto_craft.craft_every_n_fish;
		if should_craft(fish, every, self.last_craft_count) {
			self.activity("crafting");
			if !self.craft.run(&mut *self.input, &self.settings, flag)? {
				tracing::debug!(fish, "craft skipped for this fish count");
			}
			self.last_craft_count = Some(fish);
		}

		self.activity("auto-craft cast");
		self.tap_twice(Key::Shift, 0.08, flag)?;
		self.reselect_rod(flag)?;

		let bait = if self.settings.smart_bait.enabled {
			let choice = self.bait.select_bait(&mut *self.screen, &self.vision);
			self.persist_bait_mode();
			choice
		} else {
			None
		};
		if let Some(p) = bait.or(self.settings.precast.top_bait_point) {
			self.click_point(p, flag)?;
			sleep_secs(self.settings.advanced.bait_click_delay, flag)?;
		}

		let water = self.settings.auto_craft.water_point.or(self.settings.water_point);
		self.cast(water, flag)?;
		sleep_secs(0.3, flag)?;

		let (w, h) = self.screen.screen_size();
		self.input.move_to(Point::new(w as i32 / 2, h as i32 / 2));
		let tick = secs(self.settings.advanced.zoom_tick_delay);
		input::zoom_uninterruptible(&mut *self.input, CLOSE_ZOOM, tick);

		let area = self.settings.auto_craft_area;
		self.activity("waiting for minigame");
		if !self.wait_for_minigame(area, flag)? {
			input::zoom_uninterruptible(&mut *self.input, 30, Duration::from_millis(10));
			input::zoom_uninterruptible(&mut *self.input, -13, Duration::from_millis(10));
			return Ok(false);
		}

		self.activity("fishing");
		self.pd.reset();
		self.lost_frames = 0;
		let fished = self.fish_until_done(area, flag);
		self.mouse.release(&mut *self.input);
		input::zoom_uninterruptible(&mut *self.input, -CLOSE_ZOOM, tick);
		fished?;

		self.tap_twice(Key::Shift, 0.15, flag)?;
		input::tap_hotkey(&mut *self.input, &self.settings.hotkeys.fruit, flag)?;
		sleep_secs(0.3, flag)?;

		let caught_fruit = self.holding_fruit(FRUIT_TOLERANCE);
		if caught_fruit {
			self.on_fruit_caught(true, FRUIT_ZOOM, flag)?;
		}
		if caught_fruit || self.settings.precast.fruit_color.is_none() {
			let size = self.screen.screen_size();
			fruit::store_fruit(&mut *self.input, &self.settings, size, flag)?;
		}

		self.first_catch = false;
		if !caught_fruit {
			self.count_fish();
		}
		self.end_cycle_timer();
		Ok(true)
	}

	fn fish_until_done(&mut self, area: Area, flag: &RunFlag) -> MacroResult {
		while self.fish_minigame(area, true, flag)? {}
		Ok(())
	}
}
