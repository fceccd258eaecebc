use super::{secs, FishingCycle};
use crate::{
	capture,
	engine::MacroResult,
	fruit,
	input::{self, Key},
	util::timing::{sleep_secs, RunFlag},
	webhook,
};

const FRUIT_TOLERANCE: u8 = 5;
const SHOP_STEP: f64 = 3.0;

impl FishingCycle {
	/// Everything between the last catch and the next minigame: bait, fruit, cast.
	pub fn pre_cast(&mut self, flag: &RunFlag) -> MacroResult {
		self.activity("pre-cast");
		if self.settings.precast.auto_buy_bait {
			self.buy_common_bait(flag)?;
		}

		if self.settings.camera_enabled() {
			self.reselect_rod(flag)?;
			self.click_top_bait(flag)?;
			self.cast(self.settings.water_point, flag)?;
			sleep_secs(0.3, flag)?;
		} else {
			self.tap_twice(Key::Shift, 0.2, flag)?;
		}

		let adv = self.settings.advanced.clone();
		if self.settings.precast.auto_store_fruit {
			input::tap_hotkey(&mut *self.input, &self.settings.hotkeys.everything_else, flag)?;
			sleep_secs(adv.rod_deselect_delay, flag)?;
			input::tap_hotkey(&mut *self.input, &self.settings.hotkeys.fruit, flag)?;
			sleep_secs(adv.fruit_hold_delay, flag)?;

			if self.holding_fruit(FRUIT_TOLERANCE) {
				self.on_fruit_caught(false, adv.zoom_ticks as i32, flag)?;
				let size = self.screen.screen_size();
				fruit::store_fruit(&mut *self.input, &self.settings, size, flag)?;
			}

			self.reselect_rod(flag)?;
			self.click_top_bait(flag)?;
			self.cast(self.settings.water_point, flag)?;
			sleep_secs(adv.bait_click_delay, flag)?;

			if self.settings.camera_enabled() {
				input::rotate_camera(
					&mut *self.input,
					adv.camera_rotation_steps,
					100,
					secs(adv.camera_rotation_step_delay),
					flag,
				)?;
				sleep_secs(adv.camera_rotation_settle_delay, flag)?;
				input::zoom(&mut *self.input, adv.zoom_ticks as i32, secs(adv.zoom_tick_delay), flag)?;
				sleep_secs(adv.zoom_settle_delay, flag)?;
			}
		} else {
			input::tap_hotkey(&mut *self.input, &self.settings.hotkeys.rod, flag)?;
			sleep_secs(adv.rod_select_delay, flag)?;
			self.click_top_bait(flag)?;
			self.cast(self.settings.water_point, flag)?;
		}
		sleep_secs(adv.pre_cast_minigame_wait, flag)?;
		sleep_secs(0.5, flag)
	}

	/// True when the fruit slot pixel shows a fruit.
	pub(super) fn holding_fruit(&mut self, tol: u8) -> bool {
		match (self.settings.precast.fruit_point, self.settings.fruit_color()) {
			(Some(point), Some(color)) => fruit::check_fruit(&mut *self.screen, point, color, tol),
			_ => false,
		}
	}

	/// Buy common bait from the shop every `loops_per_purchase` cycles.
	pub fn buy_common_bait(&mut self, flag: &RunFlag) -> MacroResult {
		let precast = self.settings.precast.clone();
		let (Some(yes), Some(middle), Some(no)) = (precast.yes_button, precast.middle_button, precast.no_button) else {
			tracing::warn!("bait shop buttons are not configured; skipping purchase");
			return sleep_secs(2.0, flag);
		};

		if self.purchases_left > 0 {
			self.purchases_left -= 1;
			return Ok(());
		}

		self.activity("buying bait");
		tracing::info!(amount = precast.loops_per_purchase, "buying common bait");
		input::tap(&mut *self.input, Key::Char('e'), flag)?;
		sleep_secs(SHOP_STEP, flag)?;
		self.click_point(yes, flag)?;
		sleep_secs(SHOP_STEP, flag)?;
		self.click_point(middle, flag)?;
		sleep_secs(SHOP_STEP, flag)?;

		for digit in precast.loops_per_purchase.to_string().chars() {
			input::tap(&mut *self.input, Key::Char(digit), flag)?;
			sleep_secs(self.settings.advanced.general_action_delay, flag)?;
		}
		sleep_secs(0.5, flag)?;

		for button in [yes, no, middle] {
			self.click_point(button, flag)?;
			sleep_secs(SHOP_STEP, flag)?;
		}

		self.purchases_left = precast.loops_per_purchase;
		Ok(())
	}

	/// Count the fruit, then screenshot it for the webhook.
	///
	/// The camera zooms in `zoom_ticks` for the screenshot and is always zoomed
	/// back out, even when the capture fails.
	pub fn on_fruit_caught(&mut self, auto_craft: bool, zoom_ticks: i32, flag: &RunFlag) -> MacroResult {
		self.count_fruit();

		let only_legendary = self.settings.webhook.only_legendary;
		let legendary = only_legendary
			&& webhook::check_legendary_pity(&mut *self.screen, &self.vision, self.settings.webhook.pity_zone);
		if only_legendary && !legendary {
			tracing::info!("fruit is not legendary; webhook skipped");
			return Ok(());
		}
		if !self.webhook.is_configured() {
			return Ok(());
		}

		let delay = secs(self.settings.advanced.zoom_tick_delay);
		input::zoom_uninterruptible(&mut *self.input, zoom_ticks, delay);
		let settle = sleep_secs(self.settings.advanced.zoom_settle_delay, flag);
		let shot = match settle {
			Ok(()) => capture::capture_center(&mut *self.screen, auto_craft),
			Err(_) => None,
		};
		input::zoom_uninterruptible(&mut *self.input, -zoom_ticks, delay);
		settle?;

		let Some(path) = shot else {
			tracing::warn!("fruit screenshot failed; webhook skipped");
			return Ok(());
		};

		let service = self.webhook.clone();
		let runtime = self.session_started.elapsed();
		let (fruits, fish) = (self.counters.fruits(), self.counters.fish());
		let spawned = std::thread::Builder::new()
			.name("fishmacro-webhook".into())
			.spawn(move || {
				if let Err(err) = service.send_fruit(&path, runtime, fruits, fish, legendary) {
					tracing::warn!(error = %err, "fruit webhook failed");
				}
			});
		if let Err(err) = spawned {
			tracing::warn!(error = %err, "failed to spawn webhook thread");
		}
		Ok(())
	}
}
