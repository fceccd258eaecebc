use crate::{
	capture::ScreenCapture,
	cycle::FishingCycle,
	config::GlobalHotkeys,
	engine::{Engine, EngineEvent, EventReceiver, MacroState, DEFAULT_STOP_TIMEOUT},
	hotkeys::{self, HotkeyAction},
	input::EnigoInput,
	util::validators,
	webhook::format_runtime,
	UiExt,
};

use super::Module;

pub struct Fishing {
	uniform: crate::Uniform,

	engine: Engine,
	events: EventReceiver,
	last_error: Option<String>,
	editing_area: bool,
	/// Global hotkey text as typed, committed to settings once it parses.
	hotkey_drafts: Option<GlobalHotkeys>,
}

impl Fishing {
	pub fn new(uniform: crate::Uniform) -> Self {
		let (engine, events) = Engine::new();
		Self {
			uniform,
			engine,
			events,
			last_error: None,
			editing_area: false,
			hotkey_drafts: None,
		}
	}

	fn toggle(&mut self) {
		let state = self.engine.state();
		if state.can_stop() {
			self.stop();
		} else if state.can_start() {
			self.start();
		}
	}

	fn start(&mut self) {
		let uniform = self.uniform.clone();
		self.last_error = None;
		let started = self.engine.start(move |flag| {
			let mut cycle = FishingCycle::new(
				Box::new(ScreenCapture::new()),
				Box::new(EnigoInput::new()),
				uniform.settings.clone(),
				uniform.vision.clone(),
				uniform.stats.clone(),
				uniform.counters.clone(),
			);
			cycle.main_loop(&flag)
		});
		if !started {
			tracing::warn!(state = %self.engine.state(), "start refused");
		}
	}

	fn stop(&mut self) {
		if !self.engine.stop(DEFAULT_STOP_TIMEOUT) {
			tracing::warn!("worker did not stop in time; detached");
		}
	}
}

impl Module for Fishing {
	fn name(&self) -> &'static str {
		"Fishing"
	}

	fn ui(&mut self, ui: &mut egui::Ui) {
		let state = self.engine.state();
		ui.horizontal(|ui| {
			if ui.add_enabled(state.can_start(), egui::Button::new("Start")).clicked() {
				self.start();
			}
			if ui.add_enabled(state.can_stop(), egui::Button::new("Stop")).clicked() {
				self.stop();
			}
		});
		ui.spacer();

		self.ui_important(ui);

		ui.spacer();
		let keys = self.uniform.settings().global_hotkeys.clone();
		ui.small(format!("{} start/stop, {} change area, {} exit", keys.start_stop, keys.change_area, keys.exit));
		if ui.toggle_value(&mut self.editing_area, "Change area").changed() {
			tracing::debug!(editing = self.editing_area, "area editing toggled");
		}
		if !self.editing_area {
			return;
		}
		let mut settings = self.uniform.settings_mut();
		let screen = crate::capture::primary_screen_size();
		let mut area = settings.area;
		if ui.area_edit(&mut area, "Minigame") {
			settings.set_area(area);
		}
		let mut changed = ui.area_edit(&mut settings.auto_craft_area, "Auto craft");
		changed |= ui.point_edit(&mut settings.water_point, "Water");
		if !validators::validate_area(Some(settings.active_area()), screen) {
			ui.colored_label(egui::Color32::YELLOW, "The active area is outside the screen");
		}
		if !validators::validate_point(settings.water_point, screen) {
			ui.colored_label(egui::Color32::YELLOW, "The water point is outside the screen");
		}
		if changed {
			settings.save();
		}
	}

	fn ui_settings(&mut self, ui: &mut egui::Ui, settings: &mut crate::config::Settings) -> bool {
		let mut changed = false;
		ui.label("Hotkeys");
		let mut keys = settings.hotkeys.clone();
		let mut keys_changed = false;
		ui.horizontal(|ui| {
			for (value, label) in [
				(&mut keys.rod, "Rod"),
				(&mut keys.everything_else, "Everything else"),
				(&mut keys.fruit, "Fruit"),
			] {
				ui.label(label);
				let edit = egui::TextEdit::singleline(value).char_limit(1).desired_width(24.0);
				keys_changed |= ui.add(edit).changed();
			}
		});
		if keys_changed {
			settings.set_hotkeys(&keys.rod, &keys.everything_else, &keys.fruit);
		}

		ui.spacer();
		ui.label("Global hotkeys");
		let drafts = self.hotkey_drafts.get_or_insert_with(|| settings.global_hotkeys.clone());
		let global = &mut settings.global_hotkeys;
		let mut all_valid = true;
		egui::Grid::new("global_hotkeys").num_columns(2).show(ui, |ui| {
			for (draft, current, label) in [
				(&mut drafts.start_stop, &mut global.start_stop, "Start / stop"),
				(&mut drafts.change_area, &mut global.change_area, "Change area"),
				(&mut drafts.exit, &mut global.exit, "Exit"),
			] {
				ui.label(label);
				let edit = ui.add(egui::TextEdit::singleline(draft).desired_width(120.0));
				ui.end_row();
				let valid = draft.trim().is_empty() || hotkeys::parse_binding(draft).is_some();
				all_valid &= valid;
				if edit.changed() && valid {
					*current = draft.trim().to_owned();
					changed = true;
				}
			}
		});
		if !all_valid {
			ui.colored_label(egui::Color32::LIGHT_RED, "Unrecognised key; use names like F1 or ctrl+KeyS");
		}

		ui.spacer();
		ui.label("Minigame controller");
		changed |= ui.num_edit_range(&mut settings.pd.kp, "Proportional gain", 0.0..=10.0).changed();
		changed |= ui.num_edit_range(&mut settings.pd.kd, "Derivative gain", 0.0..=10.0).changed();
		changed |= ui.num_edit_range(&mut settings.pd.clamp, "Output clamp", 0.01..=100.0).changed();

		ui.spacer();
		ui.label("Casting");
		let c = &mut settings.casting;
		changed |= ui.num_edit_range(&mut c.cast_hold_duration, "Cast hold (s)", 0.0..=5.0).changed();
		changed |= ui.num_edit_range(&mut c.recast_timeout, "Recast timeout (s)", 1.0..=300.0).changed();
		changed |= ui.num_edit_range(&mut c.fishing_end_delay, "Fishing end delay (s)", 0.0..=10.0).changed();
		changed
	}

	fn ui_important(&mut self, ui: &mut egui::Ui) -> bool {
		let state = self.engine.state();
		let counters = &self.uniform.counters;
		let color = match state {
			MacroState::Running => egui::Color32::LIGHT_GREEN,
			MacroState::Error => egui::Color32::LIGHT_RED,
			s if s.is_active() => egui::Color32::YELLOW,
			_ => ui.visuals().text_color(),
		};
		ui.colored_label(color, format!("State: {state}"));
		egui::Grid::new("fishing_counters").num_columns(2).show(ui, |ui| {
			ui.label("Uptime");
			ui.label(format_runtime(self.engine.uptime()));
			ui.end_row();
			ui.label("Fish");
			ui.label(counters.fish().to_string());
			ui.end_row();
			ui.label("Fruits");
			ui.label(counters.fruits().to_string());
			ui.end_row();
			ui.label("Detection FPS");
			ui.label(format!("{:.0}", counters.fps()));
			ui.end_row();
			ui.label("Average cycle");
			ui.label(format!("{:.1} s", counters.average_cycle().as_secs_f64()));
			ui.end_row();
		});
		if let Some(err) = &self.last_error {
			ui.colored_label(egui::Color32::LIGHT_RED, err);
		}
		true
	}

	fn tick(&mut self) {
		while let Ok(event) = self.events.try_recv() {
			match event {
				EngineEvent::StateChanged { from, to } => tracing::debug!(%from, %to, "engine state"),
				EngineEvent::Started => tracing::info!("macro started"),
				EngineEvent::Stopped => tracing::info!("macro stopped"),
				EngineEvent::Failed(err) => {
					tracing::error!(error = %err, "macro failed");
					self.last_error = Some(err);
				}
			}
		}
	}

	fn on_hotkey(&mut self, action: HotkeyAction) {
		match action {
			HotkeyAction::StartStop => self.toggle(),
			HotkeyAction::ChangeArea => self.editing_area = !self.editing_area,
			HotkeyAction::Exit => {}
		}
	}

	fn on_exit(&mut self) {
		self.stop();
	}
}

#[cfg(test)]
mod tests {
	use std::sync::{Arc, Mutex, RwLock};

	use super::*;

	#[test]
	fn change_area_hotkey_toggles_the_editor() {
		let dir = tempfile::tempdir().unwrap();
		let uniform = Arc::new(crate::UniformData {
			settings: Arc::new(RwLock::new(crate::config::Settings::default())),
			vision: Arc::new(vision::Vision::without_ocr("test")),
			stats: Arc::new(Mutex::new(stats::StatsStore::open(dir.path().join("stats.json")).unwrap())),
			counters: Arc::new(crate::cycle::Counters::default()),
		});
		let mut fishing = Fishing::new(uniform);

		fishing.on_hotkey(HotkeyAction::ChangeArea);
		assert!(fishing.editing_area);
		fishing.on_hotkey(HotkeyAction::ChangeArea);
		assert!(!fishing.editing_area);

		fishing.on_hotkey(HotkeyAction::Exit);
		assert_eq!(fishing.engine.state(), MacroState::Stopped);
	}
}
