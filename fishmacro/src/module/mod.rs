mod fishing;
pub use fishing::Fishing;

mod stats;
pub use stats::Stats;

mod webhook;
pub use webhook::Webhook;

pub trait Module {
	fn name(&self) -> &'static str;

	fn ui(&mut self, ui: &mut egui::Ui);

	#[allow(unused_variables)]
	fn ui_settings(&mut self, ui: &mut egui::Ui, settings: &mut crate::config::Settings) -> bool {false}

	#[allow(unused_variables)]
	fn ui_important(&mut self, ui: &mut egui::Ui) -> bool {false}

	fn tick(&mut self) {}

	#[allow(unused_variables)]
	fn on_hotkey(&mut self, action: crate::hotkeys::HotkeyAction) {}

	/// The window is closing.
	fn on_exit(&mut self) {}
}
