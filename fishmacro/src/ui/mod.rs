mod ext;
pub use ext::UiExt;

mod settings;

use crate::{
	hotkeys::{HotkeyAction, HotkeyListener},
	module::Module,
};

pub struct FishMacroApp {
	uniform: crate::Uniform,
	modules: Vec<Box<dyn Module>>,
	hotkeys: Option<HotkeyListener>,

	tab: Tab,
	always_on_top: bool,
}

impl FishMacroApp {
	pub fn new(_cc: &eframe::CreationContext<'_>, uniform: crate::Uniform) -> Self {
		let (always_on_top, bindings) = {
			let settings = uniform.settings();
			(settings.ui.always_on_top, settings.global_hotkeys.clone())
		};
		let hotkeys = HotkeyListener::new(&bindings)
			.inspect_err(|err| tracing::warn!(error = %err, "global hotkeys unavailable"))
			.ok();
		let modules: Vec<Box<dyn Module>> = vec![
			Box::new(crate::module::Fishing::new(uniform.clone())),
			Box::new(crate::module::Stats::new(uniform.clone())),
			Box::new(crate::module::Webhook::new(uniform.clone())),
		];

		Self {
			uniform,
			modules,
			hotkeys,
			tab: Tab::Module(0),
			always_on_top,
		}
	}

	fn ui_module(&mut self, ui: &mut egui::Ui, index: usize) {
		if index == 0 && !self.uniform.vision.ocr_available() {
			ui.group(|ui| {
				ui.label(egui::RichText::new("OCR models not found; smart bait uses colour detection only").strong());
				if let Some(err) = self.uniform.vision.ocr_init_error() {
					ui.add_space(4.0);
					ui.small(err);
				}
			});
			ui.add_space(6.0);
		}
		if let Some(module) = self.modules.get_mut(index) {
			module.ui(ui);
		}
	}

	fn handle_hotkeys(&mut self, ctx: &egui::Context) {
		let Some(hotkeys) = &mut self.hotkeys else {
			return;
		};
		hotkeys.sync(&self.uniform.settings().global_hotkeys);
		for action in hotkeys.poll() {
			tracing::info!(?action, "global hotkey");
			if action == HotkeyAction::Exit {
				ctx.send_viewport_cmd(egui::ViewportCommand::Close);
				continue;
			}
			for module in &mut self.modules {
				module.on_hotkey(action);
			}
		}
	}

	fn sync_window_level(&mut self, ctx: &egui::Context) {
		let wanted = self.uniform.settings().ui.always_on_top;
		if wanted == self.always_on_top {
			return;
		}
		self.always_on_top = wanted;
		let level = if wanted { egui::WindowLevel::AlwaysOnTop } else { egui::WindowLevel::Normal };
		ctx.send_viewport_cmd(egui::ViewportCommand::WindowLevel(level));
	}
}

impl eframe::App for FishMacroApp {
	fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
		if ctx.input(|i| i.viewport().close_requested()) {
			for module in &mut self.modules {
				module.on_exit();
			}
		}
		self.handle_hotkeys(ctx);

		egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
			ui.horizontal(|ui| {
				ui.selectable_value(&mut self.tab, Tab::Module(0), self.modules[0].name());
				ui.selectable_value(&mut self.tab, Tab::Settings, "Settings");
				for (i, module) in self.modules.iter().enumerate().skip(1) {
					ui.selectable_value(&mut self.tab, Tab::Module(i), module.name());
				}
			});
		});

		egui::CentralPanel::default().show(ctx, |ui| {
			egui::ScrollArea::vertical().show(ui, |ui| match self.tab {
				Tab::Module(i) => self.ui_module(ui, i),
				Tab::Settings => settings::ui(ui, &self.uniform, &mut self.modules),
			});
		});

		for module in &mut self.modules {
			module.tick();
		}
		self.sync_window_level(ctx);

		// Counters change on the worker thread.
		ctx.request_repaint_after(std::time::Duration::from_millis(250));
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tab {
	Module(usize),
	Settings,
}
