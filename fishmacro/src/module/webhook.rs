use std::sync::mpsc::{self, Receiver, Sender};

use crate::{
	util::validators::{validate_user_id, validate_webhook_url},
	webhook::WebhookService,
	UiExt,
};

pub struct Webhook {
	uniform: crate::Uniform,

	results_tx: Sender<Result<(), String>>,
	results_rx: Receiver<Result<(), String>>,
	testing: bool,
	last_test: Option<Result<(), String>>,
}

impl Webhook {
	pub fn new(uniform: crate::Uniform) -> Self {
		let (results_tx, results_rx) = mpsc::channel();
		Self {
			uniform,
			results_tx,
			results_rx,
			testing: false,
			last_test: None,
		}
	}

	fn send_test(&mut self) {
		let service = WebhookService::new(&self.uniform.settings().webhook);
		let tx = self.results_tx.clone();
		self.testing = true;
		self.last_test = None;
		let spawned = std::thread::Builder::new()
			.name("fishmacro-webhook-test".into())
			.spawn(move || {
				let result = service.send_test().map_err(|err| format!("{err:#}"));
				let _ = tx.send(result);
			});
		if let Err(err) = spawned {
			self.testing = false;
			self.last_test = Some(Err(err.to_string()));
		}
	}
}

impl super::Module for Webhook {
	fn name(&self) -> &'static str {
		"Webhook"
	}

	fn ui(&mut self, ui: &mut egui::Ui) {
		let mut changed = false;
		let (url_ok, user_ok, configured) = {
			let mut settings = self.uniform.settings_mut();
			let hook = &mut settings.webhook;

			ui.label("Discord webhook URL");
			changed |= ui
				.add(egui::TextEdit::singleline(&mut hook.url).desired_width(f32::INFINITY))
				.changed();
			let url_ok = hook.url.trim().is_empty() || validate_webhook_url(hook.url.trim());

			ui.label("User ID to mention");
			changed |= ui.text_edit_singleline(&mut hook.user_id).changed();
			let user_ok = validate_user_id(hook.user_id.trim());

			let configured = validate_webhook_url(hook.url.trim()) && !hook.user_id.trim().is_empty();
			if changed {
				settings.save();
			}
			(url_ok, user_ok, configured)
		};

		if !url_ok {
			ui.colored_label(egui::Color32::LIGHT_RED, "Not a Discord webhook URL");
		}
		if !user_ok {
			ui.colored_label(egui::Color32::LIGHT_RED, "User IDs are 17 to 20 digits");
		}

		ui.spacer();
		ui.horizontal(|ui| {
			let enabled = configured && url_ok && user_ok && !self.testing;
			if ui.add_enabled(enabled, egui::Button::new("Send test")).clicked() {
				self.send_test();
			}
			if self.testing {
				ui.spinner();
			}
		});
		match &self.last_test {
			Some(Ok(())) => {
				ui.colored_label(egui::Color32::LIGHT_GREEN, "Test message sent");
			}
			Some(Err(err)) => {
				ui.colored_label(egui::Color32::LIGHT_RED, err);
			}
			None => {}
		}
	}

	fn ui_settings(&mut self, ui: &mut egui::Ui, settings: &mut crate::config::Settings) -> bool {
		ui.label("Webhook");
		let hook = &mut settings.webhook;
		let mut changed = ui
			.checkbox(&mut hook.only_legendary, "Only notify for legendary and mythical fruit")
			.changed();
		changed |= ui.opt_area_edit(&mut hook.pity_zone, "Pity counter zone");
		changed
	}

	fn tick(&mut self) {
		while let Ok(result) = self.results_rx.try_recv() {
			match &result {
				Ok(()) => tracing::info!("webhook test sent"),
				Err(err) => tracing::warn!(error = %err, "webhook test failed"),
			}
			self.testing = false;
			self.last_test = Some(result);
		}
	}
}
