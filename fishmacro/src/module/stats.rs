use crate::UiExt;

const HISTORY_DAYS: u32 = 7;

pub struct Stats {
	uniform: crate::Uniform,
	export_result: Option<Result<String, String>>,
}

impl Stats {
	pub fn new(uniform: crate::Uniform) -> Self {
		Self {
			uniform,
			export_result: None,
		}
	}

	fn export(&mut self) {
		let path = crate::util::app_dir().join(format!(
			"fishing_stats_{}.csv",
			chrono::Local::now().format("%Y%m%d_%H%M%S")
		));
		let result = self.uniform.stats().export_csv(&path);
		self.export_result = Some(match result {
			Ok(rows) => {
				tracing::info!(rows, path = %path.display(), "statistics exported");
				Ok(format!("Exported {rows} sessions to {}", path.display()))
			}
			Err(err) => {
				tracing::warn!(error = %err, "statistics export failed");
				Err(format!("{err:#}"))
			}
		});
	}
}

impl super::Module for Stats {
	fn name(&self) -> &'static str {
		"Stats"
	}

	fn ui(&mut self, ui: &mut egui::Ui) {
		let (today, history) = {
			let stats = self.uniform.stats();
			(stats.today_summary(), stats.historical(HISTORY_DAYS))
		};

		ui.label(egui::RichText::new("Today").strong());
		ui.label(format!(
			"{} sessions, {} fish, {} fruits",
			today.sessions, today.fish, today.fruits
		));

		ui.spacer();
		ui.label(egui::RichText::new("Last 7 days").strong());
		egui::Grid::new("stats_history").num_columns(4).striped(true).show(ui, |ui| {
			for header in ["Date", "Sessions", "Fish", "Fruits"] {
				ui.label(header);
			}
			ui.end_row();
			for day in &history {
				ui.label(day.date.format("%Y-%m-%d").to_string());
				ui.label(day.sessions.to_string());
				ui.label(day.fish.to_string());
				ui.label(day.fruits.to_string());
				ui.end_row();
			}
		});

		ui.spacer();
		if ui.button("Export CSV").clicked() {
			self.export();
		}
		match &self.export_result {
			Some(Ok(msg)) => {
				ui.label(msg);
			}
			Some(Err(err)) => {
				ui.colored_label(egui::Color32::LIGHT_RED, err);
			}
			None => {}
		}
	}
}
