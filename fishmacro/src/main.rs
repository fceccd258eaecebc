//! Fishing macro.
//!
//! Hosts the egui window and runs the fishing cycle on a worker thread.

mod bait;
mod capture;
mod config;
mod craft;
mod cycle;
mod engine;
mod fruit;
mod hotkeys;
mod input;
mod logging;
mod module;
mod ui;
mod util;
mod webhook;

pub use ui::UiExt;

use std::sync::{Arc, Mutex, RwLock};

use anyhow::Context;

/// State shared by the UI modules and the worker.
pub struct UniformData {
	pub settings: Arc<RwLock<config::Settings>>,
	pub vision: Arc<vision::Vision>,
	pub stats: Arc<Mutex<stats::StatsStore>>,
	pub counters: Arc<cycle::Counters>,
}

pub type Uniform = Arc<UniformData>;

impl UniformData {
	pub fn settings(&self) -> std::sync::RwLockReadGuard<'_, config::Settings> {
		self.settings.read().unwrap_or_else(|e| e.into_inner())
	}

	pub fn settings_mut(&self) -> std::sync::RwLockWriteGuard<'_, config::Settings> {
		self.settings.write().unwrap_or_else(|e| e.into_inner())
	}

	pub fn stats(&self) -> std::sync::MutexGuard<'_, stats::StatsStore> {
		self.stats.lock().unwrap_or_else(|e| e.into_inner())
	}
}

const STATS_FILE: &str = "fishing_stats.json";

fn main() -> anyhow::Result<()> {
	let dir = util::app_dir();
	let _log_guard = logging::init(&dir);
	tracing::info!(dir = %dir.display(), "starting fishmacro");

	let settings = config::Settings::load_or_default();
	let always_on_top = settings.ui.always_on_top;

	let vision = match util::assets::resolve_ocr_assets() {
		Ok(assets) => vision::Vision::new(
			assets.detection,
			assets.recognition,
			assets.charset,
			settings.smart_bait.ocr_confidence_min,
		),
		Err(err) => vision::Vision::without_ocr(format!("{err:#}")),
	};
	if let Some(reason) = vision.ocr_init_error() {
		tracing::warn!(%reason, "OCR disabled");
	}

	let stats = stats::StatsStore::open(dir.join(STATS_FILE)).context("open statistics store")?;

	let uniform = Arc::new(UniformData {
		settings: Arc::new(RwLock::new(settings)),
		vision: Arc::new(vision),
		stats: Arc::new(Mutex::new(stats)),
		counters: Arc::new(cycle::Counters::default()),
	});

	let mut viewport = egui::ViewportBuilder::default()
		.with_title("Fishing Macro")
		.with_inner_size([460.0, 640.0]);
	if always_on_top {
		viewport = viewport.with_always_on_top();
	}
	let options = eframe::NativeOptions {
		viewport,
		..Default::default()
	};

	eframe::run_native(
		"fishmacro",
		options,
		Box::new(move |cc| Ok(Box::new(ui::FishMacroApp::new(cc, uniform)))),
	)
	.map_err(|err| anyhow::anyhow!("{err}"))
}
