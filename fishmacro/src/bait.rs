//! Smart bait selection.
//!
//! Burning mode spends legendary bait down to the last one; stockpile mode
//! fishes with rare bait until the legendary count reaches the target. Counts
//! come from OCR on the bait menu, or from the top row's colour when OCR is off.

use std::time::{Duration, Instant};

use vision::{bait::BaitCounts, BaitKind, OwnedImage, Vision};

use crate::{
	capture::Screen,
	config::{Area, BaitMode, FallbackBait, Point, SmartBaitSettings},
};

const COLOR_CACHE_TTL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaitChoice {
	Legendary,
	Rare,
}

pub struct BaitManager {
	settings: SmartBaitSettings,
	color_cache: Option<(Instant, Option<BaitKind>)>,
	mode_changed: bool,
}

impl BaitManager {
	pub fn new(settings: SmartBaitSettings) -> Self {
		Self {
			settings,
			color_cache: None,
			mode_changed: false,
		}
	}

	/// Pick up edited settings. A pending mode switch wins over the stored mode.
	pub fn update_settings(&mut self, settings: &SmartBaitSettings) {
		let mode = self.settings.mode;
		self.settings = settings.clone();
		if self.mode_changed {
			self.settings.mode = mode;
		}
	}

	pub fn mode(&self) -> BaitMode {
		self.settings.mode
	}

	/// The new mode if it changed since the last call, so the caller can persist it.
	pub fn take_mode_change(&mut self) -> Option<BaitMode> {
		std::mem::take(&mut self.mode_changed).then_some(self.settings.mode)
	}

	fn switch_mode(&mut self, mode: BaitMode, legendary: u32) {
		tracing::warn!(from = ?self.settings.mode, to = ?mode, legendary, "bait mode auto-switch");
		self.settings.mode = mode;
		self.mode_changed = true;
	}

	/// Decide which bait to use from the counts. `None` means use the fallback.
	pub fn decide(&mut self, counts: BaitCounts) -> Option<BaitChoice> {
		let target = self.settings.legendary_target;
		if let Some(legendary) = counts.legendary {
			match self.settings.mode {
				BaitMode::Burning if legendary <= 1 => self.switch_mode(BaitMode::Stockpile, legendary),
				BaitMode::Stockpile if legendary >= target => self.switch_mode(BaitMode::Burning, legendary),
				_ => {}
			}
		}

		let rare = counts.rare.unwrap_or(0);
		let choice = match (self.settings.mode, counts.legendary) {
			(BaitMode::Burning, Some(l)) if l > 1 => Some(BaitChoice::Legendary),
			(BaitMode::Burning, _) => (rare > 0).then_some(BaitChoice::Rare),
			(BaitMode::Stockpile, None) => None,
			(BaitMode::Stockpile, Some(l)) if l >= target => (l > 1).then_some(BaitChoice::Legendary),
			(BaitMode::Stockpile, Some(_)) if rare > 0 => Some(BaitChoice::Rare),
			(BaitMode::Stockpile, Some(l)) => (l > 0).then_some(BaitChoice::Legendary),
		};
		tracing::info!(mode = ?self.settings.mode, ?counts, target, ?choice, "bait decision");
		choice
	}

	pub fn point_for(&self, choice: BaitChoice) -> Option<Point> {
		match choice {
			BaitChoice::Legendary => self.settings.top_bait_point,
			BaitChoice::Rare => self.settings.second_bait_point.or(self.settings.top_bait_point),
		}
	}

	fn fallback_point(&self) -> Option<Point> {
		let preferred = match self.settings.fallback {
			FallbackBait::Legendary => self.settings.top_bait_point,
			FallbackBait::Rare => self.settings.second_bait_point,
		};
		preferred.or(self.settings.top_bait_point)
	}

	/// Where to click for the next cast. `None` when disabled or nothing fits.
	pub fn select_bait(&mut self, screen: &mut dyn Screen, vision: &Vision) -> Option<Point> {
		if !self.settings.enabled {
			return None;
		}
		if self.settings.use_ocr && vision.ocr_available() {
			self.select_with_ocr(screen, vision)
		} else {
			self.select_by_color(screen)
		}
	}

	fn select_with_ocr(&mut self, screen: &mut dyn Screen, vision: &Vision) -> Option<Point> {
		let (Some(menu), Some(top), Some(mid)) =
			(self.settings.menu_zone, self.settings.top_zone, self.settings.mid_zone)
		else {
			tracing::warn!("smart bait zones are not configured");
			return None;
		};

		let Some(menu_image) = screen.capture_area(menu, false) else {
			tracing::warn!("bait menu capture failed; using fallback");
			return self.fallback_point();
		};
		self.debug_snapshot("menu", &menu_image);

		let top_hint = self.classify_zone(screen, top, "top");
		let mid_hint = self.classify_zone(screen, mid, "mid");

		let started = Instant::now();
		let counts = vision.read_bait_counts(&menu_image, top_hint, mid_hint);
		let took = started.elapsed();
		if took > Duration::from_millis(self.settings.ocr_timeout_ms) {
			tracing::warn!(took_ms = took.as_millis() as u64, "bait OCR slower than the configured timeout");
		}

		match self.decide(counts) {
			Some(choice) => self.point_for(choice).or_else(|| self.fallback_point()),
			None => {
				tracing::info!(fallback = ?self.settings.fallback, "using fallback bait");
				self.fallback_point()
			}
		}
	}

	fn select_by_color(&mut self, screen: &mut dyn Screen) -> Option<Point> {
		match self.settings.mode {
			BaitMode::Burning => {
				let top = self.top_color(screen);
				if top == Some(BaitKind::Legendary) {
					return self.settings.top_bait_point.or_else(|| self.fallback_point());
				}
				// One-way: only a manual change returns to burning.
				tracing::info!(?top, "top bait is not legendary");
				self.switch_mode(BaitMode::Stockpile, 0);
				self.settings.second_bait_point.or_else(|| self.fallback_point())
			}
			BaitMode::Stockpile => self.settings.second_bait_point.or(self.settings.top_bait_point),
		}
	}

	fn top_color(&mut self, screen: &mut dyn Screen) -> Option<BaitKind> {
		if let Some((at, kind)) = self.color_cache
			&& at.elapsed() < COLOR_CACHE_TTL
		{
			return kind;
		}
		let kind = self.settings.top_zone.and_then(|zone| self.classify_zone(screen, zone, "top"));
		self.color_cache = Some((Instant::now(), kind));
		kind
	}

	fn classify_zone(&self, screen: &mut dyn Screen, zone: Area, label: &str) -> Option<BaitKind> {
		let image = screen.capture_area(zone, false)?;
		self.debug_snapshot(label, &image);
		let kind = vision::color::classify_bait(&image);
		tracing::debug!(zone = label, ?kind, "bait colour");
		kind
	}

	fn debug_snapshot(&self, label: &str, image: &OwnedImage) {
		if !self.settings.debug_screenshots {
			return;
		}
		let path = crate::util::app_dir().join(format!(
			"debug_{label}_{}.png",
			chrono::Local::now().timestamp_millis()
		));
		match image.as_image().save_png(&path) {
			Ok(()) => tracing::info!(path = %path.display(), "saved bait debug capture"),
			Err(err) => tracing::warn!(error = %err, "failed to save bait debug capture"),
		}
	}
}

#[cfg(test)]
mod tests {
	use vision::Color;

	use super::*;
	use crate::capture::fake::FakeScreen;

	fn counts(l: Option<u32>, r: Option<u32>) -> BaitCounts {
		BaitCounts {
			legendary: l,
			rare: r,
			common: None,
		}
	}

	fn manager(mode: BaitMode) -> BaitManager {
		BaitManager::new(SmartBaitSettings {
			enabled: true,
			mode,
			legendary_target: 10,
			top_bait_point: Some(Point::new(1, 1)),
			second_bait_point: Some(Point::new(2, 2)),
			..Default::default()
		})
	}

	#[test]
	fn burning_uses_legendary_while_plenty() {
		let mut m = manager(BaitMode::Burning);
		assert_eq!(m.decide(counts(Some(5), Some(3))), Some(BaitChoice::Legendary));
		assert_eq!(m.take_mode_change(), None);
	}

	#[test]
	fn burning_switches_to_stockpile_at_last_legendary() {
		let mut m = manager(BaitMode::Burning);
		assert_eq!(m.decide(counts(Some(1), Some(3))), Some(BaitChoice::Rare));
		assert_eq!(m.mode(), BaitMode::Stockpile);
		assert_eq!(m.take_mode_change(), Some(BaitMode::Stockpile));
		assert_eq!(m.take_mode_change(), None);
	}

	#[test]
	fn burning_with_unknown_legendary_uses_rare() {
		let mut m = manager(BaitMode::Burning);
		assert_eq!(m.decide(counts(None, Some(3))), Some(BaitChoice::Rare));
		assert_eq!(m.decide(counts(None, None)), None);
		assert_eq!(m.mode(), BaitMode::Burning);
	}

	#[test]
	fn stockpile_rules() {
		let mut m = manager(BaitMode::Stockpile);
		assert_eq!(m.decide(counts(None, Some(3))), None);
		assert_eq!(m.decide(counts(Some(4), Some(3))), Some(BaitChoice::Rare));
		assert_eq!(m.decide(counts(Some(4), Some(0))), Some(BaitChoice::Legendary));
		assert_eq!(m.decide(counts(Some(0), None)), None);
		assert_eq!(m.mode(), BaitMode::Stockpile);
	}

	#[test]
	fn stockpile_reaching_target_switches_to_burning() {
		let mut m = manager(BaitMode::Stockpile);
		assert_eq!(m.decide(counts(Some(10), Some(3))), Some(BaitChoice::Legendary));
		assert_eq!(m.take_mode_change(), Some(BaitMode::Burning));
	}

	#[test]
	fn rare_point_falls_back_to_top() {
		let mut m = manager(BaitMode::Stockpile);
		m.settings.second_bait_point = None;
		assert_eq!(m.point_for(BaitChoice::Rare), Some(Point::new(1, 1)));
	}

	#[test]
	fn pending_mode_survives_settings_refresh() {
		let mut m = manager(BaitMode::Burning);
		m.decide(counts(Some(0), None));
		let stale = m.settings.clone();
		let mut stale = SmartBaitSettings { mode: BaitMode::Burning, ..stale };
		stale.legendary_target = 20;
		m.update_settings(&stale);
		assert_eq!(m.mode(), BaitMode::Stockpile);
		assert_eq!(m.settings.legendary_target, 20);
	}

	#[test]
	fn disabled_selects_nothing() {
		let mut m = manager(BaitMode::Burning);
		m.settings.enabled = false;
		let mut screen = FakeScreen::new(OwnedImage::filled(100, 100, Color::BLACK));
		assert_eq!(m.select_bait(&mut screen, &Vision::without_ocr("test")), None);
	}

	#[test]
	fn color_mode_burning_without_legendary_switches_for_good() {
		let mut m = manager(BaitMode::Burning);
		m.settings.top_zone = Some(Area::new(0, 0, 50, 10));
		let mut screen = FakeScreen::new(OwnedImage::filled(100, 100, Color::new(128, 128, 128)));
		let vision = Vision::without_ocr("test");

		assert_eq!(m.select_bait(&mut screen, &vision), Some(Point::new(2, 2)));
		assert_eq!(m.mode(), BaitMode::Stockpile);
		assert_eq!(m.select_bait(&mut screen, &vision), Some(Point::new(2, 2)));
		assert_eq!(m.take_mode_change(), Some(BaitMode::Stockpile));
	}
}
