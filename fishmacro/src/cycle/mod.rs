//! The fishing cycle: cast, wait for the minigame, play it, handle the catch.
//!
//! [`FishingCycle::main_loop`] runs on the engine's worker thread. It reads a
//! fresh settings snapshot every cycle, so edits made in the UI apply on the
//! next cast.

mod autocraft;
mod minigame;
pub mod pd;
mod precast;

use std::{
	sync::{
		atomic::{AtomicU32, AtomicU64, Ordering},
		Arc, Mutex, RwLock,
	},
	time::{Duration, Instant},
};

use stats::StatsStore;
use vision::Vision;

use crate::{
	bait::BaitManager,
	capture::Screen,
	config::{Point, Settings},
	craft::CraftAutomation,
	engine::{MacroError, MacroResult},
	input::{self, Input, Key, MouseState},
	util::{
		timing::{interruptible_sleep, secs, sleep_secs, wait_while_paused, RunFlag},
		watchdog::Watchdog,
	},
	webhook::WebhookService,
};
use pd::PdController;

const CLICK_HOLD: Duration = Duration::from_millis(50);

/// Live counters shared with the UI.
#[derive(Debug, Default)]
pub struct Counters {
	fish: AtomicU64,
	fruits: AtomicU64,
	fps: AtomicU32,
	avg_cycle_ms: AtomicU64,
}

impl Counters {
	pub fn fish(&self) -> u64 {
		self.fish.load(Ordering::Relaxed)
	}

	pub fn fruits(&self) -> u64 {
		self.fruits.load(Ordering::Relaxed)
	}

	/// Minigame frames analysed per second.
	pub fn fps(&self) -> f32 {
		f32::from_bits(self.fps.load(Ordering::Relaxed))
	}

	pub fn average_cycle(&self) -> Duration {
		Duration::from_millis(self.avg_cycle_ms.load(Ordering::Relaxed))
	}

	pub fn reset(&self) {
		self.fish.store(0, Ordering::Relaxed);
		self.fruits.store(0, Ordering::Relaxed);
		self.fps.store(0, Ordering::Relaxed);
		self.avg_cycle_ms.store(0, Ordering::Relaxed);
	}

	fn set_fps(&self, fps: f32) {
		self.fps.store(fps.to_bits(), Ordering::Relaxed);
	}
}

/// Whether the auto-craft sequence is due at `fish` caught fish.
///
/// `n == 0` crafts every cycle. Otherwise craft on multiples of `n` (and at
/// zero), at most once per fish count.
pub fn should_craft(fish: u64, n: u64, last_craft: Option<u64>) -> bool {
	if n == 0 {
		return true;
	}
	(fish == 0 || fish % n == 0) && last_craft != Some(fish)
}

pub struct FishingCycle {
	screen: Box<dyn Screen>,
	input: Box<dyn Input>,
	shared_settings: Arc<RwLock<Settings>>,
	settings: Settings,
	vision: Arc<Vision>,
	stats: Arc<Mutex<StatsStore>>,
	webhook: WebhookService,
	bait: BaitManager,
	craft: CraftAutomation,
	counters: Arc<Counters>,

	first_run: bool,
	first_catch: bool,
	purchases_left: u32,
	last_craft_count: Option<u64>,

	mouse: MouseState,
	pd: PdController,
	lost_frames: u32,
	last_resend: Instant,

	fps_frames: u32,
	fps_since: Instant,
	last_heartbeat: Instant,

	session_started: Instant,
	cycle_started: Option<Instant>,
	cycles: u32,
	cycle_total: Duration,

	watchdog: Option<Watchdog>,
}

impl FishingCycle {
	pub fn new(
		screen: Box<dyn Screen>,
		input: Box<dyn Input>,
		shared_settings: Arc<RwLock<Settings>>,
		vision: Arc<Vision>,
		stats: Arc<Mutex<StatsStore>>,
		counters: Arc<Counters>,
	) -> Self {
		let settings = read_settings(&shared_settings);
		let now = Instant::now();
		Self {
			screen,
			input,
			webhook: WebhookService::new(&settings.webhook),
			bait: BaitManager::new(settings.smart_bait.clone()),
			craft: CraftAutomation::new(),
			pd: PdController::new(&settings.pd),
			shared_settings,
			settings,
			vision,
			stats,
			counters,
			first_run: true,
			first_catch: true,
			purchases_left: 0,
			last_craft_count: None,
			mouse: MouseState::default(),
			lost_frames: 0,
			last_resend: now,
			fps_frames: 0,
			fps_since: now,
			last_heartbeat: now,
			session_started: now,
			cycle_started: None,
			cycles: 0,
			cycle_total: Duration::ZERO,
			watchdog: None,
		}
	}

	/// Run cycles until the flag is cleared. The session is recorded in the stats store.
	pub fn main_loop(&mut self, flag: &RunFlag) -> MacroResult {
		self.session_started = Instant::now();
		self.counters.reset();
		self.with_stats(|stats| stats.start_session().map(drop));
		self.watchdog = Some(Watchdog::start(
			"fishing",
			flag.clone(),
			Watchdog::DEFAULT_THRESHOLD,
			Watchdog::DEFAULT_INTERVAL,
		));
		tracing::info!("fishing loop started");

		let res = self.run_cycles(flag);

		self.mouse.release(&mut *self.input);
		if let Some(mut dog) = self.watchdog.take() {
			dog.stop();
		}
		self.with_stats(|stats| stats.end_session());
		match &res {
			Ok(()) | Err(MacroError::Stopped) => tracing::info!(
				fish = self.counters.fish(),
				fruits = self.counters.fruits(),
				"fishing loop finished"
			),
			Err(err) => tracing::error!(error = %err, "fishing loop failed"),
		}
		res
	}

	fn run_cycles(&mut self, flag: &RunFlag) -> MacroResult {
		loop {
			wait_while_paused(flag)?;
			flag.check()?;
			self.refresh_settings();

			if self.mouse.is_held() {
				self.mouse.release(&mut *self.input);
			}

			if self.first_run {
				self.first_run_setup(flag)?;
				self.first_run = false;
			}

			if self.settings.auto_craft.enabled {
				if !self.auto_craft_pre_cast(flag)? {
					interruptible_sleep(Duration::from_millis(500), flag)?;
					continue;
				}
				interruptible_sleep(Duration::from_millis(200), flag)?;
				continue;
			}

			self.start_cycle_timer();
			self.pre_cast(flag)?;

			let area = self.settings.area;
			self.activity("waiting for minigame");
			if !self.wait_for_minigame(area, flag)? {
				continue;
			}

			self.activity("fishing");
			self.pd.reset();
			self.lost_frames = 0;
			while self.fish_minigame(area, false, flag)? {}
			self.mouse.release(&mut *self.input);

			self.check_anti_macro(area, flag)?;

			if self.settings.camera_enabled() {
				let adv = &self.settings.advanced;
				input::rotate_camera(
					&mut *self.input,
					adv.camera_rotation_steps,
					-100,
					secs(adv.camera_rotation_step_delay),
					flag,
				)?;
			}
			interruptible_sleep(Duration::from_millis(500), flag)?;
		}
	}

	fn first_run_setup(&mut self, flag: &RunFlag) -> MacroResult {
		self.activity("first run setup");
		if !self.input.focus_game_window() {
			tracing::warn!("game window not found; continuing unfocused");
		}
		sleep_secs(0.5, flag)?;
		self.reselect_rod(flag)?;

		let tick = Duration::from_millis(10);
		input::zoom(&mut *self.input, 30, tick, flag)?;
		sleep_secs(0.1, flag)?;
		let out = if self.settings.camera_enabled() || self.settings.auto_craft.enabled { 13 } else { 5 };
		input::zoom(&mut *self.input, -out, tick, flag)?;
		sleep_secs(self.settings.advanced.rod_select_delay, flag)?;
		tracing::info!("first run setup complete");
		Ok(())
	}

	/// Take a settings snapshot and push it into the services.
	fn refresh_settings(&mut self) {
		let fresh = read_settings(&self.shared_settings);
		if fresh.pd != self.settings.pd {
			self.pd = PdController::new(&fresh.pd);
		}
		self.webhook.update(&fresh.webhook);
		self.bait.update_settings(&fresh.smart_bait);
		self.settings = fresh;
		self.settings.smart_bait.mode = self.bait.mode();
	}

	/// Persist an automatic bait mode switch.
	fn persist_bait_mode(&mut self) {
		let Some(mode) = self.bait.take_mode_change() else {
			return;
		};
		self.settings.smart_bait.mode = mode;
		let mut shared = self.shared_settings.write().unwrap_or_else(|e| e.into_inner());
		shared.set_bait_mode(mode);
	}

	fn activity(&self, what: &str) {
		if let Some(dog) = &self.watchdog {
			dog.set_activity(what);
			dog.heartbeat();
		}
	}

	fn heartbeat(&mut self) {
		if self.last_heartbeat.elapsed() < Duration::from_millis(500) {
			return;
		}
		self.last_heartbeat = Instant::now();
		if let Some(dog) = &self.watchdog {
			dog.heartbeat();
		}
	}

	fn with_stats(&self, f: impl FnOnce(&mut StatsStore) -> anyhow::Result<()>) {
		let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
		if let Err(err) = f(&mut stats) {
			tracing::warn!(error = %err, "stats write failed");
		}
	}

	fn count_fish(&mut self) {
		let fish = self.counters.fish.fetch_add(1, Ordering::Relaxed) + 1;
		self.with_stats(|stats| stats.log_fish());
		tracing::info!(fish, "fish caught");
	}

	fn count_fruit(&mut self) {
		self.first_catch = false;
		let fruits = self.counters.fruits.fetch_add(1, Ordering::Relaxed) + 1;
		self.with_stats(|stats| stats.log_fruit());
		tracing::info!(fruits, "devil fruit caught");
	}

	pub fn start_cycle_timer(&mut self) {
		self.cycle_started = Some(Instant::now());
	}

	pub fn end_cycle_timer(&mut self) {
		let Some(started) = self.cycle_started.take() else {
			return;
		};
		let took = started.elapsed();
		self.cycles += 1;
		self.cycle_total += took;
		let average = self.cycle_total / self.cycles;
		self.counters
			.avg_cycle_ms
			.store(average.as_millis() as u64, Ordering::Relaxed);
		tracing::info!(
			cycle_s = format!("{:.2}", took.as_secs_f64()),
			average_s = format!("{:.2}", average.as_secs_f64()),
			cycles = self.cycles,
			"cycle complete"
		);
	}

	fn tap_twice(&mut self, key: Key, gap: f64, flag: &RunFlag) -> MacroResult {
		input::tap(&mut *self.input, key, flag)?;
		sleep_secs(gap, flag)?;
		input::tap(&mut *self.input, key, flag)
	}

	/// Deselect everything, then select the rod.
	fn reselect_rod(&mut self, flag: &RunFlag) -> MacroResult {
		let hotkeys = &self.settings.hotkeys;
		let adv = &self.settings.advanced;
		input::tap_hotkey(&mut *self.input, &hotkeys.everything_else, flag)?;
		sleep_secs(adv.rod_deselect_delay, flag)?;
		input::tap_hotkey(&mut *self.input, &hotkeys.rod, flag)?;
		sleep_secs(adv.rod_select_delay, flag)
	}

	fn click_point(&mut self, p: Point, flag: &RunFlag) -> MacroResult {
		input::click(&mut *self.input, p, CLICK_HOLD, flag)
	}

	/// Click the top bait slot when auto-selection is on.
	fn click_top_bait(&mut self, flag: &RunFlag) -> MacroResult {
		if !self.settings.precast.auto_select_top_bait {
			return Ok(());
		}
		match self.settings.precast.top_bait_point {
			Some(p) => {
				self.click_point(p, flag)?;
				sleep_secs(self.settings.advanced.bait_click_delay, flag)
			}
			None => Ok(()),
		}
	}

	/// Hold the left button at `at` for the cast duration. The button is released even when stopped.
	fn cast(&mut self, at: Option<Point>, flag: &RunFlag) -> MacroResult {
		if let Some(p) = at {
			self.input.move_to(p);
			sleep_secs(self.settings.advanced.mouse_move_settle, flag)?;
			self.input.move_relative(1, 0);
		} else {
			tracing::debug!("no water point; casting at the cursor");
		}
		self.mouse.force(&mut *self.input, true);
		let res = sleep_secs(self.settings.casting.cast_hold_duration, flag);
		self.mouse.force(&mut *self.input, false);
		res
	}
}

fn read_settings(shared: &RwLock<Settings>) -> Settings {
	shared.read().unwrap_or_else(|e| e.into_inner()).clone()
}

#[cfg(test)]
pub(crate) mod tests {
	use vision::{minigame, Color, OwnedImage};

	use super::*;
	use crate::{
		capture::fake::FakeScreen,
		config::Area,
		input::fake::{Event, RecordingInput},
	};

	/// Input that keeps its recording reachable after being boxed.
	#[derive(Clone, Default)]
	pub struct SharedInput(pub Arc<Mutex<RecordingInput>>);

	impl SharedInput {
		pub fn events(&self) -> Vec<Event> {
			self.0.lock().unwrap().events.clone()
		}

		pub fn taps(&self) -> Vec<Key> {
			self.0.lock().unwrap().taps()
		}
	}

	impl Input for SharedInput {
		fn move_to(&mut self, p: Point) {
			self.0.lock().unwrap().move_to(p)
		}
		fn move_relative(&mut self, dx: i32, dy: i32) {
			self.0.lock().unwrap().move_relative(dx, dy)
		}
		fn left_down(&mut self) {
			self.0.lock().unwrap().left_down()
		}
		fn left_up(&mut self) {
			self.0.lock().unwrap().left_up()
		}
		fn right_down(&mut self) {
			self.0.lock().unwrap().right_down()
		}
		fn right_up(&mut self) {
			self.0.lock().unwrap().right_up()
		}
		fn scroll(&mut self, notches: i32) {
			self.0.lock().unwrap().scroll(notches)
		}
		fn key_down(&mut self, key: Key) {
			self.0.lock().unwrap().key_down(key)
		}
		fn key_up(&mut self, key: Key) {
			self.0.lock().unwrap().key_up(key)
		}
		fn focus_game_window(&mut self) -> bool {
			self.0.lock().unwrap().focus_game_window()
		}
	}

	pub const BG: Color = Color::new(90, 120, 60);

	/// A 40x200 minigame frame with the bar at column 20.
	pub fn bar_frame(white: Option<(u32, u32)>, fish: Option<(u32, u32)>) -> OwnedImage {
		OwnedImage::from_fn(40, 200, |x, y| {
			if (18..=22).contains(&x) && y < 5 {
				return minigame::TARGET_BLUE;
			}
			if x != 20 {
				return BG;
			}
			if y == 10 || y == 190 {
				return minigame::BAR_BLACK;
			}
			if fish.is_some_and(|(a, b)| (a..=b).contains(&y)) {
				return minigame::BAR_BLACK;
			}
			if white.is_some_and(|(a, b)| (a..=b).contains(&y)) {
				return minigame::WHITE;
			}
			if (10..=190).contains(&y) {
				return minigame::DARK_GRAY;
			}
			BG
		})
	}

	pub struct Harness {
		pub cycle: FishingCycle,
		pub input: SharedInput,
		pub counters: Arc<Counters>,
		pub stats: Arc<Mutex<StatsStore>>,
		_dir: tempfile::TempDir,
	}

	pub fn harness(frame: OwnedImage, tweak: impl FnOnce(&mut Settings)) -> Harness {
		let dir = tempfile::tempdir().unwrap();
		let mut settings = Settings::default();
		settings.area = Area::new(0, 0, frame.width(), frame.height());
		settings.auto_craft_area = settings.area;
		tweak(&mut settings);

		let input = SharedInput::default();
		let counters = Arc::new(Counters::default());
		let stats = Arc::new(Mutex::new(StatsStore::open(dir.path().join("stats.json")).unwrap()));
		let cycle = FishingCycle::new(
			Box::new(FakeScreen::new(frame)),
			Box::new(input.clone()),
			Arc::new(RwLock::new(settings)),
			Arc::new(Vision::without_ocr("test")),
			stats.clone(),
			counters.clone(),
		);
		Harness {
			cycle,
			input,
			counters,
			stats,
			_dir: dir,
		}
	}

	pub fn running() -> RunFlag {
		let flag = RunFlag::new();
		flag.start();
		flag
	}

	#[test]
	fn craft_schedule() {
		assert!(should_craft(0, 10, None));
		assert!(!should_craft(0, 10, Some(0)));
		assert!(!should_craft(7, 10, None));
		assert!(should_craft(20, 10, Some(10)));
		assert!(!should_craft(20, 10, Some(20)));
		assert!(should_craft(20, 0, Some(20)));
	}

	#[test]
	fn cycle_timer_tracks_average() {
		let mut h = harness(OwnedImage::filled(10, 10, BG), |_| {});
		h.cycle.end_cycle_timer();
		assert_eq!(h.cycle.cycles, 0);

		h.cycle.start_cycle_timer();
		std::thread::sleep(Duration::from_millis(20));
		h.cycle.end_cycle_timer();
		assert_eq!(h.cycle.cycles, 1);
		assert!(h.counters.average_cycle() >= Duration::from_millis(20));
	}

	#[test]
	fn cast_releases_when_stopped() {
		let mut h = harness(OwnedImage::filled(10, 10, BG), |s| s.casting.cast_hold_duration = 5.0);
		let flag = RunFlag::new();
		let res = h.cycle.cast(None, &flag);
		assert!(matches!(res, Err(MacroError::Stopped)));
		assert_eq!(h.input.events(), vec![Event::LeftDown, Event::LeftUp]);
		assert!(!h.cycle.mouse.is_held());
	}

	#[test]
	fn stopped_loop_closes_the_session() {
		let mut h = harness(OwnedImage::filled(10, 10, BG), |_| {});
		let res = h.cycle.main_loop(&RunFlag::new());
		assert!(matches!(res, Err(MacroError::Stopped)));
		let stats = h.stats.lock().unwrap();
		assert_eq!(stats.current_session(), None);
		assert_eq!(stats.sessions().len(), 1);
		assert!(stats.sessions()[0].end_time.is_some());
	}

	fn bar_area() -> Area {
		Area::new(0, 0, 40, 200)
	}

	#[test]
	fn lost_fish_keeps_the_press_for_three_frames() {
		let mut h = harness(bar_frame(Some((50, 80)), None), |_| {});
		let flag = running();
		h.cycle.mouse.set(&mut *h.cycle.input, true);
		for frame in 1..=3 {
			assert!(h.cycle.fish_minigame(bar_area(), false, &flag).unwrap());
			assert!(h.cycle.mouse.is_held(), "released after {frame} lost frames");
		}
		assert!(h.cycle.fish_minigame(bar_area(), false, &flag).unwrap());
		assert!(!h.cycle.mouse.is_held());
		assert_eq!(h.input.events(), vec![Event::LeftDown, Event::LeftUp]);
		assert_eq!(h.cycle.pd.last_error(), Some(0.0));
	}

	#[test]
	fn auto_craft_holds_as_soon_as_the_fish_is_lost() {
		let mut h = harness(bar_frame(Some((50, 80)), None), |s| s.advanced.fruit_detection_delay = 0.0);
		assert!(h.cycle.fish_minigame(bar_area(), true, &running()).unwrap());
		assert!(h.cycle.mouse.is_held());
		assert_eq!(h.cycle.lost_frames, 0);
		assert_eq!(h.input.events(), vec![Event::LeftDown]);
	}

	#[test]
	fn missing_frame_keeps_mouse_and_lost_count() {
		let mut frame = bar_frame(Some((50, 80)), Some((100, 110)));
		frame.map_pixels(|c| {
			if *c == minigame::BAR_BLACK {
				*c = minigame::DARK_GRAY;
			}
		});
		let mut h = harness(frame, |_| {});
		h.cycle.mouse.set(&mut *h.cycle.input, true);
		h.cycle.lost_frames = 2;
		assert!(h.cycle.fish_minigame(bar_area(), false, &running()).unwrap());
		assert!(h.cycle.mouse.is_held());
		assert_eq!(h.cycle.lost_frames, 2);
		assert_eq!(h.input.events(), vec![Event::LeftDown]);
	}

	#[test]
	fn uncounted_first_catch_is_not_timed() {
		let mut h = harness(OwnedImage::filled(40, 200, BG), |_| {});
		let flag = running();
		h.cycle.start_cycle_timer();
		assert!(!h.cycle.fish_minigame(bar_area(), false, &flag).unwrap());
		assert_eq!(h.counters.fish(), 0);
		assert_eq!(h.cycle.cycles, 0);

		h.cycle.start_cycle_timer();
		assert!(!h.cycle.fish_minigame(bar_area(), false, &flag).unwrap());
		assert_eq!(h.counters.fish(), 1);
		assert_eq!(h.cycle.cycles, 1);
	}
}
