//! Persistent application settings.
//!
//! Stored as pretty JSON (`settings.json`) in the application directory. Every
//! section carries `#[serde(default)]`, so files written by older versions load
//! with the missing fields filled in.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const SETTINGS_FILE: &str = "settings.json";

/// Coordinates in the defaults are authored for this resolution.
pub const REFERENCE_SIZE: (u32, u32) = (1920, 1080);

/// Screen position in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn scaled(self, screen: (u32, u32)) -> Self {
        Self {
            x: scale(self.x, screen.0, REFERENCE_SIZE.0),
            y: scale(self.y, screen.1, REFERENCE_SIZE.1),
        }
    }
}

/// Screen rectangle in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Area {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Area {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn scaled(self, screen: (u32, u32)) -> Self {
        Self {
            x: scale(self.x, screen.0, REFERENCE_SIZE.0),
            y: scale(self.y, screen.1, REFERENCE_SIZE.1),
            width: scale(self.width as i32, screen.0, REFERENCE_SIZE.0).max(0) as u32,
            height: scale(self.height as i32, screen.1, REFERENCE_SIZE.1).max(0) as u32,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x + self.width as i32 / 2,
            self.y + self.height as i32 / 2,
        )
    }
}

fn scale(v: i32, actual: u32, reference: u32) -> i32 {
    (v as i64 * actual as i64 / reference as i64) as i32
}

/// RGB triple as stored in the settings file.
pub type Rgb = [u8; 3];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hotkeys {
    pub rod: String,
    pub everything_else: String,
    pub fruit: String,
}

impl Default for Hotkeys {
    fn default() -> Self {
        Self {
            rod: "1".into(),
            everything_else: "2".into(),
            fruit: "3".into(),
        }
    }
}

/// System-wide shortcuts, in `global-hotkey` syntax (`F1`, `ctrl+KeyS`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalHotkeys {
    pub start_stop: String,
    pub change_area: String,
    pub exit: String,
}

impl Default for GlobalHotkeys {
    fn default() -> Self {
        Self {
            start_stop: "F1".into(),
            change_area: "F2".into(),
            exit: "F3".into(),
        }
    }
}

/// Minigame controller gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdSettings {
    pub kp: f64,
    pub kd: f64,
    pub clamp: f64,
}

impl Default for PdSettings {
    fn default() -> Self {
        Self {
            kp: 1.0,
            kd: 0.3,
            clamp: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CastingSettings {
    pub cast_hold_duration: f64,
    pub recast_timeout: f64,
    pub fishing_end_delay: f64,
}

impl Default for CastingSettings {
    fn default() -> Self {
        Self {
            cast_hold_duration: 1.0,
            recast_timeout: 30.0,
            fishing_end_delay: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecastSettings {
    pub auto_buy_bait: bool,
    pub auto_store_fruit: bool,
    pub auto_select_top_bait: bool,
    pub yes_button: Option<Point>,
    pub middle_button: Option<Point>,
    pub no_button: Option<Point>,
    pub loops_per_purchase: u32,
    pub fruit_point: Option<Point>,
    pub fruit_color: Option<Rgb>,
    pub top_bait_point: Option<Point>,
    pub store_in_inventory: bool,
    pub inventory_fruit_point: Option<Point>,
    pub inventory_center_point: Option<Point>,
}

impl Default for PrecastSettings {
    fn default() -> Self {
        Self {
            auto_buy_bait: true,
            auto_store_fruit: true,
            auto_select_top_bait: true,
            yes_button: None,
            middle_button: None,
            no_button: None,
            loops_per_purchase: 100,
            fruit_point: None,
            fruit_color: Some([7, 116, 45]),
            top_bait_point: None,
            store_in_inventory: false,
            inventory_fruit_point: None,
            inventory_center_point: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    pub url: String,
    pub user_id: String,
    pub only_legendary: bool,
    pub pity_zone: Option<Area>,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            user_id: String::new(),
            only_legendary: false,
            pity_zone: Some(Area::new(851, 135, 222, 32)),
        }
    }
}

/// Timing knobs, all in seconds unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    pub camera_rotation_delay: f64,
    pub camera_rotation_steps: u32,
    pub camera_rotation_step_delay: f64,
    pub camera_rotation_settle_delay: f64,
    pub zoom_ticks: u32,
    pub zoom_tick_delay: f64,
    pub zoom_settle_delay: f64,
    pub pre_cast_minigame_wait: f64,
    pub store_click_delay: f64,
    pub backspace_delay: f64,
    pub rod_deselect_delay: f64,
    pub rod_select_delay: f64,
    pub bait_click_delay: f64,
    pub fruit_detection_delay: f64,
    pub fruit_detection_settle: f64,
    pub general_action_delay: f64,
    pub mouse_move_settle: f64,
    pub focus_settle_delay: f64,
    /// Skip camera alignment and rotation entirely.
    pub disable_normal_camera: bool,
    pub fruit_hold_delay: f64,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            camera_rotation_delay: 0.05,
            camera_rotation_steps: 8,
            camera_rotation_step_delay: 0.05,
            camera_rotation_settle_delay: 0.3,
            zoom_ticks: 3,
            zoom_tick_delay: 0.05,
            zoom_settle_delay: 0.3,
            pre_cast_minigame_wait: 2.5,
            store_click_delay: 1.0,
            backspace_delay: 0.3,
            rod_deselect_delay: 0.5,
            rod_select_delay: 0.5,
            bait_click_delay: 0.3,
            fruit_detection_delay: 0.02,
            fruit_detection_settle: 0.3,
            general_action_delay: 0.05,
            mouse_move_settle: 0.05,
            focus_settle_delay: 1.0,
            disable_normal_camera: true,
            fruit_hold_delay: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoCraftSettings {
    pub enabled: bool,
    pub water_point: Option<Point>,
    pub craft_every_n_fish: u64,
    pub craft_menu_delay: f64,
    pub craft_click_speed: f64,
    pub legendary_quantity: u32,
    pub rare_quantity: u32,
    pub common_quantity: u32,
    pub craft_button: Option<Point>,
    pub plus_button: Option<Point>,
    pub fish_icon: Option<Point>,
    pub legendary_bait: Option<Point>,
    pub rare_bait: Option<Point>,
    pub common_bait: Option<Point>,
}

impl Default for AutoCraftSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            water_point: None,
            craft_every_n_fish: 10,
            craft_menu_delay: 0.5,
            craft_click_speed: 0.2,
            legendary_quantity: 1,
            rare_quantity: 1,
            common_quantity: 1,
            craft_button: None,
            plus_button: None,
            fish_icon: None,
            legendary_bait: None,
            rare_bait: None,
            common_bait: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaitMode {
    /// Spend legendary bait down to the last one.
    Burning,
    /// Fish with rare bait until the legendary target is reached.
    Stockpile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackBait {
    Legendary,
    Rare,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartBaitSettings {
    pub enabled: bool,
    pub mode: BaitMode,
    pub legendary_target: u32,
    pub ocr_timeout_ms: u64,
    pub ocr_confidence_min: f32,
    pub fallback: FallbackBait,
    pub debug_screenshots: bool,
    pub use_ocr: bool,
    pub menu_zone: Option<Area>,
    pub top_zone: Option<Area>,
    pub mid_zone: Option<Area>,
    pub top_bait_point: Option<Point>,
    pub second_bait_point: Option<Point>,
}

impl Default for SmartBaitSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: BaitMode::Stockpile,
            legendary_target: 50,
            ocr_timeout_ms: 1500,
            ocr_confidence_min: 0.4,
            fallback: FallbackBait::Legendary,
            debug_screenshots: false,
            use_ocr: true,
            menu_zone: Some(Area::new(831, 783, 257, 127)),
            top_zone: Some(Area::new(841, 787, 239, 26)),
            mid_zone: Some(Area::new(851, 828, 177, 16)),
            top_bait_point: None,
            second_bait_point: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub always_on_top: bool,
    pub hud_position: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            always_on_top: true,
            hud_position: "top".into(),
        }
    }
}

/// On-disk configuration for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Screen area watched for the minigame.
    pub area: Area,
    pub auto_craft_area: Area,
    pub water_point: Option<Point>,
    pub hotkeys: Hotkeys,
    pub global_hotkeys: GlobalHotkeys,
    pub pd: PdSettings,
    pub casting: CastingSettings,
    pub precast: PrecastSettings,
    pub webhook: WebhookSettings,
    pub advanced: AdvancedSettings,
    pub auto_craft: AutoCraftSettings,
    pub smart_bait: SmartBaitSettings,
    pub ui: UiSettings,
}

/// Reference (1920x1080) defaults. Use [`Settings::defaults_for`] for a real screen.
impl Default for Settings {
    fn default() -> Self {
        Self {
            area: Area::new(1106, 181, 500, 751),
            auto_craft_area: Area::new(1269, -4, 498, 1092),
            water_point: None,
            hotkeys: Hotkeys::default(),
            global_hotkeys: GlobalHotkeys::default(),
            pd: PdSettings::default(),
            casting: CastingSettings::default(),
            precast: PrecastSettings::default(),
            webhook: WebhookSettings::default(),
            advanced: AdvancedSettings::default(),
            auto_craft: AutoCraftSettings::default(),
            smart_bait: SmartBaitSettings::default(),
            ui: UiSettings::default(),
        }
    }
}

impl Settings {
    /// Defaults with every default coordinate scaled to `screen`.
    pub fn defaults_for(screen: (u32, u32)) -> Self {
        let mut s = Self::default();
        s.area = s.area.scaled(screen);
        s.auto_craft_area = s.auto_craft_area.scaled(screen);
        s.webhook.pity_zone = s.webhook.pity_zone.map(|a| a.scaled(screen));
        s.smart_bait.menu_zone = s.smart_bait.menu_zone.map(|a| a.scaled(screen));
        s.smart_bait.top_zone = s.smart_bait.top_zone.map(|a| a.scaled(screen));
        s.smart_bait.mid_zone = s.smart_bait.mid_zone.map(|a| a.scaled(screen));
        s
    }

    /// Path to the settings file.
    pub fn path() -> PathBuf {
        crate::util::app_dir().join(SETTINGS_FILE)
    }

    /// Load settings from disk, falling back to defaults on any failure.
    ///
    /// A missing file is created with defaults scaled to the primary screen.
    pub fn load_or_default() -> Self {
        let path = Self::path();
        let screen = crate::capture::primary_screen_size();
        if !path.exists() {
            let settings = Self::defaults_for(screen);
            if let Err(err) = settings.save_to(&path) {
                tracing::warn!(error = %err, "failed to write default settings");
            }
            return settings;
        }
        match Self::try_load(&path) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load settings; using defaults");
                Self::defaults_for(screen)
            }
        }
    }

    /// Try to load settings from `path`. A missing file yields reference defaults.
    pub fn try_load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
        let settings = serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))?;
        Ok(settings)
    }

    /// Save settings to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("serialize settings")?;
        fs::write(path, json).with_context(|| format!("write {:?}", path))?;
        Ok(())
    }

    /// Save to the default location, logging failures.
    pub fn save(&self) {
        if let Err(err) = self.save_to(&Self::path()) {
            tracing::warn!(error = %err, "failed to save settings");
        }
    }

    pub fn set_area(&mut self, area: Area) {
        self.area = area;
        self.save();
    }

    pub fn set_hotkeys(&mut self, rod: &str, everything_else: &str, fruit: &str) {
        self.hotkeys = Hotkeys {
            rod: rod.into(),
            everything_else: everything_else.into(),
            fruit: fruit.into(),
        };
        self.save();
    }

    pub fn set_bait_mode(&mut self, mode: BaitMode) {
        self.smart_bait.mode = mode;
        self.save();
    }

    /// Minigame area for the active mode.
    pub fn active_area(&self) -> Area {
        if self.auto_craft.enabled {
            self.auto_craft_area
        } else {
            self.area
        }
    }

    /// Camera alignment and rotation run only with the normal camera enabled.
    pub fn camera_enabled(&self) -> bool {
        !self.advanced.disable_normal_camera
    }

    pub fn fruit_color(&self) -> Option<vision::Color> {
        self.precast.fruit_color.map(vision::Color::from_array)
    }
}
