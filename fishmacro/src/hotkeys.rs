//! System-wide shortcuts, active while the game window has focus.

use std::str::FromStr;

use anyhow::Context;
use global_hotkey::{hotkey::HotKey, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};

use crate::config::GlobalHotkeys;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
	StartStop,
	ChangeArea,
	Exit,
}

/// Parse a binding such as `F1` or `ctrl+shift+KeyQ`.
pub fn parse_binding(text: &str) -> Option<HotKey> {
	let text = text.trim();
	if text.is_empty() {
		return None;
	}
	HotKey::from_str(text).ok()
}

/// Resolve the configured bindings. Blank entries are unbound; invalid or
/// repeated ones are skipped.
pub fn resolve(config: &GlobalHotkeys) -> Vec<(HotkeyAction, HotKey)> {
	let mut out: Vec<(HotkeyAction, HotKey)> = Vec::new();
	for (action, text) in [
		(HotkeyAction::StartStop, &config.start_stop),
		(HotkeyAction::ChangeArea, &config.change_area),
		(HotkeyAction::Exit, &config.exit),
	] {
		if text.trim().is_empty() {
			continue;
		}
		match parse_binding(text) {
			Some(key) if out.iter().any(|(_, bound)| bound.id() == key.id()) => {
				tracing::warn!(?action, binding = %text, "hotkey already bound; skipped");
			}
			Some(key) => out.push((action, key)),
			None => tracing::warn!(?action, binding = %text, "unrecognised hotkey"),
		}
	}
	out
}

fn action_for(bound: &[(HotkeyAction, HotKey)], id: u32) -> Option<HotkeyAction> {
	bound.iter().find(|(_, key)| key.id() == id).map(|(action, _)| *action)
}

/// Registered shortcuts. Must live on the UI thread.
pub struct HotkeyListener {
	manager: GlobalHotKeyManager,
	bound: Vec<(HotkeyAction, HotKey)>,
	config: GlobalHotkeys,
}

impl HotkeyListener {
	pub fn new(config: &GlobalHotkeys) -> anyhow::Result<Self> {
		let manager = GlobalHotKeyManager::new().context("create global hotkey manager")?;
		let mut listener = Self {
			manager,
			bound: Vec::new(),
			config: config.clone(),
		};
		listener.register();
		Ok(listener)
	}

	fn register(&mut self) {
		for (action, key) in resolve(&self.config) {
			match self.manager.register(key) {
				Ok(()) => {
					tracing::debug!(?action, ?key, "hotkey registered");
					self.bound.push((action, key));
				}
				Err(err) => tracing::warn!(?action, error = %err, "hotkey registration failed"),
			}
		}
	}

	/// Re-register after the bindings were edited.
	pub fn sync(&mut self, config: &GlobalHotkeys) {
		if *config == self.config {
			return;
		}
		let keys = self.bound.drain(..).map(|(_, key)| key).collect::<Vec<_>>();
		if let Err(err) = self.manager.unregister_all(&keys) {
			tracing::warn!(error = %err, "failed to release old hotkeys");
		}
		self.config = config.clone();
		self.register();
	}

	/// Actions pressed since the last poll.
	pub fn poll(&self) -> Vec<HotkeyAction> {
		GlobalHotKeyEvent::receiver()
			.try_iter()
			.filter(|event| event.state == HotKeyState::Pressed)
			.filter_map(|event| action_for(&self.bound, event.id))
			.collect()
	}
}
