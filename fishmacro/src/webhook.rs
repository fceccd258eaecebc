//! Discord webhook notifications.

use std::{
	path::Path,
	sync::LazyLock,
	time::Duration,
};

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde_json::json;

use crate::{
	capture::Screen,
	config::{Area, WebhookSettings},
	util::validators::validate_webhook_url,
};

const TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);

const LEGENDARY_COLOR: u32 = 0xFFD700;
const FRUIT_COLOR: u32 = 0xFF6B35;

static PITY_COUNTER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"([\dOoIl]+)\s*/\s*([\dOoIl]+)").expect("valid regex"));

#[derive(Clone)]
pub struct WebhookService {
	url: String,
	user_id: String,
	agent: ureq::Agent,
}

impl WebhookService {
	pub fn new(settings: &WebhookSettings) -> Self {
		let agent = ureq::Agent::config_builder()
			.timeout_global(Some(TIMEOUT))
			.http_status_as_error(false)
			.build()
			.into();
		Self {
			url: settings.url.trim().to_string(),
			user_id: settings.user_id.trim().to_string(),
			agent,
		}
	}

	pub fn update(&mut self, settings: &WebhookSettings) {
		settings.url.trim().clone_into(&mut self.url);
		settings.user_id.trim().clone_into(&mut self.user_id);
	}

	pub fn is_configured(&self) -> bool {
		validate_webhook_url(&self.url) && !self.user_id.is_empty()
	}

	pub fn fruit_payload(&self, runtime: Duration, fruits: u64, fish: u64, legendary: bool) -> serde_json::Value {
		let runtime = format_runtime(runtime);
		let timestamp = chrono::Utc::now().to_rfc3339();
		let user = &self.user_id;

		let embed = if legendary {
			json!({
				"title": "LEGENDARY/MYTHICAL FRUIT CAUGHT!",
				"description": format!("<@{user}> **LEGENDARY PITY 0/40 DETECTED!**\nA Legendary or Mythical devil fruit has been caught!"),
				"color": LEGENDARY_COLOR,
				"fields": [
					{"name": "Rarity", "value": "**Legendary/Mythical**", "inline": true},
					{"name": "Runtime", "value": runtime, "inline": true},
					{"name": "Total Fruits", "value": fruits.to_string(), "inline": true},
					{"name": "Total Fish", "value": fish.to_string(), "inline": true},
				],
				"image": {"url": "attachment://fruit.png"},
				"timestamp": timestamp,
				"footer": {"text": "Fishing Macro - Legendary Filter Active"},
			})
		} else {
			json!({
				"title": "Devil Fruit Caught!",
				"description": format!("<@{user}> A devil fruit has been detected!"),
				"color": FRUIT_COLOR,
				"fields": [
					{"name": "Rarity", "value": "Unknown", "inline": true},
					{"name": "Runtime", "value": runtime, "inline": true},
					{"name": "Total Fruits", "value": fruits.to_string(), "inline": true},
					{"name": "Total Fish", "value": fish.to_string(), "inline": true},
				],
				"image": {"url": "attachment://fruit.png"},
				"timestamp": timestamp,
				"footer": {"text": "Fishing Macro"},
			})
		};

		json!({
			"content": format!("<@{user}>"),
			"embeds": [embed],
		})
	}

	/// Post the fruit screenshot. The screenshot is deleted whatever the outcome.
	pub fn send_fruit(&self, screenshot: &Path, runtime: Duration, fruits: u64, fish: u64, legendary: bool) -> Result<()> {
		let result = self.try_send_fruit(screenshot, runtime, fruits, fish, legendary);
		if let Err(err) = std::fs::remove_file(screenshot) {
			tracing::debug!(error = %err, path = %screenshot.display(), "failed to remove screenshot");
		}
		result
	}

	fn try_send_fruit(&self, screenshot: &Path, runtime: Duration, fruits: u64, fish: u64, legendary: bool) -> Result<()> {
		if !self.is_configured() {
			bail!("webhook is not configured");
		}
		let png = std::fs::read(screenshot).with_context(|| format!("read {}", screenshot.display()))?;
		let payload = self.fruit_payload(runtime, fruits, fish, legendary).to_string();
		let boundary = format!("fishmacro{}", chrono::Utc::now().timestamp_micros());
		let body = multipart_body(&boundary, &payload, &png);
		let content_type = format!("multipart/form-data; boundary={boundary}");

		let mut attempt = 0;
		loop {
			attempt += 1;
			let res = self
				.agent
				.post(&self.url)
				.header("Content-Type", &content_type)
				.send(&body[..]);
			match res {
				Ok(response) if response.status().is_success() => {
					tracing::info!(legendary, "fruit webhook sent");
					return Ok(());
				}
				Ok(response) if response.status().is_server_error() && attempt < MAX_ATTEMPTS => {
					tracing::warn!(status = response.status().as_u16(), attempt, "webhook server error; retrying");
				}
				Ok(response) => bail!("webhook rejected: HTTP {}", response.status().as_u16()),
				Err(err) if attempt < MAX_ATTEMPTS => {
					tracing::warn!(error = %err, attempt, "webhook transport error; retrying");
				}
				Err(err) => return Err(err).context("webhook request failed"),
			}
			std::thread::sleep(RETRY_DELAY);
		}
	}

	/// Send a plain test message.
	pub fn send_test(&self) -> Result<()> {
		if !self.is_configured() {
			bail!("Please enter a valid webhook URL and user ID first");
		}
		let response = self
			.agent
			.post(&self.url)
			.send_json(json!({"content": format!("<@{}> Test message from Fishing Macro!", self.user_id)}))
			.context("webhook request failed")?;
		match response.status().as_u16() {
			200 | 204 => Ok(()),
			status => bail!("webhook error: HTTP {status}"),
		}
	}
}

/// `HH:MM:SS`; hours are not wrapped.
pub fn format_runtime(runtime: Duration) -> String {
	let secs = runtime.as_secs();
	format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}

/// `multipart/form-data` body with a `payload_json` field and a `fruit.png` file.
pub fn multipart_body(boundary: &str, payload_json: &str, png: &[u8]) -> Vec<u8> {
	let mut body = Vec::with_capacity(png.len() + payload_json.len() + 256);
	body.extend_from_slice(
		format!(
			"--{boundary}\r\nContent-Disposition: form-data; name=\"payload_json\"\r\nContent-Type: application/json\r\n\r\n{payload_json}\r\n"
		)
		.as_bytes(),
	);
	body.extend_from_slice(
		format!(
			"--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"fruit.png\"\r\nContent-Type: image/png\r\n\r\n"
		)
		.as_bytes(),
	);
	body.extend_from_slice(png);
	body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
	body
}

/// Whether OCR'd pity text shows a legendary or mythical catch.
///
/// The pity counter resets to `0/40` on such a catch. Without a readable
/// counter the keywords decide.
pub fn pity_text_is_legendary(text: &str) -> bool {
	if let Some(caps) = PITY_COUNTER.captures(text) {
		return vision::parse_number(&caps[1], 0, 9999) == Some(0);
	}
	let lower = text.to_lowercase();
	lower.contains("legendary") || lower.contains("mythical")
}

/// OCR the pity counter. Assumes legendary when the zone or OCR is missing.
pub fn check_legendary_pity(screen: &mut dyn Screen, vision: &vision::Vision, zone: Option<Area>) -> bool {
	let Some(zone) = zone else {
		tracing::warn!("pity zone not configured; assuming legendary");
		return true;
	};
	if !vision.ocr_available() {
		tracing::warn!("OCR unavailable; assuming legendary");
		return true;
	}
	let Some(image) = screen.capture_area(zone, false) else {
		tracing::warn!("pity zone capture failed; assuming legendary");
		return true;
	};
	let text = vision.read_text(image.as_image()).unwrap_or_default();
	let legendary = pity_text_is_legendary(&text);
	tracing::info!(%text, legendary, "pity check");
	legendary
}

#[cfg(test)]
mod tests {
	use super::*;

	fn service() -> WebhookService {
		WebhookService::new(&WebhookSettings {
			url: "https://discord.com/api/webhooks/1/abc".into(),
			user_id: "123456789012345678".into(),
			..Default::default()
		})
	}

	#[test]
	fn runtime_format() {
		assert_eq!(format_runtime(Duration::from_secs(0)), "00:00:00");
		assert_eq!(format_runtime(Duration::from_secs(3 * 3600 + 25 * 60 + 7)), "03:25:07");
		assert_eq!(format_runtime(Duration::from_secs(100 * 3600)), "100:00:00");
	}

	#[test]
	fn configured_needs_url_and_user() {
		assert!(service().is_configured());
		let mut s = service();
		s.update(&WebhookSettings {
			url: "https://example.com/hook".into(),
			user_id: "123456789012345678".into(),
			..Default::default()
		});
		assert!(!s.is_configured());
		s.update(&WebhookSettings {
			url: " https://discord.com/api/webhooks/1/abc ".into(),
			user_id: String::new(),
			..Default::default()
		});
		assert!(!s.is_configured());
	}

	#[test]
	fn payload_variants() {
		let s = service();
		let legendary = s.fruit_payload(Duration::from_secs(61), 2, 30, true);
		assert_eq!(legendary["content"], "<@123456789012345678>");
		assert_eq!(legendary["embeds"][0]["color"], 0xFFD700);
		assert_eq!(legendary["embeds"][0]["fields"][1]["value"], "00:01:01");
		assert_eq!(legendary["embeds"][0]["fields"][2]["value"], "2");
		assert_eq!(legendary["embeds"][0]["image"]["url"], "attachment://fruit.png");

		let normal = s.fruit_payload(Duration::ZERO, 1, 5, false);
		assert_eq!(normal["embeds"][0]["color"], 0xFF6B35);
		assert_eq!(normal["embeds"][0]["title"], "Devil Fruit Caught!");
		assert_eq!(normal["embeds"][0]["fields"][3]["name"], "Total Fish");
	}

	#[test]
	fn multipart_layout() {
		let body = multipart_body("XYZ", "{\"a\":1}", b"PNG");
		let text = String::from_utf8(body).unwrap();
		assert!(text.starts_with("--XYZ\r\nContent-Disposition: form-data; name=\"payload_json\""));
		assert!(text.contains("\r\n\r\n{\"a\":1}\r\n--XYZ\r\n"));
		assert!(text.contains("filename=\"fruit.png\"\r\nContent-Type: image/png\r\n\r\nPNG\r\n--XYZ--\r\n"));
	}

	#[test]
	fn unconfigured_send_still_deletes_screenshot() {
		let dir = tempfile::tempdir().unwrap();
		let shot = dir.path().join("fruit.png");
		std::fs::write(&shot, b"png").unwrap();

		let s = WebhookService::new(&WebhookSettings::default());
		assert!(s.send_fruit(&shot, Duration::ZERO, 1, 0, false).is_err());
		assert!(!shot.exists());
	}

	#[test]
	fn pity_text() {
		assert!(pity_text_is_legendary("LEGENDARY PITY 0/40"));
		assert!(pity_text_is_legendary("LEGENDARY PITY 0 / 40"));
		assert!(!pity_text_is_legendary("LEGENDARY PITY 12/40"));
		assert!(pity_text_is_legendary("LEGENDARY PITY O/4O"));
		assert!(!pity_text_is_legendary("LEGENDARY PITY l2 / 4O"));
		assert!(pity_text_is_legendary("Mythical"));
		assert!(!pity_text_is_legendary(""));
	}

	#[test]
	fn pity_check_without_ocr_assumes_legendary() {
		use crate::capture::fake::FakeScreen;
		let mut screen = FakeScreen::new(vision::OwnedImage::filled(10, 10, vision::Color::BLACK));
		let v = vision::Vision::without_ocr("test");
		assert!(check_legendary_pity(&mut screen, &v, None));
		assert!(check_legendary_pity(&mut screen, &v, Some(Area::new(0, 0, 5, 5))));
		assert_eq!(screen.captures, 0);
	}
}
