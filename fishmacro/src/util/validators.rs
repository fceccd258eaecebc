use crate::config::{Area, Point};

const WEBHOOK_PREFIXES: [&str; 2] = [
	"https://discord.com/api/webhooks/",
	"https://discordapp.com/api/webhooks/",
];

pub fn validate_webhook_url(url: &str) -> bool {
	WEBHOOK_PREFIXES.iter().any(|p| url.starts_with(p))
}

/// Discord snowflake, or empty.
pub fn validate_user_id(id: &str) -> bool {
	id.is_empty() || ((17..=20).contains(&id.len()) && id.bytes().all(|b| b.is_ascii_digit()))
}

pub fn validate_point(point: Option<Point>, screen: (u32, u32)) -> bool {
	let Some(p) = point else { return true };
	(0..=screen.0 as i64).contains(&(p.x as i64)) && (0..=screen.1 as i64).contains(&(p.y as i64))
}

pub fn validate_area(area: Option<Area>, screen: (u32, u32)) -> bool {
	let Some(a) = area else { return false };
	a.width > 0
		&& a.height > 0
		&& a.x >= 0
		&& a.y >= 0
		&& a.x as i64 + a.width as i64 <= screen.0 as i64
		&& a.y as i64 + a.height as i64 <= screen.1 as i64
}
