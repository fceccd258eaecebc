use std::{
	collections::HashMap,
	path::PathBuf,
	time::{Duration, Instant},
};

use vision::{Color, OwnedImage};
use xcap::image::EncodableLayout;

use crate::config::{Area, Point, REFERENCE_SIZE};

const CACHE_TTL: Duration = Duration::from_millis(16);

/// Source of screen pixels. The cycle only sees the screen through this.
pub trait Screen: Send {
	/// Capture `area` (clamped to the screen). `use_cache` allows a frame up to 16 ms old.
	fn capture_area(&mut self, area: Area, use_cache: bool) -> Option<OwnedImage>;

	fn capture_pixel(&mut self, point: Point) -> Option<Color> {
		let image = self.capture_area(Area::new(point.x, point.y, 1, 1), false)?;
		image.pixel(0, 0)
	}

	fn screen_size(&self) -> (u32, u32);

	fn clear_cache(&mut self) {}
}

fn primary_monitor() -> Option<xcap::Monitor> {
	let monitors = xcap::Monitor::all().ok()?;
	let mut fallback = None;
	for monitor in monitors {
		if monitor.is_primary().unwrap_or(false) {
			return Some(monitor);
		}
		fallback.get_or_insert(monitor);
	}
	fallback
}

/// Size of the primary monitor, or the 1080p reference when it cannot be queried.
pub fn primary_screen_size() -> (u32, u32) {
	primary_monitor()
		.and_then(|m| Some((m.width().ok()?, m.height().ok()?)))
		.filter(|(w, h)| *w > 0 && *h > 0)
		.unwrap_or(REFERENCE_SIZE)
}

/// Clamp `area` to a `size` screen. `None` when nothing is left.
pub fn clamp_area(area: Area, size: (u32, u32)) -> Option<(u32, u32, u32, u32)> {
	let x0 = area.x.max(0) as i64;
	let y0 = area.y.max(0) as i64;
	let x1 = (area.x as i64 + area.width as i64).min(size.0 as i64);
	let y1 = (area.y as i64 + area.height as i64).min(size.1 as i64);
	(x1 > x0 && y1 > y0).then(|| (x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
}

/// [`Screen`] over the primary monitor.
pub struct ScreenCapture {
	size: (u32, u32),
	cache: HashMap<Area, (Instant, OwnedImage)>,
}

impl ScreenCapture {
	pub fn new() -> Self {
		Self {
			size: primary_screen_size(),
			cache: HashMap::new(),
		}
	}

	fn grab(&self, area: Area) -> Option<OwnedImage> {
		let (x, y, w, h) = clamp_area(area, self.size)?;
		let monitor = primary_monitor()?;
		let img = match monitor.capture_image() {
			Ok(img) => img,
			Err(err) => {
				tracing::debug!(error = %err, "monitor capture failed");
				return None;
			}
		};
		let full = OwnedImage::from_rgba(img.width() as usize, img.as_bytes());
		let crop = full.as_image().sub_image(x, y, w, h).to_owned_image();
		(!crop.is_empty()).then_some(crop)
	}
}

impl Screen for ScreenCapture {
	fn capture_area(&mut self, area: Area, use_cache: bool) -> Option<OwnedImage> {
		if use_cache
			&& let Some((at, image)) = self.cache.get(&area)
			&& at.elapsed() < CACHE_TTL
		{
			return Some(image.clone());
		}

		let image = self.grab(area)?;
		self.cache.retain(|_, (at, _)| at.elapsed() < CACHE_TTL);
		self.cache.insert(area, (Instant::now(), image.clone()));
		Some(image)
	}

	fn screen_size(&self) -> (u32, u32) {
		self.size
	}

	fn clear_cache(&mut self) {
		self.cache.clear();
	}
}

/// Region shown in fruit screenshots.
pub fn center_region(screen: (u32, u32), auto_craft: bool) -> Area {
	let (ref_w, ref_h) = if auto_craft { (400, 320) } else { (800, 500) };
	let size = Area::new(0, 0, ref_w, ref_h).scaled(screen);
	let lift = if auto_craft { 0 } else { Point::new(0, 100).scaled(screen).y };
	let cx = screen.0 as i32 / 2;
	let cy = screen.1 as i32 / 2 - lift;
	Area::new(
		cx - size.width as i32 / 2,
		cy - size.height as i32 / 2,
		size.width,
		size.height,
	)
}

/// Capture the screen centre to a temporary PNG for a webhook upload.
///
/// Auto-craft captures are smaller and brightened, since the camera is zoomed in.
pub fn capture_center(screen: &mut dyn Screen, auto_craft: bool) -> Option<PathBuf> {
	let area = center_region(screen.screen_size(), auto_craft);
	let mut image = screen.capture_area(area, false)?;
	if auto_craft {
		image = image.enhanced(1.25, 1.15);
	}

	let path = std::env::temp_dir().join(format!(
		"fishmacro_fruit_{}.png",
		chrono::Local::now().format("%Y%m%d_%H%M%S_%3f")
	));
	match image.as_image().save_png(&path) {
		Ok(()) => Some(path),
		Err(err) => {
			tracing::warn!(error = %err, "failed to save fruit screenshot");
			None
		}
	}
}

#[cfg(test)]
pub mod fake {
	use super::*;

	/// Screen serving a fixed full-screen image.
	pub struct FakeScreen {
		pub frame: OwnedImage,
		pub captures: usize,
	}

	impl FakeScreen {
		pub fn new(frame: OwnedImage) -> Self {
			Self { frame, captures: 0 }
		}
	}

	impl Screen for FakeScreen {
		fn capture_area(&mut self, area: Area, _use_cache: bool) -> Option<OwnedImage> {
			self.captures += 1;
			let (x, y, w, h) = clamp_area(area, self.screen_size())?;
			Some(self.frame.as_image().sub_image(x, y, w, h).to_owned_image())
		}

		fn screen_size(&self) -> (u32, u32) {
			(self.frame.width(), self.frame.height())
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{fake::FakeScreen, *};

	#[test]
	fn clamp_negative_and_overflowing_areas() {
		assert_eq!(clamp_area(Area::new(-4, -4, 10, 10), (100, 100)), Some((0, 0, 6, 6)));
		assert_eq!(clamp_area(Area::new(95, 0, 10, 10), (100, 100)), Some((95, 0, 5, 10)));
		assert_eq!(clamp_area(Area::new(200, 0, 10, 10), (100, 100)), None);
		assert_eq!(clamp_area(Area::new(0, 0, 0, 10), (100, 100)), None);
	}

	#[test]
	fn center_region_at_reference_size() {
		assert_eq!(center_region(REFERENCE_SIZE, false), Area::new(560, 190, 800, 500));
		assert_eq!(center_region(REFERENCE_SIZE, true), Area::new(760, 380, 400, 320));
	}

	#[test]
	fn pixel_sampling_reads_the_frame() {
		let frame = OwnedImage::from_fn(20, 10, |x, y| Color::new(x as u8, y as u8, 0));
		let mut screen = FakeScreen::new(frame);
		assert_eq!(screen.capture_pixel(Point::new(7, 3)), Some(Color::new(7, 3, 0)));
		assert_eq!(screen.capture_pixel(Point::new(-1, 3)), None);
	}

	#[test]
	fn capture_center_writes_png() {
		let mut screen = FakeScreen::new(OwnedImage::filled(1920, 1080, Color::new(10, 20, 30)));
		let path = capture_center(&mut screen, true).unwrap();
		assert!(path.is_file());
		std::fs::remove_file(path).unwrap();
	}
}
