//! Color checks used for fruit and bait detection.

use crate::{Color, Image};

/// Per-channel color comparison.
pub fn check_color_match(a: Color, b: Color, tol: u8) -> bool {
	a.matches(b, tol)
}

/// Inclusive per-channel range check.
pub fn is_color_in_range(c: Color, lo: Color, hi: Color) -> bool {
	(lo.r..=hi.r).contains(&c.r) && (lo.g..=hi.g).contains(&c.g) && (lo.b..=hi.b).contains(&c.b)
}

/// Average color of a region.
pub fn dominant_color(image: Image) -> Option<Color> {
	image.average_color()
}

/// First pixel (row-major) within `tol` of `color`.
pub fn find_color_in_region(image: &crate::OwnedImage, color: Color, tol: u8) -> Option<(u32, u32)> {
	image
		.enumerate_pixels()
		.find(|(_, _, c)| c.matches(color, tol))
		.map(|(x, y, _)| (x, y))
}

/// Bait tier shown in the bait menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BaitKind {
	Legendary,
	Rare,
	Common,
}

const GOLD: (Color, Color) = (Color::new(181, 121, 0), Color::new(255, 255, 99));
const PURPLE: (Color, Color) = (Color::new(101, 0, 151), Color::new(255, 99, 255));

/// Classify a label color: gold is legendary, purple is rare, white/gray is common.
pub fn classify_label(c: Color) -> Option<BaitKind> {
	let (r, g, b) = (c.r as i32, c.g as i32, c.b as i32);
	if is_color_in_range(c, GOLD.0, GOLD.1) {
		Some(BaitKind::Legendary)
	} else if is_color_in_range(c, PURPLE.0, PURPLE.1) {
		Some(BaitKind::Rare)
	} else if r > 150 && g > 150 && b > 150 && (r - g).abs() < 30 && (g - b).abs() < 30 {
		Some(BaitKind::Common)
	} else {
		None
	}
}

/// Hue statistics of a bait slot crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueStats {
	/// Circular hue variance, `0.0` (one hue) to `1.0` (evenly spread).
	pub hue_var: f32,
	/// Mean saturation in `0.0..=1.0`.
	pub sat_mean: f32,
	/// Center of the most populated 5° hue bin (OpenCV scale, `0..180`).
	pub dom_hue: f32,
}

pub fn hue_stats(image: &crate::OwnedImage) -> Option<HueStats> {
	if image.is_empty() {
		return None;
	}

	let hsv = image
		.pixels()
		.map(|c| {
			let (h, s, v) = c.to_hsv();
			(h, s / 255.0, v / 255.0)
		})
		.collect::<Vec<_>>();

	// Ignore dark or washed-out background pixels when anything else is present.
	let colored = hsv
		.iter()
		.copied()
		.filter(|&(_, s, v)| s > 0.2 && v > 0.2)
		.collect::<Vec<_>>();
	let samples = if colored.is_empty() { hsv } else { colored };
	let n = samples.len() as f32;

	let (mut sum_cos, mut sum_sin, mut sum_sat) = (0.0f32, 0.0f32, 0.0f32);
	let mut bins = [0u32; 36];
	for &(h, s, _) in &samples {
		let angle = h / 180.0 * std::f32::consts::TAU;
		sum_cos += angle.cos();
		sum_sin += angle.sin();
		sum_sat += s;
		bins[((h / 5.0) as usize).min(35)] += 1;
	}

	let r = ((sum_cos / n).powi(2) + (sum_sin / n).powi(2)).sqrt();
	let dom_idx = bins
		.iter()
		.enumerate()
		.fold(0, |best, (i, &count)| if count > bins[best] { i } else { best });

	Some(HueStats {
		hue_var: 1.0 - r,
		sat_mean: sum_sat / n,
		dom_hue: dom_idx as f32 * 5.0 + 2.5,
	})
}

/// HSV threshold classifier for a bait slot.
///
/// Legendary baits are rainbow gradients, so the high-variance rule runs first
/// (a gradient contains blue and would otherwise read as rare). When the hue
/// rules are undecided the slot's average color is read as a label color.
pub fn classify_bait(image: &crate::OwnedImage) -> Option<BaitKind> {
	let stats = hue_stats(image)?;
	let kind = classify_hue_stats(stats).or_else(|| dominant_color(image.as_image()).and_then(classify_label));
	tracing::debug!(
		hue_var = stats.hue_var,
		sat_mean = stats.sat_mean,
		dom_hue = stats.dom_hue,
		?kind,
		"bait color scan"
	);
	kind
}

pub fn classify_hue_stats(stats: HueStats) -> Option<BaitKind> {
	let HueStats { hue_var, sat_mean, dom_hue } = stats;
	if hue_var >= 0.75 {
		Some(BaitKind::Legendary)
	} else if sat_mean > 0.70 && hue_var >= 0.35 {
		Some(BaitKind::Legendary)
	} else if hue_var < 0.15 {
		Some(BaitKind::Common)
	} else if hue_var < 0.30 && sat_mean < 0.40 {
		Some(BaitKind::Common)
	} else if (85.0..=155.0).contains(&dom_hue) && sat_mean >= 0.25 && hue_var < 0.70 {
		Some(BaitKind::Rare)
	} else {
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::OwnedImage;

	#[test]
	fn color_match_tolerance() {
		let target = Color::new(85, 170, 255);
		assert!(check_color_match(target, Color::new(90, 165, 250), 10));
		assert!(check_color_match(target, target, 0));
		assert!(!check_color_match(target, Color::new(100, 170, 255), 10));
	}

	#[test]
	fn color_range_is_inclusive() {
		let lo = Color::new(10, 10, 10);
		let hi = Color::new(20, 20, 20);
		assert!(is_color_in_range(Color::new(10, 20, 15), lo, hi));
		assert!(!is_color_in_range(Color::new(9, 15, 15), lo, hi));
	}

	#[test]
	fn dominant_color_averages() {
		let img = OwnedImage::from_fn(2, 1, |x, _| if x == 0 { Color::new(0, 0, 0) } else { Color::new(100, 50, 200) });
		assert_eq!(dominant_color(img.as_image()), Some(Color::new(50, 25, 100)));
	}

	#[test]
	fn label_classification() {
		assert_eq!(classify_label(Color::new(255, 200, 50)), Some(BaitKind::Legendary));
		assert_eq!(classify_label(Color::new(160, 40, 220)), Some(BaitKind::Rare));
		assert_eq!(classify_label(Color::new(200, 200, 210)), Some(BaitKind::Common));
		assert_eq!(classify_label(Color::new(10, 200, 10)), None);
	}

	#[test]
	fn find_color_returns_first_row_major() {
		let img = OwnedImage::from_fn(5, 5, |x, y| if (x, y) == (3, 1) || (x, y) == (1, 4) { Color::WHITE } else { Color::BLACK });
		assert_eq!(find_color_in_region(&img, Color::WHITE, 0), Some((3, 1)));
		assert_eq!(find_color_in_region(&img, Color::new(1, 2, 3), 0), None);
	}

	#[test]
	fn solid_gray_bait_is_common() {
		let img = OwnedImage::filled(20, 10, Color::new(200, 200, 200));
		assert_eq!(classify_bait(&img), Some(BaitKind::Common));
	}

	#[test]
	fn rainbow_bait_is_legendary() {
		let palette = [
			Color::new(255, 0, 0),
			Color::new(255, 255, 0),
			Color::new(0, 255, 0),
			Color::new(0, 255, 255),
			Color::new(0, 0, 255),
			Color::new(255, 0, 255),
		];
		let img = OwnedImage::from_fn(60, 4, |x, _| palette[(x / 10) as usize]);
		assert_eq!(classify_bait(&img), Some(BaitKind::Legendary));
	}

	#[test]
	fn undecided_hues_fall_back_to_label_color() {
		// Pink and blue: spread out, moderately saturated, dominant hue outside the blue band.
		let img = OwnedImage::from_fn(20, 4, |x, _| if x < 12 { Color::new(255, 70, 140) } else { Color::new(90, 90, 255) });
		let stats = hue_stats(&img).unwrap();
		assert_eq!(classify_hue_stats(stats), None, "{stats:?}");
		assert_eq!(classify_bait(&img), Some(BaitKind::Rare));
	}

	#[test]
	fn blue_with_some_spread_is_rare() {
		assert_eq!(
			classify_hue_stats(HueStats { hue_var: 0.4, sat_mean: 0.5, dom_hue: 112.5 }),
			Some(BaitKind::Rare)
		);
		assert_eq!(classify_hue_stats(HueStats { hue_var: 0.4, sat_mean: 0.5, dom_hue: 30.0 }), None);
	}
}
