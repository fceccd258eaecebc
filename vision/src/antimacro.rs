//! Anti-macro screen detection.
//!
//! The game covers the play area with a pure black overlay while its
//! anti-macro check is active. Rendered scenery is never exactly `(0, 0, 0)`.

use crate::{Color, OwnedImage};

pub const DEFAULT_BLACK_THRESHOLD: f32 = 0.5;

/// Fraction of pixels that are exactly black.
pub fn black_fraction(image: &OwnedImage) -> f32 {
	if image.is_empty() {
		return 0.0;
	}
	let total = (image.width() * image.height()) as f32;
	let black = image.pixels().filter(|&&c| c == Color::BLACK).count() as f32;
	black / total
}

pub fn is_black_screen(image: &OwnedImage, threshold: f32) -> bool {
	!image.is_empty() && black_fraction(image) >= threshold
}
