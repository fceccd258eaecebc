//! Fishing minigame bar analysis.
//!
//! The minigame is a vertical track drawn in a handful of flat colors. A blue
//! marker identifies the column the track is drawn in. Along that column the
//! track is framed in near-black, the player's white zone sits inside it, and
//! the fish is the largest dark group within the frame.

use crate::{Color, OwnedImage};

pub const TARGET_BLUE: Color = Color::new(85, 170, 255);
pub const WHITE: Color = Color::WHITE;
pub const BAR_BLACK: Color = Color::new(25, 25, 25);
pub const YELLOW_GREEN: Color = Color::new(170, 255, 0);
pub const DARK_GRAY: Color = Color::new(32, 34, 36);

/// Tolerance used to locate whole-screen features.
pub const SEARCH_TOLERANCE: u8 = 10;
/// Tolerance used along the bar column.
pub const LINE_TOLERANCE: u8 = 5;

/// Integer mean x of every pixel matching `color`.
pub fn find_color_column(image: &OwnedImage, color: Color, tol: u8) -> Option<u32> {
	let mut sum = 0u64;
	let mut count = 0u64;
	for (x, _, c) in image.enumerate_pixels() {
		if c.matches(color, tol) {
			sum += x as u64;
			count += 1;
		}
	}
	(count > 0).then(|| (sum / count) as u32)
}

/// First and last y along a one-pixel column where `color` matches.
pub fn topmost_bottommost(column: &OwnedImage, color: Color, tol: u8) -> Option<(u32, u32)> {
	let mut ys = (0..column.height()).filter(|&y| column.pixel(0, y).is_some_and(|c| c.matches(color, tol)));
	let top = ys.next()?;
	let bottom = ys.last().unwrap_or(top);
	Some((top, bottom))
}

/// Middle of the largest run of `color` along a column, allowing gaps up to `max_gap`.
///
/// Ties keep the first group found (topmost).
pub fn biggest_group_middle(section: &OwnedImage, color: Color, max_gap: u32, tol: u8) -> Option<u32> {
	let ys = (0..section.height())
		.filter(|&y| section.pixel(0, y).is_some_and(|c| c.matches(color, tol)))
		.collect::<Vec<_>>();

	let mut groups: Vec<Vec<u32>> = Vec::new();
	for y in ys {
		match groups.last_mut() {
			Some(group) if group.last().is_some_and(|&prev| y - prev <= max_gap) => group.push(y),
			_ => groups.push(vec![y]),
		}
	}

	let biggest = groups
		.iter()
		.fold(None::<&Vec<u32>>, |best, g| match best {
			Some(b) if b.len() >= g.len() => Some(b),
			_ => Some(g),
		})?;
	let sum = biggest.iter().map(|&y| y as u64).sum::<u64>();
	Some((sum / biggest.len() as u64) as u32)
}

/// All five minigame colors are on screen.
pub fn minigame_visible(image: &OwnedImage) -> bool {
	[TARGET_BLUE, WHITE, BAR_BLACK, YELLOW_GREEN, DARK_GRAY]
		.into_iter()
		.all(|color| crate::color::find_color_in_region(image, color, SEARCH_TOLERANCE).is_some())
}

/// Result of reading one frame of the minigame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarReading {
	/// No blue marker: the minigame has ended.
	NoBar,
	/// Marker found but the dark frame along its column is not.
	NoFrame { mid_x: u32 },
	/// Frame found but no white zone inside it.
	NoWhite { mid_x: u32 },
	/// White zone found but no fish group inside the frame edges.
	Lost { mid_x: u32 },
	Tracked {
		mid_x: u32,
		white_mid: u32,
		black_mid: u32,
		white_height: u32,
		/// `black_mid - white_mid`; positive means the fish is below the zone.
		error: i32,
	},
}

pub fn analyze_bar(image: &OwnedImage) -> BarReading {
	let Some(mid_x) = find_color_column(image, TARGET_BLUE, SEARCH_TOLERANCE) else {
		return BarReading::NoBar;
	};

	let line = image.column(mid_x);
	let Some((top, bottom)) = topmost_bottommost(&line, BAR_BLACK, LINE_TOLERANCE) else {
		return BarReading::NoFrame { mid_x };
	};
	let section = line.rows(top, bottom);

	let Some((white_top, white_bottom)) = topmost_bottommost(&section, WHITE, LINE_TOLERANCE) else {
		return BarReading::NoWhite { mid_x };
	};
	let white_height = white_bottom - white_top + 1;
	let white_mid = (white_top + white_bottom) / 2;
	let max_gap = 5.max((white_height as f32 * 0.2) as u32);

	// The frame edges match the fish color, so only the inside of the frame is searched.
	let inside = section.rows(1, section.height().saturating_sub(2));
	match biggest_group_middle(&inside, BAR_BLACK, max_gap, LINE_TOLERANCE).map(|y| y + 1) {
		Some(black_mid) => BarReading::Tracked {
			mid_x,
			white_mid,
			black_mid,
			white_height,
			error: black_mid as i32 - white_mid as i32,
		},
		None => BarReading::Lost { mid_x },
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BG: Color = Color::new(90, 120, 60);

	/// A 40x200 frame with the bar at column 20.
	///
	/// Frame spans y 10..=190, white zone `white`, fish `fish` (inclusive ranges).
	fn frame(white: (u32, u32), fish: Option<(u32, u32)>) -> OwnedImage {
		OwnedImage::from_fn(40, 200, |x, y| {
			if (18..=22).contains(&x) && y < 5 {
				return TARGET_BLUE;
			}
			if x != 20 {
				return BG;
			}
			if y == 10 || y == 190 {
				return BAR_BLACK;
			}
			if let Some((a, b)) = fish {
				if (a..=b).contains(&y) {
					return BAR_BLACK;
				}
			}
			if (white.0..=white.1).contains(&y) {
				return WHITE;
			}
			if (10..=190).contains(&y) {
				return DARK_GRAY;
			}
			BG
		})
	}

	#[test]
	fn column_is_mean_of_matches() {
		let img = frame((50, 80), None);
		assert_eq!(find_color_column(&img, TARGET_BLUE, SEARCH_TOLERANCE), Some(20));
		assert_eq!(find_color_column(&img, YELLOW_GREEN, SEARCH_TOLERANCE), None);
	}

	#[test]
	fn topmost_bottommost_on_line() {
		let line = frame((50, 80), None).column(20);
		assert_eq!(topmost_bottommost(&line, BAR_BLACK, LINE_TOLERANCE), Some((10, 190)));
		assert_eq!(topmost_bottommost(&line, WHITE, LINE_TOLERANCE), Some((50, 80)));
	}

	#[test]
	fn biggest_group_bridges_small_gaps() {
		// Groups: {0,1,2} then {20,22,24,26} (gap 2 <= max_gap 3), then {40}.
		let marked = [0, 1, 2, 20, 22, 24, 26, 40];
		let col = OwnedImage::from_fn(1, 50, |_, y| if marked.contains(&y) { BAR_BLACK } else { WHITE });
		assert_eq!(biggest_group_middle(&col, BAR_BLACK, 3, LINE_TOLERANCE), Some(23));
		// With max_gap 1 the second group splits apart and the first group wins the tie.
		assert_eq!(biggest_group_middle(&col, BAR_BLACK, 1, LINE_TOLERANCE), Some(1));
	}

	#[test]
	fn biggest_group_none_without_matches() {
		let col = OwnedImage::filled(1, 10, WHITE);
		assert_eq!(biggest_group_middle(&col, BAR_BLACK, 5, LINE_TOLERANCE), None);
	}

	#[test]
	fn tracked_reading_reports_error() {
		// Section starts at y=10: white 40..=70 relative, fish 90..=100 relative.
		let img = frame((50, 80), Some((100, 110)));
		match analyze_bar(&img) {
			BarReading::Tracked { mid_x, white_mid, black_mid, white_height, error } => {
				assert_eq!(mid_x, 20);
				assert_eq!(white_height, 31);
				assert_eq!(white_mid, 55);
				assert_eq!(black_mid, 95);
				assert_eq!(error, 40);
			}
			other => panic!("unexpected reading {other:?}"),
		}
	}

	#[test]
	fn missing_pieces() {
		let mut no_bar = frame((50, 80), None);
		no_bar.map_pixels(|c| {
			if *c == TARGET_BLUE {
				*c = BG;
			}
		});
		assert_eq!(analyze_bar(&no_bar), BarReading::NoBar);

		let no_white = frame((0, 0), Some((100, 110)));
		assert_eq!(analyze_bar(&no_white), BarReading::NoWhite { mid_x: 20 });
	}

	#[test]
	fn blue_column_without_frame() {
		let mut img = frame((50, 80), None);
		img.map_pixels(|c| {
			if *c == BAR_BLACK {
				*c = DARK_GRAY;
			}
		});
		assert_eq!(analyze_bar(&img), BarReading::NoFrame { mid_x: 20 });
	}

	#[test]
	fn frame_edges_alone_are_lost() {
		assert_eq!(analyze_bar(&frame((50, 80), None)), BarReading::Lost { mid_x: 20 });
	}

	#[test]
	fn fish_touching_the_frame_edge_is_tracked() {
		// Fish 11..=20 is section rows 1..=10, right against the top edge.
		match analyze_bar(&frame((50, 80), Some((11, 20)))) {
			BarReading::Tracked { black_mid, .. } => assert_eq!(black_mid, 5),
			other => panic!("unexpected reading {other:?}"),
		}
	}

	#[test]
	fn visibility_requires_all_colors() {
		let img = frame((50, 80), Some((100, 110)));
		assert!(!minigame_visible(&img));
		let mut with_green = img.clone();
		with_green.put_pixel(0, 199, YELLOW_GREEN);
		assert!(minigame_visible(&with_green));
	}
}
