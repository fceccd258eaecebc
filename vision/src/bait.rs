//! Bait menu counting.
//!
//! The bait menu lists up to three rows, legendary on top, each with an
//! `x<count>` label. Rows are read top to bottom and mapped to tiers; when only
//! two rows are visible, keywords and the color hints decide which tiers they are.

use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;

use crate::BaitKind;

static X_NUMBER: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?i)(?:x\s*(?<a>\d+)|(?<b>\d+)\s*x)").expect("valid regex"));
static STANDALONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{1,4})\b").expect("valid regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BaitCounts {
	pub legendary: Option<u32>,
	pub rare: Option<u32>,
	pub common: Option<u32>,
}

fn x_number(text: &str) -> Option<u32> {
	let caps = X_NUMBER.captures(text)?;
	caps.name("a").or_else(|| caps.name("b"))?.as_str().parse().ok()
}

fn has_x_number(text: &str) -> bool {
	X_NUMBER.is_match(text)
}

/// Pick the most frequent number; larger values break ties.
///
/// OCR often confuses 6 and 9. When exactly the two readings of such a pair
/// are present, the one containing a 9 wins.
pub fn pick_best_number(nums: &[u32]) -> Option<u32> {
	if nums.is_empty() {
		return None;
	}

	let mut counts: HashMap<u32, usize> = HashMap::new();
	for &n in nums {
		*counts.entry(n).or_default() += 1;
	}

	if counts.len() == 2 {
		let mut vals = counts.keys().copied().collect::<Vec<_>>();
		vals.sort_unstable();
		if matches!((vals[0], vals[1]), (6, 9) | (60, 90) | (16, 19)) {
			return Some(vals[1]);
		}
	}

	counts
		.into_iter()
		.max_by(|(a, ca), (b, cb)| ca.cmp(cb).then(a.cmp(b)))
		.map(|(n, _)| n)
}

/// Extract the count shown on one menu row.
pub fn count_number_in_line(line: &str) -> Option<u32> {
	let mut candidates = Vec::new();
	if let Some(n) = x_number(line) {
		candidates.push(n);
	}
	if candidates.is_empty() {
		candidates.extend(
			STANDALONE
				.captures_iter(line)
				.filter_map(|c| c[1].parse::<u32>().ok())
				.filter(|n| (1..=9999).contains(n)),
		);
	}
	pick_best_number(&candidates)
}

fn has_keyword(text: &str, kw: &str) -> bool {
	text.to_lowercase().contains(kw)
}

/// Map OCR'd menu rows (top to bottom) to bait counts.
pub fn parse_bait_lines(lines: &[String], top_hint: Option<BaitKind>, mid_hint: Option<BaitKind>) -> BaitCounts {
	let mut counts = BaitCounts::default();

	let filtered = lines
		.iter()
		.filter(|l| {
			has_x_number(l) || has_keyword(l, "legendary") || has_keyword(l, "rare") || has_keyword(l, "common")
		})
		.collect::<Vec<_>>();
	let rows = if filtered.is_empty() { lines.iter().collect() } else { filtered };

	if rows.len() >= 3 {
		counts.legendary = count_number_in_line(rows[0]);
		counts.rare = count_number_in_line(rows[1]);
		counts.common = count_number_in_line(rows[2]);
	} else if rows.len() == 2 {
		let (top, mid) = (rows[0], rows[1]);
		let top_leg = has_keyword(top, "legendary") || top_hint == Some(BaitKind::Legendary);
		let top_rare = has_keyword(top, "rare") || top_hint == Some(BaitKind::Rare);

		if top_leg {
			counts.legendary = count_number_in_line(top);
			if mid_hint == Some(BaitKind::Rare) || has_keyword(mid, "rare") {
				counts.rare = count_number_in_line(mid);
			} else if mid_hint == Some(BaitKind::Common) || has_keyword(mid, "common") {
				counts.common = count_number_in_line(mid);
			}
		} else if top_rare {
			counts.rare = count_number_in_line(top);
			counts.common = count_number_in_line(mid);
		}
	}

	tracing::info!(?lines, ?counts, "bait menu counts");
	counts
}

#[cfg(test)]
mod tests {
	use super::*;

	fn lines(v: &[&str]) -> Vec<String> {
		v.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn x_pattern_both_sides() {
		assert_eq!(count_number_in_line("Legendary Bait x12"), Some(12));
		assert_eq!(count_number_in_line("Rare Bait 7 X"), Some(7));
		assert_eq!(count_number_in_line("Common 345"), Some(345));
		assert_eq!(count_number_in_line("Common Bait"), None);
	}

	#[test]
	fn best_number_prefers_mode_then_larger() {
		assert_eq!(pick_best_number(&[3, 5, 5]), Some(5));
		assert_eq!(pick_best_number(&[3, 5]), Some(5));
		assert_eq!(pick_best_number(&[]), None);
	}

	#[test]
	fn six_nine_ambiguity_prefers_nine() {
		assert_eq!(pick_best_number(&[6, 6, 9]), Some(9));
		assert_eq!(pick_best_number(&[60, 90]), Some(90));
		assert_eq!(pick_best_number(&[16, 19, 19]), Some(19));
	}

	#[test]
	fn three_rows_map_in_order() {
		let counts = parse_bait_lines(&lines(&["Bait Menu", "Legendary x4", "Rare x20", "Common x100"]), None, None);
		assert_eq!(
			counts,
			BaitCounts {
				legendary: Some(4),
				rare: Some(20),
				common: Some(100)
			}
		);
	}

	#[test]
	fn two_rows_use_color_hints() {
		let counts = parse_bait_lines(&lines(&["x3", "x15"]), Some(BaitKind::Legendary), Some(BaitKind::Rare));
		assert_eq!(counts.legendary, Some(3));
		assert_eq!(counts.rare, Some(15));
		assert_eq!(counts.common, None);

		let counts = parse_bait_lines(&lines(&["Rare x8", "Common x40"]), None, None);
		assert_eq!(counts.legendary, None);
		assert_eq!(counts.rare, Some(8));
		assert_eq!(counts.common, Some(40));
	}

	#[test]
	fn unrecognised_rows_yield_nothing() {
		assert_eq!(parse_bait_lines(&lines(&["hello"]), None, None), BaitCounts::default());
	}
}
