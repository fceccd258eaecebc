mod image;
pub use image::*;
mod ocr;
pub use ocr::{clean_text, parse_number};

pub mod antimacro;
pub mod bait;
pub mod color;
pub use color::BaitKind;
pub mod minigame;

pub struct Vision {
	ocr: Option<ocr::Ocr>,
	ocr_error: Option<String>,
}

impl Vision {
	/// Load the OCR models. Failure leaves OCR disabled and records why.
	pub fn new(
		ocr_detection: impl AsRef<std::path::Path>,
		ocr_recognition: impl AsRef<std::path::Path>,
		ocr_charsset: impl AsRef<std::path::Path>,
		min_confidence: f32,
	) -> Self {
		match ocr::Ocr::try_new(ocr_detection, ocr_recognition, ocr_charsset, min_confidence) {
			Ok(ocr) => Self { ocr: Some(ocr), ocr_error: None },
			Err(err) => Self::without_ocr(format!("{err:#}")),
		}
	}

	/// Color-only analysis; every OCR call returns nothing.
	pub fn without_ocr(reason: impl Into<String>) -> Self {
		Self {
			ocr: None,
			ocr_error: Some(reason.into()),
		}
	}

	pub fn ocr_available(&self) -> bool {
		self.ocr.is_some()
	}

	pub fn ocr_init_error(&self) -> Option<&str> {
		self.ocr_error.as_deref()
	}

	/// OCR an image, `None` when OCR is unavailable.
	pub fn read_text(&self, image: Image) -> Option<String> {
		let ocr = self.ocr.as_ref()?;
		Some(image.get_text(ocr))
	}

	/// Read the bait counts from a capture of the bait menu.
	///
	/// The menu is split into three equal rows. A row that yields no number is
	/// retried on its right 35%, where the count label sits.
	pub fn read_bait_counts(
		&self,
		menu: &OwnedImage,
		top_hint: Option<BaitKind>,
		mid_hint: Option<BaitKind>,
	) -> bait::BaitCounts {
		let Some(ocr) = &self.ocr else {
			return bait::BaitCounts::default();
		};

		let view = menu.as_image();
		let band_h = view.height() / 3;
		if band_h == 0 {
			return bait::BaitCounts::default();
		}

		let lines = (0..3)
			.map(|i| {
				let band = view.sub_image(0, band_h * i, view.width(), band_h);
				let text = band.get_text(ocr);
				if bait::count_number_in_line(&text).is_some() {
					return text;
				}
				let right = band.trimmed_right((view.width() as f32 * 0.35).ceil() as u32);
				let count = right.get_text(ocr);
				if count.is_empty() { text } else { format!("{text} {count}") }
			})
			.filter(|line| !line.trim().is_empty())
			.collect::<Vec<_>>();

		bait::parse_bait_lines(&lines, top_hint, mid_hint)
	}
}
