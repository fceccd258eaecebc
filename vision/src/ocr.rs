//! OCR wrapper.
//!
//! Recognition relies on `ocr-rs` (Rust PaddleOCR bindings). OCR engines are
//! sensitive to input quality, so most preprocessing is done in
//! `Image::get_text(...)` before calling into this module.

use std::path::Path;

use anyhow::Context;

pub struct Ocr {
    engine: ocr_rs::OcrEngine,
}

impl Ocr {
    /// Initialize the OCR engine with the given model paths.
    pub fn try_new(
        detection: impl AsRef<Path>,
        recognition: impl AsRef<Path>,
        charsset: impl AsRef<Path>,
        min_confidence: f32,
    ) -> anyhow::Result<Self> {
        let thread_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        let engine = ocr_rs::OcrEngine::new(
            detection,
            recognition,
            charsset,
            Some(ocr_rs::OcrEngineConfig {
                backend: ocr_rs::Backend::CPU,
                thread_count: thread_count as i32,
                // Bait counts are small gradient glyphs; High precision is worth the CPU.
                precision_mode: ocr_rs::PrecisionMode::High,
                enable_parallel: thread_count > 1,
                min_result_confidence: min_confidence,
                ..Default::default()
            }),
        )
        .context("failed to initialize OCR engine")?;

        Ok(Self { engine })
    }

    /// Recognize text from an RGB image view.
    pub fn get_text(&self, image: crate::Image) -> String {
        let image = ocr_rs::preprocess::rgb_to_image(&image.get_bytes(), image.width(), image.height());

        match self.engine.recognize(&image) {
            Ok(results) => clean_text(
                &results
                    .into_iter()
                    .map(|v| v.text)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            Err(err) => {
                tracing::debug!(error = %err, "ocr recognize failed");
                String::new()
            }
        }
    }
}

/// Replace common OCR noise glyphs with spaces and trim.
pub fn clean_text(text: &str) -> String {
    text.chars()
        .map(|c| if matches!(c, '@' | '|' | '~') { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Parse a number out of OCR text, correcting the usual letter/digit confusions.
///
/// `O`/`o` read as 0, `l`/`I` read as 1. Separators are dropped. Returns `None`
/// when no digits remain or the value falls outside `min..=max`.
pub fn parse_number(text: &str, min: u32, max: u32) -> Option<u32> {
    let digits = text
        .chars()
        .map(|c| match c {
            'O' | 'o' => '0',
            'l' | 'I' => '1',
            c => c,
        })
        .filter(char::is_ascii_digit)
        .collect::<String>();
    let value = digits.parse::<u32>().ok()?;
    (min..=max).contains(&value).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_fixes_confusions() {
        assert_eq!(parse_number("1,2O5", 0, 9999), Some(1205));
        assert_eq!(parse_number("x l5", 0, 9999), Some(15));
        assert_eq!(parse_number("I.o", 0, 9999), Some(10));
    }

    #[test]
    fn parse_number_rejects_out_of_range() {
        assert_eq!(parse_number("12345", 0, 9999), None);
        assert_eq!(parse_number("abc", 0, 9999), None);
        assert_eq!(parse_number("3", 5, 10), None);
    }

    #[test]
    fn clean_text_strips_noise() {
        assert_eq!(clean_text(" |Rare Bait~ x12@ "), "Rare Bait  x12");
    }
}
