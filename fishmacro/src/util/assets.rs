use std::path::PathBuf;

use anyhow::{bail, Result};

const DETECTION: &str = "detection.mnn";
const RECOGNITION: &str = "latin_recognition.mnn";
const CHARSET: &str = "latin_charset.txt";

#[derive(Debug, Clone)]
pub struct OcrAssets {
	pub detection: PathBuf,
	pub recognition: PathBuf,
	pub charset: PathBuf,
}

fn normalize_ocr_dir(dir: PathBuf) -> PathBuf {
	// Accept either the app root (containing `ocr/`) or the `ocr/` folder itself.
	if dir.join(DETECTION).is_file() {
		dir
	} else {
		dir.join("ocr")
	}
}

fn candidates() -> Vec<PathBuf> {
	let mut candidates = Vec::new();
	if let Some(dir) = std::env::var_os("FISHMACRO_ASSETS_DIR") {
		candidates.push(PathBuf::from(dir));
	}
	if let Ok(exe) = std::env::current_exe()
		&& let Some(dir) = exe.parent()
	{
		candidates.push(dir.to_path_buf());
	}
	if let Ok(cwd) = std::env::current_dir() {
		candidates.push(cwd);
	}
	// Compile-time path to the workspace. Only meaningful on the build machine.
	#[cfg(debug_assertions)]
	candidates.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".."));
	candidates
}

/// Locate the bundled OCR models.
///
/// Override discovery with `FISHMACRO_ASSETS_DIR`.
pub fn resolve_ocr_assets() -> Result<OcrAssets> {
	resolve_in(candidates())
}

fn resolve_in(candidates: Vec<PathBuf>) -> Result<OcrAssets> {
	let mut tried = Vec::new();

	for base in candidates {
		let ocr_dir = normalize_ocr_dir(base);
		let detection = ocr_dir.join(DETECTION);
		let recognition = ocr_dir.join(RECOGNITION);
		let charset = ocr_dir.join(CHARSET);

		if detection.is_file() && recognition.is_file() && charset.is_file() {
			return Ok(OcrAssets { detection, recognition, charset });
		}

		tried.push(ocr_dir);
	}

	bail!(
		"OCR model files not found. Expected these files:\n  - ocr/{DETECTION}\n  - ocr/{RECOGNITION}\n  - ocr/{CHARSET}\n\nSearched in:\n{}\n\nFix: copy the 'ocr/' folder next to the executable (or set FISHMACRO_ASSETS_DIR to the folder that contains it).",
		tried
			.into_iter()
			.map(|p| format!("  - {}", p.display()))
			.collect::<Vec<_>>()
			.join("\n")
	)
}
