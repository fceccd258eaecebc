pub mod assets;
pub mod timing;
pub mod validators;
pub mod watchdog;

use std::{path::PathBuf, sync::OnceLock};

const APP_NAME: &str = "fishmacro";

/// Directory holding settings, statistics and the log file.
///
/// The executable's directory when it is writable, otherwise
/// `<config>/fishmacro`.
pub fn app_dir() -> PathBuf {
	static DIR: OnceLock<PathBuf> = OnceLock::new();
	DIR.get_or_init(|| {
		if let Ok(exe) = std::env::current_exe()
			&& let Some(dir) = exe.parent()
			&& is_writable(dir)
		{
			return dir.to_path_buf();
		}
		let dir = dirs::config_dir()
			.unwrap_or_else(std::env::temp_dir)
			.join(APP_NAME);
		let _ = std::fs::create_dir_all(&dir);
		dir
	})
	.clone()
}

fn is_writable(dir: &std::path::Path) -> bool {
	let probe = dir.join(".fishmacro_write_test");
	match std::fs::File::create(&probe) {
		Ok(_) => {
			let _ = std::fs::remove_file(&probe);
			true
		}
		Err(_) => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn writable_probe() {
		let dir = tempfile::tempdir().unwrap();
		assert!(is_writable(dir.path()));
		assert!(!dir.path().join(".fishmacro_write_test").exists());
		assert!(!is_writable(&dir.path().join("missing")));
	}
}
