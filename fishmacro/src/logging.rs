//! Console and file logging.

use std::path::Path;

use tracing_appender::{
	non_blocking::WorkerGuard,
	rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt::layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_FILE_PREFIX: &str = "fishing_macro";

/// Install the global subscriber: compact console output plus `fishing_macro.log` in `dir`.
///
/// `RUST_LOG` overrides the default `info` filter. Keep the returned guard
/// alive until exit so buffered file lines are flushed. When the file cannot
/// be opened only the console layer is installed.
pub fn init(dir: &Path) -> Option<WorkerGuard> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	let mut layers = Vec::new();
	layers.push(layer().compact().with_ansi(true).boxed());

	let appender = RollingFileAppender::builder()
		.rotation(Rotation::NEVER)
		.filename_prefix(LOG_FILE_PREFIX)
		.filename_suffix("log")
		.build(dir);
	let (guard, file_error) = match appender {
		Ok(appender) => {
			let (writer, guard) = tracing_appender::non_blocking(appender);
			layers.push(layer().with_writer(writer).with_ansi(false).boxed());
			(Some(guard), None)
		}
		Err(err) => (None, Some(err)),
	};

	if let Err(err) = tracing_subscriber::registry().with(filter).with(layers).try_init() {
		eprintln!("logging already initialised: {err}");
	}
	if let Some(err) = file_error {
		tracing::warn!(error = %err, dir = %dir.display(), "log file unavailable; logging to console only");
	}
	guard
}
