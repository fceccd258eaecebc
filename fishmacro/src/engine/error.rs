#[derive(Debug, thiserror::Error)]
pub enum MacroError {
	/// The run flag was cleared. Unwinds the cycle back to the worker loop.
	#[error("macro stopped")]
	Stopped,

	#[error("invalid state: {0}")]
	State(String),

	#[error("worker thread error: {0}")]
	Thread(String),

	#[error("screen capture failed: {0}")]
	Capture(String),

	#[error("input failed: {0}")]
	Input(String),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}

impl MacroError {
	pub fn is_stopped(&self) -> bool {
		matches!(self, Self::Stopped)
	}
}

pub type MacroResult<T = ()> = Result<T, MacroError>;
