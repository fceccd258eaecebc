use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MacroState {
	#[default]
	Stopped,
	Starting,
	Running,
	Stopping,
	Paused,
	Error,
}

impl MacroState {
	pub fn is_active(self) -> bool {
		matches!(self, Self::Starting | Self::Running | Self::Stopping)
	}

	pub fn can_start(self) -> bool {
		matches!(self, Self::Stopped | Self::Error)
	}

	pub fn can_stop(self) -> bool {
		matches!(self, Self::Starting | Self::Running | Self::Paused)
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Stopped => "stopped",
			Self::Starting => "starting",
			Self::Running => "running",
			Self::Stopping => "stopping",
			Self::Paused => "paused",
			Self::Error => "error",
		}
	}
}

impl fmt::Display for MacroState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn transitions() {
		assert!(MacroState::Stopped.can_start());
		assert!(MacroState::Error.can_start());
		assert!(!MacroState::Running.can_start());

		assert!(MacroState::Paused.can_stop());
		assert!(!MacroState::Stopped.can_stop());
		assert!(!MacroState::Stopping.can_stop());

		assert!(MacroState::Stopping.is_active());
		assert!(!MacroState::Paused.is_active());
	}

	#[test]
	fn display_is_lowercase() {
		assert_eq!(MacroState::Running.to_string(), "running");
		assert_eq!(MacroState::Error.to_string(), "error");
	}
}
