//! Proportional-derivative control for the fishing bar.
//!
//! The error is `fish - zone` in pixels (positive when the fish is below the
//! zone). The clamped output maps to a duty cycle; above one half the mouse is
//! held, which raises the zone.

use std::time::Instant;

use crate::config::PdSettings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdOutput {
	pub output: f64,
	pub duty: f64,
	pub hold: bool,
}

#[derive(Debug, Clone)]
pub struct PdController {
	kp: f64,
	kd: f64,
	clamp: f64,
	last_error: Option<f64>,
	last_time: Option<Instant>,
}

impl PdController {
	pub fn new(settings: &PdSettings) -> Self {
		Self {
			kp: settings.kp,
			kd: settings.kd,
			clamp: settings.clamp,
			last_error: None,
			last_time: None,
		}
	}

	/// Feed one error sample. `None` when no time has passed since the last one.
	pub fn update(&mut self, error: f64, now: Instant) -> Option<PdOutput> {
		let d = match self.last_time {
			Some(last) => {
				let dt = now.checked_duration_since(last)?.as_secs_f64();
				if dt <= 0.0 {
					return None;
				}
				self.last_error.map_or(0.0, |prev| self.kd * (error - prev) / dt)
			}
			None => 0.0,
		};

		let clamp = self.clamp.abs().max(f64::EPSILON);
		let output = (self.kp * error + d).clamp(-clamp, clamp);
		let duty = (0.5 + output / (2.0 * clamp)).clamp(0.0, 1.0);

		self.last_error = Some(error);
		self.last_time = Some(now);

		Some(PdOutput {
			output,
			duty,
			hold: duty > 0.5,
		})
	}

	pub fn reset(&mut self) {
		self.last_error = None;
		self.last_time = None;
	}

	/// Forget the derivative history but keep timing.
	pub fn reset_error(&mut self) {
		self.last_error = Some(0.0);
	}

	pub fn last_error(&self) -> Option<f64> {
		self.last_error
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	fn controller() -> PdController {
		PdController::new(&PdSettings::default())
	}

	#[test]
	fn first_sample_is_proportional_only() {
		let mut pd = controller();
		let out = pd.update(0.4, Instant::now()).unwrap();
		assert!((out.output - 0.4).abs() < 1e-9);
		assert!((out.duty - 0.7).abs() < 1e-9);
		assert!(out.hold);
	}

	#[test]
	fn fish_above_zone_releases() {
		let mut pd = controller();
		let out = pd.update(-12.0, Instant::now()).unwrap();
		assert_eq!(out.output, -1.0);
		assert_eq!(out.duty, 0.0);
		assert!(!out.hold);
	}

	#[test]
	fn zero_error_is_neutral() {
		let mut pd = controller();
		let out = pd.update(0.0, Instant::now()).unwrap();
		assert_eq!(out.duty, 0.5);
		assert!(!out.hold);
	}

	#[test]
	fn derivative_damps_approach() {
		let mut pd = controller();
		let t0 = Instant::now();
		pd.update(0.5, t0).unwrap();
		// Error falling fast: derivative pulls the output negative.
		let out = pd.update(0.2, t0 + Duration::from_millis(100)).unwrap();
		// 1.0*0.2 + 0.3*(0.2-0.5)/0.1 = 0.2 - 0.9
		assert!((out.output - -0.7).abs() < 1e-9);
		assert!(!out.hold);
	}

	#[test]
	fn same_instant_is_skipped() {
		let mut pd = controller();
		let t0 = Instant::now();
		pd.update(1.0, t0).unwrap();
		assert_eq!(pd.update(2.0, t0), None);
		assert_eq!(pd.last_error(), Some(1.0));
	}

	#[test]
	fn resets() {
		let mut pd = controller();
		let t0 = Instant::now();
		pd.update(3.0, t0).unwrap();
		pd.reset_error();
		assert_eq!(pd.last_error(), Some(0.0));
		pd.reset();
		assert_eq!(pd.last_error(), None);
		assert!(pd.update(0.0, t0).is_some());
	}
}
