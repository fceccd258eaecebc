use std::ops::RangeInclusive;

use crate::config::{Area, Point};

pub trait UiExt {
	/// Labelled drag value clamped to `range`.
	fn num_edit_range<N: egui::emath::Numeric>(&mut self, value: &mut N, label: &str, range: RangeInclusive<N>) -> egui::Response;

	/// Optional screen point: a checkbox to set or clear it and x/y fields when set.
	fn point_edit(&mut self, point: &mut Option<Point>, label: &str) -> bool;

	fn area_edit(&mut self, area: &mut Area, label: &str) -> bool;

	fn opt_area_edit(&mut self, area: &mut Option<Area>, label: &str) -> bool;

	fn spacer(&mut self);
}

impl UiExt for egui::Ui {
	fn num_edit_range<N: egui::emath::Numeric>(&mut self, value: &mut N, label: &str, range: RangeInclusive<N>) -> egui::Response {
		self.horizontal(|ui| {
			let speed = if N::INTEGRAL { 1.0 } else { 0.01 };
			let response = ui.add(egui::DragValue::new(value).range(range).speed(speed));
			ui.label(label);
			response
		})
		.inner
	}

	fn point_edit(&mut self, point: &mut Option<Point>, label: &str) -> bool {
		self.horizontal(|ui| {
			let mut set = point.is_some();
			let mut changed = ui.checkbox(&mut set, label).changed();
			if changed {
				*point = set.then(Point::default);
			}
			if let Some(p) = point {
				changed |= ui.add(egui::DragValue::new(&mut p.x).prefix("x ")).changed();
				changed |= ui.add(egui::DragValue::new(&mut p.y).prefix("y ")).changed();
			}
			changed
		})
		.inner
	}

	fn area_edit(&mut self, area: &mut Area, label: &str) -> bool {
		self.horizontal(|ui| {
			ui.label(label);
			let mut changed = false;
			changed |= ui.add(egui::DragValue::new(&mut area.x).prefix("x ")).changed();
			changed |= ui.add(egui::DragValue::new(&mut area.y).prefix("y ")).changed();
			changed |= ui.add(egui::DragValue::new(&mut area.width).prefix("w ").range(1..=u32::MAX)).changed();
			changed |= ui.add(egui::DragValue::new(&mut area.height).prefix("h ").range(1..=u32::MAX)).changed();
			changed
		})
		.inner
	}

	fn opt_area_edit(&mut self, area: &mut Option<Area>, label: &str) -> bool {
		let mut set = area.is_some();
		let mut changed = self.checkbox(&mut set, label).changed();
		if changed {
			*area = set.then(|| Area::new(0, 0, 100, 30));
		}
		if let Some(a) = area {
			self.indent(label, |ui| changed |= ui.area_edit(a, ""));
		}
		changed
	}

	fn spacer(&mut self) {
		self.add_space(6.0);
		self.separator();
		self.add_space(6.0);
	}
}
