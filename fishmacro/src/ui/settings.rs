use crate::{
	config::{BaitMode, FallbackBait},
	ui::ext::UiExt,
};

pub fn ui(ui: &mut egui::Ui, uniform: &crate::Uniform, modules: &mut [Box<dyn crate::module::Module>]) {
	let mut settings = uniform.settings_mut();
	let mut changed = false;

	egui::CollapsingHeader::new("Pre-cast").default_open(true).show(ui, |ui| {
		let p = &mut settings.precast;
		changed |= ui.checkbox(&mut p.auto_buy_bait, "Auto buy common bait").changed();
		changed |= ui.point_edit(&mut p.yes_button, "Shop: yes");
		changed |= ui.point_edit(&mut p.middle_button, "Shop: middle");
		changed |= ui.point_edit(&mut p.no_button, "Shop: no");
		changed |= ui.num_edit_range(&mut p.loops_per_purchase, "Casts per purchase", 1..=10_000).changed();

		ui.add_space(4.0);
		changed |= ui.checkbox(&mut p.auto_store_fruit, "Auto store fruit").changed();
		changed |= ui.point_edit(&mut p.fruit_point, "Fruit slot");
		let mut has_color = p.fruit_color.is_some();
		ui.horizontal(|ui| {
			if ui.checkbox(&mut has_color, "Fruit colour").changed() {
				p.fruit_color = has_color.then_some([7, 116, 45]);
				changed = true;
			}
			if let Some(rgb) = &mut p.fruit_color {
				changed |= ui.color_edit_button_srgb(rgb).changed();
			}
		});
		changed |= ui.checkbox(&mut p.store_in_inventory, "Store in inventory instead of dropping").changed();
		changed |= ui.point_edit(&mut p.inventory_fruit_point, "Inventory fruit");
		changed |= ui.point_edit(&mut p.inventory_center_point, "Inventory drop target");

		ui.add_space(4.0);
		changed |= ui.checkbox(&mut p.auto_select_top_bait, "Auto select top bait").changed();
		changed |= ui.point_edit(&mut p.top_bait_point, "Top bait");
	});

	egui::CollapsingHeader::new("Advanced").show(ui, |ui| {
		let a = &mut settings.advanced;
		changed |= ui.checkbox(&mut a.disable_normal_camera, "Disable camera alignment").changed();
		changed |= ui.num_edit_range(&mut a.camera_rotation_steps, "Camera rotation steps", 0..=50).changed();
		for (value, label) in [
			(&mut a.camera_rotation_delay, "Camera rotation delay"),
			(&mut a.camera_rotation_step_delay, "Camera rotation step delay"),
			(&mut a.camera_rotation_settle_delay, "Camera rotation settle"),
			(&mut a.zoom_tick_delay, "Zoom tick delay"),
			(&mut a.zoom_settle_delay, "Zoom settle"),
			(&mut a.pre_cast_minigame_wait, "Wait after cast"),
			(&mut a.store_click_delay, "Fruit click delay"),
			(&mut a.backspace_delay, "Backspace delay"),
			(&mut a.rod_deselect_delay, "Rod deselect delay"),
			(&mut a.rod_select_delay, "Rod select delay"),
			(&mut a.bait_click_delay, "Bait click delay"),
			(&mut a.fruit_detection_delay, "Detection poll delay"),
			(&mut a.fruit_detection_settle, "Detection settle"),
			(&mut a.general_action_delay, "General action delay"),
			(&mut a.mouse_move_settle, "Mouse move settle"),
			(&mut a.focus_settle_delay, "Window focus settle"),
			(&mut a.fruit_hold_delay, "Fruit hold delay"),
		] {
			changed |= ui.num_edit_range(value, &format!("{label} (s)"), 0.0..=10.0).changed();
		}
		changed |= ui.num_edit_range(&mut a.zoom_ticks, "Zoom ticks", 0..=30).changed();
	});

	egui::CollapsingHeader::new("Auto craft").show(ui, |ui| {
		let c = &mut settings.auto_craft;
		changed |= ui.checkbox(&mut c.enabled, "Enable auto craft mode").changed();
		changed |= ui.point_edit(&mut c.water_point, "Water (auto craft)");
		changed |= ui.num_edit_range(&mut c.craft_every_n_fish, "Craft every N fish (0 = every cycle)", 0..=1000).changed();
		changed |= ui.num_edit_range(&mut c.craft_menu_delay, "Craft menu delay (s)", 0.0..=10.0).changed();
		changed |= ui.num_edit_range(&mut c.craft_click_speed, "Craft click delay (s)", 0.0..=5.0).changed();
		let max = crate::craft::MAX_CRAFT_QUANTITY;
		changed |= ui.num_edit_range(&mut c.common_quantity, "Common quantity", 0..=max).changed();
		changed |= ui.num_edit_range(&mut c.rare_quantity, "Rare quantity", 0..=max).changed();
		changed |= ui.num_edit_range(&mut c.legendary_quantity, "Legendary quantity", 0..=max).changed();
		changed |= ui.point_edit(&mut c.craft_button, "Craft button");
		changed |= ui.point_edit(&mut c.plus_button, "Plus button");
		changed |= ui.point_edit(&mut c.fish_icon, "Fish icon");
		changed |= ui.point_edit(&mut c.common_bait, "Common bait recipe");
		changed |= ui.point_edit(&mut c.rare_bait, "Rare bait recipe");
		changed |= ui.point_edit(&mut c.legendary_bait, "Legendary bait recipe");
	});

	egui::CollapsingHeader::new("Smart bait").show(ui, |ui| {
		let b = &mut settings.smart_bait;
		changed |= ui.checkbox(&mut b.enabled, "Enable smart bait").changed();
		ui.horizontal(|ui| {
			ui.label("Mode");
			changed |= ui.selectable_value(&mut b.mode, BaitMode::Burning, "Burning").changed();
			changed |= ui.selectable_value(&mut b.mode, BaitMode::Stockpile, "Stockpile").changed();
		});
		ui.horizontal(|ui| {
			ui.label("Fallback");
			changed |= ui.selectable_value(&mut b.fallback, FallbackBait::Legendary, "Legendary").changed();
			changed |= ui.selectable_value(&mut b.fallback, FallbackBait::Rare, "Rare").changed();
		});
		changed |= ui.num_edit_range(&mut b.legendary_target, "Legendary target", 1..=1000).changed();
		changed |= ui.checkbox(&mut b.use_ocr, "Read bait counts with OCR").changed();
		changed |= ui.num_edit_range(&mut b.ocr_timeout_ms, "OCR timeout (ms)", 100..=10_000).changed();
		changed |= ui.num_edit_range(&mut b.ocr_confidence_min, "OCR min confidence (restart)", 0.0..=1.0).changed();
		changed |= ui.checkbox(&mut b.debug_screenshots, "Save debug captures").changed();
		changed |= ui.opt_area_edit(&mut b.menu_zone, "Bait menu zone");
		changed |= ui.opt_area_edit(&mut b.top_zone, "Top bait zone");
		changed |= ui.opt_area_edit(&mut b.mid_zone, "Second bait zone");
		changed |= ui.point_edit(&mut b.top_bait_point, "Top bait slot");
		changed |= ui.point_edit(&mut b.second_bait_point, "Second bait slot");
	});

	ui.spacer();
	changed |= ui.checkbox(&mut settings.ui.always_on_top, "Always on top").changed();

	for module in modules {
		ui.spacer();
		changed |= module.ui_settings(ui, &mut settings);
	}

	if changed {
		settings.save();
	}
}
