use sparse_life::{Engine, GameRules, Pattern, RatePreset, View};

/// Persistent state of the egui control panel.
#[derive(Default)]
pub struct PanelState {
    pub menu_open: bool,
}

const STAMPS: [(&str, Pattern); 5] = [
    ("Glider", Pattern::Glider),
    ("Blinker", Pattern::Blinker),
    ("Toad", Pattern::Toad),
    ("LWSS", Pattern::LightweightSpaceship),
    ("Gosper Gun", Pattern::GosperGliderGun),
];

/// Draw the menu button and, when open, the settings panel.
///
/// `screen_center` is the pixel patterns are stamped at.
pub fn show(
    ctx: &egui::Context,
    panel: &mut PanelState,
    engine: &Engine,
    view: &mut View,
    screen_center: (f64, f64),
) {
    // Use an Area for the menu button, positioned top-left
    egui::Area::new(egui::Id::new("menu_button_area"))
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(5.0, 5.0))
        .show(ctx, |ui| {
            if ui.button("☰").clicked() {
                panel.menu_open = !panel.menu_open;
            }
        });

    if !panel.menu_open {
        return;
    }

    let panel_frame = egui::Frame {
        fill: egui::Color32::from_rgba_unmultiplied(25, 25, 25, 100),
        ..egui::Frame::side_top_panel(&ctx.style())
    };
    let stats = engine.stats();

    egui::SidePanel::left("side_panel")
        .frame(panel_frame)
        .resizable(true)
        .default_width(200.0)
        .show(ctx, |ui| {
            ui.heading("Simulation Settings");
            ui.separator();

            let pause_label = if stats.paused { "> Play" } else { "|| Pause" };
            if ui.button(pause_label).clicked() {
                engine.toggle_pause();
            }
            if ui.button("Restart").clicked() && engine.request_restart() {
                view.reset();
            }
            ui.separator();

            let mut tick_rate = stats.tick_rate;
            rate_selector(ui, "Target TPS", &mut tick_rate);
            if tick_rate != stats.tick_rate {
                engine.set_tick_rate(tick_rate);
            }
            let mut frame_rate = stats.frame_rate;
            rate_selector(ui, "Target FPS", &mut frame_rate);
            if frame_rate != stats.frame_rate {
                engine.set_frame_rate(frame_rate);
            }
            ui.separator();

            ui.label("Rule Presets:");
            for (name, rules) in GameRules::presets() {
                if ui.selectable_label(stats.rules == rules, name).clicked() {
                    engine.set_rules(rules);
                }
            }
            ui.separator();

            ui.label("Stamp Pattern:");
            ui.horizontal_wrapped(|ui| {
                for (name, pattern) in STAMPS {
                    if ui.button(name).clicked() {
                        let origin = view.screen_to_cell(screen_center.0, screen_center.1);
                        engine.paint_all(pattern.cells(origin));
                    }
                }
            });
            ui.separator();

            ui.label(format!("Rule: {}", stats.rules));
            ui.label(format!("Generation: {}", stats.generation));
            ui.label(format!("Live Cells: {}", stats.population));
            ui.label(format!("TPS: {}  FPS: {}", stats.ticks_per_second, stats.frames_per_second));
            ui.label(format!("Cell Size: {}", view.cell_size));
            ui.label(format!("Offset: [{}, {}]", view.offset[0], view.offset[1]));
        });
}

fn rate_selector(ui: &mut egui::Ui, label: &str, selected: &mut RatePreset) {
    egui::ComboBox::from_label(label)
        .selected_text(selected.to_string())
        .show_ui(ui, |ui| {
            for preset in RatePreset::ALL {
                ui.selectable_value(selected, preset, preset.to_string());
            }
        });
}
