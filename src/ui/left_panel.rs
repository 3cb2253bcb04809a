//! Left panel UI: page, dataset and municipality selection.

use crate::state::{AppState, ViewMode};
use eframe::egui::{self, RichText};
use lcz_workbench::dataset::DatasetKey;

pub fn render_left_panel(
    ctx: &egui::Context,
    state: &mut AppState,
    communes: &[String],
    loading: bool,
) {
    egui::SidePanel::left("left_panel")
        .resizable(true)
        .default_width(220.0)
        .min_width(180.0)
        .max_width(360.0)
        .show(ctx, |ui| {
            ui.heading("View");
            ui.separator();

            ui.horizontal(|ui| {
                for mode in ViewMode::all() {
                    ui.selectable_value(&mut state.view.mode, *mode, mode.label());
                }
            });

            ui.add_space(10.0);

            if state.view.mode == ViewMode::Compare {
                dataset_selector(ui, "left_dataset", "Left", &mut state.view.left);
                dataset_selector(ui, "right_dataset", "Right", &mut state.view.right);
            } else {
                dataset_selector(ui, "primary_dataset", "Dataset", &mut state.view.primary);
            }

            ui.add_space(10.0);
            render_commune_section(ui, state, communes);

            if loading {
                ui.add_space(5.0);
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading dataset...");
                });
            }

            ui.add_space(20.0);
            ui.separator();

            if ui.button("Clear cache").clicked() {
                state.clear_cache_requested = true;
                state.status_message = "Clearing cache...".to_string();
            }
        });
}

fn dataset_selector(ui: &mut egui::Ui, id: &str, label: &str, selected: &mut DatasetKey) {
    ui.label(RichText::new(label).small());
    egui::ComboBox::from_id_salt(id)
        .selected_text(selected.to_string())
        .width(150.0)
        .show_ui(ui, |ui| {
            for key in DatasetKey::known() {
                ui.selectable_value(selected, *key, key.to_string());
            }
        });
}

fn render_commune_section(ui: &mut egui::Ui, state: &mut AppState, communes: &[String]) {
    egui::CollapsingHeader::new(RichText::new("Municipality").strong())
        .default_open(true)
        .show(ui, |ui| {
            let selected_text = state.view.commune.as_deref().unwrap_or("All");
            egui::ComboBox::from_id_salt("commune_selector")
                .selected_text(selected_text)
                .width(150.0)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut state.view.commune, None, "All");
                    for name in communes {
                        ui.selectable_value(&mut state.view.commune, Some(name.clone()), name);
                    }
                });

            if communes.is_empty() {
                ui.label(RichText::new("No municipalities in this dataset").small());
            }
        });
}
