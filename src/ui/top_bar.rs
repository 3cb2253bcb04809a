//! Top bar UI: app title, status, and session statistics.

use super::colors;
use crate::state::AppState;
use eframe::egui::{self, Color32, RichText};

pub fn render_top_bar(ctx: &egui::Context, state: &AppState) {
    egui::TopBottomPanel::top("top_bar")
        .exact_height(36.0)
        .show(ctx, |ui| {
            ui.horizontal_centered(|ui| {
                // App title
                ui.label(
                    RichText::new("LCZ Workbench")
                        .strong()
                        .size(16.0)
                        .color(Color32::WHITE),
                );

                ui.separator();

                // Status text
                ui.label(
                    RichText::new(&state.status_message)
                        .size(13.0)
                        .color(Color32::GRAY),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let stats = &state.session_stats;
                    stat(ui, "Cache", &stats.format_cache_size());
                    ui.separator();
                    stat(ui, "Loads", &stats.format_requests());
                    ui.separator();
                    ui.label(
                        RichText::new(stats.format_last_load())
                            .size(11.0)
                            .color(colors::ui::VALUE),
                    );
                });
            });
        });
}

/// Label/value pair, laid out right to left.
fn stat(ui: &mut egui::Ui, label: &str, value: &str) {
    ui.label(RichText::new(value).size(11.0).color(colors::ui::VALUE));
    ui.label(RichText::new(label).size(11.0).color(colors::ui::LABEL));
}
