//! Central panel UI: statistics tables for the current page.

use super::colors;
use crate::state::{CompareSummary, IcuSummary, LczSummary, Summary, SummaryTables, ViewState};
use eframe::egui::{self, Color32, RichText};
use lcz_workbench::lcz;

pub fn render_stats_panel(
    ctx: &egui::Context,
    view: &ViewState,
    summary: Option<&Summary>,
    errors: &[String],
) {
    egui::CentralPanel::default().show(ctx, |ui| {
        for error in errors {
            ui.label(RichText::new(error).color(colors::ui::LOSS));
        }

        let Some(summary) = summary else {
            if errors.is_empty() {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Waiting for data...");
                });
            }
            return;
        };

        if view.commune.is_some() && !summary.filter_applied {
            ui.label(
                RichText::new("This dataset has no municipality attribute; showing the whole area")
                    .color(colors::ui::WARNING),
            );
        }

        egui::ScrollArea::vertical().show(ui, |ui| match &summary.tables {
            SummaryTables::Lcz(tables) => render_lcz(ui, view, tables),
            SummaryTables::Icu(tables) => render_icu(ui, view, tables),
            SummaryTables::Compare(tables) => render_compare(ui, view, tables),
        });
    });
}

fn heading(ui: &mut egui::Ui, title: String, view: &ViewState) {
    ui.heading(RichText::new(title).color(colors::ui::ACTIVE));
    if let Some(commune) = &view.commune {
        ui.label(RichText::new(commune).color(colors::ui::VALUE));
    }
    ui.add_space(5.0);
}

fn swatch(ui: &mut egui::Ui, hex: &str) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
    ui.painter().rect_filled(rect, 2.0, colors::from_hex(hex));
}

fn render_lcz(ui: &mut egui::Ui, view: &ViewState, tables: &LczSummary) {
    heading(ui, format!("LCZ classes, {}", view.primary), view);

    egui::Grid::new("lcz_table")
        .striped(true)
        .num_columns(6)
        .show(ui, |ui| {
            for header in ["", "Class", "Name", "Area (ha)", "Features", "Share"] {
                ui.label(RichText::new(header).strong());
            }
            ui.end_row();

            for row in &tables.rows {
                swatch(ui, row.color_hex);
                ui.label(&row.label);
                ui.label(row.name);
                ui.label(format!("{:.1}", row.area));
                ui.label(row.count.to_string());
                ui.label(format!("{:.1}%", row.percent));
                ui.end_row();
            }
        });

    footer(ui, tables.total_area, tables.skipped);
}

fn render_icu(ui: &mut egui::Ui, view: &ViewState, tables: &IcuSummary) {
    heading(ui, format!("Heat island intensity, {}", view.primary), view);

    ui.horizontal(|ui| {
        ui.label(RichText::new("Mean delta").color(colors::ui::LABEL));
        swatch(ui, lcz::icu_color_hex(Some(tables.mean_delta)));
        ui.label(format!("{:+.2} °C", tables.mean_delta));
    });
    ui.add_space(5.0);

    egui::Grid::new("icu_table")
        .striped(true)
        .num_columns(5)
        .show(ui, |ui| {
            for header in ["", "Range", "Area (ha)", "Features", "Share"] {
                ui.label(RichText::new(header).strong());
            }
            ui.end_row();

            for row in &tables.rows {
                swatch(ui, &row.color_hex);
                ui.label(&row.label);
                ui.label(format!("{:.1}", row.area));
                ui.label(row.count.to_string());
                ui.label(format!("{:.1}%", row.percent));
                ui.end_row();
            }
        });

    footer(ui, tables.total_area, tables.skipped);
}

fn render_compare(ui: &mut egui::Ui, view: &ViewState, tables: &CompareSummary) {
    heading(ui, format!("LCZ change, {} → {}", view.left, view.right), view);

    egui::Grid::new("compare_table")
        .striped(true)
        .num_columns(5)
        .show(ui, |ui| {
            for header in [
                String::new(),
                "Class".to_string(),
                view.left.to_string(),
                view.right.to_string(),
                "Change (ha)".to_string(),
            ] {
                ui.label(RichText::new(header).strong());
            }
            ui.end_row();

            for row in &tables.rows {
                swatch(ui, row.color_hex);
                ui.label(&row.label);
                ui.label(format!("{:.1}", row.left_area));
                ui.label(format!("{:.1}", row.right_area));
                ui.label(RichText::new(format!("{:+.1}", row.delta)).color(delta_color(row.delta)));
                ui.end_row();
            }
        });

    ui.add_space(5.0);
    ui.label(
        RichText::new(format!(
            "Totals: {:.1} ha → {:.1} ha",
            tables.left_total, tables.right_total
        ))
        .color(colors::ui::VALUE),
    );
}

fn delta_color(delta: f64) -> Color32 {
    if delta > 0.0 {
        colors::ui::GAIN
    } else if delta < 0.0 {
        colors::ui::LOSS
    } else {
        colors::ui::VALUE
    }
}

fn footer(ui: &mut egui::Ui, total_area: f64, skipped: usize) {
    ui.add_space(5.0);
    ui.label(RichText::new(format!("Total: {:.1} ha", total_area)).color(colors::ui::VALUE));
    if skipped > 0 {
        ui.label(
            RichText::new(format!("{} feature(s) without a usable value", skipped))
                .small()
                .color(colors::ui::WARNING),
        );
    }
}
