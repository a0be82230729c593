use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::report::parse_html_table;
use crate::state::{AppState, PlotKind};

// ---------------------------------------------------------------------------
// Left side panel – run summary and legends
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Run");
    ui.separator();

    let Some(files) = &state.files else {
        ui.label("No run loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong(files.root().display().to_string());
            for path in files.all() {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let (mark, color) = if path.exists() {
                    ("✔", Color32::GREEN)
                } else {
                    ("✖", Color32::RED)
                };
                ui.horizontal(|ui: &mut Ui| {
                    ui.label(RichText::new(mark).color(color));
                    ui.label(name);
                });
            }

            if state.plot_kind == PlotKind::Magnets {
                ui.separator();
                ui.strong("Element families");
                for (label, color) in state.family_colors.legend_entries() {
                    ui.label(RichText::new(label).color(color));
                }
            }

            if let Some((path, _)) = &state.report {
                ui.separator();
                ui.strong("Beam report");
                ui.label(path.display().to_string());
                if ui.button("Show").clicked() {
                    state.show_report = true;
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open run…").clicked() {
                open_run_dialog(state);
                ui.close_menu();
            }
            if ui.button("Beam report…").clicked() {
                open_report_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for kind in PlotKind::ALL {
            if ui
                .selectable_label(state.plot_kind == kind, kind.label())
                .clicked()
            {
                state.set_plot_kind(kind);
            }
        }

        if state.plot_kind == PlotKind::Optics {
            ui.separator();
            ui.checkbox(&mut state.show_eta, "ηx");
        }

        ui.separator();

        if ui
            .add_enabled(state.files.is_some(), egui::Button::new("Reload"))
            .clicked()
        {
            state.reload();
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Beam report window
// ---------------------------------------------------------------------------

/// Floating window with the three printout blocks as tables.
pub fn report_window(ctx: &egui::Context, state: &mut AppState) {
    let Some((path, report)) = &state.report else {
        return;
    };
    let mut open = state.show_report;

    egui::Window::new("Beam parameters")
        .open(&mut open)
        .resizable(true)
        .show(ctx, |ui: &mut Ui| {
            ui.label(path.display().to_string());
            for (i, (title, block)) in report.blocks().into_iter().enumerate() {
                ui.separator();
                ui.strong(title);
                let rows = parse_html_table(block);
                if rows.is_empty() {
                    ui.monospace(block);
                    continue;
                }
                ui.push_id(i, |ui: &mut Ui| report_table(ui, &rows));
            }
        });

    state.show_report = open;
}

fn report_table(ui: &mut Ui, rows: &[Vec<String>]) {
    let Some((header, body)) = rows.split_first() else {
        return;
    };
    let n_cols = rows.iter().map(Vec::len).max().unwrap_or(0);

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .columns(Column::auto().at_least(80.0), n_cols)
        .header(20.0, |mut row| {
            for name in header {
                row.col(|ui: &mut Ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|mut body_ui| {
            for cells in body {
                body_ui.row(18.0, |mut row| {
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.monospace(cell);
                        });
                    }
                });
            }
        });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_run_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open ELEGANT run")
        .add_filter("ELEGANT output", &["twi", "s", "cen", "mag"])
        .add_filter("All files", &["*"])
        .pick_file();

    if let Some(path) = file {
        state.open_run(&path);
    }
}

pub fn open_report_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Analyze particle file")
        .pick_file();

    if let Some(path) = file {
        state.load_report(&path);
    }
}
