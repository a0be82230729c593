use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ElegantViewApp {
    pub state: AppState,
}

impl ElegantViewApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for ElegantViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: run and legends ----
        egui::SidePanel::left("run_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: magnet strip + plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::beamline_plot(ui, &self.state);
        });

        panels::report_window(ctx, &mut self.state);
    }
}
