mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

#[cfg(all(test, unix))]
mod test_support;

use std::path::PathBuf;

use anyhow::Result;
use app::ElegantViewApp;
use clap::Parser;
use config::ToolPaths;
use eframe::egui;
use state::{AppState, PlotKind};

/// Beamline plots and beam-parameter summaries for ELEGANT SDDS output.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Rootname of the run, or any of its .twi/.s/.cen/.mag files
    root: Option<PathBuf>,

    /// View shown at start
    #[arg(long, value_enum, default_value_t = PlotKind::Optics)]
    plot: PlotKind,

    /// Overlay horizontal dispersion on the optics view
    #[arg(long)]
    eta: bool,

    /// Directory holding sdds2stream and sddsprintout
    #[arg(long, env = "SDDS_BIN_DIR")]
    sdds_bin: Option<PathBuf>,

    /// Directory holding sddsanalyzebeam
    #[arg(long, env = "ELEGANT_APPS_BIN")]
    apps_bin: Option<PathBuf>,

    /// JSON file with "sdds_bin" / "apps_bin" keys
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the beam parameter report of FILE and exit
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let tools = ToolPaths::resolve(cli.sdds_bin, cli.apps_bin, cli.config.as_deref())?;

    if let Some(beam) = &cli.report {
        let report = tools.analyzer().dump_params(beam)?;
        for (title, block) in report.blocks() {
            println!("{title}:\n{block}\n");
        }
        return Ok(());
    }

    let mut state = AppState::new(tools);
    state.plot_kind = cli.plot;
    state.show_eta = cli.eta;
    if let Some(root) = &cli.root {
        state.open_run(root);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 700.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Elegant View – Beamline Plots",
        options,
        Box::new(|_cc| Ok(Box::new(ElegantViewApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running the viewer: {e}"))
}
