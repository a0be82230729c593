use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::color::FamilyColors;
use crate::config::ToolPaths;
use crate::data::beamline::{load_emittance, load_families, load_optics, load_sizes, load_strip};
use crate::data::extract::ColumnExtractor;
use crate::data::model::{
    BeamReport, BeamSizeData, BeamlineFiles, ElementFamily, EmittanceData, MagnetStrip, OpticsData,
};

// ---------------------------------------------------------------------------
// Views and loaded figures
// ---------------------------------------------------------------------------

/// Which quantity the main panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum PlotKind {
    /// β functions (and optionally ηx) from `<root>.twi`.
    #[default]
    Optics,
    /// RMS beam sizes from `<root>.s`.
    Sizes,
    /// RMS emittances from `<root>.s` and `<root>.cen`.
    Emittance,
    /// Filtered magnet profiles per element family.
    Magnets,
}

impl PlotKind {
    pub const ALL: [PlotKind; 4] = [
        PlotKind::Optics,
        PlotKind::Sizes,
        PlotKind::Emittance,
        PlotKind::Magnets,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PlotKind::Optics => "Optics",
            PlotKind::Sizes => "Sizes",
            PlotKind::Emittance => "Emittance",
            PlotKind::Magnets => "Magnets",
        }
    }
}

/// Data behind the main panel, already in plotting units.
#[derive(Debug, Clone)]
pub enum Figure {
    Optics(OpticsData),
    Sizes(BeamSizeData),
    Emittance(EmittanceData),
    Magnets(Vec<(ElementFamily, Vec<f64>)>),
}

/// Load the magnet strip and the main-panel data for one view.
pub fn load_figure(
    extractor: &ColumnExtractor,
    files: &BeamlineFiles,
    kind: PlotKind,
) -> Result<(MagnetStrip, Figure)> {
    let strip = load_strip(extractor, files)?;
    let figure = match kind {
        PlotKind::Optics => Figure::Optics(load_optics(extractor, files)?),
        PlotKind::Sizes => Figure::Sizes(load_sizes(extractor, files)?),
        PlotKind::Emittance => Figure::Emittance(load_emittance(extractor, files)?),
        PlotKind::Magnets => Figure::Magnets(load_families(extractor, files)?),
    };
    Ok((strip, figure))
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Where the SDDS programs live.
    pub tools: ToolPaths,

    /// Companion files of the open run (None until the user opens one).
    pub files: Option<BeamlineFiles>,

    /// Selected main-panel view.
    pub plot_kind: PlotKind,

    /// Overlay ηx on the optics view.
    pub show_eta: bool,

    /// Magnet strip of the open run.
    pub strip: Option<MagnetStrip>,

    /// Loaded data for `plot_kind`.
    pub figure: Option<Figure>,

    /// Last beam report and the particle file it came from.
    pub report: Option<(PathBuf, BeamReport)>,

    /// Whether the beam report window is open.
    pub show_report: bool,

    pub family_colors: FamilyColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(tools: ToolPaths) -> Self {
        Self {
            tools,
            files: None,
            plot_kind: PlotKind::default(),
            show_eta: false,
            strip: None,
            figure: None,
            report: None,
            show_report: false,
            family_colors: FamilyColors::default(),
            status_message: None,
        }
    }

    /// Open the run that `path` (rootname or any companion file) belongs to.
    pub fn open_run(&mut self, path: &Path) {
        self.files = Some(BeamlineFiles::from_companion(path));
        self.reload();
    }

    /// Switch view, reloading only when it changes.
    pub fn set_plot_kind(&mut self, kind: PlotKind) {
        if self.plot_kind != kind {
            self.plot_kind = kind;
            self.reload();
        }
    }

    /// Re-run the extractor for the current run and view.
    pub fn reload(&mut self) {
        let Some(files) = &self.files else {
            return;
        };
        match load_figure(&self.tools.extractor(), files, self.plot_kind) {
            Ok((strip, figure)) => {
                log::info!(
                    "Loaded {} view of {} ({} magnet rows)",
                    self.plot_kind.label(),
                    files.root().display(),
                    strip.s.len()
                );
                self.strip = Some(strip);
                self.figure = Some(figure);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to load run: {e:#}");
                self.strip = None;
                self.figure = None;
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Run the beam parameter dump on a particle file and show the result.
    pub fn load_report(&mut self, path: &Path) {
        match self.tools.analyzer().dump_params(path) {
            Ok(report) => {
                self.report = Some((path.to_path_buf(), report));
                self.show_report = true;
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to analyze beam: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
