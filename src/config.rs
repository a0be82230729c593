use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::extract::ColumnExtractor;
use crate::data::report::BeamAnalyzer;

pub const SDDS2STREAM: &str = "sdds2stream";
pub const SDDSPRINTOUT: &str = "sddsprintout";
pub const SDDSANALYZEBEAM: &str = "sddsanalyzebeam";

// ---------------------------------------------------------------------------
// Tool locations
// ---------------------------------------------------------------------------

/// Where the external programs live.
///
/// `sdds2stream` and `sddsprintout` come from the SDDS toolkit bin directory,
/// `sddsanalyzebeam` from the OAG apps bin directory. An unset directory
/// means the bare program name is looked up on `PATH`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolPaths {
    pub sdds_bin: Option<PathBuf>,
    pub apps_bin: Option<PathBuf>,
}

impl ToolPaths {
    /// Read `{"sdds_bin": "...", "apps_bin": "..."}` (both keys optional).
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading tool config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing tool config {}", path.display()))
    }

    /// Explicit directories win; the config file fills what they leave unset.
    pub fn resolve(
        sdds_bin: Option<PathBuf>,
        apps_bin: Option<PathBuf>,
        config: Option<&Path>,
    ) -> Result<Self> {
        let explicit = ToolPaths { sdds_bin, apps_bin };
        let paths = match config {
            Some(path) => explicit.or(ToolPaths::from_file(path)?),
            None => explicit,
        };
        log::debug!("tool paths: {paths:?}");
        Ok(paths)
    }

    pub fn or(self, fallback: ToolPaths) -> Self {
        ToolPaths {
            sdds_bin: self.sdds_bin.or(fallback.sdds_bin),
            apps_bin: self.apps_bin.or(fallback.apps_bin),
        }
    }

    pub fn sdds2stream(&self) -> PathBuf {
        program(self.sdds_bin.as_deref(), SDDS2STREAM)
    }

    pub fn sddsprintout(&self) -> PathBuf {
        program(self.sdds_bin.as_deref(), SDDSPRINTOUT)
    }

    pub fn sddsanalyzebeam(&self) -> PathBuf {
        program(self.apps_bin.as_deref(), SDDSANALYZEBEAM)
    }

    pub fn extractor(&self) -> ColumnExtractor {
        ColumnExtractor::new(self.sdds2stream())
    }

    pub fn analyzer(&self) -> BeamAnalyzer {
        BeamAnalyzer::new(self.sddsanalyzebeam(), self.sddsprintout())
    }
}

fn program(dir: Option<&Path>, name: &str) -> PathBuf {
    match dir {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}
