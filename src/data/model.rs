use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Element-type allow-lists (ELEGANT `ElementType` tags)
// ---------------------------------------------------------------------------

pub const QUAD_TYPES: &[&str] = &["QUAD", "KQUAD"];
pub const BEND_TYPES: &[&str] = &["SBEN", "RBEN", "CSBEND", "CSRCSBEND", "CCBEND"];
pub const RF_TYPES: &[&str] = &["RFCA", "RFCW"];
pub const SEXT_TYPES: &[&str] = &["SEXT", "KSEXT"];
pub const OCTU_TYPES: &[&str] = &["OCTU", "KOCT"];

/// Magnet (and cavity) families that can be picked out of a `.mag` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementFamily {
    Quadrupole,
    Bend,
    RfCavity,
    Sextupole,
    Octupole,
}

impl ElementFamily {
    pub const ALL: [ElementFamily; 5] = [
        ElementFamily::Quadrupole,
        ElementFamily::Bend,
        ElementFamily::RfCavity,
        ElementFamily::Sextupole,
        ElementFamily::Octupole,
    ];

    /// The `ElementType` tags belonging to this family.
    pub fn tags(self) -> &'static [&'static str] {
        match self {
            ElementFamily::Quadrupole => QUAD_TYPES,
            ElementFamily::Bend => BEND_TYPES,
            ElementFamily::RfCavity => RF_TYPES,
            ElementFamily::Sextupole => SEXT_TYPES,
            ElementFamily::Octupole => OCTU_TYPES,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ElementFamily::Quadrupole => "Quadrupoles",
            ElementFamily::Bend => "Bends",
            ElementFamily::RfCavity => "RF cavities",
            ElementFamily::Sextupole => "Sextupoles",
            ElementFamily::Octupole => "Octupoles",
        }
    }
}

impl fmt::Display for ElementFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// BeamlineFiles – the companion files of one ELEGANT run
// ---------------------------------------------------------------------------

pub const TWISS_SUFFIX: &str = "twi";
pub const STATS_SUFFIX: &str = "s";
pub const CENTROID_SUFFIX: &str = "cen";
pub const MAGNET_SUFFIX: &str = "mag";

const COMPANION_SUFFIXES: [&str; 4] = [TWISS_SUFFIX, STATS_SUFFIX, CENTROID_SUFFIX, MAGNET_SUFFIX];

/// Paths of `<root>.twi`, `<root>.s`, `<root>.cen` and `<root>.mag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeamlineFiles {
    root: PathBuf,
}

impl BeamlineFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Recover the rootname from any one of the companion files.
    ///
    /// A path without a known suffix is taken to be the rootname itself.
    pub fn from_companion(path: &Path) -> Self {
        let known = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| COMPANION_SUFFIXES.contains(&ext));
        if known {
            Self::new(path.with_extension(""))
        } else {
            Self::new(path)
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn twiss(&self) -> PathBuf {
        self.with_suffix(TWISS_SUFFIX)
    }

    pub fn stats(&self) -> PathBuf {
        self.with_suffix(STATS_SUFFIX)
    }

    pub fn centroid(&self) -> PathBuf {
        self.with_suffix(CENTROID_SUFFIX)
    }

    pub fn magnets(&self) -> PathBuf {
        self.with_suffix(MAGNET_SUFFIX)
    }

    /// All four companion paths, in suffix order.
    pub fn all(&self) -> [PathBuf; 4] {
        [self.twiss(), self.stats(), self.centroid(), self.magnets()]
    }

    // Appended rather than `with_extension`, so "run.v2" keeps its ".v2".
    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut name = self.root.clone().into_os_string();
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    }
}

// ---------------------------------------------------------------------------
// Loaded plot data
// ---------------------------------------------------------------------------

/// Magnet profile along `s`, drawn as the thin strip above every plot.
#[derive(Debug, Clone, Default)]
pub struct MagnetStrip {
    pub s: Vec<f64>,
    pub profile: Vec<f64>,
}

/// Optics functions from `<root>.twi`, in metres.
#[derive(Debug, Clone, Default)]
pub struct OpticsData {
    pub s: Vec<f64>,
    pub betax: Vec<f64>,
    pub betay: Vec<f64>,
    pub etax: Vec<f64>,
}

/// RMS beam sizes from `<root>.s`, in millimetres.
#[derive(Debug, Clone, Default)]
pub struct BeamSizeData {
    pub s: Vec<f64>,
    pub sx: Vec<f64>,
    pub sy: Vec<f64>,
    pub sz: Vec<f64>,
}

/// Normalised RMS emittances, in microns.
#[derive(Debug, Clone, Default)]
pub struct EmittanceData {
    pub s: Vec<f64>,
    pub ex: Vec<f64>,
    pub ey: Vec<f64>,
    pub ez: Vec<f64>,
}

/// The three `sddsprintout` blocks produced for one beam file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeamReport {
    /// `pAverage`, `St`, `Sdelta`, `s56`.
    pub longitudinal: String,
    /// `enx`, `ecnx`, `alphax`, `betax`.
    pub horizontal: String,
    /// `eny`, `ecny`, `alphay`, `betay`.
    pub vertical: String,
}

impl BeamReport {
    pub fn blocks(&self) -> [(&'static str, &str); 3] {
        [
            ("Longitudinal", &self.longitudinal),
            ("Horizontal", &self.horizontal),
            ("Vertical", &self.vertical),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn companion_paths_share_the_root() {
        let files = BeamlineFiles::new("runs/fodo");
        assert_eq!(files.twiss(), PathBuf::from("runs/fodo.twi"));
        assert_eq!(files.stats(), PathBuf::from("runs/fodo.s"));
        assert_eq!(files.centroid(), PathBuf::from("runs/fodo.cen"));
        assert_eq!(files.magnets(), PathBuf::from("runs/fodo.mag"));
    }

    #[test]
    fn root_with_dot_keeps_its_tail() {
        let files = BeamlineFiles::new("runs/fodo.v2");
        assert_eq!(files.magnets(), PathBuf::from("runs/fodo.v2.mag"));
    }

    #[test]
    fn from_companion_strips_known_suffix_only() {
        let files = BeamlineFiles::from_companion(Path::new("runs/fodo.mag"));
        assert_eq!(files.root(), Path::new("runs/fodo"));

        let files = BeamlineFiles::from_companion(Path::new("runs/fodo.v2"));
        assert_eq!(files.root(), Path::new("runs/fodo.v2"));
    }

    #[test]
    fn families_cover_every_allow_list() {
        let tags: Vec<&str> = ElementFamily::ALL
            .iter()
            .flat_map(|f| f.tags().iter().copied())
            .collect();
        assert_eq!(tags.len(), 13);
        assert!(tags.contains(&"CSRCSBEND"));
        assert!(tags.contains(&"KOCT"));
    }
}
