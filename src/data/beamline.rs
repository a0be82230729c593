use std::path::Path;

use anyhow::{bail, Context, Result};

use super::extract::{ColumnExtractor, DEFAULT_NUMERIC_COLUMN};
use super::filter::{load_family, load_magnets, PROFILE_COLUMN};
use super::model::{
    BeamSizeData, BeamlineFiles, ElementFamily, EmittanceData, MagnetStrip, OpticsData,
};

// ---------------------------------------------------------------------------
// Unit conversions applied before plotting
// ---------------------------------------------------------------------------

pub const M_TO_MM: f64 = 1e3;
pub const M_TO_UM: f64 = 1e6;
pub const SPEED_OF_LIGHT: f64 = 3e8;

pub fn scaled(mut values: Vec<f64>, factor: f64) -> Vec<f64> {
    values.iter_mut().for_each(|v| *v *= factor);
    values
}

/// Longitudinal emittance in microns: `1e6 · c · p0 · sqrt(s6²·s7² − s67²)`.
///
/// `s6` is the rms bunch duration, `s7` the rms momentum spread and `s67`
/// their correlation; `p0` is the central momentum in units of m·c.
pub fn longitudinal_emittance(p0: &[f64], s6: &[f64], s7: &[f64], s67: &[f64]) -> Result<Vec<f64>> {
    let n = s6.len();
    if p0.len() != n || s7.len() != n || s67.len() != n {
        bail!(
            "longitudinal columns differ in length: pCentral {}, s6 {}, s7 {}, s67 {}",
            p0.len(),
            n,
            s7.len(),
            s67.len()
        );
    }
    Ok((0..n)
        .map(|i| {
            let det = s6[i].powi(2) * s7[i].powi(2) - s67[i].powi(2);
            M_TO_UM * SPEED_OF_LIGHT * p0[i] * det.sqrt()
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Loaders, one per plot
// ---------------------------------------------------------------------------

fn column(extractor: &ColumnExtractor, file: &Path, name: &str) -> Result<Vec<f64>> {
    extractor
        .numeric_column(file, name)
        .with_context(|| format!("reading column '{name}' from {}", file.display()))
}

/// `s` and `Profile` from `<root>.mag`.
pub fn load_strip(extractor: &ColumnExtractor, files: &BeamlineFiles) -> Result<MagnetStrip> {
    let mag = files.magnets();
    Ok(MagnetStrip {
        s: column(extractor, &mag, DEFAULT_NUMERIC_COLUMN)?,
        profile: column(extractor, &mag, PROFILE_COLUMN)?,
    })
}

/// Beta functions and horizontal dispersion from `<root>.twi`.
pub fn load_optics(extractor: &ColumnExtractor, files: &BeamlineFiles) -> Result<OpticsData> {
    let twi = files.twiss();
    Ok(OpticsData {
        s: column(extractor, &twi, DEFAULT_NUMERIC_COLUMN)?,
        betax: column(extractor, &twi, "betax")?,
        betay: column(extractor, &twi, "betay")?,
        etax: column(extractor, &twi, "etax")?,
    })
}

/// RMS sizes from `<root>.s`, converted to millimetres.
pub fn load_sizes(extractor: &ColumnExtractor, files: &BeamlineFiles) -> Result<BeamSizeData> {
    let stats = files.stats();
    Ok(BeamSizeData {
        s: column(extractor, &stats, DEFAULT_NUMERIC_COLUMN)?,
        sx: scaled(column(extractor, &stats, "Sx")?, M_TO_MM),
        sy: scaled(column(extractor, &stats, "Sy")?, M_TO_MM),
        sz: scaled(column(extractor, &stats, "Ss")?, M_TO_MM),
    })
}

/// Normalised emittances from `<root>.s` and `pCentral` from `<root>.cen`, in microns.
pub fn load_emittance(extractor: &ColumnExtractor, files: &BeamlineFiles) -> Result<EmittanceData> {
    let stats = files.stats();
    let s6 = column(extractor, &stats, "s6")?;
    let s7 = column(extractor, &stats, "s7")?;
    let s67 = column(extractor, &stats, "s67")?;
    let p0 = column(extractor, &files.centroid(), "pCentral")?;

    Ok(EmittanceData {
        s: column(extractor, &stats, DEFAULT_NUMERIC_COLUMN)?,
        ex: scaled(column(extractor, &stats, "ecnx")?, M_TO_UM),
        ey: scaled(column(extractor, &stats, "ecny")?, M_TO_UM),
        ez: longitudinal_emittance(&p0, &s6, &s7, &s67)?,
    })
}

/// One filtered `Profile` per element family, all sharing the strip's `s`.
///
/// Every family is zero outside its own elements, octupoles included:
/// `load_octupole` keeps the other rows and would redraw the whole strip.
pub fn load_families(
    extractor: &ColumnExtractor,
    files: &BeamlineFiles,
) -> Result<Vec<(ElementFamily, Vec<f64>)>> {
    let mag = files.magnets();
    ElementFamily::ALL
        .iter()
        .map(|&family| {
            let profile = match family {
                ElementFamily::Octupole => load_magnets(extractor, &mag, family.tags()),
                other => load_family(extractor, &mag, other),
            };
            profile
                .with_context(|| format!("loading {family} from {}", mag.display()))
                .map(|profile| (family, profile))
        })
        .collect()
}
