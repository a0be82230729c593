use std::path::Path;

use super::extract::{ColumnExtractor, ExtractError, DEFAULT_LABEL_COLUMN};
use super::model::{ElementFamily, BEND_TYPES, OCTU_TYPES, QUAD_TYPES};

// ---------------------------------------------------------------------------
// Type filters: suppress profile rows by their `ElementType` label
// ---------------------------------------------------------------------------

/// Value written into octupole rows by [`flag_listed`].
pub const OCTUPOLE_FLAG: f64 = 0.8;

/// Numeric column holding the magnet footprint in `.mag` files.
pub const PROFILE_COLUMN: &str = "Profile";

fn check_rows(profile: &[f64], labels: &[String]) -> Result<(), ExtractError> {
    if profile.len() != labels.len() {
        return Err(ExtractError::RowMismatch {
            left: profile.len(),
            right: labels.len(),
        });
    }
    Ok(())
}

/// Zero every row whose label is not in `allow`.
pub fn zero_unlisted(
    profile: &mut [f64],
    labels: &[String],
    allow: &[&str],
) -> Result<(), ExtractError> {
    check_rows(profile, labels)?;
    for (value, label) in profile.iter_mut().zip(labels) {
        if !allow.contains(&label.as_str()) {
            *value = 0.0;
        }
    }
    Ok(())
}

/// Set rows whose label is in `allow` to [`OCTUPOLE_FLAG`]; leave the rest.
///
/// Unlike [`zero_unlisted`] the non-matching rows keep their loaded value.
pub fn flag_listed(
    profile: &mut [f64],
    labels: &[String],
    allow: &[&str],
) -> Result<(), ExtractError> {
    check_rows(profile, labels)?;
    for (value, label) in profile.iter_mut().zip(labels) {
        if allow.contains(&label.as_str()) {
            *value = OCTUPOLE_FLAG;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Loaders for `.mag` files
// ---------------------------------------------------------------------------

fn load_profile(
    extractor: &ColumnExtractor,
    file: &Path,
) -> Result<(Vec<f64>, Vec<String>), ExtractError> {
    let profile = extractor.numeric_column(file, PROFILE_COLUMN)?;
    let labels = extractor.string_column(file, DEFAULT_LABEL_COLUMN)?;
    Ok((profile, labels))
}

/// `Profile` of `file` with every element outside `allow` zeroed.
pub fn load_magnets(
    extractor: &ColumnExtractor,
    file: &Path,
    allow: &[&str],
) -> Result<Vec<f64>, ExtractError> {
    let (mut profile, labels) = load_profile(extractor, file)?;
    zero_unlisted(&mut profile, &labels, allow)?;
    Ok(profile)
}

pub fn load_quad(extractor: &ColumnExtractor, file: &Path) -> Result<Vec<f64>, ExtractError> {
    load_magnets(extractor, file, QUAD_TYPES)
}

pub fn load_dipole(extractor: &ColumnExtractor, file: &Path) -> Result<Vec<f64>, ExtractError> {
    load_magnets(extractor, file, BEND_TYPES)
}

pub fn load_octupole(extractor: &ColumnExtractor, file: &Path) -> Result<Vec<f64>, ExtractError> {
    let (mut profile, labels) = load_profile(extractor, file)?;
    flag_listed(&mut profile, &labels, OCTU_TYPES)?;
    Ok(profile)
}

/// Filtered profile for one family, using that family's policy.
pub fn load_family(
    extractor: &ColumnExtractor,
    file: &Path,
    family: ElementFamily,
) -> Result<Vec<f64>, ExtractError> {
    match family {
        ElementFamily::Quadrupole => load_quad(extractor, file),
        ElementFamily::Bend => load_dipole(extractor, file),
        ElementFamily::Octupole => load_octupole(extractor, file),
        other => load_magnets(extractor, file, other.tags()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn zero_unlisted_keeps_quadrupoles() {
        let mut profile = vec![1.0, 2.0, 3.0];
        let tags = labels(&["QUAD", "SBEN", "KQUAD"]);
        zero_unlisted(&mut profile, &tags, QUAD_TYPES).unwrap();
        assert_eq!(profile, vec![1.0, 0.0, 3.0]);
    }

    #[test]
    fn zero_unlisted_is_exact_match() {
        let mut profile = vec![1.0, 1.0, 1.0];
        let tags = labels(&["quad", "QUADX", "QUAD"]);
        zero_unlisted(&mut profile, &tags, QUAD_TYPES).unwrap();
        assert_eq!(profile, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn zero_unlisted_with_bends() {
        let mut profile = vec![0.5, -0.5, 0.5, 0.5];
        let tags = labels(&["CSRCSBEND", "QUAD", "CCBEND", "DRIF"]);
        zero_unlisted(&mut profile, &tags, BEND_TYPES).unwrap();
        assert_eq!(profile, vec![0.5, 0.0, 0.5, 0.0]);
    }

    #[test]
    fn flag_listed_marks_octupoles_and_keeps_others() {
        let mut profile = vec![5.0, 6.0];
        flag_listed(&mut profile, &labels(&["OCTU", "QUAD"]), OCTU_TYPES).unwrap();
        assert_eq!(profile, vec![0.8, 6.0]);
    }

    #[test]
    fn every_row_follows_the_zero_policy() {
        let original = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let tags = labels(&["SEXT", "KSEXT", "DRIF", "QUAD", "SEXT", "MARK"]);
        let mut filtered = original.clone();
        zero_unlisted(&mut filtered, &tags, ElementFamily::Sextupole.tags()).unwrap();
        for i in 0..original.len() {
            let listed = ElementFamily::Sextupole.tags().contains(&tags[i].as_str());
            assert_eq!(filtered[i] == 0.0, !listed, "row {i}");
            if listed {
                assert_eq!(filtered[i], original[i]);
            }
        }
    }

    #[test]
    fn row_mismatch_is_reported() {
        let mut profile = vec![1.0, 2.0];
        let err = zero_unlisted(&mut profile, &labels(&["QUAD"]), QUAD_TYPES).unwrap_err();
        assert!(matches!(err, ExtractError::RowMismatch { left: 2, right: 1 }));

        let err = flag_listed(&mut profile, &labels(&["OCTU", "OCTU", "OCTU"]), OCTU_TYPES)
            .unwrap_err();
        assert!(matches!(err, ExtractError::RowMismatch { left: 2, right: 3 }));
        assert_eq!(profile, vec![1.0, 2.0]);
    }

    #[cfg(unix)]
    mod with_fake_tool {
        use super::super::*;
        use crate::test_support::{fake_tool, lock_tools};

        const SDDS2STREAM: &str = r#"
case "$2" in
  -col=Profile) printf '1\n2\n3\n4\n' ;;
  -col=ElementType) printf 'QUAD\nSBEN\nOCTU\nRFCA\n' ;;
  *) exit 1 ;;
esac"#;

        #[test]
        fn family_loaders_apply_their_policy() {
            let _guard = lock_tools();
            let dir = tempfile::tempdir().unwrap();
            let extractor = ColumnExtractor::new(fake_tool(dir.path(), "sdds2stream", SDDS2STREAM));
            let mag = dir.path().join("run.mag");

            assert_eq!(
                load_quad(&extractor, &mag).unwrap(),
                vec![1.0, 0.0, 0.0, 0.0]
            );
            assert_eq!(
                load_dipole(&extractor, &mag).unwrap(),
                vec![0.0, 2.0, 0.0, 0.0]
            );
            assert_eq!(
                load_octupole(&extractor, &mag).unwrap(),
                vec![1.0, 2.0, 0.8, 4.0]
            );
            assert_eq!(
                load_family(&extractor, &mag, ElementFamily::RfCavity).unwrap(),
                vec![0.0, 0.0, 0.0, 4.0]
            );
            assert_eq!(
                load_magnets(&extractor, &mag, &["QUAD", "SBEN"]).unwrap(),
                vec![1.0, 2.0, 0.0, 0.0]
            );
        }
    }
}
