use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::extract::run_tool;
use super::model::BeamReport;

// ---------------------------------------------------------------------------
// Beam parameter dump: sddsanalyzebeam + three sddsprintout passes
// ---------------------------------------------------------------------------

pub const LONGITUDINAL_COLUMNS: [&str; 4] = ["pAverage", "St", "Sdelta", "s56"];
pub const HORIZONTAL_COLUMNS: [&str; 4] = ["enx", "ecnx", "alphax", "betax"];
pub const VERTICAL_COLUMNS: [&str; 4] = ["eny", "ecny", "alphay", "betay"];

/// Name of the analyzer output inside the per-call scratch directory.
const SCRATCH_NAME: &str = "beam.sab";

/// Runs `sddsanalyzebeam` on a particle file and formats the result with
/// `sddsprintout`.
#[derive(Debug, Clone)]
pub struct BeamAnalyzer {
    analyzer: PathBuf,
    printout: PathBuf,
}

impl BeamAnalyzer {
    pub fn new(analyzer: impl Into<PathBuf>, printout: impl Into<PathBuf>) -> Self {
        Self {
            analyzer: analyzer.into(),
            printout: printout.into(),
        }
    }

    /// Analyze `input` through a private scratch directory that is removed
    /// before returning.
    pub fn dump_params(&self, input: &Path) -> Result<BeamReport> {
        let scratch_dir = tempfile::Builder::new()
            .prefix("elegant-view-")
            .tempdir()
            .context("creating scratch directory for sddsanalyzebeam")?;
        self.dump_params_with_scratch(input, &scratch_dir.path().join(SCRATCH_NAME))
    }

    /// Analyze `input`, writing the intermediate SDDS file to `scratch`.
    ///
    /// The scratch file is left in place for the caller.
    pub fn dump_params_with_scratch(&self, input: &Path, scratch: &Path) -> Result<BeamReport> {
        run_tool(&self.analyzer, [input.as_os_str(), scratch.as_os_str()])
            .with_context(|| format!("analyzing beam file {}", input.display()))?;

        let report = BeamReport {
            longitudinal: self.print_columns(scratch, &LONGITUDINAL_COLUMNS)?,
            horizontal: self.print_columns(scratch, &HORIZONTAL_COLUMNS)?,
            vertical: self.print_columns(scratch, &VERTICAL_COLUMNS)?,
        };
        log::info!("beam parameters of {} ready", input.display());
        Ok(report)
    }

    fn print_columns(&self, scratch: &Path, columns: &[&str]) -> Result<String> {
        let mut args: Vec<OsString> = vec![scratch.as_os_str().to_os_string()];
        args.extend(columns.iter().map(|c| OsString::from(format!("-col={c}"))));
        args.push("-noTitle".into());
        args.push("-htmlFormat".into());

        let stdout = run_tool(&self.printout, &args)
            .with_context(|| format!("printing columns {columns:?}"))?;
        let text = String::from_utf8(stdout).context("sddsprintout output is not UTF-8")?;
        Ok(strip_newlines(&text))
    }
}

/// Remove every newline from a printout block.
pub fn strip_newlines(text: &str) -> String {
    text.replace('\n', "")
}

// ---------------------------------------------------------------------------
// HTML table → rows of cells (for the report tables in the side panel)
// ---------------------------------------------------------------------------

/// Split an `-htmlFormat` printout into rows of plain-text cells.
///
/// Only `tr`, `th`, `td` and `br` are interpreted; other tags are dropped.
pub fn parse_html_table(html: &str) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut cell: Option<String> = None;
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        if let Some(c) = cell.as_mut() {
            c.push_str(&rest[..open]);
        }
        let Some(len) = rest[open..].find('>') else {
            break;
        };
        let tag = rest[open + 1..open + len].trim().to_ascii_lowercase();
        rest = &rest[open + len + 1..];

        let closing = tag.starts_with('/');
        let name = tag
            .trim_start_matches('/')
            .split(|ch: char| ch.is_whitespace() || ch == '/')
            .next()
            .unwrap_or("");

        match (name, closing) {
            ("tr", false) => {
                finish_cell(&mut rows, &mut cell);
                rows.push(Vec::new());
            }
            ("td" | "th", false) => {
                finish_cell(&mut rows, &mut cell);
                cell = Some(String::new());
            }
            ("td" | "th" | "tr" | "table", true) => finish_cell(&mut rows, &mut cell),
            ("br", _) => {
                if let Some(c) = cell.as_mut() {
                    c.push(' ');
                }
            }
            _ => {}
        }
    }
    finish_cell(&mut rows, &mut cell);
    rows.retain(|r| !r.is_empty());
    rows
}

fn finish_cell(rows: &mut Vec<Vec<String>>, cell: &mut Option<String>) {
    let Some(text) = cell.take() else {
        return;
    };
    if rows.is_empty() {
        rows.push(Vec::new());
    }
    if let Some(row) = rows.last_mut() {
        row.push(decode_entities(&text));
    }
}

fn decode_entities(text: &str) -> String {
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_newlines_leaves_no_newline() {
        let text = "<table>\n<tr><td>1</td></tr>\n</table>\n";
        let stripped = strip_newlines(text);
        assert_eq!(stripped, "<table><tr><td>1</td></tr></table>");
        assert!(!stripped.contains('\n'));
    }

    #[test]
    fn html_table_rows_and_cells() {
        let html = "<TABLE BORDER><TR><TH>pAverage</TH><TH>St</TH></TR>\
                    <tr><td>  1.957e+03 </td><td>3.3e-12&nbsp;s</td></tr></TABLE>";
        let rows = parse_html_table(html);
        assert_eq!(
            rows,
            vec![
                vec!["pAverage".to_string(), "St".to_string()],
                vec!["1.957e+03".to_string(), "3.3e-12 s".to_string()],
            ]
        );
    }

    #[test]
    fn html_table_ignores_text_outside_cells() {
        let html = "caption<table><tr><td>a<br>b</td><td>&lt;x&gt;</td></tr></table>tail";
        assert_eq!(
            parse_html_table(html),
            vec![vec!["a b".to_string(), "<x>".to_string()]]
        );
    }

    #[test]
    fn html_table_of_plain_text_is_empty() {
        assert!(parse_html_table("no table here").is_empty());
    }

    #[cfg(unix)]
    mod with_fake_tools {
        use super::super::*;
        use crate::test_support::{fake_tool, lock_tools};

        const PRINTOUT: &str = r#"
test -f "$1" || { echo "missing $1" >&2; exit 2; }
shift
cols=""
for a in "$@"; do
  case "$a" in -col=*) cols="$cols<th>${a#-col=}</th>" ;; esac
done
printf '<table>\n<tr>%s</tr>\n<tr><td>1.0</td></tr>\n</table>\n' "$cols""#;

        fn analyzer_body(log: &Path) -> String {
            format!(
                "printf 'SDDS1\\n' > \"$2\"\necho \"$2\" >> '{}'",
                log.display()
            )
        }

        #[test]
        fn dump_returns_three_stripped_blocks() {
            let _guard = lock_tools();
            let dir = tempfile::tempdir().unwrap();
            let log = dir.path().join("scratch.log");
            let analyzer = BeamAnalyzer::new(
                fake_tool(dir.path(), "sddsanalyzebeam", &analyzer_body(&log)),
                fake_tool(dir.path(), "sddsprintout", PRINTOUT),
            );

            let report = analyzer.dump_params(&dir.path().join("beam.out")).unwrap();
            assert_eq!(
                report.longitudinal,
                "<table><tr><th>pAverage</th><th>St</th><th>Sdelta</th><th>s56</th></tr>\
                 <tr><td>1.0</td></tr></table>"
            );
            assert!(report.horizontal.contains("<th>ecnx</th>"));
            assert!(report.vertical.contains("<th>betay</th>"));
            for (_, block) in report.blocks() {
                assert!(!block.is_empty());
                assert!(!block.contains('\n'));
            }
        }

        #[test]
        fn scratch_files_are_unique_and_removed() {
            let _guard = lock_tools();
            let dir = tempfile::tempdir().unwrap();
            let log = dir.path().join("scratch.log");
            let analyzer = BeamAnalyzer::new(
                fake_tool(dir.path(), "sddsanalyzebeam", &analyzer_body(&log)),
                fake_tool(dir.path(), "sddsprintout", PRINTOUT),
            );

            analyzer.dump_params(&dir.path().join("a.out")).unwrap();
            analyzer.dump_params(&dir.path().join("b.out")).unwrap();

            let used = std::fs::read_to_string(&log).unwrap();
            let used: Vec<&str> = used.lines().collect();
            assert_eq!(used.len(), 2);
            assert_ne!(used[0], used[1]);
            for path in used {
                assert!(!Path::new(path).exists(), "{path} left behind");
            }
        }

        #[test]
        fn caller_scratch_is_kept() {
            let _guard = lock_tools();
            let dir = tempfile::tempdir().unwrap();
            let log = dir.path().join("scratch.log");
            let analyzer = BeamAnalyzer::new(
                fake_tool(dir.path(), "sddsanalyzebeam", &analyzer_body(&log)),
                fake_tool(dir.path(), "sddsprintout", PRINTOUT),
            );
            let scratch = dir.path().join("tmpsab");

            analyzer
                .dump_params_with_scratch(&dir.path().join("beam.out"), &scratch)
                .unwrap();
            assert_eq!(std::fs::read_to_string(&scratch).unwrap(), "SDDS1\n");
        }

        #[test]
        fn analyzer_failure_is_an_error() {
            let _guard = lock_tools();
            let dir = tempfile::tempdir().unwrap();
            let analyzer = BeamAnalyzer::new(
                fake_tool(dir.path(), "sddsanalyzebeam", "echo 'bad input' >&2; exit 1"),
                fake_tool(dir.path(), "sddsprintout", PRINTOUT),
            );

            let err = analyzer.dump_params(&dir.path().join("beam.out")).unwrap_err();
            let message = format!("{err:#}");
            assert!(message.contains("analyzing beam file"), "{message}");
            assert!(message.contains("bad input"), "{message}");
        }
    }
}
