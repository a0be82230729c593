use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors from the external-tool layer
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{tool} printed invalid UTF-8: {source}")]
    Utf8 {
        tool: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("row {row}: '{token}' is not a number")]
    ParseFloat { row: usize, token: String },

    #[error("row count mismatch: {left} values but {right} labels")]
    RowMismatch { left: usize, right: usize },
}

/// Run an external program to completion and return its captured stdout.
///
/// A non-zero exit is an error carrying the program's stderr.
pub fn run_tool<I, S>(program: &Path, args: I) -> Result<Vec<u8>, ExtractError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let tool = program.display().to_string();
    let mut command = Command::new(program);
    command.args(args);
    log::debug!("running {command:?}");

    let output = command.output().map_err(|source| ExtractError::Spawn {
        tool: tool.clone(),
        source,
    })?;

    if !output.status.success() {
        return Err(ExtractError::ToolFailed {
            tool,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

// ---------------------------------------------------------------------------
// sdds2stream column extraction
// ---------------------------------------------------------------------------

/// Column read when the caller does not name one: the beamline coordinate.
pub const DEFAULT_NUMERIC_COLUMN: &str = "s";
/// Label column paired with `Profile` in `.mag` files.
pub const DEFAULT_LABEL_COLUMN: &str = "ElementType";

/// Reads single SDDS columns by running `sdds2stream <file> -col=<name>`.
#[derive(Debug, Clone)]
pub struct ColumnExtractor {
    program: PathBuf,
}

impl ColumnExtractor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// One `f64` per row of `column` in `file`.
    pub fn numeric_column(&self, file: &Path, column: &str) -> Result<Vec<f64>, ExtractError> {
        let stdout = self.stream(file, column)?;
        parse_numeric(self.decode(&stdout)?)
    }

    /// One string per row of `column` in `file`.
    pub fn string_column(&self, file: &Path, column: &str) -> Result<Vec<String>, ExtractError> {
        let stdout = self.stream(file, column)?;
        Ok(parse_labels(self.decode(&stdout)?))
    }

    fn stream(&self, file: &Path, column: &str) -> Result<Vec<u8>, ExtractError> {
        let col_arg = format!("-col={column}");
        run_tool(&self.program, [file.as_os_str(), OsStr::new(&col_arg)])
    }

    fn decode<'a>(&self, stdout: &'a [u8]) -> Result<&'a str, ExtractError> {
        std::str::from_utf8(stdout).map_err(|source| ExtractError::Utf8 {
            tool: self.program().display().to_string(),
            source,
        })
    }
}

/// Parse whitespace/newline separated floats.
pub fn parse_numeric(text: &str) -> Result<Vec<f64>, ExtractError> {
    text.split_ascii_whitespace()
        .enumerate()
        .map(|(row, tok)| {
            tok.parse::<f64>().map_err(|_| ExtractError::ParseFloat {
                row,
                token: tok.to_string(),
            })
        })
        .collect()
}

/// Split into lines, dropping the empty piece after the final newline.
pub fn parse_labels(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}
