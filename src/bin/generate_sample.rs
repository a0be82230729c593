use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

/// Write a toy FODO run (<root>.twi, .s, .cen, .mag) as ASCII SDDS files.
#[derive(Debug, Parser)]
#[command(about)]
struct Args {
    /// Rootname of the generated files
    #[arg(default_value = "sample_fodo")]
    root: PathBuf,

    /// Number of FODO cells
    #[arg(long, default_value_t = 8)]
    cells: usize,
}

// ---------------------------------------------------------------------------
// Lattice
// ---------------------------------------------------------------------------

const CELL_LENGTH: f64 = 4.0;
const FOCAL_LENGTH: f64 = 1.5;
const BEND_ANGLE: f64 = 0.05;
const QUAD_LENGTH: f64 = 0.2;
const BEND_LENGTH: f64 = 0.8;
const STEP: f64 = 0.05;

/// Beam: normalised emittance, central momentum (βγ), energy spread, bunch duration.
const EMIT_N: f64 = 1e-6;
const P_CENTRAL: f64 = 200.0;
const SIGMA_DELTA: f64 = 1e-3;
const SIGMA_T: f64 = 3.3e-12;
const C_LIGHT: f64 = 299_792_458.0;

#[derive(Debug, Clone, Copy)]
enum Op {
    Drift(f64),
    /// Thin quadrupole (`k` = 1/f, focusing in x for k > 0) with an optional bend kick.
    Kick { k: f64, theta: f64 },
}

type Mat = [[f64; 2]; 2];

const IDENTITY: Mat = [[1.0, 0.0], [0.0, 1.0]];

fn mul(a: &Mat, b: &Mat) -> Mat {
    [
        [
            a[0][0] * b[0][0] + a[0][1] * b[1][0],
            a[0][0] * b[0][1] + a[0][1] * b[1][1],
        ],
        [
            a[1][0] * b[0][0] + a[1][1] * b[1][0],
            a[1][0] * b[0][1] + a[1][1] * b[1][1],
        ],
    ]
}

fn op_matrix(op: Op, plane_sign: f64) -> Mat {
    match op {
        Op::Drift(l) => [[1.0, l], [0.0, 1.0]],
        Op::Kick { k, .. } => [[1.0, 0.0], [-plane_sign * k, 1.0]],
    }
}

/// One cell sampled every `STEP`: QF/2, drift, bend, drift, QD, drift, bend, drift, QF/2.
fn cell_ops() -> Vec<Op> {
    let half = CELL_LENGTH / 2.0;
    let focus = Op::Kick {
        k: 0.5 / FOCAL_LENGTH,
        theta: 0.0,
    };
    let defocus = Op::Kick {
        k: -1.0 / FOCAL_LENGTH,
        theta: 0.0,
    };
    let bend = Op::Kick {
        k: 0.0,
        theta: BEND_ANGLE,
    };
    let mut ops = vec![focus];
    drift(&mut ops, half / 2.0);
    ops.push(bend);
    drift(&mut ops, half / 2.0);
    ops.push(defocus);
    drift(&mut ops, half / 2.0);
    ops.push(bend);
    drift(&mut ops, half / 2.0);
    ops.push(focus);
    ops
}

fn drift(ops: &mut Vec<Op>, length: f64) {
    let n = ((length / STEP).round() as usize).max(1);
    ops.extend(std::iter::repeat(Op::Drift(length / n as f64)).take(n));
}

/// Periodic (β, α) of a plane from the cell matrix.
fn periodic_twiss(m: &Mat) -> Result<(f64, f64)> {
    let cos_mu = (m[0][0] + m[1][1]) / 2.0;
    anyhow::ensure!(cos_mu.abs() < 1.0, "cell is unstable (cos μ = {cos_mu})");
    let sin_mu = m[0][1].signum() * (1.0 - cos_mu * cos_mu).sqrt();
    Ok((m[0][1] / sin_mu, (m[0][0] - m[1][1]) / (2.0 * sin_mu)))
}

fn propagate_beta(m: &Mat, beta0: f64, alpha0: f64) -> f64 {
    let gamma0 = (1.0 + alpha0 * alpha0) / beta0;
    m[0][0].powi(2) * beta0 - 2.0 * m[0][0] * m[0][1] * alpha0 + m[0][1].powi(2) * gamma0
}

fn track_dispersion(ops: &[Op], mut eta: [f64; 2]) -> [f64; 2] {
    for &op in ops {
        match op {
            Op::Drift(l) => eta[0] += l * eta[1],
            Op::Kick { k, theta } => eta[1] += -k * eta[0] + theta,
        }
    }
    eta
}

/// Fixed point of the affine dispersion map over one cell.
fn periodic_dispersion(ops: &[Op]) -> [f64; 2] {
    let d = track_dispersion(ops, [0.0, 0.0]);
    let c0 = track_dispersion(ops, [1.0, 0.0]);
    let c1 = track_dispersion(ops, [0.0, 1.0]);
    // (I - M) η = d
    let a = [
        [1.0 - (c0[0] - d[0]), -(c1[0] - d[0])],
        [-(c0[1] - d[1]), 1.0 - (c1[1] - d[1])],
    ];
    let det = a[0][0] * a[1][1] - a[0][1] * a[1][0];
    [
        (a[1][1] * d[0] - a[0][1] * d[1]) / det,
        (a[0][0] * d[1] - a[1][0] * d[0]) / det,
    ]
}

// ---------------------------------------------------------------------------
// Magnet profile rows (rectangles, like ELEGANT's magnets output)
// ---------------------------------------------------------------------------

struct MagnetRows {
    s: Vec<f64>,
    profile: Vec<f64>,
    element_type: Vec<String>,
}

impl MagnetRows {
    fn push_box(&mut self, start: f64, length: f64, height: f64, kind: &str) {
        let end = start + length;
        for (s, h) in [(start, 0.0), (start, height), (end, height), (end, 0.0)] {
            self.s.push(s);
            self.profile.push(h);
            self.element_type.push(kind.to_string());
        }
    }

    fn push_drift(&mut self, start: f64, end: f64) {
        for s in [start, end] {
            self.s.push(s);
            self.profile.push(0.0);
            self.element_type.push("DRIF".to_string());
        }
    }
}

fn magnet_rows(cells: usize) -> MagnetRows {
    let mut rows = MagnetRows {
        s: Vec::new(),
        profile: Vec::new(),
        element_type: Vec::new(),
    };
    let quarter = CELL_LENGTH / 4.0;
    for cell in 0..cells {
        let s0 = cell as f64 * CELL_LENGTH;
        rows.push_box(s0, QUAD_LENGTH / 2.0, 1.0, "QUAD");
        let (b1, qd, b2) = (s0 + quarter, s0 + 2.0 * quarter, s0 + 3.0 * quarter);
        let half_quad = QUAD_LENGTH / 2.0;
        let half_bend = BEND_LENGTH / 2.0;
        rows.push_drift(s0 + half_quad, b1 - half_bend);
        rows.push_box(b1 - half_bend, BEND_LENGTH, 0.5, "CSBEND");
        rows.push_drift(b1 + half_bend, qd - half_quad);
        rows.push_box(qd - half_quad, QUAD_LENGTH, -1.0, "KQUAD");
        rows.push_drift(qd + half_quad, b2 - half_bend);
        rows.push_box(b2 - half_bend, BEND_LENGTH, 0.5, "CSBEND");
        rows.push_drift(b2 + half_bend, s0 + CELL_LENGTH - half_quad);
        rows.push_box(s0 + CELL_LENGTH - half_quad, half_quad, 1.0, "QUAD");
    }
    rows
}

// ---------------------------------------------------------------------------
// ASCII SDDS writer
// ---------------------------------------------------------------------------

enum Values<'a> {
    Double(&'a [f64]),
    Text(&'a [String]),
}

struct SddsColumn<'a> {
    name: &'a str,
    units: &'a str,
    values: Values<'a>,
}

impl SddsColumn<'_> {
    fn len(&self) -> usize {
        match &self.values {
            Values::Double(v) => v.len(),
            Values::Text(v) => v.len(),
        }
    }
}

fn double<'a>(name: &'a str, units: &'a str, values: &'a [f64]) -> SddsColumn<'a> {
    SddsColumn {
        name,
        units,
        values: Values::Double(values),
    }
}

fn write_sdds(path: &Path, description: &str, columns: &[SddsColumn]) -> Result<()> {
    let rows = columns.first().map(SddsColumn::len).unwrap_or(0);
    anyhow::ensure!(
        columns.iter().all(|c| c.len() == rows),
        "columns of {} differ in length",
        path.display()
    );

    let mut out = String::from("SDDS1\n");
    writeln!(out, "&description text=\"{description}\", &end")?;
    for col in columns {
        let kind = match col.values {
            Values::Double(_) => "double",
            Values::Text(_) => "string",
        };
        write!(out, "&column name={}, ", col.name)?;
        if !col.units.is_empty() {
            write!(out, "units={}, ", col.units)?;
        }
        writeln!(out, "type={kind}, &end")?;
    }
    out.push_str("&data mode=ascii, &end\n! page number 1\n");
    writeln!(out, "{rows:>20}")?;
    for row in 0..rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|col| match &col.values {
                Values::Double(v) => format!("{:.12e}", v[row]),
                Values::Text(v) => format!("\"{}\"", v[row]),
            })
            .collect();
        writeln!(out, "{}", cells.join(" "))?;
    }

    std::fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}

fn with_suffix(root: &Path, suffix: &str) -> PathBuf {
    let mut name = root.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let args = Args::parse();
    let cell = cell_ops();

    let cell_x = cell
        .iter()
        .fold(IDENTITY, |m, &op| mul(&op_matrix(op, 1.0), &m));
    let cell_y = cell
        .iter()
        .fold(IDENTITY, |m, &op| mul(&op_matrix(op, -1.0), &m));
    let (bx0, ax0) = periodic_twiss(&cell_x).context("horizontal plane")?;
    let (by0, ay0) = periodic_twiss(&cell_y).context("vertical plane")?;
    let mut eta = periodic_dispersion(&cell);

    // Walk the lattice, sampling after every drift step.
    let mut s = vec![0.0];
    let mut betax = vec![bx0];
    let mut betay = vec![by0];
    let mut etax = vec![eta[0]];
    let mut mx = IDENTITY;
    let mut my = IDENTITY;
    let mut pos = 0.0;
    for _ in 0..args.cells {
        for &op in &cell {
            mx = mul(&op_matrix(op, 1.0), &mx);
            my = mul(&op_matrix(op, -1.0), &my);
            eta = track_dispersion(&[op], eta);
            if let Op::Drift(l) = op {
                pos += l;
                s.push(pos);
                betax.push(propagate_beta(&mx, bx0, ax0));
                betay.push(propagate_beta(&my, by0, ay0));
                etax.push(eta[0]);
            }
        }
    }

    let n = s.len();
    let emit_geo = EMIT_N / P_CENTRAL;
    let sx: Vec<f64> = (0..n)
        .map(|i| (emit_geo * betax[i] + (etax[i] * SIGMA_DELTA).powi(2)).sqrt())
        .collect();
    let sy: Vec<f64> = betay.iter().map(|b| (emit_geo * b).sqrt()).collect();
    let ss = vec![SIGMA_T * C_LIGHT; n];
    // Slow emittance growth along the line.
    let length = s[n - 1].max(1.0);
    let growth: Vec<f64> = s.iter().map(|&z| 1.0 + 0.02 * z / length).collect();
    let ecnx: Vec<f64> = growth.iter().map(|g| EMIT_N * g).collect();
    let ecny: Vec<f64> = growth.iter().map(|g| EMIT_N * g.sqrt()).collect();
    let s6 = vec![SIGMA_T; n];
    let s7 = vec![SIGMA_DELTA; n];
    let s67: Vec<f64> = s
        .iter()
        .map(|&z| 0.2 * SIGMA_T * SIGMA_DELTA * z / length)
        .collect();
    let p_central = vec![P_CENTRAL; n];

    let mag = magnet_rows(args.cells);
    let root = &args.root;

    write_sdds(
        &with_suffix(root, "twi"),
        "Twiss parameters",
        &[
            double("s", "m", &s),
            double("betax", "m", &betax),
            double("betay", "m", &betay),
            double("etax", "m", &etax),
        ],
    )?;
    write_sdds(
        &with_suffix(root, "s"),
        "Beam statistics",
        &[
            double("s", "m", &s),
            double("Sx", "m", &sx),
            double("Sy", "m", &sy),
            double("Ss", "m", &ss),
            double("ecnx", "m", &ecnx),
            double("ecny", "m", &ecny),
            double("s6", "s", &s6),
            double("s7", "", &s7),
            double("s67", "s", &s67),
        ],
    )?;
    write_sdds(
        &with_suffix(root, "cen"),
        "Beam centroids",
        &[double("s", "m", &s), double("pCentral", "m$be$nc", &p_central)],
    )?;
    write_sdds(
        &with_suffix(root, "mag"),
        "Magnet layout",
        &[
            double("s", "m", &mag.s),
            double("Profile", "", &mag.profile),
            SddsColumn {
                name: "ElementType",
                units: "",
                values: Values::Text(&mag.element_type),
            },
        ],
    )?;

    println!(
        "Wrote {} cells ({n} optics rows, {} magnet rows) to {}.{{twi,s,cen,mag}}",
        args.cells,
        mag.s.len(),
        root.display()
    );
    Ok(())
}
