use std::ops::RangeInclusive;

use eframe::egui::{Id, RichText, Ui, Vec2b};
use egui_plot::{AxisHints, GridMark, HPlacement, Legend, Line, LineStyle, Plot, PlotPoints};

use crate::color::{FamilyColors, MAGNET_STRIP, PRIMARY_X, PRIMARY_Y, SECONDARY};
use crate::data::model::{BeamSizeData, ElementFamily, EmittanceData, MagnetStrip, OpticsData};
use crate::state::{AppState, Figure};

/// Height of the magnet strip above the main panel, in points.
const STRIP_HEIGHT: f32 = 48.0;
/// Headroom above the largest primary value (sizes, emittances).
const PRIMARY_HEADROOM: f64 = 1.3;
/// Headroom above the largest secondary value.
const SECONDARY_HEADROOM: f64 = 1.5;

const X_LABEL: &str = "distance s (m)";

// ---------------------------------------------------------------------------
// Secondary axis mapping
// ---------------------------------------------------------------------------

/// Linear map that places a secondary-axis series inside the primary y range.
///
/// egui_plot has a single y transform per plot, so the secondary series is
/// drawn through `forward` and its right-hand tick labels use `inverse`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisMap {
    scale: f64,
    offset: f64,
}

impl AxisMap {
    /// Map the `secondary` interval onto the `primary` interval.
    pub fn between(secondary: (f64, f64), primary: (f64, f64)) -> Self {
        let sec_span = secondary.1 - secondary.0;
        let prim_span = primary.1 - primary.0;
        if sec_span.abs() < f64::EPSILON || prim_span.abs() < f64::EPSILON {
            return Self {
                scale: 1.0,
                offset: primary.0 - secondary.0,
            };
        }
        let scale = prim_span / sec_span;
        Self {
            scale,
            offset: primary.0 - secondary.0 * scale,
        }
    }

    pub fn forward(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }

    pub fn inverse(&self, plotted: f64) -> f64 {
        (plotted - self.offset) / self.scale
    }
}

/// Finite min/max of `values`, `(0, 1)` when there are none.
pub fn data_range(values: &[f64]) -> (f64, f64) {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if min > max {
        (0.0, 1.0)
    } else {
        (min, max)
    }
}

/// Tick label for the secondary axis.
pub fn format_tick(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-2..1e4).contains(&magnitude) {
        return format!("{value:.2e}");
    }
    let text = format!("{value:.3}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Map placing ηx over the combined range of both beta functions.
pub fn eta_overlay(optics: &OpticsData) -> AxisMap {
    let (bx_lo, bx_hi) = data_range(&optics.betax);
    let (by_lo, by_hi) = data_range(&optics.betay);
    AxisMap::between(
        data_range(&optics.etax),
        (bx_lo.min(by_lo), bx_hi.max(by_hi)),
    )
}

/// Top of the primary y range and the secondary map for the sizes and
/// emittance views.
///
/// The primary axis runs from zero to 1.3× the larger of `x` and `y`; the
/// secondary axis from zero to 1.5× the maximum of `z`.
pub fn twin_ranges(x: &[f64], y: &[f64], z: &[f64]) -> (f64, AxisMap) {
    let primary_top = PRIMARY_HEADROOM * data_range(x).1.max(data_range(y).1);
    let secondary_top = SECONDARY_HEADROOM * data_range(z).1;
    let map = AxisMap::between((0.0, secondary_top), (0.0, primary_top));
    (primary_top, map)
}

// ---------------------------------------------------------------------------
// Beamline figure (central panel)
// ---------------------------------------------------------------------------

/// Render the magnet strip and the selected view in the central panel.
pub fn beamline_plot(ui: &mut Ui, state: &AppState) {
    let (Some(strip), Some(figure)) = (&state.strip, &state.figure) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a run to view it  (File → Open run…)");
        });
        return;
    };

    let link = Id::new("beamline_s");
    magnet_strip(ui, strip, link);

    match figure {
        Figure::Optics(optics) => optics_plot(ui, optics, state.show_eta, link),
        Figure::Sizes(sizes) => sizes_plot(ui, sizes, link),
        Figure::Emittance(emit) => emittance_plot(ui, emit, link),
        Figure::Magnets(families) => {
            families_plot(ui, strip, families, &state.family_colors, link)
        }
    }
}

fn series(x: &[f64], y: &[f64]) -> PlotPoints<'static> {
    x.iter().zip(y.iter()).map(|(&xi, &yi)| [xi, yi]).collect()
}

fn mapped_series(x: &[f64], y: &[f64], map: AxisMap) -> PlotPoints<'static> {
    x.iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| [xi, map.forward(yi)])
        .collect()
}

/// Thin, unlabeled strip of the magnet profile along `s`.
fn magnet_strip(ui: &mut Ui, strip: &MagnetStrip, link: Id) {
    Plot::new("magnet_strip")
        .height(STRIP_HEIGHT)
        .show_axes(false)
        .show_grid(false)
        .show_x(false)
        .show_y(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .link_axis(link, Vec2b::new(true, false))
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(series(&strip.s, &strip.profile))
                    .color(MAGNET_STRIP)
                    .width(1.0),
            );
        });
}

fn main_plot<'a>(id: &str, link: Id) -> Plot<'a> {
    Plot::new(id)
        .legend(Legend::default())
        .x_axis_label(X_LABEL)
        .show_grid(true)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .link_axis(link, Vec2b::new(true, false))
        .link_cursor(link, Vec2b::new(true, false))
}

/// Left axis for the primary quantities, right axis labelled in secondary units.
fn twin_axes<'a>(left: &str, right: &str, map: AxisMap) -> Vec<AxisHints<'a>> {
    vec![
        AxisHints::new_y().label(left.to_string()),
        AxisHints::new_y()
            .label(RichText::new(right).color(SECONDARY))
            .placement(HPlacement::Right)
            .formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
                format_tick(map.inverse(mark.value))
            }),
    ]
}

fn primary_lines(
    plot_ui: &mut egui_plot::PlotUi,
    s: &[f64],
    x: &[f64],
    y: &[f64],
    names: [&str; 2],
) {
    plot_ui.line(
        Line::new(series(s, x))
            .name(names[0])
            .color(PRIMARY_X)
            .width(1.5),
    );
    plot_ui.line(
        Line::new(series(s, y))
            .name(names[1])
            .color(PRIMARY_Y)
            .style(LineStyle::dashed_loose())
            .width(1.5),
    );
}

fn optics_plot(ui: &mut Ui, optics: &OpticsData, show_eta: bool, link: Id) {
    const BETA_LABEL: &str = "β functions (m)";

    let mut plot = main_plot("optics_plot", link);
    let eta_map = show_eta.then(|| eta_overlay(optics));
    plot = match eta_map {
        Some(map) => plot.custom_y_axes(twin_axes(BETA_LABEL, "ηx (m)", map)),
        None => plot.y_axis_label(BETA_LABEL),
    };

    plot.show(ui, |plot_ui| {
        primary_lines(plot_ui, &optics.s, &optics.betax, &optics.betay, ["βx", "βy"]);
        if let Some(map) = eta_map {
            plot_ui.line(
                Line::new(mapped_series(&optics.s, &optics.etax, map))
                    .name("ηx")
                    .color(SECONDARY)
                    .width(1.5),
            );
        }
    });
}

/// Shared layout of the sizes and emittance views: two primary quantities
/// from zero to 1.3× their maximum, a secondary one from zero to 1.5× its own.
struct TwinView<'d> {
    id: &'static str,
    s: &'d [f64],
    x: &'d [f64],
    y: &'d [f64],
    z: &'d [f64],
    names: [&'static str; 3],
    left_label: &'static str,
    right_label: &'static str,
}

fn twin_view_plot(ui: &mut Ui, view: TwinView<'_>, link: Id) {
    let (primary_top, map) = twin_ranges(view.x, view.y, view.z);

    main_plot(view.id, link)
        .include_y(0.0)
        .include_y(primary_top)
        .custom_y_axes(twin_axes(view.left_label, view.right_label, map))
        .show(ui, |plot_ui| {
            primary_lines(plot_ui, view.s, view.x, view.y, [view.names[0], view.names[1]]);
            plot_ui.line(
                Line::new(mapped_series(view.s, view.z, map))
                    .name(view.names[2])
                    .color(SECONDARY)
                    .width(1.5),
            );
        });
}

fn sizes_plot(ui: &mut Ui, sizes: &BeamSizeData, link: Id) {
    twin_view_plot(
        ui,
        TwinView {
            id: "sizes_plot",
            s: &sizes.s,
            x: &sizes.sx,
            y: &sizes.sy,
            z: &sizes.sz,
            names: ["σx", "σy", "σz"],
            left_label: "rms sizes (mm)",
            right_label: "σz (mm)",
        },
        link,
    );
}

fn emittance_plot(ui: &mut Ui, emit: &EmittanceData, link: Id) {
    twin_view_plot(
        ui,
        TwinView {
            id: "emittance_plot",
            s: &emit.s,
            x: &emit.ex,
            y: &emit.ey,
            z: &emit.ez,
            names: ["εx", "εy", "εz"],
            left_label: "rms emittance (µm)",
            right_label: "εz (µm)",
        },
        link,
    );
}

fn families_plot(
    ui: &mut Ui,
    strip: &MagnetStrip,
    families: &[(ElementFamily, Vec<f64>)],
    colors: &FamilyColors,
    link: Id,
) {
    main_plot("families_plot", link)
        .y_axis_label("Profile")
        .show(ui, |plot_ui| {
            for (family, profile) in families {
                plot_ui.line(
                    Line::new(series(&strip.s, profile))
                        .name(family.label())
                        .color(colors.color_for(*family))
                        .width(1.5),
                );
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_map_round_trips_range_ends() {
        let map = AxisMap::between((0.0, 4.5), (0.0, 2.6));
        assert!((map.forward(4.5) - 2.6).abs() < 1e-12);
        assert!((map.inverse(2.6) - 4.5).abs() < 1e-12);
        assert_eq!(map.forward(0.0), 0.0);
    }

    #[test]
    fn axis_map_handles_offset_ranges() {
        let map = AxisMap::between((-0.2, 0.3), (2.0, 12.0));
        assert!((map.forward(-0.2) - 2.0).abs() < 1e-12);
        assert!((map.forward(0.3) - 12.0).abs() < 1e-12);
        assert!((map.inverse(7.0) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn axis_map_with_flat_series_is_a_shift() {
        let map = AxisMap::between((0.0, 0.0), (0.0, 3.0));
        assert_eq!(map.forward(0.0), 0.0);
        assert_eq!(map.inverse(1.0), 1.0);
    }

    #[test]
    fn data_range_skips_non_finite() {
        assert_eq!(data_range(&[2.0, f64::NAN, -1.0, 5.0]), (-1.0, 5.0));
        assert_eq!(data_range(&[]), (0.0, 1.0));
        assert_eq!(data_range(&[f64::NAN]), (0.0, 1.0));
    }

    #[test]
    fn tick_labels() {
        assert_eq!(format_tick(0.0), "0");
        assert_eq!(format_tick(1.5), "1.5");
        assert_eq!(format_tick(-0.0001), "-1.00e-4");
        assert_eq!(format_tick(2.0e5), "2.00e5");
        assert_eq!(format_tick(12.0), "12");
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * b.abs().max(1.0)
    }

    #[test]
    fn series_pairs_s_with_values() {
        let map = AxisMap::between((0.0, 1.0), (0.0, 10.0));
        let points = {
            let s = vec![0.0, 1.0];
            let y = vec![0.5, 0.25];
            (series(&s, &y), mapped_series(&s, &y, map))
        };
        let plain: Vec<[f64; 2]> = points.0.points().iter().map(|p| [p.x, p.y]).collect();
        let mapped: Vec<[f64; 2]> = points.1.points().iter().map(|p| [p.x, p.y]).collect();
        assert_eq!(plain, vec![[0.0, 0.5], [1.0, 0.25]]);
        assert_eq!(mapped, vec![[0.0, 5.0], [1.0, 2.5]]);
    }

    #[test]
    fn twin_ranges_put_secondary_top_on_primary_top() {
        let x = [0.5, 2.0, 1.0];
        let y = [0.25, 0.75, 1.5];
        let z = [3.0, 4.0, 2.0];
        let (top, map) = twin_ranges(&x, &y, &z);

        assert!(close(top, 1.3 * 2.0), "{top}");
        assert!(close(map.forward(1.5 * 4.0), top));
        assert_eq!(map.forward(0.0), 0.0);
        assert!(close(map.forward(4.0), top / 1.5));
    }

    #[test]
    fn twin_ranges_right_axis_reads_secondary_units() {
        let (top, map) = twin_ranges(&[1.0], &[2.0], &[10.0]);
        assert!(close(map.inverse(top), 15.0));
        assert_eq!(format_tick(map.inverse(top)), "15");
        assert_eq!(format_tick(map.inverse(top / 3.0)), "5");
    }

    #[test]
    fn twin_ranges_stay_finite_without_data() {
        let columns: [Vec<f64>; 2] = [vec![], vec![f64::NAN, f64::NAN]];
        for z in &columns {
            let (top, map) = twin_ranges(&[], &[f64::NAN], z);
            assert!(top.is_finite());
            for v in [0.0, 1.0, 2.5] {
                assert!(map.forward(v).is_finite());
                assert!(map.inverse(v).is_finite());
            }
        }
    }

    #[test]
    fn eta_overlay_spans_the_beta_range() {
        let optics = OpticsData {
            s: vec![0.0, 1.0, 2.0],
            betax: vec![4.0, 10.0, 6.0],
            betay: vec![12.0, 3.0, 5.0],
            etax: vec![-0.1, 0.3, 0.1],
        };
        let map = eta_overlay(&optics);
        assert!(close(map.forward(-0.1), 3.0));
        assert!(close(map.forward(0.3), 12.0));
        assert!(close(map.inverse(7.5), 0.1));
    }

    #[test]
    fn eta_overlay_of_flat_dispersion_is_finite() {
        let optics = OpticsData {
            s: vec![0.0, 1.0],
            betax: vec![5.0, 5.0],
            betay: vec![5.0, 5.0],
            etax: vec![0.0, 0.0],
        };
        let map = eta_overlay(&optics);
        assert!(map.forward(0.0).is_finite());
        assert!(map.inverse(5.0).is_finite());
    }
}
