//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed points: `o`
//! - pre-phase projection: `-`
//! - post-phase projection: `~`
//! - threshold levels: `.`

use chrono::NaiveDate;

use crate::app::pipeline::RunOutput;
use crate::domain::{ProjectionConfig, ScaleKind};

/// Everything drawn on one chart, in calendar coordinates.
#[derive(Debug, Clone, Default)]
pub struct PlotLayers {
    pub points: Vec<(NaiveDate, f64)>,
    pub curves: Vec<(char, Vec<(NaiveDate, f64)>)>,
    pub thresholds: Vec<f64>,
}

/// Render observed values, both projections, and threshold levels for a run.
pub fn render_run_plot(
    run: &RunOutput,
    config: &ProjectionConfig,
    width: usize,
    height: usize,
    scale: ScaleKind,
) -> String {
    let mut layers = PlotLayers {
        points: run.series.iter().map(|o| (o.date, o.primary)).collect(),
        curves: Vec::new(),
        thresholds: config.thresholds.iter().map(|t| t.value).collect(),
    };
    for (ch, phase) in [('-', &run.pre), ('~', &run.post)] {
        if let Some(p) = phase.projection() {
            layers
                .curves
                .push((ch, p.curve.points.iter().map(|pt| (pt.date, pt.value)).collect()));
        }
    }

    render_plot(
        &layers,
        run.series.first().date,
        config.projection_end.max(run.series.last().date),
        width,
        height,
        scale,
    )
}

/// Render arbitrary layers over the date range `[d_min, d_max]`.
pub fn render_plot(
    layers: &PlotLayers,
    d_min: NaiveDate,
    d_max: NaiveDate,
    width: usize,
    height: usize,
    scale: ScaleKind,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let t_min = 0.0;
    let t_max = ((d_max - d_min).num_days() as f64).max(1.0);
    let day = |d: NaiveDate| (d - d_min).num_days() as f64;
    let tf = |v: f64| transform(v, scale);

    let (y_min, y_max) = y_range(layers, scale).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Draw curves first (so points can overlay).
    for (ch, curve) in &layers.curves {
        let mapped: Vec<(f64, f64)> = curve
            .iter()
            .filter_map(|&(d, v)| tf(v).map(|y| (day(d), y)))
            .collect();
        draw_curve(&mut grid, &mapped, t_min, t_max, y_min, y_max, *ch);
    }

    for &level in &layers.thresholds {
        if let Some(y) = tf(level) {
            if y < y_min || y > y_max {
                continue;
            }
            let row = map_y(y, y_min, y_max, height);
            for cell in grid[row].iter_mut() {
                if *cell == ' ' {
                    *cell = '.';
                }
            }
        }
    }

    for &(d, v) in &layers.points {
        let Some(y) = tf(v) else { continue };
        let x = map_x(day(d), t_min, t_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][x] = 'o';
    }

    let (lo, hi) = match scale {
        ScaleKind::Linear => (y_min, y_max),
        ScaleKind::Log => (y_min.exp(), y_max.exp()),
    };
    let scale_name = match scale {
        ScaleKind::Linear => "linear",
        ScaleKind::Log => "log",
    };

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {d_min} .. {d_max} | kappa=[{lo:.2}, {hi:.2}] mg/L ({scale_name})\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn transform(v: f64, scale: ScaleKind) -> Option<f64> {
    if !v.is_finite() {
        return None;
    }
    match scale {
        ScaleKind::Linear => Some(v),
        ScaleKind::Log if v > 0.0 => Some(v.ln()),
        ScaleKind::Log => None,
    }
}

fn y_range(layers: &PlotLayers, scale: ScaleKind) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    let values = layers
        .points
        .iter()
        .map(|&(_, v)| v)
        .chain(layers.curves.iter().flat_map(|(_, c)| c.iter().map(|&(_, v)| v)))
        .chain(layers.thresholds.iter().copied());

    for y in values.filter_map(|v| transform(v, scale)) {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    t_min: f64,
    t_max: f64,
    y_min: f64,
    y_max: f64,
    ch: char,
) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in curve {
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, ch);
        } else {
            grid[yy][x] = ch;
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let layers = PlotLayers {
            points: vec![(d(1), 100.0), (d(10), 110.0)],
            curves: vec![('-', vec![(d(1), 100.0), (d(10), 100.0)])],
            thresholds: Vec::new(),
        };

        let txt = render_plot(&layers, d(1), d(10), 10, 5, ScaleKind::Linear);
        let expected = concat!(
            "Plot: 2025-01-01 .. 2025-01-10 | kappa=[99.50, 110.50] mg/L (linear)\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn threshold_rows_fill_blank_cells_only() {
        let layers = PlotLayers {
            points: vec![(d(1), 0.0), (d(10), 10.0)],
            curves: Vec::new(),
            thresholds: vec![5.0],
        };
        let txt = render_plot(&layers, d(1), d(10), 10, 5, ScaleKind::Linear);
        let rows: Vec<&str> = txt.lines().skip(1).collect();
        assert_eq!(rows[2], "..........");
        assert_eq!(rows[0], "         o");
        assert_eq!(rows[4], "o         ");
    }

    #[test]
    fn log_scale_skips_non_positive_values() {
        let layers = PlotLayers {
            points: vec![(d(1), 0.0), (d(5), 1.0), (d(10), 100.0)],
            curves: Vec::new(),
            thresholds: Vec::new(),
        };
        let txt = render_plot(&layers, d(1), d(10), 10, 5, ScaleKind::Log);
        assert!(txt.lines().next().unwrap().ends_with("(log)"));
        let marks: usize = txt.lines().skip(1).map(|l| l.matches('o').count()).sum();
        assert_eq!(marks, 2);
    }
}
