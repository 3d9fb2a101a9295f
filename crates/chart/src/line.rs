use image::Rgb;
use salesreport_core::DailyTotals;

use crate::canvas::{Canvas, AXIS, GRID};
use crate::palette::{color_for, rgb};
use crate::types::{AxisScale, ChartImage, ChartKind, ChartStyle, RenderError};

/// Inset of the plot area from every edge of the image, in pixels.
pub const PLOT_MARGIN: f64 = 18.0;
const GRID_LINES: f64 = 4.0;
const STROKE: f64 = 3.0;
const MARKER_RADIUS: f64 = 5.0;

/// Round a raw tick step up to 1, 2, 2.5 or 5 × 10ⁿ.
pub fn nice_step(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 2.5 {
        2.5
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Axis bounds that always include zero and land on whole steps.
pub fn axis_bounds(min: f64, max: f64) -> (f64, f64, f64) {
    let lo = min.min(0.0);
    let hi = max.max(0.0);
    if hi - lo <= f64::EPSILON {
        return (0.0, GRID_LINES, 1.0);
    }
    let step = nice_step((hi - lo) / GRID_LINES);
    ((lo / step).floor() * step, (hi / step).ceil() * step, step)
}

/// Daily totals over time, x positioned by calendar day.
pub fn render_line(totals: &DailyTotals, style: &ChartStyle) -> Result<ChartImage, RenderError> {
    let (Some(first), Some(last)) = (totals.first_date(), totals.last_date()) else {
        return Err(RenderError::NoData(ChartKind::Line));
    };

    let values: Vec<(i64, f64)> = totals
        .iter()
        .map(|(date, amount)| ((date - first).num_days(), amount.to_f64()))
        .collect();
    let min = values.iter().map(|(_, v)| *v).fold(f64::INFINITY, f64::min);
    let max = values.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
    let (axis_min, axis_max, step) = axis_bounds(min, max);
    let span_days = (last - first).num_days();

    let width = style.line_width.max(64);
    let height = style.line_height.max(48);
    let (left, top) = (PLOT_MARGIN, PLOT_MARGIN);
    let plot_w = width as f64 - 2.0 * PLOT_MARGIN;
    let plot_h = height as f64 - 2.0 * PLOT_MARGIN;
    let bottom = top + plot_h;

    let to_x = |day: i64| {
        if span_days == 0 {
            left + plot_w / 2.0
        } else {
            left + plot_w * day as f64 / span_days as f64
        }
    };
    let to_y = |v: f64| bottom - plot_h * (v - axis_min) / (axis_max - axis_min);

    let mut canvas = Canvas::new(width, height);

    let ticks = ((axis_max - axis_min) / step).round() as i64;
    for i in 0..=ticks {
        let y = to_y(axis_min + step * i as f64).round() as i64;
        canvas.dashed_hline(y, left as i64, (left + plot_w) as i64, 4, GRID);
    }
    if axis_min < 0.0 {
        canvas.hline(to_y(0.0).round() as i64, left as i64, (left + plot_w) as i64, 1, AXIS);
    }
    canvas.vline(left as i64 - 1, top as i64, bottom as i64, 2, AXIS);
    canvas.hline(bottom as i64, left as i64 - 1, (left + plot_w) as i64, 2, AXIS);

    let line_color: Rgb<u8> = rgb(color_for(0));
    let points: Vec<(f64, f64)> = values.iter().map(|(d, v)| (to_x(*d), to_y(*v))).collect();
    for pair in points.windows(2) {
        canvas.segment(pair[0], pair[1], STROKE, line_color);
    }
    for point in &points {
        canvas.fill_circle(*point, MARKER_RADIUS, line_color);
    }

    tracing::debug!(points = points.len(), axis_max, "rendered line chart");

    Ok(ChartImage {
        kind: ChartKind::Line,
        width,
        height,
        png: canvas.into_png()?,
        legend: Vec::new(),
        axis: Some(AxisScale {
            min: axis_min,
            max: axis_max,
            step,
            first_date: first,
            last_date: last,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use salesreport_core::Money;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn totals(pairs: &[(u32, i64)]) -> DailyTotals {
        pairs
            .iter()
            .map(|(d, c)| (day(*d), Money::from_cents(*c)))
            .collect()
    }

    #[test]
    fn nice_steps() {
        assert_eq!(nice_step(0.8), 1.0);
        assert_eq!(nice_step(1.3), 2.0);
        assert_eq!(nice_step(23.0), 25.0);
        assert_eq!(nice_step(420.0), 500.0);
        assert_eq!(nice_step(7000.0), 10000.0);
        assert_eq!(nice_step(0.0), 1.0);
    }

    #[test]
    fn bounds_include_zero() {
        assert_eq!(axis_bounds(120.0, 980.0), (0.0, 1000.0, 250.0));
        let (lo, hi, step) = axis_bounds(-30.0, 70.0);
        assert_eq!(step, 25.0);
        assert_eq!(lo, -50.0);
        assert_eq!(hi, 75.0);
        assert_eq!(axis_bounds(0.0, 0.0), (0.0, 4.0, 1.0));
    }

    #[test]
    fn empty_totals_is_render_error() {
        let err = render_line(&DailyTotals::default(), &ChartStyle::default()).unwrap_err();
        assert!(matches!(err, RenderError::NoData(ChartKind::Line)));
    }

    #[test]
    fn axis_metadata_describes_span() {
        let chart = render_line(&totals(&[(1, 500), (2, 100), (9, 980)]), &ChartStyle::default()).unwrap();
        let axis = chart.axis.unwrap();
        assert_eq!(axis.first_date, day(1));
        assert_eq!(axis.last_date, day(9));
        assert_eq!(axis.min, 0.0);
        assert!(axis.max >= 9.80);
        assert_eq!((chart.width, chart.height), (960, 320));
        assert!(chart.legend.is_empty());
    }

    #[test]
    fn single_day_renders() {
        let chart = render_line(&totals(&[(15, 2500)]), &ChartStyle::default()).unwrap();
        assert_eq!(&chart.png[..4], b"\x89PNG");
    }

    #[test]
    fn rendering_is_deterministic() {
        let t = totals(&[(1, 500), (3, 100), (4, 0), (20, 1234)]);
        let a = render_line(&t, &ChartStyle::default()).unwrap();
        let b = render_line(&t, &ChartStyle::default()).unwrap();
        assert_eq!(a.png, b.png);
    }
}
