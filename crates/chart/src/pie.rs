use salesreport_core::{Money, ModelTotals};
use std::f64::consts::TAU;

use crate::canvas::{Canvas, AXIS, WHITE};
use crate::palette::{color_for, rgb};
use crate::types::{ChartImage, ChartKind, ChartStyle, LegendEntry, RenderError};

/// Share of the whole disc by model, first slice starting at twelve o'clock
/// and proceeding clockwise in label order.
pub fn render_pie(totals: &ModelTotals, style: &ChartStyle) -> Result<ChartImage, RenderError> {
    if totals.is_empty() {
        return Err(RenderError::NoData(ChartKind::Pie));
    }
    if let Some((label, value)) = totals.iter().find(|(_, v)| v.is_negative()) {
        return Err(RenderError::NegativeSlice {
            label: label.to_string(),
            value,
        });
    }
    let grand_total = totals.total();
    if grand_total <= Money::zero() {
        return Err(RenderError::NonPositiveTotal(grand_total));
    }

    let total = grand_total.to_f64();
    let legend: Vec<LegendEntry> = totals
        .iter()
        .enumerate()
        .map(|(i, (label, value))| LegendEntry {
            label: label.to_string(),
            value,
            share: value.to_f64() / total,
            color: color_for(i),
        })
        .collect();

    // Cumulative end of each slice as a fraction of the circle.
    let mut ends: Vec<f64> = Vec::with_capacity(legend.len());
    let mut acc = 0.0;
    for entry in &legend {
        acc += entry.share;
        ends.push(acc);
    }
    if let Some(last) = ends.last_mut() {
        *last = 1.0;
    }
    let visible = legend.iter().filter(|e| e.share > 0.0).count();

    let size = style.pie_size.max(16);
    let centre = size as f64 / 2.0;
    let radius = centre - 8.0;
    let mut canvas = Canvas::new(size, size);

    canvas.paint(|x, y| {
        let dx = x as f64 + 0.5 - centre;
        let dy = y as f64 + 0.5 - centre;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist > radius {
            return None;
        }
        if dist > radius - 1.5 {
            return Some(AXIS);
        }

        // Clockwise from straight up.
        let angle = dx.atan2(-dy).rem_euclid(TAU);
        let fraction = angle / TAU;

        if visible > 1 {
            let near_edge = std::iter::once(0.0)
                .chain(ends.iter().copied())
                .any(|edge| {
                    let delta = (fraction - edge).abs().min(1.0 - (fraction - edge).abs());
                    delta * TAU * dist < 1.0
                });
            if near_edge {
                return Some(WHITE);
            }
        }

        let slice = ends.iter().position(|end| fraction < *end).unwrap_or(ends.len() - 1);
        Some(rgb(legend[slice].color))
    });

    let (width, height) = (canvas.width(), canvas.height());
    tracing::debug!(slices = legend.len(), width, "rendered pie chart");

    Ok(ChartImage {
        kind: ChartKind::Pie,
        width,
        height,
        png: canvas.into_png()?,
        legend,
        axis: None,
    })
}
