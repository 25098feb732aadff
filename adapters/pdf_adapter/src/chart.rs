//! Geometry for the chart page. Coordinates are PDF points with the origin
//! at the bottom-left of the plot area's page.

use phraselens_core::domain::{DailyUsage, PhraseCount};

/// Most x-axis labels drawn under the time series before labels are skipped.
pub const MAX_AXIS_LABELS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Area {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub x: f32,
    pub width: f32,
    pub height: f32,
    pub label: String,
    pub count: usize,
}

/// One bar per ranked phrase, scaled so the largest count fills the area.
pub fn bars(top_phrases: &[PhraseCount], area: Area) -> Vec<Bar> {
    let max = top_phrases.iter().map(|p| p.count).max().unwrap_or(0);
    if max == 0 {
        return Vec::new();
    }

    let slot = area.width / top_phrases.len() as f32;
    let width = slot * 0.6;
    top_phrases
        .iter()
        .enumerate()
        .map(|(i, p)| Bar {
            x: area.x + slot * i as f32 + (slot - width) / 2.0,
            width,
            height: area.height * p.count as f32 / max as f32,
            label: p.phrase.clone(),
            count: p.count,
        })
        .collect()
}

/// Points of the usage line, evenly spaced along x in chronological order.
pub fn line_points(daily_usage: &[DailyUsage], area: Area) -> Vec<(f32, f32)> {
    let max = daily_usage.iter().map(|d| d.count).max().unwrap_or(0);
    if max == 0 {
        return Vec::new();
    }

    let step = if daily_usage.len() > 1 {
        area.width / (daily_usage.len() - 1) as f32
    } else {
        0.0
    };
    let x0 = if daily_usage.len() > 1 { area.x } else { area.x + area.width / 2.0 };

    daily_usage
        .iter()
        .enumerate()
        .map(|(i, d)| (x0 + step * i as f32, area.y + area.height * d.count as f32 / max as f32))
        .collect()
}

/// Draw every `n`-th label so at most `max_labels` appear.
pub fn label_stride(count: usize, max_labels: usize) -> usize {
    if max_labels == 0 {
        return count.max(1);
    }
    count.div_ceil(max_labels).max(1)
}

/// Shortens a label to `max_chars`, marking the cut with "..".
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let kept: String = label.chars().take(max_chars.saturating_sub(2)).collect();
    format!("{kept}..")
}
