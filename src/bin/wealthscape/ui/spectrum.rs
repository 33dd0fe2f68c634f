//! Spectrum bars widget.
//!
//! Downsamples the engine's 128-bin spectrum frame to 32 bars, one
//! byte each, colored by the active mood.

use ratatui::{
    layout::Rect,
    style::Style,
    widgets::{BarChart, Block, Borders},
    Frame,
};

use wealthscape::mood::Mood;

use super::mood_color;

/// Bars drawn across the widget.
const BAR_COUNT: usize = 32;

/// Stride through the spectrum frame: 128 bins / 32 bars.
const BIN_STRIDE: usize = 4;

/// Render the spectrum bars.
pub fn render_spectrum(frame: &mut Frame, area: Rect, spectrum: &[u8], mood: &Mood) {
    let block = Block::default()
        .title(" Spectrum ")
        .borders(Borders::ALL);

    let bars: Vec<(&str, u64)> = (0..BAR_COUNT)
        .map(|i| {
            let level = spectrum.get(i * BIN_STRIDE).copied().unwrap_or(0);
            ("", u64::from(level))
        })
        .collect();

    // Value labels are suppressed by painting them in the bar color
    let chart = BarChart::default()
        .block(block)
        .data(&bars)
        .max(255)
        .bar_width(2)
        .bar_gap(1)
        .bar_style(Style::default().fg(mood_color(mood)))
        .value_style(
            Style::default()
                .fg(mood_color(mood))
                .bg(mood_color(mood)),
        );

    frame.render_widget(chart, area);
}
