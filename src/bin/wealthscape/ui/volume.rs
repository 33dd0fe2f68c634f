//! Volume gauge widget.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Gauge},
    Frame,
};

/// Render the master volume gauge.
pub fn render_volume(frame: &mut Frame, area: Rect, volume: f32) {
    let block = Block::default().title(" Volume ").borders(Borders::ALL);

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio(f64::from(volume.clamp(0.0, 1.0)))
        .label(format!("{:.0}%", volume * 100.0));

    frame.render_widget(gauge, area);
}
