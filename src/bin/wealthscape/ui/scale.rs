//! Scale strip widget - the seven tones of the active mood, with a
//! decaying highlight on recently played degrees.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use wealthscape::mood::{Mood, SCALE_LEN};

use super::mood_color;

/// Render the scale strip.
pub fn render_scale(frame: &mut Frame, area: Rect, mood: &Mood, flash: &[f32; SCALE_LEN]) {
    let block = Block::default()
        .title(format!(" Scale: {} ", mood.theme.scale_name))
        .borders(Borders::ALL);

    let mut spans = Vec::with_capacity(SCALE_LEN * 2);
    for (degree, &tone) in mood.scale.iter().enumerate() {
        let level = flash[degree];
        let style = if level > 0.5 {
            Style::default()
                .fg(Color::White)
                .bg(mood_color(mood))
                .add_modifier(Modifier::BOLD)
        } else if level > 0.05 {
            Style::default().fg(mood_color(mood))
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {:.0} ", tone), style));
        spans.push(Span::raw(" "));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}
