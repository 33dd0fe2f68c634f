//! Mood banner widget - current soundscape, net worth and play state.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use wealthscape::mood::Mood;
use wealthscape::EngineState;

use super::{mood_accent, mood_color};

/// Render the mood banner.
pub fn render_banner(
    frame: &mut Frame,
    area: Rect,
    mood: &Mood,
    net_worth: f64,
    state: EngineState,
    silent: bool,
) {
    let block = Block::default()
        .title(" Current Soundscape ")
        .borders(Borders::ALL);

    let (state_label, state_color) = match state {
        EngineState::Idle => ("stopped", Color::Yellow),
        EngineState::Playing => ("playing", Color::Green),
        EngineState::MoodSwitch => ("crossfading", Color::Cyan),
    };

    let title = Line::from(vec![
        Span::raw(format!(" {} ", mood.theme.emoji)),
        Span::styled(
            mood.theme.title,
            Style::default()
                .fg(mood_color(mood))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  ({})", mood.theme.scale_name),
            Style::default().fg(mood_accent(mood)),
        ),
    ]);

    let mut detail = vec![
        Span::raw(format!(
            " Based on {} net worth  ",
            format_net_worth(net_worth)
        )),
        Span::styled(state_label, Style::default().fg(state_color)),
    ];
    if silent {
        detail.push(Span::styled(
            "  (no audio device, running silent)",
            Style::default().fg(Color::Red),
        ));
    }

    let paragraph = Paragraph::new(vec![title, Line::from(detail)]).block(block);
    frame.render_widget(paragraph, area);
}

/// Dollar figure with thousands separators, e.g. `$1,234,567`.
fn format_net_worth(worth: f64) -> String {
    let whole = worth.max(0.0).round() as u64;
    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${grouped}")
}
