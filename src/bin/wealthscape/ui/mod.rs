//! TUI widgets for wealthscape.
//!
//! Each widget is a free `render_*` function over a frame region; the
//! app composes them once per frame.

mod banner;
mod scale;
mod spectrum;
mod volume;

pub use banner::render_banner;
pub use scale::render_scale;
pub use spectrum::render_spectrum;
pub use volume::render_volume;

use ratatui::style::Color;
use wealthscape::mood::Mood;

/// Primary gradient stop of the mood, as a terminal color.
pub(crate) fn mood_color(mood: &Mood) -> Color {
    let (r, g, b) = mood.theme.gradient[0];
    Color::Rgb(r, g, b)
}

/// Secondary gradient stop of the mood.
pub(crate) fn mood_accent(mood: &Mood) -> Color {
    let (r, g, b) = mood.theme.gradient[1];
    Color::Rgb(r, g, b)
}
