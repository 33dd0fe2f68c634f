//! wealthscape - terminal soundscape player
//!
//! Run with: cargo run
//!
//! Turns a net-worth figure into generative ambient music and draws the
//! spectrum while it plays. Drive the figure with the arrow keys and
//! listen to the mood shift tier by tier.

mod app;
mod ui;

use app::App;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut terminal = ratatui::init();
    let result = App::new().run(&mut terminal);
    ratatui::restore();
    result
}
