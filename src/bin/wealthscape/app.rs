//! Application state and event loop.

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, RingBuffer};
use std::time::Duration;

use wealthscape::mood::{MoodId, SCALE_LEN};
use wealthscape::SoundscapeEngine;

use super::ui;

/// Slots in the note-flash ring. Notes arrive seconds apart; a handful
/// of slots absorbs any frame hiccup.
const NOTE_RING_SLOTS: usize = 64;

/// Small and large net-worth steps for the arrow keys.
const WORTH_STEP: f64 = 10_000.0;
const WORTH_LEAP: f64 = 100_000.0;

const VOLUME_STEP: f32 = 0.05;

/// Per-frame decay of the played-note highlight.
const FLASH_DECAY: f32 = 0.92;

pub struct App {
    engine: SoundscapeEngine,
    /// Scale degrees of recently played notes, fed from the engine's
    /// note hook.
    note_rx: Consumer<u8>,
    /// Highlight level per scale degree, decaying every frame.
    flash: [f32; SCALE_LEN],
    should_quit: bool,
}

impl App {
    pub fn new() -> Self {
        let (mut note_tx, note_rx) = RingBuffer::new(NOTE_RING_SLOTS);
        let mut engine = SoundscapeEngine::new();
        engine.set_note_hook(move |degree| {
            let _ = note_tx.push(degree);
        });

        Self {
            engine,
            note_rx,
            flash: [0.0; SCALE_LEN],
            should_quit: false,
        }
    }

    /// Run the UI event loop until the user quits.
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.engine.tick();
            self.poll_notes();

            terminal.draw(|frame| self.render(frame))?;

            // Non-blocking input poll, ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        self.engine.teardown();
        Ok(())
    }

    /// Drain played-note reports and restrike their highlights.
    fn poll_notes(&mut self) {
        for level in &mut self.flash {
            *level *= FLASH_DECAY;
        }
        while let Ok(degree) = self.note_rx.pop() {
            if let Some(level) = self.flash.get_mut(usize::from(degree)) {
                *level = 1.0;
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') => {
                if self.engine.is_playing() {
                    self.engine.stop();
                } else {
                    self.engine.start();
                }
            }
            KeyCode::Right => self.adjust_worth(WORTH_STEP),
            KeyCode::Left => self.adjust_worth(-WORTH_STEP),
            KeyCode::PageUp => self.adjust_worth(WORTH_LEAP),
            KeyCode::PageDown => self.adjust_worth(-WORTH_LEAP),
            KeyCode::Up => {
                let volume = self.engine.volume() + VOLUME_STEP;
                self.engine.set_volume(volume);
            }
            KeyCode::Down => {
                let volume = self.engine.volume() - VOLUME_STEP;
                self.engine.set_volume(volume);
            }
            KeyCode::Char('0') => self.engine.select_mood(None),
            KeyCode::Char(c) => {
                if let Some(digit) = c.to_digit(10) {
                    let index = digit as usize - 1;
                    if let Some(&id) = MoodId::ALL.get(index) {
                        self.engine.select_mood(Some(id));
                    }
                }
            }
            _ => {}
        }
    }

    fn adjust_worth(&mut self, delta: f64) {
        let worth = (self.engine.net_worth() + delta).max(0.0);
        self.engine.set_net_worth(worth);
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Mood banner
                Constraint::Min(8),    // Spectrum bars
                Constraint::Length(3), // Scale strip
                Constraint::Length(3), // Volume gauge
                Constraint::Length(1), // Help bar
            ])
            .split(frame.area());

        let mood = self.engine.current_mood();

        ui::render_banner(
            frame,
            chunks[0],
            mood,
            self.engine.net_worth(),
            self.engine.state(),
            self.engine.audio_is_silent(),
        );
        ui::render_spectrum(frame, chunks[1], self.engine.spectrum(), mood);
        ui::render_scale(frame, chunks[2], mood, &self.flash);
        ui::render_volume(frame, chunks[3], self.engine.volume());

        let help = Paragraph::new(
            " [Space] Play/Stop  [\u{2190}\u{2192}] Net worth  [PgUp/PgDn] Big step  \
             [\u{2191}\u{2193}] Volume  [1-5] Pin mood  [0] Auto  [Q] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[4]);
    }
}
