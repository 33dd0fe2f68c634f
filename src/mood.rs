/*
Wealth Moods
============

Five fixed moods partition the net-worth axis into contiguous tiers
covering [0, infinity). Each mood carries a seven-tone scale rooted at
middle C (261.63 Hz) that gives the tier its musical character:

  struggling  [0, 10k)     C minor              tense, searching
  growing     [10k, 100k)  C major              settled, open
  thriving    [100k, 500k) C lydian             bright, lifted
  wealthy     [500k, 1M)   C pentatonic         effortless
  legendary   [1M, inf)    C major 7 arpeggio   weightless

The drone pad plays the scale root an octave down; the melodic
sequencer draws degrees 0..=6 from the same scale. Range boundaries are
min-inclusive, max-exclusive; negative figures resolve to the lowest
tier rather than falling through the table.
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tones per mood scale.
pub const SCALE_LEN: usize = 7;

/// Number of wealth tiers.
pub const MOOD_COUNT: usize = 5;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MoodId {
    Struggling,
    Growing,
    Thriving,
    Wealthy,
    Legendary,
}

impl MoodId {
    pub const ALL: [MoodId; MOOD_COUNT] = [
        MoodId::Struggling,
        MoodId::Growing,
        MoodId::Thriving,
        MoodId::Wealthy,
        MoodId::Legendary,
    ];

    /// The static profile backing this id.
    pub fn mood(self) -> &'static Mood {
        &MOODS[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MoodId::Struggling => "struggling",
            MoodId::Growing => "growing",
            MoodId::Thriving => "thriving",
            MoodId::Wealthy => "wealthy",
            MoodId::Legendary => "legendary",
        }
    }
}

/// Display-only palette for a mood: tier title, emoji and the two
/// gradient endpoints (RGB) used by the visualizer.
#[derive(Debug)]
pub struct MoodTheme {
    pub title: &'static str,
    pub emoji: &'static str,
    pub scale_name: &'static str,
    pub gradient: [(u8, u8, u8); 2],
}

/// One wealth tier: id, musical scale, net-worth range and theme.
///
/// `max_worth` is exclusive; the top tier is open-ended
/// (`f64::INFINITY`).
#[derive(Debug)]
pub struct Mood {
    pub id: MoodId,
    pub scale: [f32; SCALE_LEN],
    pub min_worth: f64,
    pub max_worth: f64,
    pub theme: MoodTheme,
}

impl Mood {
    pub fn get(id: MoodId) -> &'static Mood {
        id.mood()
    }

    /// Resolves a net-worth figure to its tier. Negative figures clamp
    /// to the lowest tier; anything past the last boundary lands on
    /// the open-ended top tier.
    pub fn for_net_worth(net_worth: f64) -> &'static Mood {
        let worth = net_worth.max(0.0);
        MOODS
            .iter()
            .find(|mood| mood.contains(worth))
            .unwrap_or(&MOODS[MOOD_COUNT - 1])
    }

    pub fn contains(&self, net_worth: f64) -> bool {
        net_worth >= self.min_worth && net_worth < self.max_worth
    }

    /// Frequency of one scale degree (0..=6).
    pub fn degree_frequency(&self, degree: u8) -> f32 {
        self.scale[usize::from(degree)]
    }

    /// The drone pad sits one octave below the scale root.
    pub fn drone_base_frequency(&self) -> f32 {
        self.scale[0] / 2.0
    }
}

/// Net-worth resolution with a manual override.
///
/// A pinned mood supersedes the figure until cleared; clearing reverts
/// to table lookup on the next evaluation.
#[derive(Debug, Default)]
pub struct MoodResolver {
    pinned: Option<MoodId>,
}

impl MoodResolver {
    pub fn new() -> Self {
        Self { pinned: None }
    }

    /// Force a mood regardless of the figure.
    pub fn pin(&mut self, id: MoodId) {
        self.pinned = Some(id);
    }

    /// Return to net-worth-driven resolution.
    pub fn clear(&mut self) {
        self.pinned = None;
    }

    pub fn pinned(&self) -> Option<MoodId> {
        self.pinned
    }

    /// The mood in effect for a figure.
    pub fn current(&self, net_worth: f64) -> &'static Mood {
        match self.pinned {
            Some(id) => Mood::get(id),
            None => Mood::for_net_worth(net_worth),
        }
    }
}

pub static MOODS: [Mood; MOOD_COUNT] = [
    Mood {
        id: MoodId::Struggling,
        scale: [261.63, 293.66, 311.13, 349.23, 392.00, 415.30, 466.16],
        min_worth: 0.0,
        max_worth: 10_000.0,
        theme: MoodTheme {
            title: "Seeds of Hope",
            emoji: "\u{1F331}",
            scale_name: "C minor",
            gradient: [(0x64, 0x74, 0x8B), (0x47, 0x55, 0x69)],
        },
    },
    Mood {
        id: MoodId::Growing,
        scale: [261.63, 293.66, 329.63, 349.23, 392.00, 440.00, 493.88],
        min_worth: 10_000.0,
        max_worth: 100_000.0,
        theme: MoodTheme {
            title: "Rising Tide",
            emoji: "\u{1F30A}",
            scale_name: "C major",
            gradient: [(0x3B, 0x82, 0xF6), (0x08, 0x91, 0xB2)],
        },
    },
    Mood {
        id: MoodId::Thriving,
        scale: [261.63, 293.66, 329.63, 369.99, 415.30, 466.16, 523.25],
        min_worth: 100_000.0,
        max_worth: 500_000.0,
        theme: MoodTheme {
            title: "Golden Hour",
            emoji: "\u{2600}\u{FE0F}",
            scale_name: "C lydian",
            gradient: [(0xF5, 0x9E, 0x0B), (0xEA, 0x58, 0x0C)],
        },
    },
    Mood {
        id: MoodId::Wealthy,
        scale: [261.63, 311.13, 349.23, 392.00, 466.16, 523.25, 587.33],
        min_worth: 500_000.0,
        max_worth: 1_000_000.0,
        theme: MoodTheme {
            title: "Summit View",
            emoji: "\u{1F3D4}\u{FE0F}",
            scale_name: "C pentatonic",
            gradient: [(0x10, 0xB9, 0x81), (0x0D, 0x94, 0x88)],
        },
    },
    Mood {
        id: MoodId::Legendary,
        scale: [261.63, 329.63, 392.00, 493.88, 587.33, 659.25, 783.99],
        min_worth: 1_000_000.0,
        max_worth: f64::INFINITY,
        theme: MoodTheme {
            title: "Cosmic Harmony",
            emoji: "\u{2728}",
            scale_name: "C major 7 arpeggio",
            gradient: [(0xA8, 0x55, 0xF7), (0xDB, 0x27, 0x77)],
        },
    },
];
