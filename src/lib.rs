pub mod audio; // Output stream, spectrum tap, control-to-render bridge
pub mod dsp;
pub mod engine; // Mood lifecycle, scheduling, sequencing
pub mod mood;
pub mod synth; // Render-side voice pool

pub use engine::{EngineState, SoundscapeEngine};
pub use mood::{Mood, MoodId, MoodResolver};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
