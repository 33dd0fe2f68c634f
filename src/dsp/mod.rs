//! Low-level DSP primitives embedded directly inside voice structs.
//!
//! These components are allocation-free and realtime-safe. They stay focused
//! on the signal-processing math; voice lifecycle and mixing live one layer
//! up in `synth`.

/// Pad and one-shot note envelope generators.
pub mod envelope;
/// Phase-accumulator sine and triangle oscillators.
pub mod oscillator;

pub use envelope::{NoteEnvelope, PadEnvelope, PadStage};
pub use oscillator::{Oscillator, Waveform};
