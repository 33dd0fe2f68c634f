//! Output stream, spectrum analysis, and the control-to-render bridge.
//!
//! The engine talks to the audio callback exclusively through the
//! [`graph::AudioGraph`]: commands go out over a lock-free ring, rendered
//! samples come back through the spectrum tap, and a shared counter
//! reports how many voices are live. Nothing in here blocks the render
//! thread.

/// Byte-valued spectrum frames for the visualizer.
pub mod analyzer;
/// Rings, stream lifecycle and the silent fallback.
pub mod graph;
/// cpal device discovery and the output callback.
pub mod output;

pub use analyzer::{SpectrumAnalyzer, FFT_SIZE, SPECTRUM_BINS};
pub use graph::{AudioGraph, DEFAULT_VOLUME};
pub use output::{OutputDevice, OutputError};
