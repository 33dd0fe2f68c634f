use crate::audio::{AudioGraph, SPECTRUM_BINS};

/// Cached copy of the most recent spectrum frame.
///
/// The analyzer inside the graph advances every time someone samples
/// it, so the engine pulls exactly once per tick and parks the result
/// here for any number of readers (widgets, tests) to borrow.
pub struct Visualizer {
    frame: [u8; SPECTRUM_BINS],
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            frame: [0; SPECTRUM_BINS],
        }
    }

    /// Pull a fresh frame from the graph's spectrum tap.
    pub fn refresh(&mut self, graph: &mut AudioGraph) {
        self.frame.copy_from_slice(graph.sample_spectrum());
    }

    /// Drop straight to a black frame, skipping the analyzer's decay.
    pub fn clear(&mut self) {
        self.frame = [0; SPECTRUM_BINS];
    }

    /// The latest frame, one byte per bin, 0 = silent.
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    /// True when every bin is dark.
    pub fn is_dark(&self) -> bool {
        self.frame.iter().all(|&bin| bin == 0)
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}
