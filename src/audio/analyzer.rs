use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/*
Spectrum Analyzer
=================

Byte-valued frequency frames for the visualizer, computed from the
renderer's post-gain tap.

The pipeline per frame:

  1. keep the most recent FFT_SIZE mono samples
  2. Hann window (reduces spectral leakage), forward FFT
  3. normalize each bin to an amplitude estimate
  4. exponentially smooth the amplitudes across frames (0.8 carry-over),
     which is what makes the bars glide instead of flicker
  5. map 20*log10(amplitude) from [-100 dB, -30 dB] onto [0, 255]

A 256-point FFT yields 128 usable bins. The analyzer is pull-based:
`push_samples` only buffers, `process` computes a frame from whatever
window is current. Until a full window has accumulated, and again after
`reset`, the frame is all zeros.
*/

/// Samples per analysis window.
pub const FFT_SIZE: usize = 256;

/// Usable frequency bins per frame (half the window).
pub const SPECTRUM_BINS: usize = FFT_SIZE / 2;

/// Per-frame carry-over of the previous amplitude estimate.
pub const SMOOTHING: f32 = 0.8;

/// Amplitudes at or below this floor map to byte 0.
pub const MIN_DB: f32 = -100.0;

/// Amplitudes at or above this ceiling map to byte 255.
pub const MAX_DB: f32 = -30.0;

pub struct SpectrumAnalyzer {
    window: Vec<f32>,
    /// Amplitude normalization: 2 / sum(window)
    norm: f32,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    recent: Vec<f32>,
    smoothed: Vec<f32>,
    frame: Vec<u8>,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        // Hann window
        let window: Vec<f32> = (0..FFT_SIZE)
            .map(|i| {
                let denom = (FFT_SIZE - 1) as f32;
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / denom).cos())
            })
            .collect();
        let window_sum: f32 = window.iter().sum();

        Self {
            window,
            norm: 2.0 / window_sum,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            recent: Vec::with_capacity(FFT_SIZE * 2),
            smoothed: vec![0.0; SPECTRUM_BINS],
            frame: vec![0; SPECTRUM_BINS],
        }
    }

    /// Buffer tapped samples, keeping only the newest window.
    pub fn push_samples(&mut self, samples: &[f32]) {
        self.recent.extend_from_slice(samples);
        if self.recent.len() > FFT_SIZE {
            let excess = self.recent.len() - FFT_SIZE;
            self.recent.drain(..excess);
        }
    }

    /// Compute a fresh byte frame from the current window. A partial
    /// window leaves the frame untouched.
    pub fn process(&mut self) {
        if self.recent.len() < FFT_SIZE {
            return;
        }

        for (i, sample) in self.recent.iter().enumerate() {
            self.scratch[i].re = *sample * self.window[i];
            self.scratch[i].im = 0.0;
        }

        self.fft.process(&mut self.scratch);

        for (i, bin) in self.scratch[..SPECTRUM_BINS].iter().enumerate() {
            let amplitude = (bin.re * bin.re + bin.im * bin.im).sqrt() * self.norm;
            self.smoothed[i] = SMOOTHING * self.smoothed[i] + (1.0 - SMOOTHING) * amplitude;

            let db = 20.0 * self.smoothed[i].max(1e-10).log10();
            let scaled = (db - MIN_DB) / (MAX_DB - MIN_DB);
            self.frame[i] = (scaled.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
    }

    /// Drop all state and zero the frame.
    pub fn reset(&mut self) {
        self.recent.clear();
        self.smoothed.fill(0.0);
        self.frame.fill(0);
    }

    /// The latest byte frame, one value per bin.
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn sine_window(frequency: f32, amplitude: f32) -> Vec<f32> {
        (0..FFT_SIZE)
            .map(|n| amplitude * (TAU * frequency * n as f32 / SAMPLE_RATE).sin())
            .collect()
    }

    #[test]
    fn frame_has_one_byte_per_bin() {
        let analyzer = SpectrumAnalyzer::new();
        assert_eq!(analyzer.frame().len(), SPECTRUM_BINS);
        assert!(analyzer.frame().iter().all(|&b| b == 0));
    }

    #[test]
    fn silence_stays_at_zero() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.push_samples(&vec![0.0; FFT_SIZE * 2]);
        analyzer.process();
        assert!(analyzer.frame().iter().all(|&b| b == 0));
    }

    #[test]
    fn partial_window_does_not_produce_a_frame() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.push_samples(&sine_window(937.5, 0.05)[..100]);
        analyzer.process();
        assert!(analyzer.frame().iter().all(|&b| b == 0));
    }

    #[test]
    fn sine_peaks_at_its_own_bin() {
        let mut analyzer = SpectrumAnalyzer::new();
        // Bin width is 187.5 Hz at 48 kHz; 937.5 Hz sits exactly on bin 5
        analyzer.push_samples(&sine_window(937.5, 0.05));
        analyzer.process();

        let frame = analyzer.frame();
        let peak = frame
            .iter()
            .enumerate()
            .max_by_key(|(_, &b)| b)
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 5);
        assert!(frame[5] > 0);
    }

    #[test]
    fn smoothing_builds_over_repeated_windows() {
        let mut analyzer = SpectrumAnalyzer::new();
        let window = sine_window(937.5, 0.05);

        analyzer.push_samples(&window);
        analyzer.process();
        let first = analyzer.frame()[5];

        analyzer.push_samples(&window);
        analyzer.process();
        let second = analyzer.frame()[5];

        assert!(second >= first, "smoothed amplitude should rise toward steady state");
    }

    #[test]
    fn reset_zeroes_frame_and_history() {
        let mut analyzer = SpectrumAnalyzer::new();
        analyzer.push_samples(&sine_window(937.5, 0.05));
        analyzer.process();
        assert!(analyzer.frame().iter().any(|&b| b > 0));

        analyzer.reset();
        assert!(analyzer.frame().iter().all(|&b| b == 0));

        // History is gone too: a partial push cannot resurrect a frame
        analyzer.push_samples(&[0.1; 32]);
        analyzer.process();
        assert!(analyzer.frame().iter().all(|&b| b == 0));
    }
}
