use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Oscillators
===========

A phase-accumulator oscillator: `phase` runs through [0, 1) and advances
by `frequency / sample_rate` every sample. The soundscape only needs two
shapes:

Sine: the purest tone, fundamental only. One sine anchors the drone and
carries most melodic notes.

Triangle: odd harmonics falling off as 1/n^2, mellow but with enough
overtone content to thicken a pad. Three detuned triangles sit on top of
the drone's sine, and roughly a third of melodic notes use it.

Detune is expressed in cents (100 cents = 1 semitone) and folded into
the phase increment as frequency * 2^(cents/1200). The ratio is cached
at construction since voices never re-tune mid-flight.
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
}

#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: f32,
    detune_cents: f32,
    detune_ratio: f32,
    phase: f32,
    sample_rate: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32, sample_rate: f32) -> Self {
        Self {
            waveform,
            frequency,
            detune_cents: 0.0,
            detune_ratio: 1.0,
            phase: 0.0,
            sample_rate,
        }
    }

    /// Set detune in cents (100 cents = 1 semitone).
    pub fn with_detune(mut self, cents: f32) -> Self {
        self.detune_cents = cents;
        self.detune_ratio = 2.0_f32.powf(cents / 1200.0);
        self
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn detune_cents(&self) -> f32 {
        self.detune_cents
    }

    fn phase_increment(&self) -> f32 {
        self.frequency * self.detune_ratio / self.sample_rate
    }

    /// Generate the next sample in [-1, 1].
    pub fn next_sample(&mut self) -> f32 {
        let sample = match self.waveform {
            Waveform::Sine => (TAU * self.phase).sin(),
            // Piecewise linear: -1 -> +1 over [0, 0.5), +1 -> -1 over [0.5, 1)
            Waveform::Triangle => {
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
        };

        self.phase += self.phase_increment();
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }
}
