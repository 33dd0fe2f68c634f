use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rtrb::{Consumer, Producer};

use crate::dsp::{NoteEnvelope, Oscillator, PadEnvelope, Waveform};
use crate::mood::{Mood, MoodId};
use crate::synth::message::RenderCommand;
use crate::synth::voice::{Voice, VoiceRole};
use crate::MAX_BLOCK_SIZE;

/*
Renderer
========

The render side of the engine: a voice pool driven entirely by commands
drained from the control ring at the top of every block. Everything here
runs on the audio callback, so the rules are strict:

  - no allocation (the pool is pre-reserved, spawns that would grow it
    are dropped instead)
  - no locks (rtrb rings in, rtrb tap out, one atomic counter)
  - no logging

The drone pad is four oscillators on the mood's base frequency, detuned
by [-5, 0, +5, +7] cents: one pure sine anchor plus three triangles for
width. The combined pad level 0.05 is split evenly across the four.
Melodic notes get their own slots, capped at eight; a ninth trigger is
dropped silently, which is inaudible in practice because notes live four
seconds and arrive at most every two.

After mixing and the master gain, the block is copied into the spectrum
tap ring. When the tap is full the newest samples are simply not
written; the visualizer only ever wants a recent window, never a
complete stream.
*/

/// Detune in cents for the four drone oscillators.
pub const DRONE_DETUNE_CENTS: [f32; 4] = [-5.0, 0.0, 5.0, 7.0];

/// Combined steady gain of the drone pad, split across its oscillators.
pub const DRONE_LEVEL: f32 = 0.05;

/// Short drone attack so restarts do not click.
pub const DRONE_ATTACK_TIME: f32 = 0.01;

/// Melodic note slots in the pool.
pub const MAX_NOTE_VOICES: usize = 8;

// Two full drone generations may overlap while a crossfade drains.
const MAX_VOICES: usize = DRONE_DETUNE_CENTS.len() * 2 + MAX_NOTE_VOICES;

pub struct Renderer {
    voices: Vec<Voice>,
    rx: Consumer<RenderCommand>,
    tap: Producer<f32>,
    active_count: Arc<AtomicUsize>,
    master_gain: f32,
    sample_rate: f32,
    frame_counter: u64,
}

impl Renderer {
    pub fn new(
        sample_rate: f32,
        rx: Consumer<RenderCommand>,
        tap: Producer<f32>,
        active_count: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            voices: Vec::with_capacity(MAX_VOICES),
            rx,
            tap,
            active_count,
            master_gain: 1.0,
            sample_rate,
            frame_counter: 0,
        }
    }

    /// Render one mono block: drain commands, mix voices, apply the
    /// master gain, feed the spectrum tap.
    pub fn render_block(&mut self, out: &mut [f32]) {
        debug_assert!(out.len() <= MAX_BLOCK_SIZE);

        while let Ok(cmd) = self.rx.pop() {
            self.apply(cmd);
        }

        out.fill(0.0);
        for voice in &mut self.voices {
            voice.mix_into(out);
        }
        self.voices.retain(|v| v.is_active());

        for sample in out.iter_mut() {
            *sample *= self.master_gain;
        }

        self.feed_tap(out);

        self.active_count.store(self.voices.len(), Ordering::Relaxed);
        self.frame_counter += out.len() as u64;
    }

    fn apply(&mut self, cmd: RenderCommand) {
        match cmd {
            RenderCommand::StartDrone { mood } => self.spawn_drone(mood),
            RenderCommand::ReleaseDrone { fade_time } => {
                for voice in &mut self.voices {
                    if matches!(voice.role(), VoiceRole::Drone(_)) {
                        voice.release(fade_time);
                    }
                }
            }
            RenderCommand::TriggerNote {
                frequency,
                waveform,
            } => self.spawn_note(frequency, waveform),
            RenderCommand::SetMasterGain { gain } => {
                self.master_gain = gain.clamp(0.0, 1.0);
            }
            RenderCommand::SilenceAll => self.voices.clear(),
        }
    }

    fn spawn_drone(&mut self, mood: MoodId) {
        let base = Mood::get(mood).drone_base_frequency();
        let per_voice_level = DRONE_LEVEL / DRONE_DETUNE_CENTS.len() as f32;

        for (i, &cents) in DRONE_DETUNE_CENTS.iter().enumerate() {
            if self.voices.len() == self.voices.capacity() {
                break;
            }
            let waveform = if i == 0 {
                Waveform::Sine
            } else {
                Waveform::Triangle
            };
            let osc = Oscillator::new(waveform, base, self.sample_rate).with_detune(cents);
            let env = PadEnvelope::new(per_voice_level, DRONE_ATTACK_TIME, self.sample_rate);
            self.voices.push(Voice::drone(mood, osc, env));
        }
    }

    fn spawn_note(&mut self, frequency: f32, waveform: Waveform) {
        if self.note_voices() >= MAX_NOTE_VOICES || self.voices.len() == self.voices.capacity() {
            return;
        }
        let osc = Oscillator::new(waveform, frequency, self.sample_rate);
        let env = NoteEnvelope::new(self.sample_rate);
        self.voices.push(Voice::note(osc, env));
    }

    fn feed_tap(&mut self, block: &[f32]) {
        let writable = block.len().min(self.tap.slots());
        if writable == 0 {
            return;
        }
        if let Ok(mut chunk) = self.tap.write_chunk(writable) {
            let (first, second) = chunk.as_mut_slices();
            let cut = first.len();
            first.copy_from_slice(&block[..cut]);
            second.copy_from_slice(&block[cut..writable]);
            chunk.commit_all();
        }
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn drone_voices(&self) -> usize {
        self.voices
            .iter()
            .filter(|v| matches!(v.role(), VoiceRole::Drone(_)))
            .count()
    }

    pub fn note_voices(&self) -> usize {
        self.voices
            .iter()
            .filter(|v| v.role() == VoiceRole::Note)
            .count()
    }

    /// Distinct moods with at least one live drone voice. Diagnostic
    /// only; never called from the render path.
    pub fn audible_drone_moods(&self) -> Vec<MoodId> {
        let mut moods = Vec::new();
        for voice in &self.voices {
            if let VoiceRole::Drone(mood) = voice.role() {
                if !moods.contains(&mood) {
                    moods.push(mood);
                }
            }
        }
        moods
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frame_counter
    }

    pub(crate) fn voices(&self) -> &[Voice] {
        &self.voices
    }
}
