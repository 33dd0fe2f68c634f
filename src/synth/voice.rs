use crate::dsp::{NoteEnvelope, Oscillator, PadEnvelope};
use crate::mood::MoodId;

/// What a voice is doing in the mix. Drone voices remember the mood
/// that spawned them so a crossfade can be audited mid-flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceRole {
    Drone(MoodId),
    Note,
}

#[derive(Debug, Clone)]
enum VoiceEnvelope {
    Pad(PadEnvelope),
    Note(NoteEnvelope),
}

/// One live sound source: oscillator times envelope.
///
/// Voices are born playing (the constructor triggers the envelope) and
/// die when the envelope goes idle. Drone voices hold until released;
/// note voices run their four-second chain and free themselves.
#[derive(Debug, Clone)]
pub struct Voice {
    role: VoiceRole,
    osc: Oscillator,
    env: VoiceEnvelope,
}

impl Voice {
    pub fn drone(mood: MoodId, osc: Oscillator, mut env: PadEnvelope) -> Self {
        env.trigger();
        Self {
            role: VoiceRole::Drone(mood),
            osc,
            env: VoiceEnvelope::Pad(env),
        }
    }

    pub fn note(osc: Oscillator, mut env: NoteEnvelope) -> Self {
        env.trigger();
        Self {
            role: VoiceRole::Note,
            osc,
            env: VoiceEnvelope::Note(env),
        }
    }

    /// Accumulate this voice into the mix buffer.
    pub fn mix_into(&mut self, out: &mut [f32]) {
        match &mut self.env {
            VoiceEnvelope::Pad(env) => {
                for sample in out.iter_mut() {
                    *sample += self.osc.next_sample() * env.next_sample();
                }
            }
            VoiceEnvelope::Note(env) => {
                for sample in out.iter_mut() {
                    *sample += self.osc.next_sample() * env.next_sample();
                }
            }
        }
    }

    /// Fade out over `fade_time` seconds. Only drones respond; notes
    /// already carry their own terminal ramp.
    pub fn release(&mut self, fade_time: f32) {
        if let VoiceEnvelope::Pad(env) = &mut self.env {
            env.release(fade_time);
        }
    }

    pub fn is_active(&self) -> bool {
        match &self.env {
            VoiceEnvelope::Pad(env) => env.is_active(),
            VoiceEnvelope::Note(env) => env.is_active(),
        }
    }

    pub fn role(&self) -> VoiceRole {
        self.role
    }

    pub fn oscillator(&self) -> &Oscillator {
        &self.osc
    }

    pub fn envelope_level(&self) -> f32 {
        match &self.env {
            VoiceEnvelope::Pad(env) => env.level(),
            VoiceEnvelope::Note(env) => env.level(),
        }
    }
}
