use crate::MIN_TIME;

/*
Envelope Generators
===================

Two linear envelope shapes drive every voice in the soundscape.

Pad envelope (the drone):

  Level
    T ┐    ________________
      │   ╱                ╲
      │  ╱                  ╲
    0 └─╱────────────────────╲──→ Time
       Attack    Hold      Release

The pad ramps to its steady level T over a short attack (so restarts do
not click), holds until released, then interpolates back to zero over a
fade passed in at release time. The fade duration is a parameter, not a
field: a user stop fades over one second while a mood crossfade uses
the shorter switch window.

Note envelope (melodic one-shots):

  Level
  0.1 ┐   ╱╲
      │  ╱  ╲______
 0.05 │ ╱          ╲_____
      │╱                 ╲_____
    0 └───────────────────────╲──→ Time
      0   0.5s      2s        4s

A fixed breakpoint chain: silence to 0.1 at half a second, sagging to
0.05 at two seconds, gone at four. No gate - once triggered, the note
always runs the full four seconds and frees itself.

Both envelopes use the same release arithmetic: snapshot the level when
the ramp begins, pre-calculate the total sample count, then interpolate
linearly so the ramp lands on its target exactly.

Levels here are absolute gains, not normalized 0..1 shapes: the pad
holds at the level handed to `new` and the note peaks at 0.1. Voices
multiply the raw oscillator by the envelope and nothing else.
*/

/// Breakpoints of the melodic note envelope, seconds from trigger.
pub const NOTE_ATTACK_TIME: f32 = 0.5;
pub const NOTE_SHOULDER_TIME: f32 = 2.0;
pub const NOTE_TOTAL_TIME: f32 = 4.0;

/// Peak and shoulder gains of the melodic note envelope.
pub const NOTE_PEAK_LEVEL: f32 = 0.1;
pub const NOTE_SHOULDER_LEVEL: f32 = 0.05;

const NOTE_SEGMENTS: usize = 3;

/// The current stage of the pad envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadStage {
    Idle,    // inactive, level = 0
    Attack,  // ramping up to the hold level
    Hold,    // steady until released
    Release, // ramping down to 0
}

/// Sustained pad envelope: attack, hold, release on demand.
#[derive(Debug, Clone)]
pub struct PadEnvelope {
    hold_level: f32,
    attack_time: f32,
    sample_rate: f32,

    stage: PadStage,
    level: f32,

    // Release bookkeeping (pre-calculated at release for precision)
    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl PadEnvelope {
    pub fn new(hold_level: f32, attack_time: f32, sample_rate: f32) -> Self {
        Self {
            hold_level: hold_level.clamp(0.0, 1.0),
            attack_time: attack_time.max(MIN_TIME),
            sample_rate,

            stage: PadStage::Idle,
            level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        }
    }

    /// Start the attack phase from zero.
    pub fn trigger(&mut self) {
        self.level = 0.0;
        self.stage = PadStage::Attack;
        self.release_elapsed_samples = 0;
    }

    /// Begin fading to silence over `fade_time` seconds, starting from
    /// the current level so a release mid-attack does not click.
    pub fn release(&mut self, fade_time: f32) {
        if self.stage == PadStage::Idle {
            return;
        }

        self.release_start_level = self.level;
        self.release_total_samples = if fade_time <= MIN_TIME {
            1
        } else {
            (fade_time * self.sample_rate).round().max(1.0) as u32
        };
        self.release_elapsed_samples = 0;
        self.stage = PadStage::Release;
    }

    /// Cut to silence immediately.
    pub fn kill(&mut self) {
        self.stage = PadStage::Idle;
        self.level = 0.0;
    }

    /// Advance one sample and return the current level.
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            PadStage::Idle => {
                self.level = 0.0;
            }

            PadStage::Attack => {
                let increment = self.hold_level / (self.attack_time * self.sample_rate);
                self.level += increment;

                if self.level >= self.hold_level {
                    self.level = self.hold_level;
                    self.stage = PadStage::Hold;
                }
            }

            PadStage::Hold => {
                self.level = self.hold_level;
            }

            PadStage::Release => {
                // Linear interpolation from release_start_level to 0
                let progress =
                    self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);

                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);

                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = PadStage::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    pub fn is_active(&self) -> bool {
        self.stage != PadStage::Idle
    }

    pub fn stage(&self) -> PadStage {
        self.stage
    }

    pub fn level(&self) -> f32 {
        self.level
    }
}

/// One-shot note envelope: a fixed breakpoint chain with no gate.
#[derive(Debug, Clone)]
pub struct NoteEnvelope {
    // (end position in samples, target level) per segment
    segments: [(u32, f32); NOTE_SEGMENTS],

    segment: usize,
    segment_start_pos: u32,
    segment_start_level: f32,
    position: u32,
    level: f32,
}

impl NoteEnvelope {
    pub fn new(sample_rate: f32) -> Self {
        let to_samples = |secs: f32| (secs * sample_rate).round().max(1.0) as u32;
        Self {
            segments: [
                (to_samples(NOTE_ATTACK_TIME), NOTE_PEAK_LEVEL),
                (to_samples(NOTE_SHOULDER_TIME), NOTE_SHOULDER_LEVEL),
                (to_samples(NOTE_TOTAL_TIME), 0.0),
            ],

            // Constructed idle; trigger() arms the chain.
            segment: NOTE_SEGMENTS,
            segment_start_pos: 0,
            segment_start_level: 0.0,
            position: 0,
            level: 0.0,
        }
    }

    /// Restart the chain from silence.
    pub fn trigger(&mut self) {
        self.segment = 0;
        self.segment_start_pos = 0;
        self.segment_start_level = 0.0;
        self.position = 0;
        self.level = 0.0;
    }

    /// Cut to silence immediately.
    pub fn kill(&mut self) {
        self.segment = NOTE_SEGMENTS;
        self.level = 0.0;
    }

    /// Advance one sample and return the current level.
    pub fn next_sample(&mut self) -> f32 {
        if self.segment >= NOTE_SEGMENTS {
            self.level = 0.0;
            return 0.0;
        }

        let (end, target) = self.segments[self.segment];
        let span = end.saturating_sub(self.segment_start_pos).max(1) as f32;
        let progress = ((self.position - self.segment_start_pos) as f32 / span).min(1.0);
        self.level = self.segment_start_level + (target - self.segment_start_level) * progress;

        self.position = self.position.saturating_add(1);
        if self.position > end {
            self.segment_start_pos = end;
            self.segment_start_level = target;
            self.segment += 1;
            if self.segment >= NOTE_SEGMENTS {
                self.level = 0.0;
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    pub fn is_active(&self) -> bool {
        self.segment < NOTE_SEGMENTS
    }

    pub fn level(&self) -> f32 {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn render_samples(samples: usize, mut next: impl FnMut() -> f32) -> f32 {
        let mut last = 0.0;
        for _ in 0..samples {
            last = next();
        }
        last
    }

    #[test]
    fn pad_attack_reaches_hold_level() {
        let mut env = PadEnvelope::new(0.0125, 0.01, SAMPLE_RATE);
        env.trigger();

        let level = render_samples(12, || env.next_sample());
        assert!((level - 0.0125).abs() < 1e-6, "expected hold level, got {level}");
        assert_eq!(env.stage(), PadStage::Hold);
    }

    #[test]
    fn pad_holds_until_released() {
        let mut env = PadEnvelope::new(0.0125, 0.01, SAMPLE_RATE);
        env.trigger();

        let level = render_samples(5_000, || env.next_sample());
        assert_eq!(env.stage(), PadStage::Hold);
        assert!((level - 0.0125).abs() < 1e-6);
    }

    #[test]
    fn pad_release_lands_on_zero() {
        let mut env = PadEnvelope::new(0.0125, 0.01, SAMPLE_RATE);
        env.trigger();
        render_samples(100, || env.next_sample());

        env.release(0.5);
        let level = render_samples((0.5 * SAMPLE_RATE) as usize + 2, || env.next_sample());

        assert_eq!(level, 0.0);
        assert!(!env.is_active());
    }

    #[test]
    fn pad_release_duration_is_per_call() {
        let mut slow = PadEnvelope::new(0.0125, 0.01, SAMPLE_RATE);
        let mut fast = PadEnvelope::new(0.0125, 0.01, SAMPLE_RATE);
        slow.trigger();
        fast.trigger();
        render_samples(100, || slow.next_sample());
        render_samples(100, || fast.next_sample());

        slow.release(1.0);
        fast.release(0.5);
        render_samples(500, || slow.next_sample());
        render_samples(500, || fast.next_sample());

        // Halfway through the slow fade the fast one is already done.
        assert!(slow.is_active());
        assert!((slow.level() - 0.0125 / 2.0).abs() < 1e-3);
        assert!(!fast.is_active());
    }

    #[test]
    fn pad_release_mid_attack_starts_from_current_level() {
        let mut env = PadEnvelope::new(0.5, 0.1, SAMPLE_RATE);
        env.trigger();
        render_samples(50, || env.next_sample());
        let mid_attack = env.level();
        assert!(mid_attack > 0.0 && mid_attack < 0.5);

        env.release(0.1);
        let mut prev = mid_attack;
        for _ in 0..50 {
            let level = env.next_sample();
            assert!(level <= prev + 1e-6, "release must not jump upward");
            prev = level;
        }
    }

    #[test]
    fn note_envelope_walks_the_breakpoints() {
        let mut env = NoteEnvelope::new(SAMPLE_RATE);
        env.trigger();

        let at_peak = render_samples((NOTE_ATTACK_TIME * SAMPLE_RATE) as usize + 1, || {
            env.next_sample()
        });
        assert!((at_peak - NOTE_PEAK_LEVEL).abs() < 0.01, "peak was {at_peak}");

        let at_shoulder = render_samples(
            ((NOTE_SHOULDER_TIME - NOTE_ATTACK_TIME) * SAMPLE_RATE) as usize,
            || env.next_sample(),
        );
        assert!(
            (at_shoulder - NOTE_SHOULDER_LEVEL).abs() < 0.01,
            "shoulder was {at_shoulder}"
        );

        let at_end = render_samples(
            ((NOTE_TOTAL_TIME - NOTE_SHOULDER_TIME) * SAMPLE_RATE) as usize + 2,
            || env.next_sample(),
        );
        assert_eq!(at_end, 0.0);
        assert!(!env.is_active());
    }

    #[test]
    fn note_envelope_is_single_shot() {
        let mut env = NoteEnvelope::new(SAMPLE_RATE);
        env.trigger();
        render_samples((NOTE_TOTAL_TIME * SAMPLE_RATE) as usize + 10, || {
            env.next_sample()
        });

        assert!(!env.is_active());
        for _ in 0..100 {
            assert_eq!(env.next_sample(), 0.0);
        }
    }

    #[test]
    fn untriggered_envelopes_stay_silent() {
        let mut pad = PadEnvelope::new(0.0125, 0.01, SAMPLE_RATE);
        let mut note = NoteEnvelope::new(SAMPLE_RATE);

        assert!(!pad.is_active());
        assert!(!note.is_active());
        assert_eq!(render_samples(64, || pad.next_sample()), 0.0);
        assert_eq!(render_samples(64, || note.next_sample()), 0.0);
    }

    #[test]
    fn retrigger_restarts_the_note_chain() {
        let mut env = NoteEnvelope::new(SAMPLE_RATE);
        env.trigger();
        render_samples(1_500, || env.next_sample());
        assert!(env.is_active());

        env.trigger();
        let first = env.next_sample();
        assert!(first < 0.001, "retrigger should restart from silence, got {first}");
    }
}
