use std::time::{Duration, Instant};

use log::debug;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::audio::AudioGraph;
use crate::dsp::Waveform;
use crate::engine::scheduler::{Scheduler, TaskHandle};
use crate::engine::EngineTask;
use crate::mood::{Mood, SCALE_LEN};
use crate::synth::RenderCommand;

/*
Note Sequencer
==============

The melodic layer over the drone. On every tick the sequencer flips a
weighted coin; seven times out of ten it plays one note drawn from the
current mood's scale, then either way it draws a fresh interval and
books the next tick. The interval is re-drawn per onset, uniform in
[2, 4) seconds, so phrases never settle into a grid.

Note shaping is also stochastic: half the notes jump up an octave and
roughly a third render as triangle instead of sine. All randomness runs
through one small PRNG, so a seeded sequencer replays the exact same
phrase, which is what the lifecycle tests lean on.

The sequencer owns no timer thread. It books ticks on the engine's
scheduler and reacts when the engine pumps one back into `tick`.
*/

/// Chance that a tick produces an audible note.
pub const NOTE_PROBABILITY: f64 = 0.7;

/// Chance that a note jumps up one octave.
pub const OCTAVE_UP_PROBABILITY: f64 = 0.5;

/// Chance that a note renders as triangle rather than sine.
pub const TRIANGLE_PROBABILITY: f64 = 0.3;

/// Bounds of the uniform inter-onset interval draw, min inclusive, max
/// exclusive.
pub const MIN_NOTE_INTERVAL_MS: u64 = 2_000;
pub const MAX_NOTE_INTERVAL_MS: u64 = 4_000;

/// Callback invoked with the scale degree of every note that actually
/// sounds. The TUI uses it to flash the played tone.
pub type NoteHook = Box<dyn FnMut(u8) + Send>;

pub struct NoteSequencer {
    rng: SmallRng,
    pending: Option<TaskHandle>,
}

impl NoteSequencer {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_os_rng(),
            pending: None,
        }
    }

    /// A sequencer that replays the same phrase for the same seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            pending: None,
        }
    }

    /// Replace the PRNG mid-flight. Pending ticks are unaffected; only
    /// the draws they make change.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    /// Book the first tick. No note sounds at start itself; the first
    /// onset lands one interval later.
    pub fn start(&mut self, now: Instant, scheduler: &mut Scheduler<EngineTask>) {
        if self.pending.is_some() {
            return;
        }
        self.schedule_next(now, scheduler);
    }

    /// Handle one due tick: maybe play a note, always book the next
    /// tick. Only the engine calls this, and only while playing.
    pub fn tick(
        &mut self,
        now: Instant,
        mood: &Mood,
        graph: &mut AudioGraph,
        scheduler: &mut Scheduler<EngineTask>,
        hook: &mut Option<NoteHook>,
    ) {
        self.pending = None;
        if self.rng.random_bool(NOTE_PROBABILITY) {
            let degree = self.trigger(mood, graph);
            if let Some(hook) = hook {
                hook(degree);
            }
        }
        self.schedule_next(now, scheduler);
    }

    /// Revoke the pending tick. After this no note can fire until
    /// `start` is called again.
    pub fn stop(&mut self, scheduler: &mut Scheduler<EngineTask>) {
        if let Some(handle) = self.pending.take() {
            scheduler.revoke(handle);
        }
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    fn trigger(&mut self, mood: &Mood, graph: &mut AudioGraph) -> u8 {
        let degree = self.rng.random_range(0..SCALE_LEN as u8);
        let mut frequency = mood.degree_frequency(degree);
        if self.rng.random_bool(OCTAVE_UP_PROBABILITY) {
            frequency *= 2.0;
        }
        let waveform = if self.rng.random_bool(TRIANGLE_PROBABILITY) {
            Waveform::Triangle
        } else {
            Waveform::Sine
        };
        debug!("note on: degree {degree}, {frequency:.2} Hz, {waveform:?}");
        graph.send(RenderCommand::TriggerNote {
            frequency,
            waveform,
        });
        degree
    }

    fn schedule_next(&mut self, now: Instant, scheduler: &mut Scheduler<EngineTask>) {
        let interval = self
            .rng
            .random_range(MIN_NOTE_INTERVAL_MS..MAX_NOTE_INTERVAL_MS);
        let due = now + Duration::from_millis(interval);
        self.pending = Some(scheduler.schedule(due, EngineTask::NoteTick));
    }
}

impl Default for NoteSequencer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::MoodId;
    use crate::synth::RenderCommand;

    const SAMPLE_RATE: f32 = 1000.0;

    fn interval_bounds(t0: Instant) -> (Instant, Instant) {
        (
            t0 + Duration::from_millis(MIN_NOTE_INTERVAL_MS),
            t0 + Duration::from_millis(MAX_NOTE_INTERVAL_MS),
        )
    }

    #[test]
    fn first_onset_is_booked_two_to_four_seconds_out() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut sequencer = NoteSequencer::with_seed(1);

        sequencer.start(t0, &mut scheduler);
        assert!(sequencer.is_running());

        let due = scheduler.next_due().unwrap();
        let (min, max) = interval_bounds(t0);
        assert!(due >= min && due < max, "due time outside draw bounds");
    }

    #[test]
    fn start_twice_books_a_single_tick() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut sequencer = NoteSequencer::with_seed(2);

        sequencer.start(t0, &mut scheduler);
        sequencer.start(t0, &mut scheduler);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn stop_revokes_the_pending_tick() {
        let t0 = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut sequencer = NoteSequencer::with_seed(3);

        sequencer.start(t0, &mut scheduler);
        sequencer.stop(&mut scheduler);

        assert!(!sequencer.is_running());
        assert_eq!(
            scheduler.pop_due(t0 + Duration::from_secs(10)),
            None,
            "revoked tick must never fire"
        );
    }

    #[test]
    fn tick_rebooks_with_a_fresh_interval() {
        let t0 = Instant::now();
        let (mut graph, _renderer) = AudioGraph::offline(SAMPLE_RATE);
        let mut scheduler = Scheduler::new();
        let mut sequencer = NoteSequencer::with_seed(4);
        let mood = Mood::get(MoodId::Growing);

        let later = t0 + Duration::from_secs(3);
        sequencer.tick(later, mood, &mut graph, &mut scheduler, &mut None);

        assert!(sequencer.is_running());
        let due = scheduler.next_due().unwrap();
        let (min, max) = interval_bounds(later);
        assert!(due >= min && due < max, "reschedule outside draw bounds");
    }

    #[test]
    fn notes_come_from_the_scale_with_octave_and_waveform_variety() {
        let (mut graph, mut renderer) = AudioGraph::offline(SAMPLE_RATE);
        let mut sequencer = NoteSequencer::with_seed(5);
        let mood = Mood::get(MoodId::Thriving);

        let mut octave_ups = 0;
        let mut triangles = 0;
        let mut block = [0.0; 8];
        for _ in 0..40 {
            sequencer.trigger(mood, &mut graph);
            renderer.render_block(&mut block);

            let voice = &renderer.voices()[0];
            let frequency = voice.oscillator().frequency();
            let base = mood
                .scale
                .iter()
                .any(|&tone| tone == frequency);
            let octave = mood
                .scale
                .iter()
                .any(|&tone| tone * 2.0 == frequency);
            assert!(base || octave, "{frequency} Hz is not in the scale");
            if octave {
                octave_ups += 1;
            }
            if voice.oscillator().waveform() == Waveform::Triangle {
                triangles += 1;
            }

            graph.send(RenderCommand::SilenceAll);
            renderer.render_block(&mut block);
        }

        assert!(octave_ups > 0, "octave doubling never drawn in 40 notes");
        assert!(triangles > 0, "triangle waveform never drawn in 40 notes");
        assert!(octave_ups < 40 && triangles < 40);
    }

    #[test]
    fn equal_seeds_replay_the_same_phrase() {
        let t0 = Instant::now();
        let mut sched_a = Scheduler::new();
        let mut sched_b = Scheduler::new();
        let mut a = NoteSequencer::with_seed(99);
        let mut b = NoteSequencer::with_seed(99);

        a.start(t0, &mut sched_a);
        b.start(t0, &mut sched_b);
        assert_eq!(sched_a.next_due(), sched_b.next_due());

        let (mut graph_a, mut renderer_a) = AudioGraph::offline(SAMPLE_RATE);
        let (mut graph_b, mut renderer_b) = AudioGraph::offline(SAMPLE_RATE);
        let mood = Mood::get(MoodId::Legendary);
        let tick_at = t0 + Duration::from_secs(4);
        a.tick(tick_at, mood, &mut graph_a, &mut sched_a, &mut None);
        b.tick(tick_at, mood, &mut graph_b, &mut sched_b, &mut None);

        assert_eq!(sched_a.next_due(), sched_b.next_due());

        let mut block = [0.0; 8];
        renderer_a.render_block(&mut block);
        renderer_b.render_block(&mut block);
        assert_eq!(renderer_a.note_voices(), renderer_b.note_voices());
        if renderer_a.note_voices() == 1 {
            let osc_a = renderer_a.voices()[0].oscillator();
            let osc_b = renderer_b.voices()[0].oscillator();
            assert_eq!(osc_a.frequency(), osc_b.frequency());
            assert_eq!(osc_a.waveform(), osc_b.waveform());
        }
    }

    #[test]
    fn note_hook_reports_only_sounding_degrees() {
        use std::sync::{Arc, Mutex};

        let t0 = Instant::now();
        let (mut graph, mut renderer) = AudioGraph::offline(SAMPLE_RATE);
        let mut scheduler = Scheduler::new();
        let mut sequencer = NoteSequencer::with_seed(6);
        let mood = Mood::get(MoodId::Struggling);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut hook: Option<NoteHook> =
            Some(Box::new(move |degree| sink.lock().unwrap().push(degree)));

        let mut at = t0;
        for _ in 0..30 {
            at += Duration::from_secs(3);
            sequencer.tick(at, mood, &mut graph, &mut scheduler, &mut hook);
        }

        let mut block = [0.0; 8];
        renderer.render_block(&mut block);

        let degrees = seen.lock().unwrap();
        // p = 0.7 over 30 ticks: statistically certain to fire at least
        // once, and every report must be a valid scale degree
        assert!(!degrees.is_empty());
        assert!(degrees.iter().all(|&d| usize::from(d) < SCALE_LEN));
    }
}
