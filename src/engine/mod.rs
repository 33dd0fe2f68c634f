/*
Soundscape Engine
=================

The control half of the crate. `SoundscapeEngine` owns the audio graph,
the drone pad, the note sequencer and the timer queue, and exposes the
whole instrument as a handful of calls: set a net-worth figure, start,
stop, change volume, pump `tick` from the host loop.

Time never blocks here. Every delayed action (note onsets, the back
half of a mood crossfade) is an entry in the scheduler; `tick` pops
whatever has come due and dispatches it. Hosts that render a UI just
call `tick` once per frame; tests drive `tick_at` with synthetic
instants and fast-forward hours in microseconds.

Mood switching is the one piece with real sequencing in it. A switch
releases the old pad over half a second, waits out that window, then
raises the new pad and re-arms the sequencer. While the window runs the
engine sits in `MoodSwitch`, where further net-worth changes are
absorbed silently: completion re-resolves the target from the latest
figure, so rapid slider drags settle on the final value with a single
crossfade and old and new pads never stack.
*/

pub mod drone;
pub mod scheduler;
pub mod sequencer;
pub mod visualizer;

use std::time::{Duration, Instant};

use log::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::audio::AudioGraph;
use crate::mood::{Mood, MoodId, MoodResolver};

use self::drone::{DronePad, DRONE_RELEASE_TIME};
use self::scheduler::{Scheduler, TaskHandle};
use self::sequencer::{NoteHook, NoteSequencer};
use self::visualizer::Visualizer;

/// Fade length of each half of a mood crossfade.
pub const CROSSFADE_TIME: f32 = 0.5;

/// Gap between releasing the old pad and raising the new one.
pub const CROSSFADE_WINDOW: Duration = Duration::from_millis(500);

/// Lifecycle of the engine.
///
/// `MoodSwitch` is a transient hop: the old pad is fading and the new
/// one is booked but not yet sounding. Both `Playing` and `MoodSwitch`
/// count as "playing" to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EngineState {
    Idle,
    Playing,
    MoodSwitch,
}

/// Everything the scheduler can fire back into the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineTask {
    /// A sequencer tick: maybe play a note, rebook the next tick.
    NoteTick,
    /// Second half of a mood crossfade: raise the pad for whatever
    /// mood is current by then.
    FinishMoodSwitch,
}

pub struct SoundscapeEngine {
    state: EngineState,
    graph: AudioGraph,
    scheduler: Scheduler<EngineTask>,
    sequencer: NoteSequencer,
    drone: DronePad,
    visualizer: Visualizer,
    net_worth: f64,
    resolver: MoodResolver,
    switch_task: Option<TaskHandle>,
    note_hook: Option<NoteHook>,
}

impl SoundscapeEngine {
    /// An engine wired to the default audio device. The device itself
    /// is not opened until the first `start`.
    pub fn new() -> Self {
        Self::with_graph(AudioGraph::new())
    }

    /// An engine over a caller-supplied graph. Tests pass the control
    /// half of `AudioGraph::offline` and drive the renderer by hand.
    pub fn with_graph(graph: AudioGraph) -> Self {
        Self {
            state: EngineState::Idle,
            graph,
            scheduler: Scheduler::new(),
            sequencer: NoteSequencer::new(),
            drone: DronePad::new(),
            visualizer: Visualizer::new(),
            net_worth: 0.0,
            resolver: MoodResolver::new(),
            switch_task: None,
            note_hook: None,
        }
    }

    /// Seed the note sequencer so its phrase replays exactly.
    pub fn set_sequence_seed(&mut self, seed: u64) {
        self.sequencer.reseed(seed);
    }

    /// Register a callback fired with the scale degree of every note
    /// that sounds.
    pub fn set_note_hook(&mut self, hook: impl FnMut(u8) + Send + 'static) {
        self.note_hook = Some(Box::new(hook));
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// True through `Playing` and the transient `MoodSwitch` hop.
    pub fn is_playing(&self) -> bool {
        matches!(self.state, EngineState::Playing | EngineState::MoodSwitch)
    }

    pub fn net_worth(&self) -> f64 {
        self.net_worth
    }

    /// Update the net-worth figure. While playing, a figure that lands
    /// in a different tier begins a crossfade to that tier's mood.
    pub fn set_net_worth(&mut self, net_worth: f64) {
        self.net_worth = net_worth;
        self.refresh_mood();
    }

    /// Pin the mood regardless of net worth, or pass `None` to resolve
    /// from the figure again. Takes effect like any other mood change.
    pub fn select_mood(&mut self, mood: Option<MoodId>) {
        match mood {
            Some(id) => self.resolver.pin(id),
            None => self.resolver.clear(),
        }
        self.refresh_mood();
    }

    /// The mood that is (or would be) sounding: the pinned one if any,
    /// otherwise the tier the current net worth resolves to.
    pub fn current_mood(&self) -> &'static Mood {
        self.resolver.current(self.net_worth)
    }

    /// Begin playback. Opens the audio device on first use, raises the
    /// drone for the current mood and books the first sequencer tick
    /// one interval out. No-op unless idle.
    pub fn start(&mut self) {
        if self.state != EngineState::Idle {
            return;
        }
        self.graph.ensure_started();

        let mood = self.current_mood();
        info!(
            "soundscape up: {} ({}), net worth {:.0}",
            mood.id.as_str(),
            mood.theme.title,
            self.net_worth
        );
        self.drone.start(mood, &mut self.graph);
        self.sequencer.start(Instant::now(), &mut self.scheduler);
        self.state = EngineState::Playing;
    }

    /// Stop playback. The pad rolls off over one second; notes already
    /// sounding finish their own envelopes; nothing new is booked. A
    /// crossfade in flight is abandoned, old pad fade and all.
    pub fn stop(&mut self) {
        if self.state == EngineState::Idle {
            return;
        }
        self.sequencer.stop(&mut self.scheduler);
        if let Some(handle) = self.switch_task.take() {
            self.scheduler.revoke(handle);
        }
        self.drone.stop(DRONE_RELEASE_TIME, &mut self.graph);
        self.visualizer.clear();
        self.state = EngineState::Idle;
        info!("soundscape stopped");
    }

    /// Master volume, clamped to 0..=1.
    pub fn set_volume(&mut self, volume: f32) {
        self.graph.set_volume(volume);
    }

    pub fn volume(&self) -> f32 {
        self.graph.volume()
    }

    /// Pump due work. Hosts call this once per frame.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// `tick` against an explicit clock, for tests.
    pub fn tick_at(&mut self, now: Instant) {
        while let Some(task) = self.scheduler.pop_due(now) {
            match task {
                EngineTask::NoteTick => {
                    if self.state == EngineState::Playing {
                        let mood = self.current_mood();
                        self.sequencer.tick(
                            now,
                            mood,
                            &mut self.graph,
                            &mut self.scheduler,
                            &mut self.note_hook,
                        );
                    }
                }
                EngineTask::FinishMoodSwitch => self.finish_mood_switch(now),
            }
        }

        if self.state != EngineState::Idle {
            self.visualizer.refresh(&mut self.graph);
        }
    }

    /// The latest spectrum frame, refreshed on every playing tick.
    pub fn spectrum(&self) -> &[u8] {
        self.visualizer.frame()
    }

    /// Voices currently sounding on the render thread. Trails control
    /// state by up to one render block.
    pub fn active_voices(&self) -> usize {
        self.graph.active_voices()
    }

    /// True once `start` has opened a real output stream.
    pub fn audio_is_live(&self) -> bool {
        self.graph.is_live()
    }

    /// True when no device was available and the engine runs silent.
    pub fn audio_is_silent(&self) -> bool {
        self.graph.is_silent()
    }

    /// Tear the engine down for good: cancel all timers, silence every
    /// voice immediately and close the output. The engine stays dead;
    /// `start` after teardown keeps it silent.
    pub fn teardown(&mut self) {
        self.sequencer.stop(&mut self.scheduler);
        if let Some(handle) = self.switch_task.take() {
            self.scheduler.revoke(handle);
        }
        self.scheduler.clear();
        self.drone.reset();
        self.visualizer.clear();
        self.graph.shutdown();
        self.state = EngineState::Idle;
    }

    /// React to a possible mood change. Only a playing engine with an
    /// actually different target crossfades; during `MoodSwitch` the
    /// completion handler re-resolves, so nothing to do here.
    fn refresh_mood(&mut self) {
        if self.state != EngineState::Playing {
            return;
        }
        let target = self.current_mood();
        if self.drone.current() != Some(target.id) {
            self.begin_mood_switch(target);
        }
    }

    fn begin_mood_switch(&mut self, target: &Mood) {
        debug!("crossfade to {} begins", target.id.as_str());
        self.sequencer.stop(&mut self.scheduler);
        self.drone.stop(CROSSFADE_TIME, &mut self.graph);
        let due = Instant::now() + CROSSFADE_WINDOW;
        self.switch_task = Some(self.scheduler.schedule(due, EngineTask::FinishMoodSwitch));
        self.state = EngineState::MoodSwitch;
    }

    fn finish_mood_switch(&mut self, now: Instant) {
        self.switch_task = None;
        let mood = self.current_mood();
        debug!("crossfade lands on {}", mood.id.as_str());
        self.drone.start(mood, &mut self.graph);
        self.sequencer.start(now, &mut self.scheduler);
        self.state = EngineState::Playing;
    }
}

impl Default for SoundscapeEngine {
    fn default() -> Self {
        Self::new()
    }
}
