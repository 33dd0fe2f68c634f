use log::warn;

use crate::audio::AudioGraph;
use crate::mood::{Mood, MoodId};
use crate::synth::RenderCommand;

/// Fade applied when the user stops playback outright.
pub const DRONE_RELEASE_TIME: f32 = 1.0;

/// Control-side bookkeeping for the sustained pad.
///
/// The actual voices live on the render thread; this tracks which mood
/// (if any) currently owns them so the engine can decide whether a mood
/// change needs a crossfade at all.
pub struct DronePad {
    current: Option<MoodId>,
}

impl DronePad {
    pub fn new() -> Self {
        Self { current: None }
    }

    /// Bring up the pad for `mood`. Starting the mood that is already
    /// sounding is a no-op; starting a different mood without stopping
    /// first is refused, because layering pads is exactly the artifact
    /// the crossfade exists to prevent.
    pub fn start(&mut self, mood: &Mood, graph: &mut AudioGraph) {
        match self.current {
            Some(id) if id == mood.id => {}
            Some(id) => {
                warn!(
                    "drone for {} still sounding, refusing to start {}",
                    id.as_str(),
                    mood.id.as_str()
                );
            }
            None => {
                graph.send(RenderCommand::StartDrone { mood: mood.id });
                self.current = Some(mood.id);
            }
        }
    }

    /// Release the pad over `fade_time` seconds. No-op when nothing is
    /// sounding.
    pub fn stop(&mut self, fade_time: f32, graph: &mut AudioGraph) {
        if self.current.take().is_some() {
            graph.send(RenderCommand::ReleaseDrone { fade_time });
        }
    }

    /// Forget the pad without sending anything. Used on teardown, where
    /// the graph silences every voice wholesale.
    pub fn reset(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<MoodId> {
        self.current
    }

    pub fn is_started(&self) -> bool {
        self.current.is_some()
    }
}

impl Default for DronePad {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::VoiceRole;

    const SAMPLE_RATE: f32 = 1000.0;

    #[test]
    fn start_spawns_one_pad_and_tracks_the_mood() {
        let (mut graph, mut renderer) = AudioGraph::offline(SAMPLE_RATE);
        let mut pad = DronePad::new();

        pad.start(Mood::get(MoodId::Thriving), &mut graph);
        assert_eq!(pad.current(), Some(MoodId::Thriving));

        let mut block = [0.0; 16];
        renderer.render_block(&mut block);
        assert_eq!(renderer.drone_voices(), 4);
    }

    #[test]
    fn restarting_the_same_mood_does_not_stack_voices() {
        let (mut graph, mut renderer) = AudioGraph::offline(SAMPLE_RATE);
        let mut pad = DronePad::new();

        pad.start(Mood::get(MoodId::Growing), &mut graph);
        pad.start(Mood::get(MoodId::Growing), &mut graph);

        let mut block = [0.0; 16];
        renderer.render_block(&mut block);
        assert_eq!(renderer.drone_voices(), 4);
    }

    #[test]
    fn starting_a_different_mood_while_sounding_is_refused() {
        let (mut graph, mut renderer) = AudioGraph::offline(SAMPLE_RATE);
        let mut pad = DronePad::new();

        pad.start(Mood::get(MoodId::Struggling), &mut graph);
        pad.start(Mood::get(MoodId::Legendary), &mut graph);
        assert_eq!(pad.current(), Some(MoodId::Struggling));

        let mut block = [0.0; 16];
        renderer.render_block(&mut block);
        for voice in renderer.voices() {
            assert_eq!(voice.role(), VoiceRole::Drone(MoodId::Struggling));
        }
    }

    #[test]
    fn stop_releases_and_forgets() {
        let (mut graph, mut renderer) = AudioGraph::offline(SAMPLE_RATE);
        let mut pad = DronePad::new();

        pad.start(Mood::get(MoodId::Wealthy), &mut graph);
        pad.stop(0.05, &mut graph);
        assert!(!pad.is_started());

        // 0.05 s fade at 1 kHz is 50 samples; give it two blocks
        let mut block = [0.0; 64];
        renderer.render_block(&mut block);
        renderer.render_block(&mut block);
        assert_eq!(renderer.active_voices(), 0);
    }

    #[test]
    fn stop_without_start_sends_nothing() {
        let (mut graph, mut renderer) = AudioGraph::offline(SAMPLE_RATE);
        let mut pad = DronePad::new();

        pad.stop(1.0, &mut graph);

        let mut block = [0.0; 16];
        renderer.render_block(&mut block);
        assert_eq!(renderer.active_voices(), 0);
    }
}
