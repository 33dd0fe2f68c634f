use crate::dsp::Waveform;
use crate::mood::MoodId;

/// Fire-and-forget commands from the control thread to the renderer.
///
/// The engine pushes these over a lock-free ring; the audio callback
/// drains the ring at the top of every block. Commands are `Copy` so
/// the queue never touches the allocator. There is no reply channel:
/// the renderer reports back only through the shared voice counter and
/// the spectrum tap.
#[derive(Debug, Copy, Clone)]
pub enum RenderCommand {
    /// Spawn the four-oscillator drone pad for a mood.
    StartDrone { mood: MoodId },
    /// Fade every drone voice to silence over `fade_time` seconds.
    ReleaseDrone { fade_time: f32 },
    /// Spawn one self-terminating melodic note.
    TriggerNote { frequency: f32, waveform: Waveform },
    /// Master volume, clamped to [0, 1].
    SetMasterGain { gain: f32 },
    /// Drop every voice without a fade.
    SilenceAll,
}
