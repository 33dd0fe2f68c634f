use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::audio::analyzer::SpectrumAnalyzer;
use crate::audio::output::OutputDevice;
use crate::synth::{RenderCommand, Renderer};

/*
Audio Graph
===========

The control thread's handle on everything audio: the command ring into
the renderer, the spectrum tap out of it, the shared voice counter, and
the cpal stream that drives the whole thing.

The graph starts cold. `ensure_started` opens the default output device
exactly once, builds the renderer with the device's real sample rate
and moves it onto the stream. When no device can be opened the graph
degrades to a silent mode: every operation keeps working, commands are
dropped, the spectrum stays at zero, and nothing ever errors. A host
without a sound card gets the full state machine minus the sound.

For tests and non-realtime use, `offline` wires the same rings but
hands the renderer back to the caller instead of spawning a stream, so
sample-accurate blocks can be pulled by hand.

`shutdown` is final: the stream and rings are dropped and a later
`ensure_started` will not resurrect them. A torn-down engine stays
silent for the rest of its life.
*/

/// Initial master volume.
pub const DEFAULT_VOLUME: f32 = 0.5;

/// Sample rate used when no device has told us better.
pub const FALLBACK_SAMPLE_RATE: f32 = 48_000.0;

// Command ring capacity. Control traffic is a handful of commands per
// user action; 256 slots is an order of magnitude of headroom.
const COMMAND_QUEUE_SLOTS: usize = 256;

// Spectrum tap capacity, about 170 ms at 48 kHz. The visualizer only
// wants the newest window, so overflow just sheds samples.
const TAP_SLOTS: usize = 8_192;

enum OutputState {
    /// Not started yet; no device has been touched.
    Cold,
    /// Live cpal stream pulling from the renderer.
    Streaming(#[allow(dead_code)] cpal::Stream),
    /// Renderer handed to the caller; blocks are pulled by hand.
    Detached,
    /// No usable device; commands are dropped.
    Silent,
    /// Torn down for good.
    Finished,
}

/// The control side of the rings shared with one renderer.
struct RenderLink {
    commands: Producer<RenderCommand>,
    tap: Consumer<f32>,
    active_voices: Arc<AtomicUsize>,
}

pub struct AudioGraph {
    output: OutputState,
    link: Option<RenderLink>,
    analyzer: SpectrumAnalyzer,
    volume: f32,
    sample_rate: f32,
}

impl AudioGraph {
    /// A cold graph; the device is opened on the first `ensure_started`.
    pub fn new() -> Self {
        Self {
            output: OutputState::Cold,
            link: None,
            analyzer: SpectrumAnalyzer::new(),
            volume: DEFAULT_VOLUME,
            sample_rate: FALLBACK_SAMPLE_RATE,
        }
    }

    /// Wire the rings without a device and hand the renderer back to
    /// the caller, who pulls blocks at their own pace.
    pub fn offline(sample_rate: f32) -> (Self, Renderer) {
        let (link, renderer) = wire(sample_rate);
        let mut graph = Self {
            output: OutputState::Detached,
            link: Some(link),
            analyzer: SpectrumAnalyzer::new(),
            volume: DEFAULT_VOLUME,
            sample_rate,
        };
        graph.push_volume();
        (graph, renderer)
    }

    /// Open the device and start streaming, once. Safe to call in any
    /// state; only a cold graph does any work. Device failure flips the
    /// graph into silent mode instead of erroring.
    pub fn ensure_started(&mut self) {
        if !matches!(self.output, OutputState::Cold) {
            return;
        }

        let device = match OutputDevice::open() {
            Ok(device) => device,
            Err(err) => {
                warn!("audio unavailable, running silent: {err}");
                self.output = OutputState::Silent;
                return;
            }
        };

        self.sample_rate = device.sample_rate();
        let name = device.name();
        let (link, renderer) = wire(self.sample_rate);

        match device.spawn(renderer) {
            Ok(stream) => {
                info!(
                    "audio output started: {} at {} Hz",
                    name, self.sample_rate
                );
                self.link = Some(link);
                self.output = OutputState::Streaming(stream);
                self.push_volume();
            }
            Err(err) => {
                warn!("audio unavailable, running silent: {err}");
                self.output = OutputState::Silent;
            }
        }
    }

    /// Queue a command for the renderer. Dropped when the graph has no
    /// renderer (cold, silent or finished) or when the ring is full.
    pub fn send(&mut self, cmd: RenderCommand) {
        if let Some(link) = &mut self.link {
            if link.commands.push(cmd).is_err() {
                debug!("command queue full, dropping {cmd:?}");
            }
        }
    }

    /// Clamp to [0, 1], remember, and forward to the renderer. The
    /// remembered value survives a graph that is not yet started and is
    /// pushed as soon as it is.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.push_volume();
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    fn push_volume(&mut self) {
        let gain = self.volume;
        self.send(RenderCommand::SetMasterGain { gain });
    }

    /// Drain the tap and return the freshest spectrum frame. All zeros
    /// whenever nothing is rendering.
    pub fn sample_spectrum(&mut self) -> &[u8] {
        if let Some(link) = &mut self.link {
            loop {
                let readable = link.tap.slots();
                if readable == 0 {
                    break;
                }
                match link.tap.read_chunk(readable) {
                    Ok(chunk) => {
                        let (first, second) = chunk.as_slices();
                        self.analyzer.push_samples(first);
                        self.analyzer.push_samples(second);
                        chunk.commit_all();
                    }
                    Err(_) => break,
                }
            }

            if link.active_voices.load(Ordering::Relaxed) == 0 {
                self.analyzer.reset();
            } else {
                self.analyzer.process();
            }
        }
        self.analyzer.frame()
    }

    /// Live voices on the render side, as of its last finished block.
    pub fn active_voices(&self) -> usize {
        self.link
            .as_ref()
            .map(|link| link.active_voices.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// True when a real output stream is running.
    pub fn is_live(&self) -> bool {
        matches!(self.output, OutputState::Streaming(_))
    }

    /// True when the graph gave up on a device and runs silent.
    pub fn is_silent(&self) -> bool {
        matches!(self.output, OutputState::Silent)
    }

    /// Release the stream and rings for good. Idempotent; the graph
    /// stays dead afterwards.
    pub fn shutdown(&mut self) {
        if matches!(self.output, OutputState::Finished) {
            return;
        }
        self.send(RenderCommand::SilenceAll);
        self.output = OutputState::Finished;
        self.link = None;
        self.analyzer.reset();
        info!("audio graph shut down");
    }
}

impl Default for AudioGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn wire(sample_rate: f32) -> (RenderLink, Renderer) {
    let (cmd_tx, cmd_rx) = RingBuffer::new(COMMAND_QUEUE_SLOTS);
    let (tap_tx, tap_rx) = RingBuffer::new(TAP_SLOTS);
    let active_voices = Arc::new(AtomicUsize::new(0));
    let renderer = Renderer::new(sample_rate, cmd_rx, tap_tx, active_voices.clone());
    (
        RenderLink {
            commands: cmd_tx,
            tap: tap_rx,
            active_voices,
        },
        renderer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::analyzer::SPECTRUM_BINS;
    use crate::mood::MoodId;

    const SAMPLE_RATE: f32 = 48_000.0;

    #[test]
    fn offline_graph_reaches_its_renderer() {
        let (mut graph, mut renderer) = AudioGraph::offline(SAMPLE_RATE);
        graph.send(RenderCommand::StartDrone {
            mood: MoodId::Growing,
        });

        let mut block = vec![0.0f32; 512];
        renderer.render_block(&mut block);

        assert_eq!(renderer.drone_voices(), 4);
        assert_eq!(graph.active_voices(), 4);
    }

    #[test]
    fn default_volume_is_pushed_at_wiring() {
        let (_graph, mut renderer) = AudioGraph::offline(SAMPLE_RATE);
        let mut block = vec![0.0f32; 64];
        renderer.render_block(&mut block);
        assert_eq!(renderer.master_gain(), DEFAULT_VOLUME);
    }

    #[test]
    fn volume_is_clamped_and_cached() {
        let (mut graph, mut renderer) = AudioGraph::offline(SAMPLE_RATE);
        graph.set_volume(5.0);
        assert_eq!(graph.volume(), 1.0);
        graph.set_volume(-1.0);
        assert_eq!(graph.volume(), 0.0);

        let mut block = vec![0.0f32; 64];
        renderer.render_block(&mut block);
        assert_eq!(renderer.master_gain(), 0.0);
    }

    #[test]
    fn spectrum_is_zero_until_sound_flows() {
        let (mut graph, mut renderer) = AudioGraph::offline(SAMPLE_RATE);
        assert_eq!(graph.sample_spectrum().len(), SPECTRUM_BINS);
        assert!(graph.sample_spectrum().iter().all(|&b| b == 0));

        graph.send(RenderCommand::StartDrone {
            mood: MoodId::Struggling,
        });
        let mut block = vec![0.0f32; 1_024];
        renderer.render_block(&mut block);

        assert!(graph.sample_spectrum().iter().any(|&b| b > 0));
    }

    #[test]
    fn spectrum_returns_to_zero_after_voices_die() {
        let (mut graph, mut renderer) = AudioGraph::offline(SAMPLE_RATE);
        graph.send(RenderCommand::StartDrone {
            mood: MoodId::Thriving,
        });
        let mut block = vec![0.0f32; 1_024];
        renderer.render_block(&mut block);
        assert!(graph.sample_spectrum().iter().any(|&b| b > 0));

        graph.send(RenderCommand::SilenceAll);
        renderer.render_block(&mut block);

        assert!(graph.sample_spectrum().iter().all(|&b| b == 0));
    }

    #[test]
    fn shutdown_is_final_and_silent() {
        let (mut graph, mut renderer) = AudioGraph::offline(SAMPLE_RATE);
        graph.send(RenderCommand::StartDrone {
            mood: MoodId::Wealthy,
        });
        let mut block = vec![0.0f32; 512];
        renderer.render_block(&mut block);
        assert_eq!(graph.active_voices(), 4);

        graph.shutdown();
        graph.shutdown();

        assert_eq!(graph.active_voices(), 0);
        assert!(graph.sample_spectrum().iter().all(|&b| b == 0));

        // Commands after shutdown vanish without effect.
        graph.send(RenderCommand::StartDrone {
            mood: MoodId::Legendary,
        });
        assert_eq!(graph.active_voices(), 0);
    }

    #[test]
    fn cold_graph_drops_commands_without_panicking() {
        let mut graph = AudioGraph::new();
        graph.send(RenderCommand::SilenceAll);
        graph.set_volume(0.7);
        assert_eq!(graph.volume(), 0.7);
        assert_eq!(graph.active_voices(), 0);
        assert!(graph.sample_spectrum().iter().all(|&b| b == 0));
    }
}
