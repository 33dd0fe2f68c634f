use std::fmt;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::synth::Renderer;
use crate::MAX_BLOCK_SIZE;

/// Everything that can go wrong between "ask for a device" and "stream
/// is running". The graph treats any of these as "run silent".
#[derive(Debug)]
pub enum OutputError {
    NoDevice,
    Config(cpal::DefaultStreamConfigError),
    Build(cpal::BuildStreamError),
    Play(cpal::PlayStreamError),
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputError::NoDevice => write!(f, "no default output device available"),
            OutputError::Config(err) => {
                write!(f, "failed to fetch default output config: {err}")
            }
            OutputError::Build(err) => write!(f, "failed to build output stream: {err}"),
            OutputError::Play(err) => write!(f, "failed to start output stream: {err}"),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::NoDevice => None,
            OutputError::Config(err) => Some(err),
            OutputError::Build(err) => Some(err),
            OutputError::Play(err) => Some(err),
        }
    }
}

/// The default output device plus its negotiated config, opened ahead
/// of stream construction so the renderer can be built with the real
/// sample rate.
pub struct OutputDevice {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
}

impl OutputDevice {
    pub fn open() -> Result<Self, OutputError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(OutputError::NoDevice)?;
        let config = device.default_output_config().map_err(OutputError::Config)?;
        Ok(Self { device, config })
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate().0 as f32
    }

    pub fn channels(&self) -> usize {
        self.config.channels() as usize
    }

    pub fn name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| String::from("unknown device"))
    }

    /// Move the renderer onto a live output stream. The callback renders
    /// mono in MAX_BLOCK_SIZE chunks and fans each sample out to every
    /// channel.
    pub fn spawn(self, mut renderer: Renderer) -> Result<cpal::Stream, OutputError> {
        let channels = self.channels();
        let mut mono = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = self
            .device
            .build_output_stream(
                &self.config.into(),
                move |data: &mut [f32], _| {
                    let total_frames = data.len() / channels;
                    let mut frames_written = 0;

                    while frames_written < total_frames {
                        let frames_to_render = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                        let block = &mut mono[..frames_to_render];
                        renderer.render_block(block);

                        let out_off = frames_written * channels;
                        for (i, &s) in block.iter().enumerate() {
                            for ch in 0..channels {
                                data[out_off + i * channels + ch] = s;
                            }
                        }

                        frames_written += frames_to_render;
                    }
                },
                |err| log::warn!("audio stream error: {err}"),
                None,
            )
            .map_err(OutputError::Build)?;

        stream.play().map_err(OutputError::Play)?;
        Ok(stream)
    }
}
