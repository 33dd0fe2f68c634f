// Purpose: the render side of the engine
// Everything below here runs (or could run) on the audio callback

pub mod message;
pub mod renderer;
pub mod voice;

pub use message::RenderCommand;
pub use renderer::Renderer;
pub use voice::{Voice, VoiceRole};
