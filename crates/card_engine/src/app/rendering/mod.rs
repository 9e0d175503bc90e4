pub(crate) mod canvas;
mod renderer;

pub(crate) use renderer::FrameData;
pub use renderer::Renderer;
