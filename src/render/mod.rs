pub mod frame;
mod renderer;
mod shared;

pub use renderer::Renderer;
