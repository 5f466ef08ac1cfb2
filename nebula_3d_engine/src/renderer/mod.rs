/// Renderer module — render thread, render graph and the backend boundary.

// Graphics device boundary trait and handle types
pub mod graphics_device;

// Sorted per-frame draw list
pub mod render_graph;

// Writer/reader synchronisation between simulation and render threads
pub mod triple_buffer;

// Pipeline cache and draw recording
pub mod pipeline;

// Uniform buffer layouts
pub mod uniforms;

// Task-queue worker thread
pub mod worker;

// The renderer itself
pub mod renderer;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;

pub use graphics_device::*;
pub use render_graph::*;
pub use triple_buffer::*;
pub use pipeline::*;
pub use uniforms::*;
pub use worker::*;
pub use renderer::*;

/// Frames the CPU may record ahead of the GPU
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;
