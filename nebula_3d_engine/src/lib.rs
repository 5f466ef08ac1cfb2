/*!
# Nebula 3D Engine

Core runtime for a first-person 3D engine.

This crate contains the platform-agnostic heart of the engine: spatial
indexing and collision resolution over a uniform 2D grid, the entity/component
registries shared by the runtime systems, and a threaded renderer built around
a triple-buffered render graph. Graphics backends (Vulkan, Direct3D 12, etc.)
plug in behind the [`renderer::GraphicsDevice`] trait.

## Architecture

- **Grid**: uniform spatial index used for frustum culling and collision
- **Systems**: spatial, collision and render component registries
- **ResourceManager**: owning store for GPU meshes, materials and textures
- **RenderGraph**: per-frame draw list sorted to minimise GPU state changes
- **Renderer**: dedicated render thread fed through a triple buffer
*/

// Error handling module
pub mod error;

// Internal logging system (Logger trait + macros)
pub mod log;

// Math primitives (lines, polygons, projections)
pub mod math;

// Uniform spatial grid
pub mod grid;

// Entity ids, component and system traits
pub mod system;

// First-person camera
pub mod camera;

// Runtime systems
pub mod spatial_system;
pub mod collision_system;
pub mod render_system;

// GPU resource types and owning store
pub mod resource;

// Render thread, render graph, pipeline cache, graphics device boundary
pub mod renderer;

// Re-export error types at crate root
pub use error::{Error, Result};

// Re-export entity/component basics
pub use system::{Component, EntityId, IdAllocator, System};

// Re-export math library
pub use glam;
