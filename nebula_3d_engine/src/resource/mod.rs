/// GPU resource types and the owning resource store.
///
/// CPU-side descriptions (`Texture`, `Mesh`, `Material`) are handed to the
/// [`ResourceManager`], which creates the device objects and returns stable
/// handles. Feature sets on meshes and materials drive pipeline selection.

// Texture data
pub mod texture;

// Mesh data, vertex layout and mesh feature sets
pub mod mesh;

// Material data and material feature sets
pub mod material;

// Owning store of device objects
pub mod resource_manager;

pub use texture::*;
pub use mesh::*;
pub use material::*;
pub use resource_manager::*;

/// Stable id of a resource owned by the store
///
/// Allocated from a monotonic counter and never reused within a process, so
/// a stale handle can miss but never alias a different resource.
pub type RenderItemId = i64;
