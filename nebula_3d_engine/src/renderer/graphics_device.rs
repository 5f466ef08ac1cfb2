//! Graphics device boundary trait.
//!
//! The core never talks to a graphics API directly. Everything it needs
//! from a backend — buffer/texture/pipeline creation, per-frame command
//! recording, swapchain acquire/present — goes through [`GraphicsDevice`].
//! Backend crates (Vulkan, Direct3D 12, etc.) implement this trait; tests
//! run against [`MockGraphicsDevice`](super::mock_graphics_device::MockGraphicsDevice).
//!
//! All methods are called from the renderer worker thread only, with two
//! exceptions noted on the methods themselves.

use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use slotmap::new_key_type;
use crate::error::{Error, Result};
use crate::resource::VertexLayout;

/// Window surface target handed to backend constructors
///
/// The core never dereferences these handles; they exist so a backend can
/// create its swapchain against the application's window.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceTarget {
    pub window: RawWindowHandle,
    pub display: RawDisplayHandle,
}

impl SurfaceTarget {
    /// Capture the raw handles from a winit window
    pub fn from_window(window: &winit::window::Window) -> Result<Self> {
        let window_handle = window
            .window_handle()
            .map_err(|e| Error::BackendError(format!("window handle unavailable: {}", e)))?;
        let display_handle = window
            .display_handle()
            .map_err(|e| Error::BackendError(format!("display handle unavailable: {}", e)))?;

        Ok(Self {
            window: window_handle.as_raw(),
            display: display_handle.as_raw(),
        })
    }
}

new_key_type! {
    /// Handle to a device buffer (vertex, index, instance or uniform)
    pub struct DeviceBufferId;
}

new_key_type! {
    /// Handle to a device texture or cube map
    pub struct DeviceTextureId;
}

new_key_type! {
    /// Handle to a compiled graphics pipeline
    pub struct DevicePipelineId;
}

new_key_type! {
    /// Handle to a descriptor set
    pub struct DescriptorSetId;
}

/// What a buffer is used for; backends pick memory type and usage flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Per-vertex attribute data
    Vertex,
    /// u16 index data
    Index,
    /// Per-instance transform data, rewritten every frame
    Instance,
    /// Uniform buffer, persistently mapped
    Uniform,
}

/// Descriptor set contents: uniform buffers first, then sampled textures
#[derive(Debug, Clone, Default)]
pub struct DescriptorSetDesc {
    pub uniform_buffers: Vec<DeviceBufferId>,
    pub textures: Vec<DeviceTextureId>,
}

/// Everything a backend needs to compile one pipeline variant
///
/// `defines` are shader preprocessor macros (`INSTANCED`, `SKYBOX`, ...);
/// the vertex input layout follows the mesh's canonical attribute order.
#[derive(Debug, Clone)]
pub struct PipelineDesc {
    pub defines: Vec<String>,
    pub vertex_layout: VertexLayout,
    pub instanced: bool,
    pub double_sided: bool,
    pub transparent: bool,
}

/// Result of a swapchain image acquire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireResult {
    /// Image acquired and ready for recording
    Image(u32),
    /// Swapchain is stale (resize); recreate and retry next iteration
    OutOfDate,
}

/// Result of a queue present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentResult {
    Presented,
    /// Swapchain went stale during present
    OutOfDate,
}

/// Backend abstraction for the renderer
///
/// Resource creation and destruction, command recording and presentation.
/// The device owns every object it creates; ids are keys into its internal
/// tables and are never reused within a process.
pub trait GraphicsDevice: Send {
    // ===== RESOURCES =====

    /// Create a buffer initialised with `data`
    fn create_buffer(&mut self, usage: BufferUsage, data: &[u8]) -> Result<DeviceBufferId>;

    /// Create an uninitialised buffer of `size` bytes
    fn create_empty_buffer(&mut self, usage: BufferUsage, size: u64) -> Result<DeviceBufferId>;

    /// Overwrite part of a buffer through a staging upload
    fn update_buffer(&mut self, id: DeviceBufferId, offset: u64, data: &[u8]) -> Result<()>;

    fn destroy_buffer(&mut self, id: DeviceBufferId) -> Result<()>;

    /// Create a sampled RGBA8 2D texture
    fn create_texture(&mut self, width: u32, height: u32, data: &[u8]) -> Result<DeviceTextureId>;

    /// Create a cube map from 6 equally sized RGBA8 faces
    fn create_cube_map(
        &mut self,
        width: u32,
        height: u32,
        faces: &[Vec<u8>; 6],
    ) -> Result<DeviceTextureId>;

    fn destroy_texture(&mut self, id: DeviceTextureId) -> Result<()>;

    /// Allocate a descriptor set from the shared pool
    fn create_descriptor_set(&mut self, desc: DescriptorSetDesc) -> Result<DescriptorSetId>;

    /// Compile a graphics pipeline variant
    fn create_pipeline(&mut self, desc: PipelineDesc) -> Result<DevicePipelineId>;

    // ===== FRAME =====

    /// Block until the given in-flight frame's fence signals, then reset it
    fn wait_for_frame_fence(&mut self, frame: usize) -> Result<()>;

    /// Acquire the next swapchain image
    fn acquire_next_image(&mut self, frame: usize) -> Result<AcquireResult>;

    /// Recreate the swapchain after a resize or OUT_OF_DATE result
    ///
    /// Returns the new surface extent.
    fn recreate_swapchain(&mut self) -> Result<(u32, u32)>;

    /// Current surface extent in pixels
    fn surface_extent(&self) -> (u32, u32);

    // ===== COMMAND RECORDING =====

    /// Reset and begin the command buffer for a swapchain image
    fn begin_commands(&mut self, image: u32) -> Result<()>;

    /// Begin the main render pass, clearing colour and depth
    fn begin_render_pass(&mut self, image: u32, clear_colour: [f32; 4]) -> Result<()>;

    fn bind_pipeline(&mut self, id: DevicePipelineId) -> Result<()>;

    /// Bind descriptor sets starting at set 0
    fn bind_descriptor_sets(&mut self, sets: &[DescriptorSetId]) -> Result<()>;

    fn bind_vertex_buffer(&mut self, id: DeviceBufferId) -> Result<()>;

    /// Bind the per-instance attribute buffer (binding 1)
    fn bind_instance_buffer(&mut self, id: DeviceBufferId) -> Result<()>;

    /// Bind a u16 index buffer
    fn bind_index_buffer(&mut self, id: DeviceBufferId) -> Result<()>;

    /// Push constant data for the bound pipeline
    fn push_constants(&mut self, data: &[u8]) -> Result<()>;

    fn draw_indexed(&mut self, index_count: u32, instance_count: u32) -> Result<()>;

    fn end_render_pass(&mut self) -> Result<()>;

    fn end_commands(&mut self) -> Result<()>;

    /// Submit the recorded commands and present the image
    ///
    /// Waits on the frame's image-available semaphore, signals its
    /// render-finished semaphore and fences the in-flight slot.
    fn submit_and_present(&mut self, image: u32, frame: usize) -> Result<PresentResult>;

    /// Block until the device is idle. Called during shutdown; safe from
    /// the thread that owns the render loop only.
    fn wait_idle(&mut self);
}
