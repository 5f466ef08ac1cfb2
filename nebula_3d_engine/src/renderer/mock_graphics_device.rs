//! Mock graphics device for GPU-free tests.
//!
//! Stores created objects in slot maps and records every command-recording
//! call as a readable string, so tests can assert on resource contents and
//! on the exact order of bind and draw commands.

use slotmap::SlotMap;
use crate::error::{Error, Result};
use super::graphics_device::*;

pub struct MockBuffer {
    pub usage: BufferUsage,
    pub data: Vec<u8>,
}

pub struct MockTexture {
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

/// In-memory [`GraphicsDevice`] implementation
pub struct MockGraphicsDevice {
    pub buffers: SlotMap<DeviceBufferId, MockBuffer>,
    pub textures: SlotMap<DeviceTextureId, MockTexture>,
    pub pipelines: SlotMap<DevicePipelineId, PipelineDesc>,
    pub descriptor_sets: SlotMap<DescriptorSetId, DescriptorSetDesc>,

    /// Every command-recording call, in order
    pub calls: Vec<String>,

    /// Pending OUT_OF_DATE results for acquire_next_image
    pub out_of_date_acquires: u32,
    pub swapchain_generation: u32,
    pub extent: (u32, u32),
    pub frames_presented: u32,
    pub fence_waits: u32,
    /// When set, submit_and_present fails with DeviceLost
    pub fail_submits: bool,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            buffers: SlotMap::with_key(),
            textures: SlotMap::with_key(),
            pipelines: SlotMap::with_key(),
            descriptor_sets: SlotMap::with_key(),
            calls: Vec::new(),
            out_of_date_acquires: 0,
            swapchain_generation: 0,
            extent: (800, 600),
            frames_presented: 0,
            fence_waits: 0,
            fail_submits: false,
        }
    }

    fn record(&mut self, call: String) {
        self.calls.push(call);
    }
}

impl Default for MockGraphicsDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&mut self, usage: BufferUsage, data: &[u8]) -> Result<DeviceBufferId> {
        Ok(self.buffers.insert(MockBuffer {
            usage,
            data: data.to_vec(),
        }))
    }

    fn create_empty_buffer(&mut self, usage: BufferUsage, size: u64) -> Result<DeviceBufferId> {
        Ok(self.buffers.insert(MockBuffer {
            usage,
            data: vec![0u8; size as usize],
        }))
    }

    fn update_buffer(&mut self, id: DeviceBufferId, offset: u64, data: &[u8]) -> Result<()> {
        let buffer = self
            .buffers
            .get_mut(id)
            .ok_or_else(|| Error::BackendError("mock: unknown buffer".to_string()))?;

        let start = offset as usize;
        let end = start + data.len();
        if end > buffer.data.len() {
            return Err(Error::BackendError(format!(
                "mock: buffer update [{}, {}) exceeds size {}",
                start,
                end,
                buffer.data.len()
            )));
        }

        buffer.data[start..end].copy_from_slice(data);
        Ok(())
    }

    fn destroy_buffer(&mut self, id: DeviceBufferId) -> Result<()> {
        self.buffers
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::BackendError("mock: unknown buffer".to_string()))
    }

    fn create_texture(&mut self, width: u32, height: u32, _data: &[u8]) -> Result<DeviceTextureId> {
        Ok(self.textures.insert(MockTexture {
            width,
            height,
            layers: 1,
        }))
    }

    fn create_cube_map(
        &mut self,
        width: u32,
        height: u32,
        _faces: &[Vec<u8>; 6],
    ) -> Result<DeviceTextureId> {
        Ok(self.textures.insert(MockTexture {
            width,
            height,
            layers: 6,
        }))
    }

    fn destroy_texture(&mut self, id: DeviceTextureId) -> Result<()> {
        self.textures
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::BackendError("mock: unknown texture".to_string()))
    }

    fn create_descriptor_set(&mut self, desc: DescriptorSetDesc) -> Result<DescriptorSetId> {
        Ok(self.descriptor_sets.insert(desc))
    }

    fn create_pipeline(&mut self, desc: PipelineDesc) -> Result<DevicePipelineId> {
        Ok(self.pipelines.insert(desc))
    }

    fn wait_for_frame_fence(&mut self, _frame: usize) -> Result<()> {
        self.fence_waits += 1;
        Ok(())
    }

    fn acquire_next_image(&mut self, _frame: usize) -> Result<AcquireResult> {
        if self.out_of_date_acquires > 0 {
            self.out_of_date_acquires -= 1;
            return Ok(AcquireResult::OutOfDate);
        }
        Ok(AcquireResult::Image(0))
    }

    fn recreate_swapchain(&mut self) -> Result<(u32, u32)> {
        self.swapchain_generation += 1;
        Ok(self.extent)
    }

    fn surface_extent(&self) -> (u32, u32) {
        self.extent
    }

    fn begin_commands(&mut self, image: u32) -> Result<()> {
        self.record(format!("begin_commands {}", image));
        Ok(())
    }

    fn begin_render_pass(&mut self, image: u32, _clear_colour: [f32; 4]) -> Result<()> {
        self.record(format!("begin_render_pass {}", image));
        Ok(())
    }

    fn bind_pipeline(&mut self, id: DevicePipelineId) -> Result<()> {
        self.record(format!("bind_pipeline {:?}", id));
        Ok(())
    }

    fn bind_descriptor_sets(&mut self, sets: &[DescriptorSetId]) -> Result<()> {
        self.record(format!("bind_descriptor_sets {:?}", sets));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, id: DeviceBufferId) -> Result<()> {
        self.record(format!("bind_vertex_buffer {:?}", id));
        Ok(())
    }

    fn bind_instance_buffer(&mut self, id: DeviceBufferId) -> Result<()> {
        self.record(format!("bind_instance_buffer {:?}", id));
        Ok(())
    }

    fn bind_index_buffer(&mut self, id: DeviceBufferId) -> Result<()> {
        self.record(format!("bind_index_buffer {:?}", id));
        Ok(())
    }

    fn push_constants(&mut self, data: &[u8]) -> Result<()> {
        self.record(format!("push_constants {} bytes", data.len()));
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, instance_count: u32) -> Result<()> {
        self.record(format!("draw_indexed {} {}", index_count, instance_count));
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.record("end_render_pass".to_string());
        Ok(())
    }

    fn end_commands(&mut self) -> Result<()> {
        self.record("end_commands".to_string());
        Ok(())
    }

    fn submit_and_present(&mut self, _image: u32, _frame: usize) -> Result<PresentResult> {
        if self.fail_submits {
            return Err(Error::DeviceLost("mock submit failure".to_string()));
        }
        self.frames_presented += 1;
        Ok(PresentResult::Presented)
    }

    fn wait_idle(&mut self) {}
}
