//! Owning store of GPU resources.
//!
//! The resource manager is the only owner of device objects: buffers,
//! textures, descriptor sets and the per-frame uniform buffers. Callers get
//! back stable integer ids; ids are allocated from a monotonic counter and
//! never reused, so a stale handle can only miss.
//!
//! Not thread-safe by itself: every call is funnelled through the renderer
//! worker's task queue, making access effectively single-threaded.

use std::sync::{Arc, Mutex};
use bytemuck::bytes_of;
use glam::Mat4;
use rustc_hash::FxHashMap;
use crate::engine_warn;
use crate::error::{Error, Result};
use crate::renderer::graphics_device::{
    BufferUsage, DescriptorSetDesc, DescriptorSetId, DeviceBufferId, DeviceTextureId,
    GraphicsDevice,
};
use crate::renderer::uniforms::{CameraUbo, LightingUbo, MaterialUbo};
use crate::renderer::MAX_FRAMES_IN_FLIGHT;
use super::material::{Material, MaterialFeatureSet, MaterialHandle};
use super::mesh::{interleave_vertex_data, Mesh, MeshFeatureSet, MeshHandle};
use super::texture::Texture;
use super::RenderItemId;

/// Shared handle to the graphics device
pub type SharedGraphicsDevice = Arc<Mutex<dyn GraphicsDevice>>;

/// Device buffers backing one mesh
#[derive(Debug, Clone, Copy)]
pub struct MeshBuffers {
    pub vertex_buffer: DeviceBufferId,
    pub index_buffer: DeviceBufferId,
    pub instance_buffer: Option<DeviceBufferId>,
    pub index_count: u32,
    /// Instances staged for the current frame, not buffer capacity
    pub instance_count: u32,
}

struct TextureResource {
    device_texture: DeviceTextureId,
}

struct MeshResource {
    features: MeshFeatureSet,
    transform: Mat4,
    vertex_buffer: DeviceBufferId,
    index_buffer: DeviceBufferId,
    instance_buffer: Option<DeviceBufferId>,
    index_count: u32,
    instance_count: u32,
    max_instances: u32,
}

struct MaterialResource {
    features: MaterialFeatureSet,
    descriptor_set: DescriptorSetId,
    ubo: DeviceBufferId,
}

/// Owning maps of textures, cube maps, meshes and materials
pub struct ResourceManager {
    device: SharedGraphicsDevice,
    next_id: RenderItemId,
    textures: FxHashMap<RenderItemId, TextureResource>,
    cube_maps: FxHashMap<RenderItemId, TextureResource>,
    meshes: FxHashMap<RenderItemId, MeshResource>,
    materials: FxHashMap<RenderItemId, MaterialResource>,
    camera_ubos: Vec<DeviceBufferId>,
    lighting_ubos: Vec<DeviceBufferId>,
    global_descriptor_sets: Vec<DescriptorSetId>,
}

impl ResourceManager {
    /// Create the store and its per-frame uniform buffers
    ///
    /// One camera UBO, one lighting UBO and one global descriptor set are
    /// created per in-flight frame; they live for the store's lifetime and
    /// are updated in place each frame.
    pub fn new(device: SharedGraphicsDevice) -> Result<Self> {
        let mut camera_ubos = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        let mut lighting_ubos = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        let mut global_descriptor_sets = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);

        {
            let mut dev = lock_device(&device)?;

            for _ in 0..MAX_FRAMES_IN_FLIGHT {
                let camera =
                    dev.create_buffer(BufferUsage::Uniform, bytes_of(&CameraUbo::default()))?;
                let lighting =
                    dev.create_buffer(BufferUsage::Uniform, bytes_of(&LightingUbo::default()))?;
                let set = dev.create_descriptor_set(DescriptorSetDesc {
                    uniform_buffers: vec![camera, lighting],
                    textures: vec![],
                })?;

                camera_ubos.push(camera);
                lighting_ubos.push(lighting);
                global_descriptor_sets.push(set);
            }
        }

        Ok(Self {
            device,
            next_id: 0,
            textures: FxHashMap::default(),
            cube_maps: FxHashMap::default(),
            meshes: FxHashMap::default(),
            materials: FxHashMap::default(),
            camera_ubos,
            lighting_ubos,
            global_descriptor_sets,
        })
    }

    fn alloc_id(&mut self) -> RenderItemId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ===== TEXTURES =====

    /// Add an RGBA8 texture, returning its id
    pub fn add_texture(&mut self, texture: Texture) -> Result<RenderItemId> {
        validate_texture(&texture)?;

        let device_texture = lock_device(&self.device)?.create_texture(
            texture.width,
            texture.height,
            &texture.data,
        )?;

        let id = self.alloc_id();
        self.textures.insert(id, TextureResource { device_texture });
        Ok(id)
    }

    /// Add a normal map; stored and sampled like any other texture
    pub fn add_normal_map(&mut self, texture: Texture) -> Result<RenderItemId> {
        self.add_texture(texture)
    }

    /// Add a cube map built from 6 equally sized faces
    pub fn add_cube_map(&mut self, faces: [Texture; 6]) -> Result<RenderItemId> {
        let width = faces[0].width;
        let height = faces[0].height;

        for face in &faces {
            validate_texture(face)?;
            if face.width != width || face.height != height {
                return Err(Error::InvalidResource(format!(
                    "cube map face is {}x{}, expected {}x{}",
                    face.width, face.height, width, height
                )));
            }
        }

        let face_data: [Vec<u8>; 6] = faces.map(|f| f.data);
        let device_texture =
            lock_device(&self.device)?.create_cube_map(width, height, &face_data)?;

        let id = self.alloc_id();
        self.cube_maps.insert(id, TextureResource { device_texture });
        Ok(id)
    }

    pub fn remove_texture(&mut self, id: RenderItemId) -> Result<()> {
        let resource = self.textures.remove(&id).ok_or(Error::UnknownResource(id))?;
        lock_device(&self.device)?.destroy_texture(resource.device_texture)
    }

    pub fn remove_cube_map(&mut self, id: RenderItemId) -> Result<()> {
        let resource = self
            .cube_maps
            .remove(&id)
            .ok_or(Error::UnknownResource(id))?;
        lock_device(&self.device)?.destroy_texture(resource.device_texture)
    }

    // ===== MESHES =====

    /// Add a mesh, creating its device buffers
    ///
    /// Attribute buffers are interleaved into a single vertex buffer in
    /// canonical attribute order. Instanced meshes get an instance buffer
    /// preallocated for `max_instances` transforms.
    ///
    /// # Errors
    ///
    /// `InvalidResource` if attribute buffers disagree on vertex count, the
    /// index count is not a multiple of 3, or an instanced mesh declares no
    /// instance capacity.
    pub fn add_mesh(&mut self, mesh: Mesh) -> Result<MeshHandle> {
        if mesh.index_data.len() % 3 != 0 {
            return Err(Error::InvalidResource(format!(
                "mesh index count {} is not a multiple of 3",
                mesh.index_data.len()
            )));
        }

        let is_instanced = mesh
            .feature_set
            .flags
            .contains(super::mesh::MeshFlags::IS_INSTANCED);
        if is_instanced && mesh.max_instances == 0 {
            return Err(Error::InvalidResource(
                "instanced mesh has max_instances = 0".to_string(),
            ));
        }

        let vertex_data = interleave_vertex_data(&mesh)?;

        let (vertex_buffer, index_buffer, instance_buffer) = {
            let mut dev = lock_device(&self.device)?;

            let vertex_buffer = dev.create_buffer(BufferUsage::Vertex, &vertex_data)?;
            let index_buffer =
                dev.create_buffer(BufferUsage::Index, bytemuck::cast_slice(&mesh.index_data))?;

            let instance_buffer = if is_instanced {
                let size = mesh.max_instances as u64 * std::mem::size_of::<Mat4>() as u64;
                Some(dev.create_empty_buffer(BufferUsage::Instance, size)?)
            } else {
                None
            };

            (vertex_buffer, index_buffer, instance_buffer)
        };

        let id = self.alloc_id();
        let handle = MeshHandle {
            id,
            features: mesh.feature_set.clone(),
            transform: mesh.transform,
        };

        self.meshes.insert(
            id,
            MeshResource {
                features: mesh.feature_set,
                transform: mesh.transform,
                vertex_buffer,
                index_buffer,
                instance_buffer,
                index_count: mesh.index_data.len() as u32,
                instance_count: 0,
                max_instances: mesh.max_instances,
            },
        );

        Ok(handle)
    }

    pub fn remove_mesh(&mut self, id: RenderItemId) -> Result<()> {
        let resource = self.meshes.remove(&id).ok_or(Error::UnknownResource(id))?;

        let mut dev = lock_device(&self.device)?;
        dev.destroy_buffer(resource.vertex_buffer)?;
        dev.destroy_buffer(resource.index_buffer)?;
        if let Some(instance_buffer) = resource.instance_buffer {
            dev.destroy_buffer(instance_buffer)?;
        }
        Ok(())
    }

    pub fn mesh_features(&self, id: RenderItemId) -> Result<&MeshFeatureSet> {
        self.meshes
            .get(&id)
            .map(|m| &m.features)
            .ok_or(Error::UnknownResource(id))
    }

    pub fn mesh_transform(&self, id: RenderItemId) -> Result<Mat4> {
        self.meshes
            .get(&id)
            .map(|m| m.transform)
            .ok_or(Error::UnknownResource(id))
    }

    /// Device buffers for a mesh, for command recording
    pub fn mesh_buffers(&self, id: RenderItemId) -> Result<MeshBuffers> {
        let mesh = self.meshes.get(&id).ok_or(Error::UnknownResource(id))?;
        Ok(MeshBuffers {
            vertex_buffer: mesh.vertex_buffer,
            index_buffer: mesh.index_buffer,
            instance_buffer: mesh.instance_buffer,
            index_count: mesh.index_count,
            instance_count: mesh.instance_count,
        })
    }

    /// Upload this frame's instance transforms for an instanced mesh
    ///
    /// Uploads `instances.len()` transforms and records that count for the
    /// draw call. Bytes beyond the staged count from earlier frames are left
    /// in place; their content is undefined and they are never drawn.
    pub fn update_mesh_instances(&mut self, id: RenderItemId, instances: &[Mat4]) -> Result<()> {
        let mesh = self.meshes.get_mut(&id).ok_or(Error::UnknownResource(id))?;

        let Some(instance_buffer) = mesh.instance_buffer else {
            return Err(Error::InvalidResource(format!(
                "mesh {} is not instanced",
                id
            )));
        };

        let mut count = instances.len();
        if count > mesh.max_instances as usize {
            engine_warn!(
                "nebula::ResourceManager",
                "Mesh {} staged {} instances, capacity is {}; excess dropped",
                id,
                count,
                mesh.max_instances
            );
            count = mesh.max_instances as usize;
        }

        lock_device(&self.device)?.update_buffer(
            instance_buffer,
            0,
            bytemuck::cast_slice(&instances[..count]),
        )?;
        mesh.instance_count = count as u32;

        Ok(())
    }

    // ===== MATERIALS =====

    /// Add a material, allocating its descriptor set and uniform buffer
    ///
    /// Texture references must already be in the store.
    pub fn add_material(&mut self, material: Material) -> Result<MaterialHandle> {
        let mut textures = Vec::new();

        if let Some(texture_id) = material.texture {
            textures.push(
                self.textures
                    .get(&texture_id)
                    .ok_or(Error::UnknownResource(texture_id))?
                    .device_texture,
            );
        }
        if let Some(normal_map_id) = material.normal_map {
            textures.push(
                self.textures
                    .get(&normal_map_id)
                    .ok_or(Error::UnknownResource(normal_map_id))?
                    .device_texture,
            );
        }
        if let Some(cube_map_id) = material.cube_map {
            textures.push(
                self.cube_maps
                    .get(&cube_map_id)
                    .ok_or(Error::UnknownResource(cube_map_id))?
                    .device_texture,
            );
        }

        let ubo_data = MaterialUbo {
            colour: material.colour,
            metallic_factor: material.metallic_factor,
            roughness_factor: material.roughness_factor,
            _pad0: [0.0; 2],
        };

        let (ubo, descriptor_set) = {
            let mut dev = lock_device(&self.device)?;
            let ubo = dev.create_buffer(BufferUsage::Uniform, bytes_of(&ubo_data))?;
            let descriptor_set = dev.create_descriptor_set(DescriptorSetDesc {
                uniform_buffers: vec![ubo],
                textures,
            })?;
            (ubo, descriptor_set)
        };

        let id = self.alloc_id();
        let handle = MaterialHandle {
            id,
            features: material.feature_set,
        };

        self.materials.insert(
            id,
            MaterialResource {
                features: material.feature_set,
                descriptor_set,
                ubo,
            },
        );

        Ok(handle)
    }

    pub fn remove_material(&mut self, id: RenderItemId) -> Result<()> {
        let resource = self
            .materials
            .remove(&id)
            .ok_or(Error::UnknownResource(id))?;
        lock_device(&self.device)?.destroy_buffer(resource.ubo)
    }

    pub fn material_features(&self, id: RenderItemId) -> Result<MaterialFeatureSet> {
        self.materials
            .get(&id)
            .map(|m| m.features)
            .ok_or(Error::UnknownResource(id))
    }

    pub fn material_descriptor_set(&self, id: RenderItemId) -> Result<DescriptorSetId> {
        self.materials
            .get(&id)
            .map(|m| m.descriptor_set)
            .ok_or(Error::UnknownResource(id))
    }

    // ===== PER-FRAME UNIFORMS =====

    pub fn update_camera_ubo(&mut self, ubo: &CameraUbo, frame: usize) -> Result<()> {
        lock_device(&self.device)?.update_buffer(self.camera_ubos[frame], 0, bytes_of(ubo))
    }

    pub fn update_lighting_ubo(&mut self, ubo: &LightingUbo, frame: usize) -> Result<()> {
        lock_device(&self.device)?.update_buffer(self.lighting_ubos[frame], 0, bytes_of(ubo))
    }

    /// Descriptor set with the per-frame camera and lighting UBOs
    pub fn global_descriptor_set(&self, frame: usize) -> DescriptorSetId {
        self.global_descriptor_sets[frame]
    }
}

fn validate_texture(texture: &Texture) -> Result<()> {
    let expected = texture.width as usize * texture.height as usize * 4;
    if texture.data.len() != expected {
        return Err(Error::InvalidResource(format!(
            "texture data is {} bytes, expected {} for {}x{} RGBA8",
            texture.data.len(),
            expected,
            texture.width,
            texture.height
        )));
    }
    Ok(())
}

fn lock_device(
    device: &SharedGraphicsDevice,
) -> Result<std::sync::MutexGuard<'_, dyn GraphicsDevice + 'static>> {
    device
        .lock()
        .map_err(move |_| Error::BackendError("GraphicsDevice lock poisoned".to_string()))
}

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
