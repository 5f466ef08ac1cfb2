//! The renderer: staging API, render thread and frame loop.
//!
//! Exactly two long-lived threads touch the renderer. The simulation thread
//! stages draw work between `begin_frame` and `end_frame` on the writable
//! side of a triple-buffered [`RenderState`]; a dedicated worker thread
//! runs the render loop against the newest readable state. Resource
//! ingestion and pipeline compilation are funnelled through the worker's
//! task queue before `start()`; afterwards the queue is closed and the
//! worker belongs to the render loop.
//!
//! Errors on the render thread stop the loop and are re-raised on the
//! simulation thread by `check_error()`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use glam::{Mat4, Vec3};
use crate::camera::Camera;
use crate::engine_error;
use crate::engine_info;
use crate::error::{Error, Result};
use crate::math::perspective;
use crate::resource::{
    Material, MaterialFlags, MaterialHandle, Mesh, MeshFlags, MeshHandle, RenderItemId,
    ResourceManager, SharedGraphicsDevice, Texture,
};
use super::graphics_device::{AcquireResult, GraphicsDevice, PresentResult};
use super::pipeline::{pipeline_hash, BindState, PipelineCache, PipelineKey};
use super::render_graph::{GraphKey, RenderGraph, RenderNode};
use super::triple_buffer::{triple_buffer, TripleBufferReader, TripleBufferWriter};
use super::uniforms::{CameraUbo, Light, LightingUbo, MAX_LIGHTS};
use super::worker::Worker;
use super::MAX_FRAMES_IN_FLIGHT;

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Vertical field of view in radians
    pub v_fov: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub clear_colour: [f32; 4],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            v_fov: 45f32.to_radians(),
            near_plane: 0.1,
            far_plane: 10_000.0,
            clear_colour: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// View frustum parameters, kept in sync with the surface extent
///
/// The horizontal FOV is derived from the vertical FOV and the aspect
/// ratio whenever the swapchain is (re)created.
#[derive(Debug, Clone, Copy)]
pub struct ViewParams {
    pub h_fov: f32,
    pub v_fov: f32,
    pub aspect_ratio: f32,
    pub near_plane: f32,
    pub far_plane: f32,
}

/// Everything the render thread needs to draw one frame
#[derive(Clone, Default)]
pub struct RenderState {
    pub graph: RenderGraph,
    pub lighting: LightingUbo,
    pub camera_pos: Vec3,
    pub camera_matrix: Mat4,
    /// Counter giving each staged default model a unique key
    next_default_key: i64,
}

/// State shared between the simulation-side handle and the render loop
struct RendererShared {
    device: SharedGraphicsDevice,
    resources: Mutex<ResourceManager>,
    pipelines: Mutex<PipelineCache>,
    view_params: Mutex<ViewParams>,
    running: AtomicBool,
    framebuffer_resized: AtomicBool,
    /// f64 bits of the most recent frames-per-second measurement
    frame_rate: AtomicU64,
    error: Mutex<Option<String>>,
    clear_colour: [f32; 4],
}

/// The renderer's simulation-thread handle
pub struct Renderer {
    shared: Arc<RendererShared>,
    worker: Worker,
    writer: TripleBufferWriter<RenderState>,
    reader: Option<TripleBufferReader<RenderState>>,
    started: bool,
}

impl Renderer {
    /// Create the renderer over an injected graphics device
    ///
    /// The resource store and its per-frame uniforms are created on the
    /// worker thread; the call blocks until they are ready.
    pub fn new(device: SharedGraphicsDevice, config: RendererConfig) -> Result<Self> {
        let worker = Worker::spawn("nebula-render")?;

        let setup_device = Arc::clone(&device);
        let (resources, extent) = worker
            .run(move || -> Result<(ResourceManager, (u32, u32))> {
                let extent = setup_device
                    .lock()
                    .map_err(|_| Error::BackendError("GraphicsDevice lock poisoned".to_string()))?
                    .surface_extent();
                let resources = ResourceManager::new(setup_device)?;
                Ok((resources, extent))
            })?
            .wait()??;

        let aspect_ratio = extent.0 as f32 / extent.1 as f32;
        let view_params = ViewParams {
            h_fov: derive_h_fov(config.v_fov, aspect_ratio),
            v_fov: config.v_fov,
            aspect_ratio,
            near_plane: config.near_plane,
            far_plane: config.far_plane,
        };

        let shared = Arc::new(RendererShared {
            device,
            resources: Mutex::new(resources),
            pipelines: Mutex::new(PipelineCache::new()),
            view_params: Mutex::new(view_params),
            running: AtomicBool::new(false),
            framebuffer_resized: AtomicBool::new(false),
            frame_rate: AtomicU64::new(0),
            error: Mutex::new(None),
            clear_colour: config.clear_colour,
        });

        let (writer, reader) = triple_buffer(RenderState::default());

        Ok(Self {
            shared,
            worker,
            writer,
            reader: Some(reader),
            started: false,
        })
    }

    // ===== INITIALISATION =====

    /// Compile the pipeline for a feature-set combination
    ///
    /// Must be called for every combination that will be drawn, before
    /// `start()`; the render loop never compiles.
    pub fn compile_pipeline(
        &self,
        mesh_features: &crate::resource::MeshFeatureSet,
        material_features: &crate::resource::MaterialFeatureSet,
    ) -> Result<()> {
        if self.started {
            return Err(Error::BackendError(
                "cannot compile pipelines after the renderer has started".to_string(),
            ));
        }

        let shared = Arc::clone(&self.shared);
        let mesh_features = mesh_features.clone();
        let material_features = *material_features;

        self.worker
            .run(move || -> Result<()> {
                let mut pipelines = lock(&shared.pipelines)?;
                let mut device = lock_device(&shared.device)?;
                pipelines.compile(&mut *device, &mesh_features, &material_features)
            })?
            .wait()?
    }

    // ===== RESOURCES =====

    pub fn add_texture(&self, texture: Texture) -> Result<RenderItemId> {
        self.with_resources(move |resources| resources.add_texture(texture))
    }

    pub fn add_normal_map(&self, texture: Texture) -> Result<RenderItemId> {
        self.with_resources(move |resources| resources.add_normal_map(texture))
    }

    pub fn add_cube_map(&self, faces: [Texture; 6]) -> Result<RenderItemId> {
        self.with_resources(move |resources| resources.add_cube_map(faces))
    }

    pub fn remove_texture(&self, id: RenderItemId) -> Result<()> {
        self.with_resources(move |resources| resources.remove_texture(id))
    }

    pub fn remove_cube_map(&self, id: RenderItemId) -> Result<()> {
        self.with_resources(move |resources| resources.remove_cube_map(id))
    }

    pub fn add_mesh(&self, mesh: Mesh) -> Result<MeshHandle> {
        self.with_resources(move |resources| resources.add_mesh(mesh))
    }

    pub fn remove_mesh(&self, id: RenderItemId) -> Result<()> {
        self.with_resources(move |resources| resources.remove_mesh(id))
    }

    pub fn add_material(&self, material: Material) -> Result<MaterialHandle> {
        self.with_resources(move |resources| resources.add_material(material))
    }

    pub fn remove_material(&self, id: RenderItemId) -> Result<()> {
        self.with_resources(move |resources| resources.remove_material(id))
    }

    /// Run a resource-store operation on the worker thread
    fn with_resources<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut ResourceManager) -> Result<R> + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        self.worker
            .run(move || -> Result<R> {
                let mut resources = lock(&shared.resources)?;
                f(&mut resources)
            })?
            .wait()?
    }

    // ===== PER-FRAME STAGING =====

    /// Reset the writable render state and snapshot the camera
    ///
    /// Must precede any staging call for the frame.
    pub fn begin_frame(&mut self, camera: &Camera) {
        let state = self.writer.writable();
        state.graph.clear();
        state.lighting = LightingUbo::default();
        state.camera_pos = camera.position();
        state.camera_matrix = camera.matrix();
        state.next_default_key = 0;
    }

    /// Stage a model for one draw with its own world transform
    pub fn stage_model(&mut self, mesh: &MeshHandle, material: &MaterialHandle, transform: Mat4) {
        let state = self.writer.writable();
        let key = generate_graph_key(state, mesh, material);

        state.graph.insert(
            key,
            RenderNode::Default {
                mesh: mesh.clone(),
                material: *material,
                model_matrix: transform,
            },
        );
    }

    /// Stage one instance of an instanced mesh; transforms accumulate per
    /// `(mesh, material)` pair within the frame
    pub fn stage_instance(
        &mut self,
        mesh: &MeshHandle,
        material: &MaterialHandle,
        transform: Mat4,
    ) {
        let state = self.writer.writable();
        let key = generate_graph_key(state, mesh, material);
        let instance = transform * mesh.transform;

        if let Some(RenderNode::Instanced { instances, .. }) = state.graph.get_mut(&key) {
            instances.push(instance);
        } else {
            state.graph.insert(
                key,
                RenderNode::Instanced {
                    mesh: mesh.clone(),
                    material: *material,
                    instances: vec![instance],
                },
            );
        }
    }

    /// Stage the skybox; at most one per frame, last call wins
    pub fn stage_skybox(&mut self, mesh: &MeshHandle, material: &MaterialHandle) {
        let state = self.writer.writable();
        let key = generate_graph_key(state, mesh, material);

        state.graph.insert(
            key,
            RenderNode::Skybox {
                mesh: mesh.clone(),
                material: *material,
            },
        );
    }

    /// Stage a point light
    ///
    /// # Errors
    ///
    /// `LightCapacityExceeded` beyond [`MAX_LIGHTS`] lights per frame.
    pub fn stage_light(
        &mut self,
        colour: Vec3,
        ambient: f32,
        specular: f32,
        world_pos: Vec3,
    ) -> Result<()> {
        let state = self.writer.writable();
        let index = state.lighting.num_lights as usize;

        if index >= MAX_LIGHTS {
            return Err(Error::LightCapacityExceeded(MAX_LIGHTS));
        }

        state.lighting.lights[index] = Light {
            world_pos,
            colour,
            ambient,
            specular,
            ..Light::default()
        };
        state.lighting.num_lights += 1;

        Ok(())
    }

    /// Publish the staged frame to the render thread
    pub fn end_frame(&mut self) {
        self.writer.write_complete();
    }

    // ===== LIFECYCLE =====

    /// Hand the render loop to the worker thread
    ///
    /// Closes the task queue: resource and pipeline calls fail from here
    /// on.
    pub fn start(&mut self) -> Result<()> {
        let reader = self
            .reader
            .take()
            .ok_or_else(|| Error::BackendError("renderer already started".to_string()))?;

        self.shared.running.store(true, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        self.worker.run(move || render_loop(shared, reader))?;
        self.worker.close();
        self.started = true;

        engine_info!("nebula::Renderer", "Render loop started");
        Ok(())
    }

    /// Stop the render loop and wait for the worker to finish
    pub fn stop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.worker.join();
    }

    /// Whether the render loop is running
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Re-raise an error captured on the render thread
    ///
    /// The simulation thread should call this periodically; a render-thread
    /// failure stops the loop and parks the message here.
    pub fn check_error(&self) -> Result<()> {
        let error = lock(&self.shared.error)?;
        match &*error {
            Some(message) => Err(Error::DeviceLost(message.clone())),
            None => Ok(()),
        }
    }

    /// Notify the renderer that the window was resized
    pub fn on_resize(&self) {
        self.shared.framebuffer_resized.store(true, Ordering::SeqCst);
    }

    /// Most recent frames-per-second measurement
    pub fn frame_rate(&self) -> f64 {
        f64::from_bits(self.shared.frame_rate.load(Ordering::Relaxed))
    }

    /// Current view frustum parameters
    pub fn view_params(&self) -> Result<ViewParams> {
        Ok(*lock(&self.shared.view_params)?)
    }

    /// The render state staged so far this frame
    #[cfg(test)]
    pub(crate) fn staged(&mut self) -> &RenderState {
        self.writer.writable()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Render-graph key for a staging call (see render_graph module docs)
fn generate_graph_key(
    state: &mut RenderState,
    mesh: &MeshHandle,
    material: &MaterialHandle,
) -> GraphKey {
    let key = PipelineKey {
        mesh_features: mesh.features.clone(),
        material_features: material.features,
    };
    let hash = pipeline_hash(&key);
    let transparency =
        i64::from(material.features.flags.contains(MaterialFlags::HAS_TRANSPARENCY));

    if mesh.features.flags.contains(MeshFlags::IS_INSTANCED) {
        vec![transparency, hash, mesh.id, material.id]
    } else if mesh.features.flags.contains(MeshFlags::IS_SKYBOX) {
        vec![transparency, hash]
    } else {
        let counter = state.next_default_key;
        state.next_default_key += 1;
        vec![transparency, hash, mesh.id, material.id, counter]
    }
}

fn derive_h_fov(v_fov: f32, aspect_ratio: f32) -> f32 {
    2.0 * ((v_fov * 0.5).tan() * aspect_ratio).atan()
}

fn lock<'a, T>(mutex: &'a Mutex<T>) -> Result<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| Error::BackendError("renderer lock poisoned".to_string()))
}

fn lock_device(device: &SharedGraphicsDevice) -> Result<MutexGuard<'_, dyn GraphicsDevice + 'static>> {
    device
        .lock()
        .map_err(move |_| Error::BackendError("GraphicsDevice lock poisoned".to_string()))
}

// ===== RENDER LOOP =====

fn render_loop(shared: Arc<RendererShared>, mut reader: TripleBufferReader<RenderState>) {
    let mut current_frame = 0usize;
    let mut timer = Instant::now();

    let mut projection = {
        let extent = match lock_device(&shared.device) {
            Ok(device) => device.surface_extent(),
            Err(_) => (1, 1),
        };
        refresh_projection(&shared, extent)
    };

    while shared.running.load(Ordering::SeqCst) {
        if let Err(e) = render_frame(&shared, &mut reader, current_frame, &mut projection) {
            engine_error!("nebula::Renderer", "Render loop failed: {}", e);
            if let Ok(mut error) = shared.error.lock() {
                *error = Some(e.to_string());
            }
            shared.running.store(false, Ordering::SeqCst);
            break;
        }

        let elapsed = timer.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            shared
                .frame_rate
                .store((1.0 / elapsed).to_bits(), Ordering::Relaxed);
        }
        timer = Instant::now();

        current_frame = (current_frame + 1) % MAX_FRAMES_IN_FLIGHT;
    }

    if let Ok(mut device) = lock_device(&shared.device) {
        device.wait_idle();
    }
}

fn render_frame(
    shared: &Arc<RendererShared>,
    reader: &mut TripleBufferReader<RenderState>,
    current_frame: usize,
    projection: &mut Mat4,
) -> Result<()> {
    // Fence wait and image acquire
    let image = {
        let mut device = lock_device(&shared.device)?;
        device.wait_for_frame_fence(current_frame)?;

        match device.acquire_next_image(current_frame)? {
            AcquireResult::Image(image) => image,
            AcquireResult::OutOfDate => {
                let extent = device.recreate_swapchain()?;
                drop(device);
                *projection = refresh_projection(shared, extent);
                return Ok(());
            }
        }
    };

    let state = reader.readable();

    {
        let mut resources = lock(&shared.resources)?;

        // Per-frame uniforms
        let camera_ubo = CameraUbo {
            view_matrix: state.camera_matrix,
            proj_matrix: *projection,
        };
        resources.update_camera_ubo(&camera_ubo, current_frame)?;

        let mut lighting = state.lighting;
        lighting.view_pos = state.camera_pos;
        resources.update_lighting_ubo(&lighting, current_frame)?;

        // Refresh instance buffers before recording any draws
        for (_, node) in state.graph.iter() {
            if let RenderNode::Instanced {
                mesh, instances, ..
            } = node
            {
                resources.update_mesh_instances(mesh.id, instances)?;
            }
        }

        // Record the frame, walking the graph in sorted order
        let pipelines = lock(&shared.pipelines)?;
        let mut device = lock_device(&shared.device)?;

        device.begin_commands(image)?;
        device.begin_render_pass(image, shared.clear_colour)?;

        let mut bind_state = BindState::default();
        for (_, node) in state.graph.iter() {
            let pipeline = pipelines.get(&node.mesh().features, &node.material().features)?;
            pipeline.record(&mut *device, &resources, node, &mut bind_state, current_frame)?;
        }

        device.end_render_pass()?;
        device.end_commands()?;

        let present = device.submit_and_present(image, current_frame)?;
        let resized = shared.framebuffer_resized.swap(false, Ordering::SeqCst);
        if present == PresentResult::OutOfDate || resized {
            let extent = device.recreate_swapchain()?;
            drop(device);
            *projection = refresh_projection(shared, extent);
        }
    }

    reader.read_complete();

    Ok(())
}

/// Recompute the projection matrix and view params for a new extent
fn refresh_projection(shared: &Arc<RendererShared>, extent: (u32, u32)) -> Mat4 {
    let mut params = match shared.view_params.lock() {
        Ok(params) => params,
        Err(poisoned) => poisoned.into_inner(),
    };

    params.aspect_ratio = extent.0 as f32 / extent.1.max(1) as f32;
    params.h_fov = derive_h_fov(params.v_fov, params.aspect_ratio);

    perspective(
        params.h_fov,
        params.v_fov,
        params.near_plane,
        params.far_plane,
    )
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
