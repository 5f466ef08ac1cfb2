//! Render system — per-entity render components and frame orchestration.
//!
//! The registry maps entities to their drawable representation. Once per
//! simulation tick, `update_frame` projects the camera frustum onto the
//! ground plane, asks the spatial system which entities fall inside it and
//! stages their components with the renderer between `begin_frame` and
//! `end_frame`.

use std::f32::consts::FRAC_PI_2;
use glam::{Mat2, Vec2};
use rustc_hash::FxHashMap;
use crate::camera::Camera;
use crate::error::Result;
use crate::math::to_ground;
use crate::renderer::{Renderer, ViewParams};
use crate::resource::{MaterialHandle, MeshHandle};
use crate::spatial_system::SpatialSystem;
use crate::system::{Component, EntityId, System};

/// One mesh/material pair of a model
#[derive(Debug, Clone)]
pub struct Submodel {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
}

/// Drawable representation of an entity
#[derive(Debug, Clone)]
pub enum RenderComponent {
    /// A model drawn once per frame with its own transform
    Model {
        entity_id: EntityId,
        submodels: Vec<Submodel>,
    },
    /// One instance of an instanced mesh
    Instance {
        entity_id: EntityId,
        mesh: MeshHandle,
        material: MaterialHandle,
    },
    /// The skybox
    Skybox {
        entity_id: EntityId,
        mesh: MeshHandle,
        material: MaterialHandle,
    },
}

impl Component for RenderComponent {
    fn entity_id(&self) -> EntityId {
        match self {
            RenderComponent::Model { entity_id, .. } => *entity_id,
            RenderComponent::Instance { entity_id, .. } => *entity_id,
            RenderComponent::Skybox { entity_id, .. } => *entity_id,
        }
    }
}

/// Registry of render components plus the cull-and-stage frame driver
#[derive(Default)]
pub struct RenderSystem {
    components: FxHashMap<EntityId, RenderComponent>,
}

impl RenderSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, component: RenderComponent) {
        self.components.insert(component.entity_id(), component);
    }

    /// Stage all visible entities for one frame
    ///
    /// Entities are culled by intersecting their bounding discs with the
    /// camera frustum's footprint on the ground plane. Entities without a
    /// spatial component are skipped.
    pub fn update_frame(
        &self,
        renderer: &mut Renderer,
        camera: &Camera,
        spatial: &SpatialSystem,
    ) -> Result<()> {
        renderer.begin_frame(camera);

        let params = renderer.view_params()?;
        let perimeter = frustum_perimeter(camera, &params);

        for entity_id in spatial.get_intersecting(&perimeter) {
            let Some(component) = self.components.get(&entity_id) else {
                continue;
            };
            let Some(spatial_component) = spatial.get(entity_id) else {
                continue;
            };
            let transform = *spatial_component.abs_transform();

            match component {
                RenderComponent::Model { submodels, .. } => {
                    for submodel in submodels {
                        renderer.stage_model(&submodel.mesh, &submodel.material, transform);
                    }
                }
                RenderComponent::Instance { mesh, material, .. } => {
                    renderer.stage_instance(mesh, material, transform);
                }
                RenderComponent::Skybox { mesh, material, .. } => {
                    renderer.stage_skybox(mesh, material);
                }
            }
        }

        renderer.end_frame();
        Ok(())
    }
}

impl System for RenderSystem {
    type Component = RenderComponent;

    fn remove(&mut self, entity_id: EntityId) -> Option<RenderComponent> {
        self.components.remove(&entity_id)
    }

    fn has(&self, entity_id: EntityId) -> bool {
        self.components.contains_key(&entity_id)
    }

    fn get(&self, entity_id: EntityId) -> Option<&RenderComponent> {
        self.components.get(&entity_id)
    }

    fn get_mut(&mut self, entity_id: EntityId) -> Option<&mut RenderComponent> {
        self.components.get_mut(&entity_id)
    }

    fn update(&mut self) {}
}

/// Footprint of the camera frustum on the ground plane
///
/// A quad from the near plane to the far plane, spanning the horizontal
/// FOV, rotated to the camera's heading and translated to its position.
/// Used as the culling polygon for spatial queries.
pub fn frustum_perimeter(camera: &Camera, params: &ViewParams) -> Vec<Vec2> {
    let half_width_near = params.near_plane * (0.5 * params.h_fov).tan();
    let half_width_far = params.far_plane * (0.5 * params.h_fov).tan();

    // Camera-local: x right, y forward
    let corners = [
        Vec2::new(half_width_near, params.near_plane),
        Vec2::new(half_width_far, params.far_plane),
        Vec2::new(-half_width_far, params.far_plane),
        Vec2::new(-half_width_near, params.near_plane),
    ];

    let direction = camera.direction();
    let heading = direction.z.atan2(direction.x) - FRAC_PI_2;

    let rotation = Mat2::from_angle(heading);
    let position = to_ground(camera.position());

    corners.iter().map(|&c| rotation * c + position).collect()
}

#[cfg(test)]
#[path = "render_system_tests.rs"]
mod tests;
