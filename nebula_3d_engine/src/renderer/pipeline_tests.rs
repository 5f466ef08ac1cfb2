/// Tests for the pipeline cache and draw recording

use super::*;
use std::sync::{Arc, Mutex};
use glam::{Mat4, Vec2};
use crate::renderer::mock_graphics_device::MockGraphicsDevice;
use crate::resource::{
    cuboid, Material, MaterialHandle, MeshHandle, ResourceManager, SharedGraphicsDevice,
};

fn mesh_features(flags: MeshFlags) -> MeshFeatureSet {
    MeshFeatureSet {
        vertex_layout: vec![crate::resource::VertexAttribute::Position],
        flags,
    }
}

fn material_features(flags: MaterialFlags) -> MaterialFeatureSet {
    MaterialFeatureSet { flags }
}

#[test]
fn test_shader_defines_from_features() {
    let key = PipelineKey {
        mesh_features: mesh_features(MeshFlags::IS_INSTANCED | MeshFlags::IS_ANIMATED),
        material_features: material_features(MaterialFlags::HAS_TEXTURE),
    };

    let defines = shader_defines(&key);
    assert!(defines.contains(&"INSTANCED".to_string()));
    assert!(defines.contains(&"ANIMATED".to_string()));
    assert!(defines.contains(&"TEXTURE_MAPPING".to_string()));
    assert!(!defines.contains(&"SKYBOX".to_string()));
    assert!(!defines.contains(&"NORMAL_MAPPING".to_string()));
}

#[test]
fn test_pipeline_hash_is_stable_and_discriminates() {
    let key_a = PipelineKey {
        mesh_features: mesh_features(MeshFlags::IS_INSTANCED),
        material_features: material_features(MaterialFlags::empty()),
    };
    let key_b = PipelineKey {
        mesh_features: mesh_features(MeshFlags::empty()),
        material_features: material_features(MaterialFlags::empty()),
    };

    assert_eq!(pipeline_hash(&key_a), pipeline_hash(&key_a.clone()));
    assert_ne!(pipeline_hash(&key_a), pipeline_hash(&key_b));
}

#[test]
fn test_compile_is_idempotent() {
    let mut device = MockGraphicsDevice::new();
    let mut cache = PipelineCache::new();

    let mesh = mesh_features(MeshFlags::empty());
    let material = material_features(MaterialFlags::empty());

    cache.compile(&mut device, &mesh, &material).unwrap();
    cache.compile(&mut device, &mesh, &material).unwrap();

    assert_eq!(cache.len(), 1);
    assert_eq!(device.pipelines.len(), 1);
}

#[test]
fn test_get_uncompiled_fails() {
    let cache = PipelineCache::new();

    assert!(matches!(
        cache.get(
            &mesh_features(MeshFlags::empty()),
            &material_features(MaterialFlags::empty())
        ),
        Err(crate::error::Error::FeatureSetUncompiled)
    ));
}

#[test]
fn test_compile_passes_variant_flags_to_device() {
    let mut device = MockGraphicsDevice::new();
    let mut cache = PipelineCache::new();

    cache
        .compile(
            &mut device,
            &mesh_features(MeshFlags::IS_INSTANCED),
            &material_features(MaterialFlags::HAS_TRANSPARENCY | MaterialFlags::IS_DOUBLE_SIDED),
        )
        .unwrap();

    let desc = device.pipelines.values().next().unwrap();
    assert!(desc.instanced);
    assert!(desc.transparent);
    assert!(desc.double_sided);
    assert!(desc.defines.contains(&"INSTANCED".to_string()));
}

// ===== RECORDING =====

struct RecordFixture {
    device: Arc<Mutex<MockGraphicsDevice>>,
    resources: ResourceManager,
    cache: PipelineCache,
    mesh: MeshHandle,
    material: MaterialHandle,
}

fn record_fixture() -> RecordFixture {
    let concrete = Arc::new(Mutex::new(MockGraphicsDevice::new()));
    let shared: SharedGraphicsDevice = concrete.clone();
    let mut resources = ResourceManager::new(shared).unwrap();

    let mesh = resources.add_mesh(cuboid(1.0, 1.0, 1.0, Vec2::ONE)).unwrap();
    let material = resources
        .add_material(Material::new(MaterialFeatureSet::default()))
        .unwrap();

    let mut cache = PipelineCache::new();
    {
        let mut device = concrete.lock().unwrap();
        cache
            .compile(&mut *device, &mesh.features, &material.features)
            .unwrap();
    }

    RecordFixture {
        device: concrete,
        resources,
        cache,
        mesh,
        material,
    }
}

#[test]
fn test_record_default_node() {
    let fixture = record_fixture();
    let mut device = fixture.device.lock().unwrap();
    device.calls.clear();

    let node = RenderNode::Default {
        mesh: fixture.mesh.clone(),
        material: fixture.material,
        model_matrix: Mat4::IDENTITY,
    };

    let pipeline = fixture
        .cache
        .get(&fixture.mesh.features, &fixture.material.features)
        .unwrap();
    let mut bind_state = BindState::default();
    pipeline
        .record(&mut *device, &fixture.resources, &node, &mut bind_state, 0)
        .unwrap();

    let calls = device.calls.clone();
    assert!(calls[0].starts_with("bind_pipeline"));
    assert!(calls[1].starts_with("bind_descriptor_sets"));
    assert!(calls.iter().any(|c| c.starts_with("push_constants")));
    assert_eq!(calls.last().unwrap(), "draw_indexed 36 1");
}

#[test]
fn test_record_skips_redundant_binds() {
    let fixture = record_fixture();
    let mut device = fixture.device.lock().unwrap();
    device.calls.clear();

    let node = RenderNode::Default {
        mesh: fixture.mesh.clone(),
        material: fixture.material,
        model_matrix: Mat4::IDENTITY,
    };

    let pipeline = fixture
        .cache
        .get(&fixture.mesh.features, &fixture.material.features)
        .unwrap();
    let mut bind_state = BindState::default();

    pipeline
        .record(&mut *device, &fixture.resources, &node, &mut bind_state, 0)
        .unwrap();
    pipeline
        .record(&mut *device, &fixture.resources, &node, &mut bind_state, 0)
        .unwrap();

    // Pipeline and descriptor sets are bound exactly once across both draws
    let pipeline_binds = device
        .calls
        .iter()
        .filter(|c| c.starts_with("bind_pipeline"))
        .count();
    let set_binds = device
        .calls
        .iter()
        .filter(|c| c.starts_with("bind_descriptor_sets"))
        .count();
    let draws = device
        .calls
        .iter()
        .filter(|c| c.starts_with("draw_indexed"))
        .count();

    assert_eq!(pipeline_binds, 1);
    assert_eq!(set_binds, 1);
    assert_eq!(draws, 2);
}

#[test]
fn test_record_instanced_node_draws_staged_count() {
    let concrete = Arc::new(Mutex::new(MockGraphicsDevice::new()));
    let shared: SharedGraphicsDevice = concrete.clone();
    let mut resources = ResourceManager::new(shared).unwrap();

    let mut mesh_data = cuboid(1.0, 1.0, 1.0, Vec2::ONE);
    mesh_data.feature_set.flags |= MeshFlags::IS_INSTANCED;
    mesh_data.max_instances = 8;
    let mesh = resources.add_mesh(mesh_data).unwrap();
    let material = resources
        .add_material(Material::new(MaterialFeatureSet::default()))
        .unwrap();

    resources
        .update_mesh_instances(mesh.id, &[Mat4::IDENTITY; 3])
        .unwrap();

    let mut cache = PipelineCache::new();
    {
        let mut device = concrete.lock().unwrap();
        cache
            .compile(&mut *device, &mesh.features, &material.features)
            .unwrap();
    }

    let node = RenderNode::Instanced {
        mesh: mesh.clone(),
        material,
        instances: vec![Mat4::IDENTITY; 3],
    };

    let mut device = concrete.lock().unwrap();
    device.calls.clear();

    let pipeline = cache.get(&mesh.features, &material.features).unwrap();
    let mut bind_state = BindState::default();
    pipeline
        .record(&mut *device, &resources, &node, &mut bind_state, 0)
        .unwrap();

    assert!(device.calls.iter().any(|c| c.starts_with("bind_instance_buffer")));
    assert_eq!(device.calls.last().unwrap(), "draw_indexed 36 3");
}
