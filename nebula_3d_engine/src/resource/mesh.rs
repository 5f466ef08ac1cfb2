//! Mesh resources: vertex attributes, feature sets and mesh data.
//!
//! A mesh stores one buffer per vertex attribute plus a u16 index buffer.
//! The attribute order is canonical (`Position < Normal < TexCoord <
//! Tangent < JointIndices < JointWeights`); interleaved vertex records pack
//! attributes in exactly this order, and pipelines derive their vertex
//! input layout from it.

use bitflags::bitflags;
use bytemuck::Pod;
use glam::{Mat4, Vec2, Vec3};
use crate::error::{Error, Result};
use super::RenderItemId;

/// A vertex attribute semantic, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VertexAttribute {
    Position,
    Normal,
    TexCoord,
    Tangent,
    JointIndices,
    JointWeights,
}

impl VertexAttribute {
    /// Size in bytes of one element of this attribute
    pub fn size_bytes(&self) -> usize {
        match self {
            VertexAttribute::Position => std::mem::size_of::<Vec3>(),
            VertexAttribute::Normal => std::mem::size_of::<Vec3>(),
            VertexAttribute::TexCoord => std::mem::size_of::<Vec2>(),
            VertexAttribute::Tangent => std::mem::size_of::<Vec3>(),
            VertexAttribute::JointIndices => 4 * std::mem::size_of::<u8>(),
            VertexAttribute::JointWeights => 4 * std::mem::size_of::<f32>(),
        }
    }
}

/// Ordered list of the attributes a mesh provides
pub type VertexLayout = Vec<VertexAttribute>;

/// Copy typed elements into a raw byte buffer
pub fn to_bytes<T: Pod>(data: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(data).to_vec()
}

/// Reinterpret a raw byte buffer as typed elements
///
/// Returns owned values so callers are independent of the buffer's
/// alignment. The buffer length must be a multiple of the element size.
pub fn from_bytes<T: Pod>(data: &[u8]) -> Vec<T> {
    debug_assert!(
        data.len() % std::mem::size_of::<T>() == 0,
        "buffer of {} bytes does not divide into {}-byte elements",
        data.len(),
        std::mem::size_of::<T>()
    );

    data.chunks_exact(std::mem::size_of::<T>())
        .map(bytemuck::pod_read_unaligned)
        .collect()
}

bitflags! {
    /// Mesh capabilities that select a shader variant
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MeshFlags: u32 {
        const IS_INSTANCED = 1 << 0;
        const IS_SKYBOX    = 1 << 1;
        const IS_ANIMATED  = 1 << 2;
        const HAS_TANGENTS = 1 << 3;
        const CASTS_SHADOW = 1 << 4;
    }
}

/// Vertex layout plus capability flags; one half of a pipeline key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MeshFeatureSet {
    pub vertex_layout: VertexLayout,
    pub flags: MeshFlags,
}

/// One attribute's worth of raw vertex data
#[derive(Debug, Clone)]
pub struct AttributeBuffer {
    pub attribute: VertexAttribute,
    pub data: Vec<u8>,
}

impl AttributeBuffer {
    /// Build from a typed slice
    pub fn from_slice<T: Pod>(attribute: VertexAttribute, data: &[T]) -> Self {
        Self {
            attribute,
            data: to_bytes(data),
        }
    }

    /// Number of vertices this buffer covers
    pub fn element_count(&self) -> usize {
        self.data.len() / self.attribute.size_bytes()
    }
}

/// CPU-side mesh description handed to the resource store
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub feature_set: MeshFeatureSet,
    /// Baked local transform, composed into every staged world transform
    pub transform: Mat4,
    /// One buffer per attribute in `feature_set.vertex_layout`
    pub attribute_buffers: Vec<AttributeBuffer>,
    /// u16 indices
    pub index_data: Vec<u16>,
    /// Instance buffer capacity for instanced meshes
    pub max_instances: u32,
}

impl Mesh {
    pub fn new(feature_set: MeshFeatureSet) -> Self {
        Self {
            feature_set,
            transform: Mat4::IDENTITY,
            ..Default::default()
        }
    }

    /// Vertex count, taken from the first attribute buffer
    pub fn vertex_count(&self) -> usize {
        self.attribute_buffers
            .first()
            .map_or(0, AttributeBuffer::element_count)
    }
}

/// Cheap reference to a mesh owned by the resource store
#[derive(Debug, Clone)]
pub struct MeshHandle {
    pub id: RenderItemId,
    pub features: MeshFeatureSet,
    pub transform: Mat4,
}

/// Size in bytes of one interleaved vertex record
pub fn vertex_size(layout: &VertexLayout) -> usize {
    layout.iter().map(VertexAttribute::size_bytes).sum()
}

/// Byte offset of an attribute within an interleaved vertex record
///
/// Offsets follow the canonical attribute order regardless of the order the
/// buffers are supplied in.
pub fn offset_in_vertex(layout: &VertexLayout, attribute: VertexAttribute) -> usize {
    layout
        .iter()
        .filter(|a| **a < attribute)
        .map(|a| a.size_bytes())
        .sum()
}

/// Interleave a mesh's attribute buffers into a single vertex array
///
/// # Errors
///
/// `InvalidResource` if the mesh has no attribute buffers or the buffers
/// disagree on vertex count.
pub fn interleave_vertex_data(mesh: &Mesh) -> Result<Vec<u8>> {
    if mesh.attribute_buffers.is_empty() {
        return Err(Error::InvalidResource(
            "mesh has no attribute buffers".to_string(),
        ));
    }

    let num_vertices = mesh.attribute_buffers[0].element_count();
    let stride = vertex_size(&mesh.feature_set.vertex_layout);

    for buffer in &mesh.attribute_buffers {
        if buffer.element_count() != num_vertices {
            return Err(Error::InvalidResource(format!(
                "attribute buffer {:?} has {} elements, expected {}",
                buffer.attribute,
                buffer.element_count(),
                num_vertices
            )));
        }
    }

    let mut array = vec![0u8; num_vertices * stride];

    for buffer in &mesh.attribute_buffers {
        let attr_size = buffer.attribute.size_bytes();
        let offset = offset_in_vertex(&mesh.feature_set.vertex_layout, buffer.attribute);

        for i in 0..num_vertices {
            let src = &buffer.data[i * attr_size..(i + 1) * attr_size];
            let dest_start = i * stride + offset;
            array[dest_start..dest_start + attr_size].copy_from_slice(src);
        }
    }

    Ok(array)
}

/// Axis-aligned cuboid mesh with per-face normals and texture coordinates
///
/// Texture coordinates are scaled so `texture_size` world units map to one
/// repeat of the texture.
pub fn cuboid(width: f32, height: f32, depth: f32, texture_size: Vec2) -> Mesh {
    let w = width / 2.0;
    let h = height / 2.0;
    let d = depth / 2.0;

    let u = texture_size.x;
    let v = texture_size.y;

    let mut mesh = Mesh::new(MeshFeatureSet {
        vertex_layout: vec![
            VertexAttribute::Position,
            VertexAttribute::Normal,
            VertexAttribute::TexCoord,
        ],
        flags: MeshFlags::default(),
    });

    let positions: Vec<Vec3> = vec![
        // Bottom face
        Vec3::new(-w, -h, -d),
        Vec3::new(w, -h, -d),
        Vec3::new(w, -h, d),
        Vec3::new(-w, -h, d),
        // Top face
        Vec3::new(-w, h, d),
        Vec3::new(w, h, d),
        Vec3::new(w, h, -d),
        Vec3::new(-w, h, -d),
        // Right face
        Vec3::new(w, -h, d),
        Vec3::new(w, -h, -d),
        Vec3::new(w, h, -d),
        Vec3::new(w, h, d),
        // Left face
        Vec3::new(-w, -h, -d),
        Vec3::new(-w, -h, d),
        Vec3::new(-w, h, d),
        Vec3::new(-w, h, -d),
        // Far face
        Vec3::new(-w, -h, -d),
        Vec3::new(-w, h, -d),
        Vec3::new(w, h, -d),
        Vec3::new(w, -h, -d),
        // Near face
        Vec3::new(-w, -h, d),
        Vec3::new(w, -h, d),
        Vec3::new(w, h, d),
        Vec3::new(-w, h, d),
    ];

    let normals: Vec<Vec3> = [
        Vec3::NEG_Y,
        Vec3::Y,
        Vec3::X,
        Vec3::NEG_X,
        Vec3::NEG_Z,
        Vec3::Z,
    ]
    .iter()
    .flat_map(|&n| std::iter::repeat(n).take(4))
    .collect();

    let tex_coords: Vec<Vec2> = vec![
        // Bottom face
        Vec2::new(0.0, 0.0),
        Vec2::new(width / u, 0.0),
        Vec2::new(width / u, depth / v),
        Vec2::new(0.0, depth / v),
        // Top face
        Vec2::new(0.0, depth / v),
        Vec2::new(width / u, depth / v),
        Vec2::new(width / u, 0.0),
        Vec2::new(0.0, 0.0),
        // Right face
        Vec2::new(depth / u, 0.0),
        Vec2::new(0.0, 0.0),
        Vec2::new(0.0, height / v),
        Vec2::new(depth / u, height / v),
        // Left face
        Vec2::new(0.0, 0.0),
        Vec2::new(depth / u, 0.0),
        Vec2::new(depth / u, height / v),
        Vec2::new(0.0, height / v),
        // Far face
        Vec2::new(0.0, 0.0),
        Vec2::new(0.0, height / v),
        Vec2::new(width / u, height / v),
        Vec2::new(width / u, 0.0),
        // Near face
        Vec2::new(0.0, 0.0),
        Vec2::new(width / u, 0.0),
        Vec2::new(width / u, height / v),
        Vec2::new(0.0, height / v),
    ];

    mesh.attribute_buffers = vec![
        AttributeBuffer::from_slice(VertexAttribute::Position, &positions),
        AttributeBuffer::from_slice(VertexAttribute::Normal, &normals),
        AttributeBuffer::from_slice(VertexAttribute::TexCoord, &tex_coords),
    ];

    mesh.index_data = vec![
        0, 1, 2, 0, 2, 3, // Bottom face
        4, 5, 6, 4, 6, 7, // Top face
        8, 9, 10, 8, 10, 11, // Right face
        12, 13, 14, 12, 14, 15, // Left face
        16, 17, 18, 16, 18, 19, // Far face
        20, 21, 22, 20, 22, 23, // Near face
    ];

    mesh
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
