/// Tests for the render graph

use super::*;
use glam::Mat4;
use crate::resource::{MaterialFeatureSet, MaterialHandle, MeshFeatureSet, MeshHandle};

/// Node whose material id doubles as an insertion label
fn labelled_node(label: i64) -> RenderNode {
    RenderNode::Default {
        mesh: MeshHandle {
            id: 0,
            features: MeshFeatureSet::default(),
            transform: Mat4::IDENTITY,
        },
        material: MaterialHandle {
            id: label,
            features: MaterialFeatureSet::default(),
        },
        model_matrix: Mat4::IDENTITY,
    }
}

fn label(node: &RenderNode) -> i64 {
    node.material().id
}

#[test]
fn test_iteration_is_lexicographic() {
    let mut graph = RenderGraph::new();

    // Labels record insertion order: A=0 .. E=4
    graph.insert(vec![3, 5, 2], labelled_node(0)); // A
    graph.insert(vec![2, 1, 4], labelled_node(1)); // B
    graph.insert(vec![3, 5, 6], labelled_node(2)); // C
    graph.insert(vec![3, 7], labelled_node(3)); // D
    graph.insert(vec![3, 5, 3, 1], labelled_node(4)); // E

    let order: Vec<i64> = graph.iter().map(|(_, node)| label(node)).collect();
    assert_eq!(order, vec![1, 0, 4, 2, 3]); // B, A, E, C, D
}

#[test]
fn test_lookup_missing_key() {
    let mut graph = RenderGraph::new();
    graph.insert(vec![3, 5, 2], labelled_node(0));

    assert!(graph.get(&vec![9, 9]).is_none());
}

#[test]
fn test_lookup_prefix_key_misses() {
    let mut graph = RenderGraph::new();
    graph.insert(vec![3, 5, 2], labelled_node(0));

    // Only complete keys are findable
    assert!(graph.get(&vec![3, 5]).is_none());
    assert!(graph.get(&vec![3]).is_none());
    assert!(graph.get(&vec![3, 5, 2]).is_some());
}

#[test]
fn test_insert_same_key_replaces() {
    let mut graph = RenderGraph::new();
    graph.insert(vec![1, 2], labelled_node(0));
    graph.insert(vec![1, 2], labelled_node(7));

    assert_eq!(graph.len(), 1);
    assert_eq!(label(graph.get(&vec![1, 2]).unwrap()), 7);
}

#[test]
fn test_get_mut_allows_instance_merging() {
    let mut graph = RenderGraph::new();

    let node = RenderNode::Instanced {
        mesh: MeshHandle {
            id: 3,
            features: MeshFeatureSet::default(),
            transform: Mat4::IDENTITY,
        },
        material: MaterialHandle {
            id: 4,
            features: MaterialFeatureSet::default(),
        },
        instances: vec![Mat4::IDENTITY],
    };
    graph.insert(vec![0, 1, 3, 4], node);

    if let Some(RenderNode::Instanced { instances, .. }) = graph.get_mut(&vec![0, 1, 3, 4]) {
        instances.push(Mat4::IDENTITY);
    }

    match graph.get(&vec![0, 1, 3, 4]).unwrap() {
        RenderNode::Instanced { instances, .. } => assert_eq!(instances.len(), 2),
        _ => panic!("expected instanced node"),
    }
}

#[test]
fn test_clear() {
    let mut graph = RenderGraph::new();
    graph.insert(vec![1], labelled_node(0));
    assert!(!graph.is_empty());

    graph.clear();
    assert!(graph.is_empty());
    assert_eq!(graph.len(), 0);
}

#[test]
fn test_opaque_sorts_before_transparent() {
    let mut graph = RenderGraph::new();

    // Keys lead with the transparency flag
    graph.insert(vec![1, 50, 1, 1], labelled_node(0)); // transparent
    graph.insert(vec![0, 99, 2, 2], labelled_node(1)); // opaque, higher pipeline hash

    let order: Vec<i64> = graph.iter().map(|(_, node)| label(node)).collect();
    assert_eq!(order, vec![1, 0]);
}
