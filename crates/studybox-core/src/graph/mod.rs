//! Mind-map Graph Builder.
//!
//! The graph is derived state: it is rebuilt from the full accumulated edge
//! list every time that list changes. Node ids are the normalized label, so a
//! label always maps to the same node across rebuilds and merges. Edge ids are
//! positional (`e0`, `e1`, ...) and only stable within one build.

mod layout;

pub use layout::layout;

use crate::bundle::MindMapEdge;
use crate::config::LayoutConfig;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Normalizes a label into a node id: trimmed, whitespace runs collapsed to
/// one space, lowercased.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    /// Display label as first seen.
    pub label: String,
    /// Order of first appearance.
    pub index: usize,
    pub is_root: bool,
    pub rank: usize,
    /// Top-left corner of the node footprint.
    pub position: Position,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub animated: bool,
}

/// A renderable, deduplicated, positioned mind map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MindMapGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl MindMapGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_for_label(&self, label: &str) -> Option<&GraphNode> {
        self.node(&normalize_label(label))
    }

    pub fn root(&self) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.is_root)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Builds the graph for `edges` from scratch.
///
/// Produces one node per distinct normalized label and one edge per input
/// edge, then lays the nodes out top to bottom.
pub fn build(edges: &[MindMapEdge], config: &LayoutConfig) -> MindMapGraph {
    let mut ids: Vec<String> = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    let mut index_of: HashMap<String, usize> = HashMap::new();

    let mut intern = |label: &str| -> usize {
        let id = normalize_label(label);
        if let Some(&index) = index_of.get(&id) {
            return index;
        }
        let index = ids.len();
        index_of.insert(id.clone(), index);
        ids.push(id);
        labels.push(label.split_whitespace().collect::<Vec<_>>().join(" "));
        index
    };

    let links: Vec<(usize, usize)> = edges
        .iter()
        .map(|edge| (intern(&edge.source), intern(&edge.target)))
        .collect();

    let placed = layout(ids.len(), &links, config);

    let nodes = ids
        .into_iter()
        .zip(labels)
        .zip(placed)
        .enumerate()
        .map(|(index, ((id, label), slot))| GraphNode {
            id,
            label,
            index,
            is_root: index == 0,
            rank: slot.rank,
            position: slot.position,
            width: config.node_width,
            height: config.node_height,
        })
        .collect::<Vec<_>>();

    let edges = links
        .iter()
        .enumerate()
        .map(|(i, &(source, target))| GraphEdge {
            id: format!("e{i}"),
            source: nodes[source].id.clone(),
            target: nodes[target].id.clone(),
            animated: true,
        })
        .collect();

    MindMapGraph { nodes, edges }
}

/// Appends `new_edges` to `existing`, skipping any edge whose normalized
/// (source, target) pair is already present.
pub fn merge_edges(existing: &[MindMapEdge], new_edges: &[MindMapEdge]) -> Vec<MindMapEdge> {
    let key = |edge: &MindMapEdge| (normalize_label(&edge.source), normalize_label(&edge.target));
    let mut seen: HashSet<(String, String)> = existing.iter().map(key).collect();
    let mut merged = existing.to_vec();
    for edge in new_edges {
        if seen.insert(key(edge)) {
            merged.push(edge.clone());
        }
    }
    merged
}

/// Incremental form of [`build`]: merges the edge lists, then rebuilds.
pub fn merge(
    existing: &[MindMapEdge],
    new_edges: &[MindMapEdge],
    config: &LayoutConfig,
) -> MindMapGraph {
    build(&merge_edges(existing, new_edges), config)
}
