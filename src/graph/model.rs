use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    Content,
    Concept,
    Note,
}

impl NodeKind {
    pub const ALL: [Self; 3] = [Self::Content, Self::Concept, Self::Note];

    pub fn label(self) -> &'static str {
        match self {
            Self::Content => "Content",
            Self::Concept => "Concept",
            Self::Note => "Note",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub content_subtype: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEdge {
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub relation_type: String,
    #[serde(default)]
    pub strength: Option<f32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPayload {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
    #[serde(default)]
    pub total_nodes: usize,
    #[serde(default)]
    pub total_edges: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub content_subtype: Option<String>,
}

impl GraphNode {
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
    pub source: usize,
    pub target: usize,
    pub relation: String,
    pub strength: Option<f32>,
}

#[derive(Debug)]
pub struct Graph {
    key: String,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    index_by_id: HashMap<String, usize>,
    adjacency: Vec<Vec<(usize, usize)>>,
    total_nodes: usize,
    total_edges: usize,
    dropped_edges: usize,
}

impl Graph {
    pub fn from_payload(payload: GraphPayload) -> Self {
        let mut nodes = Vec::with_capacity(payload.nodes.len());
        let mut index_by_id = HashMap::with_capacity(payload.nodes.len());

        for raw in payload.nodes {
            if raw.id.is_empty() || index_by_id.contains_key(&raw.id) {
                continue;
            }

            index_by_id.insert(raw.id.clone(), nodes.len());
            nodes.push(GraphNode {
                id: raw.id,
                kind: raw.kind,
                label: raw.label,
                content_subtype: raw.content_subtype.filter(|value| !value.is_empty()),
            });
        }

        let raw_edge_count = payload.edges.len();
        let mut edges: Vec<GraphEdge> = Vec::with_capacity(raw_edge_count);
        let mut seen = std::collections::HashSet::new();
        let mut dropped_edges = 0usize;
        for raw in payload.edges {
            let (Some(&source), Some(&target)) =
                (index_by_id.get(&raw.source_id), index_by_id.get(&raw.target_id))
            else {
                dropped_edges += 1;
                continue;
            };

            if source == target || !seen.insert((source, target, raw.relation_type.clone())) {
                continue;
            }

            edges.push(GraphEdge {
                source,
                target,
                relation: raw.relation_type,
                strength: raw.strength.filter(|value| value.is_finite()),
            });
        }

        let mut adjacency = vec![Vec::new(); nodes.len()];
        for (edge_index, edge) in edges.iter().enumerate() {
            adjacency[edge.source].push((edge.target, edge_index));
            adjacency[edge.target].push((edge.source, edge_index));
        }

        let key = identity_key(nodes.iter().map(|node| node.id.as_str()));

        Self {
            key,
            total_nodes: payload.total_nodes.max(nodes.len()),
            total_edges: payload.total_edges.max(edges.len()),
            nodes,
            edges,
            index_by_id,
            adjacency,
            dropped_edges,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, index: usize) -> Option<&GraphNode> {
        self.nodes.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn neighbors(&self, index: usize) -> &[(usize, usize)] {
        self.adjacency.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn degree(&self, index: usize) -> usize {
        self.neighbors(index).len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn total_nodes(&self) -> usize {
        self.total_nodes
    }

    pub fn total_edges(&self) -> usize {
        self.total_edges
    }

    pub fn dropped_edges(&self) -> usize {
        self.dropped_edges
    }
}

/// Sorted, comma-joined, deduplicated node ids.
pub fn identity_key<'a>(ids: impl IntoIterator<Item = &'a str>) -> String {
    let mut ids = ids.into_iter().collect::<Vec<_>>();
    ids.sort_unstable();
    ids.dedup();
    ids.join(",")
}
