use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::model::{GraphPayload, NodeKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphQuery {
    pub center_node_id: Option<String>,
    pub allowed_kinds: BTreeSet<NodeKind>,
    pub max_nodes: usize,
}

impl GraphQuery {
    pub fn new(max_nodes: usize) -> Self {
        Self {
            center_node_id: None,
            allowed_kinds: NodeKind::ALL.into_iter().collect(),
            max_nodes,
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read graph data from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid graph JSON in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("center node `{0}` does not exist")]
    UnknownCenter(String),
}

pub trait GraphSource: Send + Sync {
    fn fetch(&self, query: &GraphQuery) -> Result<GraphPayload, SourceError>;

    fn describe(&self) -> String;
}

#[derive(Debug)]
pub enum FetchOutcome {
    NoTypesSelected,
    Empty,
    Loaded(GraphPayload),
}

pub fn request_graph(
    source: &dyn GraphSource,
    query: &GraphQuery,
) -> Result<FetchOutcome, SourceError> {
    if query.allowed_kinds.is_empty() {
        return Ok(FetchOutcome::NoTypesSelected);
    }

    let payload = source.fetch(query)?;
    if payload.nodes.is_empty() {
        Ok(FetchOutcome::Empty)
    } else {
        Ok(FetchOutcome::Loaded(payload))
    }
}

/// Reads a `{nodes, edges}` dataset from disk on every fetch.
///
/// A focused query always returns its center node, even when the center's
/// kind is filtered out; every other node must match `allowed_kinds`.
#[derive(Clone, Debug)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_dataset(&self) -> Result<GraphPayload, SourceError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| SourceError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl GraphSource for JsonFileSource {
    fn fetch(&self, query: &GraphQuery) -> Result<GraphPayload, SourceError> {
        let dataset = self.read_dataset()?;
        select_subgraph(dataset, query)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn select_subgraph(dataset: GraphPayload, query: &GraphQuery) -> Result<GraphPayload, SourceError> {
    let limit = query.max_nodes.max(1);
    let nodes_by_id = dataset
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), node))
        .collect::<HashMap<_, _>>();

    let allowed = dataset
        .nodes
        .iter()
        .filter(|node| query.allowed_kinds.contains(&node.kind))
        .map(|node| node.id.as_str())
        .collect::<HashSet<_>>();

    let mut neighbors: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut total_edges = 0usize;
    for edge in &dataset.edges {
        let (source, target) = (edge.source_id.as_str(), edge.target_id.as_str());
        neighbors.entry(source).or_default().push(target);
        neighbors.entry(target).or_default().push(source);
        if allowed.contains(source) && allowed.contains(target) {
            total_edges += 1;
        }
    }

    let selected: Vec<&str> = match query.center_node_id.as_deref() {
        Some(center) => {
            if !nodes_by_id.contains_key(center) {
                return Err(SourceError::UnknownCenter(center.to_owned()));
            }
            breadth_first(center, &neighbors, &allowed, limit)
        }
        None => {
            let mut ranked = allowed.iter().copied().collect::<Vec<_>>();
            ranked.sort_by(|a, b| {
                let degree_a = neighbors.get(a).map_or(0, Vec::len);
                let degree_b = neighbors.get(b).map_or(0, Vec::len);
                degree_b.cmp(&degree_a).then_with(|| a.cmp(b))
            });
            ranked.truncate(limit);
            ranked
        }
    };

    let selected_set = selected.iter().copied().collect::<HashSet<_>>();
    let nodes = selected
        .iter()
        .filter_map(|id| nodes_by_id.get(id).map(|node| (*node).clone()))
        .collect::<Vec<_>>();
    let edges = dataset
        .edges
        .iter()
        .filter(|edge| {
            selected_set.contains(edge.source_id.as_str())
                || selected_set.contains(edge.target_id.as_str())
        })
        .cloned()
        .collect::<Vec<_>>();

    Ok(GraphPayload {
        total_nodes: allowed.len().max(nodes.len()),
        total_edges,
        nodes,
        edges,
    })
}

fn breadth_first<'a>(
    center: &'a str,
    neighbors: &HashMap<&'a str, Vec<&'a str>>,
    allowed: &HashSet<&'a str>,
    limit: usize,
) -> Vec<&'a str> {
    let mut order = vec![center];
    let mut visited = HashSet::from([center]);
    let mut queue = VecDeque::from([center]);

    while let Some(current) = queue.pop_front() {
        let Some(next_ids) = neighbors.get(current) else {
            continue;
        };

        for &next in next_ids {
            if order.len() >= limit {
                return order;
            }
            if allowed.contains(next) && visited.insert(next) {
                order.push(next);
                queue.push_back(next);
            }
        }
    }

    order
}
