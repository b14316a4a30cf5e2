use std::sync::Arc;

use super::model::{Graph, GraphPayload, identity_key};

#[derive(Debug, Default)]
pub struct GraphModel {
    current: Option<Arc<Graph>>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Arc<Graph>> {
        self.current.as_ref()
    }

    /// Returns the existing graph when the payload carries the same node-id set,
    /// otherwise builds and stores a new one.
    pub fn reconcile(&mut self, payload: GraphPayload) -> Arc<Graph> {
        let key = identity_key(
            payload
                .nodes
                .iter()
                .map(|node| node.id.as_str())
                .filter(|id| !id.is_empty()),
        );

        if let Some(current) = &self.current
            && current.key() == key
        {
            tracing::debug!(nodes = current.node_count(), "payload matches current graph");
            return Arc::clone(current);
        }

        let graph = Arc::new(Graph::from_payload(payload));
        if graph.dropped_edges() > 0 {
            tracing::debug!(
                dropped = graph.dropped_edges(),
                "dropped edges referencing unknown nodes"
            );
        }
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph replaced"
        );

        self.current = Some(Arc::clone(&graph));
        graph
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
