use std::collections::HashSet;
use std::sync::Arc;

use crate::graph::Graph;

mod collect;
mod finder;
mod matching;

pub(in crate::app) use self::collect::connected_neighborhood;
pub(in crate::app) use self::finder::rank_nodes;
pub(in crate::app) use self::matching::match_score;
use self::matching::passes_threshold;

/// Search query plus the node indices it highlights; `None` when no search is active.
#[derive(Clone, Debug, Default, PartialEq)]
pub(in crate::app) struct HighlightState {
    pub(in crate::app) query: String,
    pub(in crate::app) highlighted: Option<Arc<HashSet<usize>>>,
}

impl HighlightState {
    pub(in crate::app) fn is_active(&self) -> bool {
        self.highlighted.is_some()
    }

    pub(in crate::app) fn contains(&self, index: usize) -> bool {
        self.highlighted
            .as_ref()
            .is_some_and(|highlighted| highlighted.contains(&index))
    }
}

/// Nodes whose label, or half-weighted type name, scores above the threshold.
///
/// Returns `None` for a blank query and for a query nothing matches.
pub(in crate::app) fn highlight(graph: &Graph, query: &str) -> Option<HashSet<usize>> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    let matches = graph
        .nodes()
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let label_score = match_score(&node.label, query);
            let type_score = match_score(node.kind.label(), query) * 0.5;
            passes_threshold(label_score, type_score).then_some(index)
        })
        .collect::<HashSet<_>>();

    if matches.is_empty() {
        None
    } else {
        Some(matches)
    }
}

#[derive(Default)]
pub(in crate::app) struct HighlightCache {
    graph: Option<Arc<Graph>>,
    state: HighlightState,
}

impl HighlightCache {
    pub(in crate::app) fn resolve(&mut self, graph: &Arc<Graph>, query: &str) -> &HighlightState {
        let query = query.trim();
        let fresh = self
            .graph
            .as_ref()
            .is_some_and(|cached| Arc::ptr_eq(cached, graph))
            && self.state.query == query;

        if !fresh {
            let highlighted = highlight(graph, query).map(Arc::new);
            if let Some(matches) = &highlighted {
                tracing::debug!(query, matches = matches.len(), "search highlight updated");
            }
            self.graph = Some(Arc::clone(graph));
            self.state = HighlightState {
                query: query.to_owned(),
                highlighted,
            };
        }

        &self.state
    }
}
