use std::collections::HashSet;

use crate::graph::Graph;

pub(in crate::app) fn connected_neighborhood(
    graph: &Graph,
    selected: usize,
) -> (HashSet<usize>, HashSet<usize>) {
    let mut nodes = HashSet::new();
    let mut edges = HashSet::new();
    if selected >= graph.node_count() {
        return (nodes, edges);
    }

    nodes.insert(selected);
    for &(neighbor, edge_index) in graph.neighbors(selected) {
        nodes.insert(neighbor);
        edges.insert(edge_index);
    }

    (nodes, edges)
}
