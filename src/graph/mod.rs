mod model;
mod reconcile;
mod source;

pub use model::{Graph, GraphNode, NodeKind};
pub use reconcile::GraphModel;
pub use source::{FetchOutcome, GraphQuery, GraphSource, JsonFileSource, SourceError, request_graph};

#[cfg(test)]
pub(crate) use model::{GraphPayload, fixtures};
