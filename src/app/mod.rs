use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Instant;

use eframe::egui::Context;

use crate::config::ViewerConfig;
use crate::graph::{
    FetchOutcome, Graph, GraphModel, GraphNode, GraphQuery, GraphSource, SourceError,
    request_graph,
};

mod graph;
mod highlight;
mod physics;
mod render_utils;
mod session;
mod ui;
mod visual;

use self::graph::InteractionController;
use self::highlight::HighlightCache;
use self::session::LayoutSession;

#[derive(Clone, Debug, PartialEq)]
pub enum ViewerEvent {
    NodeClicked(GraphNode),
    FocusRequested(String),
    ResetFocus,
}

pub struct KnowledgeGraphApp {
    source: Arc<dyn GraphSource>,
    query: GraphQuery,
    model: GraphModel,
    view: ViewModel,
    state: AppState,
}

enum AppState {
    NoTypesSelected,
    Loading {
        rx: Receiver<Result<FetchOutcome, SourceError>>,
    },
    Ready,
    Empty,
    Error(String),
}

impl AppState {
    fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

struct ViewModel {
    config: ViewerConfig,
    source_name: String,
    session: Option<LayoutSession>,
    interaction: InteractionController,
    highlight: HighlightCache,
    search: String,
    finder_query: String,
    events: Vec<ViewerEvent>,
}

impl ViewModel {
    fn graph(&self) -> Option<&Arc<Graph>> {
        self.session.as_ref().map(LayoutSession::graph)
    }

    /// Starts a new layout unless `graph` is the one already shown.
    fn install_graph(&mut self, graph: Arc<Graph>) {
        if self
            .graph()
            .is_some_and(|current| Arc::ptr_eq(current, &graph))
        {
            tracing::debug!("graph unchanged; keeping layout");
            return;
        }

        self.interaction.sync_graph(&graph);
        self.session = Some(LayoutSession::new(graph, &self.config));
    }

    fn clear_graph(&mut self) {
        self.session = None;
    }

    fn advance(&mut self, now: Instant) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        let clicked = self.interaction.apply_pending(session.simulator_mut());
        for index in clicked {
            if let Some(node) = session.graph().node(index) {
                self.events.push(ViewerEvent::NodeClicked(node.clone()));
            }
        }

        session.advance(now)
    }

    fn take_events(&mut self) -> Vec<ViewerEvent> {
        std::mem::take(&mut self.events)
    }
}

impl KnowledgeGraphApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: Arc<dyn GraphSource>,
        config: ViewerConfig,
        query: GraphQuery,
    ) -> Self {
        let view = ViewModel::new(config, source.describe());
        let state = Self::start_fetch(&source, &query);
        Self {
            source,
            query,
            model: GraphModel::new(),
            view,
            state,
        }
    }

    fn start_fetch(source: &Arc<dyn GraphSource>, query: &GraphQuery) -> AppState {
        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(source);
        let query = query.clone();

        tracing::debug!(
            center = query.center_node_id.as_deref().unwrap_or("-"),
            kinds = query.allowed_kinds.len(),
            max_nodes = query.max_nodes,
            "fetching graph"
        );
        thread::spawn(move || {
            let _ = tx.send(request_graph(source.as_ref(), &query));
        });

        AppState::Loading { rx }
    }

    fn apply_outcome(&mut self, outcome: FetchOutcome) -> AppState {
        match outcome {
            FetchOutcome::NoTypesSelected => {
                self.model.clear();
                self.view.clear_graph();
                AppState::NoTypesSelected
            }
            FetchOutcome::Empty => {
                self.model.clear();
                self.view.clear_graph();
                AppState::Empty
            }
            FetchOutcome::Loaded(payload) => {
                let graph = self.model.reconcile(payload);
                self.view.install_graph(graph);
                AppState::Ready
            }
        }
    }

    fn handle_event(&mut self, event: ViewerEvent) -> bool {
        match event {
            ViewerEvent::NodeClicked(node) => {
                tracing::debug!(id = %node.id, kind = %node.kind, "node clicked");
                false
            }
            ViewerEvent::FocusRequested(id) => {
                tracing::info!(%id, "focusing graph on node");
                self.query.center_node_id = Some(id);
                true
            }
            ViewerEvent::ResetFocus => {
                let refetch = self.query.center_node_id.is_some();
                self.query.center_node_id = None;
                refetch
            }
        }
    }
}

impl eframe::App for KnowledgeGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let received = match &self.state {
            AppState::Loading { rx } => Some(rx.try_recv()),
            _ => None,
        };

        match received {
            Some(Ok(Ok(outcome))) => self.state = self.apply_outcome(outcome),
            Some(Ok(Err(error))) => {
                tracing::warn!(%error, "graph fetch failed");
                self.state = AppState::Error(error.to_string());
            }
            Some(Err(TryRecvError::Empty)) => ctx.request_repaint(),
            Some(Err(TryRecvError::Disconnected)) => {
                tracing::warn!("graph fetch worker disconnected");
                self.state = AppState::Error("Background fetch worker disconnected".to_owned());
            }
            None => {}
        }

        let mut refetch = false;
        self.view.show(ctx, &self.state, &mut self.query, &mut refetch);

        for event in self.view.take_events() {
            refetch |= self.handle_event(event);
        }

        if refetch {
            self.state = Self::start_fetch(&self.source, &self.query);
        }
    }
}
