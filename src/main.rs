mod app;
mod config;
mod graph;
mod util;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::ViewerConfig;
use crate::graph::{GraphQuery, JsonFileSource};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON dataset with `nodes` and `edges`.
    #[arg(long, default_value = "data/sample_graph.json")]
    graph: PathBuf,

    /// Viewer settings; every field is optional.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides `max_nodes` from the config file.
    #[arg(long)]
    max_nodes: Option<usize>,

    /// Start focused on the neighborhood of this node id.
    #[arg(long)]
    center: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,knowgraph=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(max_nodes) = args.max_nodes {
        config.max_nodes.0 = max_nodes;
        config.validate().context("invalid --max-nodes")?;
    }

    if !args.graph.is_file() {
        bail!("graph dataset {} does not exist", args.graph.display());
    }

    let mut query = GraphQuery::new(config.max_nodes.0);
    query.center_node_id = args.center;
    let source = Arc::new(JsonFileSource::new(args.graph));
    tracing::info!(
        graph = %source.path().display(),
        max_nodes = query.max_nodes,
        "starting viewer"
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "knowgraph",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::KnowledgeGraphApp::new(
                cc, source, config, query,
            )))
        }),
    )
    .map_err(|error| anyhow::anyhow!("viewer exited with an error: {error}"))
}
