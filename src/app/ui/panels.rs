use eframe::egui::{self, Align, Context, Layout, Ui};

use crate::config::ViewerConfig;
use crate::graph::GraphQuery;
use crate::util::plural;

use super::super::graph::InteractionController;
use super::super::highlight::HighlightCache;
use super::super::{AppState, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(config: ViewerConfig, source_name: String) -> Self {
        let interaction = InteractionController::new(config.camera.clone());
        Self {
            config,
            source_name,
            session: None,
            interaction,
            highlight: HighlightCache::default(),
            search: String::new(),
            finder_query: String::new(),
            events: Vec::new(),
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        state: &AppState,
        query: &mut GraphQuery,
        refetch: &mut bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("knowgraph");
                    ui.separator();
                    ui.label(format!("source: {}", self.source_name));
                    if let Some(graph) = self.graph() {
                        ui.label(format!(
                            "showing {} of {}",
                            plural(graph.node_count(), "node"),
                            graph.total_nodes()
                        ));
                        ui.label(format!(
                            "{} of {}",
                            plural(graph.edge_count(), "edge"),
                            graph.total_edges()
                        ));
                    }
                    let reload_button =
                        ui.add_enabled(!state.is_loading(), egui::Button::new("Reload"));
                    if reload_button.clicked() {
                        *refetch = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if state.is_loading() {
                            ui.spinner();
                        }
                        if let Some(session) = &self.session {
                            ui.label(format!("layout: {}", session.simulator().phase().label()));
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_controls(ui, query, refetch));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_details(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| match state {
            AppState::Loading { .. } if self.session.is_none() => {
                centered_message(ui, "Loading knowledge graph...", |ui| {
                    ui.spinner();
                });
            }
            AppState::Loading { .. } | AppState::Ready => self.draw_graph(ui),
            AppState::NoTypesSelected => {
                centered_message(ui, "No node types selected", |ui| {
                    ui.label("Enable at least one type on the left to load the graph.");
                });
            }
            AppState::Empty => {
                centered_message(ui, "Nothing to show", |ui| {
                    ui.label("The graph has no nodes for the current filters.");
                });
            }
            AppState::Error(error) => {
                centered_message(ui, "Failed to load the knowledge graph", |ui| {
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        *refetch = true;
                    }
                });
            }
        });
    }
}

fn centered_message(ui: &mut Ui, heading: &str, body: impl FnOnce(&mut Ui)) {
    ui.vertical_centered(|ui| {
        ui.add_space(120.0);
        ui.heading(heading);
        ui.add_space(8.0);
        body(ui);
    });
}
