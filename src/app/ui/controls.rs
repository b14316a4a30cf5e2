use eframe::egui::{self, Align, Layout, RichText, Ui};

use crate::graph::{GraphQuery, NodeKind};

use super::super::graph::PointerEvent;
use super::super::highlight::rank_nodes;
use super::super::render_utils::kind_color;
use super::super::{ViewModel, ViewerEvent};

const FINDER_ROWS: usize = 8;
const MAX_NODES_RANGE: std::ops::RangeInclusive<usize> = 10..=5000;

impl ViewModel {
    pub(in crate::app) fn draw_controls(
        &mut self,
        ui: &mut Ui,
        query: &mut GraphQuery,
        refetch: &mut bool,
    ) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label(RichText::new("Node types").strong());
        ui.horizontal_wrapped(|ui| {
            for kind in NodeKind::ALL {
                let mut enabled = query.allowed_kinds.contains(&kind);
                let text = RichText::new(kind.label()).color(kind_color(kind));
                if ui.checkbox(&mut enabled, text).changed() {
                    if enabled {
                        query.allowed_kinds.insert(kind);
                    } else {
                        query.allowed_kinds.remove(&kind);
                    }
                    *refetch = true;
                }
            }
        });

        let slider = ui.add(
            egui::Slider::new(&mut query.max_nodes, MAX_NODES_RANGE)
                .logarithmic(true)
                .text("max nodes"),
        );
        if slider.drag_stopped() || (slider.changed() && !slider.dragged()) {
            *refetch = true;
        }

        ui.horizontal(|ui| match &query.center_node_id {
            Some(center) => {
                let label = self
                    .graph()
                    .and_then(|graph| graph.index_of(center).and_then(|index| graph.node(index)))
                    .map_or(center.as_str(), |node| node.display_label());
                ui.label(format!("Focused on: {label}"));
                if ui.small_button("Reset focus").clicked() {
                    self.events.push(ViewerEvent::ResetFocus);
                }
            }
            None => {
                ui.weak("Showing the best-connected nodes");
            }
        });

        ui.separator();
        ui.label(RichText::new("Highlight").strong())
            .on_hover_text("Fuzzy match against node labels and types");
        ui.text_edit_singleline(&mut self.search);
        if let Some(session) = &self.session {
            let state = self.highlight.resolve(session.graph(), &self.search);
            match &state.highlighted {
                Some(matches) => {
                    ui.label(format!("{} highlighted", matches.len()));
                }
                None if !state.query.is_empty() => {
                    ui.weak("No matches");
                }
                None => {}
            }
        }

        ui.separator();
        self.draw_finder(ui);

        ui.separator();
        self.draw_layout_controls(ui);
    }

    fn draw_finder(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Jump to node").strong());
        ui.text_edit_singleline(&mut self.finder_query);

        let Some(graph) = self.graph().cloned() else {
            return;
        };

        let selected = self.interaction.selection.selected_index;
        for (index, _score) in rank_nodes(&graph, &self.finder_query, FINDER_ROWS) {
            let Some(node) = graph.node(index) else {
                continue;
            };

            ui.horizontal(|ui| {
                let is_selected = selected == Some(index);
                if ui
                    .selectable_label(is_selected, node.display_label())
                    .on_hover_text(node.id.as_str())
                    .clicked()
                    && !is_selected
                {
                    self.interaction.queue(PointerEvent::NodeClick(index));
                }
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.small_button("Focus").clicked() {
                        self.events.push(ViewerEvent::FocusRequested(node.id.clone()));
                    }
                });
            });
        }
    }

    fn draw_layout_controls(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Layout").strong());

        if let Some(session) = &self.session {
            let state = session.simulator().state();
            ui.label(format!(
                "{}  |  tick {}  |  alpha {:.3}",
                state.phase.label(),
                state.tick_count,
                state.alpha
            ));
            let pinned = session.simulator().pinned_count();
            if pinned > 0 {
                ui.label(format!("{pinned} pinned"));
            }
        }

        ui.horizontal(|ui| {
            let reorganize = ui
                .add_enabled(self.session.is_some(), egui::Button::new("Reorganize"))
                .on_hover_text("Release pinned nodes and run the layout again");
            if reorganize.clicked() {
                self.interaction.queue(PointerEvent::Reorganize);
            }
        });

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            if ui.button("−").on_hover_text("Zoom out").clicked() {
                self.interaction.camera.zoom_out(egui::Vec2::ZERO);
                self.note_camera_moved();
            }
            ui.label(format!("{:.0}%", self.interaction.camera.zoom() * 100.0));
            if ui.button("+").on_hover_text("Zoom in").clicked() {
                self.interaction.camera.zoom_in(egui::Vec2::ZERO);
                self.note_camera_moved();
            }
            if ui.button("Reset view").clicked() {
                self.interaction.camera.reset();
                self.note_camera_moved();
            }
            if ui.button("Fit").clicked() {
                self.fit_camera();
            }
        });
    }

    fn note_camera_moved(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.note_camera_moved();
        }
    }

    fn fit_camera(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        if let (Some(bounds), Some(size)) = (session.simulator().bounds(), session.viewport_size()) {
            self.interaction.camera.fit(bounds, size);
        }
    }
}
