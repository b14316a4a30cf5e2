use eframe::egui::{Align, Layout, RichText, Ui};

use crate::util::plural;

use super::super::graph::PointerEvent;
use super::super::render_utils::kind_color;
use super::super::{ViewModel, ViewerEvent};

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(graph) = self.graph().cloned() else {
            ui.label("No graph loaded.");
            return;
        };

        let Some(index) = self.interaction.selection.selected_index else {
            ui.label("Click a node to see its connections.");
            if graph.dropped_edges() > 0 {
                ui.add_space(6.0);
                ui.weak(format!(
                    "{} outside the loaded graph were skipped.",
                    plural(graph.dropped_edges(), "edge")
                ));
            }
            return;
        };

        let Some(node) = graph.node(index) else {
            ui.label("Selected node no longer exists in the graph.");
            return;
        };

        ui.label(RichText::new(node.display_label()).strong().size(16.0));
        ui.small(node.id.as_str());
        ui.add_space(6.0);

        ui.label(RichText::new(node.kind.label()).color(kind_color(node.kind)));
        if let Some(subtype) = &node.content_subtype {
            ui.label(format!("Subtype: {subtype}"));
        }
        ui.label(format!("Connections: {}", graph.degree(index)));

        ui.horizontal(|ui| {
            if ui.button("Focus on this node").clicked() {
                self.events.push(ViewerEvent::FocusRequested(node.id.clone()));
            }
            if ui.button("Clear selection").clicked() {
                self.interaction.queue(PointerEvent::BackgroundClick);
            }
        });

        ui.separator();
        ui.label(RichText::new("Connected nodes").strong());

        let mut neighbors = graph
            .neighbors(index)
            .iter()
            .filter_map(|&(neighbor, edge_index)| {
                let other = graph.node(neighbor)?;
                let edge = graph.edges().get(edge_index)?;
                let outgoing = edge.source == index;
                Some((neighbor, other, edge.relation.as_str(), outgoing))
            })
            .collect::<Vec<_>>();
        neighbors.sort_by(|a, b| a.1.display_label().cmp(b.1.display_label()));

        if neighbors.is_empty() {
            ui.weak("This node has no connections in the loaded graph.");
        }

        for (neighbor, other, relation, outgoing) in neighbors {
            ui.horizontal(|ui| {
                let arrow = if outgoing { "→" } else { "←" };
                ui.label(RichText::new(arrow).weak());
                if ui
                    .selectable_label(false, other.display_label())
                    .on_hover_text(other.id.as_str())
                    .clicked()
                {
                    self.interaction.queue(PointerEvent::NodeClick(neighbor));
                }
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    ui.weak(relation);
                });
            });
        }
    }
}
