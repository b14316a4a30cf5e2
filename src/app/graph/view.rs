use std::time::Instant;

use eframe::egui::{self, Align2, Color32, FontId, PointerButton, Pos2, Sense, Stroke, Ui, vec2};

use super::super::ViewModel;
use super::super::render_utils::{circle_visible, draw_background, edge_visible};
use super::super::visual::{FrameInputs, NodeVisual, compute_visual_state, drawn_radius};
use super::{PointerEvent, hit_test};

const MIN_HIT_RADIUS: f32 = 6.0;
const GLOW_SCALE: f32 = 1.9;
const LABEL_GAP: f32 = 3.0;
const LINE_SPACING: f32 = 1.15;

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let now = Instant::now();
        let active = self.advance(now);

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        let Some(session) = self.session.as_mut() else {
            draw_background(&painter, rect, egui::Vec2::ZERO, 1.0);
            return;
        };

        session.observe_viewport(rect.size(), now);
        if let Some(bounds) = session.take_fit() {
            self.interaction.camera.fit(bounds, rect.size());
        }

        let camera = &self.interaction.camera;
        let zoom = camera.zoom();
        let style = &self.config.style;
        let selection = &self.interaction.selection;
        let highlight = self.highlight.resolve(session.graph(), &self.search);
        let pointer = ui.input(|input| input.pointer.hover_pos());
        let hovered = pointer.filter(|_| response.hovered()).and_then(|pointer| {
            hit_test(session.simulator(), camera, rect, pointer, |index| {
                (drawn_radius(style, selection, highlight, index) * zoom).max(MIN_HIT_RADIUS)
            })
        });

        let mut camera_moved = false;
        if response.drag_started_by(PointerButton::Primary)
            && let Some(index) = hovered
        {
            self.interaction.queue(PointerEvent::DragStart(index));
        }

        let node_drag = self.interaction.dragging().or_else(|| {
            response
                .drag_started_by(PointerButton::Primary)
                .then_some(hovered)
                .flatten()
        });
        if response.dragged_by(PointerButton::Primary) {
            match (node_drag, response.interact_pointer_pos()) {
                (Some(index), Some(pointer)) => {
                    let world = self.interaction.camera.screen_to_world(rect, pointer);
                    self.interaction.queue(PointerEvent::Drag { index, world });
                }
                (None, _) => {
                    self.interaction.camera.pan_by(response.drag_delta());
                    camera_moved = true;
                }
                _ => {}
            }
        }
        if response.dragged_by(PointerButton::Secondary)
            || response.dragged_by(PointerButton::Middle)
        {
            self.interaction.camera.pan_by(response.drag_delta());
            camera_moved = true;
        }
        if response.drag_stopped()
            && let Some(index) = self.interaction.dragging()
        {
            self.interaction.queue(PointerEvent::DragEnd(index));
        }

        if response.clicked_by(PointerButton::Primary) {
            self.interaction.queue(match hovered {
                Some(index) => PointerEvent::NodeClick(index),
                None => PointerEvent::BackgroundClick,
            });
        }

        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            if scroll.abs() > f32::EPSILON {
                let anchor = pointer.unwrap_or_else(|| rect.center()) - rect.center();
                if scroll > 0.0 {
                    self.interaction.camera.zoom_in(anchor);
                } else {
                    self.interaction.camera.zoom_out(anchor);
                }
                camera_moved = true;
            }
        }

        if camera_moved {
            session.note_camera_moved();
        }

        let camera = &self.interaction.camera;
        let graph = session.graph();
        let highlight = self.highlight.resolve(graph, &self.search);
        let measure = |text: &str, size: f32| {
            painter
                .layout_no_wrap(text.to_owned(), FontId::proportional(size), Color32::WHITE)
                .size()
                .x
        };
        let frame = compute_visual_state(&FrameInputs {
            graph,
            placements: session.simulator().placements(),
            selection: &self.interaction.selection,
            highlight,
            zoom: camera.zoom(),
            label_zoom_threshold: camera.label_threshold(),
            style: &self.config.style,
            measure: &measure,
        });

        draw_background(&painter, rect, camera.pan(), camera.zoom());

        for edge in &frame.edges {
            let start = camera.world_to_screen(rect, edge.from);
            let end = camera.world_to_screen(rect, edge.to);
            if edge_visible(rect, start, end, edge.width) {
                painter.line_segment([start, end], Stroke::new(edge.width, edge.color));
            }
        }

        for node in &frame.nodes {
            let center = camera.world_to_screen(rect, node.position);
            let radius = node.radius * camera.zoom();
            if !circle_visible(rect, center, radius * GLOW_SCALE) {
                continue;
            }
            draw_node(&painter, node, center, radius, hovered == Some(node.index));
        }

        if let Some(index) = hovered
            && let Some(node) = graph.node(index)
        {
            let subtype = node
                .content_subtype
                .as_deref()
                .map(|subtype| format!(" ({subtype})"))
                .unwrap_or_default();
            let text = format!(
                "{}  |  {}{subtype}  |  links {}",
                node.display_label(),
                node.kind,
                graph.degree(index)
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        if active || response.dragged() || camera_moved {
            ui.ctx().request_repaint();
        }
    }
}

fn draw_node(painter: &egui::Painter, node: &NodeVisual, center: Pos2, radius: f32, hovered: bool) {
    if let Some(glow) = node.glow {
        painter.circle_filled(center, radius * GLOW_SCALE, glow);
    }

    painter.circle_filled(center, radius, node.fill);
    let outline = if hovered {
        Stroke::new(1.5, Color32::from_gray(245))
    } else {
        Stroke::new(1.0, Color32::from_rgba_unmultiplied(10, 12, 16, 190))
    };
    painter.circle_stroke(center, radius, outline);

    let Some(label) = &node.label else {
        return;
    };

    let line_height = label.font_size * LINE_SPACING;
    let color = if node.dimmed {
        label.color.gamma_multiply(0.4)
    } else {
        label.color
    };
    for (row, line) in label.lines.iter().enumerate() {
        let anchor = center + vec2(0.0, radius + LABEL_GAP + row as f32 * line_height);
        let font = FontId::proportional(label.font_size);
        if label.strong {
            // Default fonts ship without a bold face; a half-pixel double strike stands in.
            painter.text(anchor + vec2(0.5, 0.0), Align2::CENTER_TOP, line, font.clone(), color);
        }
        painter.text(anchor, Align2::CENTER_TOP, line, font, color);
    }
}
