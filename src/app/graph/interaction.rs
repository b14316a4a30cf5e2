use std::collections::{HashSet, VecDeque};

use eframe::egui::{Pos2, Rect, Vec2, vec2};

use crate::config::CameraConfig;
use crate::graph::Graph;

use super::super::highlight::connected_neighborhood;
use super::super::physics::LayoutSimulator;

#[derive(Clone, Debug, Default, PartialEq)]
pub(in crate::app) struct SelectionState {
    pub(in crate::app) selected_id: Option<String>,
    pub(in crate::app) selected_index: Option<usize>,
    pub(in crate::app) connected_nodes: HashSet<usize>,
    pub(in crate::app) connected_edges: HashSet<usize>,
}

impl SelectionState {
    pub(in crate::app) fn is_active(&self) -> bool {
        self.selected_index.is_some()
    }

    fn select(&mut self, graph: &Graph, index: usize) {
        let Some(node) = graph.node(index) else {
            self.clear();
            return;
        };

        let (connected_nodes, connected_edges) = connected_neighborhood(graph, index);
        self.selected_id = Some(node.id.clone());
        self.selected_index = Some(index);
        self.connected_nodes = connected_nodes;
        self.connected_edges = connected_edges;
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    /// Re-resolves the selected id against `graph`, dropping it if the node is gone.
    fn refresh(&mut self, graph: &Graph) {
        match self.selected_id.as_deref().and_then(|id| graph.index_of(id)) {
            Some(index) => self.select(graph, index),
            None => self.clear(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) enum PointerEvent {
    NodeClick(usize),
    BackgroundClick,
    DragStart(usize),
    Drag { index: usize, world: Vec2 },
    DragEnd(usize),
    Reorganize,
}

#[derive(Clone, Debug)]
pub(in crate::app) struct Camera {
    pan: Vec2,
    zoom: f32,
    config: CameraConfig,
}

impl Camera {
    pub(in crate::app) fn new(config: CameraConfig) -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0_f32.clamp(config.min_zoom, config.max_zoom),
            config,
        }
    }

    pub(in crate::app) fn zoom(&self) -> f32 {
        self.zoom
    }

    pub(in crate::app) fn pan(&self) -> Vec2 {
        self.pan
    }

    pub(in crate::app) fn label_threshold(&self) -> f32 {
        self.config.label_zoom_threshold
    }

    pub(in crate::app) fn world_to_screen(&self, rect: Rect, world: Vec2) -> Pos2 {
        rect.center() + self.pan + world * self.zoom
    }

    pub(in crate::app) fn screen_to_world(&self, rect: Rect, screen: Pos2) -> Vec2 {
        (screen - rect.center() - self.pan) / self.zoom
    }

    /// Scales by `factor` keeping the world point under `anchor` fixed.
    /// `anchor` is relative to the canvas center.
    fn zoom_about(&mut self, anchor: Vec2, factor: f32) {
        let world_before = (anchor - self.pan) / self.zoom;
        self.zoom = (self.zoom * factor).clamp(self.config.min_zoom, self.config.max_zoom);
        self.pan = anchor - (world_before * self.zoom);
    }

    pub(in crate::app) fn zoom_in(&mut self, anchor: Vec2) {
        self.zoom_about(anchor, self.config.zoom_step);
    }

    pub(in crate::app) fn zoom_out(&mut self, anchor: Vec2) {
        self.zoom_about(anchor, 1.0 / self.config.zoom_step);
    }

    pub(in crate::app) fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    pub(in crate::app) fn reset(&mut self) {
        self.pan = Vec2::ZERO;
        self.zoom = 1.0_f32.clamp(self.config.min_zoom, self.config.max_zoom);
    }

    pub(in crate::app) fn fit(&mut self, bounds: (Vec2, Vec2), size: Vec2) {
        let (min, max) = bounds;
        let padding = self.config.fit_padding;
        let span = (max - min).max(vec2(1.0, 1.0));
        let available = (size - vec2(padding, padding) * 2.0).max(vec2(1.0, 1.0));

        let zoom = (available.x / span.x).min(available.y / span.y);
        self.zoom = zoom.clamp(self.config.min_zoom, self.config.max_zoom);
        let center = (min + max) * 0.5;
        self.pan = -center * self.zoom;
    }
}

pub(in crate::app) struct InteractionController {
    pub(in crate::app) selection: SelectionState,
    pub(in crate::app) camera: Camera,
    pending: VecDeque<PointerEvent>,
    dragging: Option<usize>,
}

impl InteractionController {
    pub(in crate::app) fn new(camera: CameraConfig) -> Self {
        Self {
            selection: SelectionState::default(),
            camera: Camera::new(camera),
            pending: VecDeque::new(),
            dragging: None,
        }
    }

    pub(in crate::app) fn queue(&mut self, event: PointerEvent) {
        self.pending.push_back(event);
    }

    pub(in crate::app) fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    /// Applies queued events in order. Returns the indices of clicked nodes.
    pub(in crate::app) fn apply_pending(&mut self, simulator: &mut LayoutSimulator) -> Vec<usize> {
        let mut clicked = Vec::new();
        while let Some(event) = self.pending.pop_front() {
            match event {
                PointerEvent::NodeClick(index) => {
                    if simulator.graph().node(index).is_some() {
                        self.on_node_click(simulator.graph(), index);
                        clicked.push(index);
                    }
                }
                PointerEvent::BackgroundClick => self.on_background_click(),
                PointerEvent::DragStart(index) => self.on_drag_start(simulator, index),
                PointerEvent::Drag { index, world } => self.on_drag(simulator, index, world),
                PointerEvent::DragEnd(index) => self.on_drag_end(index),
                PointerEvent::Reorganize => self.on_reorganize(simulator),
            }
        }
        clicked
    }

    pub(in crate::app) fn on_node_click(&mut self, graph: &Graph, index: usize) {
        if self.selection.selected_index == Some(index) {
            self.selection.clear();
        } else {
            self.selection.select(graph, index);
        }
    }

    pub(in crate::app) fn on_background_click(&mut self) {
        self.selection.clear();
    }

    pub(in crate::app) fn on_drag_start(&mut self, simulator: &mut LayoutSimulator, index: usize) {
        if simulator.pin_in_place(index) {
            self.dragging = Some(index);
        }
    }

    pub(in crate::app) fn on_drag(&mut self, simulator: &mut LayoutSimulator, index: usize, world: Vec2) {
        simulator.pin(index, world);
        simulator.nudge();
    }

    pub(in crate::app) fn on_drag_end(&mut self, index: usize) {
        if self.dragging == Some(index) {
            self.dragging = None;
        }
    }

    pub(in crate::app) fn on_reorganize(&mut self, simulator: &mut LayoutSimulator) {
        self.dragging = None;
        simulator.reheat();
    }

    pub(in crate::app) fn sync_graph(&mut self, graph: &Graph) {
        self.pending.clear();
        self.dragging = None;
        self.selection.refresh(graph);
    }
}

pub(in crate::app) fn hit_test(
    simulator: &LayoutSimulator,
    camera: &Camera,
    rect: Rect,
    pointer: Pos2,
    radius_px: impl Fn(usize) -> f32,
) -> Option<usize> {
    (0..simulator.placements().len())
        .filter_map(|index| {
            let world = simulator.position(index)?;
            let distance = camera.world_to_screen(rect, world).distance(pointer);
            (distance <= radius_px(index)).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use eframe::egui::pos2;

    use super::*;
    use crate::app::highlight::HighlightState;
    use crate::app::physics::SimulationPhase;
    use crate::app::visual::drawn_radius;
    use crate::config::{LayoutConfig, StyleConfig};
    use crate::graph::{GraphModel, GraphPayload, fixtures::study_payload};

    fn setup() -> (InteractionController, LayoutSimulator) {
        let graph = GraphModel::new().reconcile(study_payload());
        let simulator = LayoutSimulator::new(graph, LayoutConfig::default());
        (InteractionController::new(CameraConfig::default()), simulator)
    }

    fn settle(simulator: &mut LayoutSimulator, now: Instant) {
        while simulator.phase() != SimulationPhase::Frozen {
            simulator.tick(now);
        }
    }

    #[test]
    fn clicking_selected_node_twice_clears_selection() {
        let (mut controller, mut simulator) = setup();

        controller.queue(PointerEvent::NodeClick(0));
        controller.apply_pending(&mut simulator);
        assert_eq!(controller.selection.selected_index, Some(0));
        assert!(!controller.selection.connected_nodes.is_empty());

        controller.queue(PointerEvent::NodeClick(0));
        controller.apply_pending(&mut simulator);
        assert_eq!(controller.selection.selected_id, None);
        assert!(controller.selection.connected_nodes.is_empty());
        assert!(controller.selection.connected_edges.is_empty());
    }

    #[test]
    fn clicking_another_node_moves_selection() {
        let (mut controller, mut simulator) = setup();
        let graph = Arc::clone(simulator.graph());
        let note = graph.index_of("note-1").unwrap_or(0);
        let stats = graph.index_of("concept-stats").unwrap_or(0);

        controller.queue(PointerEvent::NodeClick(note));
        controller.queue(PointerEvent::NodeClick(stats));
        let clicked = controller.apply_pending(&mut simulator);

        assert_eq!(clicked, vec![note, stats]);
        assert_eq!(controller.selection.selected_id.as_deref(), Some("concept-stats"));
        assert!(!controller.selection.connected_nodes.contains(&note));
    }

    #[test]
    fn background_click_clears_selection() {
        let (mut controller, mut simulator) = setup();
        controller.queue(PointerEvent::NodeClick(1));
        controller.queue(PointerEvent::BackgroundClick);

        controller.apply_pending(&mut simulator);

        assert!(!controller.selection.is_active());
    }

    #[test]
    fn events_wait_for_the_next_tick_boundary() {
        let (mut controller, mut simulator) = setup();

        controller.queue(PointerEvent::NodeClick(2));
        assert!(!controller.selection.is_active());

        controller.apply_pending(&mut simulator);
        assert!(controller.selection.is_active());
    }

    #[test]
    fn drag_pins_node_at_last_pointer_location() {
        let (mut controller, mut simulator) = setup();
        let now = Instant::now();
        settle(&mut simulator, now);
        let target = vec2(-77.5, 31.25);

        controller.queue(PointerEvent::DragStart(3));
        controller.queue(PointerEvent::Drag {
            index: 3,
            world: vec2(5.0, 5.0),
        });
        controller.queue(PointerEvent::Drag {
            index: 3,
            world: target,
        });
        controller.queue(PointerEvent::DragEnd(3));
        controller.apply_pending(&mut simulator);
        for _ in 0..120 {
            simulator.tick(now);
        }

        assert_eq!(simulator.position(3), Some(target));
        assert_eq!(simulator.phase(), SimulationPhase::Frozen);
        assert_eq!(controller.dragging(), None);
    }

    #[test]
    fn reorganize_unpins_and_runs_again() {
        let (mut controller, mut simulator) = setup();
        let now = Instant::now();
        settle(&mut simulator, now);
        controller.on_drag_start(&mut simulator, 0);
        controller.on_drag(&mut simulator, 0, vec2(40.0, 40.0));

        controller.queue(PointerEvent::Reorganize);
        controller.apply_pending(&mut simulator);
        simulator.tick(now);

        assert_eq!(simulator.pinned_count(), 0);
        assert_eq!(simulator.phase(), SimulationPhase::Running);
    }

    #[test]
    fn zoom_steps_are_inverse() {
        let mut camera = Camera::new(CameraConfig::default());
        let anchor = vec2(120.0, -35.0);

        for _ in 0..5 {
            camera.zoom_in(anchor);
        }
        for _ in 0..5 {
            camera.zoom_out(anchor);
        }

        assert!((camera.zoom() - 1.0).abs() < 1e-5);
        assert!(camera.pan().length() < 1e-3);
    }

    #[test]
    fn zoom_is_clamped_to_configured_range() {
        let config = CameraConfig::default();
        let mut camera = Camera::new(config.clone());

        for _ in 0..100 {
            camera.zoom_in(Vec2::ZERO);
        }
        assert_eq!(camera.zoom(), config.max_zoom);

        for _ in 0..200 {
            camera.zoom_out(Vec2::ZERO);
        }
        assert_eq!(camera.zoom(), config.min_zoom);
    }

    #[test]
    fn zoom_keeps_anchor_point_fixed() {
        let mut camera = Camera::new(CameraConfig::default());
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0));
        let pointer = pos2(600.0, 200.0);
        let world_before = camera.screen_to_world(rect, pointer);

        camera.zoom_in(pointer - rect.center());

        let world_after = camera.screen_to_world(rect, pointer);
        assert!((world_before - world_after).length() < 1e-3);
    }

    #[test]
    fn fit_centers_bounds() {
        let mut camera = Camera::new(CameraConfig::default());
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0));

        camera.fit((vec2(100.0, 100.0), vec2(300.0, 200.0)), rect.size());

        let center = camera.world_to_screen(rect, vec2(200.0, 150.0));
        assert!((center - rect.center()).length() < 1e-3);
        assert!(camera.zoom() <= CameraConfig::default().max_zoom);
    }

    #[test]
    fn hit_test_skips_unplaced_nodes() {
        let (controller, mut simulator) = setup();
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0));

        assert_eq!(
            hit_test(&simulator, &controller.camera, rect, rect.center(), |_| 1e6),
            None
        );

        simulator.tick(Instant::now());
        let target = simulator.position(2).unwrap_or(Vec2::ZERO);
        let pointer = controller.camera.world_to_screen(rect, target);
        assert_eq!(
            hit_test(&simulator, &controller.camera, rect, pointer, |_| 4.0),
            Some(2)
        );
    }

    #[test]
    fn selected_node_is_hit_across_its_drawn_ring() {
        let (mut controller, mut simulator) = setup();
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0));
        let style = StyleConfig::default();
        let search = HighlightState::default();
        simulator.tick(Instant::now());
        controller.queue(PointerEvent::NodeClick(2));
        controller.apply_pending(&mut simulator);

        let center = simulator.position(2).unwrap_or(Vec2::ZERO);
        let pointer = controller.camera.world_to_screen(rect, center) + vec2(8.0, 0.0);
        let zoom = controller.camera.zoom();

        assert_eq!(
            hit_test(&simulator, &controller.camera, rect, pointer, |_| style.node_radius * zoom),
            None
        );
        let selection = &controller.selection;
        assert_eq!(
            hit_test(&simulator, &controller.camera, rect, pointer, |index| {
                drawn_radius(&style, selection, &search, index) * zoom
            }),
            Some(2)
        );
    }

    #[test]
    fn graph_swap_keeps_selection_only_if_node_survives() {
        let (mut controller, mut simulator) = setup();
        let mut model = GraphModel::new();
        controller.queue(PointerEvent::NodeClick(0));
        controller.apply_pending(&mut simulator);
        let selected = controller.selection.selected_id.clone();

        let mut survivors = study_payload();
        survivors.nodes.reverse();
        let reordered = model.reconcile(survivors);
        controller.sync_graph(&reordered);
        assert_eq!(controller.selection.selected_id, selected);

        let replaced = model.reconcile(GraphPayload::default());
        controller.sync_graph(&replaced);
        assert!(!controller.selection.is_active());
    }
}
