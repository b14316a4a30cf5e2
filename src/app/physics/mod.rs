mod forces;
mod quadtree;
mod state;

use std::sync::Arc;
use std::time::Instant;

use eframe::egui::{Vec2, vec2};

use crate::config::LayoutConfig;
use crate::graph::Graph;
use crate::util::stable_pair;
use forces::{
    CollisionParams, RepulsionParams, accumulate_collision_pairs, accumulate_repulsion_for_node,
};
use quadtree::QuadCell;
pub(in crate::app) use state::{SimulationPhase, SimulationState};

const BARNES_HUT_THETA: f32 = 0.9;

pub(in crate::app) fn is_finite(point: Vec2) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) enum Placement {
    /// Simulator-owned; non-finite until the first tick seeds it.
    Free { position: Vec2, velocity: Vec2 },
    /// Host-owned; the simulator never moves it.
    Pinned { position: Vec2 },
}

impl Placement {
    fn unplaced() -> Self {
        Self::Free {
            position: vec2(f32::NAN, f32::NAN),
            velocity: Vec2::ZERO,
        }
    }

    pub(in crate::app) fn position(&self) -> Vec2 {
        match *self {
            Self::Free { position, .. } | Self::Pinned { position } => position,
        }
    }

    pub(in crate::app) fn is_pinned(&self) -> bool {
        matches!(self, Self::Pinned { .. })
    }

    fn velocity(&self) -> Vec2 {
        match *self {
            Self::Free { velocity, .. } => velocity,
            Self::Pinned { .. } => Vec2::ZERO,
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum ForceMode {
    Layout,
    Settled,
}

#[derive(Default)]
struct PhysicsScratch {
    velocity_deltas: Vec<Vec2>,
    positions: Vec<Vec2>,
    placed: Vec<usize>,
}

pub(in crate::app) struct LayoutSimulator {
    graph: Arc<Graph>,
    config: LayoutConfig,
    state: SimulationState,
    placements: Vec<Placement>,
    scratch: PhysicsScratch,
}

impl LayoutSimulator {
    pub(in crate::app) fn new(graph: Arc<Graph>, config: LayoutConfig) -> Self {
        let placements = vec![Placement::unplaced(); graph.node_count()];
        Self {
            graph,
            config,
            state: SimulationState::default(),
            placements,
            scratch: PhysicsScratch::default(),
        }
    }

    pub(in crate::app) fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    pub(in crate::app) fn state(&self) -> SimulationState {
        self.state
    }

    pub(in crate::app) fn phase(&self) -> SimulationPhase {
        self.state.phase
    }

    pub(in crate::app) fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub(in crate::app) fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub(in crate::app) fn position(&self, index: usize) -> Option<Vec2> {
        self.placements
            .get(index)
            .map(Placement::position)
            .filter(|&position| is_finite(position))
    }

    pub(in crate::app) fn pinned_count(&self) -> usize {
        self.placements
            .iter()
            .filter(|placement| placement.is_pinned())
            .count()
    }

    pub(in crate::app) fn bounds(&self) -> Option<(Vec2, Vec2)> {
        let mut placed = self
            .placements
            .iter()
            .map(Placement::position)
            .filter(|&position| is_finite(position));
        let first = placed.next()?;
        Some(placed.fold((first, first), |(min, max), point| {
            (min.min(point), max.max(point))
        }))
    }

    pub(in crate::app) fn tick(&mut self, now: Instant) -> bool {
        let previous = self.state;
        if previous.phase == SimulationPhase::Initializing {
            self.seed_positions();
        }

        let prepared = previous.before_step(now);
        if prepared.phase != previous.phase {
            tracing::debug!(
                from = previous.phase.label(),
                to = prepared.phase.label(),
                "layout phase changed"
            );
        }

        if !prepared.is_active() {
            self.state = prepared;
            return false;
        }

        let mode = if prepared.forces_active() {
            ForceMode::Layout
        } else {
            ForceMode::Settled
        };
        let moved = self.step(mode, prepared.alpha);

        let next = prepared.after_step(&self.config, now);
        if next.phase != prepared.phase {
            tracing::debug!(
                from = prepared.phase.label(),
                to = next.phase.label(),
                ticks = next.tick_count,
                alpha = prepared.alpha,
                "layout phase changed"
            );
        }
        if next.is_frozen() && (!prepared.is_frozen() || next.alpha == 0.0) {
            self.settle_velocities();
        }
        self.state = next;
        moved
    }

    pub(in crate::app) fn pin(&mut self, index: usize, position: Vec2) {
        if !is_finite(position) {
            return;
        }
        if let Some(placement) = self.placements.get_mut(index) {
            *placement = Placement::Pinned { position };
        }
    }

    pub(in crate::app) fn pin_in_place(&mut self, index: usize) -> bool {
        let Some(position) = self.position(index) else {
            return false;
        };
        self.pin(index, position);
        true
    }

    pub(in crate::app) fn nudge(&mut self) {
        self.state = self.state.nudge(self.config.drag_energy);
    }

    pub(in crate::app) fn reheat(&mut self) {
        for placement in &mut self.placements {
            if let Placement::Pinned { position } = *placement {
                *placement = Placement::Free {
                    position,
                    velocity: Vec2::ZERO,
                };
            }
        }
        self.state = self.state.reheat();
        tracing::debug!(nodes = self.placements.len(), "layout reheated");
    }

    fn seed_positions(&mut self) {
        let count = self.placements.len();
        let ring_radius = (count as f32).sqrt() * self.config.link_distance * 0.5;

        for (index, placement) in self.placements.iter_mut().enumerate() {
            if is_finite(placement.position()) {
                continue;
            }

            let angle = (index as f32 / count.max(1) as f32) * std::f32::consts::TAU;
            let (jx, jy) = self
                .graph
                .node(index)
                .map(|node| stable_pair(&node.id))
                .unwrap_or((0.0, 0.0));
            let jitter = vec2(jx, jy) * (self.config.link_distance * 0.25);
            *placement = Placement::Free {
                position: vec2(angle.cos(), angle.sin()) * ring_radius + jitter,
                velocity: Vec2::ZERO,
            };
        }
    }

    fn settle_velocities(&mut self) {
        for placement in &mut self.placements {
            if let Placement::Free { velocity, .. } = placement {
                *velocity = Vec2::ZERO;
            }
        }
    }

    fn step(&mut self, mode: ForceMode, alpha: f32) -> bool {
        let node_count = self.placements.len();
        let scratch = &mut self.scratch;
        scratch.velocity_deltas.clear();
        scratch.velocity_deltas.resize(node_count, Vec2::ZERO);
        scratch.positions.clear();
        scratch.placed.clear();
        for (index, placement) in self.placements.iter().enumerate() {
            let position = placement.position();
            scratch.positions.push(position);
            if is_finite(position) {
                scratch.placed.push(index);
            }
        }

        let positions = &scratch.positions;
        let deltas = &mut scratch.velocity_deltas;

        if mode == ForceMode::Layout
            && let Some(tree) = QuadCell::over(positions)
        {
            let repulsion = RepulsionParams {
                strength: self.config.repulsion_strength * alpha,
                max_distance_sq: self.config.repulsion_max_distance.powi(2),
                theta: BARNES_HUT_THETA,
            };
            for &index in &scratch.placed {
                let delta = &mut deltas[index];
                accumulate_repulsion_for_node(&tree, index, positions, repulsion, delta);
            }

            accumulate_collision_pairs(
                &tree,
                &tree,
                true,
                positions,
                CollisionParams {
                    min_distance: self.config.collision_radius * 2.0,
                    strength: self.config.collision_strength,
                },
                deltas,
            );

            let center_pull = self.config.center_strength * alpha;
            for &index in &scratch.placed {
                deltas[index] -= positions[index] * center_pull;
            }
        }

        let link_strength = match mode {
            ForceMode::Layout => self.config.link_strength,
            ForceMode::Settled => self.config.frozen_link_strength,
        };
        for edge in self.graph.edges() {
            let (source, target) = (edge.source, edge.target);
            if source >= node_count || target >= node_count {
                continue;
            }
            let (source_pos, target_pos) = (positions[source], positions[target]);
            if !is_finite(source_pos) || !is_finite(target_pos) {
                continue;
            }

            let source_degree = self.graph.degree(source).max(1) as f32;
            let target_degree = self.graph.degree(target).max(1) as f32;
            let weight = edge.strength.map_or(1.0, |value| value.clamp(0.1, 3.0));
            let strength = match mode {
                ForceMode::Layout => link_strength * weight / source_degree.min(target_degree),
                ForceMode::Settled => link_strength * weight,
            };

            let mut delta = (target_pos + self.placements[target].velocity())
                - (source_pos + self.placements[source].velocity());
            let mut distance = delta.length();
            if distance <= 0.0001 {
                delta = jiggle(source, target);
                distance = delta.length();
            }

            let pull = (distance - self.config.link_distance) / distance * alpha * strength;
            let correction = delta * pull;
            let bias = source_degree / (source_degree + target_degree);
            deltas[target] -= correction * bias;
            deltas[source] += correction * (1.0 - bias);
        }

        let retain = (1.0 - self.config.velocity_decay).clamp(0.0, 1.0);
        let mut moved = false;
        for (index, placement) in self.placements.iter_mut().enumerate() {
            let Placement::Free { position, velocity } = placement else {
                continue;
            };
            if !is_finite(*position) {
                continue;
            }

            let next_velocity = (*velocity + deltas[index]) * retain;
            if !is_finite(next_velocity) {
                *velocity = Vec2::ZERO;
                continue;
            }

            *velocity = next_velocity;
            *position += next_velocity;
            if next_velocity.length_sq() > 1e-8 {
                moved = true;
            }
        }

        moved
    }
}

fn jiggle(source: usize, target: usize) -> Vec2 {
    let angle =
        ((source as f32) * 0.618_034 + (target as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin()) * 1e-3
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::graph::{GraphModel, fixtures::study_payload};

    fn simulator() -> LayoutSimulator {
        let graph = GraphModel::new().reconcile(study_payload());
        LayoutSimulator::new(graph, LayoutConfig::default())
    }

    fn freeze(simulator: &mut LayoutSimulator, now: Instant) {
        for _ in 0..1_000 {
            if simulator.phase() == SimulationPhase::Frozen {
                return;
            }
            simulator.tick(now);
        }
    }

    #[test]
    fn new_layout_starts_unplaced_and_initializing() {
        let simulator = simulator();

        assert_eq!(simulator.phase(), SimulationPhase::Initializing);
        assert!(simulator.position(0).is_none());
        assert!(simulator.bounds().is_none());
    }

    #[test]
    fn first_tick_places_every_node() {
        let mut simulator = simulator();

        simulator.tick(Instant::now());

        assert_eq!(simulator.phase(), SimulationPhase::Warmup);
        assert!((0..5).all(|index| simulator.position(index).is_some()));
    }

    #[test]
    fn converges_to_frozen_within_tick_budget() {
        let mut simulator = simulator();
        let now = Instant::now();
        let config = LayoutConfig::default();

        for _ in 0..(config.warmup_ticks + config.cooldown_ticks) {
            simulator.tick(now);
        }

        assert_eq!(simulator.phase(), SimulationPhase::Frozen);
    }

    #[test]
    fn converges_to_frozen_within_time_budget() {
        let mut simulator = simulator();
        let start = Instant::now();

        for _ in 0..=LayoutConfig::default().warmup_ticks {
            simulator.tick(start);
        }
        assert_eq!(simulator.phase(), SimulationPhase::Running);

        simulator.tick(start + Duration::from_secs(2));

        assert_eq!(simulator.phase(), SimulationPhase::Frozen);
    }

    #[test]
    fn layout_spreads_nodes_apart() {
        let mut simulator = simulator();
        freeze(&mut simulator, Instant::now());

        let positions = (0..5)
            .filter_map(|index| simulator.position(index))
            .collect::<Vec<_>>();
        for (offset, a) in positions.iter().enumerate() {
            for b in &positions[offset + 1..] {
                assert!((*a - *b).length() > 10.0);
            }
        }
    }

    #[test]
    fn frozen_positions_do_not_change() {
        let mut simulator = simulator();
        let now = Instant::now();
        freeze(&mut simulator, now);
        let before = simulator.placements().to_vec();

        for _ in 0..50 {
            assert!(!simulator.tick(now));
        }

        assert_eq!(simulator.placements(), before.as_slice());
    }

    #[test]
    fn pinned_node_stays_exactly_at_pointer() {
        let mut simulator = simulator();
        let now = Instant::now();
        freeze(&mut simulator, now);
        let target = vec2(123.25, -48.5);

        assert!(simulator.pin_in_place(1));
        simulator.pin(1, target);
        simulator.nudge();
        for _ in 0..200 {
            simulator.tick(now);
        }

        assert_eq!(simulator.position(1), Some(target));
        assert_eq!(simulator.phase(), SimulationPhase::Frozen);
    }

    #[test]
    fn drag_energy_lets_neighbors_trail_while_frozen() {
        let mut simulator = simulator();
        let now = Instant::now();
        freeze(&mut simulator, now);
        let graph = Arc::clone(simulator.graph());
        let dragged = graph.index_of("concept-dl").unwrap_or(0);
        let neighbor = graph.index_of("paper-1").unwrap_or(0);
        let far_away = simulator.position(dragged).unwrap_or(Vec2::ZERO) + vec2(600.0, 0.0);
        let neighbor_before = simulator.position(neighbor);

        simulator.pin(dragged, far_away);
        simulator.nudge();
        simulator.tick(now);

        assert_ne!(simulator.position(neighbor), neighbor_before);
        assert_eq!(simulator.phase(), SimulationPhase::Frozen);
    }

    #[test]
    fn reheat_clears_pins_and_restarts_layout() {
        let mut simulator = simulator();
        let now = Instant::now();
        freeze(&mut simulator, now);
        simulator.pin(0, vec2(10.0, 10.0));
        simulator.pin(2, vec2(-10.0, 10.0));

        simulator.reheat();

        assert_eq!(simulator.pinned_count(), 0);
        assert_eq!(simulator.phase(), SimulationPhase::Reheated);
        assert_eq!(simulator.state().alpha, 1.0);

        simulator.tick(now);
        assert_eq!(simulator.phase(), SimulationPhase::Running);
        assert!(simulator.state().forces_active());
    }

    #[test]
    fn pinning_unplaced_node_is_refused() {
        let mut simulator = simulator();

        assert!(!simulator.pin_in_place(0));
        simulator.pin(0, vec2(f32::NAN, 1.0));

        assert_eq!(simulator.pinned_count(), 0);
    }
}
