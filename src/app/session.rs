use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui::Vec2;

use crate::config::{ResizeConfig, ViewerConfig};
use crate::graph::Graph;

use super::physics::{LayoutSimulator, SimulationPhase};

/// Debounces canvas size changes.
///
/// A new size is reported only when it differs from the last reported one by at
/// least `min_delta` on some axis and `min_interval` has passed since then.
#[derive(Clone, Debug)]
pub(in crate::app) struct ViewportTracker {
    reported: Option<(Vec2, Instant)>,
    min_delta: f32,
    min_interval: Duration,
}

impl ViewportTracker {
    pub(in crate::app) fn new(config: &ResizeConfig) -> Self {
        Self {
            reported: None,
            min_delta: config.min_delta,
            min_interval: config.min_interval(),
        }
    }

    pub(in crate::app) fn size(&self) -> Option<Vec2> {
        self.reported.map(|(size, _)| size)
    }

    pub(in crate::app) fn observe(&mut self, size: Vec2, now: Instant) -> Option<Vec2> {
        if let Some((last, at)) = self.reported {
            let delta = (size - last).abs();
            if delta.x < self.min_delta && delta.y < self.min_delta {
                return None;
            }
            if now.saturating_duration_since(at) < self.min_interval {
                return None;
            }
        }

        self.reported = Some((size, now));
        Some(size)
    }
}

/// Everything tied to one reconciled graph. Dropping it releases the layout.
pub(in crate::app) struct LayoutSession {
    simulator: LayoutSimulator,
    viewport: ViewportTracker,
    fit_pending: bool,
    camera_moved: bool,
    started: Instant,
}

impl LayoutSession {
    pub(in crate::app) fn new(graph: Arc<Graph>, config: &ViewerConfig) -> Self {
        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "starting layout session"
        );
        Self {
            simulator: LayoutSimulator::new(graph, config.layout.clone()),
            viewport: ViewportTracker::new(&config.resize),
            fit_pending: true,
            camera_moved: false,
            started: Instant::now(),
        }
    }

    pub(in crate::app) fn graph(&self) -> &Arc<Graph> {
        self.simulator.graph()
    }

    pub(in crate::app) fn simulator(&self) -> &LayoutSimulator {
        &self.simulator
    }

    pub(in crate::app) fn simulator_mut(&mut self) -> &mut LayoutSimulator {
        &mut self.simulator
    }

    pub(in crate::app) fn viewport_size(&self) -> Option<Vec2> {
        self.viewport.size()
    }

    pub(in crate::app) fn advance(&mut self, now: Instant) -> bool {
        let was_frozen = self.simulator.phase() == SimulationPhase::Frozen;
        self.simulator.tick(now);
        if !was_frozen && self.simulator.phase() == SimulationPhase::Frozen {
            tracing::debug!(
                ticks = self.simulator.state().tick_count,
                elapsed_ms = now.saturating_duration_since(self.started).as_millis() as u64,
                "layout settled"
            );
        }
        self.simulator.is_active()
    }

    /// Records a canvas size; a reported change re-arms auto-fit unless the
    /// user already moved the camera.
    pub(in crate::app) fn observe_viewport(&mut self, size: Vec2, now: Instant) -> bool {
        let Some(size) = self.viewport.observe(size, now) else {
            return false;
        };
        tracing::trace!(width = size.x, height = size.y, "viewport resized");
        if !self.camera_moved {
            self.fit_pending = true;
        }
        true
    }

    pub(in crate::app) fn note_camera_moved(&mut self) {
        self.camera_moved = true;
        self.fit_pending = false;
    }

    pub(in crate::app) fn take_fit(&mut self) -> Option<(Vec2, Vec2)> {
        if !self.fit_pending || self.simulator.phase() != SimulationPhase::Frozen {
            return None;
        }
        let bounds = self.simulator.bounds()?;
        self.fit_pending = false;
        Some(bounds)
    }
}

impl Drop for LayoutSession {
    fn drop(&mut self) {
        tracing::debug!(
            nodes = self.graph().node_count(),
            ticks = self.simulator.state().tick_count,
            "layout session released"
        );
    }
}
