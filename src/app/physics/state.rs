use std::time::Instant;

use crate::config::LayoutConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationPhase {
    Initializing,
    Warmup,
    Running,
    Frozen,
    Reheated,
}

impl SimulationPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Warmup => "warming up",
            Self::Running => "running",
            Self::Frozen => "frozen",
            Self::Reheated => "reheated",
        }
    }
}

/// Convergence state of one layout.
///
/// Advanced by value: the simulator calls [`SimulationState::before_step`] and
/// [`SimulationState::after_step`] around each integration step and stores the
/// returned state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationState {
    pub phase: SimulationPhase,
    pub tick_count: u32,
    pub phase_ticks: u32,
    pub alpha: f32,
    cooldown_started: Option<Instant>,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self {
            phase: SimulationPhase::Initializing,
            tick_count: 0,
            phase_ticks: 0,
            alpha: 1.0,
            cooldown_started: None,
        }
    }
}

impl SimulationState {
    pub fn forces_active(self) -> bool {
        matches!(
            self.phase,
            SimulationPhase::Warmup | SimulationPhase::Running
        )
    }

    pub fn is_frozen(self) -> bool {
        self.phase == SimulationPhase::Frozen
    }

    pub fn is_active(self) -> bool {
        !self.is_frozen() || self.alpha > 0.0
    }

    /// Entry transitions that must happen before integrating: the first tick of a
    /// new layout starts warmup, and a reheat resumes running with a fresh cooldown.
    pub fn before_step(self, now: Instant) -> Self {
        match self.phase {
            SimulationPhase::Initializing => Self {
                phase: SimulationPhase::Warmup,
                phase_ticks: 0,
                ..self
            },
            SimulationPhase::Reheated => Self {
                phase: SimulationPhase::Running,
                phase_ticks: 0,
                cooldown_started: Some(now),
                ..self
            },
            _ => self,
        }
    }

    pub fn after_step(self, config: &LayoutConfig, now: Instant) -> Self {
        let alpha = self.alpha - self.alpha * config.alpha_decay();
        let mut next = Self {
            tick_count: self.tick_count.saturating_add(1),
            phase_ticks: self.phase_ticks.saturating_add(1),
            alpha,
            ..self
        };

        match next.phase {
            SimulationPhase::Warmup if next.phase_ticks >= config.warmup_ticks => {
                next.phase = SimulationPhase::Running;
                next.phase_ticks = 0;
                next.cooldown_started = Some(now);
            }
            SimulationPhase::Running => {
                let elapsed = next
                    .cooldown_started
                    .map(|started| now.saturating_duration_since(started))
                    .unwrap_or_default();
                if next.phase_ticks >= config.cooldown_ticks
                    || elapsed >= config.cooldown_time()
                    || next.alpha < config.alpha_min
                {
                    next = next.freeze();
                }
            }
            SimulationPhase::Frozen if next.alpha < config.alpha_min => {
                next.alpha = 0.0;
            }
            _ => {}
        }

        next
    }

    fn freeze(self) -> Self {
        Self {
            phase: SimulationPhase::Frozen,
            phase_ticks: 0,
            alpha: 0.0,
            cooldown_started: None,
            ..self
        }
    }

    pub fn reheat(self) -> Self {
        Self {
            phase: SimulationPhase::Reheated,
            phase_ticks: 0,
            alpha: 1.0,
            cooldown_started: None,
            ..self
        }
    }

    pub fn nudge(self, energy: f32) -> Self {
        Self {
            alpha: self.alpha.max(energy.clamp(0.0, 1.0)),
            ..self
        }
    }
}
