use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub max_nodes: MaxNodes,
    pub layout: LayoutConfig,
    pub camera: CameraConfig,
    pub style: StyleConfig,
    pub resize: ResizeConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct MaxNodes(pub usize);

impl Default for MaxNodes {
    fn default() -> Self {
        Self(300)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub warmup_ticks: u32,
    pub cooldown_ticks: u32,
    pub cooldown_time_ms: u64,
    pub alpha_min: f32,
    pub velocity_decay: f32,
    /// Negative values repel.
    pub repulsion_strength: f32,
    pub repulsion_max_distance: f32,
    pub link_distance: f32,
    pub link_strength: f32,
    pub center_strength: f32,
    pub collision_radius: f32,
    pub collision_strength: f32,
    pub frozen_link_strength: f32,
    pub drag_energy: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            warmup_ticks: 50,
            cooldown_ticks: 100,
            cooldown_time_ms: 1500,
            alpha_min: 0.001,
            velocity_decay: 0.4,
            repulsion_strength: -180.0,
            repulsion_max_distance: 420.0,
            link_distance: 100.0,
            link_strength: 1.0,
            center_strength: 0.03,
            collision_radius: 42.0,
            collision_strength: 0.7,
            frozen_link_strength: 0.02,
            drag_energy: 0.1,
        }
    }
}

impl LayoutConfig {
    pub fn cooldown_time(&self) -> Duration {
        Duration::from_millis(self.cooldown_time_ms)
    }

    /// Per-tick decay that takes alpha from 1 to `alpha_min` in 300 ticks.
    pub fn alpha_decay(&self) -> f32 {
        1.0 - self.alpha_min.clamp(1e-6, 0.999).powf(1.0 / 300.0)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub zoom_step: f32,
    pub label_zoom_threshold: f32,
    pub fit_padding: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 8.0,
            zoom_step: 1.2,
            label_zoom_threshold: 1.5,
            fit_padding: 48.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub node_radius: f32,
    pub connected_radius: f32,
    pub highlighted_radius: f32,
    pub selected_radius: f32,
    pub label_width: f32,
    pub label_font: f32,
    pub min_font: f32,
    pub max_font: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            node_radius: 5.0,
            connected_radius: 6.5,
            highlighted_radius: 7.5,
            selected_radius: 9.0,
            label_width: 96.0,
            label_font: 12.0,
            min_font: 2.5,
            max_font: 12.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    pub min_delta: f32,
    pub min_interval_ms: u64,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            min_delta: 8.0,
            min_interval_ms: 150,
        }
    }
}

impl ResizeConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nodes.0 == 0 {
            return Err(ConfigError::Invalid("max_nodes must be at least 1".to_owned()));
        }

        let camera = &self.camera;
        if !(camera.min_zoom > 0.0 && camera.min_zoom <= camera.max_zoom) {
            return Err(ConfigError::Invalid(format!(
                "zoom range [{}, {}] is empty or non-positive",
                camera.min_zoom, camera.max_zoom
            )));
        }
        if camera.zoom_step <= 1.0 {
            return Err(ConfigError::Invalid(format!(
                "zoom_step must be greater than 1, got {}",
                camera.zoom_step
            )));
        }

        let style = &self.style;
        if style.min_font > style.max_font {
            return Err(ConfigError::Invalid(format!(
                "font range [{}, {}] is empty",
                style.min_font, style.max_font
            )));
        }
        if !(style.selected_radius > style.highlighted_radius
            && style.highlighted_radius > style.connected_radius
            && style.connected_radius > style.node_radius)
        {
            return Err(ConfigError::Invalid(
                "node radii must order selected > highlighted > connected > default".to_owned(),
            ));
        }
        let footprint = self.label_footprint();
        if self.layout.collision_radius <= footprint {
            return Err(ConfigError::Invalid(format!(
                "collision_radius {} must exceed node radius plus label footprint ({footprint})",
                self.layout.collision_radius
            )));
        }
        if self.layout.repulsion_strength > 0.0 {
            return Err(ConfigError::Invalid(
                "repulsion_strength must be negative".to_owned(),
            ));
        }

        Ok(())
    }

    /// World-space reach of a selected node and half its label at the zoom
    /// where labels first appear.
    pub fn label_footprint(&self) -> f32 {
        let threshold = self.camera.label_zoom_threshold.max(f32::EPSILON);
        self.style.selected_radius + self.style.label_width / 2.0 / threshold
    }
}
