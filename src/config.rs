//! Editor configuration.
//!
//! Every field has a default, so a configuration file only needs the values
//! it overrides:
//!
//! ```json
//! { "abandoned_drag": "discard", "spring": { "tension": 170.0 } }
//! ```

use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};
use crate::geometry::Point;

/// Box metrics used to lay out blocks and their port rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
    pub block_width: f32,
    /// Height of the title bar above the first port row.
    pub title_height: f32,
    pub row_height: f32,
    /// Top-left corner of the first drawer slot.
    pub drawer_origin: Point,
    /// Vertical gap between drawer templates.
    pub drawer_spacing: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            block_width: 160.0,
            title_height: 28.0,
            row_height: 22.0,
            drawer_origin: Point::new(16.0, 16.0),
            drawer_spacing: 12.0,
        }
    }
}

/// Damped spring driving rendered block positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub tension: f32,
    pub friction: f32,
    pub mass: f32,
    /// Distance and speed under which an axis counts as settled.
    pub precision: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        // Stiff preset.
        Self {
            tension: 210.0,
            friction: 20.0,
            mass: 1.0,
            precision: 0.01,
        }
    }
}

/// What happens to a link whose drag is released away from an input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbandonedDragPolicy {
    /// Keep the link pending with its endpoints frozen at release.
    #[default]
    KeepPending,
    /// Remove the link.
    Discard,
}

/// What happens to links touching a deleted block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanglingLinkPolicy {
    /// Keep them; they stop updating and are reported as dangling.
    #[default]
    Retain,
    /// Remove them together with the block.
    Prune,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub layout: LayoutMetrics,
    pub spring: SpringConfig,
    /// Coordinate difference below which link geometry counts as unchanged.
    pub geometry_epsilon: f32,
    pub abandoned_drag: AbandonedDragPolicy,
    pub dangling_links: DanglingLinkPolicy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            layout: LayoutMetrics::default(),
            spring: SpringConfig::default(),
            geometry_epsilon: 1e-3,
            abandoned_drag: AbandonedDragPolicy::default(),
            dangling_links: DanglingLinkPolicy::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EditorConfig =
            serde_json::from_str(json).context("Failed to parse editor configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Open {}", path))?;
        Self::from_json_str(&text).with_context(|| format!("Failed to load {}", path))
    }

    pub fn validate(&self) -> EditorResult<()> {
        let l = &self.layout;
        if l.block_width <= 0.0 || l.title_height < 0.0 || l.row_height <= 0.0 {
            return Err(EditorError::Config(
                "layout sizes must be positive".to_string(),
            ));
        }
        if self.spring.mass <= 0.0 || self.spring.tension <= 0.0 || self.spring.friction < 0.0 {
            return Err(EditorError::Config(
                "spring mass and tension must be positive, friction non-negative".to_string(),
            ));
        }
        if self.spring.precision <= 0.0 {
            return Err(EditorError::Config("spring precision must be positive".to_string()));
        }
        if !(self.geometry_epsilon >= 0.0) {
            return Err(EditorError::Config(
                "geometry_epsilon must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
