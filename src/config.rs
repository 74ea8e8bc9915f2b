//! Application settings, loaded from an optional JSON file.
//!
//! Every field has a default, so a partial file such as
//! `{"log_level": "debug"}` is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An RGBA colour with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color4 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color4 {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [c(self.r), c(self.g), c(self.b), c(self.a)]
    }

    pub fn to_egui(self) -> egui::Color32 {
        let [r, g, b, a] = self.to_rgba8();
        egui::Color32::from_rgba_unmultiplied(r, g, b, a)
    }
}

/// Fill and outline of a committed polygon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub fill: Color4,
    pub stroke: Color4,
    pub stroke_width: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DraftStyle {
    pub stroke: Color4,
    pub stroke_width: f32,
    pub vertex_radius: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderStyle {
    pub polygon: ShapeStyle,
    pub selected: ShapeStyle,
    pub draft: DraftStyle,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            polygon: ShapeStyle {
                fill: Color4::rgba(0.0, 0.0, 1.0, 0.2),
                stroke: Color4::rgba(0.0, 0.0, 1.0, 1.0),
                stroke_width: 1.0,
            },
            selected: ShapeStyle {
                fill: Color4::rgba(1.0, 0.0, 0.0, 0.3),
                stroke: Color4::rgba(1.0, 0.0, 0.0, 1.0),
                stroke_width: 2.0,
            },
            draft: DraftStyle {
                stroke: Color4::rgba(0.0, 128.0 / 255.0, 0.0, 1.0),
                stroke_width: 2.0,
                vertex_radius: 5.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter string understood by `env_logger`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    pub style: RenderStyle,
    pub log_level: LogLevel,
}

impl AnnotatorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
