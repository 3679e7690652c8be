use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::style::normalize_color;

/// User units per point at 96 DPI.
pub const PX_PER_PT: f64 = 96.0 / 72.0;

const BUILTIN_PRESETS: &[(&str, &str)] = &[
    ("full", include_str!("../presets/full.toml")),
    ("half", include_str!("../presets/half.toml")),
    ("custom", include_str!("../presets/custom.toml")),
];

const BREWER_SET1: &[&str] = &[
    "#e41a1c", "#377eb8", "#4daf4a", "#984ea3", "#ff7f00", "#ffff33", "#a65628", "#f781bf",
    "#999999",
];
const BREWER_DARK2: &[&str] = &[
    "#1b9e77", "#d95f02", "#7570b3", "#e7298a", "#66a61e", "#e6ab02", "#a6761d", "#666666",
];
const CHAMON_PAL: &[&str] = &[
    "#3e89c8", "#e41a1c", "#5ed046", "#000000", "#ffab26", "#ffff33",
];

const PALETTES: &[(&str, Option<&[&str]>)] = &[
    ("brewer_set1", Some(BREWER_SET1)),
    ("brewer_dark2", Some(BREWER_DARK2)),
    ("chamon_pal", Some(CHAMON_PAL)),
    ("original", None),
];

pub const DEFAULT_BBOX_COLOR: &str = "#262626";
pub const DEFAULT_GRID_COLOR: &str = "#dfdfdf";

/// Target size and typography of the republished figure. Sizes are in user
/// units except the two font sizes, which are in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(deserialize_with = "length")]
    pub width: f64,
    #[serde(deserialize_with = "length")]
    pub height: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_color")]
    pub font_color: String,
    #[serde(deserialize_with = "length")]
    pub ticks_size: f64,
    #[serde(deserialize_with = "length")]
    pub labels_size: f64,
    #[serde(deserialize_with = "length")]
    pub plot_stroke_width: f64,
    #[serde(deserialize_with = "length")]
    pub bbox_stroke_width: f64,
    #[serde(deserialize_with = "length")]
    pub grid_stroke_width: f64,
}

fn default_font_family() -> String {
    "CMU Serif".to_string()
}

fn default_font_color() -> String {
    DEFAULT_BBOX_COLOR.to_string()
}

fn length<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => parse_length(&text).map_err(serde::de::Error::custom),
    }
}

/// Parses a CSS length into user units (96 DPI). A bare number is already
/// in user units.
pub fn parse_length(value: &str) -> Result<f64> {
    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);
    let factor = match unit.to_ascii_lowercase().as_str() {
        "" | "px" => 1.0,
        "pt" => PX_PER_PT,
        "pc" => 16.0,
        "mm" => 96.0 / 25.4,
        "cm" => 96.0 / 2.54,
        "in" => 96.0,
        _ => {
            return Err(Error::InvalidLength {
                value: value.to_string(),
            });
        }
    };
    number
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v * factor)
        .ok_or_else(|| Error::InvalidLength {
            value: value.to_string(),
        })
}

/// Command line overrides applied on top of a preset.
#[derive(Debug, Clone, Default)]
pub struct PresetOverrides {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub font_family: Option<String>,
    pub font_color: Option<String>,
    pub ticks_size: Option<f64>,
    pub labels_size: Option<f64>,
    pub plot_stroke_width: Option<f64>,
    /// Applies to both the bounding box and the grid.
    pub bbox_stroke_width: Option<f64>,
}

impl Preset {
    pub fn from_builtin(name: &str) -> Result<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        let content = BUILTIN_PRESETS
            .iter()
            .find(|(n, _)| *n == normalized)
            .map(|(_, c)| *c)
            .ok_or_else(|| Error::UnknownFormat {
                name: name.to_string(),
                available: Self::list_builtins().join(", "),
            })?;
        Self::from_toml(content)
    }

    pub fn list_builtins() -> Vec<&'static str> {
        BUILTIN_PRESETS.iter().map(|(n, _)| *n).collect()
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let preset: Preset = toml::from_str(content).map_err(|e| Error::InvalidPreset {
            message: format!("TOML: {}", e),
        })?;
        preset.validated()
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let preset: Preset = serde_yaml::from_str(content).map_err(|e| Error::InvalidPreset {
            message: format!("YAML: {}", e),
        })?;
        preset.validated()
    }

    /// Tries TOML first, then YAML.
    pub fn from_file_content(content: &str) -> Result<Self> {
        Self::from_toml(content).or_else(|toml_err| {
            Self::from_yaml(content).map_err(|yaml_err| Error::InvalidPreset {
                message: format!("not a TOML ({}) or YAML ({}) preset", toml_err, yaml_err),
            })
        })
    }

    pub fn apply(&mut self, overrides: &PresetOverrides) {
        if let Some(v) = overrides.width {
            self.width = v;
        }
        if let Some(v) = overrides.height {
            self.height = v;
        }
        if let Some(v) = &overrides.font_family {
            self.font_family = v.clone();
        }
        if let Some(v) = &overrides.font_color {
            self.font_color = normalize_color(v);
        }
        if let Some(v) = overrides.ticks_size {
            self.ticks_size = v;
        }
        if let Some(v) = overrides.labels_size {
            self.labels_size = v;
        }
        if let Some(v) = overrides.plot_stroke_width {
            self.plot_stroke_width = v;
        }
        if let Some(v) = overrides.bbox_stroke_width {
            self.bbox_stroke_width = v;
            self.grid_stroke_width = v;
        }
    }

    pub fn validated(self) -> Result<Self> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(Error::InvalidPreset {
                message: format!("target size must be positive, got {} x {}", self.width, self.height),
            });
        }
        if !(self.ticks_size > 0.0 && self.labels_size > 0.0) {
            return Err(Error::InvalidPreset {
                message: "font sizes must be positive".to_string(),
            });
        }
        Ok(self)
    }
}

/// Resolves a palette name. `original` yields `None`: curves keep their
/// colors.
pub fn palette(name: &str) -> Result<Option<Vec<String>>> {
    let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
    PALETTES
        .iter()
        .find(|(n, _)| *n == normalized)
        .map(|(_, colors)| colors.map(|c| c.iter().map(|s| s.to_string()).collect()))
        .ok_or_else(|| Error::UnknownPalette {
            name: name.to_string(),
            available: list_palettes().join(", "),
        })
}

pub fn list_palettes() -> Vec<&'static str> {
    PALETTES.iter().map(|(n, _)| *n).collect()
}

/// Splits a comma separated label list. An empty string means "no labels".
pub fn parse_tick_labels(raw: &str) -> Option<Vec<String>> {
    if raw.trim().is_empty() {
        return None;
    }
    Some(raw.split(',').map(|tick| tick.trim().to_string()).collect())
}
