//! Declarative snap options and their coercion into a typed [`SnapConfig`].
//!
//! Hosts hand the behavior a string-keyed option map. Values are coerced the
//! way the declarative attribute syntax expects: modes are lower-cased enum
//! names, vectors may be arrays, `{x, y, z}` tables or `"x y z"` strings.
//! Options that only apply to some modes live inside the mode variant.

use crate::selector::Selector;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors raised while coercing raw option values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A vector option could not be read as three numbers.
    #[error("option `{option}` expects a 3-component vector, got {value}")]
    InvalidVector {
        /// Option name.
        option: &'static str,
        /// Offending value, rendered for diagnostics.
        value: String,
    },
    /// A scalar option could not be read as a number.
    #[error("option `{option}` expects a number, got {value}")]
    InvalidNumber {
        /// Option name.
        option: &'static str,
        /// Offending value.
        value: String,
    },
    /// A flag option could not be read as a boolean.
    #[error("option `{option}` expects true or false, got {value}")]
    InvalidBool {
        /// Option name.
        option: &'static str,
        /// Offending value.
        value: String,
    },
    /// A string option received a non-string value.
    #[error("option `{option}` expects a string, got {value}")]
    InvalidText {
        /// Option name.
        option: &'static str,
        /// Offending value.
        value: String,
    },
    /// The orientation policy name is unknown.
    #[error("unknown orientation policy `{0}` (expected live-yaw or compose-external)")]
    UnknownOrientation(String),
    /// A `name: value` property string segment had no colon.
    #[error("malformed property `{0}` (expected `name: value`)")]
    MalformedProperty(String),
}

/// Raw, uncoerced option value as written by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// `true` / `false`.
    Bool(bool),
    /// Any number.
    Number(f64),
    /// Free text; also the form every value takes in property strings.
    Text(String),
    /// Numeric array.
    List(Vec<f64>),
    /// `{x, y, z}` table; missing components default to zero.
    Xyz {
        /// X component.
        #[serde(default)]
        x: f64,
        /// Y component.
        #[serde(default)]
        y: f64,
        /// Z component.
        #[serde(default)]
        z: f64,
    },
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Number(n) => write!(f, "{n}"),
            OptionValue::Text(s) => write!(f, "{s:?}"),
            OptionValue::List(values) => write!(f, "{values:?}"),
            OptionValue::Xyz { x, y, z } => write!(f, "{{x: {x}, y: {y}, z: {z}}}"),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Number(value)
    }
}

impl From<[f64; 3]> for OptionValue {
    fn from(value: [f64; 3]) -> Self {
        OptionValue::List(value.to_vec())
    }
}

/// String-keyed option map handed to the behavior by its host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawOptions(BTreeMap<String, OptionValue>);

impl RawOptions {
    /// Empty option map (every option takes its default).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<OptionValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace an option.
    pub fn insert(&mut self, name: &str, value: impl Into<OptionValue>) -> Option<OptionValue> {
        self.0.insert(name.to_string(), value.into())
    }

    /// Look up an option by name.
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.0.get(name)
    }

    /// Iterate in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.0.iter()
    }

    /// Number of options present.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no options are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, OptionValue)> for RawOptions {
    fn from_iter<I: IntoIterator<Item = (K, OptionValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Parse the declarative `name: value; name: value` attribute syntax.
///
/// Every value is kept as text; coercion happens in [`SnapConfig::from_options`].
pub fn parse_property_string(input: &str) -> Result<RawOptions, ConfigError> {
    let mut options = RawOptions::new();
    for segment in input.split(';') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let (name, value) = segment
            .split_once(':')
            .ok_or_else(|| ConfigError::MalformedProperty(segment.to_string()))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::MalformedProperty(segment.to_string()));
        }
        options.insert(name, value.trim());
    }
    Ok(options)
}

/// How normal alignment keeps the entity's heading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrientationPolicy {
    /// Take the yaw from the entity's live rotation every cycle.
    #[default]
    LiveYaw,
    /// Compose the entity's rotation onto the tilt when something other than
    /// this behavior changed it since the last snap.
    ComposeExternal,
}

impl OrientationPolicy {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "live-yaw" | "live" => Ok(Self::LiveYaw),
            "compose-external" | "compose" => Ok(Self::ComposeExternal),
            other => Err(ConfigError::UnknownOrientation(other.to_string())),
        }
    }
}

/// Ray settings shared by both surface modes.
#[derive(Debug, Clone, PartialEq)]
pub struct RaySettings {
    /// Entities whose children are candidates for intersection.
    pub objects: Selector,
    /// Signed distance along `direction` from the origin to the ray start.
    pub ray_start: f32,
    /// World-space ray direction (not necessarily normalized).
    pub direction: Vec3,
}

impl Default for RaySettings {
    fn default() -> Self {
        Self {
            objects: Selector::all(),
            ray_start: 0.0,
            direction: Vec3::NEG_Y,
        }
    }
}

/// Snap algorithm together with its mode-specific options.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapMode {
    /// Move to the nearest ray hit.
    SurfacePosition(RaySettings),
    /// Move to the nearest ray hit and align the up axis with its normal.
    SurfaceNormalAlign {
        /// Ray settings.
        ray: RaySettings,
        /// Heading policy.
        orientation: OrientationPolicy,
    },
    /// Quantize the position to a lattice.
    GridSnap {
        /// Cell size per axis.
        grid: Vec3,
    },
    /// A mode name nobody recognizes; snapping does nothing.
    Unrecognized(String),
}

impl SnapMode {
    /// Canonical name of the mode.
    pub fn name(&self) -> &str {
        match self {
            SnapMode::SurfacePosition(_) => "surface-position",
            SnapMode::SurfaceNormalAlign { .. } => "surface-normal-align",
            SnapMode::GridSnap { .. } => "grid-snap",
            SnapMode::Unrecognized(name) => name,
        }
    }

    /// Ray settings for surface modes.
    pub fn ray(&self) -> Option<&RaySettings> {
        match self {
            SnapMode::SurfacePosition(ray) | SnapMode::SurfaceNormalAlign { ray, .. } => Some(ray),
            _ => None,
        }
    }
}

impl fmt::Display for SnapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable configuration snapshot for one activation/update cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapConfig {
    /// Algorithm and mode-gated options.
    pub mode: SnapMode,
    /// Local-space translation applied after snapping.
    pub offset: Vec3,
    /// Re-snap every frame.
    pub continuous: bool,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            mode: SnapMode::SurfacePosition(RaySettings::default()),
            offset: Vec3::ZERO,
            continuous: false,
        }
    }
}

const GRID_DEFAULT: Vec3 = Vec3::ONE;

impl SnapConfig {
    /// Coerce a raw option map, filling defaults for anything missing.
    pub fn from_options(options: &RawOptions) -> Result<Self, ConfigError> {
        let mut mode_name = String::from("surface-position");
        let mut offset = Vec3::ZERO;
        let mut continuous = false;
        let mut grid = GRID_DEFAULT;
        let mut ray = RaySettings::default();
        let mut orientation = OrientationPolicy::default();

        for (name, value) in options.iter() {
            match name.as_str() {
                "mode" | "type" => mode_name = text("mode", value)?.to_lowercase(),
                "offset" => offset = vector("offset", value)?,
                "grid" => grid = vector("grid", value)?,
                "objects" => ray.objects = Selector::parse(text("objects", value)?),
                "rayStart" | "ray_start" => ray.ray_start = number("rayStart", value)?,
                "direction" => ray.direction = vector("direction", value)?,
                "continuous" => continuous = flag("continuous", value)?,
                "orientation" => orientation = OrientationPolicy::parse(text("orientation", value)?)?,
                other => debug!(option = other, "ignoring unknown snap option"),
            }
        }

        let mode = match mode_name.trim() {
            "surface-position" | "hitposition" => SnapMode::SurfacePosition(ray),
            "surface-normal-align" | "hitnormal" => SnapMode::SurfaceNormalAlign { ray, orientation },
            "grid-snap" | "gridsnap" => SnapMode::GridSnap { grid },
            other => {
                trace!(mode = other, "unrecognized snap mode");
                SnapMode::Unrecognized(other.to_string())
            }
        };

        Ok(Self {
            mode,
            offset,
            continuous,
        })
    }

    /// Parse a `name: value; ...` property string into a configuration.
    pub fn from_property_string(input: &str) -> Result<Self, ConfigError> {
        Self::from_options(&parse_property_string(input)?)
    }
}

fn text<'a>(option: &'static str, value: &'a OptionValue) -> Result<&'a str, ConfigError> {
    match value {
        OptionValue::Text(s) => Ok(s.as_str()),
        other => Err(ConfigError::InvalidText {
            option,
            value: other.to_string(),
        }),
    }
}

fn number(option: &'static str, value: &OptionValue) -> Result<f32, ConfigError> {
    let invalid = || ConfigError::InvalidNumber {
        option,
        value: value.to_string(),
    };
    match value {
        OptionValue::Number(n) => Ok(*n as f32),
        OptionValue::Text(s) => s.trim().parse::<f32>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn flag(option: &'static str, value: &OptionValue) -> Result<bool, ConfigError> {
    let invalid = || ConfigError::InvalidBool {
        option,
        value: value.to_string(),
    };
    match value {
        OptionValue::Bool(b) => Ok(*b),
        OptionValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" | "" => Ok(false),
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}

fn vector(option: &'static str, value: &OptionValue) -> Result<Vec3, ConfigError> {
    let invalid = || ConfigError::InvalidVector {
        option,
        value: value.to_string(),
    };
    match value {
        OptionValue::List(values) if values.len() == 3 => {
            Ok(Vec3::new(values[0] as f32, values[1] as f32, values[2] as f32))
        }
        OptionValue::Xyz { x, y, z } => Ok(Vec3::new(*x as f32, *y as f32, *z as f32)),
        OptionValue::Text(s) => {
            let parts = s
                .split_whitespace()
                .map(str::parse::<f32>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| invalid())?;
            match parts.as_slice() {
                [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
                _ => Err(invalid()),
            }
        }
        _ => Err(invalid()),
    }
}
