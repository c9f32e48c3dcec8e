//! Physical constants for a table
//!
//! Supplied by the game layer, optionally as JSON. Missing fields fall back
//! to the defaults in `consts`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::Table;

/// Rejected settings
#[derive(Debug)]
pub enum SettingsError {
    /// The JSON itself could not be parsed
    Parse(serde_json::Error),
    /// A field is outside its allowed range
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Parse(e) => write!(f, "invalid settings JSON: {}", e),
            SettingsError::OutOfRange {
                field,
                value,
                expected,
            } => write!(f, "{} = {} (expected {})", field, value, expected),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Parse(e) => Some(e),
            SettingsError::OutOfRange { .. } => None,
        }
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e)
    }
}

/// Table and material constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Table ===
    pub table_half_width: f64,
    pub table_half_height: f64,

    // === Balls ===
    pub ball_radius: f64,
    pub ball_mass: f64,
    /// Cap on a cue strike speed (px/s)
    pub max_cue_speed: f64,

    // === Materials ===
    /// Ball-ball coefficient of restitution, in [0, 1]
    pub ball_restitution: f64,
    /// Ball-rail (and ball-obstacle) coefficient of restitution, in [0, 1]
    pub rail_restitution: f64,
    /// Ball-cloth sliding friction coefficient
    pub sliding_friction: f64,
    pub gravity: f64,
    /// Balls slower than this are stopped outright
    pub min_speed: f64,

    // === Cadence ===
    /// Heartbeat (redraw + friction) ticks per simulated second
    pub heartbeat_hz: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            table_half_width: TABLE_HALF_WIDTH,
            table_half_height: TABLE_HALF_HEIGHT,

            ball_radius: BALL_RADIUS,
            ball_mass: BALL_MASS,
            max_cue_speed: MAX_CUE_SPEED,

            ball_restitution: BALL_BALL_RESTITUTION,
            rail_restitution: BALL_RAIL_RESTITUTION,
            sliding_friction: SLIDING_FRICTION,
            gravity: GRAVITY,
            min_speed: MIN_SPEED,

            heartbeat_hz: HEARTBEAT_HZ,
        }
    }
}

impl Settings {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        log::info!("Loaded settings from JSON");
        Ok(settings)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Check every field is in range
    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = [
            ("table_half_width", self.table_half_width),
            ("table_half_height", self.table_half_height),
            ("ball_radius", self.ball_radius),
            ("ball_mass", self.ball_mass),
            ("max_cue_speed", self.max_cue_speed),
            ("heartbeat_hz", self.heartbeat_hz),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SettingsError::OutOfRange {
                    field,
                    value,
                    expected: "> 0",
                });
            }
        }

        let unit = [
            ("ball_restitution", self.ball_restitution),
            ("rail_restitution", self.rail_restitution),
        ];
        for (field, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(SettingsError::OutOfRange {
                    field,
                    value,
                    expected: "in [0, 1]",
                });
            }
        }

        let non_negative = [
            ("sliding_friction", self.sliding_friction),
            ("gravity", self.gravity),
            ("min_speed", self.min_speed),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SettingsError::OutOfRange {
                    field,
                    value,
                    expected: ">= 0",
                });
            }
        }

        if self.ball_radius >= self.table_half_width.min(self.table_half_height) {
            return Err(SettingsError::OutOfRange {
                field: "ball_radius",
                value: self.ball_radius,
                expected: "a ball that fits on the table",
            });
        }

        Ok(())
    }

    /// Magnitude of the cloth deceleration, (1 + μ)·g
    #[inline]
    pub fn friction_deceleration(&self) -> f64 {
        (1.0 + self.sliding_friction) * self.gravity
    }

    /// Seconds between heartbeats
    #[inline]
    pub fn heartbeat_period(&self) -> f64 {
        1.0 / self.heartbeat_hz
    }

    pub fn table(&self) -> Table {
        Table::new(self.table_half_width, self.table_half_height)
    }

    /// Frictionless, perfectly elastic settings (billiard-ball gas)
    pub fn elastic() -> Self {
        Self {
            ball_restitution: 1.0,
            rail_restitution: 1.0,
            sliding_friction: 0.0,
            gravity: 0.0,
            min_speed: 0.0,
            ..Self::default()
        }
    }
}
