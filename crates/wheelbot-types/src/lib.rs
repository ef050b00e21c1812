//! `wheelbot-types` – value types shared by every wheelbot crate.
//!
//! Nothing in here talks to a socket or a motor.  The server crate turns raw
//! requests into these types; the HAL crate consumes them.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Distance used when a command does not carry a `distance` parameter.
pub const DEFAULT_DISTANCE: NonZeroU32 = NonZeroU32::new(5).unwrap();

/// One of the four directions the control page exposes.
///
/// Parsing is case-sensitive: only `up`, `down`, `left` and `right` are
/// accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Wire spelling of the direction (`dir=` value).
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(CommandError::MissingOrInvalidDirection),
        }
    }
}

/// Unit attached to a linear move.
///
/// The server never interprets the unit; it is handed to the drivetrain as
/// received.  Defaults to centimetres.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistanceUnit(String);

impl DistanceUnit {
    pub const CENTIMETERS: &'static str = "cm";

    pub fn new(unit: impl Into<String>) -> Self {
        Self(unit.into())
    }

    pub fn centimeters() -> Self {
        Self::new(Self::CENTIMETERS)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DistanceUnit {
    fn default() -> Self {
        Self::centimeters()
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully validated move/rotate request.
///
/// Only the decoder builds these from wire input, so a `MotionCommand` in
/// hand always has a known direction and a strictly positive distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionCommand {
    pub direction: Direction,
    pub distance: NonZeroU32,
    pub unit: DistanceUnit,
}

impl MotionCommand {
    pub fn new(direction: Direction, distance: NonZeroU32, unit: DistanceUnit) -> Self {
        Self {
            direction,
            distance,
            unit,
        }
    }
}

/// What a new command does to a motion that is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionPolicy {
    /// Issue the new call on top of whatever is running.  Held buttons add up.
    #[default]
    Additive,
    /// Stop the drivetrain first, then issue the new call.
    Preempt,
}

impl FromStr for MotionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "additive" => Ok(MotionPolicy::Additive),
            "preempt" => Ok(MotionPolicy::Preempt),
            other => Err(format!("unknown motion policy '{other}'")),
        }
    }
}

/// A single call made against the drivetrain.
///
/// Distances and angles are signed: the sign carries the direction of travel
/// (forward / counter-clockwise positive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum DriveCall {
    Move { distance: i64, unit: DistanceUnit },
    Rotate { angle: i64 },
    Stop,
}

/// Result of handling one command request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActuationOutcome {
    /// The drivetrain accepted the call.  Physical completion is not awaited.
    Applied,
    /// Nothing was actuated, or the drivetrain reported a fault.
    Rejected(CommandError),
}

impl ActuationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ActuationOutcome::Applied)
    }
}

/// Why a command request was turned down.  The `Display` text is the exact
/// reason written back to the client.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandError {
    #[error("missing or invalid direction")]
    MissingOrInvalidDirection,

    #[error("invalid distance")]
    InvalidDistance,

    /// Carries the drivetrain's own description for the logs; the client
    /// only ever sees the fixed reason.
    #[error("actuation fault")]
    ActuationFault(String),

    #[error("incomplete request")]
    IncompleteRequest,
}

/// Errors raised below the request level: hardware and transport.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum WheelError {
    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("cannot bind {addr}: {details}")]
    Bind { addr: String, details: String },

    #[error("Transport Error: {0}")]
    Transport(String),
}
