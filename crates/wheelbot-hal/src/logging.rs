//! A drivetrain that only traces what it is asked to do.
//!
//! The `wheelbot serve` binary runs on this when no motor driver is linked,
//! so the control page and operator client can be tried end to end on any
//! machine.

use tracing::info;
use wheelbot_types::{DistanceUnit, WheelError};

use crate::drivetrain::Drivetrain;

/// Accepts every call and logs it at `info`.
pub struct LoggingDrivetrain {
    id: String,
}

impl LoggingDrivetrain {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl Default for LoggingDrivetrain {
    fn default() -> Self {
        Self::new("logging_drivetrain")
    }
}

impl Drivetrain for LoggingDrivetrain {
    fn id(&self) -> &str {
        &self.id
    }

    fn move_by(&mut self, distance: i64, unit: &DistanceUnit) -> Result<(), WheelError> {
        info!(drivetrain = %self.id, distance, unit = %unit, "move");
        Ok(())
    }

    fn rotate_by(&mut self, angle: i64) -> Result<(), WheelError> {
        info!(drivetrain = %self.id, angle, "rotate");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), WheelError> {
        info!(drivetrain = %self.id, "stop");
        Ok(())
    }

    fn ready(&mut self) -> Result<(), WheelError> {
        info!(drivetrain = %self.id, "ready");
        Ok(())
    }
}
