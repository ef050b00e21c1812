//! Generic `Drivetrain` trait for two-wheeled bases that can drive straight
//! and turn on the spot.
//!
//! Calls are fire-and-continue: an implementation starts the motion and
//! returns without waiting for the wheels to stop.  Issuing a second call
//! while the first is still running adds to it; nothing in this trait cancels
//! an in-flight motion except [`Drivetrain::stop`].

use wheelbot_types::{DistanceUnit, WheelError};

/// A wheeled base driven by relative move and rotate commands.
pub trait Drivetrain: Send {
    /// Stable identifier used in logs and fault reports, e.g. `"alvik"`.
    fn id(&self) -> &str;

    /// Drive straight by `distance` in `unit`.  Positive is forward.
    ///
    /// # Errors
    ///
    /// Returns [`WheelError::HardwareFault`] if the motion cannot be started.
    fn move_by(&mut self, distance: i64, unit: &DistanceUnit) -> Result<(), WheelError>;

    /// Turn on the spot by `angle` degrees.  Positive is counter-clockwise
    /// (left).
    ///
    /// # Errors
    ///
    /// Returns [`WheelError::HardwareFault`] if the rotation cannot be started.
    fn rotate_by(&mut self, angle: i64) -> Result<(), WheelError>;

    /// Halt any motion in progress.
    ///
    /// # Errors
    ///
    /// Returns [`WheelError::HardwareFault`] if the motors do not acknowledge.
    fn stop(&mut self) -> Result<(), WheelError>;

    /// Signal that the command endpoint is up, e.g. by lighting status LEDs.
    /// Called once, after the listening socket is bound.  Does nothing by
    /// default.
    ///
    /// # Errors
    ///
    /// Returns [`WheelError::HardwareFault`] if the signal cannot be shown.
    fn ready(&mut self) -> Result<(), WheelError> {
        Ok(())
    }
}

impl<D: Drivetrain + ?Sized> Drivetrain for Box<D> {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn move_by(&mut self, distance: i64, unit: &DistanceUnit) -> Result<(), WheelError> {
        (**self).move_by(distance, unit)
    }

    fn rotate_by(&mut self, angle: i64) -> Result<(), WheelError> {
        (**self).rotate_by(angle)
    }

    fn stop(&mut self) -> Result<(), WheelError> {
        (**self).stop()
    }

    fn ready(&mut self) -> Result<(), WheelError> {
        (**self).ready()
    }
}
