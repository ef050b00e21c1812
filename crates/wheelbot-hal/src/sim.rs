//! In-process simulated drivetrain for tests without a robot.
//!
//! [`SimDrivetrain`] records every call it accepts, in order, so tests can
//! assert both *which* call the server made and *how many* it made.  It can
//! also be switched into a fault state to exercise the error path.
//!
//! # Example
//!
//! ```rust
//! use wheelbot_hal::{Drivetrain, SimDrivetrain};
//! use wheelbot_types::{DistanceUnit, DriveCall};
//!
//! let mut dt = SimDrivetrain::new();
//! dt.move_by(5, &DistanceUnit::centimeters()).unwrap();
//!
//! assert_eq!(
//!     dt.calls(),
//!     &[DriveCall::Move { distance: 5, unit: DistanceUnit::centimeters() }]
//! );
//! ```

use wheelbot_types::{DistanceUnit, DriveCall, WheelError};

use crate::drivetrain::Drivetrain;

/// A simulated drivetrain that records the calls it accepts.
#[derive(Debug, Default)]
pub struct SimDrivetrain {
    calls: Vec<DriveCall>,
    attempts: usize,
    fault: Option<String>,
    ready: bool,
}

impl SimDrivetrain {
    /// Create a healthy simulated drivetrain with an empty call log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a drivetrain whose every call fails with `details`.
    pub fn faulty(details: impl Into<String>) -> Self {
        Self {
            fault: Some(details.into()),
            ..Self::default()
        }
    }

    /// Clear or set the fault state after construction.
    pub fn set_fault(&mut self, details: Option<String>) {
        self.fault = details;
    }

    /// Every call that was accepted, oldest first.
    pub fn calls(&self) -> &[DriveCall] {
        &self.calls
    }

    /// Number of motion and stop calls made, accepted or not.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Whether the ready signal has been shown.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    fn check_fault(&self) -> Result<(), WheelError> {
        match &self.fault {
            Some(details) => Err(WheelError::HardwareFault {
                component: "sim_drivetrain".to_string(),
                details: details.clone(),
            }),
            None => Ok(()),
        }
    }

    fn record(&mut self, call: DriveCall) -> Result<(), WheelError> {
        self.attempts += 1;
        self.check_fault()?;
        self.calls.push(call);
        Ok(())
    }
}

impl Drivetrain for SimDrivetrain {
    fn id(&self) -> &str {
        "sim_drivetrain"
    }

    fn move_by(&mut self, distance: i64, unit: &DistanceUnit) -> Result<(), WheelError> {
        self.record(DriveCall::Move {
            distance,
            unit: unit.clone(),
        })
    }

    fn rotate_by(&mut self, angle: i64) -> Result<(), WheelError> {
        self.record(DriveCall::Rotate { angle })
    }

    fn stop(&mut self) -> Result<(), WheelError> {
        self.record(DriveCall::Stop)
    }

    fn ready(&mut self) -> Result<(), WheelError> {
        self.check_fault()?;
        self.ready = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls_in_order() {
        let mut dt = SimDrivetrain::new();
        dt.move_by(-5, &DistanceUnit::new("mm")).unwrap();
        dt.rotate_by(20).unwrap();
        dt.stop().unwrap();

        assert_eq!(
            dt.calls(),
            &[
                DriveCall::Move {
                    distance: -5,
                    unit: DistanceUnit::new("mm"),
                },
                DriveCall::Rotate { angle: 20 },
                DriveCall::Stop,
            ]
        );
        assert_eq!(dt.attempts(), 3);
    }

    #[test]
    fn faulty_drivetrain_rejects_and_records_nothing() {
        let mut dt = SimDrivetrain::faulty("left motor stalled");
        let err = dt.rotate_by(15).unwrap_err();
        assert!(err.to_string().contains("left motor stalled"));
        assert!(dt.calls().is_empty());
        assert_eq!(dt.attempts(), 1);
    }

    #[test]
    fn ready_is_not_a_motion_call() {
        let mut dt = SimDrivetrain::new();
        assert!(!dt.is_ready());
        dt.ready().unwrap();
        assert!(dt.is_ready());
        assert!(dt.calls().is_empty());
        assert_eq!(dt.attempts(), 0);

        let mut faulty = SimDrivetrain::faulty("led driver missing");
        assert!(faulty.ready().is_err());
        assert!(!faulty.is_ready());
    }

    #[test]
    fn fault_can_be_cleared() {
        let mut dt = SimDrivetrain::faulty("brownout");
        assert!(dt.stop().is_err());
        dt.set_fault(None);
        dt.stop().unwrap();
        assert_eq!(dt.calls(), &[DriveCall::Stop]);
    }
}
