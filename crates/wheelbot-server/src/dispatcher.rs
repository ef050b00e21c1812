//! [`Dispatcher`] – the only code that calls into the drivetrain.
//!
//! # Direction mapping
//!
//! | Direction | Drivetrain call |
//! |---|---|
//! | `Up` | `move_by(+distance, unit)` |
//! | `Down` | `move_by(-distance, unit)` |
//! | `Left` | `rotate_by(+distance)` |
//! | `Right` | `rotate_by(-distance)` |
//!
//! Each command maps to exactly one call (plus a leading `stop` under
//! [`MotionPolicy::Preempt`]).  Calls are not retried and the dispatcher
//! keeps no state between commands.

use tracing::{info, warn};
use wheelbot_hal::Drivetrain;
use wheelbot_types::{
    ActuationOutcome, CommandError, Direction, DistanceUnit, DriveCall, MotionCommand,
    MotionPolicy, WheelError,
};

/// A call that starts motion.  A command never plans a bare `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion<'a> {
    Move { distance: i64, unit: &'a DistanceUnit },
    Rotate { angle: i64 },
}

impl From<Motion<'_>> for DriveCall {
    fn from(motion: Motion<'_>) -> Self {
        match motion {
            Motion::Move { distance, unit } => DriveCall::Move {
                distance,
                unit: unit.clone(),
            },
            Motion::Rotate { angle } => DriveCall::Rotate { angle },
        }
    }
}

/// The drivetrain call a command translates to.
pub fn plan(command: &MotionCommand) -> Motion<'_> {
    let magnitude = i64::from(command.distance.get());
    match command.direction {
        Direction::Up => Motion::Move {
            distance: magnitude,
            unit: &command.unit,
        },
        Direction::Down => Motion::Move {
            distance: -magnitude,
            unit: &command.unit,
        },
        Direction::Left => Motion::Rotate { angle: magnitude },
        Direction::Right => Motion::Rotate { angle: -magnitude },
    }
}

/// Applies validated commands to a drivetrain under a [`MotionPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher {
    policy: MotionPolicy,
}

impl Dispatcher {
    pub fn new(policy: MotionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MotionPolicy {
        self.policy
    }

    /// Start the motion `command` describes and return without waiting for
    /// it to finish.
    ///
    /// A drivetrain error is reported as
    /// [`CommandError::ActuationFault`]; it is never swallowed.
    pub fn dispatch<D: Drivetrain + ?Sized>(
        &self,
        drivetrain: &mut D,
        command: &MotionCommand,
    ) -> ActuationOutcome {
        if self.policy == MotionPolicy::Preempt
            && let Err(e) = drivetrain.stop()
        {
            return fault(drivetrain.id(), e);
        }

        let result = match plan(command) {
            Motion::Move { distance, unit } => drivetrain.move_by(distance, unit),
            Motion::Rotate { angle } => drivetrain.rotate_by(angle),
        };

        match result {
            Ok(()) => {
                info!(
                    direction = %command.direction,
                    distance = command.distance.get(),
                    unit = %command.unit,
                    "command applied"
                );
                ActuationOutcome::Applied
            }
            Err(e) => fault(drivetrain.id(), e),
        }
    }
}

fn fault(drivetrain: &str, error: WheelError) -> ActuationOutcome {
    warn!(drivetrain, error = %error, "drivetrain rejected command");
    ActuationOutcome::Rejected(CommandError::ActuationFault(error.to_string()))
}
