//! `wheelbot-hal` – the actuation boundary.
//!
//! The command server only ever talks to the [`Drivetrain`] trait.  Real
//! motor drivers live outside this workspace and implement it; the two
//! drivers shipped here exist for tests and for running the server on a
//! desk without a robot attached.
//!
//! # Modules
//!
//! - [`drivetrain`] – the [`Drivetrain`] trait.
//! - [`sim`] – [`SimDrivetrain`]: records every accepted call and can be
//!   told to fault.
//! - [`logging`] – [`LoggingDrivetrain`]: accepts everything and traces it.

pub mod drivetrain;
pub mod logging;
pub mod sim;

pub use drivetrain::Drivetrain;
pub use logging::LoggingDrivetrain;
pub use sim::SimDrivetrain;
