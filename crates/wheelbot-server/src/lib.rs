//! `wheelbot-server` – the device-side command endpoint.
//!
//! A minimal HTTP/1.1 server that steers a [`Drivetrain`] from
//! `GET /command?dir=…` requests and serves the control page at `/`.
//!
//! # Modules
//!
//! - [`request`] – [`CommandRequest::parse`]: total request-line parser.
//! - [`decoder`] – [`decode`][decoder::decode]: validation and defaults,
//!   producing a [`MotionCommand`][wheelbot_types::MotionCommand].
//! - [`dispatcher`] – [`Dispatcher`]: direction → drivetrain call.
//! - [`router`] – [`Router`]: one raw request in, one [`Response`] out.
//! - [`response`] – the wire format of the three possible responses.
//! - [`server`] – [`CommandServer`]: sequential accept loop with scoped
//!   shutdown.
//!
//! [`Drivetrain`]: wheelbot_hal::Drivetrain

pub mod decoder;
pub mod dispatcher;
pub mod request;
pub mod response;
pub mod router;
pub mod server;

pub use dispatcher::Dispatcher;
pub use request::{CommandRequest, Method};
pub use response::{Response, Status};
pub use router::Router;
pub use server::{CONTROL_PAGE, CommandServer, DEFAULT_ADDR, ListeningServer};
