//! [`Router`] – turns one raw request into one [`Response`].
//!
//! | Request | Response |
//! |---|---|
//! | `GET /` | 200, control page |
//! | `GET /command…` | parse → decode → dispatch; 200 `OK` or 400 with reason |
//! | request line not newline-terminated | 400 `incomplete request` |
//! | anything else | 404, empty body |
//!
//! The router owns the drivetrain.  Nothing else in the server can reach it.

use std::borrow::Cow;

use tracing::{debug, warn};
use wheelbot_hal::Drivetrain;
use wheelbot_types::{ActuationOutcome, CommandError};

use crate::decoder;
use crate::dispatcher::Dispatcher;
use crate::request::{CommandRequest, Method};
use crate::response::Response;

pub const INDEX_PATH: &str = "/";
pub const COMMAND_PATH: &str = "/command";

pub struct Router<D> {
    drivetrain: D,
    dispatcher: Dispatcher,
    page: Cow<'static, str>,
}

impl<D: Drivetrain> Router<D> {
    pub fn new(drivetrain: D, dispatcher: Dispatcher, page: Cow<'static, str>) -> Self {
        Self {
            drivetrain,
            dispatcher,
            page,
        }
    }

    /// Route the bytes read from one connection.
    pub fn handle(&mut self, raw: &[u8]) -> Response {
        let text = String::from_utf8_lossy(raw);
        if !text.contains('\n') {
            warn!(bytes = raw.len(), "request line not terminated");
            return Response::bad_request(&CommandError::IncompleteRequest);
        }

        let request = CommandRequest::parse(&text);
        debug!(method = ?request.method, path = %request.path, "routing");

        match (&request.method, request.path.as_str()) {
            (Method::Get, INDEX_PATH) => Response::html(&self.page),
            (Method::Get, path) if path.starts_with(COMMAND_PATH) => self.handle_command(&request),
            _ => Response::not_found(),
        }
    }

    fn handle_command(&mut self, request: &CommandRequest) -> Response {
        let command = match decoder::decode(request) {
            Ok(command) => command,
            Err(e) => {
                warn!(reason = %e, query = ?request.query, "command rejected");
                return Response::bad_request(&e);
            }
        };

        match self.dispatcher.dispatch(&mut self.drivetrain, &command) {
            ActuationOutcome::Applied => Response::applied(),
            ActuationOutcome::Rejected(e) => Response::bad_request(&e),
        }
    }

    pub fn drivetrain(&self) -> &D {
        &self.drivetrain
    }

    pub fn into_drivetrain(self) -> D {
        self.drivetrain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Status;
    use wheelbot_hal::SimDrivetrain;
    use wheelbot_types::{DistanceUnit, DriveCall, MotionPolicy};

    const PAGE: &str = "<html>test page</html>";

    fn router() -> Router<SimDrivetrain> {
        Router::new(
            SimDrivetrain::new(),
            Dispatcher::default(),
            Cow::Borrowed(PAGE),
        )
    }

    #[test]
    fn index_serves_page_without_actuation() {
        let mut r = router();
        let resp = r.handle(b"GET / HTTP/1.1\r\nHost: robot\r\n\r\n");
        assert_eq!(resp.status, Status::Ok);
        assert_eq!(resp.body, PAGE);
        assert_eq!(resp.content_type, Some("text/html; charset=utf-8"));
        assert_eq!(r.drivetrain().attempts(), 0);
    }

    #[test]
    fn up_without_distance_moves_five_cm() {
        let mut r = router();
        let resp = r.handle(b"GET /command?dir=up HTTP/1.1\r\n\r\n");
        assert_eq!(resp.status, Status::Ok);
        assert_eq!(resp.body, "OK");
        assert_eq!(
            r.drivetrain().calls(),
            &[DriveCall::Move {
                distance: 5,
                unit: DistanceUnit::centimeters(),
            }]
        );
    }

    #[test]
    fn right_rotates_negative() {
        let mut r = router();
        let resp = r.handle(b"GET /command?dir=right&distance=20&unit=deg HTTP/1.1\r\n\r\n");
        assert_eq!(resp.status, Status::Ok);
        assert_eq!(r.drivetrain().calls(), &[DriveCall::Rotate { angle: -20 }]);
    }

    #[test]
    fn missing_direction_is_400_without_actuation() {
        let mut r = router();
        let resp = r.handle(b"GET /command?distance=5 HTTP/1.1\r\n\r\n");
        assert_eq!(resp.status, Status::BadRequest);
        assert_eq!(resp.body, "missing or invalid direction");
        assert_eq!(r.drivetrain().attempts(), 0);
    }

    #[test]
    fn bare_command_path_is_400() {
        let mut r = router();
        let resp = r.handle(b"GET /command HTTP/1.1\r\n\r\n");
        assert_eq!(resp.status, Status::BadRequest);
        assert_eq!(r.drivetrain().attempts(), 0);
    }

    #[test]
    fn non_numeric_distance_is_400_without_actuation() {
        let mut r = router();
        let resp = r.handle(b"GET /command?dir=down&distance=abc HTTP/1.1\r\n\r\n");
        assert_eq!(resp.status, Status::BadRequest);
        assert_eq!(resp.body, "invalid distance");
        assert_eq!(r.drivetrain().attempts(), 0);
    }

    #[test]
    fn unknown_path_is_404_empty() {
        let mut r = router();
        for raw in [
            &b"GET /favicon.ico HTTP/1.1\r\n\r\n"[..],
            b"GET /index.html HTTP/1.1\r\n\r\n",
            b"\r\n\r\n",
        ] {
            let resp = r.handle(raw);
            assert_eq!(resp.status, Status::NotFound);
            assert!(resp.body.is_empty());
        }
        assert_eq!(r.drivetrain().attempts(), 0);
    }

    #[test]
    fn non_get_method_is_404_without_actuation() {
        let mut r = router();
        let resp = r.handle(b"POST /command?dir=up HTTP/1.1\r\n\r\n");
        assert_eq!(resp.status, Status::NotFound);
        assert_eq!(r.drivetrain().attempts(), 0);
    }

    #[test]
    fn unterminated_request_line_is_rejected() {
        let mut r = router();
        for raw in [&b""[..], b"GET /command?dir=up", b"GET /command?dir=up HTTP/1.1"] {
            let resp = r.handle(raw);
            assert_eq!(resp.status, Status::BadRequest);
            assert_eq!(resp.body, "incomplete request");
        }
        assert_eq!(r.drivetrain().attempts(), 0);
    }

    #[test]
    fn invalid_utf8_does_not_panic() {
        let mut r = router();
        let resp = r.handle(b"GET /command?dir=\xff\xfe HTTP/1.1\r\n\r\n");
        assert_eq!(resp.status, Status::BadRequest);
        assert_eq!(r.drivetrain().attempts(), 0);
    }

    #[test]
    fn actuation_fault_is_400() {
        let mut r = Router::new(
            SimDrivetrain::faulty("encoder lost"),
            Dispatcher::default(),
            Cow::Borrowed(PAGE),
        );
        let resp = r.handle(b"GET /command?dir=left HTTP/1.1\r\n\r\n");
        assert_eq!(resp.status, Status::BadRequest);
        assert_eq!(resp.body, "actuation fault");
    }

    #[test]
    fn preempt_router_stops_before_moving() {
        let mut r = Router::new(
            SimDrivetrain::new(),
            Dispatcher::new(MotionPolicy::Preempt),
            Cow::Borrowed(PAGE),
        );
        r.handle(b"GET /command?dir=left&distance=90 HTTP/1.1\r\n\r\n");
        assert_eq!(
            r.drivetrain().calls(),
            &[DriveCall::Stop, DriveCall::Rotate { angle: 90 }]
        );
    }
}
