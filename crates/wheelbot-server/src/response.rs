//! The three responses the server ever writes.

use std::fmt::Write as _;

use wheelbot_types::CommandError;

/// Body returned for an applied command.
pub const OK_BODY: &str = "OK";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
        }
    }
}

/// A complete HTTP/1.1 response.  Always sent with `Connection: close`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub content_type: Option<&'static str>,
    pub body: String,
}

impl Response {
    /// 200 with the control page.
    pub fn html(page: &str) -> Self {
        Self {
            status: Status::Ok,
            content_type: Some("text/html; charset=utf-8"),
            body: page.to_string(),
        }
    }

    /// 200 `OK` for an applied command.
    pub fn applied() -> Self {
        Self {
            status: Status::Ok,
            content_type: Some("text/plain"),
            body: OK_BODY.to_string(),
        }
    }

    /// 400 with the rejection reason as plain text.
    pub fn bad_request(error: &CommandError) -> Self {
        Self {
            status: Status::BadRequest,
            content_type: Some("text/plain"),
            body: error.to_string(),
        }
    }

    /// 404 with an empty body.
    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            content_type: None,
            body: String::new(),
        }
    }

    /// Serialise status line, headers and body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\n",
            self.status.code(),
            self.status.reason()
        );
        if let Some(content_type) = self.content_type {
            let _ = write!(head, "Content-Type: {content_type}\r\n");
        }
        let _ = write!(
            head,
            "Content-Length: {}\r\nConnection: close\r\n\r\n",
            self.body.len()
        );

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(self.body.as_bytes());
        bytes
    }
}
