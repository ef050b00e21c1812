//! Request line parsing.
//!
//! [`CommandRequest::parse`] is total: any input, including garbage, yields a
//! request.  Whatever could not be recognised is simply absent, and the
//! decoder decides whether that absence matters.

use std::collections::HashMap;

/// HTTP method of a request.  Only `GET` is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Other(String),
}

impl Method {
    fn parse(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            other => Method::Other(other.to_string()),
        }
    }
}

/// The parts of one inbound request the server cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub method: Method,
    /// Request target up to (not including) `?`.
    pub path: String,
    /// Query parameters; the last occurrence of a repeated name wins.  A
    /// parameter that was not sent has no entry, while `name=` maps to `""`.
    pub query: HashMap<String, String>,
}

impl CommandRequest {
    /// Parse the request line at the start of `raw`.
    ///
    /// Headers and body are ignored.  A missing request line produces an
    /// empty method and path.
    pub fn parse(raw: &str) -> Self {
        let request_line = raw.lines().next().unwrap_or_default();
        let mut tokens = request_line.split_whitespace();
        let method = Method::parse(tokens.next().unwrap_or_default());
        let target = tokens.next().unwrap_or_default();

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (target, HashMap::new()),
        };

        Self {
            method,
            path: path.to_string(),
            query,
        }
    }

    /// Value of query parameter `name`, if it was sent.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

/// Split `a=1&b=2` into a map.  Segments without `=` are skipped; a segment
/// is split on its first `=` only.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter_map(|segment| segment.split_once('='))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
