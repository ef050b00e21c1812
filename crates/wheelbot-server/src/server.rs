//! [`CommandServer`] – the device-side HTTP command endpoint.
//!
//! Listens on `0.0.0.0:80` by default (configurable via
//! [`CommandServer::with_addr`]).
//!
//! Connections are served one at a time: accept, read, route, respond,
//! close, and only then accept the next.  Two commands can therefore never
//! reach the drivetrain out of arrival order or interleaved.

use std::borrow::Cow;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;
use wheelbot_hal::Drivetrain;
use wheelbot_types::{MotionPolicy, WheelError};

use crate::dispatcher::Dispatcher;
use crate::router::Router;

/// Default listen address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:80";

/// Upper bound on the bytes read from one connection.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 1024;

/// How long a client may take to send its request.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Pause after a failed `accept` before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// How long to keep discarding client bytes after the response is sent.
/// Closing with unread input resets the connection under the client.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(250);

/// The compiled-in control page.
pub const CONTROL_PAGE: &str = include_str!("control.html");

// ---------------------------------------------------------------------------
// CommandServer
// ---------------------------------------------------------------------------

/// Builder for the command endpoint.  Owns the drivetrain until it is handed
/// back by [`ListeningServer::serve_until`].
///
/// # Example
///
/// ```rust,no_run
/// use wheelbot_hal::LoggingDrivetrain;
/// use wheelbot_server::CommandServer;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     CommandServer::new(LoggingDrivetrain::default())
///         .with_addr("0.0.0.0:8080")
///         .run()
///         .await
///         .expect("command server failed");
/// }
/// ```
pub struct CommandServer<D> {
    drivetrain: D,
    addr: String,
    page: Cow<'static, str>,
    policy: MotionPolicy,
    max_request_bytes: usize,
    read_timeout: Duration,
}

impl<D: Drivetrain> CommandServer<D> {
    /// Create a server for `drivetrain` with default settings.
    pub fn new(drivetrain: D) -> Self {
        Self {
            drivetrain,
            addr: DEFAULT_ADDR.to_string(),
            page: Cow::Borrowed(CONTROL_PAGE),
            policy: MotionPolicy::default(),
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Override the listen address (builder-style).
    pub fn with_addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    /// Serve `page` at `/` instead of the built-in control page.
    pub fn with_page(mut self, page: impl Into<Cow<'static, str>>) -> Self {
        self.page = page.into();
        self
    }

    pub fn with_policy(mut self, policy: MotionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// A budget of zero is raised to one byte.
    pub fn with_max_request_bytes(mut self, bytes: usize) -> Self {
        self.max_request_bytes = bytes.max(1);
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn policy(&self) -> MotionPolicy {
        self.policy
    }

    /// Bind the listening socket, then give the drivetrain its ready signal.
    /// A drivetrain that cannot show the signal is logged; commands are still
    /// served.
    ///
    /// # Errors
    ///
    /// Returns [`WheelError::Bind`] if the address cannot be bound.
    pub async fn bind(mut self) -> Result<ListeningServer<D>, WheelError> {
        let listener = TcpListener::bind(&self.addr)
            .await
            .map_err(|e| WheelError::Bind {
                addr: self.addr.clone(),
                details: e.to_string(),
            })?;

        info!(addr = %self.addr, policy = ?self.policy, "command server listening");
        if let Err(e) = self.drivetrain.ready() {
            warn!(drivetrain = self.drivetrain.id(), error = %e, "ready signal failed");
        }

        Ok(ListeningServer {
            listener,
            router: Router::new(self.drivetrain, Dispatcher::new(self.policy), self.page),
            max_request_bytes: self.max_request_bytes,
            read_timeout: self.read_timeout,
        })
    }

    /// Bind and serve until the process is killed.
    ///
    /// # Errors
    ///
    /// Returns [`WheelError::Bind`] if the address cannot be bound.
    pub async fn run(self) -> Result<(), WheelError> {
        self.bind()
            .await?
            .serve_until(std::future::pending::<()>())
            .await;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ListeningServer
// ---------------------------------------------------------------------------

/// A bound server, ready to accept connections.
pub struct ListeningServer<D> {
    listener: TcpListener,
    router: Router<D>,
    max_request_bytes: usize,
    read_timeout: Duration,
}

impl<D: Drivetrain> ListeningServer<D> {
    /// The address actually bound; useful after binding port `0`.
    ///
    /// # Errors
    ///
    /// Returns [`WheelError::Transport`] if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr, WheelError> {
        self.listener
            .local_addr()
            .map_err(|e| WheelError::Transport(e.to_string()))
    }

    /// Serve connections until `shutdown` resolves.
    ///
    /// A connection already being handled is finished first.  On shutdown the
    /// drivetrain is stopped, the listening socket is closed, and the
    /// drivetrain is returned to the caller.
    pub async fn serve_until<F>(mut self, shutdown: F) -> D
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let accepted = tokio::select! {
                biased;
                () = &mut shutdown => break,
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    let span = info_span!("connection", request_id = %Uuid::new_v4(), %peer);
                    self.serve_connection(stream).instrument(span).await;
                }
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }

        let ListeningServer {
            listener, router, ..
        } = self;
        drop(listener);

        let mut drivetrain = router.into_drivetrain();
        match drivetrain.stop() {
            Ok(()) => info!(drivetrain = drivetrain.id(), "drivetrain stopped, listener closed"),
            Err(e) => error!(error = %e, "drivetrain did not stop on shutdown"),
        }
        drivetrain
    }

    // Exactly one response per connection; the stream is dropped (closed) on
    // every path out of this function.
    async fn serve_connection(&mut self, mut stream: TcpStream) {
        let raw = match read_request(&mut stream, self.max_request_bytes, self.read_timeout).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "read failed, abandoning connection");
                return;
            }
        };

        let response = self.router.handle(&raw);
        info!(status = response.status.code(), "responding");

        if let Err(e) = stream.write_all(&response.to_bytes()).await {
            warn!(error = %e, "write failed, abandoning connection");
            return;
        }
        if let Err(e) = stream.shutdown().await {
            warn!(error = %e, "shutdown failed");
            return;
        }
        let _ = tokio::time::timeout(DRAIN_TIMEOUT, drain(&mut stream)).await;
    }
}

// ---------------------------------------------------------------------------
// Bounded request read
// ---------------------------------------------------------------------------

/// Read until the end of the request head, `budget` bytes, EOF, or
/// `deadline`, whichever comes first.  A timeout is not an error: whatever
/// arrived is returned and the router decides whether it is usable.
async fn read_request(
    stream: &mut TcpStream,
    budget: usize,
    deadline: Duration,
) -> Result<Vec<u8>, WheelError> {
    let mut buf = vec![0u8; budget];
    let mut filled = 0;

    let read = async {
        while filled < budget {
            let n = stream.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
            if buf[..filled].windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        Ok::<(), std::io::Error>(())
    };

    match tokio::time::timeout(deadline, read).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(WheelError::Transport(e.to_string())),
        Err(_) => warn!(bytes = filled, "read deadline expired"),
    }

    buf.truncate(filled);
    Ok(buf)
}

async fn drain(stream: &mut TcpStream) {
    let mut scratch = [0u8; 512];
    while let Ok(n) = stream.read(&mut scratch).await {
        if n == 0 {
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
