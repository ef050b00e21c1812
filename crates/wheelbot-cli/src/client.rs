//! Operator-side HTTP client for the robot's command endpoint.
//!
//! Issues `GET {base}/command?dir=…&distance=…&unit=…` and reports what came
//! back.  A network failure is returned as an error for the caller to log;
//! it never aborts a hold sequence.  A unit that would add its own query
//! parameters is refused before anything is sent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};
use wheelbot_types::{Direction, DistanceUnit};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Granularity at which a paused hold re-checks its stop flag.
const STOP_POLL: Duration = Duration::from_millis(20);

/// Characters that would change the meaning of the command query.
const RESERVED_UNIT_CHARS: &[char] = &['&', '=', '#', '?', '%'];

/// Check that `unit` can be placed in the query string verbatim.
///
/// # Errors
///
/// Returns a human-readable reason when the unit carries a query delimiter,
/// whitespace or a control character.
pub fn check_unit(unit: &str) -> Result<(), String> {
    match unit
        .chars()
        .find(|c| RESERVED_UNIT_CHARS.contains(c) || c.is_whitespace() || c.is_control())
    {
        Some(c) => Err(format!(
            "unit '{}' contains disallowed character {c:?}",
            unit.escape_debug()
        )),
        None => Ok(()),
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("failed to build HTTP client: {0}")]
    Build(reqwest::Error),

    #[error("refusing to send: {0}")]
    InvalidUnit(String),

    #[error("robot unreachable at {url}: {source}")]
    Network { url: String, source: reqwest::Error },
}

/// Status and body of one command response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Tally of a repeated command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoldSummary {
    pub applied: usize,
    pub rejected: usize,
    pub failed: usize,
    /// The stop flag ended the hold before every repeat was sent.
    pub interrupted: bool,
}

impl HoldSummary {
    pub fn sent(&self) -> usize {
        self.applied + self.rejected + self.failed
    }
}

pub struct CommandClient {
    base_url: String,
    repeat_interval: Duration,
    http: reqwest::blocking::Client,
}

impl CommandClient {
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] if the HTTP client cannot be created.
    pub fn new(base_url: &str, repeat_interval: Duration) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            repeat_interval,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn command_url(&self, direction: Direction, distance: u32, unit: &DistanceUnit) -> String {
        format!(
            "{}/command?dir={direction}&distance={distance}&unit={unit}",
            self.base_url
        )
    }

    /// Send one command.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUnit`] when `unit` fails [`check_unit`],
    /// and [`ClientError::Network`] when no HTTP response was received.
    pub fn send(
        &self,
        direction: Direction,
        distance: u32,
        unit: &DistanceUnit,
    ) -> Result<Reply, ClientError> {
        check_unit(unit.as_str()).map_err(ClientError::InvalidUnit)?;
        let url = self.command_url(direction, distance, unit);
        let network = |source| ClientError::Network {
            url: url.clone(),
            source,
        };

        let response = self.http.get(&url).send().map_err(network)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(network)?;

        info!(%direction, distance, %unit, status, body = %body, "command sent");
        Ok(Reply { status, body })
    }

    /// Send the same command `repeats` times, pausing the repeat interval
    /// between sends, the way a held button on the control page does.
    ///
    /// `stop` is checked before every send and throughout each pause; once
    /// it is set no further command goes out and the partial tally is
    /// returned.
    pub fn hold(
        &self,
        direction: Direction,
        distance: u32,
        unit: &DistanceUnit,
        repeats: usize,
        stop: &AtomicBool,
    ) -> HoldSummary {
        let mut summary = HoldSummary::default();
        for i in 0..repeats {
            if (i > 0 && !self.pause(stop)) || stop.load(Ordering::SeqCst) {
                info!(sent = summary.sent(), repeats, "hold released");
                summary.interrupted = true;
                break;
            }
            match self.send(direction, distance, unit) {
                Ok(reply) if reply.is_success() => summary.applied += 1,
                Ok(reply) => {
                    warn!(status = reply.status, body = %reply.body, "command rejected");
                    summary.rejected += 1;
                }
                Err(ClientError::InvalidUnit(reason)) => {
                    warn!(%reason, "hold abandoned");
                    summary.failed += 1;
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "command failed");
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    /// Sleep for the repeat interval.  Returns `false` if `stop` was set
    /// before the interval elapsed.
    fn pause(&self, stop: &AtomicBool) -> bool {
        let deadline = Instant::now() + self.repeat_interval;
        loop {
            if stop.load(Ordering::SeqCst) {
                return false;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return true;
            }
            thread::sleep(remaining.min(STOP_POLL));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::mpsc;
    use tokio::sync::oneshot;
    use wheelbot_hal::SimDrivetrain;
    use wheelbot_server::CommandServer;
    use wheelbot_types::DriveCall;

    /// A real command server on its own thread and runtime, so the blocking
    /// client can talk to it.
    struct Robot {
        addr: SocketAddr,
        stop: oneshot::Sender<()>,
        thread: thread::JoinHandle<SimDrivetrain>,
    }

    impl Robot {
        fn start() -> Self {
            let (addr_tx, addr_rx) = mpsc::channel();
            let (stop, stopped) = oneshot::channel::<()>();
            let thread = thread::spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("runtime");
                runtime.block_on(async move {
                    let listening = CommandServer::new(SimDrivetrain::new())
                        .with_addr("127.0.0.1:0")
                        .bind()
                        .await
                        .expect("bind");
                    addr_tx.send(listening.local_addr().expect("addr")).expect("send addr");
                    listening
                        .serve_until(async {
                            let _ = stopped.await;
                        })
                        .await
                })
            });
            let addr = addr_rx.recv().expect("server address");
            Self { addr, stop, thread }
        }

        fn url(&self) -> String {
            format!("http://{}", self.addr)
        }

        fn finish(self) -> SimDrivetrain {
            let _ = self.stop.send(());
            self.thread.join().expect("server thread panicked")
        }
    }

    /// Bind then drop, giving a port nobody listens on.
    fn unreachable_url() -> String {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        format!("http://127.0.0.1:{port}")
    }

    #[test]
    fn command_url_has_all_parameters() {
        let client = CommandClient::new("http://robot.local/", Duration::ZERO).unwrap();
        assert_eq!(client.base_url(), "http://robot.local");
        assert_eq!(
            client.command_url(Direction::Left, 15, &DistanceUnit::centimeters()),
            "http://robot.local/command?dir=left&distance=15&unit=cm"
        );
    }

    #[test]
    fn unreachable_robot_is_a_network_error() {
        let client = CommandClient::new(&unreachable_url(), Duration::ZERO).unwrap();
        let err = client
            .send(Direction::Up, 5, &DistanceUnit::centimeters())
            .unwrap_err();
        assert!(matches!(err, ClientError::Network { .. }));
    }

    #[test]
    fn send_reaches_the_drivetrain() {
        let robot = Robot::start();
        let client = CommandClient::new(&robot.url(), Duration::ZERO).unwrap();

        let reply = client
            .send(Direction::Down, 12, &DistanceUnit::centimeters())
            .unwrap();
        assert_eq!(reply, Reply { status: 200, body: "OK".to_string() });

        let dt = robot.finish();
        assert_eq!(
            dt.calls()[0],
            DriveCall::Move {
                distance: -12,
                unit: DistanceUnit::centimeters(),
            }
        );
    }

    #[test]
    fn zero_distance_comes_back_as_400() {
        let robot = Robot::start();
        let client = CommandClient::new(&robot.url(), Duration::ZERO).unwrap();

        let reply = client
            .send(Direction::Up, 0, &DistanceUnit::centimeters())
            .unwrap();
        assert_eq!(reply.status, 400);
        assert_eq!(reply.body, "invalid distance");

        robot.finish();
    }

    #[test]
    fn hold_repeats_in_order() {
        let robot = Robot::start();
        let client = CommandClient::new(&robot.url(), Duration::from_millis(10)).unwrap();

        let held = AtomicBool::new(false);
        let summary = client.hold(Direction::Left, 10, &DistanceUnit::centimeters(), 3, &held);
        assert_eq!(
            summary,
            HoldSummary {
                applied: 3,
                rejected: 0,
                failed: 0,
                interrupted: false,
            }
        );
        assert_eq!(summary.sent(), 3);

        let dt = robot.finish();
        assert_eq!(
            dt.calls(),
            &[
                DriveCall::Rotate { angle: 10 },
                DriveCall::Rotate { angle: 10 },
                DriveCall::Rotate { angle: 10 },
                DriveCall::Stop,
            ]
        );
    }

    #[test]
    fn hold_keeps_going_after_failures() {
        let client = CommandClient::new(&unreachable_url(), Duration::ZERO).unwrap();

        let held = AtomicBool::new(false);
        let summary = client.hold(Direction::Right, 5, &DistanceUnit::centimeters(), 2, &held);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.sent(), 2);
    }

    #[test]
    fn check_unit_rejects_query_delimiters() {
        for unit in ["cm", "deg", "m/s", "mm", ""] {
            assert!(check_unit(unit).is_ok(), "unit {unit:?}");
        }
        for unit in ["cm&dir=down", "a=b", "cm#", "cm?", "50%", "c m", "cm\n", "\u{7f}"] {
            assert!(check_unit(unit).is_err(), "unit {unit:?}");
        }
    }

    #[test]
    fn unit_carrying_extra_parameters_is_never_sent() {
        let robot = Robot::start();
        let client = CommandClient::new(&robot.url(), Duration::ZERO).unwrap();

        let err = client
            .send(Direction::Up, 5, &DistanceUnit::new("cm&dir=down"))
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidUnit(_)));

        let held = AtomicBool::new(false);
        let summary = client.hold(Direction::Up, 5, &DistanceUnit::new("cm#"), 4, &held);
        assert_eq!(summary.sent(), 1);
        assert_eq!(summary.applied, 0);

        // Only the shutdown stop reached the drivetrain.
        let dt = robot.finish();
        assert_eq!(dt.calls(), &[DriveCall::Stop]);
    }

    #[test]
    fn hold_sends_nothing_once_stopped() {
        let client = CommandClient::new(&unreachable_url(), Duration::ZERO).unwrap();

        let released = AtomicBool::new(true);
        let summary = client.hold(Direction::Up, 5, &DistanceUnit::centimeters(), 10, &released);
        assert_eq!(summary.sent(), 0);
        assert!(summary.interrupted);
    }

    #[test]
    fn stop_flag_set_mid_hold_ends_the_repeats() {
        let robot = Robot::start();
        let client = CommandClient::new(&robot.url(), Duration::from_millis(30)).unwrap();
        let released = AtomicBool::new(false);

        let summary = thread::scope(|scope| {
            scope.spawn(|| {
                thread::sleep(Duration::from_millis(150));
                released.store(true, Ordering::SeqCst);
            });
            client.hold(Direction::Up, 5, &DistanceUnit::centimeters(), 1000, &released)
        });

        assert!(summary.interrupted);
        assert!(summary.applied >= 1);
        assert!(summary.sent() < 100, "hold kept going: {summary:?}");

        // Every move that went out, then the shutdown stop; nothing after.
        let dt = robot.finish();
        assert_eq!(dt.calls().len(), summary.applied + 1);
        assert_eq!(dt.calls().last(), Some(&DriveCall::Stop));
    }
}
