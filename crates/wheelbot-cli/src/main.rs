//! `wheelbot` – device server and operator console in one binary.
//!
//! ```text
//! wheelbot serve                          run the command server on this device
//! wheelbot send <dir> [distance] [unit]   send one command to the robot
//! wheelbot drive [robot-url]              interactive driving session
//! wheelbot init-config                    write ~/.wheelbot/config.toml with defaults
//! ```
//!
//! Ctrl-C during `serve` stops the drivetrain and closes the listening
//! socket before the process exits.  During `drive` it releases a running
//! `hold`.

mod client;
mod config;
mod repl;
mod telemetry;

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use tokio::sync::watch;
use tracing::{error, warn};
use wheelbot_hal::LoggingDrivetrain;
use wheelbot_server::CommandServer;

use crate::client::CommandClient;
use crate::config::Config;

fn main() -> ExitCode {
    let _guard = telemetry::init_tracing("wheelbot");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cfg = load_config();

    match args.first().map(String::as_str) {
        Some("serve") => serve(&cfg),
        Some("send") => send(&cfg, &args[1..]),
        Some("drive") => drive(&cfg, args.get(1).map(String::as_str)),
        Some("init-config") => init_config(&cfg),
        Some("help" | "--help" | "-h") | None => {
            print_usage();
            ExitCode::SUCCESS
        }
        Some(other) => {
            println!("{} '{}'", "Unknown command:".red(), other.yellow());
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn load_config() -> Config {
    let (cfg, problem) = config::load();
    if let Some(e) = problem {
        warn!(error = %e, "config unusable, falling back to defaults");
    }
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// serve
// ─────────────────────────────────────────────────────────────────────────────

fn serve(cfg: &Config) -> ExitCode {
    print_banner();

    let mut server = CommandServer::new(LoggingDrivetrain::new("wheelbot"))
        .with_addr(cfg.bind_addr.clone())
        .with_policy(cfg.motion_policy)
        .with_max_request_bytes(cfg.max_request_bytes)
        .with_read_timeout(Duration::from_millis(cfg.read_timeout_ms));
    match cfg.load_page() {
        Ok(Some(page)) => server = server.with_page(page),
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "custom page unavailable");
            return ExitCode::FAILURE;
        }
    }

    let (stop_tx, mut stop_rx) = watch::channel(false);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the robot …".yellow().bold());
        let _ = stop_tx.send(true);
    }) {
        warn!(
            error = %e,
            "failed to install Ctrl-C handler; the robot will not be stopped on exit"
        );
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "cannot start runtime");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async move {
        let listening = match server.bind().await {
            Ok(listening) => listening,
            Err(e) => {
                println!("{}: {}", "Cannot start server".red(), e);
                return ExitCode::FAILURE;
            }
        };
        if let Ok(addr) = listening.local_addr() {
            println!("  Control page at {}\n", format!("http://{addr}/").bold());
        }

        listening
            .serve_until(async move {
                let _ = stop_rx.wait_for(|stop| *stop).await;
            })
            .await;

        println!("{}", "  ✓ Drivetrain stopped, socket released.".green());
        ExitCode::SUCCESS
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// send / drive
// ─────────────────────────────────────────────────────────────────────────────

fn client_for(cfg: &Config, url: &str) -> Option<CommandClient> {
    match CommandClient::new(url, Duration::from_millis(cfg.repeat_interval_ms)) {
        Ok(client) => Some(client),
        Err(e) => {
            println!("{}: {}", "Client error".red(), e);
            None
        }
    }
}

fn send(cfg: &Config, args: &[String]) -> ExitCode {
    let tokens: Vec<&str> = args.iter().map(String::as_str).collect();
    let motion = match repl::parse_motion(&tokens) {
        Ok(motion) => motion,
        Err(msg) => {
            println!("{} {}", "✗".red(), msg);
            return ExitCode::FAILURE;
        }
    };
    let Some(client) = client_for(cfg, &cfg.robot_url) else {
        return ExitCode::FAILURE;
    };

    match client.send(motion.direction, motion.distance, &motion.unit) {
        Ok(reply) if reply.is_success() => {
            println!("{} {} {}", "✓".green(), reply.status, reply.body);
            ExitCode::SUCCESS
        }
        Ok(reply) => {
            println!("{} {} {}", "✗".red(), reply.status, reply.body);
            ExitCode::FAILURE
        }
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            ExitCode::FAILURE
        }
    }
}

fn drive(cfg: &Config, url: Option<&str>) -> ExitCode {
    print_banner();
    let Some(client) = client_for(cfg, url.unwrap_or(&cfg.robot_url)) else {
        return ExitCode::FAILURE;
    };

    let release = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&release);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!(error = %e, "failed to install Ctrl-C handler");
    }

    repl::run(&client, release);
    ExitCode::SUCCESS
}

// ─────────────────────────────────────────────────────────────────────────────
// init-config
// ─────────────────────────────────────────────────────────────────────────────

fn init_config(cfg: &Config) -> ExitCode {
    let path = config::config_path();
    if path.exists() {
        println!("  Config already present at {}", path.display().to_string().bold());
        return ExitCode::SUCCESS;
    }
    match config::save(cfg) {
        Ok(()) => {
            println!(
                "  {} Config saved to {}",
                "✓".green().bold(),
                path.display().to_string().bold()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}: {}", "Error saving config".red(), e);
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner / usage
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!(
        "  {} {}",
        "wheelbot".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Remote steering for a small wheeled robot");
    println!();
}

fn print_usage() {
    print_banner();
    println!("  {}", "Usage".bold());
    println!("    wheelbot serve                          run the command server");
    println!("    wheelbot send <dir> [distance] [unit]   send one command");
    println!("    wheelbot drive [robot-url]              interactive session");
    println!("    wheelbot init-config                    write default config");
    println!();
    println!(
        "  Config: {}",
        config::config_path().display().to_string().dimmed()
    );
    println!();
}
