//! REPL – interactive driving session against a running robot.
//!
//! Supported input:
//!   up|down|left|right [distance] [unit]   – one command
//!   hold <dir> <count> [distance] [unit]   – repeat a command, paced
//!   /help                                   – show this list
//!   /quit | /exit                           – leave the session
//!
//! Ctrl-C while a hold is running releases it; Ctrl-C at the prompt ends the
//! session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use wheelbot_types::{DEFAULT_DISTANCE, Direction, DistanceUnit};

use crate::client::{self, CommandClient};

/// One parsed line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Move(MotionArgs),
    Hold { motion: MotionArgs, count: usize },
    Help,
    Quit,
}

/// Direction plus the optional distance and unit that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionArgs {
    pub direction: Direction,
    pub distance: u32,
    pub unit: DistanceUnit,
}

/// Parse `<dir> [distance] [unit]`.
pub fn parse_motion(tokens: &[&str]) -> Result<MotionArgs, String> {
    let (dir, rest) = tokens
        .split_first()
        .ok_or_else(|| "expected a direction: up, down, left or right".to_string())?;
    let direction = dir
        .parse::<Direction>()
        .map_err(|_| format!("unknown direction '{dir}'"))?;

    let distance = match rest.first() {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| format!("distance '{raw}' is not a whole number"))?,
        None => DEFAULT_DISTANCE.get(),
    };
    let unit = match rest.get(1) {
        Some(raw) => {
            client::check_unit(raw)?;
            DistanceUnit::new(*raw)
        }
        None => DistanceUnit::default(),
    };

    if rest.len() > 2 {
        return Err(format!("unexpected '{}'", rest[2..].join(" ")));
    }

    Ok(MotionArgs {
        direction,
        distance,
        unit,
    })
}

pub fn parse_line(line: &str) -> Result<ReplCommand, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["/help"] => Ok(ReplCommand::Help),
        ["/quit"] | ["/exit"] => Ok(ReplCommand::Quit),
        ["hold", dir, count, rest @ ..] => {
            let count = count
                .parse::<usize>()
                .map_err(|_| format!("count '{count}' is not a whole number"))?;
            let mut motion_tokens = vec![*dir];
            motion_tokens.extend_from_slice(rest);
            Ok(ReplCommand::Hold {
                motion: parse_motion(&motion_tokens)?,
                count,
            })
        }
        ["hold", ..] => Err("usage: hold <dir> <count> [distance] [unit]".to_string()),
        _ => parse_motion(&tokens).map(ReplCommand::Move),
    }
}

/// Entry point for the interactive session.
///
/// `release` is set by the Ctrl-C handler.  A running hold stops sending as
/// soon as it is set; the flag is cleared again before the next prompt.
pub fn run(client: &CommandClient, release: Arc<AtomicBool>) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("{}: {}", "Cannot open terminal".red(), e);
            return;
        }
    };

    println!(
        "  Driving {}. Type {} for commands.\n",
        client.base_url().bold(),
        "/help".bold().cyan()
    );

    loop {
        release.store(false, Ordering::SeqCst);
        let line = match editor.readline("wheelbot> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        match parse_line(line) {
            Ok(ReplCommand::Help) => print_help(),
            Ok(ReplCommand::Quit) => {
                println!("{}", "Goodbye.".green());
                break;
            }
            Ok(ReplCommand::Move(m)) => match client.send(m.direction, m.distance, &m.unit) {
                Ok(reply) if reply.is_success() => println!("  {} {}", "✓".green(), reply.body),
                Ok(reply) => println!("  {} {} {}", "✗".red(), reply.status, reply.body),
                Err(e) => println!("  {} {}", "✗".red(), e),
            },
            Ok(ReplCommand::Hold { motion: m, count }) => {
                let summary = client.hold(m.direction, m.distance, &m.unit, count, &release);
                if summary.interrupted {
                    println!("  {}", "released".yellow());
                }
                println!(
                    "  sent {}: {} applied, {} rejected, {} failed",
                    summary.sent(),
                    summary.applied.to_string().green(),
                    summary.rejected.to_string().yellow(),
                    summary.failed.to_string().red()
                );
            }
            Err(msg) => println!("  {} {}", "✗".red(), msg),
        }
    }
}

fn print_help() {
    println!();
    println!("  {}", "Commands".bold());
    println!("    {}  one command", "up|down|left|right [distance] [unit]".cyan());
    println!("    {}  repeat, paced", "hold <dir> <count> [distance] [unit]".cyan());
    println!("    {}                                 this list", "/help".cyan());
    println!("    {}                         leave", "/quit | /exit".cyan());
    println!();
}
