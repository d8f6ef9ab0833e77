mod terminal;

use anyhow::Result;
use colored::Colorize;
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use terminal::TerminalSink;
use timerbox::bootstrap;
use timerbox::prelude::*;
use timerbox::{VERSION as LIB_VERSION, WIDGET_NAME};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_CONFIG: &str = "timerbox.toml";

/// Shell words handled here rather than by [`Control`].
const SHELL_COMMANDS: [&str; 6] = ["help", "show", "presets", "watch", "exit", "quit"];

#[derive(Debug, PartialEq, Eq)]
enum InputKind {
    Shell,
    Control,
    Unknown,
}

fn classify(line: &str) -> InputKind {
    match line.split_whitespace().next() {
        Some(first) if SHELL_COMMANDS.contains(&first) => InputKind::Shell,
        _ if line.parse::<Control>().is_ok() => InputKind::Control,
        _ => InputKind::Unknown,
    }
}

/// Colours widget controls green, shell commands cyan and anything else red.
#[derive(Completer, Helper, Hinter, Validator)]
struct CommandHighlighter;

impl Highlighter for CommandHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let painted = match classify(line) {
            InputKind::Shell => line.cyan(),
            InputKind::Control => line.green().bold(),
            InputKind::Unknown => line.red(),
        };
        Cow::Owned(painted.to_string())
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner(presets: &[u32]) {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    const LOGO_TEXT: &str = include_str!("../logo.log");
    println!("{}", LOGO_TEXT.cyan());
    println!("{}", "=".repeat(56).dimmed());
    println!(
        "  timershell v{}  ·  {} v{}  ·  presets {:?}",
        SHELL_VERSION, WIDGET_NAME, LIB_VERSION, presets
    );
    println!("{}", "=".repeat(56).dimmed());
}

fn print_help(presets: &[u32]) {
    println!("Available commands:");
    println!("  show                  - Prints the clock, stopwatch and countdown.");
    println!("  start                 - Starts, pauses or resumes the stopwatch.");
    println!("  lap                   - Records a stopwatch lap.");
    println!("  reset                 - Resets the stopwatch and clears laps.");
    println!("  preset <MIN> | <MIN>  - Starts a countdown of MIN minutes.");
    println!("  pause                 - Pauses or resumes the countdown.");
    println!("  cancel                - Cancels the countdown.");
    println!("  presets               - Lists the configured presets ({:?}).", presets);
    println!("  watch on|off          - Echoes state changes as they happen.");
    println!("  exit                  - Quits the shell.");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config_path = env::var_os("TIMERBOX_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = TimerboxConfig::load(&config_path)?;
    info!(path = %config_path.display(), "Configuration loaded.");
    print_banner(&config.presets);

    let scheduler = Arc::new(TokioScheduler::new()?);
    let is_live = Arc::new(AtomicBool::new(false));
    let sink = Arc::new(TerminalSink::new(is_live.clone()));
    let binder = UiBinder::new(&config, scheduler, Arc::new(TokioTime), sink.clone());
    binder.init();
    is_live.store(true, Ordering::Relaxed);

    // Host detection runs in the background and never holds up the shell.
    let host = ProcessHost::new(&config.host);
    let bootstrap_sink = sink.clone();
    tokio::spawn(async move {
        bootstrap::run(&host, bootstrap_sink.as_ref()).await;
    });

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CommandHighlighter));

    println!(
        "{} is running. Type 'help' for commands or 'exit' to quit.",
        WIDGET_NAME.cyan()
    );

    loop {
        let prompt = format!("[{}] >> ", sink.mode_label()).cyan().bold().to_string();
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(_) => {
                println!("Exiting timershell...");
                break;
            }
        };
        rl.add_history_entry(line.as_str())?;
        let args = line.split_whitespace().collect::<Vec<_>>();

        match args.as_slice() {
            [] => {}
            ["help"] => print_help(binder.presets()),
            ["show"] => sink.print(),
            ["presets"] => {
                for minutes in binder.presets() {
                    println!("  {} min", minutes);
                }
            }
            ["watch", "on"] => {
                is_live.store(true, Ordering::Relaxed);
                println!("--> Echoing state changes.");
            }
            ["watch", "off"] => {
                is_live.store(false, Ordering::Relaxed);
                println!("--> Stopped echoing state changes.");
            }
            ["exit"] | ["quit"] => break,
            _ => match line.parse::<Control>() {
                Ok(control) => binder.handle(control),
                Err(err) => {
                    warn!("{}", err);
                    println!("Unknown command: '{}'. Type 'help'.", line.trim());
                }
            },
        }
    }

    Ok(())
}
