//! REPL – interactive driver for a live traverse.
//!
//! Supported slash-commands:
//!   /help            – show this list
//!   /step [n]        – advance n steps (default 1), one line per step
//!   /run <n>         – advance n steps, reporting every `report_interval`
//!   /smooth [on|off] – set the smoothing toggle, or flip it with no argument
//!   /status          – show the current pose and traverse counters
//!   /json            – print the most recent step result as JSON
//!   /config          – show the effective configuration
//!   /quit | /exit    – leave the shell

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use seamtrack_perception::{Surface, SurfaceProfile};
use seamtrack_runtime::Traverse;
use seamtrack_types::StepResult;
use tracing::info;

use crate::config::{self, Config};
use crate::report::{self, RunStats};

/// What the REPL should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A traverse plus the bits of driver state the commands need.
pub struct Session {
    cfg: Config,
    traverse: Traverse<SurfaceProfile>,
    last: Option<StepResult>,
    shutdown: Arc<AtomicBool>,
}

impl Session {
    pub fn new(cfg: Config, traverse: Traverse<SurfaceProfile>, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            cfg,
            traverse,
            last: None,
            shutdown,
        }
    }

    /// Advance up to `n` steps, stopping early on Ctrl-C.
    ///
    /// `on_step` sees every result; the returned stats cover the steps that
    /// actually ran.
    pub fn advance(&mut self, n: u64, mut on_step: impl FnMut(&StepResult)) -> RunStats {
        let mut stats = RunStats::default();
        for _ in 0..n {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }
            let r = self.traverse.step();
            stats.record(&r);
            on_step(&r);
            self.last = Some(r);
        }
        stats
    }

    /// Dispatch one command line.
    pub fn handle(&mut self, line: &str) -> Flow {
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else {
            return Flow::Continue;
        };
        let arg = parts.next();

        match cmd {
            "/help" => cmd_help(),
            "/step" => match parse_count(arg, 1) {
                Some(n) => {
                    let stats = self.advance(n, |r| println!("  {}", report::step_line(r)));
                    if stats.steps < n {
                        println!("{}", "  interrupted".yellow());
                    }
                }
                None => usage("/step [n]"),
            },
            "/run" => match arg.and_then(|a| a.parse::<u64>().ok()) {
                Some(n) => self.cmd_run(n),
                None => usage("/run <n>"),
            },
            "/smooth" => self.cmd_smooth(arg),
            "/status" => self.cmd_status(),
            "/json" => self.cmd_json(),
            "/config" => self.cmd_config(),
            "/quit" | "/exit" => {
                println!("{}", "Goodbye.".green());
                return Flow::Quit;
            }
            other => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    other.yellow(),
                    "/help".bold()
                );
            }
        }
        Flow::Continue
    }

    fn cmd_run(&mut self, n: u64) {
        let every = self.cfg.report_interval.max(1);
        let stats = self.advance(n, |r| {
            if r.did_reset || (r.step_index + 1) % every == 0 {
                println!("  {}", report::step_line(r));
            }
        });
        info!(steps = stats.steps, resets = stats.resets, "run finished");
        println!("{}", report::summary(&stats));
        if stats.steps < n {
            println!("{}", "  interrupted".yellow());
        }
    }

    fn cmd_smooth(&mut self, arg: Option<&str>) {
        let enabled = match arg {
            None => !self.traverse.smoothing_enabled(),
            Some(raw) => match config::parse_switch(raw) {
                Some(v) => v,
                None => return usage("/smooth [on|off]"),
            },
        };
        self.traverse.set_smoothing_enabled(enabled);
        println!(
            "  Smoothing: {}",
            if enabled { "ON".green().bold() } else { "OFF".yellow().bold() }
        );
    }

    fn cmd_status(&self) {
        let t = &self.traverse;
        let p = t.pose();
        let (h1, h2) = t.history_lens();
        println!("{}", "Traverse Status".bold().underline());
        println!("  Pose        : x={:.3}  z={:.3}", p.x, p.z);
        println!("  Tangent     : ({:.4}, {:.4})", p.tangent.x, p.tangent.z);
        println!("  Normal      : ({:.4}, {:.4})", p.normal.x, p.normal.z);
        println!("  Surface     : z={:.3} under TCP", t.surface().height(p.x));
        println!("  Track error : {:.4}", t.tracking_error());
        println!(
            "  Smoothing   : {}",
            if t.smoothing_enabled() { "ON".green() } else { "OFF".yellow() }
        );
        println!("  Steps       : {} since reset, {} traverses completed", t.steps_since_reset(), t.traverses_completed());
        println!("  Histories   : {} / {} of {}", h1, h2, t.config().smoothing_window);
        println!("  Path points : {}", t.path_history().len());
    }

    fn cmd_json(&self) {
        match &self.last {
            Some(r) => match serde_json::to_string_pretty(r) {
                Ok(json) => println!("{json}"),
                Err(e) => println!("{}: {}", "Serialization error".red(), e),
            },
            None => println!("  {}", "No step taken yet.".dimmed()),
        }
    }

    fn cmd_config(&self) {
        println!("  Config file : {}", config::config_path().display().to_string().bold());
        match toml::to_string_pretty(&self.cfg) {
            Ok(raw) => {
                for line in raw.lines() {
                    println!("    {}", line.dimmed());
                }
            }
            Err(e) => println!("{}: {}", "Serialization error".red(), e),
        }
    }

    pub fn traverse(&self) -> &Traverse<SurfaceProfile> {
        &self.traverse
    }

    pub fn last(&self) -> Option<&StepResult> {
        self.last.as_ref()
    }
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(mut session: Session) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if session.shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "seamtrack>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        if session.handle(line.trim()) == Flow::Quit {
            break;
        }
    }
}

fn cmd_help() {
    println!();
    println!("{}", "seamtrack Commands".bold().underline());
    println!("  {}        – advance n steps (default 1)", "/step [n]".bold().cyan());
    println!("  {}         – advance n steps with periodic reports", "/run <n>".bold().cyan());
    println!("  {} – toggle or set smoothing", "/smooth [on|off]".bold().cyan());
    println!("  {}          – current pose and counters", "/status".bold().cyan());
    println!("  {}            – last step result as JSON", "/json".bold().cyan());
    println!("  {}          – effective configuration", "/config".bold().cyan());
    println!("  {}     – exit", "/quit  /exit".bold().cyan());
    println!();
}

fn usage(form: &str) {
    println!("  {} {}", "Usage:".yellow(), form.bold());
}

fn parse_count(arg: Option<&str>, default: u64) -> Option<u64> {
    match arg {
        None => Some(default),
        Some(raw) => raw.parse().ok(),
    }
}
