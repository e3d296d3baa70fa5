//! `seamtrack-cli` – headless driver for the surface-tracking core.
//!
//! This binary plays the role of the animation loop: it owns a
//! [`Traverse`][seamtrack_runtime::Traverse] and calls `step()` on demand.
//! It:
//!
//! 1. Loads `~/.seamtrack/config.toml` (or a file given with `--config`),
//!    writing the defaults on first run.
//! 2. With `--steps N`, runs N steps headless, prints a summary and exits.
//! 3. Otherwise drops the user into an interactive REPL
//!    (`/step`, `/run`, `/smooth`, `/status`, `/json`, `/config`, `/help`).
//! 4. Intercepts **Ctrl-C** to stop a running batch and leave cleanly.

mod config;
mod report;
mod repl;

use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, warn};

/// Parsed command-line flags.
#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    steps: Option<u64>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let v = args.next().ok_or("--config needs a path")?;
                parsed.config = Some(PathBuf::from(v));
            }
            "--steps" => {
                let v = args.next().ok_or("--steps needs a count")?;
                parsed.steps = Some(v.parse::<u64>().map_err(|_| format!("invalid step count '{v}'"))?);
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
    }
    Ok(parsed)
}

fn main() {
    let _telemetry = seamtrack_runtime::init_tracing("seamtrack");

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}: {}", "Argument error".red(), e);
            eprintln!("  usage: seamtrack [--config <path>] [--steps <n>]");
            std::process::exit(2);
        }
    };

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; long runs cannot be interrupted");
    }

    let cfg = load_config(args.config.as_ref());
    let traverse = match cfg.build_traverse() {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "invalid traverse configuration");
            eprintln!("{}: {}", "Configuration error".red(), e);
            std::process::exit(1);
        }
    };
    let mut session = repl::Session::new(cfg, traverse, shutdown);

    if let Some(n) = args.steps {
        let stats = session.advance(n, |_| {});
        if let Some(last) = session.last() {
            println!("  {}", report::step_line(last));
        }
        println!("{}", report::summary(&stats));
        let tcp = session.traverse().pose();
        println!("  next pose: x={:.3} z={:.3}", tcp.x, tcp.z);
        return;
    }

    print_banner();
    println!(
        "  Type {} for a list of commands.\n",
        "/help".bold().cyan()
    );
    repl::run(session);
}

/// Load the configuration, falling back to defaults on any problem.
fn load_config(explicit: Option<&PathBuf>) -> config::Config {
    let loaded = match explicit {
        Some(path) => config::load_from(path),
        None => config::load(),
    };
    match loaded {
        Ok(Some(cfg)) => cfg,
        Ok(None) if explicit.is_some() => {
            println!("{}: config file not found, using defaults", "Warning".yellow());
            default_with_env()
        }
        Ok(None) => {
            let cfg = default_with_env();
            match config::save(&config::Config::default()) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            default_with_env()
        }
    }
}

fn default_with_env() -> config::Config {
    let mut cfg = config::Config::default();
    config::apply_env_overrides(&mut cfg);
    cfg
}

fn print_banner() {
    println!();
    println!("  {} {}",
        "seamtrack".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Two-sensor feedforward surface tracking");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, String> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_arguments_means_interactive() {
        assert_eq!(args(&[]).unwrap(), Args::default());
    }

    #[test]
    fn parses_steps_and_config() {
        let a = args(&["--steps", "400", "--config", "/tmp/rig.toml"]).unwrap();
        assert_eq!(a.steps, Some(400));
        assert_eq!(a.config, Some(PathBuf::from("/tmp/rig.toml")));
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(args(&["--steps"]).is_err());
        assert!(args(&["--steps", "many"]).is_err());
        assert!(args(&["--verbose"]).is_err());
    }
}
