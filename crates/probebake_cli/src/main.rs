//! probebake CLI — headless incremental reflection-probe baking.
//!
//! Provides `probebake bake` to bring baked probe textures up to date with a
//! scene description, `probebake status` to report what a bake would change,
//! and `probebake clean` to remove orphaned texture artifacts.

#![warn(missing_docs)]

mod bake;
mod clean;
mod project;
mod renderer;
mod scene;
mod status;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// probebake — incremental reflection-probe baking.
#[derive(Parser, Debug)]
#[command(name = "probebake", version, about = "Incremental reflection-probe baker")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a `probebake.toml` file or the directory containing it.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bake every stale probe and prune obsolete textures.
    Bake(BakeArgs),
    /// Report how many probes are stale without baking.
    Status(StatusArgs),
    /// Delete texture artifacts no baked probe refers to.
    Clean,
}

/// Arguments for the `probebake bake` subcommand.
#[derive(Parser, Debug)]
pub struct BakeArgs {
    /// Give up after this many scheduler ticks.
    #[arg(long, default_value_t = 10_000)]
    pub max_ticks: u32,
}

/// Arguments for the `probebake status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Exit with status 1 if any probe is stale.
    #[arg(long)]
    pub check: bool,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file or project directory.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Bake(ref args) => bake::run(args, &global),
        Command::Status(ref args) => status::run(args, &global),
        Command::Clean => clean::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Default log filter for the given flags. `RUST_LOG` takes precedence.
fn default_filter(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "warn"
    } else if global.verbose {
        "debug"
    } else {
        "info"
    }
}

fn init_logging(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(global)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(global.color)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn global(quiet: bool, verbose: bool) -> GlobalArgs {
        GlobalArgs {
            quiet,
            verbose,
            color: false,
            config: None,
        }
    }

    #[test]
    fn parse_bake_default() {
        let cli = Cli::parse_from(["probebake", "bake"]);
        match cli.command {
            Command::Bake(ref args) => assert_eq!(args.max_ticks, 10_000),
            _ => panic!("expected Bake command"),
        }
    }

    #[test]
    fn parse_bake_with_limit() {
        let cli = Cli::parse_from(["probebake", "bake", "--max-ticks", "25"]);
        match cli.command {
            Command::Bake(ref args) => assert_eq!(args.max_ticks, 25),
            _ => panic!("expected Bake command"),
        }
    }

    #[test]
    fn parse_status_check() {
        let cli = Cli::parse_from(["probebake", "status", "--check"]);
        match cli.command {
            Command::Status(ref args) => assert!(args.check),
            _ => panic!("expected Status command"),
        }
    }

    #[test]
    fn parse_clean() {
        let cli = Cli::parse_from(["probebake", "clean"]);
        assert!(matches!(cli.command, Command::Clean));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from([
            "probebake",
            "--quiet",
            "--color",
            "never",
            "--config",
            "levels/atrium",
            "status",
        ]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.config.as_deref(), Some("levels/atrium"));
    }

    #[test]
    fn parse_global_flag_after_subcommand() {
        let cli = Cli::parse_from(["probebake", "bake", "--verbose"]);
        assert!(cli.verbose);
    }

    #[test]
    fn filter_follows_flags() {
        assert_eq!(default_filter(&global(false, false)), "info");
        assert_eq!(default_filter(&global(true, false)), "warn");
        assert_eq!(default_filter(&global(false, true)), "debug");
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["probebake", "render"]).is_err());
    }
}
