mod cmd_config;
mod cmd_kinds;
mod cmd_show;
mod cmd_view;
mod config;
mod render;
#[cfg(feature = "tui")]
mod tui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `debug`, `ctxview_core=trace`).
const LOG_ENV: &str = "CTXVIEW_LOG";

#[derive(Parser)]
#[command(name = "ctxview", version, about = "Browse agent execution traces")]
struct Cli {
    /// Config file (defaults to <config dir>/ctxview/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the visible part of a trace tree
    Show {
        /// Trace snapshot (JSON: one context node or an array of them)
        file: PathBuf,
        /// Open a node by uid (repeatable)
        #[arg(long = "open")]
        open: Vec<String>,
        /// Open every root and all of its descendants
        #[arg(long)]
        expand_all: bool,
        /// Show children of this kind (repeatable)
        #[arg(long = "kind")]
        kinds: Vec<String>,
        /// Show children of every kind present in the trace
        #[arg(long)]
        all_kinds: bool,
        /// Omit inputs, results and errors of open nodes
        #[arg(long)]
        no_payloads: bool,
        /// Output as JSON lines (one visible node per line)
        #[arg(long)]
        json: bool,
    },
    /// List the node kinds in a trace with counts
    Kinds {
        /// Trace snapshot
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Browse a trace interactively
    Tui {
        /// Trace snapshot
        file: PathBuf,
    },
    /// Viewer defaults (visible kinds, initial depth)
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
}

fn init_tracing(interactive: bool) {
    // The TUI owns the terminal; stay silent there unless asked.
    let default = if interactive { "off" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(matches!(cli.cmd, Command::Tui { .. }));

    let config_path = cli.config.unwrap_or_else(config::default_path);

    match cli.cmd {
        Command::Show {
            file,
            open,
            expand_all,
            kinds,
            all_kinds,
            no_payloads,
            json,
        } => cmd_show::execute(&cmd_show::ShowParams {
            file: &file,
            config: config::load(&config_path)?,
            open: &open,
            expand_all,
            kinds: &kinds,
            all_kinds,
            payloads: !no_payloads,
            json,
        }),
        Command::Kinds { file, json } => cmd_kinds::execute(&file, json),
        Command::Tui { file } => cmd_view::execute(&file, &config::load(&config_path)?),
        Command::Config { cmd } => cmd_config::run(cmd, &config_path),
    }
}
