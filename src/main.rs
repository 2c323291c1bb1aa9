//! seqtrace CLI
//!
//! Replays recorded execution events, reconstructs the call tree and
//! renders it as a sequence diagram.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use seqtrace::commands::{
    display_formats, display_version, execute_render, execute_trace, validate_render_args,
    validate_snapshot_file, validate_trace_args, DiagramOptions, RenderArgs, SelectionOptions,
    TraceArgs,
};
use seqtrace::output::FormatterRegistry;
use seqtrace::utils::config::DEFAULT_FORMAT;

/// seqtrace - sequence diagrams from real executions
#[derive(Parser, Debug)]
#[command(name = "seqtrace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a recorded event stream and render the call tree
    Trace {
        /// Recorded events, one JSON batch per line
        #[arg(short, long)]
        events: PathBuf,

        /// Save the raw activation list as a snapshot
        #[arg(long)]
        save: Option<PathBuf>,

        #[command(flatten)]
        selection: SelectionFlags,

        #[command(flatten)]
        diagram: DiagramFlags,
    },

    /// Render a saved snapshot
    Render {
        /// Snapshot written by `trace --save`
        #[arg(short, long)]
        read: PathBuf,

        #[command(flatten)]
        selection: SelectionFlags,

        #[command(flatten)]
        diagram: DiagramFlags,
    },

    /// Validate a snapshot file
    Validate {
        /// Path to snapshot JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List available diagram formats
    Formats,

    /// Display version information
    Version,
}

/// What gets traced
#[derive(Args, Debug)]
struct SelectionFlags {
    /// TOML configuration file
    #[arg(short, long, env = "SEQTRACE_CONFIG")]
    config: Option<PathBuf>,

    /// Owner pattern to trace (repeatable)
    #[arg(short, long)]
    include: Vec<String>,

    /// Owner pattern to skip (repeatable)
    #[arg(short = 'x', long)]
    exclude: Vec<String>,

    /// Fully-qualified method whose callees are not traced (repeatable)
    #[arg(short, long)]
    boundary: Vec<String>,

    /// Only record public methods
    #[arg(long)]
    public_only: bool,

    /// Start tracing when this fully-qualified method is reached
    #[arg(short, long)]
    start: Option<String>,

    /// Do not exclude standard library packages
    #[arg(long)]
    no_std_excludes: bool,
}

/// How the diagram is written
#[derive(Args, Debug)]
struct DiagramFlags {
    /// Diagram format (see `seqtrace formats`)
    #[arg(short, long, default_value = DEFAULT_FORMAT)]
    format: String,

    /// Output file for the diagram (default: stdout)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Do not print the diagram to stdout
    #[arg(short, long)]
    quiet: bool,

    /// Print text summary to stdout
    #[arg(long)]
    summary: bool,
}

impl From<SelectionFlags> for SelectionOptions {
    fn from(flags: SelectionFlags) -> Self {
        Self {
            config: flags.config,
            include: flags.include,
            exclude: flags.exclude,
            boundary: flags.boundary,
            public_only: flags.public_only,
            start: flags.start,
            no_std_excludes: flags.no_std_excludes,
        }
    }
}

impl From<DiagramFlags> for DiagramOptions {
    fn from(flags: DiagramFlags) -> Self {
        Self {
            format: flags.format,
            out: flags.out,
            quiet: flags.quiet,
            summary: flags.summary,
        }
    }
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let registry = FormatterRegistry::with_defaults();

    // Execute command
    match cli.command {
        Commands::Trace {
            events,
            save,
            selection,
            diagram,
        } => {
            let args = TraceArgs {
                events,
                save,
                selection: selection.into(),
                diagram: diagram.into(),
            };

            // Validate args first
            validate_trace_args(&args)?;

            execute_trace(args, &registry)?;
        }

        Commands::Render {
            read,
            selection,
            diagram,
        } => {
            let args = RenderArgs {
                snapshot: read,
                selection: selection.into(),
                diagram: diagram.into(),
            };

            validate_render_args(&args)?;

            execute_render(args, &registry)?;
        }

        Commands::Validate { file } => {
            validate_snapshot_file(&file)?;
        }

        Commands::Formats => {
            display_formats(&registry);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
