mod inspect;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::term::termcolor::ColorChoice;
use runner::RunConfig;

#[derive(Parser)]
#[command(name = "elicit", version, about = "Inspect executable spec documents")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// TOML run configuration (spec folder, file extensions)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse spec documents and report warnings
    Check(CheckArgs),

    /// Dump the parsed document tree
    Ast(PathArgs),

    /// List documents, scenarios and the steps each scenario runs
    List(PathArgs),
}

#[derive(clap::Args)]
struct PathArgs {
    /// Spec file or folder. Defaults to the configured spec folder.
    path: Option<PathBuf>,
}

#[derive(clap::Args)]
struct CheckArgs {
    #[command(flatten)]
    target: PathArgs,

    /// Exit non-zero when any warning is reported
    #[arg(long)]
    deny_warnings: bool,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match RunConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(2);
            }
        },
        None => RunConfig::default(),
    };

    let color = if cli.no_color {
        ColorChoice::Never
    } else {
        config.color.choice()
    };

    let code = match cli.command {
        Command::Check(args) => {
            let root = args.target.path.unwrap_or_else(|| config.specs.clone());
            inspect::check(&root, &config, color, args.deny_warnings)
        }
        Command::Ast(args) => {
            let root = args.path.unwrap_or_else(|| config.specs.clone());
            inspect::dump_ast(&root, &config)
        }
        Command::List(args) => {
            let root = args.path.unwrap_or_else(|| config.specs.clone());
            inspect::list(&root, &config)
        }
    };
    process::exit(code);
}

/// Logs go to stderr, filtered by `ELICIT_LOG` (default `warn`).
fn init_tracing() {
    let filter = std::env::var("ELICIT_LOG").unwrap_or_else(|_| "warn".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
