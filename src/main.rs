//! Berth CLI - find, start, stop, and connect to GitHub codespaces.

use berth::action_log;
use berth::cli::{Cli, Commands, ConfigCommands};
use berth::commands::{self, Context, ListFilter, Output};
use berth::config::{self, ConfigOverrides, OutputFormat};
use berth::selector::{ExactSelector, FuzzySelector, Selector};
use berth::transport::{PrintTransport, ShellTransport, Transport};
use clap::Parser;
use std::process;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter (e.g. `debug`, `berth=trace`).
const LOG_ENV: &str = "BERTH_LOG";

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let mut overrides = ConfigOverrides::new();
    if let Some(program) = cli.gh_program.clone() {
        overrides = overrides.with_gh_program(program);
    }
    if cli.human_readable {
        overrides = overrides.with_output_format(OutputFormat::Human);
    }

    // Config errors are reported before anything else can run
    let resolved = match config::resolve_config(&overrides) {
        Ok(resolved) => resolved,
        Err(e) => exit_with_error(&e, cli.human_readable),
    };
    let human = resolved.human();

    let data_dir = match config::data_dir() {
        Ok(dir) => dir,
        Err(e) => exit_with_error(&e, human),
    };

    let (cmd_name, args_json) = cli.command.describe();
    let start = Instant::now();

    let mut ctx = Context::new(resolved, data_dir.clone());
    let result = run_command(cli.command, &mut ctx, human);

    let duration = start.elapsed().as_millis() as u64;
    let (success, error) = match &result {
        Ok(_) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };
    action_log::log_action(&data_dir, &cmd_name, args_json, success, error, duration);

    if let Err(e) = result {
        exit_with_error(&e, human);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_command(command: Commands, ctx: &mut Context, human: bool) -> Result<(), berth::Error> {
    match command {
        Commands::Setup => {
            let result = commands::setup(ctx)?;
            output(&result, human);
        }

        Commands::Connect { name, shell } => {
            let selector = selector_for(name);
            let transport: Box<dyn Transport> = if shell {
                Box::new(ShellTransport)
            } else {
                Box::new(PrintTransport)
            };
            let result = commands::connect(ctx, selector.as_ref(), transport.as_ref())?;
            output(&result, human);
        }

        Commands::Start { name, wait } => {
            let selector = selector_for(name);
            let result = commands::start(ctx, selector.as_ref(), wait)?;
            output(&result, human);
        }

        Commands::Stop { name } => {
            let selector = selector_for(name);
            let result = commands::stop(ctx, selector.as_ref())?;
            output(&result, human);
        }

        Commands::List {
            available,
            unavailable,
        } => {
            let filter = if available {
                ListFilter::Available
            } else if unavailable {
                ListFilter::Unavailable
            } else {
                ListFilter::All
            };
            let result = commands::list(ctx, filter)?;
            output(&result, human);
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                let result = commands::config_show(ctx);
                output(&result, human);
            }
        },
    }

    Ok(())
}

/// `--name` selects non-interactively; otherwise prompt on the terminal.
fn selector_for(name: Option<String>) -> Box<dyn Selector> {
    match name {
        Some(label) => Box::new(ExactSelector::new(label)),
        None => Box::new(FuzzySelector),
    }
}

fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

fn exit_with_error(e: &berth::Error, human: bool) -> ! {
    if human {
        eprintln!("Error: {}", e);
    } else {
        eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
    }
    process::exit(1);
}
