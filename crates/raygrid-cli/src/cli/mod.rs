mod commands;
mod helpers;

use clap::Parser;
use raygrid_core::domain::GridError;

pub fn run_from_env() -> i32 {
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let grid_error = error.as_grid_error();
            eprintln!("{}", grid_error.diagnostic_line());
            if let Some(summary_line) = grid_error.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            grid_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("raygrid".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_logging(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "raygrid",
    version,
    about = "Resolving power and effective area from a grid of ray-trace runs"
)]
struct Cli {
    /// Log per-run progress (overridden by RAYGRID_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Analyse a directory of monoenergetic runs into a calibration table
    Aggregate(commands::AggregateArgs),
    /// Rewrite one per-order column of a calibration table as CSV
    Expand(commands::ExpandArgs),
    /// Validate a single run file and summarise its photons
    Inspect(commands::InspectArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Aggregate(args) => commands::run_aggregate_command(args),
        CliCommand::Expand(args) => commands::run_expand_command(args),
        CliCommand::Inspect(args) => commands::run_inspect_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(GridError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<GridError> for CliError {
    fn from(error: GridError) -> Self {
        Self::Compute(error)
    }
}

impl CliError {
    fn as_grid_error(&self) -> GridError {
        match self {
            Self::Usage(message) => GridError::input_shape("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => GridError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
