use clap::{Args, Parser, Subcommand};
use kapasda::error::AppError;

use crate::commands::{run_catalog, run_evaluate, CatalogArgs, EvaluateArgs};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "kapasda",
    about = "Score regional readiness indicators and serve the assessment API",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the indicator catalog as a table
    Catalog(CatalogArgs),
    /// Evaluate one region from a JSON file and print the result
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    match cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()))
    {
        Command::Serve(args) => server::run(args).await,
        Command::Catalog(args) => run_catalog(args),
        Command::Evaluate(args) => run_evaluate(args),
    }
}
