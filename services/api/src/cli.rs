use crate::commands::{run_ingest, run_quote, IngestArgs, QuoteArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use delivery_fee::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Delivery Fee Service",
    about = "Serve and query weather-based delivery fees from the command line",
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
    /// Calculate a delivery fee against a single feed snapshot
    Quote(QuoteArgs),
    /// Import an observations XML document and print what was recorded
    Ingest(IngestArgs),
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
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Quote(args) => run_quote(args).await,
        Command::Ingest(args) => run_ingest(args),
    }
}
