use crate::demo::{run_demo, run_schemes_list, run_schemes_match, DemoArgs, ListArgs, MatchArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use scheme_mitra::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "SchemeMitra",
    about = "Discover Indian government welfare schemes with AI-assisted eligibility explanations",
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
    /// Inspect the scheme catalog from the command line
    Schemes {
        #[command(subcommand)]
        command: SchemesCommand,
    },
    /// Run an end-to-end offline demo of the discovery pipeline
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum SchemesCommand {
    /// List schemes, optionally filtered
    List(ListArgs),
    /// Score schemes against a user profile
    Match(MatchArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured scheme dataset path
    #[arg(long)]
    pub(crate) dataset: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Schemes {
            command: SchemesCommand::List(args),
        } => run_schemes_list(args),
        Command::Schemes {
            command: SchemesCommand::Match(args),
        } => run_schemes_match(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
