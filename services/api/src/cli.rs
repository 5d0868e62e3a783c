use crate::demo::{run_classify, run_demo, run_score, ClassifyArgs, DemoArgs, ScoreArgs};
use crate::server;
use admissions::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Admissions API",
    about = "Serve the admissions workflow or exercise its scoring rules from the command line",
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
    /// Run sample applicants through registration, scoring, and lab assignment
    Demo(DemoArgs),
    /// Compute a final composite score and its weighted breakdown
    Score(ScoreArgs),
    /// Classify a marker bundle into its priority segment
    Classify(ClassifyArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed seat quotas from this program catalog CSV instead of the bundled one
    #[arg(long)]
    pub(crate) programs_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::Score(args) => run_score(args),
        Command::Classify(args) => run_classify(args),
    }
}
