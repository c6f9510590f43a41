use crate::demo::{run_appraise, run_demo, AppraiseArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use titlesplit::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Title Split Appraiser",
    about = "Value freehold blocks for title splitting and serve the appraisal API",
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
    /// Appraise a listing described in a JSON request file
    Appraise(AppraiseArgs),
    /// Walk a sample Southport block through every recommendation stage
    Demo(DemoArgs),
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
        Command::Appraise(args) => run_appraise(args),
        Command::Demo(args) => run_demo(args),
    }
}
