use crate::demo::{run_demo, run_parse, run_profile, DemoArgs, ParseArgs, ProfileArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use hanger_selector::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Hanger Selector",
    about = "Configure structural connections, search connectors and total job-list fasteners",
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
    /// Print the design profile a jurisdiction key resolves to
    Profile(ProfileArgs),
    /// Parse a fastener descriptor such as `(6) 10HDG (0.148" x 3" HDG)`
    Parse(ParseArgs),
    /// Run a configure, search and job-list session against the built-in catalog
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
        Command::Profile(args) => run_profile(args),
        Command::Parse(args) => run_parse(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
