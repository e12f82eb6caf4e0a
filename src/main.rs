use anyhow::Result;
use covgap::cli::{self, setup, Commands};
use covgap::commands;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = cli::parse_args();
    setup::init_logging(cli.verbosity);

    if let Err(e) = dispatch(cli.command, cli.run).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn dispatch(command: Option<Commands>, default_run: cli::RunArgs) -> Result<()> {
    match command {
        None => commands::run(default_run).await,
        Some(Commands::Run(args)) => commands::run(args).await,
        Some(Commands::Analyze(args)) => commands::analyze(args).await,
        Some(Commands::Init { force }) => {
            let dir = setup::working_directory()?;
            commands::init_config(&dir, force)?;
            Ok(())
        }
    }
}
