//! check-cx Server Entry Point

use checkcx::cli::{self, Cli, Commands};
use checkcx::logging;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init()?;

    match cli.command {
        Some(Commands::Check(args)) => {
            let healthy = cli::check::execute(&args, &cli.database_url).await?;
            if !healthy {
                drop(_log_guard);
                std::process::exit(1);
            }
        }
        Some(Commands::History(args)) => {
            let service = cli::build_dashboard_service(&cli.database_url).await?;
            cli::history::execute(&args, &service).await?;
        }
        Some(Commands::Serve(args)) => {
            let service = cli::build_dashboard_service(&cli.database_url).await?;
            cli::serve::execute(&args, service).await?;
        }
        None => {
            let service = cli::build_dashboard_service(&cli.database_url).await?;
            cli::serve::execute(&cli::serve::ServeArgs::from_env(), service).await?;
        }
    }

    Ok(())
}
