//! nlm - NotebookLM command-line client
//!
#![doc = "Main entry point for the nlm CLI."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use nlm::cli::{Cli, Commands};
use nlm::commands;
use nlm::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Login { file, email } => {
            commands::login::run_login(&config, profile, &file, email.as_deref())?;
            Ok(())
        }
        Commands::Profiles { command } => {
            commands::login::run_profiles(&command)?;
            Ok(())
        }
        Commands::Notebook { command } => {
            commands::notebook::run_notebook(&config, profile, command).await?;
            Ok(())
        }
        Commands::Source { command } => {
            commands::source::run_source(&config, profile, command).await?;
            Ok(())
        }
        Commands::Studio { command } => {
            commands::studio::run_studio(&config, profile, command).await?;
            Ok(())
        }
        Commands::Download {
            notebook,
            artifact_type,
            output,
            id,
            format,
        } => {
            commands::download::run_download(
                &config,
                profile,
                &notebook,
                &artifact_type,
                output,
                id.as_deref(),
                &format,
            )
            .await?;
            Ok(())
        }
        Commands::Research { command } => {
            commands::research::run_research(&config, profile, command).await?;
            Ok(())
        }
        Commands::Share { command } => {
            commands::share::run_share(&config, profile, command).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "nlm=debug" } else { "nlm=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
