//! Research command handlers

use colored::Colorize;

use crate::cli::ResearchCommand;
use crate::config::Config;
use crate::error::Result;
use crate::ops::research::{ResearchMode, RESEARCH_SOURCE_WEB};

pub async fn run_research(
    config: &Config,
    profile: Option<&str>,
    command: ResearchCommand,
) -> Result<()> {
    let client = super::build_client(config, profile)?;

    match command {
        ResearchCommand::Start {
            notebook,
            query,
            deep,
        } => {
            let mode = if deep {
                ResearchMode::Deep
            } else {
                ResearchMode::Fast
            };
            let task_id = client
                .start_research(&notebook, &query, mode, RESEARCH_SOURCE_WEB)
                .await?;
            println!(
                "{} Research started{}",
                "ok".green().bold(),
                task_id
                    .map(|id| format!(" (task {})", id))
                    .unwrap_or_default()
            );
            println!("Poll with `nlm research poll {}`.", notebook);
        }
        ResearchCommand::Poll { notebook } => {
            let results = client.poll_research(&notebook).await?;
            if results.is_empty() {
                println!("No results yet.");
                return Ok(());
            }
            for result in &results {
                println!("{}\n  {}", result.title.bold(), result.url);
            }
        }
        ResearchCommand::Import { notebook, urls } => {
            client.import_research_sources(&notebook, &urls).await?;
            println!(
                "{} Imported {} source(s)",
                "ok".green().bold(),
                urls.len()
            );
        }
    }
    Ok(())
}
