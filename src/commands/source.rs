//! Source command handlers

use std::io::Read;
use std::time::Duration;

use colored::Colorize;
use prettytable::{row, Table};

use crate::cli::SourceCommand;
use crate::config::Config;
use crate::error::Result;

const WAIT_TIMEOUT: Duration = Duration::from_secs(120);

pub async fn run_source(
    config: &Config,
    profile: Option<&str>,
    command: SourceCommand,
) -> Result<()> {
    let client = super::build_client(config, profile)?;

    match command {
        SourceCommand::List { notebook } => {
            let sources = client.notebook_sources(&notebook).await?;
            if sources.is_empty() {
                println!("No sources in notebook {}.", notebook);
                return Ok(());
            }
            let mut table = Table::new();
            table.add_row(row!["ID", "TITLE", "STATUS", "URL"]);
            for src in &sources {
                table.add_row(row![
                    src.id.as_deref().unwrap_or("-"),
                    src.title,
                    src.status_name(),
                    src.url.as_deref().unwrap_or("-")
                ]);
            }
            table.printstd();
        }
        SourceCommand::AddUrl {
            notebook,
            url,
            wait,
        } => {
            let source = client.add_url_source(&notebook, &url).await?;
            if wait {
                client
                    .wait_for_source_ready(&notebook, &source.id, WAIT_TIMEOUT)
                    .await?;
            }
            println!(
                "{} Added source '{}' ({})",
                "ok".green().bold(),
                source.title,
                source.id
            );
        }
        SourceCommand::AddText {
            notebook,
            title,
            text,
        } => {
            let content = match text {
                Some(t) => t,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            let source = client.add_text_source(&notebook, &content, &title).await?;
            println!(
                "{} Added source '{}' ({})",
                "ok".green().bold(),
                source.title,
                source.id
            );
        }
        SourceCommand::AddDrive {
            notebook,
            document_id,
            title,
            mime_type,
        } => {
            let source = client
                .add_drive_source(&notebook, &document_id, &title, &mime_type)
                .await?;
            println!(
                "{} Added source '{}' ({})",
                "ok".green().bold(),
                source.title,
                source.id
            );
        }
        SourceCommand::AddFile {
            notebook,
            path,
            wait,
        } => {
            let timeout = wait.then_some(WAIT_TIMEOUT);
            let source = client.add_file(&notebook, &path, timeout).await?;
            println!(
                "{} Uploaded '{}' ({})",
                "ok".green().bold(),
                source.title,
                source.id
            );
        }
        SourceCommand::Rm { id } => {
            client.delete_source(&id).await?;
            println!("{} Deleted source {}", "ok".green().bold(), id);
        }
        SourceCommand::Sync { id } => match client.sync_drive_source(&id).await? {
            Some(source) => {
                println!("{} Synced '{}'", "ok".green().bold(), source.title)
            }
            None => println!("Sync returned no result for {}", id),
        },
        SourceCommand::Guide { id } => {
            let (summary, keywords) = client.get_source_guide(&id).await?;
            if !summary.is_empty() {
                println!("{}", summary);
            }
            if !keywords.is_empty() {
                println!("\nKeywords: {}", keywords.join(", "));
            }
        }
        SourceCommand::Text { id } => {
            println!("{}", client.get_source_fulltext(&id).await?);
        }
    }
    Ok(())
}
