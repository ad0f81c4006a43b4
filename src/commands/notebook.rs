//! Notebook command handlers

use colored::Colorize;
use prettytable::{row, Table};

use crate::cli::NotebookCommand;
use crate::config::Config;
use crate::error::Result;

pub async fn run_notebook(
    config: &Config,
    profile: Option<&str>,
    command: NotebookCommand,
) -> Result<()> {
    let client = super::build_client(config, profile)?;

    match command {
        NotebookCommand::List => {
            let notebooks = client.list_notebooks().await?;
            if notebooks.is_empty() {
                println!("No notebooks found.");
                return Ok(());
            }
            let mut table = Table::new();
            table.add_row(row!["ID", "TITLE", "SOURCES"]);
            for nb in &notebooks {
                table.add_row(row![nb.id, nb.title, nb.source_count]);
            }
            table.printstd();
        }
        NotebookCommand::Create { title } => {
            let nb = client.create_notebook(&title).await?;
            println!("{} Created notebook '{}'", "ok".green().bold(), nb.title);
            println!("  ID:  {}", nb.id);
            println!("  URL: {}", nb.url);
        }
        NotebookCommand::Rename { id, title } => {
            client.rename_notebook(&id, &title).await?;
            println!("{} Renamed notebook {}", "ok".green().bold(), id);
        }
        NotebookCommand::Delete { id } => {
            client.delete_notebook(&id).await?;
            println!("{} Deleted notebook {}", "ok".green().bold(), id);
        }
        NotebookCommand::Summary { id } => match client.get_notebook_summary(&id).await? {
            Some(summary) => println!("{}", summary),
            None => println!("No summary available yet."),
        },
    }
    Ok(())
}
