//! Sharing command handlers

use colored::Colorize;

use crate::cli::ShareCommand;
use crate::config::Config;
use crate::error::{NlmError, Result};
use crate::ops::sharing::{SHARE_ROLE_EDITOR, SHARE_ROLE_VIEWER};

pub async fn run_share(
    config: &Config,
    profile: Option<&str>,
    command: ShareCommand,
) -> Result<()> {
    let client = super::build_client(config, profile)?;

    match command {
        ShareCommand::Status { notebook } => {
            let status = client.get_share_status(&notebook).await?;
            println!(
                "Access: {}",
                if status.is_public { "public" } else { "restricted" }
            );
            if let Some(url) = status.share_url {
                println!("Link:   {}", url);
            }
        }
        ShareCommand::Public { notebook, off } => {
            client.set_public_access(&notebook, !off).await?;
            println!(
                "{} Public access {}",
                "ok".green().bold(),
                if off { "disabled" } else { "enabled" }
            );
        }
        ShareCommand::Invite {
            notebook,
            email,
            role,
        } => {
            let role_code = match role.as_str() {
                "editor" => SHARE_ROLE_EDITOR,
                "viewer" => SHARE_ROLE_VIEWER,
                other => {
                    return Err(NlmError::Validation(format!(
                        "Unknown role '{}'. Use editor or viewer.",
                        other
                    ))
                    .into())
                }
            };
            client.add_collaborator(&notebook, &email, role_code).await?;
            println!("{} Invited {} as {}", "ok".green().bold(), email, role);
        }
    }
    Ok(())
}
