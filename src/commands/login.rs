//! Login command: import credentials from a cookies file

use std::path::Path;

use colored::Colorize;

use crate::auth::{Cookies, ProfileStore, Session};
use crate::config::Config;
use crate::error::{NlmError, Result};

/// Import a cookies JSON file (browser-export records or a simple
/// name/value map) into the named profile.
pub fn run_login(
    config: &Config,
    profile_override: Option<&str>,
    file: &Path,
    email: Option<&str>,
) -> Result<()> {
    let profile_name = profile_override.unwrap_or(&config.auth.default_profile);

    let contents = std::fs::read_to_string(file)
        .map_err(|e| NlmError::Validation(format!("Cannot read {}: {}", file.display(), e)))?;
    let cookies: Cookies = serde_json::from_str(&contents).map_err(|e| {
        NlmError::Validation(format!(
            "{} is not a cookies file (expected a JSON cookie list or map): {}",
            file.display(),
            e
        ))
    })?;

    if cookies.is_empty() {
        return Err(NlmError::Validation(format!(
            "{} contains no cookies",
            file.display()
        ))
        .into());
    }

    let session = Session::from_cookies(cookies);
    let store = ProfileStore::default_location()?;
    store.save(profile_name, &session, email)?;

    println!(
        "{} Credentials saved to profile '{}'",
        "ok".green().bold(),
        profile_name
    );
    println!("Tokens will be derived automatically on the first call.");
    Ok(())
}

/// List or delete stored profiles.
pub fn run_profiles(command: &crate::cli::ProfileCommand) -> Result<()> {
    let store = ProfileStore::default_location()?;
    match command {
        crate::cli::ProfileCommand::List => {
            let names = store.list()?;
            if names.is_empty() {
                println!("No profiles stored. Run `nlm login` to create one.");
            } else {
                for name in names {
                    println!("{}", name);
                }
            }
        }
        crate::cli::ProfileCommand::Delete { name } => {
            store.delete(name)?;
            println!("{} Deleted profile '{}'", "ok".green().bold(), name);
        }
    }
    Ok(())
}
