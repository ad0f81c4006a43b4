/*!
Command handlers for the CLI

Each submodule implements one subcommand family. Handlers are thin: they
build an authenticated client, invoke the corresponding core operation, and
print the result.
*/

pub mod download;
pub mod login;
pub mod notebook;
pub mod research;
pub mod share;
pub mod source;
pub mod studio;

use std::sync::Arc;

use crate::auth::{ExternalLoginCommand, ProfileStore};
use crate::config::Config;
use crate::error::Result;
use crate::rpc::NotebookClient;

/// Build an authenticated client from the stored profile.
pub fn build_client(config: &Config, profile_override: Option<&str>) -> Result<NotebookClient> {
    let profile_name = profile_override
        .map(str::to_string)
        .unwrap_or_else(|| config.auth.default_profile.clone());

    let store = ProfileStore::default_location()?;
    let profile = store.load(&profile_name)?;

    let mut client = NotebookClient::new(profile.session)?
        .with_profile_store(store, profile_name);
    if let Some(command) = &config.auth.login_command {
        client = client.with_login_flow(Arc::new(ExternalLoginCommand::new(command.clone())));
    }
    Ok(client)
}
