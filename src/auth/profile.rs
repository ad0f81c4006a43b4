//! On-disk authentication profile store
//!
//! Profiles let multiple accounts coexist. Each profile is a directory
//! holding `cookies.json` plus `metadata.json` (CSRF token, session id,
//! email, last-validated timestamp). Concurrent processes coordinate only
//! through these files, read-refresh-write, last writer wins.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::session::{Cookies, Session};
use crate::error::{NlmError, Result};

/// Profile name used when none is configured.
pub const DEFAULT_PROFILE: &str = "default";

const COOKIES_FILE: &str = "cookies.json";
const METADATA_FILE: &str = "metadata.json";

/// A named authentication profile.
#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub session: Session,
    pub email: Option<String>,
    pub last_validated: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Metadata {
    #[serde(default)]
    csrf_token: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    last_validated: Option<DateTime<Utc>>,
}

/// File-backed store of authentication profiles.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    root: PathBuf,
}

impl ProfileStore {
    /// Store rooted at an explicit directory (tests use a tempdir).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the user's config directory (`~/.config/nlm/profiles`).
    pub fn default_location() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "nlm").ok_or_else(|| {
            NlmError::Config("Could not determine a home directory for profile storage".to_string())
        })?;
        Ok(Self::new(dirs.config_dir().join("profiles")))
    }

    fn profile_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Whether the named profile exists on disk.
    pub fn exists(&self, name: &str) -> bool {
        self.profile_dir(name).join(COOKIES_FILE).exists()
    }

    /// Load a profile from disk.
    pub fn load(&self, name: &str) -> Result<Profile> {
        let dir = self.profile_dir(name);
        let cookies_path = dir.join(COOKIES_FILE);
        if !cookies_path.exists() {
            return Err(NlmError::Authentication(format!(
                "Profile '{}' not found. Run `nlm login` to create it.",
                name
            ))
            .into());
        }

        let cookies: Cookies = serde_json::from_str(&fs::read_to_string(&cookies_path)?)
            .map_err(|e| {
                NlmError::Authentication(format!(
                    "Profile '{}' is corrupted ({}). Run `nlm login` to re-authenticate.",
                    name, e
                ))
            })?;

        let metadata_path = dir.join(METADATA_FILE);
        let metadata: Metadata = if metadata_path.exists() {
            serde_json::from_str(&fs::read_to_string(&metadata_path)?).unwrap_or_default()
        } else {
            Metadata::default()
        };

        let mut session = Session::from_cookies(cookies);
        session.csrf_token = metadata.csrf_token;
        session.session_id = metadata.session_id;
        if let Some(validated) = metadata.last_validated {
            session.extracted_at = validated;
        }

        Ok(Profile {
            name: name.to_string(),
            session,
            email: metadata.email,
            last_validated: metadata.last_validated,
        })
    }

    /// Persist a session under the named profile. Returns the saved profile.
    pub fn save(&self, name: &str, session: &Session, email: Option<&str>) -> Result<Profile> {
        let dir = self.profile_dir(name);
        fs::create_dir_all(&dir)?;
        restrict_dir_permissions(&dir)?;

        let cookies_path = dir.join(COOKIES_FILE);
        fs::write(&cookies_path, serde_json::to_string_pretty(&session.cookies)?)?;
        restrict_file_permissions(&cookies_path)?;

        let now = Utc::now();
        let metadata = Metadata {
            csrf_token: session.csrf_token.clone(),
            session_id: session.session_id.clone(),
            email: email.map(str::to_string),
            last_validated: Some(now),
        };
        let metadata_path = dir.join(METADATA_FILE);
        fs::write(&metadata_path, serde_json::to_string_pretty(&metadata)?)?;
        restrict_file_permissions(&metadata_path)?;

        Ok(Profile {
            name: name.to_string(),
            session: session.clone(),
            email: email.map(str::to_string),
            last_validated: Some(now),
        })
    }

    /// Delete the named profile permanently.
    pub fn delete(&self, name: &str) -> Result<()> {
        let dir = self.profile_dir(name);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }

    /// List the names of all stored profiles.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(unix)]
fn restrict_dir_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
    Ok(())
}

#[cfg(unix)]
fn restrict_file_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_dir_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(not(unix))]
fn restrict_file_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
