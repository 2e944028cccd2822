use crate::error::CollectorError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// One session cookie as persisted to disk. The remote site decides what it
/// means; we only carry it between the browser and the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

/// Persists the credential set and owns the isolated browser-profile
/// directory next to it. Construct with an explicit data directory; see
/// `config::default_data_dir` for the default resolution.
#[derive(Debug, Clone)]
pub struct SessionStore {
    data_dir: PathBuf,
}

impl SessionStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn credential_file(&self) -> PathBuf {
        self.data_dir.join("cookies.json")
    }

    /// Persistent, isolated identity for the interactive browser, kept apart
    /// from the user's default profile.
    pub fn profile_dir(&self) -> PathBuf {
        self.data_dir.join("browser_profile")
    }

    /// Replaces the stored set wholesale. Writes to a temporary sibling and
    /// renames so readers never observe a truncated file.
    pub fn save(&self, credentials: &[Credential]) -> Result<(), CollectorError> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            CollectorError::Persistence(format!(
                "could not create {}: {}",
                self.data_dir.display(),
                e
            ))
        })?;

        let payload = serde_json::to_string_pretty(credentials)?;
        let tmp = self.data_dir.join("cookies.json.tmp");
        fs::write(&tmp, payload)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&tmp, self.credential_file())?;
        tracing::info!(
            "💾 saved {} credentials to {}",
            credentials.len(),
            self.credential_file().display()
        );
        Ok(())
    }

    /// An absent file is a valid "no session" state, not an error.
    pub fn load(&self) -> Result<Vec<Credential>, CollectorError> {
        let path = self.credential_file();
        if !path.exists() {
            tracing::debug!("no credential file at {}", path.display());
            return Ok(Vec::new());
        }

        let data = fs::read_to_string(&path)
            .map_err(|e| CollectorError::Persistence(format!("could not read {}: {}", path.display(), e)))?;
        let credentials: Vec<Credential> = serde_json::from_str(&data)?;
        tracing::debug!("loaded {} credentials from {}", credentials.len(), path.display());
        Ok(credentials)
    }

    /// Existence probe only; makes no claim about validity.
    pub fn exists(&self) -> bool {
        self.credential_file().exists()
    }

    /// Removes the credential file and the browser profile. Idempotent.
    pub fn clear(&self) -> Result<(), CollectorError> {
        let path = self.credential_file();
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::info!("🗑 removed {}", path.display());
        }

        let profile = self.profile_dir();
        if profile.exists() {
            fs::remove_dir_all(&profile)?;
            tracing::info!("🗑 removed browser profile {}", profile.display());
        }

        Ok(())
    }
}
