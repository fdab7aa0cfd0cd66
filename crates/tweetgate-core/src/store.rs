// ============================================================================
// Credential Store: where the auth server leaves the credential bundle
// ============================================================================
// FileCredentialStore writes pretty-printed JSON (default: ./authData.json,
// override via AUTH_DATA_PATH). Every save replaces the whole file.
// ============================================================================

use anyhow::{anyhow, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

use crate::types::CredentialBundle;

/// Persistence for the single credential bundle
pub trait CredentialStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<CredentialBundle>>;

    /// Replace any previously stored bundle
    fn save(&self, bundle: &CredentialBundle) -> Result<()>;
}

/// JSON file on disk
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<CredentialBundle>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No credential file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(anyhow!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                ))
            }
        };

        let bundle: CredentialBundle = serde_json::from_str(&contents)
            .map_err(|e| anyhow!("Failed to parse {}: {}", self.path.display(), e))?;

        debug!("Loaded credentials for @{}", bundle.user.username);
        Ok(Some(bundle))
    }

    fn save(&self, bundle: &CredentialBundle) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow!("Failed to create {}: {}", parent.display(), e))?;
        }

        let json = serde_json::to_string_pretty(bundle)
            .map_err(|e| anyhow!("Failed to serialize credentials: {}", e))?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(&self.path)
            .map_err(|e| anyhow!("Failed to open {}: {}", self.path.display(), e))?;
        file.write_all(json.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| anyhow!("Failed to write {}: {}", self.path.display(), e))?;

        info!("Authentication data saved to {}", self.path.display());
        Ok(())
    }
}

/// In-process store, handy for tests and dry runs
#[derive(Default)]
pub struct MemoryCredentialStore {
    bundle: Mutex<Option<CredentialBundle>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundle(bundle: CredentialBundle) -> Self {
        Self {
            bundle: Mutex::new(Some(bundle)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<CredentialBundle>> {
        let guard = self
            .bundle
            .lock()
            .map_err(|_| anyhow!("Failed to lock credential store"))?;
        Ok(guard.clone())
    }

    fn save(&self, bundle: &CredentialBundle) -> Result<()> {
        let mut guard = self
            .bundle
            .lock()
            .map_err(|_| anyhow!("Failed to lock credential store"))?;
        *guard = Some(bundle.clone());
        Ok(())
    }
}
