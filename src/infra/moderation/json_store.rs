use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::core::moderation::{ConfigStore, ModerationConfig, StoreError};

/// Keeps the moderation config in a single pretty-printed JSON file.
///
/// Writes go to a sibling `.tmp` file that is then renamed over the real one,
/// so a crash mid-write leaves the previous record intact.
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("config.json"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ConfigStore for JsonConfigStore {
    async fn read(&self) -> Result<Option<ModerationConfig>, StoreError> {
        if !fs::try_exists(&self.path).await? {
            return Ok(None);
        }

        let text = fs::read_to_string(&self.path).await?;
        let config: ModerationConfig = serde_json::from_str(&text)?;
        Ok(Some(config))
    }

    async fn write(&self, config: &ModerationConfig) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let text = serde_json::to_string_pretty(config)?;
        let temp = self.temp_path();
        fs::write(&temp, text).await?;
        fs::rename(&temp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), "Moderation config saved");
        Ok(())
    }
}
