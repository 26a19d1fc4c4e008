use chrono::NaiveDate;
use digest_core::{ArtifactError, ArtifactPattern, ArtifactStore, CoreError};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};


fn validate_name(name: &str) -> Result<(), CoreError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(CoreError::Artifact(ArtifactError::InvalidName {
            name: name.to_string(),
        }));
    }
    Ok(())
}

/// Artifacts stored as plain files under `<base>/<YYYY-MM-DD>/`.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Opens the partition for `date`, creating the directory if needed.
    pub async fn open(base: &Path, date: NaiveDate) -> Result<Self, CoreError> {
        let root = base.join(date.format("%Y-%m-%d").to_string());
        tokio::fs::create_dir_all(&root).await?;
        info!("Artifact partition: {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, CoreError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }
}

impl ArtifactStore for FsArtifactStore {
    async fn write(&self, name: &str, text: &str) -> Result<(), CoreError> {
        let path = self.path_for(name)?;
        tokio::fs::write(&path, text).await.map_err(|e| {
            CoreError::Artifact(ArtifactError::WriteFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })
        })?;
        debug!("Wrote {} ({} bytes)", path.display(), text.len());
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<String, CoreError> {
        let path = self.path_for(name)?;
        tokio::fs::read_to_string(&path).await.map_err(|e| {
            let error = match e.kind() {
                ErrorKind::NotFound => ArtifactError::NotFound {
                    name: name.to_string(),
                },
                _ => ArtifactError::ReadFailed {
                    name: name.to_string(),
                    reason: e.to_string(),
                },
            };
            CoreError::Artifact(error)
        })
    }

    async fn list(&self, pattern: &ArtifactPattern) -> Result<Vec<String>, CoreError> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if pattern.matches(name) {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

/// In-process store with the same naming rules, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: Mutex<BTreeMap<String, String>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifacts<I, K, V>(artifacts: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            artifacts: Mutex::new(
                artifacts
                    .into_iter()
                    .map(|(name, text)| (name.into(), text.into()))
                    .collect(),
            ),
        }
    }

    pub async fn snapshot(&self) -> BTreeMap<String, String> {
        self.artifacts.lock().await.clone()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    async fn write(&self, name: &str, text: &str) -> Result<(), CoreError> {
        validate_name(name)?;
        self.artifacts
            .lock()
            .await
            .insert(name.to_string(), text.to_string());
        Ok(())
    }

    async fn read(&self, name: &str) -> Result<String, CoreError> {
        validate_name(name)?;
        self.artifacts
            .lock()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| {
                CoreError::Artifact(ArtifactError::NotFound {
                    name: name.to_string(),
                })
            })
    }

    async fn list(&self, pattern: &ArtifactPattern) -> Result<Vec<String>, CoreError> {
        Ok(self
            .artifacts
            .lock()
            .await
            .keys()
            .filter(|name| pattern.matches(name))
            .cloned()
            .collect())
    }
}
