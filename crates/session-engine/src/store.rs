use brief_core::{BriefError, Snapshot};
use std::path::{Path, PathBuf};

/// The single persisted snapshot document, replaced wholesale on each save.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the previous snapshot. A missing file is a first run; an
    /// unreadable or corrupt file is logged and treated the same way.
    pub fn load(&self) -> Snapshot {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No previous snapshot at {}, starting empty", self.path.display());
                return Snapshot::default();
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {} - starting empty", self.path.display(), e);
                return Snapshot::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(
                    "Corrupt snapshot at {}: {} - starting empty",
                    self.path.display(),
                    e
                );
                Snapshot::default()
            }
        }
    }

    /// Write the snapshot to a sibling temp file, then rename it over the
    /// target so readers never see a half-written document.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), BriefError> {
        let body = serde_json::to_string_pretty(snapshot)
            .map_err(|e| BriefError::Persistence(format!("serialize snapshot: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                BriefError::Persistence(format!("create {}: {}", parent.display(), e))
            })?;
        }

        let tmp = self.tmp_path();
        std::fs::write(&tmp, body)
            .map_err(|e| BriefError::Persistence(format!("write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            BriefError::Persistence(format!("replace {}: {}", self.path.display(), e))
        })?;

        tracing::info!("Snapshot saved to {}", self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
