//! Catalog of experiment configuration files.
//!
//! Configurations live under a root directory as
//! `{experiment}_{stimuli_set}/{condition}/batch_{b}_shuffle_{s}.json`. The
//! catalog holds every `*.json` file whose parent directory is the served
//! condition, and hands each participant one of them.

use std::path::{Path, PathBuf};

use drawlang_core::{CoreError, ExperimentConfig};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};
use walkdir::WalkDir;

pub const DEFAULT_CONDITION: &str = "all";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to scan config directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid experiment config {path}: {source}")]
    Parse { path: PathBuf, source: CoreError },

    #[error("No configs for condition '{condition}' under {root}")]
    Empty { root: PathBuf, condition: String },
}

#[derive(Debug, Clone)]
pub struct ConfigCatalog {
    condition: String,
    entries: Vec<PathBuf>,
}

impl ConfigCatalog {
    /// Scan `root` for configurations belonging to `condition`.
    pub fn load(root: impl AsRef<Path>, condition: &str) -> Result<Self, CatalogError> {
        let root = root.as_ref().to_path_buf();
        let mut entries = Vec::new();

        for entry in WalkDir::new(&root).follow_links(true) {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("json")
            {
                continue;
            }
            let in_condition = path
                .parent()
                .and_then(Path::file_name)
                .and_then(|name| name.to_str())
                == Some(condition);
            if in_condition {
                entries.push(path.to_path_buf());
            }
        }

        if entries.is_empty() {
            return Err(CatalogError::Empty {
                root,
                condition: condition.to_string(),
            });
        }
        // Sorted so assignment does not depend on directory iteration order.
        entries.sort();

        info!(
            root = %root.display(),
            condition,
            configs = entries.len(),
            "Loaded experiment config catalog"
        );

        Ok(Self {
            condition: condition.to_string(),
            entries,
        })
    }

    pub fn condition(&self) -> &str {
        &self.condition
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// The config file assigned to `user_id`. Stable for a given catalog.
    pub fn assign(&self, user_id: &str) -> &Path {
        let digest = Sha256::digest(user_id.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        let index = (u64::from_be_bytes(prefix) % self.entries.len() as u64) as usize;

        debug!(
            user_id,
            key = %hex::encode(prefix),
            index,
            "Assigned experiment config"
        );
        &self.entries[index]
    }

    /// Read and validate the configuration assigned to `user_id`.
    pub async fn config_for(&self, user_id: &str) -> Result<ExperimentConfig, CatalogError> {
        let path = self.assign(user_id);
        let content = fs::read_to_string(path)
            .await
            .map_err(|source| CatalogError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        ExperimentConfig::from_json(&content).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONFIG: &str = r#"{
        "phases": ["phase_1"],
        "phase_1": {"ui_components": ["images", "draw"], "images": ["a.png"]},
        "metadata": {"experiment_id": "baseline_priors_v0"}
    }"#;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn catalog_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "exp_set/all/batch_0_shuffle_0.json", CONFIG);
        write(dir.path(), "exp_set/all/batch_1_shuffle_0.json", CONFIG);
        write(dir.path(), "exp_set/all/notes.txt", "not a config");
        write(dir.path(), "exp_set/pilot/batch_0_shuffle_0.json", CONFIG);
        dir
    }

    #[test]
    fn test_load_filters_by_condition() {
        let dir = catalog_dir();
        let catalog = ConfigCatalog::load(dir.path(), DEFAULT_CONDITION).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog
            .entries()
            .iter()
            .all(|p| p.parent().unwrap().ends_with("all")));

        let pilot = ConfigCatalog::load(dir.path(), "pilot").unwrap();
        assert_eq!(pilot.len(), 1);
    }

    #[test]
    fn test_load_empty_condition() {
        let dir = catalog_dir();
        let err = ConfigCatalog::load(dir.path(), "missing").unwrap_err();
        assert!(matches!(err, CatalogError::Empty { .. }));
        assert!(err.to_string().contains(&dir.path().display().to_string()));
    }

    #[test]
    fn test_assignment_is_stable() {
        let dir = catalog_dir();
        let catalog = ConfigCatalog::load(dir.path(), DEFAULT_CONDITION).unwrap();
        for user in ["alice", "bob", "5f1c0e"] {
            assert_eq!(catalog.assign(user), catalog.assign(user));
        }
    }

    #[tokio::test]
    async fn test_config_for_parses() {
        let dir = catalog_dir();
        let catalog = ConfigCatalog::load(dir.path(), DEFAULT_CONDITION).unwrap();
        let config = catalog.config_for("alice").await.unwrap();
        assert_eq!(
            config.metadata.experiment_id.as_deref(),
            Some("baseline_priors_v0")
        );
    }

    #[tokio::test]
    async fn test_config_for_rejects_invalid() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "bad/all/batch_0_shuffle_0.json", r#"{"phases": ["x"]}"#);
        let catalog = ConfigCatalog::load(dir.path(), DEFAULT_CONDITION).unwrap();
        assert!(matches!(
            catalog.config_for("alice").await,
            Err(CatalogError::Parse { .. })
        ));
    }
}
