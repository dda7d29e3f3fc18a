//! Optional `drawlang.toml` settings file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use engine::EngineOptions;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "drawlang.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSection,
    pub engine: EngineOptions,
}

/// `[server]` table. Absent keys fall back to the command-line defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub port: Option<u16>,
    pub configs_dir: Option<PathBuf>,
    pub condition: Option<String>,
    pub static_dir: Option<PathBuf>,
    pub database: Option<String>,
}

impl Settings {
    /// Load settings from `explicit`, else `./drawlang.toml`, else the user
    /// config directory. Missing files yield defaults; an explicit path must
    /// exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::read(path);
        }

        let candidates = [
            Some(PathBuf::from(CONFIG_FILE)),
            dirs::config_dir().map(|dir| dir.join("drawlang").join(CONFIG_FILE)),
        ];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                return Self::read(&path);
            }
        }

        tracing::debug!("No {} found, using defaults", CONFIG_FILE);
        Ok(Self::default())
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"
            [server]
            port = 8080
            condition = "pilot"

            [engine]
            min_strokes = 3
            playback_delay_ms = 0
            "#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.server.port, Some(8080));
        assert_eq!(settings.server.condition.as_deref(), Some("pilot"));
        assert!(settings.server.database.is_none());
        assert_eq!(settings.engine.min_strokes, 3);
        assert_eq!(settings.engine.playback_delay_ms, 0);
        assert_eq!(settings.engine.asset_base, "static/images/stim/");
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(Settings::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
