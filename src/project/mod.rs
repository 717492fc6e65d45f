//! 工程边界：骨架生成、归档解包、应用打包。

pub mod build;
pub mod extract;
pub mod scaffold;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MANIFEST_NAME: &str = "manifest.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("no manifest at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// 工程清单（`manifest.json`）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub package: String,
    /// 最近一次 `update` 解包的运行时版本；新建工程时为空。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
}

impl Manifest {
    pub fn new(package: &str) -> Self {
        Self {
            package: package.to_string(),
            runtime_version: None,
        }
    }

    pub fn load(project_dir: &Path) -> Result<Self, ManifestError> {
        let path = project_dir.join(MANIFEST_NAME);
        let raw = fs::read_to_string(&path).map_err(|source| ManifestError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ManifestError::Parse { path, source })
    }

    pub fn save(&self, project_dir: &Path) -> Result<(), ManifestError> {
        let path = project_dir.join(MANIFEST_NAME);
        let raw = serde_json::to_string_pretty(self).map_err(|source| ManifestError::Parse {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, raw + "\n").map_err(|source| ManifestError::Io { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut manifest = Manifest::new("com.example.app");
        manifest.runtime_version = Some("14.43.343.25".to_string());
        manifest.save(dir.path()).unwrap();

        let loaded = Manifest::load(dir.path()).unwrap();
        assert_eq!(loaded.package, "com.example.app");
        assert_eq!(loaded.runtime_version.as_deref(), Some("14.43.343.25"));
    }

    #[test]
    fn load_fails_outside_a_project() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Manifest::load(dir.path()).is_err());
    }
}
