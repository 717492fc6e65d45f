//! `create`：生成新工程骨架。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use super::Manifest;
use crate::base_system::package_id::PackageId;

const STARTER_PAGE: &str = "<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n  <title>WebRT App</title>\n</head>\n<body>\n  <h1>It works!</h1>\n</body>\n</html>\n";

#[derive(Debug, Error)]
pub enum ScaffoldError {
    #[error("directory '{0}' already exists, refusing to overwrite")]
    AlreadyExists(PathBuf),
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Manifest(#[from] super::ManifestError),
}

/// 在 `parent` 下创建以包名命名的工程目录。
///
/// 生成 `manifest.json` 和带起始页的 `app/` 负载目录；
/// 目录已存在时拒绝覆盖。返回新工程路径。
pub fn create_project(package_id: &PackageId, parent: &Path) -> Result<PathBuf, ScaffoldError> {
    let project_dir = parent.join(package_id.as_str());
    if project_dir.exists() {
        return Err(ScaffoldError::AlreadyExists(project_dir));
    }

    let app_dir = project_dir.join("app");
    fs::create_dir_all(&app_dir).map_err(|source| ScaffoldError::Io {
        path: app_dir.clone(),
        source,
    })?;

    Manifest::new(package_id.as_str()).save(&project_dir)?;

    let index = app_dir.join("index.html");
    fs::write(&index, STARTER_PAGE).map_err(|source| ScaffoldError::Io {
        path: index,
        source,
    })?;

    info!(target: "project", package = %package_id, dir = %project_dir.display(), "project created");
    Ok(project_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_skeleton_with_manifest_and_payload() {
        let dir = tempfile::tempdir().unwrap();
        let id = PackageId::parse("com.example.app").unwrap();

        let project = create_project(&id, dir.path()).unwrap();
        assert!(project.ends_with("com.example.app"));
        assert!(project.join("manifest.json").is_file());
        assert!(project.join("app").join("index.html").is_file());

        let manifest = Manifest::load(&project).unwrap();
        assert_eq!(manifest.package, "com.example.app");
        assert!(manifest.runtime_version.is_none());
    }

    #[test]
    fn refuses_to_overwrite_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let id = PackageId::parse("com.example.app").unwrap();
        create_project(&id, dir.path()).unwrap();

        let err = create_project(&id, dir.path()).unwrap_err();
        assert!(matches!(err, ScaffoldError::AlreadyExists(_)));
    }
}
