//! `build`：把 `app/` 负载打包为输出归档。

use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use zip::CompressionMethod;
use zip::write::FileOptions;

use super::Manifest;

/// 构建类型（封闭集合），缺省为 debug。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildType {
    Debug,
    Release,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown build type '{0}': expected debug or release")]
pub struct BuildTypeError(String);

impl BuildType {
    pub fn from_name(name: &str) -> Result<Self, BuildTypeError> {
        match name.trim() {
            "debug" => Ok(Self::Debug),
            "release" => Ok(Self::Release),
            other => Err(BuildTypeError(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn compression(&self) -> CompressionMethod {
        // debug 包求快不求小
        match self {
            Self::Debug => CompressionMethod::Stored,
            Self::Release => CompressionMethod::Deflated,
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Manifest(#[from] super::ManifestError),
    #[error("no app payload at {0} (expected an 'app' directory)")]
    MissingPayload(PathBuf),
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("zip error for {path}: {source}")]
    Zip {
        path: PathBuf,
        source: zip::result::ZipError,
    },
}

/// 打包 `project_dir/app` 为 `<package>-<build-type>.zip`，返回输出路径。
///
/// 条目按文件名排序写入，产物字节序确定；已存在的输出文件被覆盖。
pub fn build_package(project_dir: &Path, build_type: BuildType) -> Result<PathBuf, BuildError> {
    let manifest = Manifest::load(project_dir)?;

    let app_dir = project_dir.join("app");
    if !app_dir.is_dir() {
        return Err(BuildError::MissingPayload(app_dir));
    }

    let out_path = project_dir.join(format!("{}-{}.zip", manifest.package, build_type));
    let out_file = File::create(&out_path).map_err(|source| BuildError::Io {
        path: out_path.clone(),
        source,
    })?;

    let mut zip = zip::ZipWriter::new(out_file);
    let options = FileOptions::default().compression_method(build_type.compression());
    add_dir_recursive(&mut zip, &app_dir, &app_dir, options)?;
    zip.finish().map_err(|source| BuildError::Zip {
        path: out_path.clone(),
        source,
    })?;

    info!(
        target: "project",
        package = %manifest.package,
        %build_type,
        out = %out_path.display(),
        "package built"
    );
    Ok(out_path)
}

fn add_dir_recursive(
    zip: &mut zip::ZipWriter<File>,
    root: &Path,
    dir: &Path,
    options: FileOptions,
) -> Result<(), BuildError> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .map_err(|source| BuildError::Io {
            path: dir.to_path_buf(),
            source,
        })?
        .collect::<Result<_, _>>()
        .map_err(|source| BuildError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let relative = path
            .strip_prefix(root)
            .expect("entry path is below the walk root");
        let name = relative.to_string_lossy().replace('\\', "/");

        if path.is_dir() {
            zip.add_directory(format!("{name}/"), options)
                .map_err(|source| BuildError::Zip {
                    path: path.clone(),
                    source,
                })?;
            add_dir_recursive(zip, root, &path, options)?;
        } else {
            zip.start_file(&name, options)
                .map_err(|source| BuildError::Zip {
                    path: path.clone(),
                    source,
                })?;
            let mut file = File::open(&path).map_err(|source| BuildError::Io {
                path: path.clone(),
                source,
            })?;
            io::copy(&mut file, zip).map_err(|source| BuildError::Io {
                path: path.clone(),
                source,
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_system::package_id::PackageId;
    use crate::project::scaffold::create_project;

    #[test]
    fn build_type_is_a_closed_set() {
        assert_eq!(BuildType::from_name("debug"), Ok(BuildType::Debug));
        assert_eq!(BuildType::from_name("release"), Ok(BuildType::Release));
        assert!(BuildType::from_name("profile").is_err());
        assert!(BuildType::from_name("").is_err());
    }

    #[test]
    fn builds_archive_named_for_package_and_type() {
        let dir = tempfile::tempdir().unwrap();
        let id = PackageId::parse("com.example.app").unwrap();
        let project = create_project(&id, dir.path()).unwrap();

        let out = build_package(&project, BuildType::Debug).unwrap();
        assert!(out.ends_with("com.example.app-debug.zip"));
        assert!(out.is_file());

        // 产物应当能解开并含有起始页
        let unpacked = dir.path().join("unpacked");
        crate::project::extract::unpack_archive(&out, &unpacked).unwrap();
        assert!(unpacked.join("index.html").is_file());
    }

    #[test]
    fn build_fails_without_payload_directory() {
        let dir = tempfile::tempdir().unwrap();
        let id = PackageId::parse("com.example.app").unwrap();
        let project = create_project(&id, dir.path()).unwrap();
        fs::remove_dir_all(project.join("app")).unwrap();

        let err = build_package(&project, BuildType::Release).unwrap_err();
        assert!(matches!(err, BuildError::MissingPayload(_)));
    }
}
