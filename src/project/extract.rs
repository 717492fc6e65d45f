//! 运行时归档解包。

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("open archive {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("bad archive {path}: {source}")]
    Archive {
        path: PathBuf,
        source: zip::result::ZipError,
    },
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// 把 zip 归档解包到 `dest` 目录（必要时创建）。
///
/// 条目路径经 `enclosed_name` 约束在目标目录内，越界条目跳过；
/// 已存在的文件被覆盖。
pub fn unpack_archive(archive_path: &Path, dest: &Path) -> Result<(), ExtractError> {
    let file = File::open(archive_path).map_err(|source| ExtractError::Open {
        path: archive_path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|source| ExtractError::Archive {
        path: archive_path.to_path_buf(),
        source,
    })?;

    fs::create_dir_all(dest).map_err(|source| ExtractError::Io {
        path: dest.to_path_buf(),
        source,
    })?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|source| ExtractError::Archive {
                path: archive_path.to_path_buf(),
                source,
            })?;

        let out_path = match entry.enclosed_name() {
            Some(relative) => dest.join(relative),
            None => {
                debug!(target: "project", name = entry.name(), "skipping unsafe archive entry");
                continue;
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|source| ExtractError::Io {
                path: out_path.clone(),
                source,
            })?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|source| ExtractError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut out_file = File::create(&out_path).map_err(|source| ExtractError::Io {
            path: out_path.clone(),
            source,
        })?;
        io::copy(&mut entry, &mut out_file).map_err(|source| ExtractError::Io {
            path: out_path.clone(),
            source,
        })?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&out_path, fs::Permissions::from_mode(mode));
        }
    }

    info!(target: "project", archive = %archive_path.display(), dest = %dest.display(), "archive unpacked");
    Ok(())
}
