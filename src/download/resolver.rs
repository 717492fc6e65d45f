//! 渠道解析：发现可用版本、定位本地归档、下载指定版本。

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};

use super::listing;
use super::progress::ProgressIndicator;
use super::transfer::{TransferClient, TransferError};
use crate::base_system::version::RuntimeVersion;

/// 归档文件名前缀：`webrt-<version>.zip`。
pub const ARCHIVE_PREFIX: &str = "webrt";

static RE_ARCHIVE: OnceLock<Regex> = OnceLock::new();

fn re_archive() -> &'static Regex {
    RE_ARCHIVE.get_or_init(|| {
        Regex::new(r"^webrt-\d+\.\d+\.\d+\.\d+\.zip$").expect("compile RE_ARCHIVE")
    })
}

/// 发布渠道（封闭集合）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Stable,
    Beta,
    Canary,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown channel '{0}': expected stable, beta or canary")]
pub struct ChannelError(String);

impl Channel {
    pub fn from_name(name: &str) -> Result<Self, ChannelError> {
        match name.trim() {
            "stable" => Ok(Self::Stable),
            "beta" => Ok(Self::Beta),
            "canary" => Ok(Self::Canary),
            other => Err(ChannelError(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Beta => "beta",
            Self::Canary => "canary",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Transfer(#[from] TransferError),
    #[error("temp file for listing: {0}")]
    TempFile(#[source] io::Error),
    #[error("read listing {path}: {source}")]
    ReadListing { path: PathBuf, source: io::Error },
}

/// 绑定单一渠道的版本解析器。
///
/// 每次命令调用构造一次，渠道在构造前已通过 [`Channel::from_name`]
/// 校验；各操作之间不保留状态。
pub struct ChannelResolver {
    channel: Channel,
    base_url: String,
    client: TransferClient,
}

impl ChannelResolver {
    pub fn new(channel: Channel, base_url: &str) -> Result<Self, ResolveError> {
        Ok(Self {
            channel,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: TransferClient::new()?,
        })
    }

    pub fn listing_url(&self) -> String {
        format!("{}/{}/", self.base_url, self.channel)
    }

    pub fn archive_name(version: &RuntimeVersion) -> String {
        format!("{ARCHIVE_PREFIX}-{version}.zip")
    }

    pub fn archive_url(&self, version: &RuntimeVersion) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url,
            self.channel,
            version,
            Self::archive_name(version)
        )
    }

    /// 拉取渠道目录列表并返回可用版本（旧→新）。
    ///
    /// 列表先落到一个作用域临时文件再读回，临时文件在所有退出
    /// 路径上都会被删除（包括下载失败）。下载失败返回错误；列表为
    /// 空或没有任何合法条目时返回空列表，不视为错误。
    pub fn fetch_versions(&self) -> Result<Vec<RuntimeVersion>, ResolveError> {
        let url = self.listing_url();

        let tmp = tempfile::Builder::new()
            .prefix("webrt-listing-")
            .suffix(".html")
            .tempfile()
            .map_err(ResolveError::TempFile)?;

        let mut progress = ProgressIndicator::new(&format!("Fetching {} listing", self.channel));
        let outcome = self
            .client
            .download(&url, tmp.path(), |fraction| progress.update(fraction));
        if let Err(err) = outcome {
            progress.done("version listing fetch failed");
            return Err(err.into());
        }
        progress.done("version listing fetched");

        let text = fs::read_to_string(tmp.path()).map_err(|source| ResolveError::ReadListing {
            path: tmp.path().to_path_buf(),
            source,
        })?;

        let versions = listing::parse_versions(&text);
        debug!(
            target: "download",
            channel = %self.channel,
            count = versions.len(),
            "listing parsed"
        );
        Ok(versions)
    }

    /// 下载指定版本的归档到 `dest_dir`，返回归档文件名。
    ///
    /// 目标路径存在同名文件时无条件覆盖；传输中途失败可能留下
    /// 半截文件，不做回滚。
    pub fn download(
        &self,
        version: &RuntimeVersion,
        dest_dir: &Path,
    ) -> Result<String, ResolveError> {
        let name = Self::archive_name(version);
        let url = self.archive_url(version);
        let dest = dest_dir.join(&name);

        info!(
            target: "download",
            channel = %self.channel,
            %version,
            "downloading runtime archive"
        );

        let mut progress = ProgressIndicator::new(&format!("Downloading {name}"));
        let outcome = self
            .client
            .download(&url, &dest, |fraction| progress.update(fraction));
        if let Err(err) = outcome {
            progress.done("download failed");
            return Err(err.into());
        }
        progress.done(&format!("downloaded {name}"));

        Ok(name)
    }
}

/// 在当前目录（其次父目录）查找已下载的运行时归档。
///
/// 同一目录存在多个候选时取文件名字典序最大者；按归档命名惯例
/// 这对应字符串序最高的版本（注意不是语义版本序，位宽不同的
/// 版本号需要调用方自行排序）。两处都没有则返回 `None`。
pub fn find_archive() -> Option<PathBuf> {
    find_archive_from(Path::new("."))
}

fn find_archive_from(dir: &Path) -> Option<PathBuf> {
    find_archive_in(dir).or_else(|| find_archive_in(&dir.join("..")))
}

pub fn find_archive_in(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut best: Option<String> = None;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if re_archive().is_match(name) && best.as_deref().is_none_or(|b| name > b) {
            best = Some(name.to_string());
        }
    }
    best.map(|name| dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn channel_construction_is_a_closed_set() {
        assert_eq!(Channel::from_name("stable"), Ok(Channel::Stable));
        assert_eq!(Channel::from_name("beta"), Ok(Channel::Beta));
        assert_eq!(Channel::from_name("canary"), Ok(Channel::Canary));
        assert!(Channel::from_name("nightly").is_err());
        assert!(Channel::from_name("").is_err());
        assert!(Channel::from_name("Stable").is_err());
    }

    #[test]
    fn urls_follow_the_channel_layout() {
        let resolver =
            ChannelResolver::new(Channel::Beta, "https://releases.webrt.dev/android/").unwrap();
        assert_eq!(
            resolver.listing_url(),
            "https://releases.webrt.dev/android/beta/"
        );

        let version = RuntimeVersion::parse("14.43.343.25").unwrap();
        assert_eq!(
            resolver.archive_url(&version),
            "https://releases.webrt.dev/android/beta/14.43.343.25/webrt-14.43.343.25.zip"
        );
        assert_eq!(
            ChannelResolver::archive_name(&version),
            "webrt-14.43.343.25.zip"
        );
    }

    #[test]
    fn failed_fetch_surfaces_error_and_removes_temp_file() {
        // 端口 1 无人监听，连接立即被拒
        let resolver = ChannelResolver::new(Channel::Stable, "http://127.0.0.1:1").unwrap();

        let err = resolver.fetch_versions().unwrap_err();
        assert!(!err.to_string().is_empty());

        let leaked = fs::read_dir(std::env::temp_dir())
            .unwrap()
            .flatten()
            .any(|e| e.file_name().to_string_lossy().starts_with("webrt-listing-"));
        assert!(!leaked);
    }

    #[test]
    fn failed_download_yields_no_filename_and_no_file() {
        let resolver = ChannelResolver::new(Channel::Stable, "http://127.0.0.1:1").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let version = RuntimeVersion::parse("1.2.3.4").unwrap();

        let err = resolver.download(&version, dir.path()).unwrap_err();
        assert!(!err.to_string().is_empty());
        assert!(!dir.path().join("webrt-1.2.3.4.zip").exists());
    }

    #[test]
    fn find_picks_lexicographically_last_archive() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "webrt-6.36.132.6.zip",
            "webrt-14.43.343.25.zip",
            "webrt-9.1.2.3.zip",
            "webrt-not-a-version.zip",
            "other-14.43.343.25.zip",
        ] {
            File::create(dir.path().join(name)).unwrap();
        }

        let found = find_archive_in(dir.path()).unwrap();
        // 纯字符串序："9..." > "6..." > "14..."
        assert_eq!(
            found.file_name().unwrap().to_str().unwrap(),
            "webrt-9.1.2.3.zip"
        );
    }

    #[test]
    fn find_ignores_non_matching_names() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("webrt-1.2.3.zip")).unwrap();
        File::create(dir.path().join("webrt-1.2.3.4.zip.part")).unwrap();
        assert!(find_archive_in(dir.path()).is_none());
    }

    #[test]
    fn find_prefers_current_dir_over_parent() {
        let parent = tempfile::tempdir().unwrap();
        let child = parent.path().join("project");
        fs::create_dir(&child).unwrap();

        File::create(parent.path().join("webrt-9.9.9.9.zip")).unwrap();
        File::create(child.join("webrt-1.2.3.4.zip")).unwrap();

        // 当前目录有候选时父目录的更高版本不参与
        let found = find_archive_from(&child).unwrap();
        assert_eq!(
            found.file_name().unwrap().to_str().unwrap(),
            "webrt-1.2.3.4.zip"
        );
    }

    #[test]
    fn find_falls_back_to_parent_dir() {
        let parent = tempfile::tempdir().unwrap();
        let child = parent.path().join("project");
        fs::create_dir(&child).unwrap();
        File::create(parent.path().join("webrt-9.9.9.9.zip")).unwrap();

        let found = find_archive_from(&child).unwrap();
        assert_eq!(
            found.file_name().unwrap().to_str().unwrap(),
            "webrt-9.9.9.9.zip"
        );
    }

    #[test]
    fn find_returns_none_for_empty_or_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_archive_in(dir.path()).is_none());
        assert!(find_archive_in(&dir.path().join("nope")).is_none());
    }
}
