//! WebRT App Tools：创建 / 更新 / 构建捆绑 WebRT 运行时的移动应用包。
//!
//! 代码结构（读代码入口）：
//! - `base_system`：配置 / 日志 / 包名与版本号校验
//! - `download`：渠道解析、目录列表、传输与进度
//! - `project`：工程骨架、归档解包、应用打包

use std::ffi::OsString;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

mod base_system;
mod download;
mod project;

use base_system::config;
use base_system::logging::{LogOptions, LogSystem};
use base_system::package_id::PackageId;
use base_system::version::RuntimeVersion;
use download::resolver::{self, Channel, ChannelResolver};
use project::Manifest;
use project::build::{self, BuildType};
use project::extract;
use project::scaffold;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 解包运行时归档的目标子目录。
const RUNTIME_DIR: &str = "webrt";

#[derive(Debug, Parser)]
#[command(name = "webrt-app")]
#[command(about = "Create, update and build WebRT application packages")]
#[command(version)]
struct Cli {
    /// 启用调试日志输出
    #[arg(long, global = true, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new project skeleton for the given package id
    Create {
        /// Package id, 3+ dot-separated segments, e.g. com.example.app
        #[arg(value_parser = PackageId::parse)]
        package_id: PackageId,
    },
    /// Download a runtime version and unpack it into the current project
    Update {
        /// Runtime version, exactly 4 numeric segments, e.g. 14.43.343.25
        #[arg(value_parser = RuntimeVersion::parse)]
        version: RuntimeVersion,
        /// Release channel; defaults to the configured channel
        #[arg(long, value_parser = Channel::from_name)]
        channel: Option<Channel>,
    },
    /// Package the app payload into an output archive
    Build {
        /// Build type
        #[arg(value_parser = BuildType::from_name, default_value = "debug")]
        build_type: BuildType,
    },
    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse_from(normalized_args(std::env::args_os()));

    if matches!(cli.command, Command::Version) {
        println!("webrt-app-tools v{VERSION}");
        return Ok(());
    }

    let _log = init_logging(cli.debug)?;

    match cli.command {
        Command::Create { package_id } => cmd_create(&package_id),
        Command::Update { version, channel } => cmd_update(&version, channel),
        Command::Build { build_type } => cmd_build(build_type),
        Command::Version => unreachable!("handled above"),
    }
}

/// 单横线长别名归一化（历史 CLI 兼容：`-help` / `-version` / `-v`）。
///
/// 只改写首个非选项 token 之前的参数；子命令之后的字面量
/// 原样交给 clap（可能是某个选项的合法取值）。
fn normalized_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    let mut out = Vec::new();
    let mut rewriting = true;
    for (index, arg) in args.into_iter().enumerate() {
        if rewriting && index > 0 {
            match arg.to_str() {
                Some("-help") => {
                    out.push(OsString::from("--help"));
                    continue;
                }
                Some("-v") | Some("-version") => {
                    out.push(OsString::from("--version"));
                    continue;
                }
                Some(s) if !s.starts_with('-') => rewriting = false,
                _ => {}
            }
        }
        out.push(arg);
    }
    out
}

fn init_logging(debug: bool) -> Result<LogSystem> {
    let opts = LogOptions {
        debug,
        use_color: true,
        archive_on_exit: true,
    };
    LogSystem::init(opts).map_err(|e| anyhow!(e))
}

fn cmd_create(package_id: &PackageId) -> Result<()> {
    let project_dir = scaffold::create_project(package_id, Path::new("."))
        .with_context(|| format!("create project '{package_id}'"))?;

    // 当前目录或上级已有下载好的运行时归档时直接解包进新工程
    match resolver::find_archive() {
        Some(archive) => {
            info!("found local runtime archive {}", archive.display());
            import_runtime(&archive, &project_dir)?;
        }
        None => {
            info!("no local runtime archive found; run `webrt-app update <version>` inside the project");
        }
    }

    println!("Created project at {}", project_dir.display());
    Ok(())
}

fn import_runtime(archive: &Path, project_dir: &Path) -> Result<()> {
    extract::unpack_archive(archive, &project_dir.join(RUNTIME_DIR))
        .with_context(|| format!("unpack {}", archive.display()))?;

    if let Some(version) = archive_version(archive) {
        let mut manifest = Manifest::load(project_dir)?;
        manifest.runtime_version = Some(version.to_string());
        manifest.save(project_dir)?;
    } else {
        warn!("could not read a version out of {}", archive.display());
    }
    Ok(())
}

/// 从归档文件名 `webrt-<version>.zip` 取回版本号。
fn archive_version(archive: &Path) -> Option<RuntimeVersion> {
    let name = archive.file_name()?.to_str()?;
    let middle = name
        .strip_prefix(resolver::ARCHIVE_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(".zip")?;
    RuntimeVersion::parse(middle).ok()
}

fn cmd_update(version: &RuntimeVersion, channel_flag: Option<Channel>) -> Result<()> {
    let cwd = std::env::current_dir().context("current dir")?;
    let mut manifest = Manifest::load(&cwd)
        .context("not a WebRT project directory (run `update` where manifest.json lives)")?;

    let config = config::load_or_create(None).context("load config")?;
    let channel = match channel_flag {
        Some(channel) => channel,
        None => Channel::from_name(&config.default_channel)
            .context("invalid default_channel in config")?,
    };

    let resolver = ChannelResolver::new(channel, &config.release_base_url)?;

    let versions = resolver
        .fetch_versions()
        .with_context(|| format!("fetch versions for channel '{channel}'"))?;
    if versions.is_empty() {
        bail!("channel '{channel}' has no published versions");
    }
    if !versions.contains(version) {
        let latest = versions.last().map(RuntimeVersion::as_str).unwrap_or("-");
        bail!("version {version} is not published on channel '{channel}' (newest: {latest})");
    }

    let archive_name = resolver
        .download(version, &cwd)
        .with_context(|| format!("download {version} from '{channel}'"))?;

    extract::unpack_archive(&cwd.join(&archive_name), &cwd.join(RUNTIME_DIR))
        .with_context(|| format!("unpack {archive_name}"))?;

    manifest.runtime_version = Some(version.to_string());
    manifest.save(&cwd)?;

    info!(%version, %channel, "runtime updated");
    println!("Updated runtime to {version} ({channel})");
    Ok(())
}

fn cmd_build(build_type: BuildType) -> Result<()> {
    let cwd = std::env::current_dir().context("current dir")?;
    let out = build::build_package(&cwd, build_type)
        .with_context(|| format!("build {build_type} package"))?;
    println!("Built {}", out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let argv = normalized_args(args.iter().map(OsString::from));
        Cli::try_parse_from(argv)
    }

    #[test]
    fn create_accepts_three_segment_package_id() {
        let cli = parse(&["webrt-app", "create", "com.example.app"]).unwrap();
        match cli.command {
            Command::Create { package_id } => assert_eq!(package_id.as_str(), "com.example.app"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn create_rejects_two_segment_package_id() {
        assert!(parse(&["webrt-app", "create", "com.example"]).is_err());
    }

    #[test]
    fn update_rejects_three_segment_version() {
        assert!(parse(&["webrt-app", "update", "1.2.3"]).is_err());
    }

    #[test]
    fn update_accepts_valid_version_and_channel() {
        let cli = parse(&["webrt-app", "update", "14.43.343.25", "--channel", "beta"]).unwrap();
        match cli.command {
            Command::Update { version, channel } => {
                assert_eq!(version.as_str(), "14.43.343.25");
                assert_eq!(channel, Some(Channel::Beta));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn update_rejects_unknown_channel() {
        assert!(parse(&["webrt-app", "update", "1.2.3.4", "--channel", "nightly"]).is_err());
    }

    #[test]
    fn build_defaults_to_debug() {
        let cli = parse(&["webrt-app", "build"]).unwrap();
        match cli.command {
            Command::Build { build_type } => assert_eq!(build_type, BuildType::Debug),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn build_rejects_unknown_build_type() {
        assert!(parse(&["webrt-app", "build", "profile"]).is_err());
    }

    #[test]
    fn unrecognized_command_is_an_error() {
        assert!(parse(&["webrt-app", "frobnicate"]).is_err());
        assert!(parse(&["webrt-app"]).is_err());
    }

    #[test]
    fn single_dash_long_aliases_are_normalized() {
        let argv = normalized_args(["webrt-app", "-help"].map(OsString::from));
        assert_eq!(argv[1], OsString::from("--help"));

        let argv = normalized_args(["webrt-app", "-version"].map(OsString::from));
        assert_eq!(argv[1], OsString::from("--version"));

        let argv = normalized_args(["webrt-app", "-v"].map(OsString::from));
        assert_eq!(argv[1], OsString::from("--version"));
    }

    #[test]
    fn normalization_stops_at_first_non_flag_token() {
        let argv = normalized_args(["webrt-app", "create", "-v"].map(OsString::from));
        assert_eq!(argv[2], OsString::from("-v"));

        // 子命令前的全局选项不终止改写
        let argv = normalized_args(["webrt-app", "--debug", "-help"].map(OsString::from));
        assert_eq!(argv[2], OsString::from("--help"));
    }

    #[test]
    fn version_subcommand_parses() {
        let cli = parse(&["webrt-app", "version"]).unwrap();
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn archive_version_reads_filename() {
        let v = archive_version(Path::new("webrt-14.43.343.25.zip")).unwrap();
        assert_eq!(v.as_str(), "14.43.343.25");
        assert!(archive_version(Path::new("webrt-garbage.zip")).is_none());
    }
}
