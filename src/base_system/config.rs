//! 配置文件读写（YAML，缺省值兜底，带注释生成）。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const FILE_NAME: &str = "webrt-app.yml";

/// 每个字段一行说明，写配置文件时生成 `# 注释`。
const FIELD_DOCS: &[(&str, &str)] = &[
    (
        "release_base_url",
        "Base URL of the runtime release channels (one listing per channel below it)",
    ),
    (
        "default_channel",
        "Release channel used by `update` when --channel is not given: stable / beta / canary",
    ),
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid yaml at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("config serialization failed: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub release_base_url: String,
    pub default_channel: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            release_base_url: "https://releases.webrt.dev/android".to_string(),
            default_channel: "stable".to_string(),
        }
    }
}

/// 加载 `<base_dir>/webrt-app.yml`；不存在则写出带注释的默认配置。
///
/// 用户文件缺失的字段由 `#[serde(default)]` 以默认值兜底，
/// 旧版本生成的配置文件升级后仍然可读。
pub fn load_or_create(base_dir: Option<&Path>) -> Result<Config, ConfigError> {
    let path = base_dir.unwrap_or(Path::new(".")).join(FILE_NAME);

    if !path.exists() {
        let config = Config::default();
        write_with_comments(&config, &path)?;
        return Ok(config);
    }

    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;

    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
}

pub fn write_with_comments(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let yaml = generate_yaml_with_comments(config)?;
    fs::write(path, yaml).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn generate_yaml_with_comments(config: &Config) -> Result<String, ConfigError> {
    let value = serde_yaml::to_value(config)?;
    let mapping = match value {
        serde_yaml::Value::Mapping(map) => map,
        _ => unreachable!("Config serializes to a mapping"),
    };

    let mut lines = Vec::new();
    for (name, description) in FIELD_DOCS {
        lines.push(format!("# {description}"));
        let key = serde_yaml::Value::String((*name).to_string());
        let val = mapping
            .get(&key)
            .cloned()
            .unwrap_or(serde_yaml::Value::Null);
        let entry = serde_yaml::to_string(&serde_yaml::Mapping::from_iter([(key, val)]))?;
        lines.push(entry.trim().to_string());
    }
    lines.push(String::new());

    Ok(lines.join("\n"))
}
