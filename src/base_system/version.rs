//! 运行时版本号解析与规范化（四段数字，如 `14.43.343.25`）。

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// 一个已验证的四段式运行时版本号。
///
/// 仅校验“恰好四段、全为数字”的形状，不解释各段含义；
/// 排序语义由调用方决定（目录列表顺序或文件名字符串顺序）。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuntimeVersion(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid version '{0}': expected exactly 4 dot-separated numeric segments")]
pub struct VersionError(String);

impl RuntimeVersion {
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let trimmed = input.trim();
        let segments: Vec<&str> = trimmed.split('.').collect();
        let well_formed = segments.len() == 4
            && segments
                .iter()
                .all(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()));
        if well_formed {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(VersionError(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for RuntimeVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
