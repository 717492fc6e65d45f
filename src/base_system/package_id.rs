//! 包名（package id）解析与校验。

use std::fmt;

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

static RE_PACKAGE: OnceLock<Regex> = OnceLock::new();

fn re_package() -> &'static Regex {
    // 三段及以上，点分隔，每段 [A-Za-z0-9_]+，不允许以点开头/结尾。
    RE_PACKAGE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_]+(\.[A-Za-z0-9_]+){2,}$").expect("compile RE_PACKAGE")
    })
}

/// 已验证的应用包名，形如 `com.example.app`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageId(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid package id '{0}': expected 3+ dot-separated segments of [A-Za-z0-9_]")]
pub struct PackageIdError(String);

impl PackageId {
    pub fn parse(input: &str) -> Result<Self, PackageIdError> {
        let trimmed = input.trim();
        if re_package().is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(PackageIdError(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
