//! 目录列表解析：从 HTML 目录索引提取可用版本号。

use regex::Regex;
use std::sync::OnceLock;

use crate::base_system::version::RuntimeVersion;

static RE_HREF: OnceLock<Regex> = OnceLock::new();

fn re_href() -> &'static Regex {
    RE_HREF.get_or_init(|| Regex::new(r#"href\s*=\s*"([^"?]+?)/?""#).expect("compile RE_HREF"))
}

/// 从目录列表文本中按出现顺序提取版本号。
///
/// 列表生成器按旧→新输出条目，这里不做独立排序。HTML 文档取
/// `href` 值作为候选；无任何 `href` 时退化为按空白切分的裸 token
/// （测试夹具和某些镜像会输出纯文本列表）。不满足四段数字形状的
/// 条目被静默丢弃；空文档或无有效条目时返回空列表，不视为错误。
pub fn parse_versions(document: &str) -> Vec<RuntimeVersion> {
    let mut candidates: Vec<&str> = re_href()
        .captures_iter(document)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    if candidates.is_empty() {
        candidates = document.split_whitespace().collect();
    }

    candidates
        .into_iter()
        .filter_map(|entry| RuntimeVersion::parse(entry).ok())
        .collect()
}
