//! 版本发现与运行时归档下载。

pub mod listing;
pub mod progress;
pub mod resolver;
pub mod transfer;
