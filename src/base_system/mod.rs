//! 基础设施：配置 / 日志 / 标识符校验。

pub mod config;
pub mod logging;
pub mod package_id;
pub mod version;
