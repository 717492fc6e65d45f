//! 单次下载：远端 URL → 本地文件（流式写入 + 进度回调）。

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use thiserror::Error;
use tracing::debug;

const CHUNK_SIZE: usize = 8192;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("http client init failed: {0}")]
    ClientInit(#[source] reqwest::Error),
    #[error("request failed for {url}: {source}")]
    Request { url: String, source: reqwest::Error },
    #[error("read failed for {url}: {source}")]
    Read { url: String, source: io::Error },
    #[error("write failed at {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// 阻塞式传输客户端。
///
/// 一次调用移动一个资源：无重试、无断点续传、无校验，
/// 目标路径存在时无条件覆盖；失败时目标文件可能残留半截内容。
pub struct TransferClient {
    client: Client,
}

impl TransferClient {
    pub fn new() -> Result<Self, TransferError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(TransferError::ClientInit)?;
        Ok(Self { client })
    }

    /// 下载 `url` 到 `dest`。
    ///
    /// `on_progress` 被调用零次或多次，入参为非递减的完成比例 [0,1]
    /// （响应缺少 Content-Length 时不上报）。结果恰好产生一次：
    /// `Ok(())` 或带可读信息的错误。
    pub fn download(
        &self,
        url: &str,
        dest: &Path,
        mut on_progress: impl FnMut(f64),
    ) -> Result<(), TransferError> {
        debug!(target: "download", url, dest = %dest.display(), "transfer start");

        let mut resp = self
            .client
            .get(url)
            .header(USER_AGENT, "webrt-app-tools/0.4")
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|source| TransferError::Request {
                url: url.to_string(),
                source,
            })?;

        let total = resp.content_length().unwrap_or(0);

        let mut file = File::create(dest).map_err(|source| TransferError::Write {
            path: dest.to_path_buf(),
            source,
        })?;

        let mut received: u64 = 0;
        let mut buf = [0u8; CHUNK_SIZE];
        loop {
            let n = resp.read(&mut buf).map_err(|source| TransferError::Read {
                url: url.to_string(),
                source,
            })?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])
                .map_err(|source| TransferError::Write {
                    path: dest.to_path_buf(),
                    source,
                })?;
            received += n as u64;
            if total > 0 {
                on_progress((received as f64 / total as f64).min(1.0));
            }
        }

        debug!(target: "download", received, "transfer complete");
        Ok(())
    }
}
