//! CLI 进度条（按完成比例驱动）。

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::info;

/// 进度条内部刻度；上游只上报 [0,1] 的比例。
const SCALE: u64 = 1000;

/// 单个长时操作的文本进度显示。
///
/// `update` 可被调用零次或多次，比例非递减；`done` 恰好渲染一次
/// 结束状态并释放进度条，重复调用是空操作。纯展示，不影响传输结果。
pub struct ProgressIndicator {
    bar: ProgressBar,
    finished: bool,
}

impl ProgressIndicator {
    pub fn new(label: &str) -> Self {
        let bar = ProgressBar::with_draw_target(Some(SCALE), ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::with_template("{msg} [{wide_bar}] {percent}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        bar.set_message(label.to_string());
        Self {
            bar,
            finished: false,
        }
    }

    /// 渲染当前完成比例；超出 [0,1] 的值会被截断，位置不回退。
    pub fn update(&self, fraction: f64) {
        let clamped = fraction.clamp(0.0, 1.0);
        let position = (clamped * SCALE as f64) as u64;
        if position > self.bar.position() {
            self.bar.set_position(position);
        }
    }

    pub fn done(&mut self, message: &str) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.bar.finish_and_clear();
        info!(target: "download", "{message}");
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        if !self.finished {
            self.bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_never_moves_backwards() {
        let progress = ProgressIndicator::new("test");
        progress.update(0.8);
        progress.update(0.3);
        assert_eq!(progress.bar.position(), 800);
    }

    #[test]
    fn update_clamps_out_of_range_fractions() {
        let progress = ProgressIndicator::new("test");
        progress.update(2.5);
        assert_eq!(progress.bar.position(), SCALE);
    }

    #[test]
    fn done_is_idempotent() {
        let mut progress = ProgressIndicator::new("test");
        progress.done("first");
        progress.done("second");
        assert!(progress.finished);
    }
}
