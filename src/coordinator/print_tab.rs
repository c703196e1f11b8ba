//! 打印标签页驱动
//!
//! 打印页加载后自动点击打印按钮。按钮未就绪的形态很多（disabled、
//! loading 样式、内部转圈图标），统一并入就绪探测。批量模式下打印
//! 触发后标签页短暂延迟后自行关闭，让协调器据此推进队列。

use std::time::Duration;

use chromiumoxide::Page;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{StepError, StepResult};
use crate::infrastructure::JsExecutor;
use crate::services::readiness::{parse_control_state, poll_until_ready, PollOutcome, Probe};

/// 打印标签页驱动器
#[derive(Debug, Clone)]
pub struct PrintTabDriver {
    /// 页面开始加载后的初始等待
    initial_delay: Duration,
    max_attempts: usize,
    interval: Duration,
    /// 触发打印到关闭标签页之间的延迟
    close_delay: Duration,
}

impl PrintTabDriver {
    pub fn new(config: &Config) -> Self {
        Self {
            initial_delay: Duration::from_millis(2_000),
            max_attempts: config.print_max_attempts,
            interval: Duration::from_millis(config.print_interval_ms),
            close_delay: Duration::from_millis(config.print_close_delay_ms),
        }
    }

    /// 一次打印驱动的最坏耗时（初始等待 + 全部探测间隔 + 关闭延迟）
    pub fn worst_case(&self) -> Duration {
        self.initial_delay + self.interval * self.max_attempts as u32 + self.close_delay
    }

    /// 驱动打印标签页；返回是否成功触发了打印
    ///
    /// `close_after` 仅在批量队列中为 true。按钮在预算内始终未就绪时
    /// 不算硬失败：标签页留给用户手动打印，队列靠手动关闭继续。
    pub async fn auto_print(&self, page: &Page, close_after: bool) -> StepResult<bool> {
        let executor = JsExecutor::new(page.clone());

        sleep(self.initial_delay).await;

        let outcome = poll_until_ready(
            || self.probe_print_button(&executor),
            self.max_attempts,
            self.interval,
        )
        .await?;

        let triggered = match outcome {
            PollOutcome::Ready { .. } => {
                self.click_print_button(&executor).await?;
                info!("🖨️ 已触发打印");
                true
            }
            PollOutcome::TimedOut { attempts, blocker } => {
                warn!(
                    "⚠️ 打印按钮在 {} 次探测后仍未就绪（{}），请手动打印",
                    attempts, blocker
                );
                false
            }
        };

        if triggered && close_after {
            // CDP 拿不到打印对话框的完成事件，只能用固定延迟近似；
            // 打印对话框偏慢的环境调大 print_close_delay_ms
            sleep(self.close_delay).await;
            // 标签页由页面脚本自行关闭；关闭瞬间的执行错误可以忽略
            let _ = executor.eval("window.close()").await;
        }

        Ok(triggered)
    }

    async fn probe_print_button(&self, executor: &JsExecutor) -> StepResult<Probe<()>> {
        let js_code = r#"
            (() => {
                const btn = document.querySelector('[data-testid="print-button"]');
                if (!btn) return 'missing';
                if (btn.disabled
                    || btn.classList.contains('disabled')
                    || btn.classList.contains('loading')
                    || btn.classList.contains('shopee-react-button--loading')) return 'disabled';
                if (btn.querySelector('.loading, .spinner, [class*="loading"]')) return 'loading';
                return 'ready';
            })()
        "#;
        let raw: String = executor.eval_as(js_code).await.map_err(StepError::page)?;
        Ok(parse_control_state(&raw))
    }

    async fn click_print_button(&self, executor: &JsExecutor) -> StepResult<()> {
        let js_code = r#"
            (() => {
                const btn = document.querySelector('[data-testid="print-button"]');
                if (!btn) return false;
                btn.click();
                return true;
            })()
        "#;
        let _: bool = executor.eval_as(js_code).await.map_err(StepError::page)?;
        Ok(())
    }
}
