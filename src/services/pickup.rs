//! 确认揽收 - 业务能力层

use std::time::Duration;

use tracing::debug;

use crate::config::Config;
use crate::error::{StepError, StepResult};
use crate::infrastructure::JsExecutor;
use crate::services::readiness::{parse_control_state, poll_until_ready, Blocker, Probe};

/// 揽收确认服务
pub struct PickupConfirmation {
    max_attempts: usize,
    interval: Duration,
}

impl PickupConfirmation {
    pub fn new(config: &Config) -> Self {
        Self {
            max_attempts: config.pickup_max_attempts,
            interval: Duration::from_millis(config.pickup_interval_ms),
        }
    }

    /// 等确认揽收按钮可用后点击
    pub async fn confirm(&self, executor: &JsExecutor) -> StepResult<()> {
        poll_until_ready(
            || self.probe_button(executor),
            self.max_attempts,
            self.interval,
        )
        .await?
        .into_ready("确认揽收按钮")?;

        self.click_button(executor).await
    }

    async fn probe_button(&self, executor: &JsExecutor) -> StepResult<Probe<()>> {
        let js_code = r#"
            (() => {
                const btn = document.querySelector('[data-testid="arrange-pickup-confirm-button"]');
                if (!btn) return 'missing';
                if (btn.disabled || btn.classList.contains('eds-button--disabled')) return 'disabled';
                return 'ready';
            })()
        "#;
        let raw: String = executor.eval_as(js_code).await.map_err(StepError::page)?;
        Ok(parse_control_state(&raw))
    }

    async fn click_button(&self, executor: &JsExecutor) -> StepResult<()> {
        let js_code = r#"
            (() => {
                const btn = document.querySelector('[data-testid="arrange-pickup-confirm-button"]');
                if (!btn) return false;
                btn.click();
                return true;
            })()
        "#;
        let clicked: bool = executor.eval_as(js_code).await.map_err(StepError::page)?;
        if clicked {
            debug!("已点击确认揽收按钮");
            Ok(())
        } else {
            // 轮询通过后按钮又消失了，按缺失超时上报
            Err(StepError::timeout("确认揽收按钮", Blocker::Missing))
        }
    }
}
