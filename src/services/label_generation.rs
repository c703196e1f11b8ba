//! 生成面单 - 业务能力层
//!
//! 这是整条流程里最不可靠的一步：要先等所有订单行的状态指示变成
//! 终态"成功"（带稳定性要求），再等生成按钮可用，然后让悬停菜单
//! 展开（合成 hover 不一定被页面接收），最后点中格式选项。格式
//! 选项的点击无法从页面内部可靠确认，策略全部用尽时按软成功处理，
//! 页面自己的后续跳转才是最终裁决。

use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{StepError, StepResult};
use crate::infrastructure::JsExecutor;
use crate::services::interaction::{ClickOutcome, Interaction};
use crate::services::readiness::{
    parse_control_state, poll_until_ready, poll_until_stable, Blocker, Probe, StabilityBudget,
    StableOutcome,
};

const GENERATE_BUTTON: &str = r#"[data-testid="generate-doc-for-arranged-shipment-orders"]"#;

/// 面单生成服务
pub struct LabelGeneration {
    button_max_attempts: usize,
    button_interval: Duration,
    hover_max_attempts: usize,
    hover_interval: Duration,
    stability: StabilityBudget,
    /// 面单文档格式选项的标识（如 NORMAL_PDF）
    doc_type: String,
    interaction: Interaction,
}

impl LabelGeneration {
    pub fn new(config: &Config) -> Self {
        Self {
            button_max_attempts: config.generate_max_attempts,
            button_interval: Duration::from_millis(config.generate_interval_ms),
            hover_max_attempts: config.hover_max_attempts,
            hover_interval: Duration::from_millis(config.hover_interval_ms),
            stability: StabilityBudget {
                interval: Duration::from_millis(1_000),
                min_wait: Duration::from_millis(2_000),
                max_wait: Duration::from_millis(config.label_wait_ceiling_ms),
                required_streak: 2,
            },
            doc_type: config.doc_type.clone(),
            interaction: Interaction::new(),
        }
    }

    /// 生成面单：等状态就绪 → 等按钮可用 → 展开菜单 → 选中格式
    pub async fn generate(&self, executor: &JsExecutor) -> StepResult<()> {
        info!("⏳ 等待所有面单状态就绪...");
        match poll_until_stable(|| self.probe_statuses(executor), &self.stability).await? {
            StableOutcome::Stable => info!("✓ 所有面单状态已就绪"),
            StableOutcome::GaveUp => {
                warn!("⚠️ 等待面单状态达到时间上限，按当前状态继续");
            }
        }

        // 状态就绪后的缓冲
        sleep(Duration::from_millis(500)).await;

        poll_until_ready(
            || self.probe_generate_button(executor),
            self.button_max_attempts,
            self.button_interval,
        )
        .await?
        .into_ready("生成面单按钮")?;

        let option_selector = self.doc_option_selector();
        self.reveal_format_menu(executor, &option_selector).await?;
        self.pick_format_option(executor, &option_selector).await
    }

    fn doc_option_selector(&self) -> String {
        format!(r#"[data-testid="doc-type-{}"]"#, self.doc_type)
    }

    /// 探测所有订单行的状态指示是否都已到达终态
    async fn probe_statuses(&self, executor: &JsExecutor) -> StepResult<bool> {
        let js_code = r#"
            (() => {
                const all = document.querySelectorAll('.status-col [data-testid]');
                const ok = document.querySelectorAll('.status-col [data-testid$="-success"]');
                let total = all.length;
                let success = ok.length;
                if (total === 0) {
                    const okIcons = document.querySelectorAll('.status-col .icon.success');
                    const pending = document.querySelectorAll('.status-col .icon:not(.success)');
                    success = okIcons.length;
                    total = okIcons.length + pending.length;
                }
                return { total, success };
            })()
        "#;
        let counts: StatusCounts = executor.eval_as(js_code).await.map_err(StepError::page)?;
        debug!("面单状态: {}/{} 已就绪", counts.success, counts.total);
        Ok(counts.all_terminal())
    }

    async fn probe_generate_button(&self, executor: &JsExecutor) -> StepResult<Probe<()>> {
        let js_code = format!(
            r#"
            (() => {{
                const btn = document.querySelector('{GENERATE_BUTTON}');
                if (!btn) return 'missing';
                if (btn.disabled || btn.classList.contains('eds-button--disabled')) return 'disabled';
                return 'ready';
            }})()
            "#
        );
        let raw: String = executor.eval_as(js_code).await.map_err(StepError::page)?;
        Ok(parse_control_state(&raw))
    }

    /// 让格式菜单展开：先反复模拟悬停，悬停不奏效再退回直接点击按钮
    async fn reveal_format_menu(
        &self,
        executor: &JsExecutor,
        option_selector: &str,
    ) -> StepResult<()> {
        for attempt in 1..=self.hover_max_attempts {
            self.interaction.trigger_hover(executor, GENERATE_BUTTON).await?;
            sleep(self.hover_interval).await;

            if executor.exists(option_selector).await.map_err(StepError::page)? {
                debug!("第 {} 次悬停后菜单已展开", attempt);
                return Ok(());
            }
        }

        // 悬停失败，退回直接点击生成按钮展开菜单
        warn!("悬停未能展开格式菜单，尝试直接点击生成按钮");
        let js_code = format!(
            r#"
            (() => {{
                const btn = document.querySelector('{GENERATE_BUTTON}');
                if (!btn) return false;
                btn.click();
                return true;
            }})()
            "#
        );
        let _: bool = executor.eval_as(js_code).await.map_err(StepError::page)?;
        sleep(Duration::from_millis(500)).await;

        if executor.exists(option_selector).await.map_err(StepError::page)? {
            Ok(())
        } else {
            Err(StepError::timeout(
                format!("文档格式选项 {}", self.doc_type),
                Blocker::Missing,
            ))
        }
    }

    /// 点中格式选项；无法确认生效时按软成功处理
    async fn pick_format_option(
        &self,
        executor: &JsExecutor,
        option_selector: &str,
    ) -> StepResult<()> {
        match self
            .interaction
            .click_until_gone(executor, option_selector, option_selector)
            .await?
        {
            ClickOutcome::Confirmed(strategy) => {
                info!("✓ 格式菜单已关闭，选项点击生效（策略: {:?}）", strategy);
            }
            ClickOutcome::Unconfirmed => {
                warn!("⚠️ 无法确认格式选项点击是否生效，按成功处理，以页面后续跳转为准");
            }
        }
        Ok(())
    }
}

/// 订单行状态统计
#[derive(Debug, Clone, Copy, Deserialize)]
struct StatusCounts {
    total: u32,
    success: u32,
}

impl StatusCounts {
    /// 所有行都到达终态（没有行时不算就绪）
    fn all_terminal(self) -> bool {
        self.total > 0 && self.success == self.total
    }
}
