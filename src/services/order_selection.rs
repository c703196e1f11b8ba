//! 选择物流方式并勾选全部订单 - 业务能力层
//!
//! 勾选全选框之前必须等表格重载完成。复选框"禁用"有两种含义：
//! 表格还在加载（加载指示可见），或筛选后确实没有订单——两者必须
//! 通过加载指示区分开，不能混为一谈。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{StepError, StepResult};
use crate::infrastructure::JsExecutor;
use crate::services::readiness::{poll_until_ready, Blocker, Probe};

/// 订单勾选服务
pub struct OrderSelection {
    max_attempts: usize,
    interval: Duration,
    /// 点击筛选项后留给表格触发重载的时间
    filter_settle: Duration,
    /// 勾选后留给选中面板刷新的时间
    count_settle: Duration,
}

impl OrderSelection {
    pub fn new(config: &Config) -> Self {
        Self {
            max_attempts: config.checkbox_max_attempts,
            interval: Duration::from_millis(config.checkbox_interval_ms),
            filter_settle: Duration::from_millis(1_000),
            count_settle: Duration::from_millis(500),
        }
    }

    /// 选择物流方式并勾选全部订单，返回勾选到的订单数
    pub async fn select_carrier_and_orders(
        &self,
        executor: &JsExecutor,
        selector: &str,
    ) -> StepResult<u32> {
        self.click_carrier_filter(executor, selector).await?;

        // 等筛选生效、表格开始重载
        sleep(self.filter_settle).await;

        let already_checked = poll_until_ready(
            || self.probe_checkbox(executor),
            self.max_attempts,
            self.interval,
        )
        .await?
        .into_ready("全选复选框")?;

        if should_click(already_checked) {
            self.click_checkbox(executor).await?;
        } else {
            info!("订单已全部勾选，跳过点击");
        }

        sleep(self.count_settle).await;
        self.read_selected_count(executor).await
    }

    /// 点击物流方式筛选项
    async fn click_carrier_filter(&self, executor: &JsExecutor, selector: &str) -> StepResult<()> {
        let value = serde_json::to_string(selector).map_err(|e| StepError::page(e.into()))?;
        let js_code = format!(
            r#"
            (() => {{
                const filter = document.querySelector('.shipping-channel-filter');
                if (!filter) return 'no-filter';
                const input = filter.querySelector(
                    'input.eds-radio-button__input[value=' + JSON.stringify({value}) + ']'
                );
                if (!input) return 'no-method';
                const label = input.closest('label.eds-radio-button');
                (label || input).click();
                return 'ok';
            }})()
            "#
        );

        let outcome: String = executor.eval_as(js_code).await.map_err(StepError::page)?;
        match outcome.as_str() {
            "ok" => Ok(()),
            "no-filter" => Err(StepError::Discovery("未找到物流方式筛选器".to_string())),
            _ => Err(StepError::Discovery("未找到该物流方式的筛选选项".to_string())),
        }
    }

    /// 探测全选复选框状态；就绪时携带"是否已勾选"
    async fn probe_checkbox(&self, executor: &JsExecutor) -> StepResult<Probe<bool>> {
        let js_code = r#"
            (() => {
                const loading = document.querySelector('.table-loading-container');
                if (loading && loading.style.display !== 'none') return 'loading';
                const box = document.querySelector('[data-testid="mass-ship-checkbox-all"]');
                if (!box) return 'missing';
                if (box.classList.contains('disabled')) return 'disabled';
                const input = box.querySelector('input.eds-checkbox__input');
                if (!input) return 'missing';
                return input.checked ? 'ready-checked' : 'ready-unchecked';
            })()
        "#;

        let raw: String = executor.eval_as(js_code).await.map_err(StepError::page)?;
        Ok(parse_checkbox_state(&raw))
    }

    /// 点击全选复选框
    async fn click_checkbox(&self, executor: &JsExecutor) -> StepResult<()> {
        let js_code = r#"
            (() => {
                const box = document.querySelector('[data-testid="mass-ship-checkbox-all"]');
                if (!box) return false;
                box.click();
                return true;
            })()
        "#;
        let clicked: bool = executor.eval_as(js_code).await.map_err(StepError::page)?;
        if clicked {
            debug!("已点击全选复选框");
            Ok(())
        } else {
            Err(StepError::timeout("全选复选框", Blocker::Missing))
        }
    }

    /// 读取勾选到的订单数
    ///
    /// 主读数来自选中面板（"已选 N 件"），缺失时退回包裹计数元素的文本
    async fn read_selected_count(&self, executor: &JsExecutor) -> StepResult<u32> {
        let js_code = r#"
            (() => {
                const panel = document.querySelector('.mass-ship-selected .subtitle span');
                if (panel) return panel.textContent;
                const parcel = document.querySelector('[data-testid="mass-ship-parcel-count"]');
                return parcel ? parcel.textContent : '';
            })()
        "#;
        let text: String = executor.eval_as(js_code).await.map_err(StepError::page)?;
        Ok(parse_selected_count(&text))
    }
}

/// 全选是否需要点击。复选框点击是开关式的：已勾选时再点一次会
/// 反向取消勾选，因此只有未勾选时才点
fn should_click(already_checked: bool) -> bool {
    !already_checked
}

/// 把复选框探测脚本的返回值映射为探测结论
fn parse_checkbox_state(raw: &str) -> Probe<bool> {
    match raw {
        "ready-checked" => Probe::Ready(true),
        "ready-unchecked" => Probe::Ready(false),
        "disabled" => Probe::NotYet(Blocker::Disabled),
        "loading" => Probe::NotYet(Blocker::Loading),
        _ => Probe::NotYet(Blocker::Missing),
    }
}

/// 从面板文本里取第一个数字作为勾选数，取不到按 0 处理
fn parse_selected_count(text: &str) -> u32 {
    let Ok(re) = regex::Regex::new(r"(\d+)") else {
        return 0;
    };
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}
