//! 收起残留弹层 - 业务能力层
//!
//! 批量模式下上一个物流方式的生成面单面板可能还开着。找不到收起
//! 按钮是常态（面板本来就没开），按无事发生的成功处理，不算失败。

use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::error::{StepError, StepResult};
use crate::infrastructure::JsExecutor;

/// 弹层收起服务
pub struct PopupCollapse {
    settle: Duration,
}

impl PopupCollapse {
    pub fn new() -> Self {
        Self {
            settle: Duration::from_millis(500),
        }
    }

    /// 收起残留弹层；返回是否真的点了收起按钮
    pub async fn collapse(&self, executor: &JsExecutor) -> StepResult<bool> {
        let js_code = r#"
            (() => {
                const btn = document.querySelector('.collapse');
                if (!btn) return false;
                btn.click();
                return true;
            })()
        "#;
        let clicked: bool = executor.eval_as(js_code).await.map_err(StepError::page)?;

        if clicked {
            debug!("已点击收起按钮，等待弹层关闭");
            sleep(self.settle).await;
        } else {
            debug!("没有发现需要收起的弹层");
        }
        Ok(clicked)
    }
}

impl Default for PopupCollapse {
    fn default() -> Self {
        Self::new()
    }
}
