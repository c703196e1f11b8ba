//! 模拟交互 - 业务能力层
//!
//! 外部站点的控件是第三方组件库渲染的，单次合成点击不保证被接收，
//! 悬停菜单也未必响应合成的 hover。这里把"点一下"拆成按顺序尝试的
//! 策略列表，并用统一的成功判据（目标菜单是否消失）推断是否生效。

use std::time::Duration;

use anyhow::Result;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{StepError, StepResult};
use crate::infrastructure::JsExecutor;

/// 点击策略，按顺序逐个尝试
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickStrategy {
    /// 直接调用原生 click()
    Direct,
    /// 完整的 mousedown → mouseup → click 合成序列
    PointerSequence,
    /// 朝元素屏幕坐标处的事件派发（elementFromPoint）
    CoordinateDispatch,
}

impl ClickStrategy {
    /// 全部策略的固定尝试顺序
    pub fn ordered() -> [ClickStrategy; 3] {
        [
            ClickStrategy::Direct,
            ClickStrategy::PointerSequence,
            ClickStrategy::CoordinateDispatch,
        ]
    }

    /// 生成该策略对应的页面脚本；返回值表示目标元素是否仍存在
    fn js(self, selector: &str) -> Result<String> {
        let sel = serde_json::to_string(selector)?;
        let code = match self {
            ClickStrategy::Direct => format!(
                r#"
                (() => {{
                    const el = document.querySelector({sel});
                    if (!el) return false;
                    el.click();
                    return true;
                }})()
                "#
            ),
            ClickStrategy::PointerSequence => format!(
                r#"
                (async () => {{
                    const el = document.querySelector({sel});
                    if (!el) return false;
                    const rect = el.getBoundingClientRect();
                    const cx = rect.left + rect.width / 2;
                    const cy = rect.top + rect.height / 2;
                    const fire = (type, buttons) => el.dispatchEvent(new MouseEvent(type, {{
                        bubbles: true, cancelable: true, view: window,
                        button: 0, buttons, clientX: cx, clientY: cy
                    }}));
                    fire('mousedown', 1);
                    await new Promise(r => setTimeout(r, 100));
                    fire('mouseup', 0);
                    await new Promise(r => setTimeout(r, 50));
                    fire('click', 0);
                    return true;
                }})()
                "#
            ),
            ClickStrategy::CoordinateDispatch => format!(
                r#"
                (async () => {{
                    const el = document.querySelector({sel});
                    if (!el) return false;
                    const rect = el.getBoundingClientRect();
                    const cx = rect.left + 10;
                    const cy = rect.top + 10;
                    const target = document.elementFromPoint(cx, cy) || el;
                    for (const type of ['mousedown', 'mouseup', 'click']) {{
                        target.dispatchEvent(new MouseEvent(type, {{
                            bubbles: true, cancelable: true, view: window,
                            button: 0, clientX: cx, clientY: cy
                        }}));
                        await new Promise(r => setTimeout(r, 50));
                    }}
                    return true;
                }})()
                "#
            ),
        };
        Ok(code)
    }
}

/// 策略尝试的最终结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// 某个策略之后成功判据成立
    Confirmed(ClickStrategy),
    /// 所有策略用尽仍无法确认是否生效
    Unconfirmed,
}

/// 模拟交互能力
pub struct Interaction {
    /// 每个策略之后留给页面反应的时间
    settle: Duration,
}

impl Interaction {
    pub fn new() -> Self {
        Self {
            settle: Duration::from_millis(300),
        }
    }

    /// 对元素触发一轮悬停模拟（mouse / pointer / focus / mousemove 全套）
    ///
    /// 返回元素当前是否存在
    pub async fn trigger_hover(&self, executor: &JsExecutor, selector: &str) -> StepResult<bool> {
        let sel = serde_json::to_string(selector).map_err(|e| StepError::page(e.into()))?;
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({sel});
                if (!el) return false;
                const mouse = (type) => el.dispatchEvent(new MouseEvent(type, {{
                    bubbles: true, cancelable: true, view: window
                }}));
                const pointer = (type) => el.dispatchEvent(new PointerEvent(type, {{
                    bubbles: true, cancelable: true, view: window, pointerType: 'mouse'
                }}));
                mouse('mouseenter');
                mouse('mouseover');
                pointer('pointerenter');
                pointer('pointerover');
                el.focus();
                const rect = el.getBoundingClientRect();
                el.dispatchEvent(new MouseEvent('mousemove', {{
                    bubbles: true, cancelable: true, view: window,
                    clientX: rect.left + rect.width / 2,
                    clientY: rect.top + rect.height / 2
                }}));
                return true;
            }})()
            "#
        );
        executor.eval_as(js_code).await.map_err(StepError::page)
    }

    /// 按策略顺序点击目标，直到成功判据（gone_marker 消失）成立
    ///
    /// 目标在尝试前就不存在视为已生效（菜单已自行关闭）。所有策略
    /// 用尽仍确认不了时返回 [`ClickOutcome::Unconfirmed`]，由调用方
    /// 决定是否按软成功处理——页面自身的后续跳转才是最终裁决。
    pub async fn click_until_gone(
        &self,
        executor: &JsExecutor,
        target: &str,
        gone_marker: &str,
    ) -> StepResult<ClickOutcome> {
        for strategy in ClickStrategy::ordered() {
            let js_code = strategy.js(target).map_err(StepError::page)?;
            let found: bool = executor.eval_as(js_code).await.map_err(StepError::page)?;
            if !found {
                debug!("目标在 {:?} 尝试前已消失，视为已生效", strategy);
                return Ok(ClickOutcome::Confirmed(strategy));
            }

            sleep(self.settle).await;

            let still_there = executor.exists(gone_marker).await.map_err(StepError::page)?;
            if !still_there {
                debug!("点击策略 {:?} 生效", strategy);
                return Ok(ClickOutcome::Confirmed(strategy));
            }
            debug!("点击策略 {:?} 未能确认生效，尝试下一个", strategy);
        }

        Ok(ClickOutcome::Unconfirmed)
    }
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategies_are_tried_in_documented_order() {
        assert_eq!(
            ClickStrategy::ordered(),
            [
                ClickStrategy::Direct,
                ClickStrategy::PointerSequence,
                ClickStrategy::CoordinateDispatch,
            ]
        );
    }

    #[test]
    fn direct_strategy_uses_native_click() {
        let js = ClickStrategy::Direct.js(".option").unwrap();
        assert!(js.contains("el.click()"));
        assert!(js.contains("\".option\""));
    }

    #[test]
    fn pointer_sequence_fires_full_event_chain() {
        let js = ClickStrategy::PointerSequence.js(".option").unwrap();
        assert!(js.contains("'mousedown'"));
        assert!(js.contains("'mouseup'"));
        assert!(js.contains("'click'"));
        assert!(js.contains("clientX"));
    }

    #[test]
    fn coordinate_dispatch_targets_element_from_point() {
        let js = ClickStrategy::CoordinateDispatch.js(".option").unwrap();
        assert!(js.contains("elementFromPoint"));
    }

    #[test]
    fn selector_is_json_escaped() {
        // 选择器里带引号不应破坏脚本结构
        let js = ClickStrategy::Direct.js(r#"[data-testid="doc-type-NORMAL_PDF"]"#).unwrap();
        assert!(js.contains(r#""[data-testid=\"doc-type-NORMAL_PDF\"]""#));
    }
}
