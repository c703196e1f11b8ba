//! 物流方式发现 - 业务能力层
//!
//! 只负责"读物流方式筛选器"，每次调用都重新读取页面，不做缓存

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::{StepError, StepResult};
use crate::infrastructure::JsExecutor;
use crate::models::{CarrierMethod, RawCarrierEntry};

/// 物流方式发现服务
pub struct CarrierDiscovery;

impl CarrierDiscovery {
    pub fn new() -> Self {
        Self
    }

    /// 页面是否已就绪可供自动化（等价于对内容脚本的 ping）
    pub async fn probe_ready(&self, executor: &JsExecutor) -> StepResult<bool> {
        let state: String = executor
            .eval_as("document.readyState")
            .await
            .map_err(StepError::page)?;
        Ok(is_ready_state(&state))
    }

    /// 读取页面上的全部物流方式（含待发货数为 0 的）
    pub async fn list_carriers(&self, executor: &JsExecutor) -> StepResult<Vec<CarrierMethod>> {
        let js_code = r#"
            (() => {
                const filter = document.querySelector('.shipping-channel-filter');
                if (!filter) return null;
                const out = [];
                for (const label of filter.querySelectorAll('label.eds-radio-button')) {
                    const input = label.querySelector('input.eds-radio-button__input');
                    if (!input) continue;
                    const nameSpan = label.querySelector('span[label]');
                    const metaSpan = label.querySelector('span.meta');
                    out.push({
                        name: nameSpan ? nameSpan.textContent.trim() : '',
                        meta: metaSpan ? metaSpan.textContent : '',
                        value: input.value,
                    });
                }
                return out;
            })()
        "#;

        let raw = executor.eval(js_code).await.map_err(StepError::page)?;
        if raw.is_null() {
            return Err(StepError::Discovery("未找到物流方式筛选器".to_string()));
        }

        let methods = parse_carrier_entries(raw)?;
        debug!("发现 {} 个物流方式", methods.len());
        Ok(methods)
    }
}

impl Default for CarrierDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

/// 可供自动化的文档状态：DOM 可查询即可，不要求资源全部加载完
fn is_ready_state(state: &str) -> bool {
    state == "complete" || state == "interactive"
}

/// 把页面脚本返回的原始数组解析为物流方式列表
///
/// 缺少名称或定位值的条目直接丢弃
fn parse_carrier_entries(raw: JsonValue) -> StepResult<Vec<CarrierMethod>> {
    let entries: Vec<RawCarrierEntry> =
        serde_json::from_value(raw).map_err(|e| StepError::page(e.into()))?;

    Ok(entries
        .into_iter()
        .filter(|entry| !entry.name.is_empty() && !entry.value.is_empty())
        .map(CarrierMethod::from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_entries_into_carrier_methods() {
        let raw = json!([
            { "name": "Carrier A", "meta": "(5)", "value": "100" },
            { "name": "Carrier B", "meta": "(0)", "value": "200" },
        ]);
        let methods = parse_carrier_entries(raw).unwrap();
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].name, "Carrier A");
        assert_eq!(methods[0].pending_count, 5);
        assert!(!methods[1].is_actionable());
    }

    #[test]
    fn drops_entries_without_name_or_value() {
        let raw = json!([
            { "name": "", "meta": "(3)", "value": "100" },
            { "name": "Carrier B", "meta": "(3)", "value": "" },
            { "name": "Carrier C", "meta": "(3)", "value": "300" },
        ]);
        let methods = parse_carrier_entries(raw).unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name, "Carrier C");
    }

    #[test]
    fn malformed_payload_is_a_page_error() {
        let raw = json!({ "not": "an array" });
        assert!(parse_carrier_entries(raw).is_err());
    }

    #[test]
    fn interactive_and_complete_count_as_ready() {
        assert!(is_ready_state("complete"));
        assert!(is_ready_state("interactive"));
    }

    #[test]
    fn loading_document_is_not_ready() {
        assert!(!is_ready_state("loading"));
        assert!(!is_ready_state(""));
    }
}
