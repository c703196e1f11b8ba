//! 物流方式数据模型
//!
//! 物流方式列表在每次发现时重新读取，单次调用内不可变，不做持久化
//! （批量队列会固化一份启动时的快照，见 [`super::queue`]）。

use regex::Regex;
use serde::{Deserialize, Serialize};

/// 物流方式（从页面筛选器读取）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierMethod {
    /// 显示名称
    pub name: String,
    /// 待发货订单数
    pub pending_count: u32,
    /// 选择控件的定位值（对页面而言的 radio value）
    pub selector: String,
}

impl CarrierMethod {
    /// 只有存在待发货订单的物流方式才可操作
    pub fn is_actionable(&self) -> bool {
        self.pending_count > 0
    }
}

/// 页面脚本返回的原始筛选项
#[derive(Debug, Clone, Deserialize)]
pub struct RawCarrierEntry {
    pub name: String,
    pub meta: String,
    pub value: String,
}

impl From<RawCarrierEntry> for CarrierMethod {
    fn from(raw: RawCarrierEntry) -> Self {
        CarrierMethod {
            pending_count: parse_pending_count(&raw.meta),
            name: raw.name,
            selector: raw.value,
        }
    }
}

/// 从筛选器 meta 文本（形如 "(12)"）解析待发货数量
///
/// 解析不到时按 0 处理（该物流方式不可操作）
pub fn parse_pending_count(meta: &str) -> u32 {
    let Ok(re) = Regex::new(r"\((\d+)\)") else {
        return 0;
    };
    re.captures(meta)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// 过滤出可操作的物流方式（保持页面顺序）
pub fn actionable_only(methods: Vec<CarrierMethod>) -> Vec<CarrierMethod> {
    methods.into_iter().filter(CarrierMethod::is_actionable).collect()
}
