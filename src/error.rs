//! 错误类型定义
//!
//! 页面自动化的所有失败都在发生处转换为结构化的 [`StepError`]，
//! 不允许未处理的异常跨层传播；编排层只负责把原因原样展示给用户。

use thiserror::Error;

use crate::services::readiness::Blocker;

/// 单个页面自动化步骤的失败原因
#[derive(Debug, Error)]
pub enum StepError {
    /// 页面结构缺失（如找不到物流方式筛选器）
    #[error("页面结构缺失: {0}，请刷新页面后重试")]
    Discovery(String),

    /// 控件在轮询预算内始终未就绪
    #[error("等待「{control}」超时: {blocker}")]
    ReadinessTimeout { control: String, blocker: Blocker },

    /// 页面脚本执行失败（CDP 层故障等）
    #[error("页面脚本执行失败: {0}")]
    Page(anyhow::Error),
}

impl StepError {
    /// 包装一次页面脚本执行故障
    pub fn page(source: anyhow::Error) -> Self {
        StepError::Page(source)
    }

    /// 构造一次就绪超时错误
    pub fn timeout(control: impl Into<String>, blocker: Blocker) -> Self {
        StepError::ReadinessTimeout {
            control: control.into(),
            blocker,
        }
    }
}

/// 页面自动化步骤的结果类型
pub type StepResult<T> = std::result::Result<T, StepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_control_and_blocker() {
        let err = StepError::timeout("全选复选框", Blocker::Disabled);
        let msg = err.to_string();
        assert!(msg.contains("全选复选框"), "消息应包含控件名: {}", msg);
        assert!(msg.contains("禁用"), "消息应说明禁用状态: {}", msg);
    }

    #[test]
    fn discovery_message_suggests_refresh() {
        let err = StepError::Discovery("未找到物流方式筛选器".to_string());
        assert!(err.to_string().contains("刷新页面"));
    }
}
