//! 物流方式处理上下文
//!
//! 封装"我正在处理队列里第几个物流方式"这一信息

use std::fmt::Display;

/// 物流方式处理上下文
#[derive(Debug, Clone)]
pub struct CarrierCtx {
    /// 物流方式显示名称
    pub carrier_name: String,
    /// 队列中的序号（从 1 开始，仅用于日志显示）
    pub position: usize,
    /// 队列总数
    pub total: usize,
}

impl CarrierCtx {
    /// 创建新的处理上下文
    pub fn new(carrier_name: String, position: usize, total: usize) -> Self {
        Self {
            carrier_name,
            position,
            total,
        }
    }
}

impl Display for CarrierCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[物流 {}/{} {}]",
            self.position, self.total, self.carrier_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_position_and_carrier() {
        let ctx = CarrierCtx::new("Carrier A".to_string(), 2, 3);
        assert_eq!(ctx.to_string(), "[物流 2/3 Carrier A]");
    }
}
