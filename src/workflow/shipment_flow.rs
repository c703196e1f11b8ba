//! 发货处理流程 - 流程层
//!
//! 核心职责：定义"一个物流方式"的完整处理流程
//!
//! 流程顺序：
//! 1. 选择物流方式并勾选全部订单
//! 2. 确认揽收
//! 3. 生成面单（成功意味着页面会弹出打印标签页）
//!
//! 任何一步失败立即中止，把该步的具体原因交给调用方展示；
//! 流程不持有任何资源，也不认识队列。

use tracing::info;

use crate::config::Config;
use crate::error::StepResult;
use crate::infrastructure::JsExecutor;
use crate::models::CarrierMethod;
use crate::services::{LabelGeneration, OrderSelection, PickupConfirmation};
use crate::workflow::carrier_ctx::CarrierCtx;

/// 单个物流方式的流程结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowSummary {
    /// 勾选到的订单数
    pub selected_count: u32,
}

/// 发货处理流程
pub struct ShipmentFlow {
    order_selection: OrderSelection,
    pickup: PickupConfirmation,
    label: LabelGeneration,
}

impl ShipmentFlow {
    /// 创建新的发货流程
    pub fn new(config: &Config) -> Self {
        Self {
            order_selection: OrderSelection::new(config),
            pickup: PickupConfirmation::new(config),
            label: LabelGeneration::new(config),
        }
    }

    /// 对一个物流方式执行完整的三步流程
    pub async fn run(
        &self,
        executor: &JsExecutor,
        carrier: &CarrierMethod,
        ctx: &CarrierCtx,
    ) -> StepResult<FlowSummary> {
        info!("{} 🚚 选择物流方式并勾选订单...", ctx);
        let selected_count = self
            .order_selection
            .select_carrier_and_orders(executor, &carrier.selector)
            .await?;

        info!("{} ✓ 已勾选 {} 个订单，正在确认揽收...", ctx, selected_count);
        self.pickup.confirm(executor).await?;

        info!("{} ✓ 揽收已确认，正在生成面单...", ctx);
        self.label.generate(executor).await?;

        info!("{} ✅ {}", ctx, success_message(&carrier.name, selected_count));
        Ok(FlowSummary { selected_count })
    }
}

/// 成功提示文案（状态行展示用）
pub fn success_message(carrier_name: &str, selected_count: u32) -> String {
    format!("已为 {} 的 {} 个订单生成面单", carrier_name, selected_count)
}
