//! 业务能力层（Services）
//!
//! 描述"我能对发货页面做什么"，每个服务只处理一个页面动作：
//! - [`readiness`] - 就绪轮询原语（所有等待共用）
//! - [`interaction`] - 悬停与多策略点击
//! - [`CarrierDiscovery`] - 读物流方式筛选器
//! - [`OrderSelection`] - 选物流方式并勾选全部订单
//! - [`PickupConfirmation`] - 确认揽收
//! - [`LabelGeneration`] - 生成面单
//! - [`PopupCollapse`] - 收起残留弹层
//!
//! 服务不认识队列，不关心流程顺序，任何页面故障都在这里转换为
//! [`crate::error::StepError`]，不向上抛异常。

pub mod carrier_discovery;
pub mod interaction;
pub mod label_generation;
pub mod order_selection;
pub mod pickup;
pub mod popup;
pub mod readiness;

pub use carrier_discovery::CarrierDiscovery;
pub use interaction::{ClickOutcome, ClickStrategy, Interaction};
pub use label_generation::LabelGeneration;
pub use order_selection::OrderSelection;
pub use pickup::PickupConfirmation;
pub use popup::PopupCollapse;
