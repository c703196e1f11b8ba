//! # Mass Ship Autoprint
//!
//! 卖家后台批量发货自动打印的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `QueueStore` - 批量队列的持久化记录
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能对发货页面做什么"，每个服务只处理一个页面动作
//! - `readiness` - 就绪轮询原语（所有等待共用）
//! - `CarrierDiscovery` / `OrderSelection` / `PickupConfirmation` /
//!   `LabelGeneration` / `PopupCollapse`
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个物流方式"的完整处理流程
//! - `CarrierCtx` - 上下文封装（物流方式 + 队列序号）
//! - `ShipmentFlow` - 流程编排（勾选 → 揽收 → 面单）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量队列处理器，管理资源和进度
//! - `coordinator/` - 打印标签页监视器，关闭后推进队列
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{connect_to_mass_ship_page, is_mass_ship_page};
pub use config::Config;
pub use coordinator::{PrintTabDriver, QueueSignal, TabWatcher};
pub use error::{StepError, StepResult};
pub use infrastructure::{FileQueueStore, JsExecutor, QueueStore};
pub use models::{BatchQueue, CarrierMethod};
pub use orchestrator::App;
pub use workflow::{CarrierCtx, FlowSummary, ShipmentFlow};
