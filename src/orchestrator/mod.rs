//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 驱动整个发货自动化：发现物流方式、单个处理、批量排队。
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (批量队列 / 单个物流方式)
//!     ↓
//! workflow::ShipmentFlow (一个物流方式的三步流程)
//!     ↓
//! services (能力层：发现 / 勾选 / 揽收 / 面单 / 弹层)
//!     ↓
//! infrastructure (基础设施：JsExecutor / QueueStore)
//! ```
//!
//! 打印标签页的生命周期由 coordinator 监视，编排器只消费它发来的
//! 继续信号；两者之间唯一的持久交接点是队列记录。

pub mod batch_processor;

pub use batch_processor::App;
