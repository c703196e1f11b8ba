//! 基础设施层（Infrastructure）
//!
//! 持有稀缺资源，只暴露能力：
//! - [`JsExecutor`] - 唯一的 page owner，提供 eval() 能力
//! - [`QueueStore`] - 批量队列的持久化记录（跨执行上下文的唯一交接点）

pub mod js_executor;
pub mod queue_store;

pub use js_executor::JsExecutor;
pub use queue_store::{FileQueueStore, MemoryQueueStore, QueueStore};
