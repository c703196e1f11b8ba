//! 队列协调层（Coordinator）
//!
//! 生成面单后页面会弹出独立的打印标签页，编排器不直接等待它：
//! 打印标签页的驱动、关闭检测和队列推进都由这里负责，再通过
//! 一次性的继续信号把控制权交还编排器。信号是尽力而为的至多
//! 一次投递，送不到时队列停留在可恢复的停滞状态。

pub mod print_tab;
pub mod tab_watcher;

pub use print_tab::PrintTabDriver;
pub use tab_watcher::{signal_wait_ceiling, QueueSignal, TabWatcher};
