//! 批量队列数据模型
//!
//! 队列记录由编排器在批量启动时创建，编排器（推进游标、running 标志）
//! 与协调器（标签页关闭时推进、完成时清理）共同维护，任一方都可以
//! 作为终态动作清除它。不变式：`0 <= cursor <= items.len()`；
//! `running == false` 后不再自动推进。

use serde::{Deserialize, Serialize};

use super::CarrierMethod;

/// 批量队列持久化记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchQueue {
    /// 批量启动时固化的物流方式快照（仅含有待发货订单的）
    pub items: Vec<CarrierMethod>,
    /// 当前处理下标（单调不减）
    pub cursor: usize,
    /// 批量是否仍在进行
    pub running: bool,
    /// 发起批量的页面地址
    pub origin_tab: Option<String>,
    /// 最近一次生成面单弹出的打印标签页地址
    pub spawned_tab: Option<String>,
}

impl BatchQueue {
    /// 批量启动：游标归零、running 置位
    pub fn start(items: Vec<CarrierMethod>, origin_tab: Option<String>) -> Self {
        Self {
            items,
            cursor: 0,
            running: true,
            origin_tab,
            spawned_tab: None,
        }
    }

    /// 当前待处理的物流方式
    pub fn current(&self) -> Option<&CarrierMethod> {
        self.items.get(self.cursor)
    }

    /// 游标是否已走完全部条目
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.items.len()
    }
}

/// 打印标签页关闭后队列应当如何走
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueTransition {
    /// 继续处理下一个物流方式
    Continue { next: usize },
    /// 队列全部完成
    Complete,
    /// 与当前队列无关，忽略
    Ignore,
}

/// 根据打印标签页关闭事件推进队列（纯函数）
///
/// 只有 `running == true` 且关闭的标签页与记录中的 spawned_tab 一致时
/// 才推进；其余一律忽略，避免把无关的标签页关闭当作继续信号。
pub fn advance_on_tab_close(queue: Option<&BatchQueue>, closed_tab: &str) -> QueueTransition {
    let Some(queue) = queue else {
        return QueueTransition::Ignore;
    };
    if !queue.running {
        return QueueTransition::Ignore;
    }
    if queue.spawned_tab.as_deref() != Some(closed_tab) {
        return QueueTransition::Ignore;
    }

    let next = queue.cursor + 1;
    if next < queue.items.len() {
        QueueTransition::Continue { next }
    } else {
        QueueTransition::Complete
    }
}
