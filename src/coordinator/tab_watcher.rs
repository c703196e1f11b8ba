//! 打印标签页监视器
//!
//! 独立于编排器的生命周期监视打印标签页：出现时记录其身份并驱动
//! 打印，关闭后根据队列记录推进游标并发出继续信号。标签页的身份
//! 用地址标识（同一时间最多只有一个打印标签页）。

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chromiumoxide::{Browser, Page};
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::coordinator::print_tab::PrintTabDriver;
use crate::infrastructure::QueueStore;
use crate::models::{advance_on_tab_close, QueueTransition};

/// 等待打印标签页弹出的预算
const SPAWN_WAIT: Duration = Duration::from_secs(30);

/// 编排器等待继续信号的上限
///
/// 必须严格覆盖协调器一个打印周期的最坏耗时（等弹出 + 驱动打印 +
/// 等关闭 + 继续延迟），否则编排器先超时弃掉接收端，而协调器片刻后
/// 仍会推进队列，留下本可避免的停滞状态。
pub fn signal_wait_ceiling(config: &Config) -> Duration {
    SPAWN_WAIT
        + PrintTabDriver::new(config).worst_case()
        + Duration::from_millis(config.tab_wait_ceiling_ms)
        + Duration::from_millis(config.resume_delay_ms)
        + Duration::from_secs(5)
}

/// 协调器发往编排器的继续信号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueSignal {
    /// 从指定下标继续批量队列
    Continue { next: usize },
    /// 队列全部完成（记录已清理）
    Completed,
}

/// 打印标签页监视器
#[derive(Clone)]
pub struct TabWatcher {
    browser: Arc<Browser>,
    store: Arc<dyn QueueStore>,
    tx: mpsc::Sender<QueueSignal>,
    driver: PrintTabDriver,
    print_url_marker: String,
    poll_interval: Duration,
    /// 等待标签页关闭的整体上限
    close_wait_ceiling: Duration,
    /// 标签页关闭后到发出继续信号的延迟
    resume_delay: Duration,
}

impl TabWatcher {
    pub fn new(
        browser: Arc<Browser>,
        store: Arc<dyn QueueStore>,
        tx: mpsc::Sender<QueueSignal>,
        config: &Config,
    ) -> Self {
        Self {
            browser,
            store,
            tx,
            driver: PrintTabDriver::new(config),
            print_url_marker: config.print_url_marker.clone(),
            poll_interval: Duration::from_millis(500),
            close_wait_ceiling: Duration::from_millis(config.tab_wait_ceiling_ms),
            resume_delay: Duration::from_millis(config.resume_delay_ms),
        }
    }

    /// 当前所有标签页的地址快照（用于识别随后弹出的新标签页）
    pub async fn snapshot_tabs(&self) -> Result<HashSet<String>> {
        let mut urls = HashSet::new();
        for page in self.browser.pages().await? {
            if let Ok(Some(url)) = page.url().await {
                urls.insert(url);
            }
        }
        Ok(urls)
    }

    /// 处理一个完整的打印周期：等标签页弹出 → 驱动打印 → 等关闭 → 推进队列
    pub async fn handle_print_cycle(&self, known_tabs: HashSet<String>) -> Result<()> {
        let Some((page, url)) = self.wait_for_spawned_tab(&known_tabs).await? else {
            warn!("⚠️ 未检测到打印标签页弹出，队列保持在可恢复的停滞状态");
            return Ok(());
        };
        info!("🖨️ 检测到打印标签页: {}", url);

        if let Some(mut queue) = self.store.load()? {
            queue.spawned_tab = Some(url.clone());
            self.store.save(&queue)?;
        }

        // 属于活动队列的打印，触发后标签页自行关闭
        if let Err(e) = self.driver.auto_print(&page, true).await {
            warn!("⚠️ 打印标签页驱动失败: {}", e);
        }

        if !self.wait_for_tab_close(&url).await? {
            warn!("⚠️ 打印标签页迟迟未关闭，队列保持在可恢复的停滞状态");
            return Ok(());
        }
        info!("✓ 打印标签页已关闭");

        self.advance_queue(&url).await
    }

    /// 单次（非批量）模式：驱动打印但不关闭标签页、不触碰队列
    pub async fn single_print(&self, known_tabs: HashSet<String>) -> Result<()> {
        let Some((page, url)) = self.wait_for_spawned_tab(&known_tabs).await? else {
            warn!("⚠️ 未检测到打印标签页弹出，请手动打印");
            return Ok(());
        };
        info!("🖨️ 检测到打印标签页: {}", url);
        if let Err(e) = self.driver.auto_print(&page, false).await {
            warn!("⚠️ 打印标签页驱动失败: {}", e);
        }
        Ok(())
    }

    /// 轮询新出现的、地址带打印标记的标签页
    async fn wait_for_spawned_tab(
        &self,
        known_tabs: &HashSet<String>,
    ) -> Result<Option<(Page, String)>> {
        let deadline = Instant::now() + SPAWN_WAIT;
        while Instant::now() < deadline {
            for page in self.browser.pages().await? {
                if let Ok(Some(url)) = page.url().await {
                    if url.contains(&self.print_url_marker) && !known_tabs.contains(&url) {
                        return Ok(Some((page, url)));
                    }
                }
            }
            sleep(self.poll_interval).await;
        }
        Ok(None)
    }

    /// 等待指定地址的标签页消失；上限内未关闭返回 false
    async fn wait_for_tab_close(&self, url: &str) -> Result<bool> {
        let deadline = Instant::now() + self.close_wait_ceiling;
        while Instant::now() < deadline {
            let mut still_open = false;
            for page in self.browser.pages().await? {
                if let Ok(Some(page_url)) = page.url().await {
                    if page_url == url {
                        still_open = true;
                        break;
                    }
                }
            }
            if !still_open {
                return Ok(true);
            }
            sleep(self.poll_interval).await;
        }
        Ok(false)
    }

    /// 按队列记录推进游标并通知编排器
    async fn advance_queue(&self, closed_tab: &str) -> Result<()> {
        let queue = self.store.load()?;
        match advance_on_tab_close(queue.as_ref(), closed_tab) {
            QueueTransition::Continue { next } => {
                if let Some(mut queue) = queue {
                    queue.cursor = next;
                    queue.spawned_tab = None;
                    self.store.save(&queue)?;
                }
                // 给发起方留出收尾时间再发继续信号
                sleep(self.resume_delay).await;
                if self.tx.try_send(QueueSignal::Continue { next }).is_err() {
                    warn!("⚠️ 继续信号无法送达编排器，队列保持在可恢复的停滞状态");
                }
            }
            QueueTransition::Complete => {
                self.store.clear()?;
                if self.tx.try_send(QueueSignal::Completed).is_err() {
                    warn!("⚠️ 完成信号无法送达编排器（队列记录已清理）");
                }
            }
            QueueTransition::Ignore => {
                debug!("与当前队列无关的标签页关闭，忽略");
            }
        }
        Ok(())
    }
}
