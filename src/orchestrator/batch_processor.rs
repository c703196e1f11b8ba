//! 批量队列编排器 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：连接浏览器、定位发货页面、创建 JsExecutor 与队列存储
//! 2. **启动检查**：发现上次未完成的队列时按配置继续或防御性清除
//! 3. **单个处理**：对指定物流方式跑一遍完整流程
//! 4. **批量排队**：固化物流方式快照，逐个处理并持久化进度
//! 5. **交接打印**：生成面单后把打印标签页交给协调器，等继续信号
//!
//! 批量状态机：Idle → Running(cursor) → {Running(cursor+1), Completed, Failed}。
//! 任何一步失败都会终止队列并清理记录，绝不留下悬空状态。

use std::sync::Arc;

use anyhow::{bail, Result};
use chromiumoxide::Browser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::browser;
use crate::config::Config;
use crate::coordinator::{self, QueueSignal, TabWatcher};
use crate::infrastructure::{FileQueueStore, JsExecutor, QueueStore};
use crate::models::{actionable_only, BatchQueue, CarrierMethod};
use crate::services::{CarrierDiscovery, PopupCollapse};
use crate::utils::logging;
use crate::workflow::{CarrierCtx, ShipmentFlow};

/// 应用主结构
pub struct App {
    config: Config,
    browser: Arc<Browser>,
    executor: JsExecutor,
    store: Arc<dyn QueueStore>,
    discovery: CarrierDiscovery,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        log_startup(&config);

        let (browser, page) =
            browser::connect_to_mass_ship_page(config.browser_debug_port, &config.mass_ship_url)
                .await?;

        let executor = JsExecutor::new(page);
        let store: Arc<dyn QueueStore> = Arc::new(FileQueueStore::new(&config.queue_state_file));

        Ok(Self {
            config,
            browser: Arc::new(browser),
            executor,
            store,
            discovery: CarrierDiscovery::new(),
        })
    }

    /// 列出页面上的物流方式
    pub async fn run_list(&self) -> Result<()> {
        self.check_stalled_notice()?;
        let methods = self.discover().await?;
        let total = methods.len();
        let actionable = actionable_only(methods);

        if total == 0 {
            warn!("⚠️ 页面上没有任何物流方式，请刷新页面");
            return Ok(());
        }
        if actionable.is_empty() {
            info!("📭 没有待发货的订单");
            return Ok(());
        }

        info!("✓ 共 {} 个物流方式，{} 个有待发货订单:", total, actionable.len());
        for method in &actionable {
            info!("  🚚 {} - {} 个订单", method.name, method.pending_count);
        }
        Ok(())
    }

    /// 对指定名称的物流方式执行单次完整流程
    pub async fn run_single(&self, carrier_name: &str) -> Result<()> {
        self.check_stalled_notice()?;
        let methods = self.discover().await?;

        let Some(carrier) = methods.iter().find(|m| m.name == carrier_name).cloned() else {
            bail!(
                "未找到物流方式「{}」，可用: {}",
                carrier_name,
                methods
                    .iter()
                    .map(|m| m.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        };
        if !carrier.is_actionable() {
            bail!("物流方式「{}」没有待发货的订单", carrier.name);
        }

        let flow = ShipmentFlow::new(&self.config);
        let ctx = CarrierCtx::new(carrier.name.clone(), 1, 1);

        // 单次模式也要驱动打印标签页（但不自动关闭），先记下现有标签页
        let (tx, _rx) = mpsc::channel(1);
        let watcher = TabWatcher::new(self.browser.clone(), self.store.clone(), tx, &self.config);
        let known_tabs = watcher.snapshot_tabs().await?;

        match flow.run(&self.executor, &carrier, &ctx).await {
            Ok(summary) => {
                watcher.single_print(known_tabs).await?;
                info!(
                    "✅ 完成: {} 的 {} 个订单",
                    carrier.name, summary.selected_count
                );
                Ok(())
            }
            Err(e) => {
                error!("{} ❌ {}", ctx, e);
                bail!("处理「{}」失败: {}", carrier.name, e);
            }
        }
    }

    /// 批量处理所有有待发货订单的物流方式
    pub async fn run_batch(&self) -> Result<()> {
        let queue = match self.detect_stalled_queue()? {
            Some(queue) => queue,
            None => {
                let methods = self.discover().await?;
                let actionable = actionable_only(methods);
                if actionable.is_empty() {
                    info!("📭 没有待发货的订单，批量处理结束");
                    return Ok(());
                }

                let origin_tab = self.executor.page().url().await.ok().flatten();
                let queue = BatchQueue::start(actionable, origin_tab);
                self.store.save(&queue)?;
                queue
            }
        };

        self.run_queue(queue).await
    }

    /// 发现物流方式（结构缺失按可展示的错误上报）
    ///
    /// 读取筛选器之前先 ping 页面就绪状态，避免对加载中的文档做结构判断
    async fn discover(&self) -> Result<Vec<CarrierMethod>> {
        let ready = self
            .discovery
            .probe_ready(&self.executor)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        if !ready {
            bail!("发货页面尚未加载完成，请稍候重试");
        }

        self.discovery
            .list_carriers(&self.executor)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))
    }

    /// 启动检查：存在未完成的队列且允许恢复时返回它，否则防御性清除
    fn detect_stalled_queue(&self) -> Result<Option<BatchQueue>> {
        if let Some(queue) = self.store.load()? {
            if queue.running && !queue.is_exhausted() {
                if self.config.resume_stalled {
                    info!(
                        "🔁 检测到未完成的批量队列（游标 {}/{}），从中断处继续",
                        queue.cursor,
                        queue.items.len()
                    );
                    return Ok(Some(queue));
                }
                warn!(
                    "⚠️ 检测到未完成的批量队列（游标 {}/{}）。如需继续请设置 RESUME_STALLED=1；本次将清除该记录",
                    queue.cursor,
                    queue.items.len()
                );
            }
        }
        // 防御性清除，避免恢复到过期的孤儿队列
        self.store.clear()?;
        Ok(None)
    }

    /// 非批量入口下对停滞队列只提示，不清除
    fn check_stalled_notice(&self) -> Result<()> {
        if let Some(queue) = self.store.load()? {
            if queue.running && !queue.is_exhausted() {
                warn!(
                    "⚠️ 存在未完成的批量队列（游标 {}/{}），可用 batch 模式 + RESUME_STALLED=1 继续",
                    queue.cursor,
                    queue.items.len()
                );
            }
        }
        Ok(())
    }

    /// 逐个游标处理队列条目
    async fn run_queue(&self, queue: BatchQueue) -> Result<()> {
        let total = queue.items.len();
        log_batch_start(total);

        let (tx, mut rx) = mpsc::channel(4);
        let watcher = TabWatcher::new(self.browser.clone(), self.store.clone(), tx, &self.config);
        let flow = ShipmentFlow::new(&self.config);
        let popup = PopupCollapse::new();

        let mut cursor = queue.cursor;
        let mut stats = BatchStats::default();

        loop {
            // 取消观测点：每个队列步的开头
            let Some(mut queue) = self.store.load()? else {
                info!("队列记录已被清除，停止批量处理");
                return Ok(());
            };
            if !queue.running {
                info!("🛑 队列已被取消，清理记录");
                self.store.clear()?;
                return Ok(());
            }
            let Some(carrier) = queue.items.get(cursor).cloned() else {
                self.store.clear()?;
                log_batch_complete(&stats, total);
                return Ok(());
            };

            queue.cursor = cursor;
            queue.spawned_tab = None;
            self.store.save(&queue)?;

            let ctx = CarrierCtx::new(carrier.name.clone(), cursor + 1, total);

            if cursor > 0 {
                // 上一轮的生成面板可能还开着
                if let Err(e) = popup.collapse(&self.executor).await {
                    error!("{} ❌ 收起残留弹层失败: {}", ctx, e);
                    self.store.clear()?;
                    bail!("批量处理在「{}」失败: {}", carrier.name, e);
                }
            }

            let known_tabs = watcher.snapshot_tabs().await?;

            match flow.run(&self.executor, &carrier, &ctx).await {
                Ok(summary) => {
                    stats.carriers_done += 1;
                    stats.orders_total += summary.selected_count;
                }
                Err(e) => {
                    // 不重试失败的物流方式：终止队列并清理记录
                    error!("{} ❌ 处理失败: {}", ctx, e);
                    self.store.clear()?;
                    bail!("批量处理在「{}」失败: {}", carrier.name, e);
                }
            }

            // 生成面单会弹出打印标签页；交给协调器监视，编排器不直接等打印
            let cycle_watcher = watcher.clone();
            tokio::spawn(async move {
                if let Err(e) = cycle_watcher.handle_print_cycle(known_tabs).await {
                    warn!("⚠️ 打印周期处理失败: {}", e);
                }
            });

            // 上限必须覆盖协调器整个打印周期，不能只用关闭等待的上限
            let ceiling = coordinator::signal_wait_ceiling(&self.config);
            match tokio::time::timeout(ceiling, rx.recv()).await {
                Ok(Some(QueueSignal::Continue { next })) => {
                    info!("▶️ 收到继续信号，从第 {} 个物流方式继续", next + 1);
                    cursor = next;
                }
                Ok(Some(QueueSignal::Completed)) => {
                    log_batch_complete(&stats, total);
                    return Ok(());
                }
                Ok(None) => {
                    warn!("⚠️ 协调器通道意外关闭，队列保持在可恢复的停滞状态");
                    return Ok(());
                }
                Err(_) => {
                    warn!("⚠️ 等待继续信号超时，队列保持在可恢复的停滞状态");
                    return Ok(());
                }
            }
        }
    }
}

/// 批量统计
#[derive(Debug, Default)]
struct BatchStats {
    carriers_done: usize,
    orders_total: u32,
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量发货自动打印");
    info!("📄 发货页面: {}", config.mass_ship_url);
    info!("🗂 队列记录: {}", config.queue_state_file);
    info!("{}", "=".repeat(60));
}

fn log_batch_start(total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始批量处理，共 {} 个物流方式", total);
    info!("{}", "=".repeat(60));
}

fn log_batch_complete(stats: &BatchStats, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!(
        "✅ 批量完成: {}/{} 个物流方式，共 {} 个订单",
        stats.carriers_done, total, stats.orders_total
    );
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
}
