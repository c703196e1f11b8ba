//! 日志工具模块
//!
//! 提供 tracing 初始化与运行日志文件的辅助函数

use anyhow::Result;
use std::fs;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 优先读取 `RUST_LOG`，否则按 verbose 开关选择 info/debug 级别
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // try_init: 测试里可能多次调用
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化运行日志文件（写入时间戳头部）
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n批量发货处理日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}
