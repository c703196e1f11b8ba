use serde::Deserialize;

/// 程序配置
///
/// 默认值 → `autoprint.toml`（如存在）→ 环境变量，逐层覆盖
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 批量发货页面地址前缀（用于定位页面与启用判断）
    pub mass_ship_url: String,
    /// 打印面单标签页的地址标记（子串匹配）
    pub print_url_marker: String,
    /// 面单文档格式（页面下拉菜单中的选项标识）
    pub doc_type: String,
    /// 批量队列持久化文件
    pub queue_state_file: String,
    /// 启动时检测到未完成队列是否继续（否则清除）
    pub resume_stalled: bool,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,

    // --- 轮询预算 ---
    /// 全选复选框：最大尝试次数 / 间隔
    pub checkbox_max_attempts: usize,
    pub checkbox_interval_ms: u64,
    /// 确认揽收按钮
    pub pickup_max_attempts: usize,
    pub pickup_interval_ms: u64,
    /// 生成面单按钮
    pub generate_max_attempts: usize,
    pub generate_interval_ms: u64,
    /// 悬停展开格式菜单
    pub hover_max_attempts: usize,
    pub hover_interval_ms: u64,
    /// 等待全部面单状态就绪的上限
    pub label_wait_ceiling_ms: u64,
    /// 打印按钮
    pub print_max_attempts: usize,
    pub print_interval_ms: u64,
    /// 打印触发后到关闭标签页的延迟
    pub print_close_delay_ms: u64,
    /// 标签页关闭后发出继续信号前的延迟
    pub resume_delay_ms: u64,
    /// 等待打印标签页出现/关闭的整体上限
    pub tab_wait_ceiling_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_debug_port: 9222,
            mass_ship_url: "https://seller.shopee.co.th/portal/sale/mass/ship".to_string(),
            print_url_marker: "/portal/sale/mass/print".to_string(),
            doc_type: "NORMAL_PDF".to_string(),
            queue_state_file: "autoprint_queue.json".to_string(),
            resume_stalled: false,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            checkbox_max_attempts: 10,
            checkbox_interval_ms: 300,
            pickup_max_attempts: 10,
            pickup_interval_ms: 300,
            generate_max_attempts: 20,
            generate_interval_ms: 500,
            hover_max_attempts: 10,
            hover_interval_ms: 200,
            label_wait_ceiling_ms: 120_000,
            print_max_attempts: 60,
            print_interval_ms: 500,
            print_close_delay_ms: 1_500,
            resume_delay_ms: 1_000,
            tab_wait_ceiling_ms: 600_000,
        }
    }
}

impl Config {
    /// 加载配置：autoprint.toml（可选）+ 环境变量覆盖
    pub fn load() -> Self {
        let base = match std::fs::read_to_string("autoprint.toml") {
            Ok(text) => match toml::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("autoprint.toml 解析失败，使用默认配置: {}", e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };
        base.apply_env()
    }

    /// 用环境变量覆盖已有配置
    pub fn apply_env(self) -> Self {
        Self {
            browser_debug_port: env_parse("BROWSER_DEBUG_PORT", self.browser_debug_port),
            mass_ship_url: std::env::var("MASS_SHIP_URL").unwrap_or(self.mass_ship_url),
            print_url_marker: std::env::var("PRINT_URL_MARKER").unwrap_or(self.print_url_marker),
            doc_type: std::env::var("DOC_TYPE").unwrap_or(self.doc_type),
            queue_state_file: std::env::var("QUEUE_STATE_FILE").unwrap_or(self.queue_state_file),
            resume_stalled: env_parse("RESUME_STALLED", self.resume_stalled),
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
            ..self
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, fallback: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budgets_are_bounded() {
        let config = Config::default();
        assert!(config.checkbox_max_attempts > 0);
        assert!(config.label_wait_ceiling_ms > 0);
        assert!(config.tab_wait_ceiling_ms > 0);
    }

    #[test]
    fn toml_overlay_keeps_unset_fields() {
        let config: Config = toml::from_str("doc_type = \"A6_PDF\"").unwrap();
        assert_eq!(config.doc_type, "A6_PDF");
        assert_eq!(config.checkbox_max_attempts, Config::default().checkbox_max_attempts);
    }
}
