//! 浏览器连接
//!
//! 连接到已登录的浏览器实例，按地址前缀定位批量发货页面。
//! 会话（登录态、Cookie）完全由浏览器自己承载，这里不做任何
//! 认证或网络层处理。

use anyhow::Result;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// 判断地址是否属于批量发货页面（纯前缀判断）
///
/// 在标签页激活、导航、程序启动时都会重新判断
pub fn is_mass_ship_page(url: &str, prefix: &str) -> bool {
    !prefix.is_empty() && url.starts_with(prefix)
}

/// 连接到浏览器并定位批量发货页面
///
/// 已有匹配的页面直接复用；否则新开页面导航过去
pub async fn connect_to_mass_ship_page(port: u16, mass_ship_url: &str) -> Result<(Browser, Page)> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("连接浏览器失败: {}", e);
        e
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    let pages = browser.pages().await?;
    debug!("获取到 {} 个页面", pages.len());

    for page in pages.iter() {
        if let Ok(Some(url)) = page.url().await {
            if is_mass_ship_page(&url, mass_ship_url) {
                info!("✓ 找到批量发货页面: {}", url);
                return Ok((browser, page.clone()));
            }
        }
    }

    // 没有打开的发货页面，新开一个并导航过去
    debug!("未找到批量发货页面，将新开页面导航");
    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建新页面失败: {}", e);
        e
    })?;
    page.goto(mass_ship_url).await.map_err(|e| {
        error!("导航到 {} 失败: {}", mass_ship_url, e);
        e
    })?;
    info!("已导航到: {}", mass_ship_url);

    Ok((browser, page))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "https://seller.shopee.co.th/portal/sale/mass/ship";

    #[test]
    fn prefix_match_enables_the_page() {
        assert!(is_mass_ship_page(PREFIX, PREFIX));
        assert!(is_mass_ship_page(
            "https://seller.shopee.co.th/portal/sale/mass/ship?tab=all",
            PREFIX
        ));
    }

    #[test]
    fn other_addresses_are_disabled() {
        assert!(!is_mass_ship_page("https://seller.shopee.co.th/portal/sale", PREFIX));
        assert!(!is_mass_ship_page("https://example.com/", PREFIX));
        assert!(!is_mass_ship_page("", PREFIX));
    }

    #[test]
    fn empty_prefix_never_matches() {
        assert!(!is_mass_ship_page("https://example.com/", ""));
    }
}
