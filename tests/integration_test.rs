use mass_ship_autoprint::browser::connect_to_mass_ship_page;
use mass_ship_autoprint::config::Config;
use mass_ship_autoprint::infrastructure::JsExecutor;
use mass_ship_autoprint::services::CarrierDiscovery;
use mass_ship_autoprint::utils::logging;

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_browser_connection() {
    // 初始化日志
    logging::init(true);

    // 加载配置
    let config = Config::load();

    // 测试浏览器连接
    let result = connect_to_mass_ship_page(config.browser_debug_port, &config.mass_ship_url).await;

    assert!(result.is_ok(), "应该能够成功连接浏览器");
}

#[tokio::test]
#[ignore]
async fn test_list_carriers_on_live_page() {
    // 初始化日志
    logging::init(true);

    // 加载配置
    let config = Config::load();

    // 连接浏览器并定位发货页面
    let (_browser, page) =
        connect_to_mass_ship_page(config.browser_debug_port, &config.mass_ship_url)
            .await
            .expect("连接浏览器失败");

    let executor = JsExecutor::new(page);
    let discovery = CarrierDiscovery::new();

    // 发货页面应当已就绪可供自动化
    let ready = discovery
        .probe_ready(&executor)
        .await
        .expect("探测页面就绪状态失败");
    assert!(ready, "发货页面应当已加载完成");

    // 页面上应当存在物流方式筛选器
    let carriers = discovery
        .list_carriers(&executor)
        .await
        .expect("读取物流方式失败");

    assert!(!carriers.is_empty(), "发货页面应当至少有一个物流方式");
    for carrier in &carriers {
        println!("{} - {} 个订单", carrier.name, carrier.pending_count);
    }
}

#[tokio::test]
#[ignore]
async fn test_single_carrier_full_flow() {
    use mass_ship_autoprint::workflow::{CarrierCtx, ShipmentFlow};

    // 初始化日志
    logging::init(true);

    // 加载配置
    let config = Config::load();

    // 连接浏览器并定位发货页面
    let (_browser, page) =
        connect_to_mass_ship_page(config.browser_debug_port, &config.mass_ship_url)
            .await
            .expect("连接浏览器失败");

    let executor = JsExecutor::new(page);
    let discovery = CarrierDiscovery::new();

    let carriers = discovery
        .list_carriers(&executor)
        .await
        .expect("读取物流方式失败");

    // 取第一个有待发货订单的物流方式
    // 注意：该测试会真实地确认揽收并生成面单
    let Some(carrier) = carriers.iter().find(|c| c.is_actionable()) else {
        println!("没有待发货的订单，跳过");
        return;
    };

    let flow = ShipmentFlow::new(&config);
    let ctx = CarrierCtx::new(carrier.name.clone(), 1, 1);

    let summary = flow
        .run(&executor, carrier, &ctx)
        .await
        .expect("发货流程失败");

    assert!(summary.selected_count > 0, "应当勾选到至少一个订单");
}
