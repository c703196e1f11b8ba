use anyhow::Result;

use mass_ship_autoprint::utils::logging;
use mass_ship_autoprint::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load();

    // 初始化日志
    logging::init(config.verbose_logging);

    let args: Vec<String> = std::env::args().skip(1).collect();

    // 初始化并运行应用
    let app = App::initialize(config).await?;
    match args.first().map(String::as_str) {
        None | Some("list") => app.run_list().await?,
        Some("batch") => app.run_batch().await?,
        Some("ship") => {
            let Some(carrier_name) = args.get(1) else {
                anyhow::bail!("用法: mass_ship_autoprint ship <物流方式名称>");
            };
            app.run_single(carrier_name).await?;
        }
        Some(other) => {
            anyhow::bail!("未知模式「{}」，可用: list / batch / ship <物流方式名称>", other);
        }
    }

    Ok(())
}
