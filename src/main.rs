use std::path::Path;

use anyhow::{Context, Result};
use paper_catalog::models::FacetDimension;
use paper_catalog::utils::logging;
use paper_catalog::{cli, CatalogSession, Config, FetchStatus, QueryAction};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：CATALOG_CONFIG 指定的 TOML 文件，再用环境变量覆盖
    let config = match std::env::var("CATALOG_CONFIG") {
        Ok(path) => Config::load_toml(Path::new(&path)).await?.with_env_overrides(),
        Err(_) => Config::from_env(),
    };
    config.validate().context("配置无效")?;

    // 初始化日志
    logging::init(config.verbose_logging);
    logging::log_startup(&config);

    let actions = cli::parse_actions(std::env::args().skip(1)).context("无法解析命令行参数")?;
    let requested_page = actions.iter().rev().find_map(|action| match action {
        QueryAction::SetPage(page) => Some(*page),
        _ => None,
    });

    let mut session = CatalogSession::connect(&config)?;

    // 筛选选项
    let options = session.load_facet_options().await;
    for dimension in FacetDimension::ALL {
        let names: Vec<String> = options.get(dimension).iter().map(|o| o.to_string()).collect();
        if !names.is_empty() {
            info!("🏷️ {}: {}", dimension.title(), names.join(", "));
        }
    }

    session.apply_all(actions)?;
    logging::log_query(session.state());
    let mut snapshot = session.wait_settled().await;

    // 页码超出范围时，拿到总数后再校正一次
    if let (Some(page), Some(pages)) = (requested_page, session.total_pages()) {
        if page > pages.max(1) && session.apply(QueryAction::SetPage(page))?.is_some() {
            logging::log_query(session.state());
            snapshot = session.wait_settled().await;
        }
    }

    logging::log_results(&snapshot, session.total_pages());

    if snapshot.status == FetchStatus::Error {
        anyhow::bail!(
            "查询失败: {}",
            snapshot.error.unwrap_or_else(|| "未知错误".to_string())
        );
    }
    Ok(())
}
