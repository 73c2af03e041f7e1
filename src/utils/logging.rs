/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::facet::FacetDimension;
use crate::models::query_state::QueryState;
use crate::models::sort::SortRegistry;
use crate::services::results_controller::{FetchStatus, ResultsSnapshot};

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则默认 `info`，`verbose` 时为 `debug`。
/// 重复调用不会报错，测试中可以多次调用。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 试卷目录查询启动");
    info!(
        "启动时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 接口地址: {}", config.api_base_url);
    info!("📄 每页条数: {}", config.page_size);
    info!("⏱️ 请求超时: {} 秒", config.request_timeout_secs);
    info!("{}", "=".repeat(60));
}

/// 记录当前查询条件
pub fn log_query(state: &QueryState) {
    info!("\n{}", "─".repeat(60));
    for dimension in FacetDimension::ALL {
        let set = state.facet(dimension);
        if !set.is_all() {
            info!("🏷️ {}: {}", dimension.title(), set.joined());
        }
    }
    if !state.search_term().is_empty() {
        info!("🔍 搜索: {}", truncate_text(state.search_term(), 40));
    }
    info!("↕️ 排序: {}", SortRegistry::label_for(state.sort_key()));
    info!("📑 第 {} 页 (每页 {} 条)", state.page(), state.page_size());
    info!("{}", "─".repeat(60));
}

/// 打印一页结果
///
/// # 参数
/// - `snapshot`: 结果快照
/// - `total_pages`: 总页数，未知时为 None
pub fn log_results(snapshot: &ResultsSnapshot, total_pages: Option<u32>) {
    match snapshot.status {
        FetchStatus::Success => {
            info!("✅ 共 {} 份试卷", snapshot.total);
        }
        FetchStatus::Error => {
            info!(
                "❌ 查询失败: {}",
                snapshot.error.as_deref().unwrap_or("未知错误")
            );
            if snapshot.items.is_empty() {
                return;
            }
            info!("以下为上一次成功的结果");
        }
        FetchStatus::Idle | FetchStatus::Loading => {
            info!("⏳ 结果尚未返回");
            return;
        }
    }

    if snapshot.items.is_empty() {
        info!("📭 没有符合条件的试卷");
    }
    for (index, paper) in snapshot.items.iter().enumerate() {
        info!(
            "  {}. {} [{} • {} • {}]",
            index + 1,
            truncate_text(&paper.title, 50),
            paper.caption(),
            paper.board,
            paper.year
        );
    }
    if let (Some(state), Some(pages)) = (snapshot.state.as_ref(), total_pages) {
        info!("📑 第 {}/{} 页", state.page(), pages.max(1));
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
