//! 命令行参数解析
//!
//! 每个参数形如 `key=value`，按出现顺序转换为界面操作：
//!
//! ```text
//! paper_catalog class=10 subject=Physics sort="Year (Newest)" search=algebra page=2
//! ```
//!
//! 筛选、搜索和排序都会把页码重置为 1，所以 `page=` 应放在最后。

use crate::error::QueryError;
use crate::models::facet::FacetDimension;
use crate::models::query_state::QueryAction;

/// 解析单个参数
pub fn parse_action(arg: &str) -> Result<QueryAction, QueryError> {
    let (key, value) = arg.split_once('=').ok_or_else(|| QueryError::InvalidArgument {
        name: "arg",
        reason: format!("参数应为 key=value 形式: {}", arg),
    })?;
    let value = value.trim();

    if let Some(dimension) = FacetDimension::from_param(key) {
        // 选 All 等同于清空该维度
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            return Ok(QueryAction::ClearFacet(dimension));
        }
        return Ok(QueryAction::SetFacet(dimension, value.to_string()));
    }

    match key.trim().to_ascii_lowercase().as_str() {
        "search" | "q" => Ok(QueryAction::SetSearch(value.to_string())),
        "sort" | "sortby" => Ok(QueryAction::SetSort(value.to_string())),
        "page" => value
            .parse::<u32>()
            .map(QueryAction::SetPage)
            .map_err(|e| QueryError::InvalidArgument {
                name: "page",
                reason: format!("{}: {}", value, e),
            }),
        other => Err(QueryError::InvalidArgument {
            name: "arg",
            reason: format!("未知参数: {}", other),
        }),
    }
}

/// 解析全部参数，遇到第一个错误即返回
pub fn parse_actions<I, S>(args: I) -> Result<Vec<QueryAction>, QueryError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter().map(|arg| parse_action(arg.as_ref())).collect()
}
