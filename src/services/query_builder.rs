//! 查询构建 - 把 QueryState 投影为请求参数
//!
//! 纯函数，不做任何 I/O；同一个状态总是得到完全相同的参数序列。
//! 输出顺序：筛选维度（固定顺序）→ 分页 → 排序 → 搜索。

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use serde::Serialize;

use crate::error::ApiError;
use crate::models::facet::{FacetDimension, FacetSet};
use crate::models::query_state::QueryState;

/// 与前端 `parseInt` 行为一致：取开头的整数部分
static LEADING_INT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").ok());

/// 传输层需要的请求描述
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequestDescriptor {
    params: Vec<(&'static str, String)>,
}

impl RequestDescriptor {
    /// 按输出顺序排列的参数
    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    /// 取某个参数的值
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// 拼接到接口地址上
    pub fn to_url(&self, endpoint_url: &str) -> Result<Url, ApiError> {
        Url::parse_with_params(endpoint_url, self.params.iter().map(|(k, v)| (*k, v.as_str())))
            .map_err(|e| ApiError::RequestFailed {
                endpoint: endpoint_url.to_string(),
                source: Box::new(e),
            })
    }

    /// URL 编码后的查询串，例如 `limit=8&offset=0&sortBy=createdAt`
    pub fn query_string(&self) -> String {
        self.to_url("http://localhost/")
            .ok()
            .and_then(|url| url.query().map(str::to_string))
            .unwrap_or_default()
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.query_string())
    }
}

/// 构建请求参数
pub fn build(state: &QueryState) -> RequestDescriptor {
    let mut params = Vec::with_capacity(FacetDimension::ALL.len() + 4);

    for (dimension, set) in state.facets() {
        if set.is_empty() {
            continue;
        }
        params.push((dimension.param_name(), facet_param_value(dimension, set)));
    }

    params.push(("limit", state.page_size().to_string()));
    params.push(("offset", state.offset().to_string()));
    params.push(("sortBy", state.sort_key().as_str().to_string()));

    if !state.search_term().is_empty() {
        params.push(("search", state.search_term().to_string()));
    }

    RequestDescriptor { params }
}

fn facet_param_value(dimension: FacetDimension, set: &FacetSet) -> String {
    match dimension {
        FacetDimension::Year => set
            .values()
            .iter()
            .map(|v| normalize_year(v))
            .collect::<Vec<_>>()
            .join(","),
        _ => set.joined(),
    }
}

/// 年份取整数部分；完全无法解析时原样（去空白）传递
fn normalize_year(value: &str) -> Cow<'_, str> {
    LEADING_INT
        .as_ref()
        .and_then(|re| re.captures(value))
        .and_then(|cap| cap.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .map(|year| Cow::Owned(year.to_string()))
        .unwrap_or_else(|| Cow::Borrowed(value.trim()))
}
