//! 查询状态与唯一的状态变更入口
//!
//! 所有筛选 / 搜索 / 排序 / 翻页操作都通过 [`apply_action`] 产生新的
//! [`QueryState`]，不在多个调用点做局部修改。

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::models::facet::{FacetDimension, FacetSet};
use crate::models::sort::{SortKey, SortRegistry};

/// 默认每页条数
pub const DEFAULT_PAGE_SIZE: u32 = 8;

/// 完整的查询状态
///
/// `facets` 始终包含全部五个维度；`search_term` 已去除首尾空白；`page >= 1`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "QueryStateRepr")]
pub struct QueryState {
    facets: BTreeMap<FacetDimension, FacetSet>,
    search_term: String,
    sort_key: SortKey,
    page: u32,
    page_size: u32,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl QueryState {
    /// 创建初始状态；`page_size` 为 0 时按 1 处理
    pub fn new(page_size: u32) -> Self {
        Self {
            facets: FacetDimension::ALL
                .into_iter()
                .map(|dim| (dim, FacetSet::new()))
                .collect(),
            search_term: String::new(),
            sort_key: SortRegistry::default_key(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn facet(&self, dimension: FacetDimension) -> &FacetSet {
        // 构造和反序列化都会补齐五个维度
        &self.facets[&dimension]
    }

    /// 按固定维度顺序遍历
    pub fn facets(&self) -> impl Iterator<Item = (FacetDimension, &FacetSet)> {
        self.facets.iter().map(|(dim, set)| (*dim, set))
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// 当前页的偏移量
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    /// 已选中的筛选值数量（筛选按钮上的角标）
    pub fn active_filter_count(&self) -> usize {
        self.facets.values().map(FacetSet::len).sum()
    }

    pub fn has_active_filters(&self) -> bool {
        self.active_filter_count() > 0
    }

    /// 根据总条数计算总页数
    pub fn total_pages(&self, total: u64) -> u32 {
        let pages = total.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// 只比较结果集的定义条件（不含页码）
    pub fn same_criteria(&self, other: &QueryState) -> bool {
        self.facets == other.facets
            && self.search_term == other.search_term
            && self.sort_key == other.sort_key
            && self.page_size == other.page_size
    }
}

/// 反序列化时的原始形态，补齐缺失维度并校验页码
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryStateRepr {
    #[serde(default)]
    facets: BTreeMap<FacetDimension, FacetSet>,
    #[serde(default)]
    search_term: String,
    #[serde(default)]
    sort_key: SortKey,
    page: u32,
    page_size: u32,
}

impl TryFrom<QueryStateRepr> for QueryState {
    type Error = QueryError;

    fn try_from(repr: QueryStateRepr) -> Result<Self, Self::Error> {
        if repr.page < 1 {
            return Err(QueryError::invalid_page(repr.page));
        }
        if repr.page_size < 1 {
            return Err(QueryError::InvalidArgument {
                name: "pageSize",
                reason: "每页条数必须 >= 1".to_string(),
            });
        }
        let mut state = QueryState::new(repr.page_size);
        state.facets.extend(repr.facets);
        state.search_term = repr.search_term.trim().to_string();
        state.sort_key = repr.sort_key;
        state.page = repr.page;
        Ok(state)
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (dim, set) in self.facets() {
            if !set.is_empty() {
                write!(f, "{}={} ", dim, set.joined())?;
            }
        }
        if !self.search_term.is_empty() {
            write!(f, "search=\"{}\" ", self.search_term)?;
        }
        write!(f, "sort={} page={}/{}]", self.sort_key, self.page, self.page_size)
    }
}

/// 界面操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryAction {
    /// 单选切换某个维度的值
    SetFacet(FacetDimension, String),
    /// 清空某个维度（点击 All）
    ClearFacet(FacetDimension),
    SetSearch(String),
    /// 设置排序，接受标签或排序键
    SetSort(String),
    /// 排序菜单行为：再次选择当前排序时恢复默认
    ToggleSort(String),
    SetPage(u32),
}

impl QueryAction {
    /// 是否只是翻页
    pub fn is_pagination(&self) -> bool {
        matches!(self, QueryAction::SetPage(_))
    }
}

/// 唯一的状态变更入口
///
/// 筛选 / 搜索 / 排序变化后页码一律回到 1；翻页只改页码。
/// 页码小于 1 属于调用方错误，返回 `InvalidArgument`，不做静默修正。
pub fn apply_action(state: &QueryState, action: QueryAction) -> Result<QueryState, QueryError> {
    let mut next = state.clone();

    match action {
        QueryAction::SetPage(page) => {
            if page < 1 {
                return Err(QueryError::invalid_page(page));
            }
            next.page = page;
            return Ok(next);
        }
        QueryAction::SetFacet(dimension, value) => {
            let toggled = state.facet(dimension).toggle(&value);
            next.facets.insert(dimension, toggled);
        }
        QueryAction::ClearFacet(dimension) => {
            next.facets.insert(dimension, FacetSet::new());
        }
        QueryAction::SetSearch(term) => {
            next.search_term = term.trim().to_string();
        }
        QueryAction::SetSort(label) => {
            next.sort_key = SortRegistry::resolve(&label);
        }
        QueryAction::ToggleSort(label) => {
            let key = SortRegistry::resolve(&label);
            next.sort_key = if key == state.sort_key {
                SortRegistry::default_key()
            } else {
                key
            };
        }
    }

    next.page = 1;
    Ok(next)
}
