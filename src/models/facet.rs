//! 筛选维度与单维度选择集合

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// 筛选维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacetDimension {
    /// 年级
    Class,
    /// 科目
    Subject,
    /// 考试局 / 教材版本
    Board,
    /// 年份
    Year,
    /// 考试类型
    ExamType,
}

impl FacetDimension {
    /// 固定顺序，决定请求参数的输出顺序
    pub const ALL: [FacetDimension; 5] = [
        FacetDimension::Class,
        FacetDimension::Subject,
        FacetDimension::Board,
        FacetDimension::Year,
        FacetDimension::ExamType,
    ];

    /// 接口中使用的参数名
    pub fn param_name(self) -> &'static str {
        match self {
            FacetDimension::Class => "class",
            FacetDimension::Subject => "subject",
            FacetDimension::Board => "board",
            FacetDimension::Year => "year",
            FacetDimension::ExamType => "examType",
        }
    }

    /// 筛选面板上的标题
    pub fn title(self) -> &'static str {
        match self {
            FacetDimension::Class => "Class",
            FacetDimension::Subject => "Subject",
            FacetDimension::Board => "Board",
            FacetDimension::Year => "Year",
            FacetDimension::ExamType => "Exam Type",
        }
    }

    /// 从参数名解析维度（大小写不敏感，兼容 exam_type 写法）
    pub fn from_param(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "class" => Some(FacetDimension::Class),
            "subject" => Some(FacetDimension::Subject),
            "board" => Some(FacetDimension::Board),
            "year" => Some(FacetDimension::Year),
            "examtype" | "exam_type" => Some(FacetDimension::ExamType),
            _ => None,
        }
    }
}

impl fmt::Display for FacetDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.param_name())
    }
}

/// 单个维度上已选中的值
///
/// 内部是一个有序集合，但当前策略是单选：
/// 选中新值会替换旧值，再次选中同一个值会清空。
/// 空集合表示"不筛选"（即界面上的 All）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FacetSet {
    values: Vec<String>,
}

impl TryFrom<Vec<String>> for FacetSet {
    type Error = QueryError;

    /// 重复值合并；合并后多于一个值时拒绝
    fn try_from(mut values: Vec<String>) -> Result<Self, Self::Error> {
        values.dedup();
        if let Some(first) = values.first() {
            if values.iter().any(|v| v != first) {
                return Err(QueryError::InvalidArgument {
                    name: "facets",
                    reason: format!("每个维度只能选择一个值: {}", values.join(",")),
                });
            }
            values.truncate(1);
        }
        Ok(Self { values })
    }
}

impl From<FacetSet> for Vec<String> {
    fn from(set: FacetSet) -> Self {
        set.values
    }
}

impl FacetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 单选切换
    pub fn toggle(&self, value: &str) -> Self {
        if self.contains(value) {
            self.clear()
        } else {
            self.select(value)
        }
    }

    /// 直接选中某个值（替换已有选择，不做切换）
    pub fn select(&self, value: &str) -> Self {
        Self {
            values: vec![value.to_string()],
        }
    }

    pub fn clear(&self) -> Self {
        Self::new()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// "All" 选项是否勾选
    pub fn is_all(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// 逗号拼接的值，用于请求参数
    pub fn joined(&self) -> String {
        self.values.join(",")
    }
}

/// 某个维度下可选的值及其数量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetOption {
    /// 年份在接口中是数字，这里统一为字符串
    #[serde(deserialize_with = "crate::models::paper::deserialize_string_or_number")]
    pub name: String,
    #[serde(default)]
    pub count: u64,
}

impl FacetOption {
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

impl fmt::Display for FacetOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.count)
    }
}

/// 全部维度的可选值
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetOptionsByDimension {
    options: BTreeMap<FacetDimension, Vec<FacetOption>>,
}

impl FacetOptionsByDimension {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dimension: FacetDimension, options: Vec<FacetOption>) {
        self.options.insert(dimension, options);
    }

    /// 某个维度的选项，没有数据时返回空切片
    pub fn get(&self, dimension: FacetDimension) -> &[FacetOption] {
        self.options
            .get(&dimension)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.options.values().all(Vec::is_empty)
    }

    /// 选项总数（所有维度相加）
    pub fn option_count(&self) -> usize {
        self.options.values().map(Vec::len).sum()
    }
}
