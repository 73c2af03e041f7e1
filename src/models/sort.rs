//! 排序选项
//!
//! 界面上显示的标签与服务端排序键之间的静态映射

use std::fmt;

use phf::phf_ordered_map;
use serde::{Deserialize, Serialize};

/// 服务端能识别的排序键
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    /// 按创建顺序
    #[default]
    CreatedAt,
    YearDesc,
    YearAsc,
    ClassAsc,
    ClassDesc,
    SubjectAsc,
    SubjectDesc,
}

impl SortKey {
    /// 发送给服务端的排序键
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::CreatedAt => "createdAt",
            SortKey::YearDesc => "-year",
            SortKey::YearAsc => "year",
            SortKey::ClassAsc => "class",
            SortKey::ClassDesc => "-class",
            SortKey::SubjectAsc => "subject",
            SortKey::SubjectDesc => "-subject",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 排序菜单，顺序即界面显示顺序
static SORT_OPTIONS: phf::OrderedMap<&'static str, SortKey> = phf_ordered_map! {
    "Default" => SortKey::CreatedAt,
    "Year (Newest)" => SortKey::YearDesc,
    "Year (Oldest)" => SortKey::YearAsc,
    "Class (Asc)" => SortKey::ClassAsc,
    "Class (Desc)" => SortKey::ClassDesc,
    "Subject (A-Z)" => SortKey::SubjectAsc,
    "Subject (Z-A)" => SortKey::SubjectDesc,
};

/// 排序注册表
pub struct SortRegistry;

impl SortRegistry {
    pub const DEFAULT_LABEL: &'static str = "Default";

    pub fn default_key() -> SortKey {
        SortKey::default()
    }

    /// 解析排序标签
    ///
    /// 也接受服务端排序键本身（如 `-year`）。
    /// 无法识别时返回默认排序，不报错。
    pub fn resolve(label: &str) -> SortKey {
        let label = label.trim();
        if let Some(key) = SORT_OPTIONS.get(label) {
            return *key;
        }
        SORT_OPTIONS
            .values()
            .copied()
            .find(|key| key.as_str() == label)
            .unwrap_or_default()
    }

    /// 排序键对应的显示标签
    pub fn label_for(key: SortKey) -> &'static str {
        SORT_OPTIONS
            .entries()
            .find(|(_, k)| **k == key)
            .map(|(label, _)| *label)
            .unwrap_or(Self::DEFAULT_LABEL)
    }

    /// 全部标签（菜单顺序）
    pub fn labels() -> impl Iterator<Item = &'static str> {
        SORT_OPTIONS.keys().copied()
    }
}
