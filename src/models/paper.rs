use serde::{Deserialize, Serialize};

/// 列表接口返回的一份试卷
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Paper {
    /// 服务端可能返回 `_id`、`id` 或两者都有
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(deserialize_with = "deserialize_string_or_number")]
    pub class: String,
    pub subject: String,
    pub board: String,
    #[serde(deserialize_with = "deserialize_string_or_number")]
    pub year: String,
    pub exam_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    pub tags: Vec<String>,
    /// 缺省视为启用
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    pub featured: bool,
}

impl Paper {
    pub fn identifier(&self) -> Option<&str> {
        self.object_id.as_deref().or(self.id.as_deref())
    }

    pub fn is_active(&self) -> bool {
        self.is_active != Some(false)
    }

    /// 卡片上的副标题，例如 "Class 10 • Physics"
    pub fn caption(&self) -> String {
        format!("Class {} • {}", self.class, self.subject)
    }
}

/// 分页信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub total: u64,
}

/// 一页查询结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperPage {
    pub items: Vec<Paper>,
    pub pagination: Pagination,
}

impl PaperPage {
    pub fn total(&self) -> u64 {
        self.pagination.total
    }
}

// 年份、年级在接口里可能是字符串也可能是整数，统一转成字符串
pub(crate) fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct StringOrNumberVisitor;

    impl<'de> Visitor<'de> for StringOrNumberVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            // 2023.0 → "2023"
            if value.fract() == 0.0 && value.abs() < 1e15 {
                Ok(format!("{}", value as i64))
            } else {
                Ok(value.to_string())
            }
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(StringOrNumberVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_list_item() {
        let json = r#"{
            "_id": "65f0c",
            "title": "CBSE Physics 2023",
            "class": 12,
            "subject": "Physics",
            "board": "CBSE",
            "year": 2023,
            "examType": "Board",
            "fileUrl": "https://cdn.example.org/p.pdf",
            "tags": ["physics", "2023"],
            "createdAt": "2024-01-01T00:00:00Z"
        }"#;

        let paper: Paper = serde_json::from_str(json).unwrap();
        assert_eq!(paper.identifier(), Some("65f0c"));
        assert_eq!(paper.class, "12");
        assert_eq!(paper.year, "2023");
        assert_eq!(paper.exam_type, "Board");
        assert!(paper.is_active());
        assert_eq!(paper.caption(), "Class 12 • Physics");
    }

    #[test]
    fn test_identifier_prefers_object_id() {
        let paper: Paper = serde_json::from_str(r#"{"_id": "a1", "id": "b2"}"#).unwrap();
        assert_eq!(paper.identifier(), Some("a1"));
        let paper: Paper = serde_json::from_str(r#"{"id": "b2"}"#).unwrap();
        assert_eq!(paper.identifier(), Some("b2"));
    }

    #[test]
    fn test_inactive_flag() {
        let paper: Paper = serde_json::from_str(r#"{"title": "x", "isActive": false}"#).unwrap();
        assert!(!paper.is_active());
    }

    #[test]
    fn test_null_year_becomes_empty() {
        let paper: Paper = serde_json::from_str(r#"{"title": "x", "year": null}"#).unwrap();
        assert_eq!(paper.year, "");
    }

    #[test]
    fn test_float_numbers_drop_whole_fraction() {
        let paper: Paper =
            serde_json::from_str(r#"{"title": "x", "year": 2023.0, "class": 10.0}"#).unwrap();
        assert_eq!(paper.year, "2023");
        assert_eq!(paper.class, "10");

        let paper: Paper = serde_json::from_str(r#"{"title": "x", "class": 10.5}"#).unwrap();
        assert_eq!(paper.class, "10.5");
    }

    #[test]
    fn test_page_defaults_when_pagination_missing() {
        let page: PaperPage = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert_eq!(page.total(), 0);
    }
}
