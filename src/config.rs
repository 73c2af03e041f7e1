use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, ConfigError};

/// 程序配置文件
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 试卷 API 配置 ---
    /// API 根地址
    pub api_base_url: String,
    /// 试卷列表接口（相对路径）
    pub list_endpoint: String,
    /// 筛选元数据接口（相对路径）
    pub metadata_endpoint: String,
    /// 登录后的 Bearer token，未登录时为空
    pub auth_token: Option<String>,
    // --- 查询配置 ---
    /// 每页条数，整个会话内不变
    pub page_size: u32,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            list_endpoint: "papers/admin/list".to_string(),
            metadata_endpoint: "papers/metadata".to_string(),
            auth_token: None,
            page_size: 8,
            request_timeout_secs: 15,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 从环境变量读取配置，未设置的项使用默认值
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 用环境变量覆盖已有配置
    pub fn with_env_overrides(self) -> Self {
        Self {
            api_base_url: std::env::var("CATALOG_API_BASE_URL").unwrap_or(self.api_base_url),
            list_endpoint: std::env::var("CATALOG_LIST_ENDPOINT").unwrap_or(self.list_endpoint),
            metadata_endpoint: std::env::var("CATALOG_METADATA_ENDPOINT").unwrap_or(self.metadata_endpoint),
            auth_token: std::env::var("CATALOG_AUTH_TOKEN").ok().filter(|t| !t.trim().is_empty()).or(self.auth_token),
            page_size: std::env::var("CATALOG_PAGE_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(self.page_size),
            request_timeout_secs: std::env::var("CATALOG_REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.request_timeout_secs),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(self.verbose_logging),
        }
    }

    /// 从 TOML 文件加载配置，缺失的字段使用默认值
    pub async fn load_toml(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;

        let config = Self::from_toml_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;

        Ok(config)
    }

    /// 从 TOML 文本解析配置
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> AppResult<()> {
        if self.page_size == 0 {
            return Err(AppError::invalid_config("page_size", "每页条数必须大于 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::invalid_config("request_timeout_secs", "超时时间必须大于 0"));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(AppError::Config(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "API 根地址不能为空".to_string(),
            }));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 拼接完整的接口地址
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_dashboard() {
        let config = Config::default();
        assert_eq!(config.page_size, 8);
        assert_eq!(config.list_endpoint, "papers/admin/list");
        assert_eq!(config.metadata_endpoint, "papers/metadata");
        assert!(config.auth_token.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_fills_missing_fields() {
        let config = Config::from_toml_str(
            r#"
            api_base_url = "https://example.org/api/"
            page_size = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.page_size, 12);
        assert_eq!(config.request_timeout_secs, 15);
        assert_eq!(
            config.endpoint_url(&config.list_endpoint),
            "https://example.org/api/papers/admin/list"
        );
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = Config::from_toml_str("page_size = 0").unwrap_err();
        assert!(matches!(
            err,
            AppError::Config(ConfigError::InvalidValue { field: "page_size", .. })
        ));
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = Config::from_toml_str("page_size = \"eight\"").unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::TomlParseFailed { .. })));
    }
}
