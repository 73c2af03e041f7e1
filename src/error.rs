use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 查询状态相关错误（调用方编程错误）
    #[error("查询错误: {0}")]
    Query(#[from] QueryError),
    /// API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 查询状态错误
///
/// 只由 reducer 产生，不涉及任何 I/O
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// 非法参数，例如页码小于 1
    #[error("非法参数 {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
}

/// API 调用错误
///
/// 只有 ResultsController / MetadataProvider 会产生这一类错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 服务器返回非 2xx 状态码
    #[error("API返回错误状态 ({endpoint}): {status}")]
    BadStatus { endpoint: String, status: u16 },
    /// 响应信封中 isSuccess 为 false
    #[error("{}", .message.as_deref().unwrap_or("请求未成功"))]
    ApplicationFailure {
        endpoint: String,
        message: Option<String>,
    },
    /// 请求超时
    #[error("API请求超时 ({endpoint}), 已等待 {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },
    /// JSON 解析失败
    #[error("JSON解析失败: {source}")]
    JsonParseFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApiError {
    /// 是否属于传输层失败（网络、状态码、超时）
    pub fn is_transport_failure(&self) -> bool {
        !matches!(self, ApiError::ApplicationFailure { .. })
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed {
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(ConfigError::TomlParseFailed {
            path: String::new(), // TOML错误通常不包含路径信息
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.path().to_string())
            .unwrap_or_default();
        if err.is_decode() {
            ApiError::JsonParseFailed {
                source: Box::new(err),
            }
        } else if let Some(status) = err.status() {
            ApiError::BadStatus {
                endpoint,
                status: status.as_u16(),
            }
        } else {
            ApiError::RequestFailed {
                endpoint,
                source: Box::new(err),
            }
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建页码非法错误
    pub fn invalid_page(page: u32) -> Self {
        AppError::Query(QueryError::invalid_page(page))
    }

    /// 创建API请求失败错误
    pub fn api_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建配置值非法错误
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        AppError::Config(ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        })
    }
}

impl QueryError {
    pub fn invalid_page(page: u32) -> Self {
        QueryError::InvalidArgument {
            name: "page",
            reason: format!("页码必须 >= 1, 实际为 {}", page),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
