/// 试卷目录 API 客户端
///
/// 封装列表接口和筛选元数据接口的调用逻辑
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, AppResult};
use crate::models::facet::{FacetDimension, FacetOption, FacetOptionsByDimension};
use crate::models::paper::PaperPage;
use crate::services::query_builder::RequestDescriptor;

/// 目录数据来源
///
/// ResultsController 和 MetadataProvider 只依赖这个接口，
/// 测试中用内存实现替换 HTTP。
pub trait CatalogTransport: Send + Sync + 'static {
    /// 查询一页试卷
    fn fetch_papers<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> BoxFuture<'a, Result<PaperPage, ApiError>>;

    /// 查询各筛选维度的可选值
    fn fetch_metadata(&self) -> BoxFuture<'_, Result<FacetOptionsByDimension, ApiError>>;

    /// 列表接口名称，用于错误信息
    fn list_endpoint(&self) -> &str {
        "papers/admin/list"
    }
}

impl<T: CatalogTransport> CatalogTransport for Arc<T> {
    fn fetch_papers<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> BoxFuture<'a, Result<PaperPage, ApiError>> {
        (**self).fetch_papers(request)
    }

    fn fetch_metadata(&self) -> BoxFuture<'_, Result<FacetOptionsByDimension, ApiError>> {
        (**self).fetch_metadata()
    }

    fn list_endpoint(&self) -> &str {
        (**self).list_endpoint()
    }
}

/// 接口统一的响应信封 `{ isSuccess, message?, data }`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub is_success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// isSuccess 为 true 且 data 存在才算成功
    pub fn into_result(self, endpoint: &str) -> Result<T, ApiError> {
        match (self.is_success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(ApiError::ApplicationFailure {
                endpoint: endpoint.to_string(),
                message: self.message,
            }),
        }
    }
}

/// 元数据接口的 data 部分
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataPayload {
    pub classes: Vec<FacetOption>,
    pub subjects: Vec<FacetOption>,
    pub boards: Vec<FacetOption>,
    pub years: Vec<FacetOption>,
    pub exam_types: Vec<FacetOption>,
}

impl From<MetadataPayload> for FacetOptionsByDimension {
    fn from(payload: MetadataPayload) -> Self {
        let mut options = FacetOptionsByDimension::new();
        options.insert(FacetDimension::Class, payload.classes);
        options.insert(FacetDimension::Subject, payload.subjects);
        options.insert(FacetDimension::Board, payload.boards);
        options.insert(FacetDimension::Year, payload.years);
        options.insert(FacetDimension::ExamType, payload.exam_types);
        options
    }
}

/// 基于 reqwest 的目录客户端
pub struct HttpCatalogClient {
    http: reqwest::Client,
    list_url: String,
    metadata_url: String,
    list_endpoint: String,
    metadata_endpoint: String,
    timeout: Duration,
}

impl HttpCatalogClient {
    /// 创建新的目录客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));

        // 未登录时不带 Authorization，列表接口允许匿名读取
        if let Some(token) = config.auth_token.as_deref() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| crate::error::AppError::invalid_config("auth_token", e.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| crate::error::AppError::api_request_failed(&config.api_base_url, e))?;

        Ok(Self {
            http,
            list_url: config.endpoint_url(&config.list_endpoint),
            metadata_url: config.endpoint_url(&config.metadata_endpoint),
            list_endpoint: config.list_endpoint.clone(),
            metadata_endpoint: config.metadata_endpoint.clone(),
            timeout: config.request_timeout(),
        })
    }

    /// 发送 GET 请求并解开响应信封
    async fn get_envelope<T: DeserializeOwned>(
        &self,
        url: reqwest::Url,
        endpoint: &str,
    ) -> Result<T, ApiError> {
        debug!("GET {}", url);

        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout {
                    endpoint: endpoint.to_string(),
                    timeout: self.timeout,
                }
            } else {
                ApiError::RequestFailed {
                    endpoint: endpoint.to_string(),
                    source: Box::new(e),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::BadStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let envelope: ApiEnvelope<T> = response.json().await?;
        envelope.into_result(endpoint)
    }
}

impl CatalogTransport for HttpCatalogClient {
    fn list_endpoint(&self) -> &str {
        &self.list_endpoint
    }

    fn fetch_papers<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> BoxFuture<'a, Result<PaperPage, ApiError>> {
        async move {
            let url = request.to_url(&self.list_url)?;
            self.get_envelope::<PaperPage>(url, &self.list_endpoint).await
        }
        .boxed()
    }

    fn fetch_metadata(&self) -> BoxFuture<'_, Result<FacetOptionsByDimension, ApiError>> {
        async move {
            let url = reqwest::Url::parse(&self.metadata_url).map_err(|e| ApiError::RequestFailed {
                endpoint: self.metadata_endpoint.clone(),
                source: Box::new(e),
            })?;
            let payload = self
                .get_envelope::<MetadataPayload>(url, &self.metadata_endpoint)
                .await?;
            Ok(payload.into())
        }
        .boxed()
    }
}
