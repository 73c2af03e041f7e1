//! 筛选元数据 - 业务能力层
//!
//! 每个维度的可选值和数量只在首次需要时请求一次，之后从缓存读取。

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::clients::catalog_client::CatalogTransport;
use crate::error::ApiError;
use crate::models::facet::FacetOptionsByDimension;

/// 元数据提供者
///
/// 只缓存成功的结果；失败返回错误并记录警告，下次调用会重新请求。
/// 并发调用共享同一次请求。
pub struct MetadataProvider<T: CatalogTransport> {
    transport: Arc<T>,
    cache: Mutex<Option<FacetOptionsByDimension>>,
}

impl<T: CatalogTransport> MetadataProvider<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            cache: Mutex::new(None),
        }
    }

    /// 获取各维度的可选值
    pub async fn fetch_once(&self) -> Result<FacetOptionsByDimension, ApiError> {
        // 持锁期间完成请求，后到的调用方直接读缓存
        let mut cache = self.cache.lock().await;
        if let Some(options) = cache.as_ref() {
            return Ok(options.clone());
        }

        match self.transport.fetch_metadata().await {
            Ok(options) => {
                info!("📋 已加载筛选元数据: {} 个选项", options.option_count());
                *cache = Some(options.clone());
                Ok(options)
            }
            Err(e) => {
                warn!("⚠️ 加载筛选元数据失败: {}", e);
                Err(e)
            }
        }
    }

    /// 已缓存的结果；尚未加载或正在加载时返回 None
    pub fn cached(&self) -> Option<FacetOptionsByDimension> {
        self.cache.try_lock().ok().and_then(|cache| cache.clone())
    }

    /// 清空缓存，下次调用重新请求
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }
}
