//! 内存目录
//!
//! 在本地对一组试卷执行筛选、搜索、排序和分页，行为与列表接口一致。
//! 用于离线演示和测试；可以注入延迟和失败。

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::clients::catalog_client::CatalogTransport;
use crate::error::ApiError;
use crate::models::facet::{FacetDimension, FacetOption, FacetOptionsByDimension};
use crate::models::paper::{Pagination, Paper, PaperPage};
use crate::models::sort::{SortKey, SortRegistry};
use crate::services::query_builder::RequestDescriptor;

const LIST_ENDPOINT: &str = "memory/papers";
const METADATA_ENDPOINT: &str = "memory/metadata";

/// 内存目录
pub struct InMemoryCatalog {
    papers: Vec<Paper>,
    latency: Option<Duration>,
    failure: Mutex<Option<String>>,
    paper_requests: AtomicUsize,
    metadata_requests: AtomicUsize,
}

impl InMemoryCatalog {
    pub fn new(papers: Vec<Paper>) -> Self {
        Self {
            papers,
            latency: None,
            failure: Mutex::new(None),
            paper_requests: AtomicUsize::new(0),
            metadata_requests: AtomicUsize::new(0),
        }
    }

    /// 每次请求前等待一段时间
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// 之后的请求都以 `isSuccess: false` 失败；传 None 恢复
    pub fn set_failure(&self, message: Option<&str>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = message.map(str::to_string);
        }
    }

    /// 已收到的列表请求数
    pub fn paper_requests(&self) -> usize {
        self.paper_requests.load(AtomicOrdering::SeqCst)
    }

    /// 已收到的元数据请求数
    pub fn metadata_requests(&self) -> usize {
        self.metadata_requests.load(AtomicOrdering::SeqCst)
    }

    fn current_failure(&self, endpoint: &str) -> Result<(), ApiError> {
        let message = self.failure.lock().ok().and_then(|f| f.clone());
        match message {
            Some(message) => Err(ApiError::ApplicationFailure {
                endpoint: endpoint.to_string(),
                message: Some(message),
            }),
            None => Ok(()),
        }
    }

    /// 按请求参数执行查询
    pub fn query(&self, request: &RequestDescriptor) -> PaperPage {
        let search = request.get("search").map(str::to_lowercase);

        let mut matched: Vec<&Paper> = self
            .papers
            .iter()
            .filter(|paper| {
                FacetDimension::ALL.into_iter().all(|dim| {
                    match request.get(dim.param_name()) {
                        // 同一维度的多个值按"或"处理
                        Some(values) => values.split(',').any(|v| facet_value(paper, dim) == v),
                        None => true,
                    }
                })
            })
            .filter(|paper| match &search {
                Some(term) => matches_search(paper, term),
                None => true,
            })
            .collect();

        let sort_key = request
            .get("sortBy")
            .map(SortRegistry::resolve)
            .unwrap_or_default();
        sort_papers(&mut matched, sort_key);

        let total = matched.len() as u64;
        let offset = parse_param(request, "offset").unwrap_or(0);
        let limit = parse_param(request, "limit").unwrap_or(usize::MAX);

        PaperPage {
            items: matched.into_iter().skip(offset).take(limit).cloned().collect(),
            pagination: Pagination { total },
        }
    }

    /// 统计各维度的可选值
    pub fn facet_options(&self) -> FacetOptionsByDimension {
        let mut options = FacetOptionsByDimension::new();
        for dim in FacetDimension::ALL {
            let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
            for paper in &self.papers {
                let value = facet_value(paper, dim);
                if !value.is_empty() {
                    *counts.entry(value).or_default() += 1;
                }
            }
            options.insert(
                dim,
                counts
                    .into_iter()
                    .map(|(name, count)| FacetOption::new(name, count))
                    .collect(),
            );
        }
        options
    }
}

impl CatalogTransport for InMemoryCatalog {
    fn list_endpoint(&self) -> &str {
        LIST_ENDPOINT
    }

    fn fetch_papers<'a>(
        &'a self,
        request: &'a RequestDescriptor,
    ) -> BoxFuture<'a, Result<PaperPage, ApiError>> {
        async move {
            self.paper_requests.fetch_add(1, AtomicOrdering::SeqCst);
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            self.current_failure(LIST_ENDPOINT)?;
            Ok(self.query(request))
        }
        .boxed()
    }

    fn fetch_metadata(&self) -> BoxFuture<'_, Result<FacetOptionsByDimension, ApiError>> {
        async move {
            self.metadata_requests.fetch_add(1, AtomicOrdering::SeqCst);
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            self.current_failure(METADATA_ENDPOINT)?;
            Ok(self.facet_options())
        }
        .boxed()
    }
}

fn facet_value(paper: &Paper, dimension: FacetDimension) -> &str {
    match dimension {
        FacetDimension::Class => &paper.class,
        FacetDimension::Subject => &paper.subject,
        FacetDimension::Board => &paper.board,
        FacetDimension::Year => &paper.year,
        FacetDimension::ExamType => &paper.exam_type,
    }
}

fn matches_search(paper: &Paper, term: &str) -> bool {
    paper.title.to_lowercase().contains(term)
        || paper
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(term))
        || paper.subject.to_lowercase().contains(term)
        || paper.tags.iter().any(|t| t.to_lowercase().contains(term))
}

fn parse_param(request: &RequestDescriptor, name: &str) -> Option<usize> {
    request.get(name).and_then(|v| v.parse().ok())
}

/// 数字优先比较，"9" < "10"
fn compare_mixed(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

fn sort_papers(papers: &mut [&Paper], key: SortKey) {
    // 稳定排序，相同值保持创建顺序
    match key {
        SortKey::CreatedAt => {}
        SortKey::YearAsc => papers.sort_by(|a, b| compare_mixed(&a.year, &b.year)),
        SortKey::YearDesc => papers.sort_by(|a, b| compare_mixed(&b.year, &a.year)),
        SortKey::ClassAsc => papers.sort_by(|a, b| compare_mixed(&a.class, &b.class)),
        SortKey::ClassDesc => papers.sort_by(|a, b| compare_mixed(&b.class, &a.class)),
        SortKey::SubjectAsc => papers.sort_by(|a, b| a.subject.cmp(&b.subject)),
        SortKey::SubjectDesc => papers.sort_by(|a, b| b.subject.cmp(&a.subject)),
    }
}
