//! 目录会话 - 流程层
//!
//! 持有唯一的 QueryState，把界面操作串成完整流程：
//! 操作 → apply_action → 页码校正 → ResultsController::dispatch。

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::clients::catalog_client::{CatalogTransport, HttpCatalogClient};
use crate::config::Config;
use crate::error::AppResult;
use crate::models::facet::FacetOptionsByDimension;
use crate::models::query_state::{apply_action, QueryAction, QueryState};
use crate::services::metadata_provider::MetadataProvider;
use crate::services::results_controller::{FetchStatus, ResultsController, ResultsSnapshot};

/// 目录会话
///
/// - 不直接修改 QueryState，所有变更都走 reducer
/// - 已知总条数时把页码限制在有效范围内
/// - 元数据不可用时各维度退化为空列表，不影响查询
pub struct CatalogSession<T: CatalogTransport> {
    state: QueryState,
    results: ResultsController<T>,
    metadata: MetadataProvider<T>,
}

impl CatalogSession<HttpCatalogClient> {
    /// 基于 HTTP 客户端创建会话
    pub fn connect(config: &Config) -> AppResult<Self> {
        let client = HttpCatalogClient::new(config)?;
        Ok(Self::new(Arc::new(client), config))
    }
}

impl<T: CatalogTransport> CatalogSession<T> {
    pub fn new(transport: Arc<T>, config: &Config) -> Self {
        Self {
            state: QueryState::new(config.page_size),
            results: ResultsController::new(Arc::clone(&transport), config.request_timeout()),
            metadata: MetadataProvider::new(transport),
        }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    /// 发起首次查询
    pub fn start(&self) -> Option<u64> {
        self.results.dispatch(&self.state)
    }

    /// 应用一个界面操作并按需发起查询
    ///
    /// reducer 拒绝的操作（例如页码为 0）原样返回错误，状态不变。
    pub fn apply(&mut self, action: QueryAction) -> AppResult<Option<u64>> {
        self.state = self.reduce(&self.state, action)?;
        Ok(self.results.dispatch(&self.state))
    }

    /// 依次应用多个操作，只有最终状态会被查询
    ///
    /// 任一操作被拒绝时整批不生效。
    pub fn apply_all(
        &mut self,
        actions: impl IntoIterator<Item = QueryAction>,
    ) -> AppResult<Option<u64>> {
        let mut next = self.state.clone();
        for action in actions {
            next = self.reduce(&next, action)?;
        }
        self.state = next;
        Ok(self.results.dispatch(&self.state))
    }

    /// reducer 加页码校正，不发起查询
    fn reduce(&self, state: &QueryState, action: QueryAction) -> AppResult<QueryState> {
        let pagination = action.is_pagination();
        let mut next = apply_action(state, action)?;

        if pagination {
            if let Some(last_page) = self.last_page_for(&next) {
                if next.page() > last_page {
                    debug!("页码 {} 超出范围，校正为 {}", next.page(), last_page);
                    next = apply_action(&next, QueryAction::SetPage(last_page))?;
                }
            }
        }
        Ok(next)
    }

    /// 同一组条件下已知的最后一页
    fn last_page_for(&self, state: &QueryState) -> Option<u32> {
        let snapshot = self.results.snapshot();
        let known = snapshot.state.as_ref()?;
        if snapshot.status != FetchStatus::Success || !known.same_criteria(state) {
            return None;
        }
        Some(state.total_pages(snapshot.total).max(1))
    }

    /// 当前条件下的总页数，未知时为 None
    pub fn total_pages(&self) -> Option<u32> {
        let snapshot = self.results.snapshot();
        let known = snapshot.state.as_ref()?;
        if snapshot.status == FetchStatus::Success && known.same_criteria(&self.state) {
            Some(self.state.total_pages(snapshot.total))
        } else {
            None
        }
    }

    /// 加载筛选元数据；失败时返回空列表
    pub async fn load_facet_options(&self) -> FacetOptionsByDimension {
        match self.metadata.fetch_once().await {
            Ok(options) => options,
            Err(e) => {
                warn!("筛选元数据不可用，使用空列表: {}", e);
                FacetOptionsByDimension::new()
            }
        }
    }

    /// 已加载的筛选元数据，未加载时为空
    pub fn facet_options(&self) -> FacetOptionsByDimension {
        self.metadata.cached().unwrap_or_default()
    }

    /// 新建或编辑试卷后调用
    pub async fn refresh(&self) -> Option<u64> {
        self.metadata.invalidate().await;
        self.results.refresh()
    }

    pub fn snapshot(&self) -> ResultsSnapshot {
        self.results.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResultsSnapshot> {
        self.results.subscribe()
    }

    pub async fn wait_settled(&self) -> ResultsSnapshot {
        self.results.wait_settled().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clients::memory_catalog::InMemoryCatalog;
    use crate::error::{AppError, QueryError};
    use crate::models::facet::FacetDimension;
    use crate::models::paper::Paper;

    fn session_with(count: usize, page_size: u32) -> (Arc<InMemoryCatalog>, CatalogSession<InMemoryCatalog>) {
        let papers = (0..count)
            .map(|i| Paper {
                title: format!("Paper {}", i),
                class: if i % 2 == 0 { "10" } else { "12" }.to_string(),
                subject: "Maths".to_string(),
                ..Paper::default()
            })
            .collect();
        let catalog = Arc::new(InMemoryCatalog::new(papers));
        let config = Config {
            page_size,
            ..Config::default()
        };
        let session = CatalogSession::new(Arc::clone(&catalog), &config);
        (catalog, session)
    }

    #[tokio::test]
    async fn test_start_loads_first_page() {
        let (_, session) = session_with(20, 8);
        assert!(session.start().is_some());
        let snapshot = session.wait_settled().await;
        assert_eq!(snapshot.items.len(), 8);
        assert_eq!(snapshot.total, 20);
        assert_eq!(session.total_pages(), Some(3));
    }

    #[tokio::test]
    async fn test_page_is_clamped_to_known_total() {
        let (_, mut session) = session_with(20, 8);
        session.start();
        session.wait_settled().await;

        session.apply(QueryAction::SetPage(9)).unwrap();
        assert_eq!(session.state().page(), 3);
        let snapshot = session.wait_settled().await;
        assert_eq!(snapshot.items.len(), 4);
    }

    #[tokio::test]
    async fn test_page_not_clamped_while_total_unknown() {
        let (_, mut session) = session_with(20, 8);
        session
            .apply(QueryAction::SetFacet(FacetDimension::Class, "10".into()))
            .unwrap();
        session.apply(QueryAction::SetPage(9)).unwrap();
        assert_eq!(session.state().page(), 9);

        let snapshot = session.wait_settled().await;
        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.total, 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_apply_all_fetches_final_state_only() {
        let papers = (0..12)
            .map(|i| Paper {
                title: format!("Paper {}", i),
                class: if i % 2 == 0 { "10" } else { "12" }.to_string(),
                subject: if i % 3 == 0 { "Maths" } else { "Physics" }.to_string(),
                ..Paper::default()
            })
            .collect();
        let catalog = Arc::new(InMemoryCatalog::new(papers).with_latency(Duration::from_millis(30)));
        let mut session = CatalogSession::new(Arc::clone(&catalog), &Config::default());

        let token = session
            .apply_all(vec![
                QueryAction::SetFacet(FacetDimension::Class, "10".into()),
                QueryAction::SetFacet(FacetDimension::Subject, "Maths".into()),
                QueryAction::SetSort("Year (Newest)".into()),
                QueryAction::SetSearch("paper".into()),
            ])
            .unwrap();
        assert_eq!(token, Some(1));

        let snapshot = session.wait_settled().await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(catalog.paper_requests(), 1);
        assert_eq!(snapshot.state.as_ref(), Some(session.state()));
        assert_eq!(snapshot.total, 2);
    }

    #[tokio::test]
    async fn test_apply_all_rejects_batch_atomically() {
        let (catalog, mut session) = session_with(5, 8);
        let before = session.state().clone();
        let result = session.apply_all(vec![
            QueryAction::SetFacet(FacetDimension::Class, "10".into()),
            QueryAction::SetPage(0),
        ]);
        assert!(result.is_err());
        assert_eq!(session.state(), &before);
        assert_eq!(catalog.paper_requests(), 0);
    }

    #[tokio::test]
    async fn test_rejected_action_leaves_state_unchanged() {
        let (catalog, mut session) = session_with(5, 8);
        let before = session.state().clone();
        let err = session.apply(QueryAction::SetPage(0)).unwrap_err();
        assert!(matches!(err, AppError::Query(QueryError::InvalidArgument { .. })));
        assert_eq!(session.state(), &before);
        assert_eq!(catalog.paper_requests(), 0);
    }

    #[tokio::test]
    async fn test_unchanged_state_does_not_refetch() {
        let (catalog, mut session) = session_with(5, 8);
        session.start();
        session.wait_settled().await;

        let class = QueryAction::SetFacet(FacetDimension::Class, "10".into());
        session.apply(class.clone()).unwrap();
        session.wait_settled().await;
        assert_eq!(session.apply(QueryAction::SetSearch(String::new())).unwrap(), None);
        session.apply(class).unwrap();
        let snapshot = session.wait_settled().await;

        assert_eq!(snapshot.total, 5);
        assert_eq!(catalog.paper_requests(), 3);
    }

    #[tokio::test]
    async fn test_facet_options_fall_back_to_empty() {
        let (catalog, session) = session_with(4, 8);
        catalog.set_failure(Some("metadata offline"));
        assert!(session.load_facet_options().await.is_empty());
        assert!(session.facet_options().is_empty());

        catalog.set_failure(None);
        let options = session.load_facet_options().await;
        assert_eq!(options.get(FacetDimension::Class).len(), 2);
        assert_eq!(session.facet_options(), options);
    }

    #[tokio::test]
    async fn test_refresh_refetches_results_and_metadata() {
        let (catalog, session) = session_with(4, 8);
        session.start();
        session.wait_settled().await;
        session.load_facet_options().await;

        assert!(session.refresh().await.is_some());
        session.wait_settled().await;
        session.load_facet_options().await;

        assert_eq!(catalog.paper_requests(), 2);
        assert_eq!(catalog.metadata_requests(), 2);
    }
}
