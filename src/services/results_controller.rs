//! 结果控制器 - 业务能力层
//!
//! 把 QueryState 变成一页结果，状态机 `Idle → Loading → {Success, Error}`。
//!
//! 每次发起查询都会生成递增的 token，只有 token 等于当前值的响应才会被发布；
//! 新查询会中止仍在进行的旧任务，不排队、不重试。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::clients::catalog_client::CatalogTransport;
use crate::error::ApiError;
use crate::models::paper::{Paper, PaperPage};
use crate::models::query_state::QueryState;
use crate::services::query_builder::build;

/// 查询状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// 对外发布的结果快照
///
/// 出错时保留上一次成功的 `items` 和 `total`，只更新 `error`。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultsSnapshot {
    pub status: FetchStatus,
    pub items: Vec<Paper>,
    pub total: u64,
    pub error: Option<String>,
    /// 最近一次发起查询时的状态
    pub state: Option<QueryState>,
    pub token: u64,
}

impl ResultsSnapshot {
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }
}

#[derive(Default)]
struct Inner {
    token: u64,
    state: Option<QueryState>,
    task: Option<JoinHandle<()>>,
}

struct Shared {
    inner: Mutex<Inner>,
    tx: watch::Sender<ResultsSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 处理一次响应；token 已过期时丢弃并返回 false
    fn complete(&self, token: u64, result: Result<PaperPage, ApiError>) -> bool {
        let mut inner = self.lock();
        if inner.token != token {
            debug!("丢弃过期响应 #{} (当前 #{})", token, inner.token);
            return false;
        }
        inner.task = None;

        match result {
            Ok(page) => {
                info!("✅ 查询 #{} 完成: {} 条 / 共 {} 条", token, page.items.len(), page.total());
                self.tx.send_modify(|snapshot| {
                    snapshot.status = FetchStatus::Success;
                    snapshot.total = page.pagination.total;
                    snapshot.items = page.items;
                    snapshot.error = None;
                });
            }
            Err(e) => {
                warn!("❌ 查询 #{} 失败: {}", token, e);
                self.tx.send_modify(|snapshot| {
                    snapshot.status = FetchStatus::Error;
                    snapshot.error = Some(e.to_string());
                });
            }
        }
        true
    }
}

/// 结果控制器
///
/// 职责：
/// - 对不同的 QueryState 发起查询
/// - 保证只发布最后一次查询的结果
/// - 通过 watch 通道向订阅者推送快照
pub struct ResultsController<T: CatalogTransport> {
    transport: Arc<T>,
    timeout: Duration,
    shared: Arc<Shared>,
}

impl<T: CatalogTransport> ResultsController<T> {
    /// 创建新的控制器，`timeout` 限制每次查询的总耗时
    pub fn new(transport: Arc<T>, timeout: Duration) -> Self {
        let (tx, _rx) = watch::channel(ResultsSnapshot::default());
        Self {
            transport,
            timeout,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::default()),
                tx,
            }),
        }
    }

    /// 提交新的查询状态
    ///
    /// 与当前状态相同且未出错时不做任何事，返回 None；
    /// 否则发起查询并返回新的 token。出错后重复提交相同状态即为重试。
    pub fn dispatch(&self, state: &QueryState) -> Option<u64> {
        let mut inner = self.shared.lock();
        let status = self.shared.tx.borrow().status;
        if inner.state.as_ref() == Some(state) && status != FetchStatus::Error {
            debug!("状态未变化，跳过查询 {}", state);
            return None;
        }
        Some(self.start(&mut inner, state.clone()))
    }

    /// 强制重新查询当前状态；还没有查询过时返回 None
    pub fn refresh(&self) -> Option<u64> {
        let mut inner = self.shared.lock();
        let state = inner.state.clone()?;
        info!("🔄 刷新查询结果");
        Some(self.start(&mut inner, state))
    }

    fn start(&self, inner: &mut Inner, state: QueryState) -> u64 {
        inner.token += 1;
        let token = inner.token;

        if let Some(previous) = inner.task.take() {
            previous.abort();
        }

        let request = build(&state);
        info!("🔍 查询 #{} {}", token, state);
        debug!("请求参数: {}", request);

        inner.state = Some(state.clone());
        self.shared.tx.send_modify(|snapshot| {
            snapshot.status = FetchStatus::Loading;
            snapshot.state = Some(state);
            snapshot.token = token;
        });

        let transport = Arc::clone(&self.transport);
        let shared = Arc::clone(&self.shared);
        let timeout = self.timeout;
        let endpoint = self.transport.list_endpoint().to_string();

        // 任务完成时需要拿锁，调用方持锁期间它只会等待
        inner.task = Some(tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, transport.fetch_papers(&request)).await {
                Ok(result) => result,
                Err(_) => Err(ApiError::Timeout { endpoint, timeout }),
            };
            shared.complete(token, result);
        }));

        token
    }

    /// 当前快照
    pub fn snapshot(&self) -> ResultsSnapshot {
        self.shared.tx.borrow().clone()
    }

    /// 订阅快照变化
    pub fn subscribe(&self) -> watch::Receiver<ResultsSnapshot> {
        self.shared.tx.subscribe()
    }

    /// 等待当前查询结束（Success / Error），空闲时立即返回
    pub async fn wait_settled(&self) -> ResultsSnapshot {
        let mut rx = self.shared.tx.subscribe();
        let settled = match rx.wait_for(|snapshot| !snapshot.is_loading()).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        };
        settled
    }
}

impl<T: CatalogTransport> Drop for ResultsController<T> {
    fn drop(&mut self) {
        if let Some(task) = self.shared.lock().task.take() {
            task.abort();
        }
    }
}
