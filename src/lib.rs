//! # Paper Catalog
//!
//! 试卷目录的查询控制核心：筛选、搜索、排序、分页，以及最后一次请求获胜的结果加载
//!
//! ## 架构设计
//!
//! ### ① 模型层（Models）
//! - `models/` - 纯数据和纯函数，不做 I/O
//! - `FacetSet` / `QueryState` - 查询条件，唯一的变更入口是 `apply_action`
//! - `SortRegistry` - 排序标签与排序键的静态映射
//!
//! ### ② 客户端层（Clients）
//! - `clients/` - 目录数据来源，统一实现 `CatalogTransport`
//! - `HttpCatalogClient` - 列表接口和元数据接口
//! - `InMemoryCatalog` - 本地内存目录，用于演示和测试
//!
//! ### ③ 业务能力层（Services）
//! - `query_builder` - QueryState → 请求参数
//! - `ResultsController` - token 机制丢弃过期响应，发布结果快照
//! - `MetadataProvider` - 筛选元数据，只请求一次
//!
//! ### ④ 流程层（Workflow）
//! - `CatalogSession` - 持有 QueryState，串联 reducer、查询和元数据
//!
//! ## 模块结构

pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{CatalogTransport, HttpCatalogClient, InMemoryCatalog};
pub use config::Config;
pub use error::{ApiError, AppError, AppResult, QueryError};
pub use models::{apply_action, FacetDimension, FacetSet, Paper, QueryAction, QueryState, SortKey, SortRegistry};
pub use services::{build, FetchStatus, MetadataProvider, ResultsController, ResultsSnapshot};
pub use workflow::CatalogSession;
