use std::sync::Arc;
use std::time::Duration;

use paper_catalog::cli::parse_actions;
use paper_catalog::models::FacetOption;
use paper_catalog::utils::logging;
use paper_catalog::{
    CatalogSession, Config, FacetDimension, FetchStatus, InMemoryCatalog, Paper, QueryAction,
};

fn paper(title: &str, class: &str, subject: &str, year: &str, exam_type: &str) -> Paper {
    Paper {
        title: title.to_string(),
        class: class.to_string(),
        subject: subject.to_string(),
        board: "CBSE".to_string(),
        year: year.to_string(),
        exam_type: exam_type.to_string(),
        ..Paper::default()
    }
}

fn sample_papers() -> Vec<Paper> {
    let mut papers = Vec::new();
    for year in 2015..2025 {
        let year = year.to_string();
        papers.push(paper(&format!("Class 10 Maths {}", year), "10", "Maths", &year, "Board"));
        papers.push(paper(&format!("Class 10 Physics {}", year), "10", "Physics", &year, "Mock"));
        papers.push(paper(&format!("Class 12 Chemistry {}", year), "12", "Chemistry", &year, "Board"));
    }
    papers
}

fn config() -> Config {
    Config {
        page_size: 8,
        request_timeout_secs: 5,
        ..Config::default()
    }
}

#[tokio::test]
async fn test_browse_filter_search_and_paginate() {
    logging::init(false);

    let catalog = Arc::new(InMemoryCatalog::new(sample_papers()).with_latency(Duration::from_millis(5)));
    let mut session = CatalogSession::new(Arc::clone(&catalog), &config());

    // 首屏
    session.start();
    let snapshot = session.wait_settled().await;
    assert_eq!(snapshot.status, FetchStatus::Success);
    assert_eq!(snapshot.total, 30);
    assert_eq!(snapshot.items.len(), 8);
    assert_eq!(session.total_pages(), Some(4));

    // 筛选元数据
    let options = session.load_facet_options().await;
    assert_eq!(
        options.get(FacetDimension::Class),
        [FacetOption::new("10", 20), FacetOption::new("12", 10)]
    );
    assert_eq!(options.get(FacetDimension::Year).len(), 10);

    // 选 Class 10，翻到第 3 页
    session
        .apply(QueryAction::SetFacet(FacetDimension::Class, "10".to_string()))
        .unwrap();
    session.apply(QueryAction::SetPage(3)).unwrap();
    let snapshot = session.wait_settled().await;
    assert_eq!(session.state().page(), 3);
    assert_eq!(snapshot.total, 20);
    assert_eq!(snapshot.items.len(), 4);

    // 搜索回到第 1 页，筛选保留
    session
        .apply(QueryAction::SetSearch("physics".to_string()))
        .unwrap();
    let snapshot = session.wait_settled().await;
    assert_eq!(session.state().page(), 1);
    assert!(session.state().facet(FacetDimension::Class).contains("10"));
    assert_eq!(snapshot.total, 10);
    assert!(snapshot.items.iter().all(|p| p.subject == "Physics"));

    // 按年份从新到旧
    session
        .apply(QueryAction::SetSort("Year (Newest)".to_string()))
        .unwrap();
    let snapshot = session.wait_settled().await;
    assert_eq!(snapshot.items[0].year, "2024");
    assert_eq!(snapshot.items[7].year, "2017");
}

#[tokio::test]
async fn test_rapid_actions_publish_only_final_state() {
    let catalog = Arc::new(InMemoryCatalog::new(sample_papers()).with_latency(Duration::from_millis(20)));
    let mut session = CatalogSession::new(Arc::clone(&catalog), &config());

    let actions = parse_actions(["subject=Maths", "subject=Chemistry", "examType=Board", "search=2019"]).unwrap();
    session.apply_all(actions).unwrap();
    let snapshot = session.wait_settled().await;

    assert_eq!(snapshot.status, FetchStatus::Success);
    assert_eq!(snapshot.state.as_ref(), Some(session.state()));
    assert_eq!(snapshot.total, 1);
    assert_eq!(snapshot.items[0].title, "Class 12 Chemistry 2019");
}

#[tokio::test]
async fn test_failure_keeps_previous_results_until_retry() {
    let catalog = Arc::new(InMemoryCatalog::new(sample_papers()));
    let session = CatalogSession::new(Arc::clone(&catalog), &config());

    session.start();
    let good = session.wait_settled().await;

    catalog.set_failure(Some("Service temporarily unavailable"));
    session.refresh().await;
    let failed = session.wait_settled().await;
    assert_eq!(failed.status, FetchStatus::Error);
    assert_eq!(failed.error.as_deref(), Some("Service temporarily unavailable"));
    assert_eq!(failed.items, good.items);

    catalog.set_failure(None);
    assert!(session.start().is_some());
    let recovered = session.wait_settled().await;
    assert_eq!(recovered.status, FetchStatus::Success);
    assert!(recovered.error.is_none());
}

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_live_catalog() {
    // 初始化日志
    let _ = tracing_subscriber::fmt::try_init();

    // 加载配置
    let config = Config::from_env();

    let mut session = CatalogSession::connect(&config).expect("创建客户端失败");
    let options = session.load_facet_options().await;
    println!("筛选选项: {} 个", options.option_count());

    session.start();
    let snapshot = session.wait_settled().await;
    assert_eq!(snapshot.status, FetchStatus::Success, "{:?}", snapshot.error);
    assert!(snapshot.items.len() <= config.page_size as usize);

    session.apply(QueryAction::SetSort("Year (Newest)".to_string())).unwrap();
    let snapshot = session.wait_settled().await;
    assert_eq!(snapshot.status, FetchStatus::Success, "{:?}", snapshot.error);
}
