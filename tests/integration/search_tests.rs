//! Paginated search against scripted result pages

use crate::mock::*;
use futures_util::StreamExt;
use linkreach::automation::AutomationError;
use linkreach::search::{NetworkDistance, SearchCollector, SearchParams};
use linkreach::LinkreachError;

fn search_navigations(site: &MockSite) -> Vec<String> {
    site.navigations()
        .into_iter()
        .filter(|url| url.contains("/search/results/people/"))
        .collect()
}

fn ids(records: &[linkreach::ProfileRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_page_count_follows_limit() {
    let site = MockSite::new(SiteScript::default());
    let browser = MockBrowser::new(site.clone());
    let settings = test_settings();
    let limiter = limiter(&settings);

    let records = SearchCollector::new(&settings, &browser, &limiter)
        .collect(SearchParams::new("rust"), 25)
        .await
        .unwrap();

    assert!(records.is_empty());
    let pages = search_navigations(&site);
    assert_eq!(pages.len(), 3);
    assert!(pages[0].ends_with("page=1"));
    assert!(pages[1].ends_with("page=2"));
    assert!(pages[2].ends_with("page=3"));
}

#[tokio::test(start_paused = true)]
async fn test_failing_page_is_skipped() {
    let site = MockSite::new(
        SiteScript::default()
            .search_page(1, &["a1", "a2"])
            .failing_search_page(2)
            .search_page(3, &["c1", "c2"]),
    );
    let browser = MockBrowser::new(site.clone());
    let settings = test_settings();
    let limiter = limiter(&settings);

    let records = SearchCollector::new(&settings, &browser, &limiter)
        .collect(SearchParams::new("rust"), 25)
        .await
        .unwrap();

    assert_eq!(ids(&records), vec!["a1", "a2", "c1", "c2"]);
    assert_eq!(search_navigations(&site).len(), 3);
    assert_eq!(site.opened_pages(), 3);
    assert_eq!(site.open_pages(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_search_end_to_end_in_page_order() {
    let site = MockSite::new(
        SiteScript::default()
            .search_page(1, &["ana", "bruno"])
            .search_page(2, &["carla", "duarte"]),
    );
    let browser = MockBrowser::new(site.clone());
    let settings = test_settings();
    let limiter = limiter(&settings);

    let params = SearchParams::new("data analyst").with_network([NetworkDistance::Second]);
    let records = SearchCollector::new(&settings, &browser, &limiter)
        .collect(params, 20)
        .await
        .unwrap();

    assert_eq!(ids(&records), vec!["ana", "bruno", "carla", "duarte"]);
    assert_eq!(records[0].name, "Person ana");
    assert_eq!(records[0].current_state_label.as_deref(), Some("Connect"));

    let pages = search_navigations(&site);
    assert_eq!(pages.len(), 2);
    assert!(pages[0].contains("keywords=data+analyst"));
    assert!(pages[0].contains("network=%5B%22S%22%5D"));
}

#[tokio::test(start_paused = true)]
async fn test_results_truncated_to_limit() {
    let site = MockSite::new(SiteScript::default().search_page(
        1,
        &["p0", "p1", "p2", "p3", "p4", "p5", "p6", "p7", "p8", "p9"],
    ));
    let browser = MockBrowser::new(site.clone());
    let settings = test_settings();
    let limiter = limiter(&settings);

    let records = SearchCollector::new(&settings, &browser, &limiter)
        .collect(SearchParams::new("rust"), 5)
        .await
        .unwrap();

    assert_eq!(records.len(), 5);
    assert_eq!(search_navigations(&site).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_duplicates_across_pages_are_kept() {
    let site = MockSite::new(
        SiteScript::default()
            .search_page(1, &["same", "other"])
            .search_page(2, &["same"]),
    );
    let browser = MockBrowser::new(site.clone());
    let settings = test_settings();
    let limiter = limiter(&settings);

    let records = SearchCollector::new(&settings, &browser, &limiter)
        .collect(SearchParams::new("rust"), 20)
        .await
        .unwrap();

    assert_eq!(ids(&records), vec!["same", "other", "same"]);
}

#[tokio::test(start_paused = true)]
async fn test_stream_fetches_pages_lazily() {
    let site = MockSite::new(
        SiteScript::default()
            .search_page(1, &["a1"])
            .search_page(2, &["b1"]),
    );
    let browser = MockBrowser::new(site.clone());
    let settings = test_settings();
    let limiter = limiter(&settings);

    let mut stream = SearchCollector::new(&settings, &browser, &limiter)
        .search(SearchParams::new("rust"), 30);

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.id, "a1");
    assert_eq!(search_navigations(&site).len(), 1);

    let second = stream.next().await.unwrap().unwrap();
    assert_eq!(second.id, "b1");
    assert_eq!(search_navigations(&site).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_search_reports_cancellation() {
    let site = MockSite::new(SiteScript::default().search_page(1, &["a1"]));
    let browser = MockBrowser::new(site.clone());
    let settings = test_settings();
    let limiter = limiter(&settings);
    limiter.cancellation().cancel();

    let result = SearchCollector::new(&settings, &browser, &limiter)
        .collect(SearchParams::new("rust"), 10)
        .await;

    assert!(matches!(result, Err(LinkreachError::Cancelled)));
    assert_eq!(site.opened_pages(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_lost_page_ends_search() {
    let mut script = SiteScript::default()
        .search_page(1, &["a1", "a2"])
        .search_page(3, &["c1"]);
    script
        .search_pages
        .insert(2, Err(AutomationError::Resource("target closed".to_string())));
    let site = MockSite::new(script);
    let browser = MockBrowser::new(site.clone());
    let settings = test_settings();
    let limiter = limiter(&settings);

    let mut stream = SearchCollector::new(&settings, &browser, &limiter)
        .search(SearchParams::new("rust"), 30);
    let mut found = Vec::new();
    let mut failure = None;
    while let Some(item) = stream.next().await {
        match item {
            Ok(record) => found.push(record.id),
            Err(err) => failure = Some(err),
        }
    }

    assert_eq!(found, vec!["a1", "a2"]);
    assert!(matches!(failure, Some(LinkreachError::Resource { .. })));
    assert_eq!(search_navigations(&site).len(), 2);
    assert_eq!(site.open_pages(), 0);
}
