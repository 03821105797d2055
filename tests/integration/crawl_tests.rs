//! Crawl-mode tasks: discovery bounds, filtering and seed failures

use crate::support::{collect_events, finish, FakeSite, Harness, ScriptedCapability};
use pagegauge::config::UserAgentConfig;
use pagegauge::discovery::{Discoverer, HttpLinkExtractor};
use pagegauge::measure::MeasurementRunner;
use pagegauge::storage::MemoryStore;
use pagegauge::task::{Orchestrator, SubmitRequest, TaskMode};
use pagegauge::{ProgressEvent, TaskStatus};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn site() -> FakeSite {
    FakeSite::default()
        .page(
            "https://site.test/",
            &["/a", "/b", "/c", "https://elsewhere.test/"],
        )
        .page("https://site.test/a", &["/a/1", "/a/2"])
        .page("https://site.test/b", &["/", "/b/1"])
}

fn discovered(orchestrator: &Orchestrator, task_id: &pagegauge::TaskId) -> Vec<(String, u32)> {
    orchestrator
        .get_report(task_id)
        .unwrap()
        .discovered_urls
        .iter()
        .map(|d| (d.url.clone(), d.depth))
        .collect()
}

#[tokio::test]
async fn test_crawl_measures_every_discovered_page() {
    let orchestrator = Harness::new(ScriptedCapability::new())
        .site(site())
        .build();

    let task_id = orchestrator
        .submit(
            SubmitRequest::crawl("https://site.test")
                .with_max_depth(1)
                .with_allowed_domains(["site.test"]),
        )
        .unwrap();
    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Completed);

    assert_eq!(
        discovered(&orchestrator, &task_id),
        vec![
            ("https://site.test/".to_string(), 0),
            ("https://site.test/a".to_string(), 1),
            ("https://site.test/b".to_string(), 1),
            ("https://site.test/c".to_string(), 1),
        ]
    );

    let report = orchestrator.get_report(&task_id).unwrap();
    assert_eq!(report.mode, TaskMode::Crawl);
    assert_eq!(report.seed_url.as_deref(), Some("https://site.test/"));
    assert_eq!(report.results.len(), 4);
    assert!(report.is_fully_accounted());
}

#[tokio::test]
async fn test_crawl_respects_page_budget() {
    let orchestrator = Harness::new(ScriptedCapability::new())
        .site(site())
        .build();

    let task_id = orchestrator
        .submit(
            SubmitRequest::crawl("https://site.test/")
                .with_max_depth(5)
                .with_max_pages(3),
        )
        .unwrap();
    finish(&orchestrator, &task_id).await;

    let urls = discovered(&orchestrator, &task_id);
    assert_eq!(urls.len(), 3);
    assert_eq!(urls[0], ("https://site.test/".to_string(), 0));
}

#[tokio::test]
async fn test_crawl_without_domain_filter_follows_external_links() {
    let orchestrator = Harness::new(ScriptedCapability::new())
        .site(site())
        .build();

    let task_id = orchestrator
        .submit(SubmitRequest::crawl("https://site.test/").with_max_depth(1))
        .unwrap();
    finish(&orchestrator, &task_id).await;

    let urls = discovered(&orchestrator, &task_id);
    assert!(urls.contains(&("https://elsewhere.test/".to_string(), 1)));
}

#[tokio::test]
async fn test_crawl_excludes_matching_urls() {
    let orchestrator = Harness::new(ScriptedCapability::new())
        .site(site())
        .build();

    let task_id = orchestrator
        .submit(
            SubmitRequest::crawl("https://site.test/")
                .with_max_depth(2)
                .with_allowed_domains(["site.test"])
                .with_exclude_patterns([r"/a(/|$)"]),
        )
        .unwrap();
    finish(&orchestrator, &task_id).await;

    let urls: Vec<String> = discovered(&orchestrator, &task_id)
        .into_iter()
        .map(|(url, _)| url)
        .collect();
    assert!(urls.iter().all(|u| !u.contains("/a")));
    assert!(urls.contains(&"https://site.test/b/1".to_string()));
}

#[tokio::test]
async fn test_unreadable_page_is_still_measured() {
    let site = site().broken("https://site.test/a");
    let orchestrator = Harness::new(ScriptedCapability::new()).site(site).build();

    let task_id = orchestrator
        .submit(
            SubmitRequest::crawl("https://site.test/")
                .with_max_depth(2)
                .with_allowed_domains(["site.test"]),
        )
        .unwrap();
    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Completed);

    let urls: Vec<String> = discovered(&orchestrator, &task_id)
        .into_iter()
        .map(|(url, _)| url)
        .collect();
    assert!(urls.contains(&"https://site.test/a".to_string()));
    assert!(!urls.contains(&"https://site.test/a/1".to_string()));

    let logs = orchestrator.get_progress(&task_id).unwrap().logs;
    assert!(logs
        .iter()
        .any(|l| l.message == "1 pages could not be read for links"));
}

#[tokio::test]
async fn test_unreachable_seed_fails_task() {
    let site = FakeSite::default().broken("https://down.test/");
    let capability = ScriptedCapability::new();
    let orchestrator = Harness::new(capability.clone()).site(site).build();
    let mut events = orchestrator.subscribe();

    let task_id = orchestrator
        .submit(SubmitRequest::crawl("https://down.test/"))
        .unwrap();
    let events = collect_events(&mut events, &task_id).await;

    match events.last() {
        Some(ProgressEvent::Failed { error, .. }) => {
            assert!(error.contains("https://down.test/"), "{}", error)
        }
        other => panic!("expected a failed event, got {:?}", other),
    }
    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Failed);
    assert!(capability.navigated().is_empty());
}

#[tokio::test]
async fn test_crawl_over_http() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!(
                r#"<html><body>
                <a href="/docs">Docs</a>
                <a href="{}/blog#latest">Blog</a>
                <a href="https://elsewhere.test/">Elsewhere</a>
                </body></html>"#,
                base
            ),
            "text/html",
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><body><a href="/docs/deep">Deep</a></body></html>"#,
            "text/html",
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/blog"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let extractor =
        HttpLinkExtractor::from_config(&UserAgentConfig::default(), Duration::from_secs(5))
            .unwrap();
    let orchestrator = Orchestrator::new(
        Discoverer::new(Arc::new(extractor)),
        MeasurementRunner::new(Arc::new(ScriptedCapability::new()), Duration::from_secs(5)),
        Arc::new(MemoryStore::new()),
    );

    let task_id = orchestrator
        .submit(
            SubmitRequest::crawl(base.as_str())
                .with_max_depth(1)
                .with_allowed_domains(["127.0.0.1"]),
        )
        .unwrap();
    assert_eq!(finish(&orchestrator, &task_id).await, TaskStatus::Completed);

    let urls: Vec<String> = discovered(&orchestrator, &task_id)
        .into_iter()
        .map(|(url, _)| url)
        .collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/", base),
            format!("{}/docs", base),
            format!("{}/blog", base),
        ]
    );
    assert_eq!(orchestrator.get_report(&task_id).unwrap().results.len(), 3);
}
