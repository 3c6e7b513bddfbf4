//! Phases run by separate processes sharing on-disk state

use crate::{create_test_config, read_records};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use trawl::{Browser, WorkQueue};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_phases_resume_from_disk() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a class="item" href="/a">A</a><a class="item" href="/b">B</a><p class="last-page"></p>"#,
        ))
        .mount(&server)
        .await;
    for (route, title) in [("/a", "Alpha"), ("/b", "Beta")] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(format!("<h1>{}</h1>", title)),
            )
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    {
        let mut browser = Browser::from_config(&config, CancellationToken::new()).unwrap();
        browser.browse(Some("/list")).await.unwrap();
    }

    {
        let mut browser = Browser::from_config(&config, CancellationToken::new()).unwrap();
        assert_eq!(browser.harvest_queue_mut().len().unwrap(), 2);

        // Already seen, not queued again
        let report = browser.browse(Some("/list")).await.unwrap();
        assert_eq!(report.dequeued, 0);

        let report = browser.harvest().await.unwrap();
        assert_eq!(report.archived, 2);
    }

    let mut browser = Browser::from_config(&config, CancellationToken::new()).unwrap();
    assert_eq!(browser.archive_mut().len(), 2);
    let report = browser.extract().unwrap();
    assert_eq!(report.records_written, 2);
    assert_eq!(read_records(&dir.path().join("records.jsonl")).len(), 2);
}

#[tokio::test]
async fn test_cancelled_run_keeps_work() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<a class="item" href="/slow">Slow</a><p class="last-page"></p>"#),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<h1>Slow</h1>")
                .set_delay(std::time::Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let cancel = CancellationToken::new();
    let mut browser = Browser::from_config(&config, cancel.clone()).unwrap();

    browser.browse(Some("/list")).await.unwrap();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        trigger.cancel();
    });
    let report = browser.harvest().await.unwrap();

    assert!(report.cancelled);
    assert_eq!(report.archived, 0);
    assert_eq!(browser.harvest_queue_mut().len().unwrap(), 1);
}
