//! End-to-end crawls of a mock site

use crate::{create_test_config, read_records};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use trawl::config::{parse_config, SinkKind};
use trawl::Browser;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.to_string())
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Two listing pages, three items; the second listing is the last one
async fn mount_site(server: &MockServer) {
    mount_page(
        server,
        "/list",
        r#"<html><body>
        <a class="item" href="/item/1">One</a>
        <a class="item" href="/item/2">Two</a>
        <a class="next" href="/list2">Next</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        server,
        "/list2",
        r#"<html><body>
        <a class="item" href="/item/3">Three</a>
        <a class="next" href="/list3">Next</a>
        <div class="last-page"></div>
        </body></html>"#,
    )
    .await;
    for n in 1..=3 {
        mount_page(
            server,
            &format!("/item/{}", n),
            &format!(
                r#"<html><body><h1>Item {n}</h1><span class="price">{n}.00</span></body></html>"#,
                n = n
            ),
        )
        .await;
    }
}

#[tokio::test]
async fn test_full_run() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let mut browser = Browser::from_config(&config, CancellationToken::new()).unwrap();

    let reports = browser
        .run(config.crawler.initial.as_deref())
        .await
        .unwrap();

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].downloaded, 2, "list3 must not be visited");
    assert_eq!(reports[1].archived, 3);
    assert_eq!(reports[2].records_written, 3);

    let mut titles: Vec<String> = read_records(&dir.path().join("records.jsonl"))
        .iter()
        .map(|record| record["title"].as_str().unwrap().to_string())
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["Item 1", "Item 2", "Item 3"]);

    assert!(dir.path().join("harvest").join("harvest_1.bz2").exists());
}

#[tokio::test]
async fn test_robots_txt_denies_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /item/2\n"),
        )
        .mount(&server)
        .await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let mut browser = Browser::from_config(&config, CancellationToken::new()).unwrap();

    let reports = browser.run(Some("/list")).await.unwrap();

    assert_eq!(reports[1].denied, 1);
    assert_eq!(reports[1].archived, 2);
    assert_eq!(read_records(&dir.path().join("records.jsonl")).len(), 2);
}

#[tokio::test]
async fn test_transient_errors_are_requeued() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/item/1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let mut browser = Browser::from_config(&config, CancellationToken::new()).unwrap();

    browser.browse(Some("/list")).await.unwrap();
    let report = browser.harvest().await.unwrap();

    assert_eq!(report.retried, 2);
    assert_eq!(report.archived, 3);
}

#[tokio::test]
async fn test_missing_pages_are_dropped() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/list",
        r#"<a class="item" href="/gone">Gone</a><div class="last-page"></div>"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let mut browser = Browser::from_config(&config, CancellationToken::new()).unwrap();

    let reports = browser.run(Some("/list")).await.unwrap();

    assert_eq!(reports[1].dropped, 1);
    assert_eq!(reports[1].archived, 0);
    assert_eq!(reports[2].extracted, 0);
}

#[tokio::test]
async fn test_csv_sink() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("records.csv");

    // Same site, records written as CSV
    let content = format!(
        r#"
[crawler]
base-url = "{}"

[download]
request-delay-ms = 0
max-retries = 0

[queue]
backend = "memory"

[archive]
directory = "{}"

[rules]
browsable = "a.next"
harvestable = "a.item"
stop = ".last-page"

[rules.fields]
title = "h1"
price = "span.price"

[sink]
kind = "csv"
path = "{}"
columns = ["title", "price"]
"#,
        server.uri(),
        dir.path().join("harvest").display(),
        csv_path.display()
    );
    let config = parse_config(&content).unwrap();
    assert_eq!(config.sink.kind, SinkKind::Csv);

    let mut browser = Browser::from_config(&config, CancellationToken::new()).unwrap();
    browser.run(Some("/list")).await.unwrap();

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(headers, vec!["title", "price"]);
    let mut rows: Vec<Vec<String>> = reader
        .records()
        .map(|row| row.unwrap().iter().map(String::from).collect())
        .collect();
    rows.sort();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], vec!["Item 1", "1.00"]);
}
