//! Integration tests for trawl
//!
//! These tests use wiremock to serve a small site and drive the browse,
//! harvest and extract phases end-to-end against real on-disk queues,
//! archives and sinks.

mod crawl_tests;
mod resume_tests;

use std::path::Path;
use trawl::config::{parse_config, Config};

/// Builds a configuration for a site served at `base_url`, keeping all state
/// under `dir`
pub fn create_test_config(base_url: &str, dir: &Path) -> Config {
    let content = format!(
        r#"
[crawler]
base-url = "{base_url}"
initial = "/list"

[backoff]
base-ms = 1
max-ms = 5
max-idle-pauses = 2

[download]
timeout-secs = 3
max-retries = 0
backoff-factor = 0.0
request-delay-ms = 0

[queue]
backend = "sqlite"
path = "{queue}"

[archive]
directory = "{archive}"
max-size = 1000000

[rules]
browsable = "a.next"
harvestable = "a.item"
stop = ".last-page"

[rules.fields]
title = "h1"
price = "span.price"

[sink]
kind = "jsonl"
path = "{sink}"
"#,
        base_url = base_url,
        queue = dir.join("queues.db").display(),
        archive = dir.join("harvest").display(),
        sink = dir.join("records.jsonl").display(),
    );
    parse_config(&content).expect("test config must be valid")
}

/// Reads every line of a JSON lines file
pub fn read_records(path: &Path) -> Vec<serde_json::Value> {
    let content = std::fs::read_to_string(path).unwrap_or_default();
    content
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid JSON line"))
        .collect()
}
