use crate::config::types::{
    ArchiveConfig, BackoffConfig, Config, CrawlerConfig, DownloadConfig, RulesConfig, SinkConfig,
    SinkKind,
};
use crate::sink::is_valid_identifier;
use crate::url::parse_base_url;
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_backoff_config(&config.backoff)?;
    validate_download_config(&config.download)?;
    validate_archive_config(&config.archive)?;
    validate_rules_config(&config.rules)?;
    validate_sink_config(&config.sink)?;
    Ok(())
}

/// Validates the site section
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let base = parse_base_url(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if let Some(initial) = &config.initial {
        base.join(initial).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid initial URL '{}': {}", initial, e))
        })?;
    }

    Ok(())
}

/// Validates the pause policy
fn validate_backoff_config(config: &BackoffConfig) -> Result<(), ConfigError> {
    if config.base_ms == 0 {
        return Err(ConfigError::Validation(
            "backoff base-ms must be > 0".to_string(),
        ));
    }

    if config.max_ms < config.base_ms {
        return Err(ConfigError::Validation(format!(
            "backoff max-ms ({}) must be >= base-ms ({})",
            config.max_ms, config.base_ms
        )));
    }

    Ok(())
}

/// Validates download settings
fn validate_download_config(config: &DownloadConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be > 0".to_string(),
        ));
    }

    if !config.backoff_factor.is_finite() || config.backoff_factor < 0.0 {
        return Err(ConfigError::Validation(format!(
            "backoff-factor must be a non-negative number, got {}",
            config.backoff_factor
        )));
    }

    if let Some(code) = config.retry_on.iter().find(|c| !(100..=599).contains(*c)) {
        return Err(ConfigError::Validation(format!(
            "retry-on contains invalid HTTP status {}",
            code
        )));
    }

    for proxy in &config.proxies {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy '{}': {}", proxy, e)))?;
    }

    if config.password.is_some() && config.username.is_none() {
        return Err(ConfigError::Validation(
            "password given without username".to_string(),
        ));
    }

    Ok(())
}

/// Validates archive settings
fn validate_archive_config(config: &ArchiveConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "archive directory cannot be empty".to_string(),
        ));
    }

    if config.max_size == 0 {
        return Err(ConfigError::Validation(
            "archive max-size must be > 0".to_string(),
        ));
    }

    validate_file_name_part("archive prefix", &config.prefix)?;
    validate_file_name_part("archive extension", &config.extension)?;
    Ok(())
}

/// Prefix and extension end up in file names and must not form paths
fn validate_file_name_part(what: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", what)));
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "{} may only contain letters, digits, '_' and '-', got '{}'",
            what, value
        )));
    }

    Ok(())
}

/// Validates that every selector compiles
fn validate_rules_config(config: &RulesConfig) -> Result<(), ConfigError> {
    validate_selector(&config.browsable)?;
    validate_selector(&config.harvestable)?;
    if let Some(stop) = &config.stop {
        validate_selector(stop)?;
    }
    for selector in config.fields.values() {
        validate_selector(selector)?;
    }
    Ok(())
}

fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })?;
    Ok(())
}

/// Validates sink settings
fn validate_sink_config(config: &SinkConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "sink path cannot be empty".to_string(),
        ));
    }

    match config.kind {
        SinkKind::Jsonl => {}
        SinkKind::Csv | SinkKind::Sqlite => {
            if config.columns.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{:?} sink needs at least one column",
                    config.kind
                )));
            }
        }
    }

    if config.kind == SinkKind::Sqlite {
        let table = config.table.as_deref().unwrap_or("");
        if !is_valid_identifier(table) {
            return Err(ConfigError::Validation(format!(
                "sqlite sink table must be made of [A-Za-z0-9_], got '{}'",
                table
            )));
        }
        if let Some(column) = config.columns.iter().find(|c| !is_valid_identifier(c)) {
            return Err(ConfigError::Validation(format!(
                "sqlite sink column must be made of [A-Za-z0-9_], got '{}'",
                column
            )));
        }
    }

    Ok(())
}
