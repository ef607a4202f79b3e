use crate::config::types::{
    Config, KeywordRangeEntry, MergeConfig, RemoteConfig, ResolverConfig, StorageConfig,
    WindowEntry,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Largest number of ids a single window may span
const MAX_WINDOW_SPAN: u32 = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_resolver_config(&config.resolver)?;
    validate_remote_config(&config.remote)?;
    validate_storage_config(&config.storage)?;
    validate_merge_config(&config.merge)?;
    validate_windows(&config.windows)?;
    validate_keyword_ranges(&config.keyword_ranges)?;
    Ok(())
}

/// Validates resolver configuration
fn validate_resolver_config(config: &ResolverConfig) -> Result<(), ConfigError> {
    validate_languages(&config.languages)?;

    for (name, value) in [
        ("probe_workers", config.probe_workers),
        ("fetch_workers", config.fetch_workers),
        ("entity_workers", config.entity_workers),
    ] {
        if !(1..=100).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and 100, got {}",
                name, value
            )));
        }
    }

    if config.probe_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "probe_timeout_ms must be >= 100ms, got {}ms",
            config.probe_timeout_ms
        )));
    }

    if config.fetch_timeout_ms < config.probe_timeout_ms {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_ms ({}ms) must not be shorter than probe_timeout_ms ({}ms)",
            config.fetch_timeout_ms, config.probe_timeout_ms
        )));
    }

    if config.checkpoint_every < 1 {
        return Err(ConfigError::Validation(
            "checkpoint_every must be >= 1".to_string(),
        ));
    }

    if config.deadline_secs == Some(0) {
        return Err(ConfigError::Validation(
            "deadline_secs must be > 0 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates the language preference list
///
/// The list must be non-empty, free of duplicates, and every tag must be a
/// short run of ASCII letters, digits and hyphens (e.g. `zh`, `zh-cn`).
pub(crate) fn validate_languages(languages: &[String]) -> Result<(), ConfigError> {
    if languages.is_empty() {
        return Err(ConfigError::EmptyLanguages);
    }

    let mut seen = HashSet::new();
    for tag in languages {
        if tag.is_empty()
            || tag.len() > 16
            || tag.starts_with('-')
            || tag.ends_with('-')
            || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ConfigError::Validation(format!(
                "Invalid language tag '{}'",
                tag
            )));
        }

        if !seen.insert(tag.to_ascii_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "Language '{}' appears more than once",
                tag
            )));
        }
    }

    Ok(())
}

/// Validates remote source configuration
fn validate_remote_config(config: &RemoteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("catalog_path", &config.catalog_path),
        ("asset_dir", &config.asset_dir),
        ("ledger_path", &config.ledger_path),
        ("summary_path", &config.summary_path),
        ("key_prefix", &config.key_prefix),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if config
        .key_prefix
        .chars()
        .any(|c| c == '/' || c == '\\' || c == '.')
    {
        return Err(ConfigError::Validation(format!(
            "key_prefix '{}' must not contain path separators or dots",
            config.key_prefix
        )));
    }

    Ok(())
}

/// Validates merge configuration
fn validate_merge_config(config: &MergeConfig) -> Result<(), ConfigError> {
    if config.default_language.trim().is_empty() {
        return Err(ConfigError::Validation(
            "default_language cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates fallback windows
fn validate_windows(windows: &[WindowEntry]) -> Result<(), ConfigError> {
    for window in windows {
        validate_window(window.start, window.end)?;
    }
    Ok(())
}

/// Validates keyword-triggered windows
fn validate_keyword_ranges(ranges: &[KeywordRangeEntry]) -> Result<(), ConfigError> {
    for range in ranges {
        if range.keyword.trim().is_empty() {
            return Err(ConfigError::Validation(
                "keyword-range keyword cannot be empty".to_string(),
            ));
        }
        validate_window(range.start, range.end)?;
    }
    Ok(())
}

fn validate_window(start: u32, end: u32) -> Result<(), ConfigError> {
    if start > end {
        return Err(ConfigError::Validation(format!(
            "Window start {} is greater than end {}",
            start, end
        )));
    }

    if end - start >= MAX_WINDOW_SPAN {
        return Err(ConfigError::Validation(format!(
            "Window {}-{} spans more than {} ids",
            start, end, MAX_WINDOW_SPAN
        )));
    }

    Ok(())
}
