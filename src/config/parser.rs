use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is stored with every run in the ledger so runs made with
/// different settings can be told apart.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchStrategy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID_CONFIG: &str = r#"
[resolver]
languages = ["zh", "en"]
probe-workers = 8
fetch-workers = 1

[remote]
base-url = "https://wg.com/oss-proxy/official-website/apigame"

[storage]
catalog-path = "./games.json"
asset-dir = "./images"
ledger-path = "./sweep.db"
summary-path = "./summary.md"

[[keyword-ranges]]
keyword = "phoenix"
start = 18001
end = 18010
"#;

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.resolver.languages, vec!["zh", "en"]);
        assert_eq!(config.resolver.probe_workers, 8);
        assert_eq!(config.resolver.fetch_workers, 1);
        assert_eq!(config.resolver.probe_timeout_ms, 5_000);
        assert_eq!(config.resolver.fetch_timeout_ms, 10_000);
        assert_eq!(config.storage.public_prefix, "/assets/images/games");
        assert_eq!(config.merge.match_by, MatchStrategy::Name);
        assert!(config.windows.is_empty());
        assert_eq!(config.keyword_ranges.len(), 1);
        assert_eq!(config.keyword_ranges[0].keyword, "phoenix");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/asset-sweep.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_empty_language_list_is_rejected() {
        let content = VALID_CONFIG.replace(r#"languages = ["zh", "en"]"#, "languages = []");
        let result = parse_config(&content);
        assert!(matches!(result, Err(ConfigError::EmptyLanguages)));
    }

    #[test]
    fn test_match_by_id() {
        let content = format!("{}\n[merge]\nmatch-by = \"id\"\n", VALID_CONFIG);
        let config = parse_config(&content).unwrap();
        assert_eq!(config.merge.match_by, MatchStrategy::Id);
        assert_eq!(config.merge.default_language, "en");
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
