use serde::Deserialize;

/// Main configuration structure for Asset-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub resolver: ResolverConfig,
    pub remote: RemoteConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    /// Fallback id windows; empty means the built-in sweep
    #[serde(default)]
    pub windows: Vec<WindowEntry>,
    /// Keyword-triggered id windows; empty means the built-in table
    #[serde(default, rename = "keyword-ranges")]
    pub keyword_ranges: Vec<KeywordRangeEntry>,
}

/// Resolution behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Language preference order, most preferred first
    pub languages: Vec<String>,

    /// Maximum number of concurrent existence probes
    #[serde(rename = "probe-workers", default = "default_probe_workers")]
    pub probe_workers: u32,

    /// Maximum number of concurrent asset downloads
    #[serde(rename = "fetch-workers", default = "default_fetch_workers")]
    pub fetch_workers: u32,

    /// Maximum number of entities resolved at the same time
    #[serde(rename = "entity-workers", default = "default_entity_workers")]
    pub entity_workers: u32,

    /// Timeout for a single existence probe (milliseconds)
    #[serde(rename = "probe-timeout-ms", default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Timeout for a single asset download (milliseconds)
    #[serde(rename = "fetch-timeout-ms", default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Number of updated entities between catalog checkpoints
    #[serde(rename = "checkpoint-every", default = "default_checkpoint_every")]
    pub checkpoint_every: u32,

    /// Optional run deadline in seconds
    #[serde(rename = "deadline-secs", default)]
    pub deadline_secs: Option<u64>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            languages: ["zh", "en", "th", "vi"]
                .iter()
                .map(|l| l.to_string())
                .collect(),
            probe_workers: default_probe_workers(),
            fetch_workers: default_fetch_workers(),
            entity_workers: default_entity_workers(),
            probe_timeout_ms: default_probe_timeout_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            checkpoint_every: default_checkpoint_every(),
            deadline_secs: None,
        }
    }
}

/// Remote asset source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL the `{lang}/img/{id}.webp` template is appended to
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Local storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the JSON catalog document
    #[serde(rename = "catalog-path")]
    pub catalog_path: String,

    /// Directory downloaded assets are written to
    #[serde(rename = "asset-dir")]
    pub asset_dir: String,

    /// Public path prefix recorded in the catalog for each asset
    #[serde(rename = "public-prefix", default = "default_public_prefix")]
    pub public_prefix: String,

    /// File name prefix for stored assets
    #[serde(rename = "key-prefix", default = "default_key_prefix")]
    pub key_prefix: String,

    /// Path to the SQLite run ledger
    #[serde(rename = "ledger-path")]
    pub ledger_path: String,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

/// Discovery merge configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MergeConfig {
    /// Identity strategy used to match discovery records
    #[serde(rename = "match-by", default)]
    pub match_by: MatchStrategy,

    /// Language whose name is preferred as the identity key
    #[serde(rename = "default-language", default = "default_language")]
    pub default_language: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            match_by: MatchStrategy::default(),
            default_language: default_language(),
        }
    }
}

/// How discovery records are matched against catalog entities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// Match on the default-language name, falling back to any name
    #[default]
    Name,
    /// Match on the entity id
    Id,
}

/// Inclusive numeric id window
#[derive(Debug, Clone, Deserialize)]
pub struct WindowEntry {
    pub start: u32,
    pub end: u32,
}

/// Keyword that adds an id window when found in an entity's id, name or category
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordRangeEntry {
    pub keyword: String,
    pub start: u32,
    pub end: u32,
}

fn default_probe_workers() -> u32 {
    10
}

fn default_fetch_workers() -> u32 {
    2
}

fn default_entity_workers() -> u32 {
    4
}

fn default_probe_timeout_ms() -> u64 {
    5_000
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_checkpoint_every() -> u32 {
    1
}

fn default_user_agent() -> String {
    format!("asset-sweep/{}", env!("CARGO_PKG_VERSION"))
}

fn default_public_prefix() -> String {
    "/assets/images/games".to_string()
}

fn default_key_prefix() -> String {
    "wg_game".to_string()
}

fn default_language() -> String {
    "en".to_string()
}
