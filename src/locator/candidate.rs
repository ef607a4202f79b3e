use crate::locator::AssetKind;
use crate::ConfigError;
use url::Url;

/// A hypothesized (language, numeric id, kind) combination
///
/// Candidates are generated fresh on every run and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocatorCandidate {
    pub language: String,
    pub numeric_id: u32,
    pub kind: AssetKind,
    /// Remote address probed and fetched
    pub url: String,
    /// Key the asset is stored under locally
    pub storage_key: String,
}

/// Derives remote addresses and storage keys for candidates
///
/// Remote layout: `{base}/{lang}/img/{id}{suffix}.webp`.
/// Storage keys: `{prefix}_{id}_{lang}{suffix}.webp`.
#[derive(Debug, Clone)]
pub struct LocatorTemplate {
    base_url: String,
    key_prefix: String,
}

impl LocatorTemplate {
    /// Creates a template from a base URL and a storage key prefix
    ///
    /// # Arguments
    ///
    /// * `base_url` - Absolute http(s) URL the language path is appended to
    /// * `key_prefix` - Prefix for local file names (e.g. `wg_game`)
    ///
    /// # Returns
    ///
    /// * `Ok(LocatorTemplate)` - The template
    /// * `Err(ConfigError::InvalidUrl)` - The base URL is not absolute http(s)
    pub fn new(base_url: &str, key_prefix: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                base_url,
                parsed.scheme()
            )));
        }

        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            key_prefix: key_prefix.to_string(),
        })
    }

    pub fn url(&self, language: &str, numeric_id: u32, kind: AssetKind) -> String {
        format!(
            "{}/{}/img/{}{}.webp",
            self.base_url,
            language,
            numeric_id,
            kind.suffix()
        )
    }

    pub fn storage_key(&self, language: &str, numeric_id: u32, kind: AssetKind) -> String {
        format!(
            "{}_{}_{}{}.webp",
            self.key_prefix,
            numeric_id,
            language,
            kind.suffix()
        )
    }

    /// Builds a complete candidate
    pub fn candidate(&self, language: &str, numeric_id: u32, kind: AssetKind) -> LocatorCandidate {
        LocatorCandidate {
            language: language.to_string(),
            numeric_id,
            kind,
            url: self.url(language, numeric_id, kind),
            storage_key: self.storage_key(language, numeric_id, kind),
        }
    }
}
