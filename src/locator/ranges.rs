//! Numeric id windows swept for every entity, and keyword-triggered ranges

use crate::config::Config;
use std::ops::RangeInclusive;

/// Inclusive window of numeric ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdWindow {
    pub start: u32,
    pub end: u32,
}

impl IdWindow {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn ids(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }

    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Window added when an entity's text contains `keyword`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRange {
    pub keyword: String,
    pub window: IdWindow,
}

impl KeywordRange {
    pub fn new(keyword: &str, start: u32, end: u32) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
            window: IdWindow::new(start, end),
        }
    }

    /// Case-insensitive containment test against already-lowercased text
    pub fn matches(&self, lowercase_text: &str) -> bool {
        lowercase_text.contains(self.keyword.as_str())
    }
}

/// The fallback windows and keyword ranges used by the generator
#[derive(Debug, Clone)]
pub struct RangeTable {
    windows: Vec<IdWindow>,
    keyword_ranges: Vec<KeywordRange>,
}

const DEFAULT_KEYWORD_RANGES: &[(&str, u32, u32)] = &[
    ("dragon", 5001, 5020),
    ("fortune", 4001, 4020),
    ("gold", 3001, 3020),
    ("diamond", 2001, 2020),
    ("treasure", 1001, 1020),
    ("blackjack", 11001, 11020),
    ("roulette", 12001, 12020),
    ("baccarat", 13001, 13020),
    ("poker", 14001, 14020),
    ("sports", 15001, 15020),
    ("lottery", 16001, 16020),
    ("live", 17001, 17020),
];

impl Default for RangeTable {
    /// Windows `N001..=N010` for N in 1..=17 plus the built-in keyword table
    fn default() -> Self {
        Self {
            windows: Self::default_windows(),
            keyword_ranges: Self::default_keyword_ranges(),
        }
    }
}

impl RangeTable {
    pub fn new(windows: Vec<IdWindow>, keyword_ranges: Vec<KeywordRange>) -> Self {
        Self {
            windows,
            keyword_ranges,
        }
    }

    /// Builds the table from configuration, falling back to the built-in
    /// windows or keyword table for whichever list is empty
    pub fn from_config(config: &Config) -> Self {
        let windows = if config.windows.is_empty() {
            Self::default_windows()
        } else {
            config
                .windows
                .iter()
                .map(|w| IdWindow::new(w.start, w.end))
                .collect()
        };

        let keyword_ranges = if config.keyword_ranges.is_empty() {
            Self::default_keyword_ranges()
        } else {
            config
                .keyword_ranges
                .iter()
                .map(|r| KeywordRange::new(&r.keyword, r.start, r.end))
                .collect()
        };

        Self::new(windows, keyword_ranges)
    }

    fn default_windows() -> Vec<IdWindow> {
        (1..=17u32)
            .map(|n| IdWindow::new(n * 1000 + 1, n * 1000 + 10))
            .collect()
    }

    fn default_keyword_ranges() -> Vec<KeywordRange> {
        DEFAULT_KEYWORD_RANGES
            .iter()
            .map(|(keyword, start, end)| KeywordRange::new(keyword, *start, *end))
            .collect()
    }

    pub fn windows(&self) -> &[IdWindow] {
        &self.windows
    }

    pub fn keyword_ranges(&self) -> &[KeywordRange] {
        &self.keyword_ranges
    }

    /// Keyword ranges matching the text, in table order
    pub fn matching_ranges<'a>(&'a self, text: &str) -> impl Iterator<Item = &'a KeywordRange> {
        let text = text.to_lowercase();
        self.keyword_ranges
            .iter()
            .filter(move |range| range.matches(&text))
    }
}
