//! Keyword classification of entity text
//!
//! Classification is a swappable strategy: the resolution and merge code only
//! sees the `Classifier` trait. `KeywordClassifier` is the built-in
//! string-containment implementation with multilingual keyword tables.

use std::fmt;

/// Upper bound on the number of feature tags kept per entity
pub const MAX_FEATURES: usize = 4;

/// Game category tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Slot,
    Table,
    Poker,
    Sports,
    Lottery,
    Live,
    /// Fallback when no keyword matches
    Casino,
}

impl Category {
    /// The label stored in the catalog's `category` field
    pub fn label(&self) -> &'static str {
        match self {
            Self::Slot => "Slot Games",
            Self::Table => "Table Games",
            Self::Poker => "Poker Games",
            Self::Sports => "Sports Games",
            Self::Lottery => "Lottery Games",
            Self::Live => "Live Games",
            Self::Casino => "Casino Games",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::all().into_iter().find(|c| c.label() == label)
    }

    pub fn all() -> Vec<Self> {
        vec![
            Self::Slot,
            Self::Table,
            Self::Poker,
            Self::Sports,
            Self::Lottery,
            Self::Live,
            Self::Casino,
        ]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Strategy for deriving a category and feature tags from free text
pub trait Classifier: Send + Sync {
    /// Maps text to a single category
    fn classify(&self, text: &str) -> Category;

    /// Derives feature tags from text, at most [`MAX_FEATURES`] of them
    fn tag_features(&self, text: &str) -> Vec<String>;
}

/// Case-insensitive string-containment classifier
pub struct KeywordClassifier {
    categories: Vec<(Category, Vec<String>)>,
    features: Vec<(String, Vec<String>)>,
    default_features: Vec<String>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        let categories = vec![
            (Category::Slot, owned(&["slot", "老虎机", "สล็อต"])),
            (
                Category::Table,
                owned(&[
                    "blackjack",
                    "roulette",
                    "baccarat",
                    "轮盘",
                    "百家乐",
                    "แบล็คแจ็ค",
                    "รูเล็ต",
                    "บาคาร่า",
                ]),
            ),
            (Category::Poker, owned(&["poker", "扑克", "โป๊กเกอร์"])),
            (
                Category::Sports,
                owned(&[
                    "sports", "betting", "体育", "投注", "กีฬา", "เดิมพัน", "thể thao", "cá cược",
                ]),
            ),
            (Category::Lottery, owned(&["lottery", "彩票", "หวย", "xổ số"])),
            (Category::Live, owned(&["live", "真人", "สด", "trực tiếp"])),
        ];

        let features = vec![
            (
                "Progressive Jackpot".to_string(),
                owned(&["jackpot", "progressive", "大奖", "累积", "แจ็คพอต", "โปรเกรสซีฟ", "tiến bộ"]),
            ),
            (
                "Free Spins".to_string(),
                owned(&["free spin", "免费转", "ฟรีสปิน", "quay miễn phí"]),
            ),
            (
                "Bonus Rounds".to_string(),
                owned(&["bonus", "奖励", "โบนัส", "thưởng"]),
            ),
            (
                "Live Dealers".to_string(),
                owned(&["live dealer", "live", "真人荷官", "ดีลเลอร์สด", "người chia bài trực tiếp"]),
            ),
            (
                "Multi-Player".to_string(),
                owned(&["multi", "多人", "หลายคน", "nhiều người"]),
            ),
            (
                "Mobile Optimized".to_string(),
                owned(&["mobile", "手机", "มือถือ", "di động"]),
            ),
            (
                "High Quality Graphics".to_string(),
                owned(&["graphic", "图形", "กราฟิก", "đồ họa"]),
            ),
            (
                "Secure Gaming".to_string(),
                owned(&["secure", "安全", "ปลอดภัย", "an toàn"]),
            ),
        ];

        Self {
            categories,
            features,
            default_features: [
                "High Quality Graphics",
                "Mobile Optimized",
                "Secure Gaming",
                "Great Features",
            ]
            .iter()
            .map(|f| f.to_string())
            .collect(),
        }
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Category {
        let text = text.to_lowercase();
        self.categories
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|(category, _)| *category)
            .unwrap_or(Category::Casino)
    }

    fn tag_features(&self, text: &str) -> Vec<String> {
        let text = text.to_lowercase();
        let mut tags: Vec<String> = self
            .features
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|(feature, _)| feature.clone())
            .collect();

        if tags.is_empty() {
            tags = self.default_features.clone();
        }
        tags.truncate(MAX_FEATURES);
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_english_keywords() {
        let classifier = KeywordClassifier::default();
        assert_eq!(classifier.classify("Dragon Slot Deluxe"), Category::Slot);
        assert_eq!(classifier.classify("VIP Baccarat"), Category::Table);
        assert_eq!(classifier.classify("Texas POKER"), Category::Poker);
        assert_eq!(classifier.classify("Mega Lottery"), Category::Lottery);
    }

    #[test]
    fn test_classify_other_languages() {
        let classifier = KeywordClassifier::default();
        assert_eq!(classifier.classify("龙之老虎机"), Category::Slot);
        assert_eq!(classifier.classify("百家乐"), Category::Table);
        assert_eq!(classifier.classify("xổ số miền nam"), Category::Lottery);
    }

    #[test]
    fn test_classify_falls_back_to_casino() {
        let classifier = KeywordClassifier::default();
        assert_eq!(classifier.classify("Fortune Garden"), Category::Casino);
        assert_eq!(classifier.classify(""), Category::Casino);
    }

    #[test]
    fn test_first_matching_category_wins() {
        let classifier = KeywordClassifier::default();
        // "slot" is checked before "live"
        assert_eq!(classifier.classify("live slot show"), Category::Slot);
    }

    #[test]
    fn test_tag_features_is_capped() {
        let classifier = KeywordClassifier::default();
        let tags = classifier.tag_features(
            "progressive jackpot, free spins, bonus rounds, live dealer, multiplayer, mobile",
        );
        assert_eq!(tags.len(), MAX_FEATURES);
        assert_eq!(tags[0], "Progressive Jackpot");
        assert_eq!(tags[1], "Free Spins");
    }

    #[test]
    fn test_tag_features_default_set() {
        let classifier = KeywordClassifier::default();
        let tags = classifier.tag_features("nothing to see here");
        assert_eq!(
            tags,
            vec![
                "High Quality Graphics",
                "Mobile Optimized",
                "Secure Gaming",
                "Great Features"
            ]
        );
    }

    #[test]
    fn test_label_round_trip() {
        for category in Category::all() {
            assert_eq!(Category::from_label(category.label()), Some(category));
        }
        assert_eq!(Category::from_label("Arcade"), None);
    }
}
