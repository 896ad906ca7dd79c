use serde::{Deserialize, Serialize};

/// Search strategy offered by the backend.
///
/// Every mode goes through the same debounce, cache and supersession path; only the
/// endpoint differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Keyword search (`POST /search`).
    FullText,
    /// Embedding similarity search (`POST /search/semantic`).
    #[default]
    Semantic,
    /// Keyword + embedding fusion (`POST /search/hybrid`).
    Hybrid,
}

impl SearchMode {
    /// All modes, in display order.
    pub const ALL: [SearchMode; 3] = [Self::FullText, Self::Semantic, Self::Hybrid];

    /// Endpoint path relative to the API root.
    #[inline]
    pub fn endpoint(&self) -> &'static str {
        match self {
            SearchMode::FullText => "search",
            SearchMode::Semantic => "search/semantic",
            SearchMode::Hybrid => "search/hybrid",
        }
    }

    /// Stable lowercase name (also the cache key segment).
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::FullText => "full_text",
            SearchMode::Semantic => "semantic",
            SearchMode::Hybrid => "hybrid",
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full_text" | "full-text" | "fulltext" | "keyword" => Ok(Self::FullText),
            "semantic" => Ok(Self::Semantic),
            "hybrid" => Ok(Self::Hybrid),
            _ => Err(format!("Unknown search mode: {}", s)),
        }
    }
}
