//! Search depth selection
//!
//! Chooses how deep a memory search should go from lexical cues in the query
//! text. Pure heuristics over static keyword tables; an explicit
//! user-specified depth always wins, and very short queries stay shallow
//! regardless of keywords as a fail-safe against over-fetching.

use serde::{Deserialize, Serialize};

/// Queries below this word count always select the fast tier
const MIN_WORDS: usize = 3;

/// Unmatched queries at or above this word count default to balanced
const LONG_QUERY_WORDS: usize = 8;

/// Multi-word phrases match as substrings; single words match whole words
/// only, so "why" does not fire inside "everywhere".
const SYNTHESIS_MARKERS: &[&str] = &[
    "synthesize",
    "synthesis",
    "comprehensive",
    "given everything",
    "best strategy",
    "overall picture",
    "summarize everything",
    "across all",
];

const RELATIONAL_MARKERS: &[&str] = &[
    "why",
    "relate",
    "related",
    "relationship",
    "depend",
    "depends",
    "dependencies",
    "connection",
    "compare",
    "explain",
];

const FACT_MARKERS: &[&str] = &[
    "when did",
    "what is",
    "what was",
    "who is",
    "where is",
    "show me",
    "find",
    "list",
    "lookup",
];

/// Context phases that bias toward deeper search
const DEEP_CONTEXTS: &[&str] = &["planning", "research", "consolidation"];

/// Search depth tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    /// Depth 1: direct fact lookup
    Fast,
    /// Depth 2: relational retrieval across layers
    Balanced,
    /// Depth 3: full synthesis across everything available
    Comprehensive,
}

impl SearchDepth {
    /// Numeric depth level (1-3)
    pub fn level(&self) -> u8 {
        match self {
            Self::Fast => 1,
            Self::Balanced => 2,
            Self::Comprehensive => 3,
        }
    }

    /// Depth from a numeric level
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Fast),
            2 => Some(Self::Balanced),
            3 => Some(Self::Comprehensive),
            _ => None,
        }
    }

    /// One tier deeper, saturating at comprehensive
    pub fn deeper(&self) -> Self {
        match self {
            Self::Fast => Self::Balanced,
            _ => Self::Comprehensive,
        }
    }
}

/// Selects a search depth from query text and context
///
/// Stateless and independent of cache state; precedence is explicit user
/// override, then the word-count fail-safe, then keyword classification.
#[derive(Debug, Default, Clone)]
pub struct TierSelector;

impl TierSelector {
    /// Create a new selector
    pub fn new() -> Self {
        Self
    }

    /// Select a depth for the query
    ///
    /// `user_specified_depth` is returned verbatim when given. A context
    /// phase such as "planning" nudges a balanced classification one level
    /// deeper but never overrides the explicit depth.
    pub fn select_depth(
        &self,
        query: &str,
        context: Option<&str>,
        user_specified_depth: Option<SearchDepth>,
    ) -> SearchDepth {
        if let Some(depth) = user_specified_depth {
            return depth;
        }

        let (depth, _) = Self::classify(query);

        if depth == SearchDepth::Balanced {
            if let Some(phase) = context {
                let phase = phase.to_lowercase();
                if DEEP_CONTEXTS.iter().any(|c| phase.contains(c)) {
                    return depth.deeper();
                }
            }
        }

        depth
    }

    /// Explain which rule would fire for the query
    pub fn explain_selection(&self, query: &str) -> String {
        let (depth, reason) = Self::classify(query);
        format!("depth {} ({:?}): {}", depth.level(), depth, reason)
    }

    fn classify(query: &str) -> (SearchDepth, &'static str) {
        let lowered = query.to_lowercase();
        let words: Vec<&str> = lowered
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| !w.is_empty())
            .collect();

        if words.len() < MIN_WORDS {
            return (
                SearchDepth::Fast,
                "below minimum word count, defaulting to fast lookup",
            );
        }

        if Self::matches_any(&lowered, &words, SYNTHESIS_MARKERS) {
            return (SearchDepth::Comprehensive, "synthesis phrasing detected");
        }
        if Self::matches_any(&lowered, &words, RELATIONAL_MARKERS) {
            return (SearchDepth::Balanced, "relational phrasing detected");
        }
        if Self::matches_any(&lowered, &words, FACT_MARKERS) {
            return (SearchDepth::Fast, "fact-lookup phrasing detected");
        }

        if words.len() >= LONG_QUERY_WORDS {
            (
                SearchDepth::Balanced,
                "no markers matched, long query defaults to balanced",
            )
        } else {
            (
                SearchDepth::Fast,
                "no markers matched, short query defaults to fast lookup",
            )
        }
    }

    fn matches_any(lowered: &str, words: &[&str], markers: &[&str]) -> bool {
        markers.iter().any(|marker| {
            if marker.contains(' ') {
                lowered.contains(marker)
            } else {
                words.contains(marker)
            }
        })
    }
}
