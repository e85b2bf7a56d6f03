//! similarity
//!
//! Similarity oracle consulted by semantic-assisted merges.
//!
//! The merge engine only sees the [`SimilarityOracle`] trait. Any scorer can
//! sit behind it; [`TokenOracle`] is the built-in one, a Jaccard index over
//! identifier tokens that ignores whitespace and punctuation changes.
//!
//! # Example
//!
//! ```
//! use kitwork::similarity::{SimilarityOracle, TokenOracle};
//!
//! let oracle = TokenOracle::default();
//! let a = "fn add(a: i32, b: i32) -> i32 { a + b }";
//! let b = "fn add(a: i32,\n       b: i32) -> i32 {\n    a + b\n}";
//! let s = oracle.similarity(a, b).unwrap();
//! assert!(s.is_similar);
//! assert!((s.score - 1.0).abs() < f64::EPSILON);
//! ```

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

/// Extensions treated as source code for semantic-assisted merging.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "go", "js", "ts", "jsx", "tsx", "py", "java", "c", "cpp", "h", "cs", "rb", "php", "rs",
    "swift", "kt",
];

/// Check whether `path` names a source file the oracle may be asked about.
pub fn is_source_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SOURCE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Errors reported by an oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The oracle cannot be reached or is not configured.
    #[error("similarity oracle unavailable: {0}")]
    Unavailable(String),

    /// The oracle could not score this input.
    #[error("similarity scoring failed: {0}")]
    Failed(String),
}

/// A similarity score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    /// In `[0, 1]`; 1 means equivalent.
    pub score: f64,
    /// Whether the oracle considers the inputs equivalent.
    pub is_similar: bool,
}

/// Scores how alike two contents are.
pub trait SimilarityOracle {
    fn similarity(&self, a: &str, b: &str) -> Result<Similarity, OracleError>;
}

/// Jaccard similarity over identifier and number tokens.
#[derive(Debug, Clone, Copy)]
pub struct TokenOracle {
    /// Score at or above which inputs are reported similar.
    pub threshold: f64,
}

impl Default for TokenOracle {
    fn default() -> Self {
        Self { threshold: 0.8 }
    }
}

impl TokenOracle {
    fn tokens(content: &str) -> HashSet<&str> {
        content
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|t| !t.is_empty())
            .collect()
    }
}

impl SimilarityOracle for TokenOracle {
    fn similarity(&self, a: &str, b: &str) -> Result<Similarity, OracleError> {
        let (left, right) = (Self::tokens(a), Self::tokens(b));
        let union = left.union(&right).count();
        let score = if union == 0 {
            1.0
        } else {
            left.intersection(&right).count() as f64 / union as f64
        };
        Ok(Similarity {
            score,
            is_similar: score >= self.threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_paths() {
        assert!(is_source_path("src/main.rs"));
        assert!(is_source_path("web/App.TSX"));
        assert!(!is_source_path("README.md"));
        assert!(!is_source_path("Makefile"));
    }

    #[test]
    fn disjoint_content_scores_zero() {
        let s = TokenOracle::default().similarity("alpha beta", "gamma delta").unwrap();
        assert_eq!(s.score, 0.0);
        assert!(!s.is_similar);
    }

    #[test]
    fn empty_inputs_are_identical() {
        let s = TokenOracle::default().similarity("", "  \n").unwrap();
        assert_eq!(s.score, 1.0);
    }

    #[test]
    fn partial_overlap() {
        // {a, b, c} vs {a, b, d}: 2 shared of 4
        let s = TokenOracle::default().similarity("a b c", "a b d").unwrap();
        assert!((s.score - 0.5).abs() < 1e-9);
    }
}
