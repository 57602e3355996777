//! Ranking functions. Both are pure: the index gathers the statistics and
//! sums per-term contributions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which ranking function a search uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringFunction {
    #[default]
    Bm25,
    #[serde(alias = "ql")]
    QueryLikelihood,
}

impl FromStr for ScoringFunction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bm25" => Ok(ScoringFunction::Bm25),
            "ql" | "query_likelihood" | "query-likelihood" => Ok(ScoringFunction::QueryLikelihood),
            other => Err(format!("unknown scoring function {other:?} (expected bm25 or ql)")),
        }
    }
}

impl fmt::Display for ScoringFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringFunction::Bm25 => f.write_str("bm25"),
            ScoringFunction::QueryLikelihood => f.write_str("ql"),
        }
    }
}

/// Okapi BM25 with a query-term-frequency component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25 {
    pub k1: f64,
    pub k2: f64,
    pub b: f64,
}

impl Default for Bm25 {
    fn default() -> Self {
        Self { k1: 1.2, k2: 100.0, b: 0.75 }
    }
}

impl Bm25 {
    /// Contribution of one query term to one document.
    ///
    /// `qf` query frequency, `f` document term frequency, `n` documents
    /// containing the term, `num_docs` collection size, `dl` document length,
    /// `avdl` average document length.
    ///
    /// The IDF factor is unclamped: a term present in more than half of the
    /// collection contributes a negative score.
    pub fn score(&self, qf: f64, f: f64, n: f64, num_docs: f64, dl: f64, avdl: f64) -> f64 {
        let k = self.k1 * ((1.0 - self.b) + self.b * dl / avdl);
        let idf = (1.0 / ((n + 0.5) / (num_docs - n + 0.5))).log10();
        idf * ((self.k1 + 1.0) * f) / (k + f) * ((self.k2 + 1.0) * qf) / (self.k2 + qf)
    }
}

/// Query likelihood with Dirichlet smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryLikelihood {
    pub mu: f64,
}

impl Default for QueryLikelihood {
    fn default() -> Self {
        Self { mu: 1500.0 }
    }
}

impl QueryLikelihood {
    /// `fqd` term frequency in the document, `dl` document length, `cq`
    /// occurrences of the term in the collection, `c` total occurrences of
    /// all terms. Degenerate inputs (empty collection, zero denominator,
    /// zero probability) score 0.
    pub fn score(&self, fqd: f64, dl: f64, cq: f64, c: f64) -> f64 {
        if c == 0.0 || dl + self.mu == 0.0 {
            return 0.0;
        }
        let p = (fqd + self.mu * (cq / c)) / (dl + self.mu);
        if p == 0.0 {
            0.0
        } else {
            p.log10()
        }
    }
}

/// BM25 with k1 = 1.2, k2 = 100, b = 0.75.
pub fn bm25(qf: f64, f: f64, n: f64, num_docs: f64, dl: f64, avdl: f64) -> f64 {
    Bm25::default().score(qf, f, n, num_docs, dl, avdl)
}

/// Query likelihood with mu = 1500.
pub fn query_likelihood(fqd: f64, dl: f64, cq: f64, c: f64) -> f64 {
    QueryLikelihood::default().score(fqd, dl, cq, c)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn bm25_reference_values() {
        assert!((bm25(1.0, 1.0, 1.0, 10.0, 3.0, 3.5) - 0.8513888366890184).abs() < EPS);
        assert!((bm25(2.0, 3.0, 2.0, 20.0, 10.0, 8.0) - 2.5675412180022996).abs() < EPS);
    }

    #[test]
    fn bm25_common_term_is_negative() {
        let s = bm25(1.0, 1.0, 9.0, 10.0, 4.0, 4.0);
        assert!((s - -0.8016323462331665).abs() < EPS);
    }

    #[test]
    fn bm25_saturates_with_frequency() {
        let low = bm25(1.0, 1.0, 2.0, 50.0, 10.0, 10.0);
        let mid = bm25(1.0, 3.0, 2.0, 50.0, 10.0, 10.0);
        let high = bm25(1.0, 30.0, 2.0, 50.0, 10.0, 10.0);
        assert!(low < mid && mid < high);
        assert!(high - mid < mid - low);
    }

    #[test]
    fn bm25_is_deterministic() {
        let a = bm25(1.0, 2.0, 3.0, 40.0, 12.0, 9.5);
        let b = bm25(1.0, 2.0, 3.0, 40.0, 12.0, 9.5);
        assert!((a - b).abs() < EPS);
    }

    #[test]
    fn ql_reference_values() {
        assert!((query_likelihood(1.0, 3.0, 2.0, 35.0) - -1.2388683295259075).abs() < EPS);
        assert!((query_likelihood(0.0, 10.0, 5.0, 1000.0) - -2.303915683901469).abs() < EPS);
    }

    #[test]
    fn ql_degenerate_inputs_score_zero() {
        assert_eq!(query_likelihood(0.0, 0.0, 0.0, 0.0), 0.0);
        assert_eq!(query_likelihood(0.0, 5.0, 0.0, 100.0), 0.0);
        assert_eq!(QueryLikelihood { mu: 0.0 }.score(0.0, 0.0, 1.0, 10.0), 0.0);
    }

    #[test]
    fn scoring_function_parses() {
        assert_eq!("BM25".parse::<ScoringFunction>().unwrap(), ScoringFunction::Bm25);
        assert_eq!("ql".parse::<ScoringFunction>().unwrap(), ScoringFunction::QueryLikelihood);
        assert!("tfidf".parse::<ScoringFunction>().is_err());
        let parsed: ScoringFunction = serde_json::from_str("\"query_likelihood\"").unwrap();
        assert_eq!(parsed, ScoringFunction::QueryLikelihood);
    }
}
