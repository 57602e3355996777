use crate::DocId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub identifier: String,
    pub score: f64,
}

/// Orders scored candidates by descending score, breaking ties by ascending
/// doc id, and resolves each doc id to its identifier. Candidates without an
/// identifier are dropped.
pub fn rank<'a, F>(mut candidates: Vec<(DocId, f64)>, identifier: F) -> Vec<SearchHit>
where
    F: Fn(DocId) -> Option<&'a str>,
{
    candidates.sort_by(|a, b| by_score_then_doc(*a, *b));
    candidates
        .into_iter()
        .filter_map(|(doc_id, score)| {
            identifier(doc_id).map(|id| SearchHit { identifier: id.to_string(), score })
        })
        .collect()
}

fn by_score_then_doc(a: (DocId, f64), b: (DocId, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}
