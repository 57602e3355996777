use crate::scoring::{Bm25, QueryLikelihood};
use serde::{Deserialize, Serialize};

/// Ranking parameters. Not part of the snapshot: a restored index ranks with
/// whatever config it was constructed with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub bm25: Bm25,
    pub query_likelihood: QueryLikelihood,
}
