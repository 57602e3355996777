//! Whole-index JSON snapshot.
//!
//! ```json
//! {
//!   "doc_data": { "1": { "slug": "intro", "numTerms": 3 } },
//!   "index": [ { "term": "cat", "posting_list": [ { "doc_id": 1, "postings": [1] } ] } ]
//! }
//! ```
//!
//! Aggregates are never stored. Decoding rebuilds them from the postings and
//! rejects snapshots whose document lengths disagree with their postings.

use crate::error::{Error, Result};
use crate::index::DocMeta;
use crate::inverted_list::InvertedList;
use crate::posting::PostingList;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Serialize)]
struct SnapshotRef<'a> {
    doc_data: &'a BTreeMap<DocId, DocMeta>,
    index: Vec<TermRef<'a>>,
}

#[derive(Serialize)]
struct TermRef<'a> {
    term: &'a str,
    posting_list: &'a [PostingList],
}

#[derive(Deserialize)]
struct SnapshotOwned {
    doc_data: BTreeMap<DocId, DocMeta>,
    index: Vec<TermOwned>,
}

#[derive(Deserialize)]
struct TermOwned {
    term: String,
    posting_list: Vec<PostingList>,
}

/// Index state rebuilt from a snapshot.
#[derive(Debug)]
pub(crate) struct IndexParts {
    pub terms: BTreeMap<String, InvertedList>,
    pub docs: BTreeMap<DocId, DocMeta>,
    pub slugs: HashMap<String, DocId>,
    pub doc_terms: HashMap<DocId, Vec<String>>,
    pub num_terms: u64,
    pub next_doc_id: DocId,
}

pub(crate) fn encode(docs: &BTreeMap<DocId, DocMeta>, terms: &BTreeMap<String, InvertedList>) -> Result<String> {
    let snapshot = SnapshotRef {
        doc_data: docs,
        index: terms
            .values()
            .map(|list| TermRef { term: list.term(), posting_list: list.posting_lists() })
            .collect(),
    };
    serde_json::to_string(&snapshot).map_err(|e| Error::Io(e.into()))
}

pub(crate) fn decode(json: &str) -> Result<IndexParts> {
    let raw: SnapshotOwned = serde_json::from_str(json).map_err(Error::malformed)?;
    rebuild(raw)
}

fn rebuild(raw: SnapshotOwned) -> Result<IndexParts> {
    let mut slugs = HashMap::with_capacity(raw.doc_data.len());
    for (&doc_id, meta) in &raw.doc_data {
        if doc_id == 0 {
            return Err(Error::malformed("doc id 0 is not allocatable"));
        }
        if let Some(prev) = slugs.insert(meta.slug.clone(), doc_id) {
            return Err(Error::malformed(format!(
                "slug {:?} belongs to docs {prev} and {doc_id}",
                meta.slug
            )));
        }
    }

    let mut observed: HashMap<DocId, u64> = HashMap::with_capacity(raw.doc_data.len());
    let mut doc_terms: HashMap<DocId, Vec<String>> = HashMap::with_capacity(raw.doc_data.len());
    let mut terms = BTreeMap::new();
    for entry in raw.index {
        if entry.posting_list.is_empty() {
            continue;
        }
        let list = InvertedList::from_posting_lists(entry.term, entry.posting_list)?;
        for pl in list.posting_lists() {
            if !raw.doc_data.contains_key(&pl.doc_id) {
                return Err(Error::malformed(format!(
                    "term {:?} references unknown doc {}",
                    list.term(),
                    pl.doc_id
                )));
            }
            *observed.entry(pl.doc_id).or_insert(0) += pl.term_frequency() as u64;
            doc_terms.entry(pl.doc_id).or_default().push(list.term().to_string());
        }
        if terms.contains_key(list.term()) {
            return Err(Error::malformed(format!("term {:?} appears twice", list.term())));
        }
        terms.insert(list.term().to_string(), list);
    }

    let mut num_terms = 0u64;
    for (doc_id, meta) in &raw.doc_data {
        let seen = observed.get(doc_id).copied().unwrap_or(0);
        if seen != meta.num_terms as u64 {
            return Err(Error::malformed(format!(
                "doc {doc_id} records {} terms but has {seen} postings",
                meta.num_terms
            )));
        }
        num_terms += seen;
        doc_terms.entry(*doc_id).or_default();
    }

    let next_doc_id = match raw.doc_data.keys().next_back() {
        None => 1,
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| Error::malformed(format!("doc id {max} leaves no id to allocate")))?,
    };
    Ok(IndexParts { terms, docs: raw.doc_data, slugs, doc_terms, num_terms, next_doc_id })
}
