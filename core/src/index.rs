//! The index: term map, document table, aggregates, and query evaluation.
//!
//! Queries are evaluated document-at-a-time. Each query term gets its own
//! [`PostingCursor`]; the loop repeatedly takes the smallest current doc id
//! across all cursors, scores that document against every query term, then
//! moves every cursor past it. Each posting list is read once per query and
//! every document containing at least one query term is scored exactly once.
//!
//! Not internally synchronized. Searches only need `&self`, so callers can
//! share an index behind a read-write lock and run searches concurrently.

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::inverted_list::{InvertedList, PostingCursor};
use crate::persist::{load_snapshot, save_snapshot};
use crate::query::{BagOfWords, QueryProcessor};
use crate::results::{self, SearchHit};
use crate::scoring::ScoringFunction;
use crate::snapshot::{self, IndexParts};
use crate::tokenizer::{StemmingTokenizer, Tokenizer};
use crate::{DocId, Position};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Per-document metadata, stored under its doc id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    /// Caller-supplied identifier, returned in search hits.
    pub slug: String,
    /// Document length: total term occurrences.
    #[serde(rename = "numTerms")]
    pub num_terms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexStats {
    pub num_docs: u32,
    pub num_terms: u64,
    pub vocabulary_size: usize,
    pub average_doc_length: f64,
}

pub struct Index {
    terms: BTreeMap<String, InvertedList>,
    docs: BTreeMap<DocId, DocMeta>,
    slugs: HashMap<String, DocId>,
    /// Distinct terms of each document, so removal only visits its lists.
    doc_terms: HashMap<DocId, Vec<String>>,
    num_terms: u64,
    next_doc_id: DocId,
    config: IndexConfig,
    tokenizer: Arc<dyn Tokenizer>,
    query_processor: Arc<dyn QueryProcessor>,
    snapshot_path: Option<PathBuf>,
}

/// Scan state for one query term.
struct TermScan<'a> {
    cursor: PostingCursor<'a>,
    qf: f64,
    n: f64,
    cq: f64,
}

impl Index {
    pub fn new() -> Self {
        Self {
            terms: BTreeMap::new(),
            docs: BTreeMap::new(),
            slugs: HashMap::new(),
            doc_terms: HashMap::new(),
            num_terms: 0,
            next_doc_id: 1,
            config: IndexConfig::default(),
            tokenizer: Arc::new(StemmingTokenizer),
            query_processor: Arc::new(BagOfWords),
            snapshot_path: None,
        }
    }

    pub fn with_config(mut self, config: IndexConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the tokenizer and query processor. Only sensible on an empty
    /// index or one whose postings were produced by the same tokenizer.
    pub fn with_analysis<T, Q>(mut self, tokenizer: T, query_processor: Q) -> Self
    where
        T: Tokenizer + 'static,
        Q: QueryProcessor + 'static,
    {
        self.tokenizer = Arc::new(tokenizer);
        self.query_processor = Arc::new(query_processor);
        self
    }

    /// Restores from `path` if it exists, otherwise starts empty. Either way
    /// `commit` writes back to `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut index = Self::new();
        if path.exists() {
            index.restore_from_file(path)?;
        } else {
            tracing::info!(path = %path.display(), "no snapshot yet, starting empty");
            index.snapshot_path = Some(path.to_path_buf());
        }
        Ok(index)
    }

    /// Parses a snapshot produced by [`Index::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        let mut index = Self::new();
        index.install(snapshot::decode(json)?);
        Ok(index)
    }

    pub fn to_json(&self) -> Result<String> {
        snapshot::encode(&self.docs, &self.terms)
    }

    /// Indexes raw text under `identifier`. With `allow_overwrite`, an
    /// existing document of that identifier is purged first; without it,
    /// re-indexing fails and the index is left untouched.
    pub fn index_string(&mut self, text: &str, identifier: &str, allow_overwrite: bool) -> Result<DocId> {
        let tokens: Vec<String> = self.tokenizer.tokens(text).collect();
        let doc_id = self.peek_doc_id()?;
        self.claim_identifier(identifier, allow_overwrite)?;
        self.index_tokens(doc_id, identifier, tokens);
        Ok(doc_id)
    }

    /// Reads and indexes a file. An identifier already in the index is
    /// rejected with [`Error::DuplicateDocument`].
    pub fn index_file(&mut self, path: impl AsRef<Path>, identifier: &str) -> Result<DocId> {
        let text = std::fs::read_to_string(path.as_ref())?;
        self.index_string(&text, identifier, false)
    }

    pub fn remove_document(&mut self, identifier: &str) -> Result<()> {
        let doc_id = self
            .slugs
            .get(identifier)
            .copied()
            .ok_or_else(|| Error::NoSuchDocument(identifier.to_string()))?;
        self.purge(doc_id);
        tracing::debug!(identifier, doc_id, "removed document");
        Ok(())
    }

    pub fn clear_all_data(&mut self) {
        self.terms.clear();
        self.docs.clear();
        self.slugs.clear();
        self.doc_terms.clear();
        self.num_terms = 0;
        tracing::info!("cleared index");
    }

    /// Ranked hits for `query`, highest score first, ties by ascending doc
    /// id. Empty when the index or the parsed query is empty.
    pub fn search(&self, query: &str, scoring: ScoringFunction) -> Vec<SearchHit> {
        if self.docs.is_empty() {
            return Vec::new();
        }
        let parsed = self.query_processor.process(query, self.tokenizer.as_ref());
        if parsed.is_empty() {
            return Vec::new();
        }

        let mut scans: Vec<TermScan<'_>> = parsed
            .terms
            .iter()
            .map(|term| {
                let list = self.terms.get(term);
                TermScan {
                    cursor: list.map_or_else(PostingCursor::empty, |l| l.cursor()),
                    qf: parsed.count(term) as f64,
                    n: list.map_or(0, |l| l.num_docs()) as f64,
                    cq: list.map_or(0, |l| l.num_postings()) as f64,
                }
            })
            .collect();

        let num_docs = self.docs.len() as f64;
        let avdl = self.average_doc_length();
        let total = self.num_terms as f64;
        let mut candidates = Vec::new();

        while let Some(candidate) = scans.iter().filter_map(|s| s.cursor.current_doc_id()).min() {
            let dl = self.docs.get(&candidate).map_or(0.0, |m| m.num_terms as f64);
            let score: f64 = scans
                .iter()
                .map(|s| {
                    let f = if s.cursor.current_doc_id() == Some(candidate) {
                        s.cursor.term_freq() as f64
                    } else {
                        0.0
                    };
                    match scoring {
                        ScoringFunction::Bm25 => self.config.bm25.score(s.qf, f, s.n, num_docs, dl, avdl),
                        ScoringFunction::QueryLikelihood => {
                            self.config.query_likelihood.score(f, dl, s.cq, total)
                        }
                    }
                })
                .sum();
            candidates.push((candidate, score));
            for s in &mut scans {
                s.cursor.move_past(candidate);
            }
        }

        tracing::debug!(query, %scoring, terms = parsed.terms.len(), hits = candidates.len(), "search");
        results::rank(candidates, |doc_id| self.docs.get(&doc_id).map(|m| m.slug.as_str()))
    }

    /// [`Index::search`] truncated to the best `k` hits.
    pub fn search_top_k(&self, query: &str, scoring: ScoringFunction, k: usize) -> Vec<SearchHit> {
        let mut hits = self.search(query, scoring);
        hits.truncate(k);
        hits
    }

    /// Writes the snapshot to the path this index was opened or restored from.
    pub fn commit(&self) -> Result<()> {
        let path = self.snapshot_path.as_deref().ok_or(Error::NoSnapshotPath)?;
        self.save_to_file(path)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        save_snapshot(path, &self.to_json()?)?;
        tracing::info!(path = %path.display(), num_docs = self.num_docs(), "saved snapshot");
        Ok(())
    }

    /// Replaces the whole in-memory state with the snapshot at `path` and
    /// binds `path` for `commit`. On error nothing changes.
    pub fn restore_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let parts = snapshot::decode(&load_snapshot(path)?)?;
        self.install(parts);
        self.snapshot_path = Some(path.to_path_buf());
        tracing::info!(path = %path.display(), num_docs = self.num_docs(), num_terms = self.num_terms, "restored snapshot");
        Ok(())
    }

    pub fn num_docs(&self) -> u32 {
        self.docs.len() as u32
    }

    /// Total term occurrences across all documents.
    pub fn num_terms(&self) -> u64 {
        self.num_terms
    }

    /// Number of distinct terms.
    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    pub fn average_doc_length(&self) -> f64 {
        if self.docs.is_empty() {
            return 0.0;
        }
        self.num_terms as f64 / self.docs.len() as f64
    }

    pub fn inverted_list(&self, term: &str) -> Option<&InvertedList> {
        self.terms.get(term)
    }

    pub fn inverted_lists(&self) -> impl Iterator<Item = &InvertedList> {
        self.terms.values()
    }

    pub fn doc_id(&self, identifier: &str) -> Option<DocId> {
        self.slugs.get(identifier).copied()
    }

    pub fn doc_meta(&self, doc_id: DocId) -> Option<&DocMeta> {
        self.docs.get(&doc_id)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.slugs.contains_key(identifier)
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            num_docs: self.num_docs(),
            num_terms: self.num_terms,
            vocabulary_size: self.vocabulary_size(),
            average_doc_length: self.average_doc_length(),
        }
    }

    /// Frees `identifier` for a new document or reports why it can't be.
    fn claim_identifier(&mut self, identifier: &str, allow_overwrite: bool) -> Result<()> {
        match self.slugs.get(identifier).copied() {
            None => Ok(()),
            Some(_) if !allow_overwrite => Err(Error::DuplicateDocument(identifier.to_string())),
            Some(doc_id) => {
                self.purge(doc_id);
                tracing::debug!(identifier, doc_id, "purged previous version");
                Ok(())
            }
        }
    }

    /// The id the next document will get. The last `DocId` is never handed
    /// out so the counter itself cannot overflow.
    fn peek_doc_id(&self) -> Result<DocId> {
        match self.next_doc_id.checked_add(1) {
            Some(_) => Ok(self.next_doc_id),
            None => Err(Error::DocIdsExhausted),
        }
    }

    fn index_tokens(&mut self, doc_id: DocId, identifier: &str, tokens: Vec<String>) {
        self.next_doc_id = doc_id + 1;

        let token_count = tokens.len() as u32;
        let mut distinct = Vec::new();
        for (position, token) in tokens.into_iter().enumerate() {
            let list = self
                .terms
                .entry(token)
                .or_insert_with_key(|term| InvertedList::new(term.as_str()));
            if list.posting_lists().last().map(|pl| pl.doc_id) != Some(doc_id) {
                distinct.push(list.term().to_string());
            }
            list.add_posting(doc_id, position as Position);
        }

        self.docs.insert(doc_id, DocMeta { slug: identifier.to_string(), num_terms: token_count });
        self.slugs.insert(identifier.to_string(), doc_id);
        self.num_terms += token_count as u64;
        self.doc_terms.insert(doc_id, distinct);
        tracing::debug!(identifier, doc_id, num_terms = token_count, "indexed document");
    }

    /// Drops a document's postings from the lists of its terms and its
    /// metadata. Lists left empty are removed from the term map.
    fn purge(&mut self, doc_id: DocId) {
        for term in self.doc_terms.remove(&doc_id).unwrap_or_default() {
            if let Some(list) = self.terms.get_mut(&term) {
                list.remove_doc(doc_id);
                if list.is_empty() {
                    self.terms.remove(&term);
                }
            }
        }
        if let Some(meta) = self.docs.remove(&doc_id) {
            self.num_terms -= meta.num_terms as u64;
            self.slugs.remove(&meta.slug);
        }
    }

    fn install(&mut self, parts: IndexParts) {
        self.terms = parts.terms;
        self.docs = parts.docs;
        self.slugs = parts.slugs;
        self.doc_terms = parts.doc_terms;
        self.num_terms = parts.num_terms;
        self.next_doc_id = self.next_doc_id.max(parts.next_doc_id);
    }
}

impl Default for Index {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("num_docs", &self.num_docs())
            .field("num_terms", &self.num_terms)
            .field("vocabulary_size", &self.vocabulary_size())
            .field("next_doc_id", &self.next_doc_id)
            .field("snapshot_path", &self.snapshot_path)
            .finish()
    }
}
