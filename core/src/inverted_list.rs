//! Per-term posting storage and the forward-only cursor used by the
//! document-at-a-time merge.
//!
//! The traversal position lives in [`PostingCursor`], which borrows the list
//! immutably. Every query builds its own cursors, so any number of searches
//! can walk the same lists at once.

use crate::error::{Error, Result};
use crate::posting::PostingList;
use crate::{DocId, Position};

/// All postings of one term, ordered by doc id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvertedList {
    term: String,
    posting_lists: Vec<PostingList>,
    num_postings: u64,
}

impl InvertedList {
    pub fn new(term: impl Into<String>) -> Self {
        Self { term: term.into(), posting_lists: Vec::new(), num_postings: 0 }
    }

    /// Rebuilds a list from restored postings, recomputing its aggregates.
    ///
    /// Doc ids must be strictly increasing and each document's positions
    /// strictly increasing; empty per-document entries are rejected.
    pub fn from_posting_lists(term: impl Into<String>, posting_lists: Vec<PostingList>) -> Result<Self> {
        let term = term.into();
        if let Some(w) = posting_lists.windows(2).find(|w| w[0].doc_id >= w[1].doc_id) {
            return Err(Error::malformed(format!(
                "term {term:?}: doc ids not strictly increasing ({} then {})",
                w[0].doc_id, w[1].doc_id
            )));
        }
        for pl in &posting_lists {
            if pl.postings.is_empty() {
                return Err(Error::malformed(format!("term {term:?}: doc {} has no positions", pl.doc_id)));
            }
            if !pl.positions_strictly_increasing() {
                return Err(Error::malformed(format!(
                    "term {term:?}: positions for doc {} not strictly increasing",
                    pl.doc_id
                )));
            }
        }
        let num_postings = posting_lists.iter().map(|pl| pl.term_frequency() as u64).sum();
        Ok(Self { term, posting_lists, num_postings })
    }

    /// Appends one occurrence. Callers feed documents one at a time in
    /// increasing doc id order, so a doc id either matches the tail entry or
    /// opens a new one.
    pub fn add_posting(&mut self, doc_id: DocId, position: Position) {
        match self.posting_lists.last_mut() {
            Some(tail) if tail.doc_id == doc_id => tail.append(position),
            tail => {
                debug_assert!(tail.map_or(true, |t| t.doc_id < doc_id));
                let mut pl = PostingList::new(doc_id);
                pl.append(position);
                self.posting_lists.push(pl);
            }
        }
        self.num_postings += 1;
    }

    /// Drops the document's postings, if any, keeping aggregates in step.
    pub fn remove_doc(&mut self, doc_id: DocId) -> Option<PostingList> {
        let at = self.posting_lists.binary_search_by_key(&doc_id, |pl| pl.doc_id).ok()?;
        let removed = self.posting_lists.remove(at);
        self.num_postings -= removed.term_frequency() as u64;
        Some(removed)
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Number of documents containing the term.
    pub fn num_docs(&self) -> u32 {
        self.posting_lists.len() as u32
    }

    /// Total occurrences of the term across the collection.
    pub fn num_postings(&self) -> u64 {
        self.num_postings
    }

    pub fn posting_lists(&self) -> &[PostingList] {
        &self.posting_lists
    }

    pub fn is_empty(&self) -> bool {
        self.posting_lists.is_empty()
    }

    /// A fresh cursor positioned at the first document.
    pub fn cursor(&self) -> PostingCursor<'_> {
        PostingCursor::new(&self.posting_lists)
    }
}

/// Forward-only position within one term's postings.
#[derive(Debug, Clone, Copy)]
pub struct PostingCursor<'a> {
    lists: &'a [PostingList],
    pos: usize,
}

impl<'a> PostingCursor<'a> {
    pub fn new(lists: &'a [PostingList]) -> Self {
        Self { lists, pos: 0 }
    }

    /// Cursor over a term the index has never seen.
    pub fn empty() -> Self {
        Self::new(&[])
    }

    /// Rewinds to the first document. Nothing else moves the cursor back.
    pub fn reset(&mut self) {
        self.pos = 0;
    }

    pub fn finished(&self) -> bool {
        self.pos >= self.lists.len()
    }

    pub fn current_doc_id(&self) -> Option<DocId> {
        self.lists.get(self.pos).map(|pl| pl.doc_id)
    }

    /// Advances while the current doc id is below `target`. Returns whether
    /// the cursor now rests exactly on `target`.
    pub fn move_to(&mut self, target: DocId) -> bool {
        while self.current_doc_id().is_some_and(|id| id < target) {
            self.pos += 1;
        }
        self.current_doc_id() == Some(target)
    }

    /// Advances while the current doc id is at most `target`.
    pub fn move_past(&mut self, target: DocId) {
        while self.current_doc_id().is_some_and(|id| id <= target) {
            self.pos += 1;
        }
    }

    /// Term frequency in the current document, 0 once finished.
    pub fn term_freq(&self) -> u32 {
        self.lists.get(self.pos).map_or(0, PostingList::term_frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InvertedList {
        let mut list = InvertedList::new("cat");
        list.add_posting(1, 0);
        list.add_posting(1, 4);
        list.add_posting(3, 2);
        list.add_posting(6, 1);
        list.add_posting(6, 3);
        list.add_posting(6, 8);
        list
    }

    #[test]
    fn add_posting_groups_by_document() {
        let list = sample();
        assert_eq!(list.num_docs(), 3);
        assert_eq!(list.num_postings(), 6);
        let ids: Vec<DocId> = list.posting_lists().iter().map(|pl| pl.doc_id).collect();
        assert_eq!(ids, vec![1, 3, 6]);
        assert_eq!(list.posting_lists()[2].postings, vec![1, 3, 8]);
    }

    #[test]
    fn remove_doc_updates_aggregates() {
        let mut list = sample();
        let removed = list.remove_doc(6).unwrap();
        assert_eq!(removed.term_frequency(), 3);
        assert_eq!(list.num_docs(), 2);
        assert_eq!(list.num_postings(), 3);
        assert!(list.remove_doc(6).is_none());
        assert!(list.remove_doc(2).is_none());
    }

    #[test]
    fn move_to_reports_exact_hits() {
        let list = sample();
        let mut cur = list.cursor();
        assert_eq!(cur.current_doc_id(), Some(1));
        assert!(cur.move_to(1));
        assert_eq!(cur.term_freq(), 2);
        assert!(!cur.move_to(2));
        assert_eq!(cur.current_doc_id(), Some(3));
        assert!(cur.move_to(3));
        // never moves backwards
        assert!(!cur.move_to(1));
        assert_eq!(cur.current_doc_id(), Some(3));
        assert!(!cur.move_to(7));
        assert!(cur.finished());
        assert_eq!(cur.current_doc_id(), None);
        assert_eq!(cur.term_freq(), 0);
    }

    #[test]
    fn move_past_skips_target() {
        let list = sample();
        let mut cur = list.cursor();
        cur.move_past(3);
        assert_eq!(cur.current_doc_id(), Some(6));
        cur.move_past(6);
        assert!(cur.finished());
    }

    #[test]
    fn reset_allows_rescan() {
        let list = sample();
        let mut cur = list.cursor();
        let mut seen = Vec::new();
        let mut last = None;
        for target in [1, 2, 4, 6, 9] {
            cur.move_to(target);
            assert!(cur.current_doc_id() >= last || cur.finished());
            last = cur.current_doc_id();
            seen.push(last);
        }
        assert!(cur.finished());
        cur.reset();
        assert_eq!(cur.current_doc_id(), Some(1));
        assert_eq!(seen, vec![Some(1), Some(3), Some(6), Some(6), None]);
    }

    #[test]
    fn independent_cursors() {
        let list = sample();
        let mut a = list.cursor();
        let b = list.cursor();
        a.move_past(3);
        assert_eq!(a.current_doc_id(), Some(6));
        assert_eq!(b.current_doc_id(), Some(1));
    }

    #[test]
    fn empty_cursor_is_finished() {
        let mut cur = PostingCursor::empty();
        assert!(cur.finished());
        assert!(!cur.move_to(1));
        assert_eq!(cur.term_freq(), 0);
    }

    #[test]
    fn restore_recomputes_aggregates() {
        let postings = vec![
            PostingList { doc_id: 2, postings: vec![0, 5] },
            PostingList { doc_id: 9, postings: vec![1] },
        ];
        let list = InvertedList::from_posting_lists("dog", postings).unwrap();
        assert_eq!(list.num_docs(), 2);
        assert_eq!(list.num_postings(), 3);
    }

    #[test]
    fn restore_rejects_unordered_docs() {
        let postings = vec![
            PostingList { doc_id: 4, postings: vec![0] },
            PostingList { doc_id: 4, postings: vec![1] },
        ];
        let err = InvertedList::from_posting_lists("dog", postings).unwrap_err();
        assert!(matches!(err, Error::MalformedPersistedIndex(_)));
    }
}
