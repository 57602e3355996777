use crate::{DocId, Position};
use serde::{Deserialize, Serialize};

/// Positions of one term within one document, in increasing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingList {
    pub doc_id: DocId,
    pub postings: Vec<Position>,
}

impl PostingList {
    pub fn new(doc_id: DocId) -> Self {
        Self { doc_id, postings: Vec::new() }
    }

    /// Records one more occurrence. Documents are scanned front to back, so
    /// positions always arrive in increasing order.
    pub fn append(&mut self, position: Position) {
        debug_assert!(self.postings.last().map_or(true, |&last| last < position));
        self.postings.push(position);
    }

    pub fn term_frequency(&self) -> u32 {
        self.postings.len() as u32
    }

    pub(crate) fn positions_strictly_increasing(&self) -> bool {
        self.postings.windows(2).all(|w| w[0] < w[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_tracks_frequency() {
        let mut pl = PostingList::new(4);
        assert_eq!(pl.term_frequency(), 0);
        pl.append(0);
        pl.append(7);
        pl.append(9);
        assert_eq!(pl.term_frequency(), 3);
        assert_eq!(pl.postings, vec![0, 7, 9]);
    }

    #[test]
    fn wire_format() {
        let mut pl = PostingList::new(2);
        pl.append(1);
        pl.append(5);
        let json = serde_json::to_value(&pl).unwrap();
        assert_eq!(json, serde_json::json!({ "doc_id": 2, "postings": [1, 5] }));

        let back: PostingList = serde_json::from_value(json).unwrap();
        assert_eq!(back, pl);
    }

    #[test]
    fn detects_unordered_positions() {
        let pl = PostingList { doc_id: 1, postings: vec![3, 3] };
        assert!(!pl.positions_strictly_increasing());
        let pl = PostingList { doc_id: 1, postings: vec![0, 2, 8] };
        assert!(pl.positions_strictly_increasing());
    }
}
