//! Document retrieval engine: positional inverted index, document-at-a-time
//! query evaluation, and BM25 / query-likelihood ranking.
//!
//! ```
//! use docrank::{Index, ScoringFunction};
//!
//! let mut index = Index::new();
//! index.index_string("the cat sat", "a", false).unwrap();
//! index.index_string("the dog sat down", "b", false).unwrap();
//!
//! let hits = index.search("cat", ScoringFunction::Bm25);
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].identifier, "a");
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod inverted_list;
pub mod persist;
pub mod posting;
pub mod query;
pub mod results;
pub mod scoring;
pub mod snapshot;
pub mod tokenizer;

pub use config::IndexConfig;
pub use error::{Error, Result};
pub use index::{DocMeta, Index, IndexStats};
pub use inverted_list::{InvertedList, PostingCursor};
pub use posting::PostingList;
pub use query::{BagOfWords, ParsedQuery, QueryProcessor};
pub use results::SearchHit;
pub use scoring::{Bm25, QueryLikelihood, ScoringFunction};
pub use tokenizer::{PlainTokenizer, StemmingTokenizer, Tokenizer};

/// Document identifier allocated by the index, starting at 1.
pub type DocId = u32;

/// 0-based offset of a term inside its document's token stream.
pub type Position = u32;
