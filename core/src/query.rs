use crate::tokenizer::Tokenizer;
use std::collections::HashMap;

/// Distinct query terms in first-appearance order plus how often each was
/// asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    pub terms: Vec<String>,
    pub term_counts: HashMap<String, u32>,
}

impl ParsedQuery {
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Query frequency of `term`, 0 if absent.
    pub fn count(&self, term: &str) -> u32 {
        self.term_counts.get(term).copied().unwrap_or(0)
    }
}

/// Turns free query text into terms and query frequencies.
pub trait QueryProcessor: Send + Sync {
    fn process(&self, query: &str, tokenizer: &dyn Tokenizer) -> ParsedQuery;
}

/// Every token is a term; repeated tokens raise its query frequency.
#[derive(Debug, Default, Clone, Copy)]
pub struct BagOfWords;

impl QueryProcessor for BagOfWords {
    fn process(&self, query: &str, tokenizer: &dyn Tokenizer) -> ParsedQuery {
        let mut parsed = ParsedQuery::default();
        for term in tokenizer.tokens(query) {
            let count = parsed.term_counts.entry(term.clone()).or_insert(0);
            if *count == 0 {
                parsed.terms.push(term);
            }
            *count += 1;
        }
        parsed
    }
}
