use docrank::{Error, Index, ScoringFunction};

const BOTH: [ScoringFunction; 2] = [ScoringFunction::Bm25, ScoringFunction::QueryLikelihood];

#[test]
fn single_term_hits_only_matching_document() {
    let mut index = Index::new();
    index.index_string("the cat sat", "a", false).unwrap();
    index.index_string("the dog sat down", "b", false).unwrap();

    let hits = index.search("cat", ScoringFunction::Bm25);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].identifier, "a");
    // one match in two documents: the IDF factor is log10(1) = 0
    assert!(hits[0].score.abs() < 1e-12);

    index.index_string("a bird sang", "c", false).unwrap();
    let hits = index.search("cat", ScoringFunction::Bm25);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].identifier, "a");
    assert!(hits[0].score > 0.0);
}

#[test]
fn higher_term_frequency_ranks_first() {
    let mut index = Index::new();
    index.index_string("foo bar baz", "x", false).unwrap();
    index.index_string("foo foo foo", "y", false).unwrap();
    index.index_string("foo foo baz", "z", false).unwrap();
    // documents without the term keep its IDF positive
    for (i, text) in ["apple pear plum", "wind rain snow", "iron gold lead", "oak elm ash"].iter().enumerate() {
        index.index_string(text, &format!("filler-{i}"), false).unwrap();
    }

    let hits = index.search("foo", ScoringFunction::Bm25);
    assert_eq!(hits.len(), 3);
    let score = |id: &str| hits.iter().find(|h| h.identifier == id).unwrap().score;
    assert!(score("y") >= score("x"));
    assert!(score("y") >= score("z"));
    assert_eq!(hits[0].identifier, "y");
}

#[test]
fn term_in_most_documents_scores_negative_under_bm25() {
    let mut index = Index::new();
    index.index_string("common rare", "a", false).unwrap();
    index.index_string("common", "b", false).unwrap();
    index.index_string("common words", "c", false).unwrap();

    let hits = index.search("common", ScoringFunction::Bm25);
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|h| h.score < 0.0));
}

#[test]
fn document_errors_and_overwrite() {
    let mut index = Index::new();
    index.index_string("penguins swim in cold water", "post", false).unwrap();

    let err = index.remove_document("ghost").unwrap_err();
    assert!(matches!(err, Error::NoSuchDocument(ref id) if id == "ghost"));

    let err = index.index_string("camels cross deserts", "post", false).unwrap_err();
    assert!(matches!(err, Error::DuplicateDocument(_)));
    assert!(index.search("camels", ScoringFunction::Bm25).is_empty());

    index.index_string("camels cross deserts", "post", true).unwrap();
    assert_eq!(index.num_docs(), 1);
    for scoring in BOTH {
        assert!(index.search("penguins", scoring).is_empty());
        let hits = index.search("camels", scoring);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].identifier, "post");
    }
}

#[test]
fn empty_index_returns_nothing() {
    let index = Index::new();
    for scoring in BOTH {
        assert!(index.search("anything at all", scoring).is_empty());
        assert!(index.search("", scoring).is_empty());
    }
}

#[test]
fn multi_term_query_visits_each_document_once() {
    let mut index = Index::new();
    let docs = [
        ("d1", "rust compiler borrow checker"),
        ("d2", "python interpreter"),
        ("d3", "rust cargo crates"),
        ("d4", "compiler optimizations"),
        ("d5", "gardening tips"),
    ];
    for (id, text) in docs {
        index.index_string(text, id, false).unwrap();
    }

    for scoring in BOTH {
        let hits = index.search("rust compiler rust", scoring);
        let mut ids: Vec<&str> = hits.iter().map(|h| h.identifier.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["d1", "d3", "d4"]);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn searches_are_repeatable() {
    let mut index = Index::new();
    index.index_string("alpha beta gamma", "one", false).unwrap();
    index.index_string("beta gamma delta", "two", false).unwrap();
    index.index_string("gamma delta epsilon", "three", false).unwrap();

    for scoring in BOTH {
        let first = index.search("beta delta", scoring);
        let second = index.search("beta delta", scoring);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.identifier, b.identifier);
            assert!((a.score - b.score).abs() < 1e-9);
        }
    }
}

#[test]
fn index_file_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("note.txt");
    std::fs::write(&path, "lighthouse keeper logbook").unwrap();

    let mut index = Index::new();
    index.index_file(&path, "note").unwrap();
    assert_eq!(index.search("lighthouse", ScoringFunction::Bm25)[0].identifier, "note");

    let err = index.index_file(&path, "note").unwrap_err();
    assert!(matches!(err, Error::DuplicateDocument(_)));
    let err = index.index_file(dir.path().join("missing.txt"), "missing").unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(index.num_docs(), 1);
}
