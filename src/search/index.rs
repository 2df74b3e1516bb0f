//! Immutable index snapshots
//!
//! A `Snapshot` bundles everything the query path needs: the ordered
//! document list, an inverted postings map, per-document term frequencies
//! and lengths, and the global idf table. Snapshots are built fully off
//! to the side and never mutated after construction; readers address
//! documents by position, which is only meaningful within one snapshot.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::model::Message;
use crate::search::tokenizer::{stem, tokenize};

/// A fully-built, immutable search index over one document list
///
/// `version` increments by exactly 1 per rebuild; version 0 is the empty
/// "no index yet" snapshot a fresh engine starts with.
#[derive(Debug)]
pub struct Snapshot {
    pub version: u64,
    pub documents: Arc<Vec<Message>>,
    /// term -> positions containing it (stemmed, name, and raw terms)
    pub postings: HashMap<String, HashSet<usize>>,
    /// per-position counts over stemmed message terms + stemmed name terms
    pub term_freq: Vec<HashMap<String, u32>>,
    /// per-position searchable token count, floored to 1
    pub doc_lengths: Vec<u32>,
    /// term -> ln(total_docs / document_frequency), always >= 0
    pub idf: HashMap<String, f64>,
}

impl Snapshot {
    /// The initial snapshot before any refresh has published documents
    pub fn empty() -> Self {
        Self {
            version: 0,
            documents: Arc::new(Vec::new()),
            postings: HashMap::new(),
            term_freq: Vec::new(),
            doc_lengths: Vec::new(),
            idf: HashMap::new(),
        }
    }

    /// Build a snapshot from an ordered document list
    ///
    /// For each document: the message text is tokenized with stopwords
    /// removed, then stemmed; the user name is tokenized without stopword
    /// removal (names like "Will" must stay searchable) and stemmed.
    /// Frequencies and lengths count stemmed message terms plus name
    /// terms; postings additionally receive the unstemmed message terms so
    /// exact raw-word queries hit alongside stemmed ones.
    pub fn build(version: u64, documents: Arc<Vec<Message>>) -> Self {
        let mut postings: HashMap<String, HashSet<usize>> = HashMap::new();
        let mut term_freq: Vec<HashMap<String, u32>> = Vec::with_capacity(documents.len());
        let mut doc_lengths: Vec<u32> = Vec::with_capacity(documents.len());

        for (position, msg) in documents.iter().enumerate() {
            let raw_terms = tokenize(&msg.message, true);
            let stemmed = raw_terms.iter().map(|t| stem(t));
            let name_tokens = tokenize(&msg.user_name, false);
            let name_terms = name_tokens.iter().map(|t| stem(t));

            let mut tf: HashMap<String, u32> = HashMap::new();
            let mut token_count: u32 = 0;
            for term in stemmed.chain(name_terms) {
                *tf.entry(term).or_insert(0) += 1;
                token_count += 1;
            }

            for term in tf.keys() {
                postings.entry(term.clone()).or_default().insert(position);
            }
            for term in raw_terms {
                postings.entry(term).or_default().insert(position);
            }

            term_freq.push(tf);
            doc_lengths.push(token_count.max(1));
        }

        let total = documents.len() as f64;
        let idf = postings
            .iter()
            .map(|(term, positions)| (term.clone(), (total / positions.len() as f64).ln()))
            .collect();

        Self {
            version,
            documents,
            postings,
            term_freq,
            doc_lengths,
            idf,
        }
    }

    /// Number of indexed documents
    pub fn total_documents(&self) -> usize {
        self.documents.len()
    }

    /// Number of distinct terms in the postings map
    pub fn term_count(&self) -> usize {
        self.postings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(id: &str, user_name: &str, message: &str) -> Message {
        Message::new(id, format!("u-{id}"), user_name, message).timestamp(Utc::now())
    }

    fn build(messages: Vec<Message>) -> Snapshot {
        Snapshot::build(1, Arc::new(messages))
    }

    #[test]
    fn test_empty_snapshot_is_version_zero() {
        let snap = Snapshot::empty();
        assert_eq!(snap.version, 0);
        assert_eq!(snap.total_documents(), 0);
        assert!(snap.postings.is_empty());
        assert!(snap.idf.is_empty());
    }

    #[test]
    fn test_postings_hold_raw_and_stemmed_forms() {
        let snap = build(vec![doc("1", "John Doe", "Booking flights")]);

        // stemmed forms from the message
        assert!(snap.postings.contains_key("book"));
        assert!(snap.postings.contains_key("flight"));
        // raw forms too
        assert!(snap.postings.contains_key("booking"));
        assert!(snap.postings.contains_key("flights"));
        // name terms, stemmed
        assert!(snap.postings.contains_key("john"));
        assert!(snap.postings.contains_key("doe"));
    }

    #[test]
    fn test_raw_terms_do_not_inflate_frequencies() {
        let snap = build(vec![doc("1", "John Doe", "Booking flights")]);

        let tf = &snap.term_freq[0];
        assert_eq!(tf.get("book"), Some(&1));
        assert_eq!(tf.get("flight"), Some(&1));
        // raw forms live only in postings
        assert_eq!(tf.get("booking"), None);
        assert_eq!(tf.get("flights"), None);
        // 2 stemmed message terms + 2 name terms
        assert_eq!(snap.doc_lengths[0], 4);
    }

    #[test]
    fn test_user_name_keeps_stopwords() {
        // "will" is a stopword in message text but must stay searchable
        // as a name.
        let snap = build(vec![doc("1", "Will Smith", "They will arrive soon")]);

        assert!(snap.postings.contains_key("will"));
        let positions = &snap.postings["will"];
        assert!(positions.contains(&0));
        // the message-side "will" was removed, so frequency comes from
        // the name alone
        assert_eq!(snap.term_freq[0].get("will"), Some(&1));
    }

    #[test]
    fn test_doc_length_floored_to_one() {
        let snap = build(vec![doc("1", "", "the and of")]);

        assert_eq!(snap.doc_lengths[0], 1);
        assert!(snap.term_freq[0].is_empty());
    }

    #[test]
    fn test_term_frequency_counts_repeats() {
        let snap = build(vec![doc("1", "John Doe", "Paris Paris Paris")]);
        assert_eq!(snap.term_freq[0].get("pari"), Some(&3));
        // 3 message terms + 2 name terms
        assert_eq!(snap.doc_lengths[0], 5);
    }

    #[test]
    fn test_idf_zero_iff_term_in_every_document() {
        let snap = build(vec![
            doc("1", "John Doe", "Paris hotel"),
            doc("2", "Jane Smith", "Paris opera"),
        ]);

        // "pari" appears in both documents
        let ubiquitous = snap.idf["pari"];
        assert!(ubiquitous.abs() < f64::EPSILON);
        // "hotel" appears in one of two
        let rare = snap.idf["hotel"];
        assert!(rare > 0.0);
        assert!((rare - (2.0f64).ln()).abs() < 1e-12);
        // never negative
        assert!(snap.idf.values().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_build_is_deterministic() {
        let messages = vec![
            doc("1", "John Doe", "Book a flight to Paris"),
            doc("2", "Jane Smith", "Reserve a table"),
        ];
        let a = Snapshot::build(3, Arc::new(messages.clone()));
        let b = Snapshot::build(3, Arc::new(messages));

        assert_eq!(a.postings, b.postings);
        assert_eq!(a.term_freq, b.term_freq);
        assert_eq!(a.doc_lengths, b.doc_lengths);
        assert_eq!(a.idf, b.idf);
    }
}
