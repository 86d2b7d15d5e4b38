//! A minimal in-memory BM25 index over `(id, text)` documents, used by
//! storage backends to implement `lexical_search` (spec §4.1).

use std::collections::HashMap;
use uuid::Uuid;

const K1: f64 = 1.2;
const B: f64 = 0.75;

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

struct Document {
    id: Uuid,
    term_counts: HashMap<String, u32>,
    length: usize,
}

/// A rebuildable BM25 index. Backends rebuild it whenever the underlying
/// memory set changes rather than maintaining incremental posting lists,
/// which keeps the storage layer simple at the cost of O(n) rebuild —
/// acceptable at the scale this engine targets (single-user, single-node).
#[derive(Default)]
pub struct Bm25Index {
    documents: Vec<Document>,
    document_frequency: HashMap<String, u32>,
    avg_doc_len: f64,
}

impl Bm25Index {
    #[must_use]
    pub fn build(corpus: &[(Uuid, &str)]) -> Self {
        let mut documents = Vec::with_capacity(corpus.len());
        let mut document_frequency: HashMap<String, u32> = HashMap::new();
        let mut total_len = 0usize;

        for (id, text) in corpus {
            let tokens = tokenize(text);
            total_len += tokens.len();
            let mut term_counts = HashMap::new();
            for token in &tokens {
                *term_counts.entry(token.clone()).or_insert(0) += 1;
            }
            for term in term_counts.keys() {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
            documents.push(Document {
                id: *id,
                term_counts,
                length: tokens.len(),
            });
        }

        let avg_doc_len = if documents.is_empty() {
            0.0
        } else {
            total_len as f64 / documents.len() as f64
        };

        Self {
            documents,
            document_frequency,
            avg_doc_len,
        }
    }

    /// Score and rank all documents against `query`, returning the top `k`
    /// `(id, score)` pairs in descending order. Documents scoring zero are
    /// omitted.
    #[must_use]
    pub fn search(&self, query: &str, k: usize) -> Vec<(Uuid, f64)> {
        let query_terms = tokenize(query);
        let n = self.documents.len() as f64;
        let mut scores: Vec<(Uuid, f64)> = self
            .documents
            .iter()
            .map(|doc| {
                let score: f64 = query_terms
                    .iter()
                    .map(|term| {
                        let Some(&tf) = doc.term_counts.get(term) else {
                            return 0.0;
                        };
                        let df = f64::from(*self.document_frequency.get(term).unwrap_or(&0));
                        if df == 0.0 {
                            return 0.0;
                        }
                        let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
                        let tf = f64::from(tf);
                        let norm_len = doc.length as f64 / self.avg_doc_len.max(1e-9);
                        idf * (tf * (K1 + 1.0)) / (tf + K1 * (1.0 - B + B * norm_len))
                    })
                    .sum();
                (doc.id, score)
            })
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scores.truncate(k);
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_term_match_outranks_unrelated_document() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let index = Bm25Index::build(&[
            (a, "JWT tokens need TTL checking for expiry"),
            (b, "log rotation uses daily index"),
        ]);
        let results = index.search("token expiry", 5);
        assert_eq!(results[0].0, a);
    }

    #[test]
    fn unknown_terms_score_zero_documents_are_excluded() {
        let a = Uuid::new_v4();
        let index = Bm25Index::build(&[(a, "hello world")]);
        assert!(index.search("nonexistent phrase", 5).is_empty());
    }

    #[test]
    fn empty_corpus_returns_empty_results() {
        let index = Bm25Index::build(&[]);
        assert!(index.search("anything", 5).is_empty());
    }
}
