//! Lexical search helpers shared by storage backends: a small BM25 scorer
//! and a fuzzy fallback for typo-tolerant recall (SPEC_FULL §4).

pub mod bm25;
pub mod fuzzy;

pub use bm25::Bm25Index;
pub use fuzzy::fuzzy_rank;
