//! Concord - multi-source retrieval with authority-aware consistency analysis
//!
//! Passages from documentation, blogs and forums are embedded into a
//! weighted similarity index, reranked by a relevance scorer, and handed to
//! a reasoning service that reports whether the sources agree and which
//! answer the most authoritative source supports.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod index;
pub mod ingest;
pub mod pipeline;
pub mod report;
pub mod retrieval;

pub use error::{ConcordError, Result};
