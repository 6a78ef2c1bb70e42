/// Text embedding behind a provider trait
///
/// - EmbeddingProvider trait for abstraction over backends and test doubles
/// - FastEmbedProvider for local embedding (all-MiniLM-L6-v2, 384-dim)
mod provider;

pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedProvider};
