//! Article retrieval for grounding chat replies.
//!
//! - `keywords`: query tokenization and genre synonym expansion
//! - `ContextRetriever`: keyword search with a newest-articles fallback
//! - `render_context`: the reference block handed to the prompt assembler

mod context_builder;
mod keywords;
mod retriever;

pub use context_builder::{render_context, CONTEXT_FOOTER, CONTEXT_HEADER, CONTEXT_INSTRUCTIONS};
pub use keywords::{extract_keywords, tokenize};
pub use retriever::ContextRetriever;
