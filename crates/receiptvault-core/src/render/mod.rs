//! Receipt document handover
//!
//! Builds the consistent snapshot a document renderer consumes. Layout and
//! typesetting belong to the renderer; the Markdown form here is what the
//! CLI prints.

pub mod amount_words;
pub mod receipt_document;

pub use amount_words::{amount_in_words, format_inr};
pub use receipt_document::{render_markdown, FeeLine, ReceiptDocument};
