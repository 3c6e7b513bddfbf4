//! Page handling module
//!
//! Parsed pages and the embedder-supplied logic that classifies their links
//! and turns them into records.

mod handler;
mod page;
mod selector;

pub use handler::{HandlerError, PageHandler, Record};
pub use page::Page;
pub use selector::SelectorHandler;
