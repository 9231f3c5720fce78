//! Streaming RTF (Rich Text Format) parsing.
//!
//! Tokenizer, scope stack, and a state engine that drives a [`Callbacks`]
//! implementation. No document tree is built and no rendering or layout is
//! performed — see the crate-level documentation.

mod callbacks;
mod document;
mod engine;
mod error;
mod scope;
mod state;
mod token;

pub use callbacks::{Callbacks, ParserView};
pub use document::RtfParser;
pub use error::{RtfError, RtfResult};
pub use scope::{Scope, ScopeStack};
pub use state::{Alignment, FormatState, FullState, PictureValue, is_attribute_format};
pub use token::{Token, Tokenizer, split_control_word};
