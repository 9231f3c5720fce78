//! rtfstream - A streaming event parser for Rich Text Format (RTF)
//!
//! This crate tokenizes RTF, tracks a hierarchical lexical scope stack, and
//! emits semantic events — paragraph boundaries, formatted text runs, fields,
//! and embedded images — to a host-supplied [`Callbacks`] implementation.
//!
//! It deliberately stops short of building a document tree: there is no font
//! table, style sheet, or section model here, and no rendering or layout.
//! What it gives you is the resolved formatting and destination state at each
//! point in the stream, so a caller can build whatever document model or
//! plain-text projection it actually needs.
//!
//! # Example
//!
//! ```
//! use rtfstream::{Callbacks, FullState, ParserView, RtfParser};
//!
//! struct PlainText(String);
//!
//! impl Callbacks for PlainText {
//!     fn on_open_paragraph(&mut self, _parser: &ParserView<'_>) {}
//!     fn on_append_paragraph(&mut self, _parser: &ParserView<'_>, text: &str) {
//!         self.0.push_str(text);
//!     }
//!     fn on_state_change(&mut self, _parser: &ParserView<'_>, _old: &FullState, _new: &FullState) {}
//!     fn on_field(&mut self, _parser: &ParserView<'_>, _fldinst: &str, fldrslt: &str) {
//!         self.0.push_str(fldrslt);
//!     }
//!     fn on_close_paragraph(&mut self, _parser: &ParserView<'_>) {
//!         self.0.push('\n');
//!     }
//! }
//!
//! let mut parser = RtfParser::new(PlainText(String::new()));
//! parser.open_string(r"{\rtf1 Hello, \b world\b0!\par}");
//! parser.parse().unwrap();
//! assert_eq!(parser.callbacks().0, "Hello, world!\n");
//! ```

pub mod rtf;

pub use rtf::{
    Alignment, Callbacks, FormatState, FullState, ParserView, PictureValue, RtfError, RtfParser,
    RtfResult, Scope, ScopeStack, Token, Tokenizer, is_attribute_format, split_control_word,
};
