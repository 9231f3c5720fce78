//! Public entry point: [`RtfParser`], the owner of the scope stack, the
//! destination buffers, and the callback set.

use super::callbacks::Callbacks;
use super::error::{RtfError, RtfResult};
use super::scope::ScopeStack;
use super::state::{FullState, is_attribute_format};
use super::token::Token;
use std::path::Path;

/// Streaming RTF parser.
///
/// Owns its scope stack, destination buffers, and cursor exclusively — it is
/// single-threaded and synchronous, with no suspension points. Construct one
/// with a [`Callbacks`] implementation, load a document with [`Self::open_string`]
/// or [`Self::open_file`], then drive it with [`Self::parse`].
///
/// # Examples
///
/// ```
/// use rtfstream::{Callbacks, FullState, ParserView, RtfParser};
///
/// struct Collector(String);
///
/// impl Callbacks for Collector {
///     fn on_open_paragraph(&mut self, _parser: &ParserView<'_>) {}
///     fn on_append_paragraph(&mut self, _parser: &ParserView<'_>, text: &str) {
///         self.0.push_str(text);
///     }
///     fn on_state_change(&mut self, _parser: &ParserView<'_>, _old: &FullState, _new: &FullState) {}
///     fn on_field(&mut self, _parser: &ParserView<'_>, _fldinst: &str, _fldrslt: &str) {}
/// }
///
/// let mut parser = RtfParser::new(Collector(String::new()));
/// parser.open_string(r"{\rtf1 Hello}");
/// parser.parse().unwrap();
/// assert_eq!(parser.callbacks().0, "Hello");
/// ```
pub struct RtfParser<C: Callbacks> {
    pub(crate) callbacks: C,
    pub(crate) scopes: ScopeStack,
    pub(crate) content: Option<String>,
    pub(crate) prev_token: Option<Token>,
    pub(crate) field_inst: String,
    pub(crate) field_rslt: String,
    pub(crate) pict_hex: String,
    pub(crate) blip_uid_buf: String,
    pub(crate) pending_ansi_skip: bool,
}

impl<C: Callbacks> RtfParser<C> {
    /// Construct a parser around the given callback set.
    ///
    /// A required callback missing at construction is the source parser's
    /// `ConfigurationError` — here the [`Callbacks`] trait's required methods
    /// have no default body, so that condition is a compile error rather than
    /// a runtime one (see DESIGN.md).
    pub fn new(callbacks: C) -> Self {
        Self {
            callbacks,
            scopes: ScopeStack::new(),
            content: None,
            prev_token: None,
            field_inst: String::new(),
            field_rslt: String::new(),
            pict_hex: String::new(),
            blip_uid_buf: String::new(),
            pending_ansi_skip: false,
        }
    }

    /// Clear all parser state so another document can be parsed.
    pub fn reset(&mut self) {
        self.content = None;
        self.scopes = ScopeStack::new();
        self.prev_token = None;
        self.field_inst.clear();
        self.field_rslt.clear();
        self.pict_hex.clear();
        self.blip_uid_buf.clear();
        self.pending_ansi_skip = false;
    }

    /// Read an entire RTF file into the internal buffer (text mode).
    pub fn open_file<P: AsRef<Path>>(&mut self, path: P) -> RtfResult<()> {
        self.reset();
        let text = std::fs::read_to_string(path).map_err(|e| RtfError::Io(e.to_string()))?;
        self.content = Some(text);
        Ok(())
    }

    /// Install an already-loaded string as the internal buffer.
    pub fn open_string(&mut self, rtf: impl Into<String>) {
        self.reset();
        self.content = Some(rtf.into());
    }

    /// True iff `name` is one of the five formatting attribute names.
    #[inline]
    pub fn is_attribute_format(&self, name: &str) -> bool {
        is_attribute_format(name)
    }

    /// The current fully resolved state.
    #[inline]
    pub fn full_state(&self) -> &FullState {
        self.scopes.full_state()
    }

    /// Access to the callback object, mainly useful in tests to inspect what
    /// was collected during [`Self::parse`].
    #[inline]
    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }
}
