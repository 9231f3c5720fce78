//! The callback surface through which a host receives parse events.
//!
//! This is a contract, not logic — see §4.4. Required methods have no default
//! body, so a type that implements [`Callbacks`] without providing all four
//! simply fails to compile; that is this crate's analogue of the source
//! parser's runtime `ConfigurationError` (see DESIGN.md for why the static
//! check was chosen over a runtime one here).

use super::state::{FullState, PictureValue};
use std::collections::BTreeMap;

/// A read-only view into the parser passed to every callback, scoped to what
/// a callback may safely read mid-parse.
pub struct ParserView<'a> {
    pub(crate) full_state: &'a FullState,
}

impl<'a> ParserView<'a> {
    /// The current fully resolved formatting/destination state.
    #[inline]
    pub fn full_state(&self) -> &FullState {
        self.full_state
    }

    /// True iff `name` is one of the five formatting attribute names.
    #[inline]
    pub fn is_attribute_format(&self, name: &str) -> bool {
        super::state::is_attribute_format(name)
    }
}

/// The callback set a host registers to receive paragraph, state, field, and
/// image events from [`crate::RtfParser`].
pub trait Callbacks {
    /// A new paragraph has opened — at parse start and after every `\par`.
    /// Informative only.
    fn on_open_paragraph(&mut self, parser: &ParserView<'_>);

    /// `text` (one or more code points) should be appended to the current
    /// paragraph.
    fn on_append_paragraph(&mut self, parser: &ParserView<'_>, text: &str);

    /// A formatting-affecting scope transition occurred. Fired for every
    /// scope-local change to `italic`/`bold`/`underline`/`strikethrough`/
    /// `alignment`, for `\plain`, and for non-destination scope closes — never
    /// for pure destination transitions (`groupSkip`, `inField*`, `inPict`,
    /// `inBlipUID`, `blipUID`, `pictAttributes`).
    fn on_state_change(&mut self, parser: &ParserView<'_>, old: &FullState, new: &FullState);

    /// A `{\field ...}` group has closed. `fldinst` and `fldrslt` are raw
    /// strings with RTF escapes still present.
    fn on_field(&mut self, parser: &ParserView<'_>, fldinst: &str, fldrslt: &str);

    /// The current paragraph has closed — every `\par` before the matching
    /// `onOpenParagraph`. Never fired at end-of-document; callers requiring
    /// end-of-document closure must do it themselves.
    fn on_close_paragraph(&mut self, _parser: &ParserView<'_>) {}

    /// A document-level (non-formatting) attribute, such as the value of
    /// `\*\generator`, was encountered.
    fn on_set_document_attribute(&mut self, _parser: &ParserView<'_>, _attribute: &str, _value: &str) {
    }

    /// A `{\pict ...}` group has closed. `bytes` is the hex-decoded binary
    /// image payload.
    fn on_image(
        &mut self,
        _parser: &ParserView<'_>,
        _attrs: &BTreeMap<String, PictureValue>,
        _bytes: &[u8],
    ) {
    }
}
