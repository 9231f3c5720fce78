//! Inheritable formatting attributes and the fully-resolved state snapshot.

/// Paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    /// `\ql` (the default).
    #[default]
    Left,
    /// `\qr`.
    Right,
    /// `\qc`.
    Center,
    /// `\qd`.
    Distributed,
    /// `\qj`.
    Justified,
    /// `\qt`.
    ThaiDistributed,
}

/// The five formatting attributes tracked by the engine, with their RTF
/// defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatState {
    /// `\i`.
    pub italic: bool,
    /// `\b`.
    pub bold: bool,
    /// `\ul`.
    pub underline: bool,
    /// `\strike`.
    pub strikethrough: bool,
    /// `\ql`/`\qr`/`\qc`/`\qd`/`\qj`/`\qt`.
    pub alignment: Alignment,
}

impl Default for FormatState {
    fn default() -> Self {
        Self {
            italic: false,
            bold: false,
            underline: false,
            strikethrough: false,
            alignment: Alignment::Left,
        }
    }
}

/// The name of a formatting attribute, used by [`crate::RtfParser::is_attribute_format`].
pub const ATTRIBUTE_NAMES: [&str; 5] = ["italic", "bold", "underline", "strikethrough", "alignment"];

/// Returns true iff `name` is one of the five recognized formatting attribute
/// names.
pub fn is_attribute_format(name: &str) -> bool {
    ATTRIBUTE_NAMES.contains(&name)
}

/// Picture attribute value: RTF picture destinations mix integer metadata
/// (`\picw`, `\picbpp`, ...) with a handful of string-valued keys (`source`,
/// `metafileType`, `bitmapType`, `metafileMappingMode`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PictureValue {
    Int(i64),
    Text(String),
}

/// Fully resolved parser state: the formatting attributes plus the
/// destination/control flags currently in effect, as seen by callbacks.
///
/// This is a snapshot — a function of the scope stack at the moment it was
/// taken — not a live view.
#[derive(Debug, Clone, PartialEq)]
pub struct FullState {
    pub format: FormatState,
    pub group_skip: bool,
    pub in_field: bool,
    pub in_fieldinst: bool,
    pub in_fieldrslt: bool,
    pub in_pict: bool,
    pub picture_attributes: std::collections::BTreeMap<String, PictureValue>,
    pub in_blip_uid: bool,
    pub blip_uid: Option<i64>,
}

impl Default for FullState {
    fn default() -> Self {
        Self {
            format: FormatState::default(),
            group_skip: false,
            in_field: false,
            in_fieldinst: false,
            in_fieldrslt: false,
            in_pict: false,
            picture_attributes: std::collections::BTreeMap::new(),
            in_blip_uid: false,
            blip_uid: None,
        }
    }
}
