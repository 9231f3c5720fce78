//! The state engine: the main token loop, control-word dispatch (§4.3.3), and
//! the destination buffers (field instruction/result, picture hex, blip UID).

use super::callbacks::{Callbacks, ParserView};
use super::document::RtfParser;
use super::error::RtfResult;
use super::scope::Scope;
use super::state::{Alignment, FullState, PictureValue};
use super::token::{Token, Tokenizer, split_control_word};

const GROUP_SKIP_TABLES: [&str; 11] = [
    "\\fonttbl",
    "\\filetbl",
    "\\colortbl",
    "\\stylesheet",
    "\\stylerestrictions",
    "\\listtables",
    "\\revtbl",
    "\\rsidtable",
    "\\mathprops",
    "\\generator",
    "\\info",
];

const PICTURE_INT_ATTRIBUTES: [&str; 11] = [
    "\\picscalex",
    "\\picscaley",
    "\\piccropl",
    "\\piccropr",
    "\\piccropt",
    "\\piccropb",
    "\\picw",
    "\\pich",
    "\\picwgoal",
    "\\pichgoal",
    "\\picbpp",
];

fn param_is_on(param: Option<&str>) -> bool {
    matches!(param, None | Some("1"))
}

fn parse_int(param: Option<&str>) -> Option<i64> {
    param.and_then(|p| p.parse::<i64>().ok())
}

/// Decode a hex string into bytes. Non-hex-pair remainders (an odd trailing
/// digit, stray non-hex characters) are dropped rather than erroring — the
/// picture data that reaches here has already had whitespace stripped at
/// accumulation time.
fn hex_decode(hex: &str) -> Vec<u8> {
    let digits: Vec<char> = hex.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    digits
        .chunks_exact(2)
        .filter_map(|pair| {
            let s: String = pair.iter().collect();
            u8::from_str_radix(&s, 16).ok()
        })
        .collect()
}

impl<C: Callbacks> RtfParser<C> {
    /// Parse the buffer installed by [`RtfParser::open_string`] or
    /// [`RtfParser::open_file`], driving the registered callbacks.
    ///
    /// Fails with [`super::error::RtfError::NoContent`] if nothing has been
    /// loaded, or with a tokenizer/brace-balance error if the input is
    /// malformed beyond what the engine tolerates silently.
    pub fn parse(&mut self) -> RtfResult<()> {
        let content = self
            .content
            .clone()
            .ok_or(super::error::RtfError::NoContent)?;

        self.scopes = super::scope::ScopeStack::new();
        self.prev_token = None;
        self.field_inst.clear();
        self.field_rslt.clear();
        self.pict_hex.clear();
        self.blip_uid_buf.clear();
        self.pending_ansi_skip = false;

        self.fire_open_paragraph();

        let mut tok = Tokenizer::new(&content);
        let mut cur = tok.next()?;

        while cur != Token::Eof {
            match &cur {
                Token::OpenBrace => {
                    self.pending_ansi_skip = false;
                    self.scopes.push();
                },
                Token::CloseBrace => {
                    self.pending_ansi_skip = false;
                    self.handle_close_brace()?;
                },
                _ => self.handle_plain_token(&cur),
            }
            self.prev_token = Some(cur.clone());
            cur = tok.next()?;
        }

        Ok(())
    }

    fn handle_close_brace(&mut self) -> RtfResult<()> {
        let old_full = self.scopes.full_state().clone();
        let popped = self.scopes.pop()?;
        let new_full = self.scopes.full_state().clone();

        let destination_only = popped.group_skip.unwrap_or(false)
            || popped.in_field.unwrap_or(false)
            || popped.in_blip_uid.unwrap_or(false)
            || popped.in_pict.unwrap_or(false);

        if !destination_only {
            self.fire_state_change(&old_full, &new_full);
        }

        if popped.in_field.unwrap_or(false) {
            let inst = std::mem::take(&mut self.field_inst);
            let rslt = std::mem::take(&mut self.field_rslt);
            self.fire_field(&inst, &rslt);
        }

        if popped.in_blip_uid.unwrap_or(false) {
            let buf = std::mem::take(&mut self.blip_uid_buf);
            let trimmed = buf.trim_start_matches('0');
            let digits = if trimmed.is_empty() { "0" } else { trimmed };
            if let Ok(value) = i64::from_str_radix(digits, 16) {
                self.scopes.set(|s| s.blip_uid = Some(value));
            }
        }

        if popped.in_pict.unwrap_or(false) {
            let hex = std::mem::take(&mut self.pict_hex);
            let bytes = hex_decode(&hex);
            let attrs = popped.picture_attributes.clone().unwrap_or_default();
            self.fire_image(&attrs, &bytes);
        }

        Ok(())
    }

    fn handle_plain_token(&mut self, tok: &Token) {
        let full = self.scopes.full_state();

        if full.group_skip {
            return;
        }
        if full.in_fieldrslt {
            self.field_rslt.push_str(&tok.text());
            return;
        }
        if full.in_fieldinst {
            self.field_inst.push_str(&tok.text());
            return;
        }
        if full.in_blip_uid {
            self.blip_uid_buf.push_str(&tok.text());
            return;
        }

        match tok {
            Token::ControlWordOrSymbol(raw) => {
                self.pending_ansi_skip = false;
                self.execute_control(raw);
            },
            Token::Character(c) => {
                // A unicode escape's ANSI fallback byte immediately follows it
                // and is swallowed rather than appended (§8 end-to-end table).
                if std::mem::take(&mut self.pending_ansi_skip) {
                    return;
                }
                if self.scopes.full_state().in_pict {
                    if !c.is_whitespace() {
                        self.pict_hex.push(*c);
                    }
                } else if !self.scopes.full_state().in_field && *c != '\n' {
                    self.fire_append_paragraph(&c.to_string());
                }
            },
            Token::OpenBrace | Token::CloseBrace | Token::Eof => unreachable!(),
        }
    }

    fn prev_is_open_brace(&self) -> bool {
        matches!(self.prev_token, Some(Token::OpenBrace))
    }

    fn prev_is_star(&self) -> bool {
        matches!(&self.prev_token, Some(Token::ControlWordOrSymbol(t)) if t == "\\*")
    }

    fn prev_word(&self) -> Option<String> {
        match &self.prev_token {
            Some(Token::ControlWordOrSymbol(t)) => Some(split_control_word(t).0),
            _ => None,
        }
    }

    /// Dispatch a single control word or control symbol. `raw` is the token's
    /// full text (backslash included, trailing space included for words).
    fn execute_control(&mut self, raw: &str) {
        let (word, param) = split_control_word(raw);

        // Pre-dispatch: `\*` seen while already inside `\fldinst` ends the
        // interesting prefix without firing a state change.
        if word == "\\*" && self.scopes.full_state().in_fieldinst {
            self.scopes.set(|s| s.in_fieldinst = Some(false));
            return;
        }

        // --- destinations and fields ---
        if self.prev_is_star() && word == "\\generator" {
            self.scopes.set(|s| s.group_skip = Some(true));
            return;
        }
        if self.prev_is_star() && word == "\\pgdsctbl" {
            self.scopes.set(|s| s.group_skip = Some(true));
            return;
        }
        if self.prev_is_open_brace() && GROUP_SKIP_TABLES.contains(&word.as_str()) {
            self.scopes.set(|s| s.group_skip = Some(true));
            return;
        }
        if self.prev_is_open_brace() && word == "\\field" {
            self.scopes.set(|s| s.in_field = Some(true));
            return;
        }
        if self.prev_is_open_brace() && word == "\\fldrslt" {
            self.scopes.set(|s| s.in_fieldrslt = Some(true));
            return;
        }
        if self.prev_is_star() && word == "\\fldinst" {
            self.scopes.set(|s| s.in_fieldinst = Some(true));
            return;
        }

        // --- embedded images ---
        if self.prev_is_open_brace() && word == "\\pict" {
            self.scopes.set(|s| {
                s.in_pict = Some(true);
                s.picture_attributes = Some(Default::default());
            });
            return;
        }
        if self.prev_is_star() && word == "\\blipuid" {
            if self.scopes.full_state().blip_uid.is_some() {
                self.scopes.set(|s| s.group_skip = Some(true));
            } else {
                self.scopes.set(|s| s.in_blip_uid = Some(true));
            }
            return;
        }
        if word == "\\bliptag" {
            if let Some(v) = parse_int(param.as_deref()) {
                self.scopes.set(|s| s.blip_uid = Some(v));
            }
            return;
        }
        if self.scopes.full_state().in_pict && PICTURE_INT_ATTRIBUTES.contains(&word.as_str()) {
            if let Some(v) = parse_int(param.as_deref()) {
                self.set_picture_attribute(word.trim_start_matches('\\'), PictureValue::Int(v));
            }
            return;
        }
        if self.scopes.full_state().in_pict
            && matches!(
                word.as_str(),
                "\\wbmbitspixel" | "\\wbmplanes" | "\\wbmwidthbytes"
            )
        {
            if let Some(v) = parse_int(param.as_deref()) {
                self.set_picture_attribute(word.trim_start_matches('\\'), PictureValue::Int(v));
            }
            return;
        }
        if self.scopes.full_state().in_pict
            && matches!(word.as_str(), "\\jpegblip" | "\\pngblip" | "\\emfblip")
        {
            let source = match word.as_str() {
                "\\jpegblip" => "jpeg",
                "\\pngblip" => "png",
                _ => "emf",
            };
            self.set_picture_attribute("source".to_string(), PictureValue::Text(source.to_string()));
            return;
        }
        if self.scopes.full_state().in_pict && word == "\\pmmetafile" {
            self.set_picture_attribute("source".to_string(), PictureValue::Text("os2meta".to_string()));
            if let Some(p) = param {
                self.set_picture_attribute("metafileType".to_string(), PictureValue::Text(p));
            }
            return;
        }
        if self.scopes.full_state().in_pict && word == "\\wmetafile" {
            self.set_picture_attribute("source".to_string(), PictureValue::Text("winmeta".to_string()));
            if let Some(p) = param {
                self.set_picture_attribute(
                    "metafileMappingMode".to_string(),
                    PictureValue::Text(p),
                );
            }
            return;
        }
        if self.scopes.full_state().in_pict && word == "\\dibitmap" {
            self.set_picture_attribute("source".to_string(), PictureValue::Text("wdibmp".to_string()));
            if let Some(p) = param {
                self.set_picture_attribute("bitmapType".to_string(), PictureValue::Text(p));
            }
            return;
        }
        if self.scopes.full_state().in_pict && word == "\\wbitmap" {
            self.set_picture_attribute("source".to_string(), PictureValue::Text("wddbmp".to_string()));
            if let Some(p) = param {
                self.set_picture_attribute("bitmapType".to_string(), PictureValue::Text(p));
            }
            return;
        }

        // --- escaped literal characters ---
        if word == "\\\\" {
            self.fire_append_paragraph("\\");
            return;
        }
        if word == "\\{" {
            self.fire_append_paragraph("{");
            return;
        }
        if word == "\\}" {
            self.fire_append_paragraph("}");
            return;
        }

        // --- unicode / special characters ---
        if let Some(text) = special_char_text(&word) {
            self.fire_append_paragraph(&text);
            return;
        }
        if word == "\\u" {
            // The RTF writer always emits an ANSI fallback byte right after a
            // unicode escape (default \ucN is 1); it is swallowed, not appended.
            self.pending_ansi_skip = true;
            if let Some(v) = parse_int(param.as_deref()) {
                if let Some(c) = u32::try_from(v).ok().and_then(char::from_u32) {
                    self.fire_append_paragraph(&c.to_string());
                }
            }
            return;
        }
        if word == "\\'" {
            let prev_was_unicode = self.prev_word().as_deref() == Some("\\u");
            if !prev_was_unicode {
                if let Some(v) = param
                    .as_deref()
                    .and_then(|p| i64::from_str_radix(p, 16).ok())
                {
                    if v <= 255 {
                        if let Some(c) = char::from_u32(v as u32) {
                            self.fire_append_paragraph(&c.to_string());
                        }
                    }
                }
            }
            return;
        }

        // --- paragraph control ---
        if word == "\\par" {
            self.fire_close_paragraph();
            self.fire_open_paragraph();
            return;
        }
        if word == "\\plain" {
            self.mutate_format(|s| s.reset_formatting());
            return;
        }

        // --- formatting ---
        if let Some(alignment) = match word.as_str() {
            "\\ql" => Some(Alignment::Left),
            "\\qr" => Some(Alignment::Right),
            "\\qc" => Some(Alignment::Center),
            "\\qd" => Some(Alignment::Distributed),
            "\\qj" => Some(Alignment::Justified),
            "\\qt" => Some(Alignment::ThaiDistributed),
            _ => None,
        } {
            self.mutate_format(|s| s.alignment = Some(alignment));
            return;
        }
        let on = param_is_on(param.as_deref());
        match word.as_str() {
            "\\i" => self.mutate_format(|s| s.italic = Some(on)),
            "\\b" => self.mutate_format(|s| s.bold = Some(on)),
            "\\ul" => self.mutate_format(|s| s.underline = Some(on)),
            "\\strike" => self.mutate_format(|s| s.strikethrough = Some(on)),
            _ => {}, // unrecognized control word or symbol: ignored
        }
    }

    fn set_picture_attribute(&mut self, key: impl Into<String>, value: PictureValue) {
        self.scopes.set(|s| {
            let map = s.picture_attributes.get_or_insert_with(Default::default);
            map.insert(key.into(), value);
        });
    }

    fn mutate_format(&mut self, f: impl FnOnce(&mut Scope)) {
        let old_full = self.scopes.full_state().clone();
        self.scopes.set(f);
        let new_full = self.scopes.full_state().clone();
        self.fire_state_change(&old_full, &new_full);
    }

    fn fire_open_paragraph(&mut self) {
        let view = ParserView {
            full_state: self.scopes.full_state(),
        };
        self.callbacks.on_open_paragraph(&view);
    }

    fn fire_close_paragraph(&mut self) {
        let view = ParserView {
            full_state: self.scopes.full_state(),
        };
        self.callbacks.on_close_paragraph(&view);
    }

    fn fire_append_paragraph(&mut self, text: &str) {
        let view = ParserView {
            full_state: self.scopes.full_state(),
        };
        self.callbacks.on_append_paragraph(&view, text);
    }

    fn fire_state_change(&mut self, old: &FullState, new: &FullState) {
        let view = ParserView {
            full_state: self.scopes.full_state(),
        };
        self.callbacks.on_state_change(&view, old, new);
    }

    fn fire_field(&mut self, fldinst: &str, fldrslt: &str) {
        let view = ParserView {
            full_state: self.scopes.full_state(),
        };
        self.callbacks.on_field(&view, fldinst, fldrslt);
    }

    fn fire_image(&mut self, attrs: &std::collections::BTreeMap<String, PictureValue>, bytes: &[u8]) {
        let view = ParserView {
            full_state: self.scopes.full_state(),
        };
        self.callbacks.on_image(&view, attrs, bytes);
    }
}

/// Single-character and date/time special-character control words.
fn special_char_text(word: &str) -> Option<String> {
    Some(
        match word {
            "\\~" => "\u{00A0}".to_string(),
            "\\_" => "\u{2011}".to_string(),
            "\\emspace" => "\u{2003}".to_string(),
            "\\enspace" => "\u{2002}".to_string(),
            "\\endash" => "\u{2013}".to_string(),
            "\\emdash" => "\u{2014}".to_string(),
            "\\lquote" => "\u{2018}".to_string(),
            "\\rquote" => "\u{2019}".to_string(),
            "\\ldblquote" => "\u{201C}".to_string(),
            "\\rdblquote" => "\u{201D}".to_string(),
            "\\line" => "\n".to_string(),
            "\\tab" => "\t".to_string(),
            "\\bullet" => "\u{2022}".to_string(),
            "\\chdate" | "\\chdpl" => chrono::Local::now().format("%A, %B %d, %Y").to_string(),
            "\\chdpa" => chrono::Local::now().format("%m/%d/%Y").to_string(),
            "\\chtime" => chrono::Local::now().format("%I:%M:%S %p").to_string(),
            _ => return None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtf::callbacks::Callbacks;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        paragraphs: RefCell<Vec<String>>,
        state_changes: RefCell<usize>,
        fields: RefCell<Vec<(String, String)>>,
        images: RefCell<Vec<(std::collections::BTreeMap<String, PictureValue>, Vec<u8>)>>,
        cur: RefCell<String>,
    }

    impl Callbacks for Recorder {
        fn on_open_paragraph(&mut self, _parser: &ParserView<'_>) {
            *self.cur.borrow_mut() = String::new();
        }
        fn on_append_paragraph(&mut self, _parser: &ParserView<'_>, text: &str) {
            self.cur.borrow_mut().push_str(text);
        }
        fn on_state_change(&mut self, _parser: &ParserView<'_>, _old: &FullState, _new: &FullState) {
            *self.state_changes.borrow_mut() += 1;
        }
        fn on_field(&mut self, _parser: &ParserView<'_>, fldinst: &str, fldrslt: &str) {
            self.fields
                .borrow_mut()
                .push((fldinst.to_string(), fldrslt.to_string()));
        }
        fn on_close_paragraph(&mut self, _parser: &ParserView<'_>) {
            self.paragraphs.borrow_mut().push(self.cur.borrow().clone());
        }
        fn on_image(
            &mut self,
            _parser: &ParserView<'_>,
            attrs: &std::collections::BTreeMap<String, PictureValue>,
            bytes: &[u8],
        ) {
            self.images.borrow_mut().push((attrs.clone(), bytes.to_vec()));
        }
    }

    fn run(input: &str) -> RtfParser<Recorder> {
        let mut p = RtfParser::new(Recorder::default());
        p.open_string(input);
        p.parse().unwrap();
        p
    }

    #[test]
    fn plain_text_accumulates_in_one_paragraph() {
        let p = run(r"{\rtf1 Hello\par World}");
        assert_eq!(p.callbacks().paragraphs.borrow()[0], "Hello");
        assert_eq!(*p.callbacks().cur.borrow(), " World");
    }

    #[test]
    fn bold_and_plain_fire_state_changes() {
        let p = run(r"{\rtf1 \b bold\plain  normal}");
        assert!(*p.callbacks().state_changes.borrow() >= 2);
    }

    #[test]
    fn font_table_is_skipped_entirely() {
        let p = run(r"{\rtf1{\fonttbl{\f0 Times;}}Hi}");
        assert_eq!(*p.callbacks().cur.borrow(), "Hi");
    }

    #[test]
    fn field_fires_with_raw_instruction_and_result() {
        let p = run(r#"{\rtf1 {\field{\*\fldinst HYPERLINK "x"}{\fldrslt link}}}"#);
        let fields = p.callbacks().fields.borrow();
        assert_eq!(fields.len(), 1);
        assert!(fields[0].0.contains("HYPERLINK"));
        assert_eq!(fields[0].1, "link");
    }

    #[test]
    fn hex_escape_after_unicode_is_suppressed() {
        let p = run(r"{\rtf1 \u8364\'80}");
        assert_eq!(*p.callbacks().cur.borrow(), "\u{20AC}");
    }

    #[test]
    fn hex_escape_rejecting_f_leaves_it_as_a_literal_character() {
        // The tokenizer stops hex-digit consumption before 'f' (not in 0-9,A-E),
        // so it is retokenized as a plain character.
        let p = run(r"{\rtf1 \'4f}");
        assert!(p.callbacks().cur.borrow().contains('f'));
    }

    #[test]
    fn hex_escape_decodes_full_two_digit_value_with_letter_digit() {
        // 0x4A, not the truncated 0x4 a naive digit-only parameter scan would
        // leave behind.
        let p = run(r"{\rtf1 \'4A}");
        assert_eq!(*p.callbacks().cur.borrow(), "\u{4A}");
    }

    #[test]
    fn ansi_fallback_skip_does_not_leak_across_a_group_boundary() {
        // `\u65` sets the "swallow the next plain byte" flag, but a `{`/`}`
        // intervenes before that byte arrives. The flag must not survive to
        // eat an unrelated character several tokens and a scope later.
        let p = run(r"{\rtf1 \u65{\b}X}");
        assert_eq!(*p.callbacks().cur.borrow(), "AX");
    }

    #[test]
    fn double_par_opens_two_paragraphs() {
        let p = run(r"{\rtf1 a\par\par b}");
        assert_eq!(p.callbacks().paragraphs.borrow().len(), 2);
        assert_eq!(p.callbacks().paragraphs.borrow()[0], "a");
        assert_eq!(p.callbacks().paragraphs.borrow()[1], "");
    }

    #[test]
    fn line_break_appends_newline() {
        let p = run(r"{\rtf1 a\line b}");
        assert_eq!(*p.callbacks().cur.borrow(), "a\nb");
    }

    #[test]
    fn unbalanced_closing_brace_is_an_error() {
        let mut p = RtfParser::new(Recorder::default());
        p.open_string(r"{\rtf1 }}");
        assert!(p.parse().is_err());
    }

    #[test]
    fn picture_destination_decodes_hex_and_attributes() {
        let p = run(r"{\rtf1{\pict\picw10\pich10\pngblip 48656c6c6f}}");
        let images = p.callbacks().images.borrow();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].1, b"Hello");
        assert_eq!(images[0].0.get("picw"), Some(&PictureValue::Int(10)));
    }

    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// N consecutive `\par`s produce exactly N close/open pairs, and the
        /// resulting paragraph count always matches N (plus the initial
        /// paragraph opened at parse start).
        #[test]
        fn repeated_par_opens_matching_paragraph_count(n in 1usize..20) {
            let mut input = String::from(r"{\rtf1 a");
            for _ in 0..n {
                input.push_str(r"\par");
            }
            input.push_str(" b}");

            let p = run(&input);
            prop_assert_eq!(p.callbacks().paragraphs.borrow().len(), n);
            prop_assert_eq!(p.callbacks().paragraphs.borrow()[0].as_str(), "a");
            prop_assert_eq!(p.callbacks().cur.borrow().as_str(), " b");
        }

        /// Parsing the same input twice, with a reset in between, yields an
        /// identical callback sequence (paragraph text and state-change count).
        #[test]
        fn reparsing_after_reset_is_deterministic(
            bold_first in any::<bool>(),
            italic_first in any::<bool>(),
        ) {
            let input = format!(
                r"{{\rtf1 {}lead {}mid\plain  tail\par second}}",
                if bold_first { r"\b " } else { "" },
                if italic_first { r"\i " } else { "" },
            );

            let mut p = RtfParser::new(Recorder::default());
            p.open_string(input.clone());
            p.parse().unwrap();
            let first_paragraphs = p.callbacks().paragraphs.borrow().clone();
            let first_changes = *p.callbacks().state_changes.borrow();
            let first_tail = p.callbacks().cur.borrow().clone();

            p.open_string(input.clone());
            p.parse().unwrap();
            let second_paragraphs = p.callbacks().paragraphs.borrow().clone();
            let second_changes = *p.callbacks().state_changes.borrow();
            let second_tail = p.callbacks().cur.borrow().clone();

            prop_assert_eq!(first_paragraphs, second_paragraphs);
            prop_assert_eq!(first_changes, second_changes);
            prop_assert_eq!(first_tail, second_tail);
        }

        /// Toggling `\b`/`\i`/`\ul`/`\strike` always fires a state change, and
        /// the resulting attribute is on iff the parameter was absent or "1".
        #[test]
        fn toggle_controls_follow_the_on_off_parameter_rule(
            param in proptest::option::of(0i32..3),
        ) {
            let control = match param {
                None => r"\b".to_string(),
                Some(p) => format!(r"\b{p}"),
            };
            let input = format!(r"{{\rtf1 {control} x}}");
            let p = run(&input);

            let expect_on = param.is_none() || param == Some(1);
            prop_assert_eq!(p.full_state().format.bold, expect_on);
            prop_assert!(*p.callbacks().state_changes.borrow() >= 1);
        }
    }
}
