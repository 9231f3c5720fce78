//! RTF lexical tokenizer.
//!
//! Pure function over a cursor into the input buffer. The tokenizer holds no
//! state beyond its own position — formatting, scoping, and destination
//! routing all live one layer up, in [`super::engine`].

use super::error::{RtfError, RtfResult};

/// A single lexical token produced by [`Tokenizer::next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal `{`.
    OpenBrace,
    /// Literal `}`.
    CloseBrace,
    /// A control word or control symbol, payload beginning with `\`.
    ///
    /// One of three shapes: `\<letters>[<signed-int>][<one-space>]`,
    /// `\<single-nonalpha>`, or `\'<up-to-2-hex-digits>`.
    ControlWordOrSymbol(String),
    /// A single literal character.
    Character(char),
    /// End of input.
    Eof,
}

impl Token {
    /// The raw text of a `ControlWordOrSymbol`/`Character` token, as it should be
    /// appended to a destination buffer (field instruction, field result, blip UID).
    pub fn text(&self) -> String {
        match self {
            Token::ControlWordOrSymbol(s) => s.clone(),
            Token::Character(c) => c.to_string(),
            Token::OpenBrace | Token::CloseBrace | Token::Eof => String::new(),
        }
    }
}

/// RTF lexical analyzer.
///
/// Advances a byte cursor over the input and yields one [`Token`] at a time.
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer over the given input, starting at the beginning.
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    #[inline]
    fn current_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    #[inline]
    fn advance(&mut self) {
        if let Some(c) = self.current_char() {
            self.pos += c.len_utf8();
        }
    }

    /// Read the next token from the input.
    pub fn next(&mut self) -> RtfResult<Token> {
        match self.current_char() {
            None => Ok(Token::Eof),
            Some('{') => {
                self.advance();
                Ok(Token::OpenBrace)
            },
            Some('}') => {
                self.advance();
                Ok(Token::CloseBrace)
            },
            Some('\\') => self.parse_control(),
            Some(c) => {
                self.advance();
                Ok(Token::Character(c))
            },
        }
    }

    /// Parse a control word or control symbol following the `\` just consumed
    /// from the main dispatch in [`Self::next`].
    fn parse_control(&mut self) -> RtfResult<Token> {
        self.advance(); // consume '\'
        match self.current_char() {
            None => Err(RtfError::MalformedEscape(
                "'\\' at end of input".to_string(),
            )),
            Some(c) if c.is_ascii_alphabetic() => self.parse_control_word(),
            Some('\'') => self.parse_hex_escape(),
            Some(c) => {
                self.advance();
                Ok(Token::ControlWordOrSymbol(format!("\\{c}")))
            },
        }
    }

    /// `\<letters>[<signed-int>][<one-space>]`.
    fn parse_control_word(&mut self) -> RtfResult<Token> {
        let mut text = String::from("\\");

        while let Some(c) = self.current_char() {
            if c.is_ascii_alphabetic() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        // Optional signed integer parameter. A leading '-' is only accepted in
        // first position, mirroring the source parser's behavior.
        if let Some(c) = self.current_char() {
            if c == '-' || c.is_ascii_digit() {
                if c == '-' {
                    text.push(c);
                    self.advance();
                }
                while let Some(d) = self.current_char() {
                    if d.is_ascii_digit() {
                        text.push(d);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        // A single trailing whitespace character is the delimiter and is part
        // of the token.
        if let Some(c) = self.current_char() {
            if c.is_whitespace() {
                text.push(c);
                self.advance();
            }
        }

        Ok(Token::ControlWordOrSymbol(text))
    }

    /// `\'<up-to-2-hex-digits>`. Accepts `0-9, A-E` only — `F` is rejected, a
    /// deviation reproduced from the reference implementation rather than
    /// "fixed" (see DESIGN.md).
    fn parse_hex_escape(&mut self) -> RtfResult<Token> {
        self.advance(); // consume '\''
        let mut text = String::from("\\'");

        for _ in 0..2 {
            match self.current_char() {
                Some(c) if c.is_ascii_digit() || matches!(c.to_ascii_uppercase(), 'A'..='E') => {
                    text.push(c);
                    self.advance();
                },
                _ => break,
            }
        }

        Ok(Token::ControlWordOrSymbol(text))
    }
}

/// Split a `ControlWordOrSymbol` payload into its word and decimal parameter.
///
/// Strips trailing whitespace, then locates the first digit (with an optional
/// leading `-`). The part before it (backslash included) is the word; the
/// parameter is everything from there to the end of the string, not just the
/// leading digit run — a hex escape's second digit can be `A`-`E` under this
/// repo's own accepted digit set, and that digit must stay in the parameter.
/// Absent a numeric substring, the whole token is the word and the parameter
/// is `None`.
pub fn split_control_word(raw: &str) -> (String, Option<String>) {
    let trimmed = raw.trim_end();
    let chars: Vec<char> = trimmed.chars().collect();

    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_digit() {
            let start = if i > 0 && chars[i - 1] == '-' { i - 1 } else { i };
            let word: String = chars[..start].iter().collect();
            let param: String = chars[start..].iter().collect();
            return (word, Some(param));
        }
        i += 1;
    }

    (trimmed.to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens_of(input: &str) -> Vec<Token> {
        let mut tok = Tokenizer::new(input);
        let mut out = Vec::new();
        loop {
            let t = tok.next().unwrap();
            let done = t == Token::Eof;
            out.push(t);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn braces_and_control_word() {
        let toks = tokens_of(r"{\rtf1 hi}");
        assert_eq!(toks[0], Token::OpenBrace);
        assert_eq!(toks[1], Token::ControlWordOrSymbol("\\rtf1 ".to_string()));
        assert_eq!(toks[2], Token::Character('h'));
        assert_eq!(toks[3], Token::Character('i'));
        assert_eq!(toks[4], Token::CloseBrace);
        assert_eq!(toks[5], Token::Eof);
    }

    #[test]
    fn control_symbol_is_single_char() {
        let toks = tokens_of(r"\*\par");
        assert_eq!(toks[0], Token::ControlWordOrSymbol("\\*".to_string()));
        assert_eq!(toks[1], Token::ControlWordOrSymbol("\\par".to_string()));
    }

    #[test]
    fn hex_escape_rejects_f() {
        // 'F' is not in the accepted hex digit set; only '4' is consumed.
        let toks = tokens_of(r"\'4F");
        assert_eq!(toks[0], Token::ControlWordOrSymbol("\\'4".to_string()));
        assert_eq!(toks[1], Token::Character('F'));
    }

    #[test]
    fn hex_escape_two_digits() {
        let toks = tokens_of(r"\'41");
        assert_eq!(toks[0], Token::ControlWordOrSymbol("\\'41".to_string()));
    }

    #[test]
    fn negative_parameter() {
        let toks = tokens_of(r"\li-200 ");
        assert_eq!(
            toks[0],
            Token::ControlWordOrSymbol("\\li-200 ".to_string())
        );
    }

    #[test]
    fn backslash_at_eof_is_malformed() {
        let mut tok = Tokenizer::new("abc\\");
        tok.next().unwrap();
        tok.next().unwrap();
        tok.next().unwrap();
        assert!(matches!(tok.next(), Err(RtfError::MalformedEscape(_))));
    }

    #[test]
    fn split_plain_word() {
        assert_eq!(split_control_word("\\par"), ("\\par".to_string(), None));
    }

    #[test]
    fn split_word_with_param() {
        assert_eq!(
            split_control_word("\\b1"),
            ("\\b".to_string(), Some("1".to_string()))
        );
    }

    #[test]
    fn split_word_with_negative_param_and_trailing_space() {
        assert_eq!(
            split_control_word("\\li-200 "),
            ("\\li".to_string(), Some("-200".to_string()))
        );
    }

    #[test]
    fn split_hex_escape() {
        assert_eq!(
            split_control_word("\\'41"),
            ("\\'".to_string(), Some("41".to_string()))
        );
    }

    #[test]
    fn split_hex_escape_with_letter_second_digit() {
        // The second hex digit can be A-E; it must stay in the parameter
        // rather than being truncated off by a digit-only scan.
        assert_eq!(
            split_control_word("\\'4A"),
            ("\\'".to_string(), Some("4A".to_string()))
        );
        assert_eq!(
            split_control_word("\\'1B"),
            ("\\'".to_string(), Some("1B".to_string()))
        );
    }
}
