//! String and char literal sub-machine
//!
//! A string literal is emitted as a sequence of pieces rather than one token:
//!
//! ```text
//! "Outer: ${ "Inner: $inner" }"
//!  │      │  │       │      ││ └ SlEnd
//!  │      │  │       │      │└ Interp.BlockEnd
//!  │      │  │       │      └ SlEnd (inner)
//!  │      │  │       └ Interp.Single + Identifier
//!  │      │  └ SlStart (inner), Content.Basic
//!  │      └ Interp.BlockStart, then ordinary code tokens
//!  └ SlStart, Content.Basic
//! ```
//!
//! If a single-line string meets a linebreak, or any string meets the end of input, before
//! its closing delimiter, everything emitted for it is replaced by one `Error` token that
//! spans from the opening delimiter to the point of failure. That includes a linebreak
//! inside an unclosed `${` block of a single-line string. Scanning then resumes at the
//! linebreak (or ends), so the source stays fully covered.

use crate::synkit::lexing::scanner::{Scanner, MAX_INTERPOLATION_DEPTH};
use crate::synkit::token::{StringPart, TokenType};

#[derive(Clone, Copy, PartialEq, Eq)]
enum StringStyle {
    SingleLine,
    MultiLine,
}

impl<'s, 'c> Scanner<'s, 'c> {
    /// Scan a string or char literal if one starts here
    pub(crate) fn scan_string_start(&mut self) -> bool {
        let config = self.config();
        let rest = self.rest();

        if let Some(ml) = config.multiline_string_delimiter.as_deref() {
            if !ml.is_empty() && rest.starts_with(ml) {
                self.scan_string(StringStyle::MultiLine, ml);
                return true;
            }
        }
        if let Some(delim) = config.string_delimiter {
            if rest.starts_with(delim) {
                let mut buf = [0u8; 4];
                let delim = &*delim.encode_utf8(&mut buf);
                self.scan_string(StringStyle::SingleLine, delim);
                return true;
            }
        }
        if let Some(delim) = config.char_delimiter {
            if rest.starts_with(delim) {
                self.scan_char(delim);
                return true;
            }
        }
        false
    }

    fn scan_string(&mut self, style: StringStyle, delim: &str) {
        let start = self.pos;
        let mark = self.tokens.len();
        let (open, close) = match style {
            StringStyle::SingleLine => (StringPart::SlStart, StringPart::SlEnd),
            StringStyle::MultiLine => (StringPart::MlStart, StringPart::MlEnd),
        };

        self.pos += delim.len();
        self.push(TokenType::string(open), start, self.pos);

        loop {
            let Some(c) = self.peek() else {
                return self.fail_string(start, mark);
            };
            if style == StringStyle::SingleLine && (c == '\n' || c == '\r') {
                return self.fail_string(start, mark);
            }

            let piece_start = self.pos;
            if self.rest().starts_with(delim) {
                self.pos += delim.len();
                self.push(TokenType::string(close), piece_start, self.pos);
                return;
            }

            if Some(c) == self.config().escape_char {
                self.bump();
                match self.peek() {
                    None => return self.fail_string(start, mark),
                    Some('\n') | Some('\r') if style == StringStyle::SingleLine => {
                        return self.fail_string(start, mark)
                    }
                    Some(_) => {
                        self.bump();
                        self.push(
                            TokenType::string(StringPart::ContentEscaped),
                            piece_start,
                            self.pos,
                        );
                    }
                }
                continue;
            }

            match self.interpolation_at() {
                Some(Interpolation::Block) => {
                    // `${`
                    self.bump();
                    self.bump();
                    self.push(
                        TokenType::string(StringPart::InterpBlockStart),
                        piece_start,
                        self.pos,
                    );
                    self.interpolation_depth += 1;
                    let closed = self.scan_code(true, style == StringStyle::SingleLine);
                    self.interpolation_depth -= 1;
                    if !closed {
                        return self.fail_string(start, mark);
                    }
                    let close_start = self.pos;
                    self.bump();
                    self.push(
                        TokenType::string(StringPart::InterpBlockEnd),
                        close_start,
                        self.pos,
                    );
                }
                Some(Interpolation::Single) => {
                    self.bump();
                    self.push(
                        TokenType::string(StringPart::InterpSingle),
                        piece_start,
                        self.pos,
                    );
                    self.scan_identifier();
                }
                None => self.scan_basic_content(style, delim),
            }
        }
    }

    /// Consume a run of plain content. Always consumes at least one character.
    fn scan_basic_content(&mut self, style: StringStyle, delim: &str) {
        let start = self.pos;
        self.bump();
        while let Some(c) = self.peek() {
            let stop = (style == StringStyle::SingleLine && (c == '\n' || c == '\r'))
                || self.rest().starts_with(delim)
                || Some(c) == self.config().escape_char
                || self.interpolation_at().is_some();
            if stop {
                break;
            }
            self.bump();
        }
        self.push(TokenType::string(StringPart::ContentBasic), start, self.pos);
    }

    /// Whether an interpolation starts at the current position
    fn interpolation_at(&self) -> Option<Interpolation> {
        let marker = self.config().interpolation_char?;
        if self.peek() != Some(marker) {
            return None;
        }
        match self.peek_nth(1) {
            Some('{') if self.interpolation_depth < MAX_INTERPOLATION_DEPTH => {
                Some(Interpolation::Block)
            }
            Some(c) if self.rules.is_identifier_start(c) => Some(Interpolation::Single),
            _ => None,
        }
    }

    /// Replace the pieces of a broken string with one `Error` token
    fn fail_string(&mut self, start: usize, mark: usize) {
        self.tokens.truncate(mark);
        self.push(TokenType::Error, start, self.pos);
    }

    /// Scan a char literal: delimiter, one character or escape pair, delimiter.
    ///
    /// Anything else becomes a single `Error` token running through the next closing
    /// delimiter on the same line, or up to the linebreak.
    fn scan_char(&mut self, delim: char) {
        let start = self.pos;
        self.bump();
        let escape = self.config().escape_char;

        let well_formed = match self.peek() {
            Some(c) if Some(c) == escape => {
                self.bump();
                matches!(self.peek(), Some(e) if e != '\n' && e != '\r') && {
                    self.bump();
                    true
                }
            }
            Some(c) if c != delim && c != '\n' && c != '\r' => {
                self.bump();
                true
            }
            _ => false,
        };

        if well_formed && self.peek() == Some(delim) {
            self.bump();
            self.push(TokenType::CHAR, start, self.pos);
            return;
        }

        while let Some(c) = self.peek() {
            if c == '\n' || c == '\r' {
                break;
            }
            self.bump();
            if Some(c) == escape {
                if matches!(self.peek(), Some(e) if e != '\n' && e != '\r') {
                    self.bump();
                }
            } else if c == delim {
                break;
            }
        }
        self.push(TokenType::Error, start, self.pos);
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Interpolation {
    /// `$name`
    Single,
    /// `${ … }`
    Block,
}
