//! Numeric literal sub-machine
//!
//! Configured prefixes (`0x`, `0b`, `0o`, …) are tried longest-first before falling back to
//! decimal. A prefix with no digit after it is a single `Error` token spanning the prefix;
//! it is never read as a zero followed by an identifier.
//!
//! Decimal literals may carry a fraction (`1.5`) and an exponent (`1e-3`); either makes the
//! literal floating point. The configured float suffix (`1.5f`) selects `Float`, the optional
//! double suffix or no suffix at all selects `Double`. `_` separators are accepted after
//! the first digit.

use crate::synkit::lexing::scanner::Scanner;
use crate::synkit::token::{IntegerBase, LiteralKind, TokenType};

fn is_digit(c: char, base: IntegerBase) -> bool {
    match base {
        IntegerBase::Dec => c.is_ascii_digit(),
        IntegerBase::Hex => c.is_ascii_hexdigit(),
        IntegerBase::Bin => c == '0' || c == '1',
        IntegerBase::Oct => ('0'..='7').contains(&c),
    }
}

impl<'s, 'c> Scanner<'s, 'c> {
    pub(crate) fn scan_number(&mut self) {
        let start = self.pos;

        let prefixed = self
            .rules
            .prefixes
            .iter()
            .copied()
            .find(|(prefix, _)| self.rest().starts_with(*prefix));

        if let Some((prefix, base)) = prefixed {
            self.pos += prefix.len();
            let digits = self.eat_digits(base);
            let kind = if digits == 0 {
                TokenType::Error
            } else {
                TokenType::Literal(LiteralKind::Integer(base))
            };
            self.push(kind, start, self.pos);
            return;
        }

        self.eat_digits(IntegerBase::Dec);
        let mut floating = false;

        if self.peek() == Some('.') && matches!(self.peek_nth(1), Some(c) if c.is_ascii_digit()) {
            self.bump();
            self.eat_digits(IntegerBase::Dec);
            floating = true;
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let exponent_digits = match self.peek_nth(1) {
                Some('+') | Some('-') => matches!(self.peek_nth(2), Some(c) if c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent_digits {
                self.bump();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.bump();
                }
                self.eat_digits(IntegerBase::Dec);
                floating = true;
            }
        }

        let config = self.config();
        let kind = match self.suffix() {
            Some(c) if Some(c) == config.float_suffix => {
                self.bump();
                TokenType::FLOAT
            }
            Some(c) if Some(c) == config.double_suffix => {
                self.bump();
                TokenType::DOUBLE
            }
            _ if floating => TokenType::DOUBLE,
            _ => TokenType::DEC,
        };
        self.push(kind, start, self.pos);
    }

    /// Consume digits of `base` (and `_` separators after the first digit); returns the digit count
    fn eat_digits(&mut self, base: IntegerBase) -> usize {
        let mut count = 0;
        while let Some(c) = self.peek() {
            if is_digit(c, base) {
                count += 1;
            } else if !(c == '_' && count > 0) {
                break;
            }
            self.bump();
        }
        count
    }

    /// The next character, if it stands alone as a suffix (not the start of a longer word)
    fn suffix(&self) -> Option<char> {
        let c = self.peek()?;
        match self.peek_nth(1) {
            Some(next) if self.rules.is_identifier_part(next) => None,
            _ => Some(c),
        }
    }
}
