//! Indentation-aware lexer.
//!
//! A hand-written scanner (not table-driven) that turns source bytes into a
//! restartable stream of [`Token`]s, synthesizing `INDENT`/`DEDENT`/`NEWLINE`
//! the way Python's tokenizer does. The lexer never aborts: unterminated
//! strings, bad escapes, and unexpected characters all produce an `ERROR`
//! token (message in the lexeme) and scanning resumes past the offending
//! byte, so the stream stays finite for any input.

use crate::token::{Literal, Token, TokenKind, lookup_keyword};
use loom_core::Arena;
use std::collections::VecDeque;

pub struct Lexer<'a> {
    arena: &'a Arena,
    source: &'a [u8],
    filename: &'a str,
    pos: usize,
    line: u32,
    /// Column of each open indentation level, innermost last. Always starts
    /// with a sentinel `0` for the top level.
    indent_stack: Vec<usize>,
    /// True when the next byte begins a new logical line and indentation
    /// has not yet been measured for it.
    at_line_start: bool,
    /// DEDENT tokens queued up when a line's indentation pops more than one
    /// level at once; drained before scanning resumes.
    pending: VecDeque<Token<'a>>,
    emitted_eof: bool,
}

impl<'a> Lexer<'a> {
    /// Zero state for a fresh source buffer.
    pub fn init(arena: &'a Arena, source: &'a str, filename: &'a str) -> Self {
        Lexer {
            arena,
            source: source.as_bytes(),
            filename,
            pos: 0,
            line: 1,
            indent_stack: vec![0],
            at_line_start: true,
            pending: VecDeque::new(),
            emitted_eof: false,
        }
    }

    /// Scan every token up front into a `Vec`, used by the parser for
    /// lookahead and by the sub-lexer that re-scans interpolated-string
    /// placeholders.
    pub fn tokenize(mut self) -> Vec<Token<'a>> {
        tracing::trace!(filename = self.filename, bytes = self.source.len(), "lexing");
        let mut tokens = Vec::new();
        loop {
            let tok = self.scan_token();
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tracing::debug!(filename = self.filename, tokens = tokens.len(), "lexed");
        tokens
    }

    fn mk(&self, kind: TokenKind, lexeme: &'a str) -> Token<'a> {
        Token::new(kind, lexeme, self.line, self.filename)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.source[self.pos]
        }
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.source.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn advance(&mut self) -> u8 {
        let b = self.source[self.pos];
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
        }
        b
    }

    fn match_byte(&mut self, expected: u8) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        // Safe because the lexer only ever splits on ASCII boundary bytes;
        // non-ASCII bytes inside string literals pass through verbatim and
        // are never split mid-sequence.
        std::str::from_utf8(&self.source[start..end]).unwrap_or("")
    }

    fn error(&self, message: String) -> Token<'a> {
        let lexeme = self.arena.alloc_str(&message);
        self.mk(TokenKind::Error, lexeme)
    }

    /// One token per call.
    pub fn scan_token(&mut self) -> Token<'a> {
        if let Some(tok) = self.pending.pop_front() {
            return tok;
        }

        if self.at_line_start {
            if let Some(tok) = self.measure_indentation() {
                return tok;
            }
        }

        self.skip_inline_whitespace();

        if self.is_at_end() {
            return self.finish_at_eof();
        }

        let start = self.pos;
        let c = self.advance();

        match c {
            b'\n' => {
                self.at_line_start = true;
                self.mk(TokenKind::Newline, "\n")
            }
            b'/' if self.peek() == b'/' => {
                while !self.is_at_end() && self.peek() != b'\n' {
                    self.pos += 1;
                }
                self.scan_token()
            }
            b'(' => self.mk(TokenKind::LParen, self.slice(start, self.pos)),
            b')' => self.mk(TokenKind::RParen, self.slice(start, self.pos)),
            b'{' => self.mk(TokenKind::LBrace, self.slice(start, self.pos)),
            b'}' => self.mk(TokenKind::RBrace, self.slice(start, self.pos)),
            b'[' => self.mk(TokenKind::LBracket, self.slice(start, self.pos)),
            b']' => self.mk(TokenKind::RBracket, self.slice(start, self.pos)),
            b',' => self.mk(TokenKind::Comma, self.slice(start, self.pos)),
            b':' => self.mk(TokenKind::Colon, self.slice(start, self.pos)),
            b';' => self.mk(TokenKind::Semicolon, self.slice(start, self.pos)),
            b'+' => {
                if self.match_byte(b'+') {
                    self.mk(TokenKind::PlusPlus, self.slice(start, self.pos))
                } else {
                    self.mk(TokenKind::Plus, self.slice(start, self.pos))
                }
            }
            b'-' => {
                if self.match_byte(b'-') {
                    self.mk(TokenKind::MinusMinus, self.slice(start, self.pos))
                } else if self.match_byte(b'>') {
                    self.mk(TokenKind::Arrow, self.slice(start, self.pos))
                } else {
                    self.mk(TokenKind::Minus, self.slice(start, self.pos))
                }
            }
            b'*' => self.mk(TokenKind::Star, self.slice(start, self.pos)),
            b'/' => self.mk(TokenKind::Slash, self.slice(start, self.pos)),
            b'%' => self.mk(TokenKind::Percent, self.slice(start, self.pos)),
            b'=' => {
                if self.match_byte(b'=') {
                    self.mk(TokenKind::EqEq, self.slice(start, self.pos))
                } else if self.match_byte(b'>') {
                    self.mk(TokenKind::FatArrow, self.slice(start, self.pos))
                } else {
                    self.mk(TokenKind::Eq, self.slice(start, self.pos))
                }
            }
            b'!' => {
                if self.match_byte(b'=') {
                    self.mk(TokenKind::BangEq, self.slice(start, self.pos))
                } else {
                    self.mk(TokenKind::Bang, self.slice(start, self.pos))
                }
            }
            b'<' => {
                if self.match_byte(b'=') {
                    self.mk(TokenKind::LtEq, self.slice(start, self.pos))
                } else {
                    self.mk(TokenKind::Lt, self.slice(start, self.pos))
                }
            }
            b'>' => {
                if self.match_byte(b'=') {
                    self.mk(TokenKind::GtEq, self.slice(start, self.pos))
                } else {
                    self.mk(TokenKind::Gt, self.slice(start, self.pos))
                }
            }
            b'&' if self.peek() == b'&' => {
                self.pos += 1;
                self.mk(TokenKind::AndAnd, self.slice(start, self.pos))
            }
            b'|' if self.peek() == b'|' => {
                self.pos += 1;
                self.mk(TokenKind::OrOr, self.slice(start, self.pos))
            }
            b'.' => {
                if self.peek() == b'.' && self.peek_at(1) == b'.' {
                    self.pos += 2;
                    self.mk(TokenKind::DotDotDot, self.slice(start, self.pos))
                } else if self.match_byte(b'.') {
                    self.mk(TokenKind::DotDot, self.slice(start, self.pos))
                } else {
                    self.mk(TokenKind::Dot, self.slice(start, self.pos))
                }
            }
            b'\'' => self.scan_char(start),
            b'"' => self.scan_string(start, false),
            b'$' if self.peek() == b'"' => {
                self.pos += 1;
                self.scan_string(start, true)
            }
            b'0'..=b'9' => self.scan_number(start),
            c if c.is_ascii_alphabetic() || c == b'_' => self.scan_identifier(start),
            other => self.error(format!(
                "unexpected character '{}' at line {}",
                other as char, self.line
            )),
        }
    }

    fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek(), b' ' | b'\t') {
            self.pos += 1;
        }
    }

    /// Measures leading whitespace for a fresh logical line and returns a
    /// synthetic INDENT/DEDENT/NEWLINE token if one is needed, or `None` to
    /// fall through to ordinary scanning (line has no indentation change).
    fn measure_indentation(&mut self) -> Option<Token<'a>> {
        let mut col = 0usize;
        let save = self.pos;
        loop {
            match self.peek() {
                b' ' | b'\t' => {
                    col += 1;
                    self.pos += 1;
                }
                _ => break,
            }
        }

        // Blank line or comment-only line: emit a bare NEWLINE, indentation
        // stack untouched.
        if self.is_at_end() {
            self.pos = save;
            self.at_line_start = false;
            return self.measure_blank_or_real(col, save);
        }
        if self.peek() == b'\n' {
            self.pos += 1;
            self.line += 1;
            return Some(self.mk(TokenKind::Newline, "\n"));
        }
        if self.peek() == b'/' && self.peek_at(1) == b'/' {
            while !self.is_at_end() && self.peek() != b'\n' {
                self.pos += 1;
            }
            if !self.is_at_end() {
                self.pos += 1;
                self.line += 1;
            }
            return Some(self.mk(TokenKind::Newline, "\n"));
        }

        self.at_line_start = false;
        let top = *self.indent_stack.last().unwrap();
        if col > top {
            self.indent_stack.push(col);
            Some(self.mk(TokenKind::Indent, ""))
        } else if col < top {
            while *self.indent_stack.last().unwrap() > col {
                self.indent_stack.pop();
                self.pending.push_back(self.mk(TokenKind::Dedent, ""));
            }
            if *self.indent_stack.last().unwrap() != col {
                // Inconsistent dedent: no matching level on the stack.
                let tok = self.error(format!(
                    "inconsistent indentation at line {} (column {} matches no enclosing block)",
                    self.line, col
                ));
                self.pending.push_back(tok);
            }
            self.pending.pop_front()
        } else {
            None
        }
    }

    fn measure_blank_or_real(&mut self, _col: usize, save: usize) -> Option<Token<'a>> {
        self.pos = save;
        self.at_line_start = false;
        None
    }

    fn finish_at_eof(&mut self) -> Token<'a> {
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.pending.push_back(self.mk(TokenKind::Dedent, ""));
        }
        if let Some(tok) = self.pending.pop_front() {
            return tok;
        }
        if !self.emitted_eof {
            self.emitted_eof = true;
        }
        self.mk(TokenKind::Eof, "")
    }

    fn scan_identifier(&mut self, start: usize) -> Token<'a> {
        while matches!(self.peek(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.pos += 1;
        }
        let text = self.slice(start, self.pos);
        match lookup_keyword(text) {
            Some(kind) => self.mk(kind, text),
            None => self.mk(TokenKind::Ident, text),
        }
    }

    fn scan_number(&mut self, start: usize) -> Token<'a> {
        while self.peek().is_ascii_digit() {
            self.pos += 1;
        }
        let mut is_double = false;
        if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
            is_double = true;
            self.pos += 1;
            while self.peek().is_ascii_digit() {
                self.pos += 1;
            }
        }
        if is_double {
            let digits_end = self.pos;
            if matches!(self.peek(), b'd' | b'D') {
                self.pos += 1;
            }
            let text = self.slice(start, self.pos);
            let value: f64 = self.slice(start, digits_end).parse().unwrap_or(0.0);
            self.mk(TokenKind::DoubleLit, text)
                .with_literal(Literal::Double(value))
        } else if matches!(self.peek(), b'l' | b'L') {
            let digits = self.slice(start, self.pos);
            self.pos += 1;
            let text = self.slice(start, self.pos);
            let value: i64 = digits.parse().unwrap_or(0);
            self.mk(TokenKind::LongLit, text)
                .with_literal(Literal::Long(value))
        } else {
            let text = self.slice(start, self.pos);
            let value: i64 = text.parse().unwrap_or(0);
            self.mk(TokenKind::IntLit, text)
                .with_literal(Literal::Int(value))
        }
    }

    fn decode_escape(&mut self) -> Option<char> {
        let c = self.advance();
        crate::token::decode_escape(c)
    }

    fn scan_char(&mut self, start: usize) -> Token<'a> {
        let value = if self.peek() == b'\\' {
            self.pos += 1;
            match self.decode_escape() {
                Some(c) => c,
                None => {
                    return self.error(format!("invalid escape in char literal at line {}", self.line));
                }
            }
        } else if self.is_at_end() || self.peek() == b'\'' {
            return self.error(format!("empty char literal at line {}", self.line));
        } else {
            let c = self.advance();
            c as char
        };
        if !self.match_byte(b'\'') {
            return self.error(format!("unterminated char literal at line {}", self.line));
        }
        let text = self.slice(start, self.pos);
        self.mk(TokenKind::CharLit, text)
            .with_literal(Literal::Char(value))
    }

    /// Scans `"..."` or, when `interpolated` is set, the `$"..."` form. For
    /// a plain string the payload is the decoded (escape-resolved) text;
    /// for an interpolated string the payload is the raw inner text, left
    /// for the parser's sub-lexer to re-scan.
    fn scan_string(&mut self, start: usize, interpolated: bool) -> Token<'a> {
        let content_start = self.pos;
        let mut decoded = String::new();
        loop {
            if self.is_at_end() {
                return self.error(format!("unterminated string literal at line {}", self.line));
            }
            if self.peek() == b'"' {
                break;
            }
            if self.peek() == b'\n' {
                return self.error(format!("unterminated string literal at line {}", self.line));
            }
            if self.peek() == b'\\' {
                if interpolated {
                    // Kept raw; the parser's sub-lexer decodes escapes when
                    // it re-scans literal runs between `{...}` placeholders.
                    self.pos += 2;
                    continue;
                }
                self.pos += 1;
                match self.decode_escape() {
                    Some(c) => decoded.push(c),
                    None => {
                        return self.error(format!(
                            "invalid escape in string literal at line {}",
                            self.line
                        ));
                    }
                }
            } else {
                let byte = self.advance();
                // Non-ASCII bytes pass through verbatim; reconstruct the
                // char from the raw slice rather than re-decoding per byte.
                if byte.is_ascii() {
                    decoded.push(byte as char);
                } else {
                    decoded.push('\u{FFFD}');
                }
            }
        }
        let content_end = self.pos;
        self.pos += 1; // closing quote
        let text = self.slice(start, self.pos);
        if interpolated {
            let raw = self.slice(content_start, content_end);
            self.mk(TokenKind::InterpStringLit, text)
                .with_literal(Literal::InterpRaw(raw))
        } else {
            let owned = self.arena.alloc_str(&decoded);
            self.mk(TokenKind::StringLit, text)
                .with_literal(Literal::Str(owned))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let arena = Arena::new();
        Lexer::init(&arena, src, "test.loom")
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn stream_always_ends_in_a_single_eof() {
        let ks = kinds("var x: int = 1");
        assert_eq!(ks.last(), Some(&TokenKind::Eof));
        assert_eq!(ks.iter().filter(|k| **k == TokenKind::Eof).count(), 1);
    }

    #[test]
    fn indent_and_dedent_are_balanced() {
        let src = "fn main(): void =>\n  var x: int = 1\n  if x == 1 =>\n    return\n";
        let ks = kinds(src);
        let indents = ks.iter().filter(|k| **k == TokenKind::Indent).count();
        let dedents = ks.iter().filter(|k| **k == TokenKind::Dedent).count();
        assert_eq!(indents, dedents);
        assert_eq!(indents, 2);
    }

    #[test]
    fn blank_line_does_not_touch_indent_stack() {
        let src = "fn main(): void =>\n  var x: int = 1\n\n  var y: int = 2\n";
        let ks = kinds(src);
        assert_eq!(ks.iter().filter(|k| **k == TokenKind::Indent).count(), 1);
        assert_eq!(ks.iter().filter(|k| **k == TokenKind::Dedent).count(), 1);
    }

    #[test]
    fn keywords_and_identifiers_are_distinguished() {
        let ks = kinds("fn foo");
        assert_eq!(ks[0], TokenKind::Fn);
        assert_eq!(ks[1], TokenKind::Ident);
    }

    #[test]
    fn numeric_suffixes_select_long_and_double() {
        let arena = Arena::new();
        let toks = Lexer::init(&arena, "1 1l 1.5 1.5d", "t.loom").tokenize();
        assert_eq!(toks[0].kind, TokenKind::IntLit);
        assert_eq!(toks[1].kind, TokenKind::LongLit);
        assert_eq!(toks[2].kind, TokenKind::DoubleLit);
        assert_eq!(toks[3].kind, TokenKind::DoubleLit);
    }

    #[test]
    fn digraphs_are_recognized() {
        let ks = kinds("== != <= >= ++ -- => -> && || .. ...");
        assert_eq!(
            ks,
            vec![
                TokenKind::EqEq,
                TokenKind::BangEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::PlusPlus,
                TokenKind::MinusMinus,
                TokenKind::FatArrow,
                TokenKind::Arrow,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::DotDot,
                TokenKind::DotDotDot,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_yields_error_token_and_stream_stays_finite() {
        let arena = Arena::new();
        let toks = Lexer::init(&arena, "\"abc", "t.loom").tokenize();
        assert_eq!(toks[0].kind, TokenKind::Error);
        assert_eq!(toks.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn interpolated_string_keeps_raw_payload() {
        let arena = Arena::new();
        let toks = Lexer::init(&arena, "$\"n={x}\\n\"", "t.loom").tokenize();
        assert_eq!(toks[0].kind, TokenKind::InterpStringLit);
        match toks[0].literal {
            Literal::InterpRaw(s) => assert_eq!(s, "n={x}\\n"),
            _ => panic!("expected InterpRaw payload"),
        }
    }

    #[test]
    fn comment_only_line_emits_only_newline() {
        let src = "// comment\nvar x: int = 1\n";
        let ks = kinds(src);
        assert_eq!(ks[0], TokenKind::Newline);
    }
}
