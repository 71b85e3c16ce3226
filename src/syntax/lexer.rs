// Copyright 2019 The Skylark in Rust Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The scanner, converting a byte stream to a token stream with significant
//! newlines and INDENT/DEDENT tokens.

use crate::syntax::errors::SyntaxError;
use codemap::Span;
use codemap_diagnostic::{Diagnostic, Level, SpanLabel, SpanStyle};
use num_bigint::BigInt;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::fmt;

// Error codes -- CL = Critical Lexing
pub const UNEXPECTED_CHARACTER_ERROR_CODE: &str = "CL00";
pub const UNTERMINATED_STRING_ERROR_CODE: &str = "CL01";
pub const INVALID_ESCAPE_SEQUENCE_ERROR_CODE: &str = "CL02";
pub const INVALID_NUMBER_LITERAL_ERROR_CODE: &str = "CL03";
pub const INDENTATION_ERROR_CODE: &str = "CL04";

/// A token together with the byte offsets of its first and one-past-last
/// character in the file, ready to be converted to a `Span`.
pub type LexerItem = (u64, Token, u64);

/// Errors that can be raised by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub enum LexerError {
    /// A character that cannot start any token.
    UnexpectedCharacter(u64, char),
    /// End of file or end of line in the middle of a string literal.
    UnterminatedStringLiteral(u64),
    /// A backslash escape the language does not define.
    InvalidEscapeSequence(u64, u64),
    /// A malformed integer or float literal.
    InvalidNumberLiteral(u64, u64),
    /// A dedent that does not match any enclosing indentation level.
    Indentation(u64),
}

impl LexerError {
    pub(crate) fn offsets(&self) -> (u64, u64) {
        match self {
            LexerError::UnexpectedCharacter(x, ..) => (*x, *x + 1),
            LexerError::UnterminatedStringLiteral(x) => (*x, *x + 1),
            LexerError::InvalidEscapeSequence(lo, hi) => (*lo, *hi),
            LexerError::InvalidNumberLiteral(lo, hi) => (*lo, *hi),
            LexerError::Indentation(x) => (*x, *x),
        }
    }
}

impl SyntaxError for LexerError {
    fn to_diagnostic(self, file_span: Span) -> Diagnostic {
        let (label, message, code) = match self {
            LexerError::UnexpectedCharacter(_, c) => (
                "Unexpected character".to_owned(),
                format!("Character '{}' cannot start a token", c.escape_default()),
                UNEXPECTED_CHARACTER_ERROR_CODE,
            ),
            LexerError::UnterminatedStringLiteral(..) => (
                "Unterminated string literal".to_owned(),
                "String literal is not terminated before the end of the line or file".to_owned(),
                UNTERMINATED_STRING_ERROR_CODE,
            ),
            LexerError::InvalidEscapeSequence(..) => (
                "Invalid escape sequence".to_owned(),
                "Backslash escape sequence is not defined by the language".to_owned(),
                INVALID_ESCAPE_SEQUENCE_ERROR_CODE,
            ),
            LexerError::InvalidNumberLiteral(..) => (
                "Invalid number literal".to_owned(),
                "Malformed integer or floating point literal".to_owned(),
                INVALID_NUMBER_LITERAL_ERROR_CODE,
            ),
            LexerError::Indentation(..) => (
                "Incorrect indentation".to_owned(),
                "Indentation does not match any enclosing indentation level".to_owned(),
                INDENTATION_ERROR_CODE,
            ),
        };
        let (lo, hi) = self.offsets();
        Diagnostic {
            level: Level::Error,
            message,
            code: Some(code.to_owned()),
            spans: vec![SpanLabel {
                span: file_span.subspan(lo, hi),
                style: SpanStyle::Primary,
                label: Some(label),
            }],
        }
    }
}

/// All lexical tokens of the language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Indent,
    Dedent,
    Newline,
    Identifier(String),
    IntLiteral(BigInt),
    FloatLiteral(f64),
    StringLiteral(String),
    // Keywords
    And,
    Break,
    Continue,
    Def,
    Elif,
    Else,
    For,
    If,
    In,
    Lambda,
    Load,
    Not,
    Or,
    Pass,
    Return,
    While,
    // Punctuation
    Comma,
    Semicolon,
    Colon,
    Dot,
    Equal,
    // Operators
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    Ampersand,
    Caret,
    Pipe,
    LessLess,
    GreaterGreater,
    EqualEqual,
    BangEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    // Augmented assignment operators
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    SlashSlashEqual,
    PercentEqual,
    AmpersandEqual,
    CaretEqual,
    PipeEqual,
    LessLessEqual,
    GreaterGreaterEqual,
    // Brackets
    OpeningParen,
    ClosingParen,
    OpeningBracket,
    ClosingBracket,
    OpeningBrace,
    ClosingBrace,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Indent => write!(f, "indentation"),
            Token::Dedent => write!(f, "dedentation"),
            Token::Newline => write!(f, "new line"),
            Token::Identifier(s) => write!(f, "identifier '{}'", s),
            Token::IntLiteral(i) => write!(f, "integer literal '{}'", i),
            Token::FloatLiteral(v) => write!(f, "float literal '{}'", v),
            Token::StringLiteral(s) => write!(f, "string literal '{}'", s.escape_default()),
            Token::And => write!(f, "keyword 'and'"),
            Token::Break => write!(f, "keyword 'break'"),
            Token::Continue => write!(f, "keyword 'continue'"),
            Token::Def => write!(f, "keyword 'def'"),
            Token::Elif => write!(f, "keyword 'elif'"),
            Token::Else => write!(f, "keyword 'else'"),
            Token::For => write!(f, "keyword 'for'"),
            Token::If => write!(f, "keyword 'if'"),
            Token::In => write!(f, "keyword 'in'"),
            Token::Lambda => write!(f, "keyword 'lambda'"),
            Token::Load => write!(f, "keyword 'load'"),
            Token::Not => write!(f, "keyword 'not'"),
            Token::Or => write!(f, "keyword 'or'"),
            Token::Pass => write!(f, "keyword 'pass'"),
            Token::Return => write!(f, "keyword 'return'"),
            Token::While => write!(f, "keyword 'while'"),
            Token::Comma => write!(f, "','"),
            Token::Semicolon => write!(f, "';'"),
            Token::Colon => write!(f, "':'"),
            Token::Dot => write!(f, "'.'"),
            Token::Equal => write!(f, "'='"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::StarStar => write!(f, "'**'"),
            Token::Slash => write!(f, "'/'"),
            Token::SlashSlash => write!(f, "'//'"),
            Token::Percent => write!(f, "'%'"),
            Token::Ampersand => write!(f, "'&'"),
            Token::Caret => write!(f, "'^'"),
            Token::Pipe => write!(f, "'|'"),
            Token::LessLess => write!(f, "'<<'"),
            Token::GreaterGreater => write!(f, "'>>'"),
            Token::EqualEqual => write!(f, "'=='"),
            Token::BangEqual => write!(f, "'!='"),
            Token::Less => write!(f, "'<'"),
            Token::Greater => write!(f, "'>'"),
            Token::LessEqual => write!(f, "'<='"),
            Token::GreaterEqual => write!(f, "'>='"),
            Token::PlusEqual => write!(f, "'+='"),
            Token::MinusEqual => write!(f, "'-='"),
            Token::StarEqual => write!(f, "'*='"),
            Token::SlashEqual => write!(f, "'/='"),
            Token::SlashSlashEqual => write!(f, "'//='"),
            Token::PercentEqual => write!(f, "'%='"),
            Token::AmpersandEqual => write!(f, "'&='"),
            Token::CaretEqual => write!(f, "'^='"),
            Token::PipeEqual => write!(f, "'|='"),
            Token::LessLessEqual => write!(f, "'<<='"),
            Token::GreaterGreaterEqual => write!(f, "'>>='"),
            Token::OpeningParen => write!(f, "'('"),
            Token::ClosingParen => write!(f, "')'"),
            Token::OpeningBracket => write!(f, "'['"),
            Token::ClosingBracket => write!(f, "']'"),
            Token::OpeningBrace => write!(f, "'{{'"),
            Token::ClosingBrace => write!(f, "'}}'"),
            Token::Eof => write!(f, "end of file"),
        }
    }
}

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, Token> = {
        let mut m = HashMap::new();
        m.insert("and", Token::And);
        m.insert("break", Token::Break);
        m.insert("continue", Token::Continue);
        m.insert("def", Token::Def);
        m.insert("elif", Token::Elif);
        m.insert("else", Token::Else);
        m.insert("for", Token::For);
        m.insert("if", Token::If);
        m.insert("in", Token::In);
        m.insert("lambda", Token::Lambda);
        m.insert("load", Token::Load);
        m.insert("not", Token::Not);
        m.insert("or", Token::Or);
        m.insert("pass", Token::Pass);
        m.insert("return", Token::Return);
        m.insert("while", Token::While);
        m
    };
}

/// The scanner itself, an iterator over `Result<LexerItem, LexerError>`.
pub struct Lexer {
    chars: Vec<(usize, char)>,
    len: usize,
    pos: usize,
    /// Stack of indentation widths of the enclosing blocks.
    indents: Vec<usize>,
    /// Open parenthesis/bracket/brace nesting depth.
    parens: u32,
    /// Tokens scheduled ahead of the scanning position (dedent runs, EOF).
    pending: VecDeque<LexerItem>,
    /// True when positioned at the start of a fresh line, before its
    /// indentation has been measured.
    at_line_start: bool,
    /// True when at least one token was produced on the current logical line.
    line_has_tokens: bool,
    done: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Lexer {
        Lexer {
            chars: input.char_indices().collect(),
            len: input.len(),
            pos: 0,
            indents: vec![0],
            parens: 0,
            pending: VecDeque::new(),
            at_line_start: true,
            line_has_tokens: false,
            done: false,
        }
    }

    fn offset(&self) -> u64 {
        if self.pos < self.chars.len() {
            self.chars[self.pos].0 as u64
        } else {
            self.len as u64
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let r = self.peek();
        if r.is_some() {
            self.pos += 1;
        }
        r
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Skip the remainder of a `#` comment, leaving the newline in place.
    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.pos += 1;
        }
    }

    /// Measure the indentation of the line starting at the current position
    /// and emit the indent/dedent tokens it implies. Blank and comment-only
    /// lines are skipped entirely.
    fn handle_line_start(&mut self) -> Result<(), LexerError> {
        loop {
            let mut width = 0usize;
            loop {
                match self.peek() {
                    Some(' ') => {
                        width += 1;
                        self.pos += 1;
                    }
                    Some('\t') => {
                        width = width + 8 - width % 8;
                        self.pos += 1;
                    }
                    Some('\r') => {
                        self.pos += 1;
                    }
                    _ => break,
                }
            }
            match self.peek() {
                Some('\n') => {
                    // Blank line, no tokens.
                    self.pos += 1;
                    continue;
                }
                Some('#') => {
                    self.skip_comment();
                    continue;
                }
                None => {
                    // EOF handled by the main loop.
                    self.at_line_start = false;
                    return Ok(());
                }
                Some(..) => {
                    let here = self.offset();
                    let current = *self.indents.last().unwrap();
                    if width > current {
                        self.indents.push(width);
                        self.pending.push_back((here, Token::Indent, here));
                    } else if width < current {
                        while *self.indents.last().unwrap() > width {
                            self.indents.pop();
                            self.pending.push_back((here, Token::Dedent, here));
                        }
                        if *self.indents.last().unwrap() != width {
                            return Err(LexerError::Indentation(here));
                        }
                    }
                    self.at_line_start = false;
                    return Ok(());
                }
            }
        }
    }

    /// Emit the newline/dedent/eof run terminating the file.
    fn handle_eof(&mut self) {
        let here = self.offset();
        if self.line_has_tokens {
            self.pending.push_back((here, Token::Newline, here));
            self.line_has_tokens = false;
        }
        while *self.indents.last().unwrap() > 0 {
            self.indents.pop();
            self.pending.push_back((here, Token::Dedent, here));
        }
        self.pending.push_back((here, Token::Eof, here));
        self.done = true;
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().map(|&(_, c)| c).collect();
        match KEYWORDS.get(text.as_str()) {
            Some(t) => t.clone(),
            None => Token::Identifier(text),
        }
    }

    fn scan_radix_literal(&mut self, lo: u64, radix: u32) -> Result<Token, LexerError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_digit(radix) {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(LexerError::InvalidNumberLiteral(lo, self.offset()));
        }
        let digits: String = self.chars[start..self.pos].iter().map(|&(_, c)| c).collect();
        match BigInt::parse_bytes(digits.as_bytes(), radix) {
            Some(i) => Ok(Token::IntLiteral(i)),
            None => Err(LexerError::InvalidNumberLiteral(lo, self.offset())),
        }
    }

    /// Scan a number literal; `leading_dot` is set when the literal begins
    /// with `.` (as in `.5`).
    fn scan_number(&mut self, leading_dot: bool) -> Result<Token, LexerError> {
        let lo = self.offset();
        let start = self.pos;
        if !leading_dot && self.peek() == Some('0') {
            match self.peek_at(1) {
                Some('x') | Some('X') => {
                    self.pos += 2;
                    return self.scan_radix_literal(lo, 16);
                }
                Some('o') | Some('O') => {
                    self.pos += 2;
                    return self.scan_radix_literal(lo, 8);
                }
                Some('b') | Some('B') => {
                    self.pos += 2;
                    return self.scan_radix_literal(lo, 2);
                }
                _ => {}
            }
        }
        let mut is_float = leading_dot;
        if leading_dot {
            // The '.' itself was not yet consumed by the caller.
            self.pos += 1;
        }
        while self.peek().map_or(false, |c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if !leading_dot && self.peek() == Some('.') && self.peek_at(1) != Some('.') {
            is_float = true;
            self.pos += 1;
            while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if self.peek() == Some('e') || self.peek() == Some('E') {
            let mark = self.pos;
            self.pos += 1;
            if self.peek() == Some('+') || self.peek() == Some('-') {
                self.pos += 1;
            }
            if self.peek().map_or(false, |c| c.is_ascii_digit()) {
                is_float = true;
                while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
            } else {
                // Not an exponent after all; back off (e.g. `3 else`).
                self.pos = mark;
            }
        }
        let text: String = self.chars[start..self.pos].iter().map(|&(_, c)| c).collect();
        if is_float {
            match text.parse::<f64>() {
                Ok(f) => Ok(Token::FloatLiteral(f)),
                Err(..) => Err(LexerError::InvalidNumberLiteral(lo, self.offset())),
            }
        } else {
            if text.len() > 1 && text.starts_with('0') {
                return Err(LexerError::InvalidNumberLiteral(lo, self.offset()));
            }
            match BigInt::parse_bytes(text.as_bytes(), 10) {
                Some(i) => Ok(Token::IntLiteral(i)),
                None => Err(LexerError::InvalidNumberLiteral(lo, self.offset())),
            }
        }
    }

    /// Decode one backslash escape of a cooked (non-raw) string literal.
    fn scan_escape(&mut self, content: &mut String) -> Result<(), LexerError> {
        let lo = self.offset() - 1;
        match self.bump() {
            None => Err(LexerError::UnterminatedStringLiteral(lo)),
            Some('\n') => Ok(()),
            Some('a') => {
                content.push('\x07');
                Ok(())
            }
            Some('b') => {
                content.push('\x08');
                Ok(())
            }
            Some('f') => {
                content.push('\x0C');
                Ok(())
            }
            Some('n') => {
                content.push('\n');
                Ok(())
            }
            Some('r') => {
                content.push('\r');
                Ok(())
            }
            Some('t') => {
                content.push('\t');
                Ok(())
            }
            Some('v') => {
                content.push('\x0B');
                Ok(())
            }
            Some('\\') => {
                content.push('\\');
                Ok(())
            }
            Some('\'') => {
                content.push('\'');
                Ok(())
            }
            Some('"') => {
                content.push('"');
                Ok(())
            }
            Some('x') => {
                let mut value = 0u32;
                for _ in 0..2 {
                    match self.peek().and_then(|c| c.to_digit(16)) {
                        Some(d) => {
                            value = value * 16 + d;
                            self.pos += 1;
                        }
                        None => return Err(LexerError::InvalidEscapeSequence(lo, self.offset())),
                    }
                }
                content.push(value as u8 as char);
                Ok(())
            }
            Some(c) if c.is_digit(8) => {
                let mut value = c.to_digit(8).unwrap();
                for _ in 0..2 {
                    match self.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            self.pos += 1;
                        }
                        None => break,
                    }
                }
                if value > 255 {
                    return Err(LexerError::InvalidEscapeSequence(lo, self.offset()));
                }
                content.push(value as u8 as char);
                Ok(())
            }
            Some(..) => Err(LexerError::InvalidEscapeSequence(lo, self.offset())),
        }
    }

    /// Scan a string literal. The opening quote has been consumed.
    fn scan_string(&mut self, lo: u64, quote: char, raw: bool) -> Result<Token, LexerError> {
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.pos += 2;
        }
        let mut content = String::new();
        loop {
            match self.bump() {
                None => return Err(LexerError::UnterminatedStringLiteral(lo)),
                Some('\n') if !triple => return Err(LexerError::UnterminatedStringLiteral(lo)),
                Some(c) if c == quote => {
                    if !triple {
                        return Ok(Token::StringLiteral(content));
                    }
                    if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                        self.pos += 2;
                        return Ok(Token::StringLiteral(content));
                    }
                    content.push(c);
                }
                Some('\\') => {
                    if raw {
                        // A backslash never escapes in a raw literal; it is
                        // retained, and the following character (even a
                        // quote) is taken verbatim.
                        match self.bump() {
                            None => return Err(LexerError::UnterminatedStringLiteral(lo)),
                            Some(c) => {
                                content.push('\\');
                                content.push(c);
                            }
                        }
                    } else {
                        self.scan_escape(&mut content)?;
                    }
                }
                Some(c) => content.push(c),
            }
        }
    }

    /// Scan one punctuation or operator token.
    fn scan_operator(&mut self, c: char) -> Result<Token, LexerError> {
        let t = match c {
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            ':' => Token::Colon,
            '.' => Token::Dot,
            '(' => {
                self.parens += 1;
                Token::OpeningParen
            }
            ')' => {
                self.parens = self.parens.saturating_sub(1);
                Token::ClosingParen
            }
            '[' => {
                self.parens += 1;
                Token::OpeningBracket
            }
            ']' => {
                self.parens = self.parens.saturating_sub(1);
                Token::ClosingBracket
            }
            '{' => {
                self.parens += 1;
                Token::OpeningBrace
            }
            '}' => {
                self.parens = self.parens.saturating_sub(1);
                Token::ClosingBrace
            }
            '+' => {
                if self.eat('=') {
                    Token::PlusEqual
                } else {
                    Token::Plus
                }
            }
            '-' => {
                if self.eat('=') {
                    Token::MinusEqual
                } else {
                    Token::Minus
                }
            }
            '*' => {
                if self.eat('=') {
                    Token::StarEqual
                } else if self.eat('*') {
                    Token::StarStar
                } else {
                    Token::Star
                }
            }
            '/' => {
                if self.eat('/') {
                    if self.eat('=') {
                        Token::SlashSlashEqual
                    } else {
                        Token::SlashSlash
                    }
                } else if self.eat('=') {
                    Token::SlashEqual
                } else {
                    Token::Slash
                }
            }
            '%' => {
                if self.eat('=') {
                    Token::PercentEqual
                } else {
                    Token::Percent
                }
            }
            '&' => {
                if self.eat('=') {
                    Token::AmpersandEqual
                } else {
                    Token::Ampersand
                }
            }
            '^' => {
                if self.eat('=') {
                    Token::CaretEqual
                } else {
                    Token::Caret
                }
            }
            '|' => {
                if self.eat('=') {
                    Token::PipeEqual
                } else {
                    Token::Pipe
                }
            }
            '=' => {
                if self.eat('=') {
                    Token::EqualEqual
                } else {
                    Token::Equal
                }
            }
            '!' => {
                if self.eat('=') {
                    Token::BangEqual
                } else {
                    return Err(LexerError::UnexpectedCharacter(self.offset() - 1, '!'));
                }
            }
            '<' => {
                if self.eat('=') {
                    Token::LessEqual
                } else if self.eat('<') {
                    if self.eat('=') {
                        Token::LessLessEqual
                    } else {
                        Token::LessLess
                    }
                } else {
                    Token::Less
                }
            }
            '>' => {
                if self.eat('=') {
                    Token::GreaterEqual
                } else if self.eat('>') {
                    if self.eat('=') {
                        Token::GreaterGreaterEqual
                    } else {
                        Token::GreaterGreater
                    }
                } else {
                    Token::Greater
                }
            }
            c => return Err(LexerError::UnexpectedCharacter(self.offset() - 1, c)),
        };
        Ok(t)
    }

    fn next_token(&mut self) -> Result<LexerItem, LexerError> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Ok(item);
            }
            if self.done {
                let here = self.offset();
                return Ok((here, Token::Eof, here));
            }
            if self.at_line_start && self.parens == 0 {
                self.handle_line_start()?;
                continue;
            }
            match self.peek() {
                None => {
                    self.handle_eof();
                    continue;
                }
                Some(' ') | Some('\t') | Some('\r') => {
                    self.pos += 1;
                    continue;
                }
                Some('\\') if self.peek_at(1) == Some('\n') => {
                    // Explicit line joining.
                    self.pos += 2;
                    continue;
                }
                Some('#') => {
                    self.skip_comment();
                    continue;
                }
                Some('\n') => {
                    self.pos += 1;
                    if self.parens > 0 {
                        continue;
                    }
                    self.at_line_start = true;
                    if self.line_has_tokens {
                        self.line_has_tokens = false;
                        let here = self.offset();
                        return Ok((here - 1, Token::Newline, here));
                    }
                    continue;
                }
                Some(c) => {
                    let lo = self.offset();
                    self.line_has_tokens = true;
                    // Raw string prefix.
                    if c == 'r'
                        && (self.peek_at(1) == Some('"') || self.peek_at(1) == Some('\''))
                    {
                        self.pos += 1;
                        let quote = self.bump().unwrap();
                        let t = self.scan_string(lo, quote, true)?;
                        return Ok((lo, t, self.offset()));
                    }
                    let t = if c == '"' || c == '\'' {
                        self.pos += 1;
                        self.scan_string(lo, c, false)?
                    } else if c.is_ascii_alphabetic() || c == '_' {
                        self.scan_identifier()
                    } else if c.is_ascii_digit() {
                        self.scan_number(false)?
                    } else if c == '.' && self.peek_at(1).map_or(false, |c| c.is_ascii_digit()) {
                        self.scan_number(true)?
                    } else {
                        self.pos += 1;
                        self.scan_operator(c)?
                    };
                    return Ok((lo, t, self.offset()));
                }
            }
        }
    }
}

impl Iterator for Lexer {
    type Item = Result<LexerItem, LexerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done && self.pending.is_empty() {
            return None;
        }
        Some(self.next_token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .map(|r| r.unwrap().1)
            .collect::<Vec<Token>>()
    }

    fn fails(input: &str) -> LexerError {
        for t in Lexer::new(input) {
            if let Err(e) = t {
                return e;
            }
        }
        panic!("lexing '{}' did not fail", input);
    }

    #[test]
    fn simple_statement() {
        assert_eq!(
            vec![
                Token::Identifier("x".to_owned()),
                Token::Equal,
                Token::IntLiteral(BigInt::from(1)),
                Token::Newline,
                Token::Eof,
            ],
            tokens("x = 1\n")
        );
    }

    #[test]
    fn final_newline_is_implied() {
        assert_eq!(
            vec![
                Token::Identifier("x".to_owned()),
                Token::Equal,
                Token::IntLiteral(BigInt::from(1)),
                Token::Newline,
                Token::Eof,
            ],
            tokens("x = 1")
        );
    }

    #[test]
    fn indent_dedent() {
        assert_eq!(
            vec![
                Token::Def,
                Token::Identifier("f".to_owned()),
                Token::OpeningParen,
                Token::ClosingParen,
                Token::Colon,
                Token::Newline,
                Token::Indent,
                Token::Pass,
                Token::Newline,
                Token::Dedent,
                Token::Identifier("x".to_owned()),
                Token::Equal,
                Token::IntLiteral(BigInt::from(2)),
                Token::Newline,
                Token::Eof,
            ],
            tokens("def f():\n  pass\nx = 2\n")
        );
    }

    #[test]
    fn blank_and_comment_lines_do_not_dedent() {
        assert_eq!(
            vec![
                Token::If,
                Token::Identifier("x".to_owned()),
                Token::Colon,
                Token::Newline,
                Token::Indent,
                Token::Pass,
                Token::Newline,
                Token::Pass,
                Token::Newline,
                Token::Dedent,
                Token::Eof,
            ],
            tokens("if x:\n  pass\n\n# comment\n  pass\n")
        );
    }

    #[test]
    fn nesting_suppresses_newline() {
        assert_eq!(
            vec![
                Token::Identifier("x".to_owned()),
                Token::Equal,
                Token::OpeningBracket,
                Token::IntLiteral(BigInt::from(1)),
                Token::Comma,
                Token::IntLiteral(BigInt::from(2)),
                Token::ClosingBracket,
                Token::Newline,
                Token::Eof,
            ],
            tokens("x = [1,\n     2]\n")
        );
    }

    #[test]
    fn backslash_joins_lines() {
        assert_eq!(
            vec![
                Token::Identifier("x".to_owned()),
                Token::Equal,
                Token::IntLiteral(BigInt::from(1)),
                Token::Plus,
                Token::IntLiteral(BigInt::from(2)),
                Token::Newline,
                Token::Eof,
            ],
            tokens("x = 1 + \\\n    2\n")
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            vec![
                Token::StringLiteral("a\nb".to_owned()),
                Token::Newline,
                Token::Eof
            ],
            tokens(r#""a\nb""#)
        );
        assert_eq!(
            vec![
                Token::StringLiteral("A".to_owned()),
                Token::Newline,
                Token::Eof
            ],
            tokens(r#""\x41""#)
        );
        assert_eq!(
            vec![
                Token::StringLiteral("\u{FF}".to_owned()),
                Token::Newline,
                Token::Eof
            ],
            tokens(r#""\377""#)
        );
        assert_eq!(
            vec![
                Token::StringLiteral("ab".to_owned()),
                Token::Newline,
                Token::Eof
            ],
            tokens("\"a\\\nb\"")
        );
    }

    #[test]
    fn raw_strings_keep_backslashes() {
        assert_eq!(
            vec![
                Token::StringLiteral("a\\nb".to_owned()),
                Token::Newline,
                Token::Eof
            ],
            tokens(r#"r"a\nb""#)
        );
        assert_eq!(
            vec![
                Token::StringLiteral("a\\\"b".to_owned()),
                Token::Newline,
                Token::Eof
            ],
            tokens(r#"r"a\"b""#)
        );
    }

    #[test]
    fn triple_quoted_strings() {
        assert_eq!(
            vec![
                Token::StringLiteral("a\nb\"c".to_owned()),
                Token::Newline,
                Token::Eof
            ],
            tokens("'''a\nb\"c'''")
        );
    }

    #[test]
    fn number_literals() {
        assert_eq!(
            vec![
                Token::IntLiteral(BigInt::from(255)),
                Token::Newline,
                Token::Eof
            ],
            tokens("0xFF")
        );
        assert_eq!(
            vec![
                Token::IntLiteral(BigInt::from(8)),
                Token::Newline,
                Token::Eof
            ],
            tokens("0o10")
        );
        assert_eq!(
            vec![
                Token::IntLiteral(BigInt::from(5)),
                Token::Newline,
                Token::Eof
            ],
            tokens("0b101")
        );
        assert_eq!(
            vec![Token::FloatLiteral(1.5), Token::Newline, Token::Eof],
            tokens("1.5")
        );
        assert_eq!(
            vec![Token::FloatLiteral(0.5), Token::Newline, Token::Eof],
            tokens(".5")
        );
        assert_eq!(
            vec![Token::FloatLiteral(1e10), Token::Newline, Token::Eof],
            tokens("1e10")
        );
        // No magnitude limit on integers.
        assert_eq!(
            vec![
                Token::IntLiteral(
                    BigInt::parse_bytes(b"123456789012345678901234567890", 10).unwrap()
                ),
                Token::Newline,
                Token::Eof
            ],
            tokens("123456789012345678901234567890")
        );
    }

    #[test]
    fn bad_literals() {
        assert!(matches!(
            fails("0123"),
            LexerError::InvalidNumberLiteral(..)
        ));
        assert!(matches!(
            fails(r#""\z""#),
            LexerError::InvalidEscapeSequence(..)
        ));
        assert!(matches!(
            fails(r#""\400""#),
            LexerError::InvalidEscapeSequence(..)
        ));
        assert!(matches!(
            fails("\"abc"),
            LexerError::UnterminatedStringLiteral(..)
        ));
        assert!(matches!(
            fails("'abc\ndef'"),
            LexerError::UnterminatedStringLiteral(..)
        ));
    }

    #[test]
    fn mismatched_dedent_is_an_error() {
        assert!(matches!(
            fails("if x:\n    pass\n  pass\n"),
            LexerError::Indentation(..)
        ));
    }

    #[test]
    fn reserved_words_lex_as_identifiers() {
        // The resolver, not the scanner, rejects reserved words.
        assert_eq!(
            vec![
                Token::Identifier("class".to_owned()),
                Token::Newline,
                Token::Eof
            ],
            tokens("class")
        );
    }
}
