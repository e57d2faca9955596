//! Lexer for the Oort language.
//!
//! Converts source text into a stream of [`Token`]s terminated by
//! [`TokenKind::Eof`]. Whitespace and `#` comments are skipped but still
//! advance the line/column and byte-offset counters.

use super::error::CompileError;
use super::token::{Token, TokenKind};

pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
    offset: usize,
    line: usize,
    col: usize,
}

/// Start position of the token being lexed.
#[derive(Clone, Copy)]
struct Mark {
    line: usize,
    col: usize,
    offset: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
            offset: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_trivia();

            if self.is_at_end() {
                let mark = self.mark();
                tokens.push(self.finish(TokenKind::Eof, mark));
                break;
            }

            let ch = self.peek();
            let token = match ch {
                '{' => self.single_char(TokenKind::LBrace),
                '}' => self.single_char(TokenKind::RBrace),
                '(' => self.single_char(TokenKind::LParen),
                ')' => self.single_char(TokenKind::RParen),
                ',' => self.single_char(TokenKind::Comma),
                ';' => self.single_char(TokenKind::Semicolon),
                '*' => self.single_char(TokenKind::Star),
                '+' => self.single_char(TokenKind::Plus),
                '-' => self.single_char(TokenKind::Minus),
                '/' => self.single_char(TokenKind::Slash),
                // Two-character operators win over their one-character prefix.
                '=' => self.one_or_two(TokenKind::EqEq, TokenKind::Eq),
                '>' => self.one_or_two(TokenKind::GtEq, TokenKind::Gt),
                '<' => self.one_or_two(TokenKind::LtEq, TokenKind::Lt),
                '!' if self.peek_next() == Some('=') => {
                    let mark = self.mark();
                    self.advance();
                    self.advance();
                    self.finish(TokenKind::NotEq, mark)
                }
                '"' => self.lex_string()?,
                '@' => self.lex_selector()?,
                '0'..='9' => self.lex_number()?,
                'a'..='z' | 'A'..='Z' | '_' => self.lex_ident_or_keyword(),
                _ => {
                    return Err(CompileError::lex(
                        format!("unexpected character '{ch}'"),
                        self.line,
                        self.col,
                    )
                    .near(ch.to_string()));
                }
            };

            tokens.push(token);
        }

        Ok(tokens)
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn mark(&self) -> Mark {
        Mark {
            line: self.line,
            col: self.col,
            offset: self.offset,
        }
    }

    fn finish(&self, kind: TokenKind, mark: Mark) -> Token {
        Token {
            kind,
            text: self.source[mark.offset..self.offset].to_string(),
            line: mark.line,
            col: mark.col,
            start: mark.offset,
            end: self.offset,
        }
    }

    fn skip_trivia(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '#' => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let mark = self.mark();
        self.advance();
        self.finish(kind, mark)
    }

    /// Lex `X=` as `long`, a lone `X` as `short`.
    fn one_or_two(&mut self, long: TokenKind, short: TokenKind) -> Token {
        let mark = self.mark();
        self.advance();
        if !self.is_at_end() && self.peek() == '=' {
            self.advance();
            self.finish(long, mark)
        } else {
            self.finish(short, mark)
        }
    }

    fn lex_string(&mut self) -> Result<Token, CompileError> {
        let mark = self.mark();
        self.advance(); // consume opening '"'
        let mut s = String::new();
        while !self.is_at_end() && self.peek() != '"' && self.peek() != '\n' {
            s.push(self.advance());
        }
        if self.is_at_end() || self.peek() == '\n' {
            return Err(CompileError::lex(
                "unterminated string literal",
                mark.line,
                mark.col,
            ));
        }
        self.advance(); // consume closing '"'
        Ok(self.finish(TokenKind::Str(s), mark))
    }

    fn lex_selector(&mut self) -> Result<Token, CompileError> {
        let mark = self.mark();
        self.advance(); // consume '@'
        match self.chars.get(self.pos).copied() {
            Some(c @ ('a' | 'p' | 'r' | 'e' | 's')) => {
                self.advance();
                Ok(self.finish(TokenKind::Selector(format!("@{c}")), mark))
            }
            _ => Err(CompileError::lex(
                "expected one of @a, @p, @r, @e, @s",
                mark.line,
                mark.col,
            )
            .near("@")),
        }
    }

    fn lex_number(&mut self) -> Result<Token, CompileError> {
        let mark = self.mark();
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            self.advance();
        }
        let digits = &self.source[mark.offset..self.offset];
        let value: i64 = digits.parse().map_err(|_| {
            CompileError::lex("integer literal out of range", mark.line, mark.col).near(digits)
        })?;
        Ok(self.finish(TokenKind::Integer(value), mark))
    }

    fn lex_ident_or_keyword(&mut self) -> Token {
        let mark = self.mark();
        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == '_') {
            self.advance();
        }
        let word = &self.source[mark.offset..self.offset];
        let kind = TokenKind::keyword(word).unwrap_or_else(|| TokenKind::Ident(word.to_string()));
        self.finish(kind, mark)
    }
}

/// Convenience wrapper: tokenize a whole source string.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    Lexer::new(source).tokenize()
}
