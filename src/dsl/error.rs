//! Error types for the Oort front end (lexer and parser).

use std::fmt;
use std::path::{Path, PathBuf};

/// An error raised while turning source text into a module AST.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub message: String,
    pub line: usize,
    pub col: usize,
    pub kind: ErrorKind,
    /// Source file, attached once the error leaves the lexer/parser.
    pub file: Option<PathBuf>,
    /// Text of the offending token; `None` at end of input.
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    LexError,
    ParseError,
}

impl CompileError {
    pub fn lex(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::LexError,
            file: None,
            token: None,
        }
    }

    pub fn parse(message: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            kind: ErrorKind::ParseError,
            file: None,
            token: None,
        }
    }

    /// Record the text of the token the error points at.
    pub fn near(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Record which file the error came from.
    pub fn in_file(mut self, file: &Path) -> Self {
        self.file = Some(file.to_path_buf());
        self
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::LexError => "lex error",
            ErrorKind::ParseError => "parse error",
        };
        if let Some(file) = &self.file {
            write!(f, "{}:", file.display())?;
        }
        write!(f, "{}:{}: {kind}", self.line, self.col)?;
        match &self.token {
            Some(token) => write!(f, " near '{token}': {}", self.message),
            None => write!(f, ": {}", self.message),
        }
    }
}

impl std::error::Error for CompileError {}
