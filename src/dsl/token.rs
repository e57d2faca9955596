//! Token types for the Oort lexer.

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token, quotes included for strings.
    pub text: String,
    pub line: usize,
    pub col: usize,
    /// Byte offsets into the source: `start..end`.
    pub start: usize,
    pub end: usize,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Fn,
    On,
    Load,
    Tick,
    If,
    Else,
    From,
    Import,
    As,
    Macro,
    For,
    In,
    While,
    Var,

    // Literals
    Ident(String),
    Integer(i64),
    Str(String),
    Selector(String), // @a, @p, @r, @e, @s

    // Delimiters
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Semicolon,

    // Operators
    Star,    // *
    EqEq,    // ==
    NotEq,   // !=
    GtEq,    // >=
    LtEq,    // <=
    Eq,      // =
    Gt,      // >
    Lt,      // <
    Plus,    // +
    Minus,   // -
    Slash,   // /

    // Special
    Eof,
}

impl TokenKind {
    /// Map a bare word to its keyword, if it is one.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "fn" => TokenKind::Fn,
            "on" => TokenKind::On,
            "load" => TokenKind::Load,
            "tick" => TokenKind::Tick,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "from" => TokenKind::From,
            "import" => TokenKind::Import,
            "as" => TokenKind::As,
            "macro" => TokenKind::Macro,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "while" => TokenKind::While,
            "var" => TokenKind::Var,
            _ => return None,
        };
        Some(kind)
    }
}
