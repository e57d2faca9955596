//! Oort front end: source text to tokens to a module AST.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use error::{CompileError, ErrorKind};

use lexer::Lexer;
use parser::Parser;
use std::path::Path;

/// The front-end compiler for a single Oort module.
pub struct Compiler;

impl Compiler {
    /// Lex and parse one module's source text.
    pub fn parse(path: &Path, source: &str) -> Result<Module, CompileError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize().map_err(|e| e.in_file(path))?;
        let mut parser = Parser::new(tokens, path);
        parser.parse()
    }
}
