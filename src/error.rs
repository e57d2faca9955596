//! Top-level error for a build: every recognized failure kind, prefixed.

use thiserror::Error;

use crate::dsl::CompileError;
use crate::emit::EmitError;
use crate::macros::MacroError;
use crate::project::{ConfigError, ResolveError};
use crate::symbols::SymbolError;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Lex and parse errors carry their own kind prefix.
    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("resolver error: {0}")]
    Resolve(ResolveError),

    #[error("symbol error: {0}")]
    Symbol(#[from] SymbolError),

    #[error("macro error: {0}")]
    Macro(#[from] MacroError),

    #[error("emitter error: {0}")]
    Emit(#[from] EmitError),
}

impl From<ResolveError> for BuildError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Syntax(err) => BuildError::Compile(err),
            other => BuildError::Resolve(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn syntax_errors_from_the_resolver_are_compile_errors() {
        let err: BuildError = ResolveError::Syntax(CompileError::parse("expected '}'", 2, 5)).into();
        assert!(matches!(err, BuildError::Compile(_)));
        assert!(err.to_string().contains("parse error"));
    }

    #[test]
    fn prefixes_name_the_stage() {
        let err: BuildError = ResolveError::NotFound {
            path: PathBuf::from("/p/x.oort"),
            importer: None,
        }
        .into();
        assert_eq!(err.to_string(), "resolver error: module not found: /p/x.oort");

        let err: BuildError = ConfigError::MissingField { field: "package.name" }.into();
        assert_eq!(err.to_string(), "configuration error: missing required field: package.name");
    }
}
