//! Non-fatal emission problems.
//!
//! Each one also leaves a `# ...` comment line in the generated function,
//! so the output stays readable on its own.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A call whose target could not be found.
    Unresolved,
    /// A construct the target cannot express.
    Unsupported,
    /// A construct the compiler does not lower yet.
    Unimplemented,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::Unresolved => "unresolved",
            DiagnosticKind::Unsupported => "unsupported",
            DiagnosticKind::Unimplemented => "unimplemented",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub module: PathBuf,
    /// Function path (`src/main/on_load`), or `None` at module top level.
    pub function: Option<String>,
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.module.display(),
            self.line,
            self.kind.as_str(),
            self.message
        )?;
        if let Some(function) = &self.function {
            write!(f, " (in {function})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_location_and_function() {
        let diag = Diagnostic {
            kind: DiagnosticKind::Unresolved,
            module: PathBuf::from("/p/main.oort"),
            function: Some("main/on_load".to_string()),
            line: 3,
            message: "call to unknown function 'heal'".to_string(),
        };
        assert_eq!(
            diag.to_string(),
            "/p/main.oort:3: unresolved: call to unknown function 'heal' (in main/on_load)"
        );
    }

    #[test]
    fn display_without_function() {
        let diag = Diagnostic {
            kind: DiagnosticKind::Unsupported,
            module: PathBuf::from("/p/main.oort"),
            function: None,
            line: 1,
            message: "skipped".to_string(),
        };
        assert_eq!(diag.to_string(), "/p/main.oort:1: unsupported: skipped");
    }
}
