//! Macro expansion: AST-to-AST rewriting of macro call statements.
//!
//! Runs between the two symbol passes. Every call statement whose callee
//! resolves to a macro is replaced by a substituted copy of the macro body;
//! spliced statements are expanded in turn. Macro declarations are dropped
//! and the returned modules carry no scopes.

pub mod substitute;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::dsl::ast::{CallExpr, Expr, MacroDecl, Module, ModuleMap, Stmt, StmtKind};
use crate::symbols::{Decl, ScopeId, Symbol, SymbolTable};
use substitute::{substitute_statements, Bindings};

/// Nested expansions allowed before a chain is treated as runaway recursion.
pub const MAX_EXPANSION_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum MacroError {
    #[error(
        "{}:{line}:{col}: macro '{name}' expects {expected} argument(s), got {found}",
        .module.display()
    )]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        module: PathBuf,
        line: usize,
        col: usize,
    },

    #[error(
        "{}:{line}:{col}: expanding macro '{name}' exceeded {limit} nested expansions",
        .module.display()
    )]
    RecursionLimit {
        name: String,
        limit: usize,
        module: PathBuf,
        line: usize,
        col: usize,
    },

    #[error("{}:{line}:{col}: macro '{name}' {reason}", .module.display())]
    Malformed {
        name: String,
        reason: &'static str,
        module: PathBuf,
        line: usize,
        col: usize,
    },
}

/// Expand every module in the map.
///
/// `table` must be the first-pass table built over `modules`.
pub fn expand_modules(modules: &ModuleMap, table: &SymbolTable) -> Result<ModuleMap, MacroError> {
    let mut expanded = ModuleMap::with_capacity(modules.len());
    for (path, module) in modules {
        let expander = MacroExpander {
            modules,
            table,
            module: path,
        };
        let out = expander.expand(module)?;
        expanded.insert(path.clone(), out);
    }
    Ok(expanded)
}

/// Where names in the statement being expanded are looked up.
#[derive(Clone, Copy)]
struct Lookup {
    scope: ScopeId,
    /// Root scope of the macro a spliced statement came from.
    fallback: Option<ScopeId>,
}

enum Callee {
    Macro { decl: Rc<MacroDecl>, module: PathBuf },
    Other,
}

struct MacroExpander<'a> {
    modules: &'a ModuleMap,
    table: &'a SymbolTable,
    module: &'a Path,
}

impl MacroExpander<'_> {
    fn expand(&self, module: &Module) -> Result<Module, MacroError> {
        let scope = module
            .scope
            .or_else(|| self.table.root(&module.path))
            .unwrap_or_else(|| self.table.prelude());
        let lookup = Lookup {
            scope,
            fallback: None,
        };

        let mut statements = Vec::with_capacity(module.statements.len());
        for stmt in &module.statements {
            self.expand_stmt(stmt.clone(), lookup, 0, &mut statements)?;
        }

        let mut out = Module::new(module.path.clone(), statements);
        out.clear_scopes();
        debug!(module = %module.path.display(), "macros expanded");
        Ok(out)
    }

    fn expand_stmt(
        &self,
        mut stmt: Stmt,
        lookup: Lookup,
        depth: usize,
        out: &mut Vec<Stmt>,
    ) -> Result<(), MacroError> {
        let lookup = match stmt.scope {
            Some(scope) => Lookup {
                scope,
                fallback: None,
            },
            None => lookup,
        };

        match &stmt.kind {
            StmtKind::Macro(_) => return Ok(()),
            StmtKind::Call(call) => {
                if let Callee::Macro { decl, module } = self.find_callee(lookup, &call.callee) {
                    return self.splice(&stmt, call, &decl, &module, lookup, depth, out);
                }
            }
            _ => {}
        }

        self.reject_expression_macros(&stmt, lookup)?;

        for block in stmt.blocks_mut() {
            let statements = std::mem::take(&mut block.statements);
            for inner in statements {
                self.expand_stmt(inner, lookup, depth, &mut block.statements)?;
            }
        }
        out.push(stmt);
        Ok(())
    }

    fn splice(
        &self,
        stmt: &Stmt,
        call: &CallExpr,
        decl: &MacroDecl,
        module: &Path,
        lookup: Lookup,
        depth: usize,
        out: &mut Vec<Stmt>,
    ) -> Result<(), MacroError> {
        if depth >= MAX_EXPANSION_DEPTH {
            return Err(MacroError::RecursionLimit {
                name: decl.name.clone(),
                limit: MAX_EXPANSION_DEPTH,
                module: self.module.to_path_buf(),
                line: stmt.line,
                col: stmt.col,
            });
        }
        if call.args.len() != decl.params.len() {
            return Err(MacroError::ArityMismatch {
                name: call.callee.clone(),
                expected: decl.params.len(),
                found: call.args.len(),
                module: self.module.to_path_buf(),
                line: stmt.line,
                col: stmt.col,
            });
        }

        let bindings: Bindings = decl
            .params
            .iter()
            .cloned()
            .zip(call.args.iter().cloned())
            .collect();
        let body = substitute_statements(&decl.body.statements, &bindings);
        debug!(
            name = %decl.name,
            line = stmt.line,
            statements = body.len(),
            "expanding macro"
        );

        let inner = Lookup {
            scope: lookup.scope,
            fallback: self.table.root(module),
        };
        for mut spliced in body {
            // Report spliced code at the call site.
            spliced.line = stmt.line;
            spliced.col = stmt.col;
            self.expand_stmt(spliced, inner, depth + 1, out)?;
        }
        Ok(())
    }

    /// Resolve a callee at the call site, then in the macro's own module.
    fn find_callee(&self, lookup: Lookup, name: &str) -> Callee {
        match self.classify(lookup.scope, name) {
            Some(callee) => callee,
            None => lookup
                .fallback
                .and_then(|scope| self.classify(scope, name))
                .unwrap_or(Callee::Other),
        }
    }

    /// `None` when `name` is not visible from `scope` at all.
    fn classify(&self, scope: ScopeId, name: &str) -> Option<Callee> {
        let symbol = match self.table.lookup(scope, name, true) {
            Some(symbol) => symbol,
            None => return self.table.resolve(scope, name).map(as_callee),
        };
        match &symbol.decl {
            Decl::Import { name: original, .. } => Some(match self.table.follow(symbol) {
                Some(target) => as_callee(target),
                None => self.search_modules(original).unwrap_or(Callee::Other),
            }),
            _ => Some(as_callee(symbol)),
        }
    }

    /// Top-level macro named `name` in any module, in discovery order.
    fn search_modules(&self, name: &str) -> Option<Callee> {
        self.modules.iter().find_map(|(path, module)| {
            module.statements.iter().find_map(|stmt| match &stmt.kind {
                StmtKind::Macro(decl) if decl.name == name => Some(Callee::Macro {
                    decl: Rc::clone(decl),
                    module: path.clone(),
                }),
                _ => None,
            })
        })
    }

    /// Macros expand only as statements; a macro call nested in an
    /// expression has no value to stand for.
    fn reject_expression_macros(&self, stmt: &Stmt, lookup: Lookup) -> Result<(), MacroError> {
        let mut exprs: Vec<&Expr> = Vec::new();
        match &stmt.kind {
            StmtKind::If(s) => exprs.push(&s.condition),
            StmtKind::While(s) => exprs.push(&s.condition),
            StmtKind::For(s) => exprs.push(&s.iterable),
            StmtKind::Assign(a) => exprs.push(&a.value),
            StmtKind::Call(c) => exprs.extend(&c.args),
            StmtKind::Import(_) | StmtKind::Function(_) | StmtKind::Macro(_) | StmtKind::On(_) => {}
        }

        while let Some(expr) = exprs.pop() {
            match expr {
                Expr::Call(call) => {
                    if let Callee::Macro { .. } = self.find_callee(lookup, &call.callee) {
                        return Err(MacroError::Malformed {
                            name: call.callee.clone(),
                            reason: "cannot be used as an expression",
                            module: self.module.to_path_buf(),
                            line: stmt.line,
                            col: stmt.col,
                        });
                    }
                    exprs.extend(&call.args);
                }
                Expr::Binary { left, right, .. } => {
                    exprs.push(left);
                    exprs.push(right);
                }
                Expr::Ident(_) | Expr::Str(_) | Expr::Int(_) => {}
            }
        }
        Ok(())
    }
}

fn as_callee(symbol: &Symbol) -> Callee {
    match &symbol.decl {
        Decl::Macro(decl) => Callee::Macro {
            decl: Rc::clone(decl),
            module: symbol.module.clone(),
        },
        _ => Callee::Other,
    }
}
