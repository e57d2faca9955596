//! Symbol table builder: attaches scopes to a module tree and records declarations.

use std::path::PathBuf;
use std::rc::Rc;

use super::{Decl, ScopeId, Symbol, SymbolError, SymbolTable};
use crate::dsl::ast::{Block, ImportItems, Module, ModuleMap, Stmt, StmtKind};
use crate::project::import_target;

/// Build one table spanning every module in the map.
///
/// Scopes already attached to the modules are overwritten.
pub fn build_tables(modules: &mut ModuleMap) -> Result<SymbolTable, SymbolError> {
    let mut table = SymbolTable::new();
    for module in modules.values_mut() {
        build_module(&mut table, module)?;
    }
    Ok(table)
}

/// Add `module` to `table` and return its root scope.
pub fn build_module(table: &mut SymbolTable, module: &mut Module) -> Result<ScopeId, SymbolError> {
    let root = table.push_root(&module.path);
    module.scope = Some(root);

    let mut builder = SymbolTableBuilder {
        table,
        module: module.path.clone(),
        current: root,
    };
    for stmt in &mut module.statements {
        builder.visit_stmt(stmt)?;
    }
    Ok(root)
}

struct SymbolTableBuilder<'t> {
    table: &'t mut SymbolTable,
    module: PathBuf,
    current: ScopeId,
}

impl SymbolTableBuilder<'_> {
    fn symbol(&self, name: &str, decl: Decl, stmt: &Stmt) -> Symbol {
        Symbol {
            name: name.to_string(),
            decl,
            module: self.module.clone(),
            line: stmt.line,
            col: stmt.col,
        }
    }

    fn declare(&mut self, name: &str, decl: Decl, stmt: &Stmt) -> Result<(), SymbolError> {
        let symbol = self.symbol(name, decl, stmt);
        self.table.declare(self.current, symbol)
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) -> Result<(), SymbolError> {
        stmt.scope = Some(self.current);

        // Declarations that land in the enclosing scope come first.
        let mut inner: Vec<(String, Decl)> = Vec::new();
        match &stmt.kind {
            StmtKind::Import(import) => match &import.items {
                ImportItems::Wildcard => {
                    let source = import_target(&self.module, &import.source);
                    self.table.add_wildcard(self.current, source);
                }
                ImportItems::Named(items) => {
                    let source = import_target(&self.module, &import.source);
                    for item in items {
                        let decl = Decl::Import {
                            source: source.clone(),
                            name: item.name.clone(),
                        };
                        self.declare(item.local_name(), decl, stmt)?;
                    }
                }
            },
            StmtKind::Function(f) => {
                let decl = Decl::Function {
                    params: f.params.clone(),
                };
                self.declare(&f.name, decl, stmt)?;
                inner.extend(f.params.iter().map(|p| (p.clone(), Decl::Variable)));
            }
            StmtKind::Macro(m) => {
                self.declare(&m.name, Decl::Macro(Rc::clone(m)), stmt)?;
            }
            StmtKind::For(f) => inner.push((f.var.clone(), Decl::Variable)),
            StmtKind::Assign(assign) => {
                if self.table.lookup(self.current, &assign.target, false).is_none() {
                    self.declare(&assign.target, Decl::Variable, stmt)?;
                }
            }
            StmtKind::On(_) | StmtKind::If(_) | StmtKind::While(_) | StmtKind::Call(_) => {}
        }

        let (line, col) = (stmt.line, stmt.col);
        for block in stmt.blocks_mut() {
            self.visit_block(block, &inner, line, col)?;
        }
        Ok(())
    }

    /// Visit `block` in a fresh child scope seeded with `bindings`.
    fn visit_block(
        &mut self,
        block: &mut Block,
        bindings: &[(String, Decl)],
        line: usize,
        col: usize,
    ) -> Result<(), SymbolError> {
        let outer = self.current;
        self.current = self.table.push_scope(outer);
        block.scope = Some(self.current);

        for (name, decl) in bindings {
            let symbol = Symbol {
                name: name.clone(),
                decl: decl.clone(),
                module: self.module.clone(),
                line,
                col,
            };
            self.table.declare(self.current, symbol)?;
        }
        for stmt in &mut block.statements {
            self.visit_stmt(stmt)?;
        }

        self.current = outer;
        Ok(())
    }
}
