//! Abstract Syntax Tree for the Oort language.
//!
//! A closed set of node types: every pass matches on [`StmtKind`] and
//! [`Expr`] exhaustively. Scope-carrying nodes ([`Module`], [`Block`],
//! [`Stmt`]) hold an optional [`ScopeId`] that the symbol table builder
//! fills in; it is `None` straight out of the parser and again after
//! macro expansion.

use std::path::PathBuf;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::symbols::ScopeId;

/// Absolute module path → parsed module, in discovery order.
pub type ModuleMap = IndexMap<PathBuf, Module>;

/// One parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub path: PathBuf,
    pub statements: Vec<Stmt>,
    pub scope: Option<ScopeId>,
}

/// A `{ ... }` block. All of its statements share the block's scope.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub scope: Option<ScopeId>,
}

/// A statement with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
    pub col: usize,
    pub scope: Option<ScopeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Import(ImportStmt),
    Function(FunctionDecl),
    /// Shared so that symbols can point at the declaration without copying the body.
    Macro(Rc<MacroDecl>),
    On(OnBlock),
    If(IfStmt),
    For(ForStmt),
    While(WhileStmt),
    Assign(Assignment),
    Call(CallExpr),
}

/// `from "path" import a, b as c` or `from "path" import *`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportStmt {
    pub source: String,
    pub items: ImportItems,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportItems {
    Wildcard,
    Named(Vec<ImportItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportItem {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportItem {
    /// The name this item is visible under in the importing module.
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacroDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Load,
    Tick,
}

impl Event {
    pub fn as_str(self) -> &'static str {
        match self {
            Event::Load => "load",
            Event::Tick => "tick",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnBlock {
    pub event: Event,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Block,
    pub else_block: Option<Block>,
}

/// `for <kind> <var> in <iterable> { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub kind: String,
    pub var: String,
    pub iterable: Expr,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    Str(String),
    Int(i64),
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Call(CallExpr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }

    /// Binding power for precedence climbing; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => 2,
            BinOp::Add | BinOp::Sub => 3,
            BinOp::Mul | BinOp::Div => 4,
        }
    }
}

impl Module {
    pub fn new(path: PathBuf, statements: Vec<Stmt>) -> Self {
        Self {
            path,
            statements,
            scope: None,
        }
    }

    /// Whether the module declares `on <event>` at top level.
    pub fn has_event(&self, event: Event) -> bool {
        self.statements
            .iter()
            .any(|s| matches!(&s.kind, StmtKind::On(on) if on.event == event))
    }

    /// The module's own import statements, top level only.
    pub fn imports(&self) -> impl Iterator<Item = &ImportStmt> {
        self.statements.iter().filter_map(|s| match &s.kind {
            StmtKind::Import(import) => Some(import),
            _ => None,
        })
    }

    /// Drop every scope attachment in the tree.
    pub fn clear_scopes(&mut self) {
        self.scope = None;
        for stmt in &mut self.statements {
            stmt.clear_scopes();
        }
    }
}

impl Block {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self {
            statements,
            scope: None,
        }
    }

    fn clear_scopes(&mut self) {
        self.scope = None;
        for stmt in &mut self.statements {
            stmt.clear_scopes();
        }
    }
}

impl Stmt {
    pub fn new(kind: StmtKind, line: usize, col: usize) -> Self {
        Self {
            kind,
            line,
            col,
            scope: None,
        }
    }

    /// The blocks directly nested in this statement, in source order.
    ///
    /// Macro bodies are not included: they are templates, not code.
    pub fn blocks_mut(&mut self) -> Vec<&mut Block> {
        match &mut self.kind {
            StmtKind::Function(f) => vec![&mut f.body],
            StmtKind::On(on) => vec![&mut on.body],
            StmtKind::If(stmt) => {
                let mut blocks = vec![&mut stmt.then_block];
                if let Some(else_block) = &mut stmt.else_block {
                    blocks.push(else_block);
                }
                blocks
            }
            StmtKind::For(stmt) => vec![&mut stmt.body],
            StmtKind::While(stmt) => vec![&mut stmt.body],
            StmtKind::Import(_) | StmtKind::Macro(_) | StmtKind::Assign(_) | StmtKind::Call(_) => {
                Vec::new()
            }
        }
    }

    fn clear_scopes(&mut self) {
        self.scope = None;
        for block in self.blocks_mut() {
            block.clear_scopes();
        }
    }
}
