//! Lexical scopes and symbols.
//!
//! Scopes live in an arena owned by a [`SymbolTable`] and refer to each
//! other by [`ScopeId`]. A table is built from scratch for each pass over
//! the module set and thrown away afterwards; nothing is patched in place.
//!
//! Layout of one table:
//!
//! ```text
//! prelude (builtins)
//!   ├── root scope of module A ── function/event/branch/loop scopes ...
//!   └── root scope of module B ── ...
//! ```

pub mod builder;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::dsl::ast::MacroDecl;

pub use builder::{build_module, build_tables};

/// Command names the target accepts verbatim.
pub const BUILTIN_COMMANDS: &[&str] = &[
    "say",
    "give",
    "kill",
    "scoreboard",
    "execute",
    "schedule",
    "function",
    "tag",
    "tellraw",
    "title",
    "effect",
    "tp",
    "summon",
    "setblock",
    "fill",
    "clear",
    "particle",
    "playsound",
];

/// Module roots and names already searched by one lookup.
type Visited = HashSet<(ScopeId, String)>;

/// Handle of a scope inside its [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("{}:{line}:{col}: name '{name}' is already defined in this scope", .module.display())]
    Duplicate {
        name: String,
        module: PathBuf,
        line: usize,
        col: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Macro,
    Import,
    Builtin,
}

/// What a symbol was declared as.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Variable,
    Function { params: Vec<String> },
    Macro(Rc<MacroDecl>),
    /// `name` is the exported name in `source`, before any alias.
    Import { source: PathBuf, name: String },
    Builtin,
}

/// A named declaration. Never mutated once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub decl: Decl,
    /// Module that declared the symbol; the prelude uses an empty path.
    pub module: PathBuf,
    pub line: usize,
    pub col: usize,
}

impl Symbol {
    pub fn kind(&self) -> SymbolKind {
        match self.decl {
            Decl::Variable => SymbolKind::Variable,
            Decl::Function { .. } => SymbolKind::Function,
            Decl::Macro(_) => SymbolKind::Macro,
            Decl::Import { .. } => SymbolKind::Import,
            Decl::Builtin => SymbolKind::Builtin,
        }
    }
}

#[derive(Debug, Default)]
pub struct Scope {
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    symbols: IndexMap<String, Symbol>,
    /// Sources of `import *` statements; only used on module roots.
    wildcards: Vec<PathBuf>,
}

impl Scope {
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }
}

/// Every scope of one pass, plus the module-path → root-scope index.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    prelude: ScopeId,
    roots: IndexMap<PathBuf, ScopeId>,
}

impl SymbolTable {
    /// A table holding only the builtin prelude.
    pub fn new() -> Self {
        let mut table = Self {
            scopes: vec![Scope::default()],
            prelude: ScopeId(0),
            roots: IndexMap::new(),
        };
        for name in BUILTIN_COMMANDS {
            table.scopes[0].symbols.insert(
                (*name).to_string(),
                Symbol {
                    name: (*name).to_string(),
                    decl: Decl::Builtin,
                    module: PathBuf::new(),
                    line: 0,
                    col: 0,
                },
            );
        }
        table
    }

    pub fn prelude(&self) -> ScopeId {
        self.prelude
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    /// Root scope of the module at `path`.
    pub fn root(&self, path: &Path) -> Option<ScopeId> {
        self.roots.get(path).copied()
    }

    /// Allocate a new scope nested in `parent`.
    pub fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        self.scopes[parent.index()].children.push(id);
        id
    }

    /// Allocate the root scope for a module.
    pub fn push_root(&mut self, path: &Path) -> ScopeId {
        let id = self.push_scope(self.prelude);
        self.roots.insert(path.to_path_buf(), id);
        id
    }

    /// Add `symbol` to `scope`. A name may appear once per scope.
    pub fn declare(&mut self, scope: ScopeId, symbol: Symbol) -> Result<(), SymbolError> {
        let symbols = &mut self.scopes[scope.index()].symbols;
        if symbols.contains_key(&symbol.name) {
            return Err(SymbolError::Duplicate {
                name: symbol.name,
                module: symbol.module,
                line: symbol.line,
                col: symbol.col,
            });
        }
        symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    pub fn add_wildcard(&mut self, scope: ScopeId, source: PathBuf) {
        self.scopes[scope.index()].wildcards.push(source);
    }

    /// Plain lookup: `scope` only, or `scope` and its ancestors.
    pub fn lookup(&self, scope: ScopeId, name: &str, recursive: bool) -> Option<&Symbol> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scope(id);
            if let Some(symbol) = scope.symbols.get(name) {
                return Some(symbol);
            }
            if !recursive {
                return None;
            }
            current = scope.parent;
        }
        None
    }

    /// Lookup that sees through imports.
    ///
    /// Named imports are followed to the declaration in their source
    /// module. A name not found lexically is searched for in the modules
    /// the enclosing module wildcard-imports.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        let mut seen = HashSet::new();
        match self.lookup(scope, name, true) {
            Some(symbol) => self.follow_from(symbol, &mut seen),
            None => self.resolve_wildcards(self.module_root(scope)?, name, &mut seen),
        }
    }

    /// The declaration an import symbol refers to; other symbols are returned as-is.
    pub fn follow<'s>(&'s self, symbol: &'s Symbol) -> Option<&'s Symbol> {
        self.follow_from(symbol, &mut HashSet::new())
    }

    /// Root scope of the module enclosing `scope`.
    pub fn module_root(&self, scope: ScopeId) -> Option<ScopeId> {
        let mut current = scope;
        loop {
            let parent = self.scope(current).parent?;
            if parent == self.prelude {
                return Some(current);
            }
            current = parent;
        }
    }

    // Each (module root, name) pair is searched at most once per query, so
    // import cycles end and the walk stays linear in the import edges.

    fn follow_from<'s>(&'s self, symbol: &'s Symbol, seen: &mut Visited) -> Option<&'s Symbol> {
        match &symbol.decl {
            Decl::Import { source, name } => self.resolve_exported(self.root(source)?, name, seen),
            _ => Some(symbol),
        }
    }

    fn resolve_exported(&self, root: ScopeId, name: &str, seen: &mut Visited) -> Option<&Symbol> {
        if !seen.insert((root, name.to_string())) {
            return None;
        }
        match self.lookup(root, name, false) {
            Some(symbol) => self.follow_from(symbol, seen),
            None => self.resolve_wildcards(root, name, seen),
        }
    }

    fn resolve_wildcards(&self, root: ScopeId, name: &str, seen: &mut Visited) -> Option<&Symbol> {
        self.scope(root)
            .wildcards
            .iter()
            .filter_map(|source| self.root(source))
            .find_map(|source_root| self.resolve_exported(source_root, name, seen))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
