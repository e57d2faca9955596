//! Module discovery: the transitive import closure of the two entrypoints.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::{import_target, module_path};
use crate::dsl::{CompileError, Compiler, Event, ModuleMap};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("module not found: {}{}", .path.display(), importer_suffix(.importer))]
    NotFound {
        path: PathBuf,
        importer: Option<PathBuf>,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("entrypoint {} must contain an 'on {}' block", .path.display(), .event.as_str())]
    MissingEvent { path: PathBuf, event: Event },

    #[error(transparent)]
    Syntax(#[from] CompileError),
}

fn importer_suffix(importer: &Option<PathBuf>) -> String {
    match importer {
        Some(path) => format!(" (imported from {})", path.display()),
        None => String::new(),
    }
}

/// Parse every module reachable from `load` and `tick`.
///
/// Modules are keyed by [`module_path`] and appear in the order
/// they were first reached. Import cycles are fine: a path is parsed once.
pub fn resolve_modules(load: &Path, tick: &Path) -> Result<ModuleMap, ResolveError> {
    let load = module_path(load);
    let tick = module_path(tick);
    let mut modules = ModuleMap::new();
    let mut processed: HashSet<PathBuf> = HashSet::new();
    let mut worklist: VecDeque<(PathBuf, Option<PathBuf>)> = VecDeque::new();
    worklist.push_back((load.clone(), None));
    worklist.push_back((tick.clone(), None));

    while let Some((path, importer)) = worklist.pop_front() {
        if !processed.insert(path.clone()) {
            continue;
        }
        if !path.is_file() {
            return Err(ResolveError::NotFound { path, importer });
        }

        let source = std::fs::read_to_string(&path).map_err(|source| ResolveError::Io {
            path: path.clone(),
            source,
        })?;
        let module = Compiler::parse(&path, &source)?;
        debug!(module = %path.display(), statements = module.statements.len(), "parsed");

        for import in module.imports() {
            let target = import_target(&path, &import.source);
            if !processed.contains(&target) {
                worklist.push_back((target, Some(path.clone())));
            }
        }
        modules.insert(path, module);
    }

    require_event(&modules, &load, Event::Load)?;
    require_event(&modules, &tick, Event::Tick)?;
    Ok(modules)
}

fn require_event(modules: &ModuleMap, path: &Path, event: Event) -> Result<(), ResolveError> {
    match modules.get(path) {
        Some(module) if module.has_event(event) => Ok(()),
        _ => Err(ResolveError::MissingEvent {
            path: path.to_path_buf(),
            event,
        }),
    }
}
