//! Project-level plumbing: the descriptor file and module discovery.

pub mod config;
pub mod resolver;

use std::path::{Component, Path, PathBuf};

pub use config::{ConfigError, ProjectConfig};
pub use resolver::{resolve_modules, ResolveError};

/// Fold `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

/// Identity of a module file: its canonical path when it exists, so a file
/// reached through a symlink is still one module, otherwise the lexically
/// normalized path.
pub fn module_path(path: &Path) -> PathBuf {
    let path = normalize_path(path);
    std::fs::canonicalize(&path).unwrap_or(path)
}

/// Absolute path of the module an import in `module` refers to.
///
/// Import sources are relative to the importing module's directory.
pub fn import_target(module: &Path, source: &str) -> PathBuf {
    let dir = module.parent().unwrap_or_else(|| Path::new(""));
    module_path(&dir.join(source))
}
