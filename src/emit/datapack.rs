//! In-memory datapack file set and its writer.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use super::EmitError;

/// `pack.mcmeta`
#[derive(Debug, Serialize)]
pub struct PackMeta {
    pub pack: PackSection,
}

#[derive(Debug, Serialize)]
pub struct PackSection {
    pub pack_format: u32,
    pub description: String,
}

/// A function tag such as `minecraft:load`.
#[derive(Debug, Serialize)]
pub struct FunctionTag {
    pub values: Vec<String>,
}

/// Every generated file, keyed by path relative to the datapack root,
/// in the order it was produced.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Datapack {
    files: IndexMap<PathBuf, String>,
}

impl Datapack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `data/<namespace>/functions/<function>.mcfunction`.
    pub fn add_function(&mut self, namespace: &str, function: &str, lines: &[String]) {
        let path = function_file(namespace, function);
        self.insert(path, lines.join("\n"));
    }

    /// Add a pretty-printed JSON file.
    pub fn add_json<T: Serialize>(&mut self, path: impl Into<PathBuf>, value: &T) -> Result<(), EmitError> {
        let text = serde_json::to_string_pretty(value)?;
        self.insert(path.into(), text);
        Ok(())
    }

    fn insert(&mut self, path: PathBuf, content: String) {
        if self.files.insert(path.clone(), content).is_some() {
            warn!(file = %path.display(), "generated file overwritten by a later definition");
        }
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }

    /// Content of a function file, by namespace and function path.
    pub fn function(&self, namespace: &str, function: &str) -> Option<&str> {
        self.get(function_file(namespace, function))
    }

    pub fn files(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files.iter().map(|(p, c)| (p.as_path(), c.as_str()))
    }

    pub fn function_count(&self) -> usize {
        self.files
            .keys()
            .filter(|p| p.extension().is_some_and(|e| e == "mcfunction"))
            .count()
    }

    /// Write every file beneath `root`.
    ///
    /// With `clean`, `root` is deleted first. That is destructive and
    /// happens before anything is written.
    pub fn write(&self, root: &Path, clean: bool) -> Result<(), EmitError> {
        if clean && root.exists() {
            debug!(root = %root.display(), "removing previous output");
            std::fs::remove_dir_all(root).map_err(|source| EmitError::Io {
                path: root.to_path_buf(),
                source,
            })?;
        }

        for (relative, content) in &self.files {
            let path = root.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| EmitError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            std::fs::write(&path, content).map_err(|source| EmitError::Io {
                path: path.clone(),
                source,
            })?;
            debug!(file = %relative.display(), "wrote");
        }
        Ok(())
    }
}

fn function_file(namespace: &str, function: &str) -> PathBuf {
    PathBuf::from("data")
        .join(namespace)
        .join("functions")
        .join(format!("{function}.mcfunction"))
}
