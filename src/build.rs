//! The build pipeline: configuration to datapack on disk.
//!
//! 1. load configuration (done by the caller)
//! 2. resolve and parse modules
//! 3. first symbol pass
//! 4. macro expansion
//! 5. second symbol pass over the expanded modules
//! 6. emission
//!
//! Each step runs to completion before the next; the first error aborts.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::dsl::ModuleMap;
use crate::emit::{Datapack, Diagnostic, Emitter};
use crate::error::BuildError;
use crate::macros::expand_modules;
use crate::project::{resolve_modules, ProjectConfig};
use crate::symbols::build_tables;

/// The in-memory result of steps 2–6.
#[derive(Debug)]
pub struct CompiledPack {
    /// Expanded modules, with the second-pass scopes attached.
    pub modules: ModuleMap,
    pub datapack: Datapack,
    pub diagnostics: Vec<Diagnostic>,
}

/// Summary of a build written to disk.
#[derive(Debug)]
pub struct BuildReport {
    pub datapack_root: PathBuf,
    pub modules: usize,
    pub functions: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compile the project without touching the output directory.
pub fn compile(config: &ProjectConfig) -> Result<CompiledPack, BuildError> {
    info!("step 2/6: resolving modules");
    let mut modules = resolve_modules(&config.entrypoints.load, &config.entrypoints.tick)?;
    info!(modules = modules.len(), "discovered modules");

    info!("step 3/6: building symbol tables");
    let table = build_tables(&mut modules)?;

    info!("step 4/6: expanding macros");
    let mut expanded = expand_modules(&modules, &table)?;

    info!("step 5/6: rebuilding symbol tables");
    let table = build_tables(&mut expanded)?;

    info!("step 6/6: emitting datapack");
    let output = Emitter::new(config, &table).emit(&expanded)?;

    Ok(CompiledPack {
        modules: expanded,
        datapack: output.datapack,
        diagnostics: output.diagnostics,
    })
}

/// Compile the project and write the datapack.
pub fn build(config: &ProjectConfig) -> Result<BuildReport, BuildError> {
    let compiled = compile(config)?;
    let root = config.datapack_root();
    compiled.datapack.write(&root, config.build.clean)?;

    let functions = compiled.datapack.function_count();
    info!(root = %root.display(), functions, "datapack written");
    for diagnostic in &compiled.diagnostics {
        warn!("{diagnostic}");
    }

    Ok(BuildReport {
        datapack_root: root,
        modules: compiled.modules.len(),
        functions,
        diagnostics: compiled.diagnostics,
    })
}

/// Load `project_dir`'s configuration, apply an output override, and build.
pub fn build_project(project_dir: &Path, out: Option<&Path>) -> Result<BuildReport, BuildError> {
    info!(project = %project_dir.display(), "step 1/6: loading configuration");
    let mut config = ProjectConfig::from_project_dir(project_dir)?;
    if let Some(out) = out {
        config = config.with_output(out);
    }
    info!(
        name = %config.package.name,
        namespace = %config.package.namespace,
        output = %config.datapack_root().display(),
        "configuration loaded"
    );
    build(&config)
}
