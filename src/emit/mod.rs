//! Code generation: expanded, re-resolved modules → datapack files.
//!
//! The target has no branches or loops, only "run function F" and
//! "schedule function F after a delay". Control flow is therefore lowered
//! into synthetic functions:
//!
//! - `if c { .. }` → `<base>/if_body_<n>` plus one `execute if ...` line.
//! - `for k v in sel { .. }` → `<base>/for_loop_<v>_<n>`, run once per
//!   entity with `execute as <sel> at @s`.
//! - `while c { .. }` → a check/body pair. The body re-schedules the check
//!   one tick later; the call site runs the check once.
//!
//! `<n>` comes from a counter shared by the whole build, so generated names
//! never collide.

pub mod datapack;
pub mod diagnostic;
pub mod lower;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::dsl::ast::{Block, CallExpr, Event, Expr, ModuleMap, Stmt, StmtKind};
use crate::project::ProjectConfig;
use crate::symbols::{Decl, ScopeId, SymbolTable};

pub use datapack::{Datapack, FunctionTag, PackMeta, PackSection};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use lower::VARS_OBJECTIVE;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("module {} is outside the project directory {}", .path.display(), .project_dir.display())]
    OutsideProject { path: PathBuf, project_dir: PathBuf },

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// What emission produced: the file set plus the soft failures.
#[derive(Debug)]
pub struct EmitOutput {
    pub datapack: Datapack,
    pub diagnostics: Vec<Diagnostic>,
}

/// Function path of a module: its project-relative path without the
/// extension, `/`-separated.
pub fn function_base(project_dir: &Path, module: &Path) -> Result<String, EmitError> {
    let relative = module
        .strip_prefix(project_dir)
        .map_err(|_| EmitError::OutsideProject {
            path: module.to_path_buf(),
            project_dir: project_dir.to_path_buf(),
        })?;
    let parts: Vec<String> = relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

pub struct Emitter<'a> {
    config: &'a ProjectConfig,
    table: &'a SymbolTable,
    datapack: Datapack,
    diagnostics: Vec<Diagnostic>,
    counter: usize,
    /// Lines of the function being generated.
    lines: Vec<String>,
    module: PathBuf,
    base: String,
    /// Path of the function being generated, `None` at module top level.
    function: Option<String>,
}

impl<'a> Emitter<'a> {
    /// `table` must be built over the modules later passed to [`Emitter::emit`].
    pub fn new(config: &'a ProjectConfig, table: &'a SymbolTable) -> Self {
        Self {
            config,
            table,
            datapack: Datapack::new(),
            diagnostics: Vec::new(),
            counter: 0,
            lines: Vec::new(),
            module: PathBuf::new(),
            base: String::new(),
            function: None,
        }
    }

    pub fn emit(mut self, modules: &ModuleMap) -> Result<EmitOutput, EmitError> {
        self.emit_descriptors()?;

        for (path, module) in modules {
            self.module = path.clone();
            self.base = function_base(&self.config.project_dir, path)?;
            debug!(module = %path.display(), base = %self.base, "emitting module");

            for stmt in &module.statements {
                match &stmt.kind {
                    StmtKind::Function(_) | StmtKind::On(_) => self.emit_stmt(stmt)?,
                    StmtKind::Import(_) | StmtKind::Macro(_) => {}
                    StmtKind::If(_)
                    | StmtKind::For(_)
                    | StmtKind::While(_)
                    | StmtKind::Assign(_)
                    | StmtKind::Call(_) => self.diagnose(
                        DiagnosticKind::Unsupported,
                        stmt,
                        "statement outside any function or event block was skipped".to_string(),
                    ),
                }
            }
        }

        Ok(EmitOutput {
            datapack: self.datapack,
            diagnostics: self.diagnostics,
        })
    }

    fn emit_descriptors(&mut self) -> Result<(), EmitError> {
        let meta = PackMeta {
            pack: PackSection {
                pack_format: self.config.minecraft.pack_format,
                description: self.config.description(),
            },
        };
        self.datapack.add_json("pack.mcmeta", &meta)?;

        let ns = &self.config.package.namespace;
        let load = function_base(&self.config.project_dir, &self.config.entrypoints.load)?;
        let tick = function_base(&self.config.project_dir, &self.config.entrypoints.tick)?;
        let tags = Path::new("data/minecraft/tags/functions");
        self.datapack.add_json(
            tags.join("load.json"),
            &FunctionTag {
                values: vec![format!("{ns}:{load}/on_load")],
            },
        )?;
        self.datapack.add_json(
            tags.join("tick.json"),
            &FunctionTag {
                values: vec![format!("{ns}:{tick}/on_tick")],
            },
        )?;
        Ok(())
    }

    fn qualified(&self, function: &str) -> String {
        format!("{}:{function}", self.config.package.namespace)
    }

    fn next_id(&mut self) -> usize {
        self.counter += 1;
        self.counter
    }

    fn diagnose(&mut self, kind: DiagnosticKind, stmt: &Stmt, message: String) {
        self.diagnostics.push(Diagnostic {
            kind,
            module: self.module.clone(),
            function: self.function.clone(),
            line: stmt.line,
            message,
        });
    }

    /// Record a soft failure and leave a comment where the command would be.
    fn emit_error(&mut self, kind: DiagnosticKind, stmt: &Stmt, message: String) {
        self.lines.push(format!("# ERROR: {message}"));
        self.diagnose(kind, stmt, message);
    }

    /// Generate the function at `path` with `fill`, then return to the
    /// enclosing function's buffer.
    fn generate<F>(&mut self, path: &str, fill: F) -> Result<(), EmitError>
    where
        F: FnOnce(&mut Self) -> Result<(), EmitError>,
    {
        let outer_lines = std::mem::take(&mut self.lines);
        let outer_function = self.function.replace(path.to_string());

        let result = fill(self);

        let lines = std::mem::replace(&mut self.lines, outer_lines);
        self.function = outer_function;
        result?;

        debug!(function = %path, lines = lines.len(), "generated function");
        self.datapack
            .add_function(&self.config.package.namespace, path, &lines);
        Ok(())
    }

    fn emit_block(&mut self, block: &Block) -> Result<(), EmitError> {
        for stmt in &block.statements {
            self.emit_stmt(stmt)?;
        }
        Ok(())
    }

    fn emit_stmt(&mut self, stmt: &Stmt) -> Result<(), EmitError> {
        match &stmt.kind {
            StmtKind::Import(_) | StmtKind::Macro(_) => Ok(()),
            StmtKind::Function(f) => {
                let path = format!("{}/{}", self.base, f.name);
                self.generate(&path, |e| e.emit_block(&f.body))
            }
            StmtKind::On(on) => {
                let path = format!("{}/on_{}", self.base, on.event.as_str());
                self.generate(&path, |e| {
                    if on.event == Event::Load {
                        e.lines
                            .push(format!("scoreboard objectives add {VARS_OBJECTIVE} dummy"));
                    }
                    e.emit_block(&on.body)
                })
            }
            StmtKind::If(if_stmt) => {
                let id = self.next_id();
                let path = format!("{}/if_body_{id}", self.base);
                self.generate(&path, |e| e.emit_block(&if_stmt.then_block))?;
                let run = self.qualified(&path);
                self.emit_condition(stmt, &if_stmt.condition, &run);

                if if_stmt.else_block.is_some() {
                    self.emit_error(
                        DiagnosticKind::Unimplemented,
                        stmt,
                        "else branch is not compiled".to_string(),
                    );
                }
                Ok(())
            }
            StmtKind::For(for_stmt) => {
                let id = self.next_id();
                let path = format!("{}/for_loop_{}_{id}", self.base, for_stmt.var);
                self.generate(&path, |e| e.emit_block(&for_stmt.body))?;
                let run = self.qualified(&path);
                let iterable = lower::format_expr(&for_stmt.iterable);
                self.lines
                    .push(format!("execute as {iterable} at @s run function {run}"));
                Ok(())
            }
            StmtKind::While(while_stmt) => {
                let id = self.next_id();
                let check = format!("{}/while_{id}_check", self.base);
                let body = format!("{}/while_{id}_body", self.base);
                let check_fq = self.qualified(&check);
                let body_fq = self.qualified(&body);

                self.generate(&body, |e| {
                    e.emit_block(&while_stmt.body)?;
                    e.lines.push(format!("schedule function {check_fq} 1t"));
                    Ok(())
                })?;
                self.generate(&check, |e| {
                    e.emit_condition(stmt, &while_stmt.condition, &body_fq);
                    Ok(())
                })?;
                self.lines.push(format!("function {check_fq}"));
                Ok(())
            }
            StmtKind::Assign(assign) => {
                match lower::assignment(&assign.target, &assign.value) {
                    Ok(lines) => self.lines.extend(lines),
                    Err(message) => self.emit_error(DiagnosticKind::Unsupported, stmt, message),
                }
                Ok(())
            }
            StmtKind::Call(call) => self.emit_call(stmt, call),
        }
    }

    fn emit_condition(&mut self, stmt: &Stmt, condition: &Expr, run: &str) {
        match lower::condition(condition, run) {
            Ok(line) => self.lines.push(line),
            Err(message) => self.emit_error(DiagnosticKind::Unsupported, stmt, message),
        }
    }

    fn scope_of(&self, stmt: &Stmt) -> Option<ScopeId> {
        stmt.scope.or_else(|| self.table.root(&self.module))
    }

    fn emit_call(&mut self, stmt: &Stmt, call: &CallExpr) -> Result<(), EmitError> {
        let table = self.table;
        let symbol = self
            .scope_of(stmt)
            .and_then(|scope| table.resolve(scope, &call.callee));

        match symbol.map(|s| (&s.decl, s)) {
            Some((Decl::Builtin, _)) => self.lines.push(lower::command(call)),
            Some((Decl::Function { .. }, target)) => {
                let base = function_base(&self.config.project_dir, &target.module)?;
                let line = format!("function {}", self.qualified(&format!("{base}/{}", target.name)));
                if !call.args.is_empty() {
                    let message = format!(
                        "arguments to '{}' were dropped: functions take no arguments",
                        call.callee
                    );
                    self.diagnose(DiagnosticKind::Unsupported, stmt, message);
                }
                self.lines.push(line);
            }
            _ => {
                self.lines.push(format!(
                    "# ERROR: Unresolved function call to '{}'",
                    call.callee
                ));
                self.diagnose(
                    DiagnosticKind::Unresolved,
                    stmt,
                    format!("call to unknown function '{}'", call.callee),
                );
            }
        }
        Ok(())
    }
}
