//! oortc: compiler for the Oort scripting language, targeting Minecraft
//! datapacks.

pub mod build;
pub mod dsl;
pub mod emit;
pub mod error;
pub mod macros;
pub mod project;
pub mod symbols;

pub use build::{build, build_project, compile, BuildReport, CompiledPack};
pub use error::BuildError;
