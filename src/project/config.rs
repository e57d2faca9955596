//! Project descriptor: `properties.json` (or `properties.yaml`) in the project root.

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::normalize_path;

pub const JSON_DESCRIPTOR: &str = "properties.json";
pub const YAML_DESCRIPTOR: &str = "properties.yaml";

/// Minecraft release → datapack `pack_format`.
const PACK_FORMATS: &[(&str, u32)] = &[
    ("1.21", 48),
    ("1.20.6", 41),
    ("1.20.5", 41),
    ("1.20.4", 26),
    ("1.20.3", 26),
    ("1.20.2", 18),
    ("1.20.1", 15),
    ("1.20", 15),
    ("1.19.4", 13),
    ("1.19.3", 12),
    ("1.19.2", 9),
    ("1.19.1", 9),
    ("1.19", 9),
    ("1.18.2", 8),
    ("1.18.1", 8),
    ("1.18", 8),
];

/// Look up the pack format for a Minecraft version.
pub fn pack_format_for(version: &str) -> Option<u32> {
    PACK_FORMATS
        .iter()
        .find(|(v, _)| *v == version)
        .map(|(_, format)| *format)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("project directory {}: {source}", .path.display())]
    ProjectDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no properties.json or properties.yaml in {}", .dir.display())]
    NotFound { dir: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid properties.json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid properties.yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("unknown Minecraft version '{version}'; set minecraft.pack_format explicitly")]
    UnknownVersion { version: String },

    #[error("invalid build.datapack_name '{name}': must be a single directory name")]
    InvalidDatapackName { name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageConfig {
    pub name: String,
    pub namespace: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinecraftConfig {
    pub version: String,
    pub pack_format: u32,
}

/// Absolute paths of the two required entrypoint modules.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrypointsConfig {
    pub load: PathBuf,
    pub tick: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Absolute output directory; the datapack is written beneath it.
    pub output: PathBuf,
    pub datapack_name: String,
    /// Delete the datapack directory before writing.
    pub clean: bool,
}

/// A validated project descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    pub project_dir: PathBuf,
    pub package: PackageConfig,
    pub minecraft: MinecraftConfig,
    pub entrypoints: EntrypointsConfig,
    pub build: BuildConfig,
}

// On-disk shape. Everything optional so that a missing field is reported
// by name rather than as a serde error.

#[derive(Debug, Default, Deserialize)]
struct RawProperties {
    package: Option<RawPackage>,
    minecraft: Option<RawMinecraft>,
    entrypoints: Option<RawEntrypoints>,
    #[serde(default)]
    build: RawBuild,
}

#[derive(Debug, Default, Deserialize)]
struct RawPackage {
    name: Option<String>,
    namespace: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMinecraft {
    version: Option<String>,
    pack_format: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEntrypoints {
    load: Option<String>,
    tick: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawBuild {
    output: Option<String>,
    datapack_name: Option<String>,
    clean: Option<bool>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingField { field })
}

impl ProjectConfig {
    /// Load the descriptor from `dir`, preferring JSON over YAML.
    pub fn from_project_dir(dir: &Path) -> Result<Self, ConfigError> {
        let project_dir = dir.canonicalize().map_err(|source| ConfigError::ProjectDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let json = project_dir.join(JSON_DESCRIPTOR);
        if json.is_file() {
            let text = read(&json)?;
            return Self::from_json(&project_dir, &text);
        }
        let yaml = project_dir.join(YAML_DESCRIPTOR);
        if yaml.is_file() {
            let text = read(&yaml)?;
            return Self::from_yaml(&project_dir, &text);
        }
        Err(ConfigError::NotFound { dir: project_dir })
    }

    /// Parse a JSON descriptor for a project rooted at `project_dir` (absolute).
    pub fn from_json(project_dir: &Path, text: &str) -> Result<Self, ConfigError> {
        let raw: RawProperties = serde_json::from_str(text)?;
        Self::from_raw(project_dir, raw)
    }

    pub fn from_yaml(project_dir: &Path, text: &str) -> Result<Self, ConfigError> {
        let raw: RawProperties = serde_yaml::from_str(text)?;
        Self::from_raw(project_dir, raw)
    }

    fn from_raw(project_dir: &Path, raw: RawProperties) -> Result<Self, ConfigError> {
        let package = raw.package.unwrap_or_default();
        let name = required(package.name, "package.name")?;
        let package = PackageConfig {
            namespace: required(package.namespace, "package.namespace")?,
            description: package.description,
            name,
        };

        let minecraft = raw.minecraft.unwrap_or_default();
        let version = required(minecraft.version, "minecraft.version")?;
        let pack_format = match minecraft.pack_format {
            Some(format) => format,
            None => pack_format_for(&version)
                .ok_or_else(|| ConfigError::UnknownVersion { version: version.clone() })?,
        };
        let minecraft = MinecraftConfig {
            version,
            pack_format,
        };

        let entrypoints = raw.entrypoints.unwrap_or_default();
        let entrypoints = EntrypointsConfig {
            load: normalize_path(&project_dir.join(required(entrypoints.load, "entrypoints.load")?)),
            tick: normalize_path(&project_dir.join(required(entrypoints.tick, "entrypoints.tick")?)),
        };

        let build = BuildConfig {
            output: normalize_path(&project_dir.join(raw.build.output.as_deref().unwrap_or("build"))),
            datapack_name: datapack_name(
                raw.build
                    .datapack_name
                    .unwrap_or_else(|| format!("{}-datapack", package.name)),
            )?,
            clean: raw.build.clean.unwrap_or(true),
        };

        Ok(Self {
            project_dir: project_dir.to_path_buf(),
            package,
            minecraft,
            entrypoints,
            build,
        })
    }

    /// Replace the output directory, as `--out` does.
    ///
    /// A relative `dir` is taken relative to the working directory.
    pub fn with_output(mut self, dir: &Path) -> Self {
        let dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(dir))
                .unwrap_or_else(|_| dir.to_path_buf())
        };
        self.build.output = normalize_path(&dir);
        self
    }

    /// `<output>/<datapack_name>`
    pub fn datapack_root(&self) -> PathBuf {
        self.build.output.join(&self.build.datapack_name)
    }

    pub fn description(&self) -> String {
        self.package
            .description
            .clone()
            .unwrap_or_else(|| format!("A datapack generated for {}", self.package.name))
    }
}

/// The datapack directory is deleted when `build.clean` is set, so its name
/// must stay a single plain component under the output directory.
fn datapack_name(name: String) -> Result<String, ConfigError> {
    let mut components = Path::new(&name).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if single && !name.contains(['/', '\\']) {
        Ok(name)
    } else {
        Err(ConfigError::InvalidDatapackName { name })
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
