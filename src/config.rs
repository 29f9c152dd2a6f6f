use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::project::SourceFilter;
use crate::project::templates::{DEFAULT_CXX_STANDARD, ProjectTemplate};

const CONFIG_CANDIDATES: &[(&str, ConfigFormat)] = &[
    ("cmkit.yml", ConfigFormat::Yaml),
    ("cmkit.yaml", ConfigFormat::Yaml),
    ("cmkit.toml", ConfigFormat::Toml),
];

const SUPPORTED_CXX_STANDARDS: &[u16] = &[98, 11, 14, 17, 20, 23, 26];

const FALLBACK_PROJECT_NAME: &str = "MyProject";

#[derive(Debug, Clone, Copy)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    fn label(self) -> &'static str {
        match self {
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
        }
    }

    pub fn parse(self, content: &str) -> Result<ProjectConfig> {
        match self {
            // an empty YAML document deserializes as unit, not as an empty map
            Self::Yaml if content.trim().is_empty() => Ok(ProjectConfig::default()),
            Self::Yaml => Ok(serde_yaml::from_str(content)?),
            Self::Toml => Ok(toml::from_str(content)?),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedProjectConfig {
    pub path: PathBuf,
    pub data: ProjectConfig,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cxx_standard: Option<u16>,
    #[serde(default)]
    pub source_extensions: Option<Vec<String>>,
}

/// Values given on the command line; they win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub name: Option<String>,
    pub cxx_standard: Option<u16>,
}

/// Everything a command needs to know about a project once config and flags are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSettings {
    pub template: ProjectTemplate,
    pub sources: SourceFilter,
}

impl ProjectSettings {
    pub fn load(root: &Path, overrides: &Overrides) -> Result<Self> {
        let loaded = find_project_config(root)?;
        Self::resolve(root, loaded.as_ref(), overrides)
    }

    pub fn resolve(
        root: &Path,
        loaded: Option<&LoadedProjectConfig>,
        overrides: &Overrides,
    ) -> Result<Self> {
        let data = loaded.map(|cfg| cfg.data.clone()).unwrap_or_default();

        let name = overrides
            .name
            .clone()
            .or(data.name)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| project_name(root));

        let cxx_standard = overrides
            .cxx_standard
            .or(data.cxx_standard)
            .unwrap_or(DEFAULT_CXX_STANDARD);
        if !SUPPORTED_CXX_STANDARDS.contains(&cxx_standard) {
            bail!(
                "Unsupported C++ standard `{cxx_standard}`. Supported values: 98, 11, 14, 17, 20, 23, 26."
            );
        }

        let sources = match data.source_extensions {
            Some(exts) => {
                let filter = SourceFilter::new(exts);
                if filter.extensions().is_empty() {
                    let origin = loaded.map(|cfg| cfg.path.display().to_string());
                    bail!(
                        "`source_extensions` in {} must name at least one extension",
                        origin.unwrap_or_default()
                    );
                }
                filter
            }
            None => SourceFilter::default(),
        };

        let mut template = ProjectTemplate::new(name);
        template.cxx_standard = cxx_standard;
        Ok(Self { template, sources })
    }
}

/// The first config candidate present in `root`, parsed.
pub fn find_project_config(root: &Path) -> Result<Option<LoadedProjectConfig>> {
    let Some((path, format)) = CONFIG_CANDIDATES
        .iter()
        .map(|(file, format)| (root.join(file), *format))
        .find(|(path, _)| path.is_file())
    else {
        return Ok(None);
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let data = format
        .parse(&content)
        .with_context(|| format!("invalid {} in {}", format.label(), path.display()))?;
    Ok(Some(LoadedProjectConfig { path, data }))
}

/// Folder name made safe for `project()`, or a placeholder.
fn project_name(root: &Path) -> String {
    let resolved = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    resolved
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .map(|name| {
            name.chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
                .collect::<String>()
        })
        .filter(|name| name.chars().any(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| FALLBACK_PROJECT_NAME.to_string())
}
