use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::priority::{Priority, PriorityTable, parse_issue_number};

const CONFIG_CANDIDATES: &[(&str, ConfigFormat)] = &[
    ("priorities.yml", ConfigFormat::Yaml),
    ("priorities.yaml", ConfigFormat::Yaml),
    ("priorities.toml", ConfigFormat::Toml),
];

// Snapshot of the hestai board, captured from a manual GraphQL query.
const DEFAULT_REPOSITORY_URL: &str = "https://github.com/elevanaltd/hestai";
const DEFAULT_PROJECT_ID: &str = "PVT_kwDODBy18c4BKNCtzg";
const DEFAULT_FIELD_ID: &str = "PVTSSF_lADODBy18c4BKNCtzg6I_FI";
const DEFAULT_FIELD_NAME: &str = "Priority";

const DEFAULT_PRIORITIES: &[(NonZeroU64, Priority)] = &[
    (issue(24), Priority::Medium),
    (issue(25), Priority::Medium),
    (issue(26), Priority::Medium),
    (issue(27), Priority::High),
    (issue(28), Priority::Medium),
    (issue(29), Priority::Low),
    (issue(30), Priority::High),
    (issue(31), Priority::High),
];

/// Compile-time checked issue number.
const fn issue(number: u64) -> NonZeroU64 {
    match NonZeroU64::new(number) {
        Some(number) => number,
        None => panic!("issue numbers start at 1"),
    }
}

const DEFAULT_OPTIONS: &[(Priority, &str)] = &[
    (Priority::High, "7f3ba8d0"),
    (Priority::Medium, "84f776ed"),
    (Priority::Low, "73f976ad"),
    (Priority::Critical, "7ac37ec7"),
];

const DEFAULT_ITEMS: &[(u64, &str)] = &[
    (24, "PVTI_lADODBy18c4BKNCtzgiV0IE"),
    (25, "PVTI_lADODBy18c4BKNCtzgiV0IU"),
    (26, "PVTI_lADODBy18c4BKNCtzgiV0I4"),
    (27, "PVTI_lADODBy18c4BKNCtzgiV0Jg"),
    (28, "PVTI_lADODBy18c4BKNCtzgiV0J4"),
    (29, "PVTI_lADODBy18c4BKNCtzgiV0Kg"),
    (30, "PVTI_lADODBy18c4BKNCtzgiV0LI"),
    (31, "PVTI_lADODBy18c4BKNCtzgiV0L0"),
];

#[derive(Debug, Clone)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

/// Everything a run needs to know about the target board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub repository_url: String,
    pub project_id: String,
    pub field_id: String,
    pub field_name: String,
    pub priorities: PriorityTable,
    pub options: BTreeMap<Priority, String>,
    pub items: BTreeMap<u64, String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            repository_url: DEFAULT_REPOSITORY_URL.to_string(),
            project_id: DEFAULT_PROJECT_ID.to_string(),
            field_id: DEFAULT_FIELD_ID.to_string(),
            field_name: DEFAULT_FIELD_NAME.to_string(),
            priorities: PriorityTable::from_valid(DEFAULT_PRIORITIES.iter().copied()),
            options: DEFAULT_OPTIONS
                .iter()
                .map(|(p, id)| (*p, id.to_string()))
                .collect(),
            items: DEFAULT_ITEMS
                .iter()
                .map(|(issue, id)| (*issue, id.to_string()))
                .collect(),
        }
    }
}

impl ProjectConfig {
    pub fn issue_url(&self, issue: u64) -> String {
        format!("{}/issues/{issue}", self.repository_url.trim_end_matches('/'))
    }

    pub fn item_id(&self, issue: u64) -> Option<&str> {
        self.items.get(&issue).map(String::as_str)
    }

    pub fn option_id(&self, priority: Priority) -> Option<&str> {
        self.options.get(&priority).map(String::as_str)
    }

    /// Applies a parsed project file on top of `self`.
    fn overlay(mut self, file: ConfigFile) -> Result<Self> {
        if let Some(project) = file.project {
            if let Some(url) = project.repository_url {
                self.repository_url = url;
            }
            if let Some(id) = project.id {
                self.project_id = id;
            }
            if let Some(id) = project.field_id {
                self.field_id = id;
            }
            if let Some(name) = project.field_name {
                self.field_name = name;
            }
        }

        if let Some(priorities) = file.priorities {
            let mut table = PriorityTable::new();
            for (raw_issue, priority) in priorities {
                table.insert(parse_issue_number(&raw_issue)?, priority)?;
            }
            if table.is_empty() {
                bail!("`priorities` must list at least one issue");
            }
            self.priorities = table;
        }

        for (raw_priority, id) in file.options {
            let priority: Priority = raw_priority.parse()?;
            self.options.insert(priority, id);
        }

        for (raw_issue, id) in file.items {
            self.items.insert(parse_issue_number(&raw_issue)?, id);
        }

        Ok(self)
    }
}

/// A project config together with the file it came from, if any.
#[derive(Debug, Clone)]
pub struct LoadedProjectConfig {
    pub path: Option<PathBuf>,
    pub data: ProjectConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    project: Option<ProjectSection>,
    #[serde(default)]
    priorities: Option<HashMap<IssueKey, Priority>>,
    #[serde(default)]
    options: HashMap<String, String>,
    #[serde(default)]
    items: HashMap<IssueKey, String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct ProjectSection {
    repository_url: Option<String>,
    id: Option<String>,
    field_id: Option<String>,
    field_name: Option<String>,
}

/// Map key that accepts both `24` (YAML) and `"24"` (TOML).
#[derive(Deserialize)]
#[serde(untagged)]
enum IssueKeyRepr {
    Number(u64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IssueKey(String);

impl std::ops::Deref for IssueKey {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for IssueKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match IssueKeyRepr::deserialize(deserializer)? {
            IssueKeyRepr::Number(n) => IssueKey(n.to_string()),
            IssueKeyRepr::Text(s) => IssueKey(s),
        })
    }
}

pub fn load_project_config(explicit: Option<&Path>) -> Result<LoadedProjectConfig> {
    if let Some(path) = explicit {
        let format = format_for_path(path)?;
        let data = load_file(path, &format)?;
        return Ok(LoadedProjectConfig {
            path: Some(path.to_path_buf()),
            data,
        });
    }
    let current_dir = std::env::current_dir().context("resolving current directory for config")?;
    load_project_config_from_dir(&current_dir)
}

pub fn load_project_config_from_dir(base_dir: &Path) -> Result<LoadedProjectConfig> {
    for (file, format) in CONFIG_CANDIDATES {
        let path = base_dir.join(file);
        if !path.exists() {
            continue;
        }
        let data = load_file(&path, format)?;
        return Ok(LoadedProjectConfig {
            path: Some(path),
            data,
        });
    }
    Ok(LoadedProjectConfig {
        path: None,
        data: ProjectConfig::default(),
    })
}

fn format_for_path(path: &Path) -> Result<ConfigFormat> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yml" | "yaml") => Ok(ConfigFormat::Yaml),
        Some("toml") => Ok(ConfigFormat::Toml),
        _ => bail!(
            "unsupported config file `{}` (expected .yml, .yaml or .toml)",
            path.display()
        ),
    }
}

fn load_file(path: &Path, format: &ConfigFormat) -> Result<ProjectConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading project config at {}", path.display()))?;
    let parsed = match format {
        ConfigFormat::Yaml => parse_yaml_str(&content)
            .with_context(|| format!("parsing YAML config at {}", path.display()))?,
        ConfigFormat::Toml => parse_toml_str(&content)
            .with_context(|| format!("parsing TOML config at {}", path.display()))?,
    };
    ProjectConfig::default()
        .overlay(parsed)
        .with_context(|| format!("validating project config at {}", path.display()))
}

fn parse_yaml_str(content: &str) -> Result<ConfigFile> {
    Ok(serde_yaml::from_str(content)?)
}

fn parse_toml_str(content: &str) -> Result<ConfigFile> {
    Ok(toml::from_str(content)?)
}
