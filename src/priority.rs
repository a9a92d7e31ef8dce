use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use anyhow::{Result, bail};
use serde::{Deserialize, Deserializer};

/// Severity tiers accepted by the project's "Priority" single-select field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Critical,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Priority::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "unknown priority `{trimmed}` (expected one of Low, Medium, High, Critical)"
                )
            })
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Issue number to target priority. Iteration is always ascending by issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorityTable {
    entries: BTreeMap<u64, Priority>,
}

impl PriorityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from issue numbers already known to be valid.
    pub(crate) fn from_valid(entries: impl IntoIterator<Item = (NonZeroU64, Priority)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(issue, priority)| (issue.get(), priority))
                .collect(),
        }
    }

    pub fn insert(&mut self, issue: u64, priority: Priority) -> Result<()> {
        if issue == 0 {
            bail!("issue numbers start at 1");
        }
        self.entries.insert(issue, priority);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, Priority)> + '_ {
        self.entries.iter().map(|(issue, priority)| (*issue, *priority))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest issue number, shown as the denominator on progress lines.
    pub fn last_issue(&self) -> Option<u64> {
        self.entries.keys().next_back().copied()
    }
}

impl TryFrom<Vec<(u64, Priority)>> for PriorityTable {
    type Error = anyhow::Error;

    fn try_from(entries: Vec<(u64, Priority)>) -> Result<Self> {
        let mut table = PriorityTable::new();
        for (issue, priority) in entries {
            table.insert(issue, priority)?;
        }
        Ok(table)
    }
}

/// Parses an issue number written as a map key (`"24"` in TOML, `24` in YAML).
pub fn parse_issue_number(raw: &str) -> Result<u64> {
    let trimmed = raw.trim().trim_start_matches('#');
    let issue: u64 = trimmed
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid issue number `{raw}`"))?;
    if issue == 0 {
        bail!("invalid issue number `{raw}`: issue numbers start at 1");
    }
    Ok(issue)
}
