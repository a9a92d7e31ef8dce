use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

pub const DEFAULT_ENV_FILE: &str = ".env.local";
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";
const PLACEHOLDER_TOKEN: &str = "your_github_token_here";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("GITHUB_TOKEN is not set")]
    Missing,
    #[error("GITHUB_TOKEN still holds the placeholder value")]
    Placeholder,
}

/// Loads `KEY=VALUE` lines from `path` into the process environment.
///
/// Returns `Ok(false)` when the file does not exist. Values from the file
/// replace whatever the environment already holds.
pub fn load_env_file(path: &Path) -> Result<bool> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no env file");
        return Ok(false);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("reading env file {}", path.display()))?;
    for (idx, line) in content.lines().enumerate() {
        let entry = parse_line(line)
            .with_context(|| format!("parsing env file {} line {}", path.display(), idx + 1))?;
        let Some((key, value)) = entry else {
            continue;
        };
        tracing::debug!(key, "setting variable from env file");
        // SAFETY: called from `main` before any HTTP client or other thread exists.
        unsafe { std::env::set_var(key, value) };
    }
    Ok(true)
}

/// Splits one env file line. Blank lines and `#` comments yield `None`.
///
/// There is no quoting, escaping or substitution: the value is everything
/// after the first `=`, with surrounding whitespace removed.
fn parse_line(line: &str) -> Result<Option<(&str, &str)>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let Some((key, value)) = line.split_once('=') else {
        bail!("expected KEY=VALUE");
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("missing variable name before `=`");
    }
    if key.contains('\0') || value.contains('\0') {
        bail!("NUL byte in `{key}`");
    }
    Ok(Some((key, value.trim())))
}

/// Validated API token.
#[derive(Debug, Clone)]
pub struct Credentials {
    token: SecretString,
}

impl Credentials {
    pub fn from_env() -> Result<Self, CredentialError> {
        Self::from_value(std::env::var(TOKEN_VAR).ok())
    }

    fn from_value(raw: Option<String>) -> Result<Self, CredentialError> {
        let token = raw.map(|v| v.trim().to_string()).unwrap_or_default();
        if token.is_empty() {
            return Err(CredentialError::Missing);
        }
        if token == PLACEHOLDER_TOKEN {
            return Err(CredentialError::Placeholder);
        }
        Ok(Self {
            token: SecretString::from(token),
        })
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn expose(&self) -> &str {
        self.token.expose_secret()
    }
}

/// Stderr hint printed when the token is unusable.
pub fn token_help(env_file: &Path) -> String {
    format!(
        "❌ ERROR: {TOKEN_VAR} not set in {}\n   \
         Please create a GitHub Personal Access Token:\n   \
         1. Go to https://github.com/settings/tokens\n   \
         2. Click 'Generate new token (classic)'\n   \
         3. Select scopes: 'repo' and 'project'\n   \
         4. Copy the token and add it to {}",
        env_file.display(),
        env_file.display()
    )
}
