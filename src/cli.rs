use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::browser::{DEFAULT_WEBDRIVER_URL, WaitPolicy, WebDriverOptions, WebDriverSession};
use crate::config::{ProjectConfig, load_project_config};
use crate::credentials::{self, Credentials, DEFAULT_ENV_FILE};
use crate::drivers::{self, ui::UiOptions};
use crate::github::{DEFAULT_GRAPHQL_URL, GraphqlClient, ResolveTarget, resolve_ids};

/// Root CLI for project-priorities
#[derive(Parser)]
#[command(name = "project-priorities")]
#[command(about = "Set the Priority field on GitHub Project issues")]
pub struct Cli {
    /// File with KEY=VALUE lines loaded into the environment before running
    #[arg(long, global = true, default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,
    /// Project file overriding the built-in priority table and identifiers
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set priorities with GraphQL mutations against the Projects API
    Graphql {
        /// GraphQL endpoint (defaults to $GITHUB_GRAPHQL_API_URL, then api.github.com)
        #[arg(long)]
        endpoint: Option<String>,
        /// Look up field, option and item ids from the board before updating
        #[arg(long)]
        resolve: bool,
        /// Print the mutation variables instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
    /// Set priorities by clicking through issue pages in a WebDriver browser
    Browser {
        /// WebDriver server (defaults to $WEBDRIVER_URL, then localhost:4444)
        #[arg(long)]
        webdriver_url: Option<String>,
        /// Show the browser window
        #[arg(long)]
        headed: bool,
        /// Chromium user-data directory with a logged-in GitHub session
        #[arg(long)]
        browser_profile: Option<PathBuf>,
        /// Seconds to wait for the issue sidebar to appear
        #[arg(long, default_value_t = 10)]
        wait_secs: u64,
    },
    /// Print the priority table and the ids each issue maps to
    Plan,
}

/// Dispatch after parse; returns the process exit code.
pub fn run() -> i32 {
    let cli = Cli::parse();

    match cli.command {
        Commands::Graphql {
            endpoint,
            resolve,
            dry_run,
        } => match run_graphql(&cli.env_file, cli.config.as_deref(), endpoint, resolve, dry_run) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("error (graphql): {e:#}");
                1
            }
        },
        Commands::Browser {
            webdriver_url,
            headed,
            browser_profile,
            wait_secs,
        } => {
            let options = WebDriverOptions {
                url: env_or(webdriver_url, "WEBDRIVER_URL", DEFAULT_WEBDRIVER_URL),
                headless: !headed,
                profile_dir: browser_profile,
            };
            match run_browser(&cli.env_file, cli.config.as_deref(), options, wait_secs) {
                Ok(code) => code,
                Err(e) => {
                    eprintln!("error (browser): {e:#}");
                    1
                }
            }
        }
        Commands::Plan => {
            let result = load_config(cli.config.as_deref())
                .and_then(|config| write_plan(&config, &mut io::stdout().lock()));
            if let Err(e) = result {
                eprintln!("error (plan): {e:#}");
                return 1;
            }
            0
        }
    }
}

/// Loads the env file and validates the token; prints the help block and
/// returns `None` when the token is unusable.
fn startup_credentials(env_file: &Path) -> Result<Option<Credentials>> {
    credentials::load_env_file(env_file)?;
    match Credentials::from_env() {
        Ok(creds) => Ok(Some(creds)),
        Err(err) => {
            tracing::debug!(%err, "rejecting credentials");
            eprintln!("{}", credentials::token_help(env_file));
            Ok(None)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ProjectConfig> {
    let loaded = load_project_config(path)?;
    match &loaded.path {
        Some(path) => tracing::debug!(path = %path.display(), "using project file"),
        None => tracing::debug!("no project file, using built-in table"),
    }
    Ok(loaded.data)
}

/// Flag, then environment variable, then built-in default.
fn env_or(flag: Option<String>, var: &str, default: &str) -> String {
    flag.or_else(|| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| default.to_string())
}

fn run_graphql(
    env_file: &Path,
    config_path: Option<&Path>,
    endpoint: Option<String>,
    resolve: bool,
    dry_run: bool,
) -> Result<i32> {
    let Some(creds) = startup_credentials(env_file)? else {
        return Ok(1);
    };
    let mut config = load_config(config_path)?;
    let endpoint = env_or(endpoint, "GITHUB_GRAPHQL_API_URL", DEFAULT_GRAPHQL_URL);
    let client = GraphqlClient::new(creds.token().clone(), endpoint)?;

    if resolve {
        let target = ResolveTarget {
            project_id: &config.project_id,
            field_name: &config.field_name,
            repository_url: &config.repository_url,
        };
        let ids = resolve_ids(&client, target)?;
        config.field_id = ids.field_id;
        config.options = ids.options;
        config.items = ids.items;
    }

    let report = drivers::graphql::run(&client, &config, dry_run, &mut io::stdout().lock())?;
    Ok(report.exit_code())
}

fn run_browser(
    env_file: &Path,
    config_path: Option<&Path>,
    options: WebDriverOptions,
    wait_secs: u64,
) -> Result<i32> {
    let Some(creds) = startup_credentials(env_file)? else {
        return Ok(1);
    };
    let config = load_config(config_path)?;
    let ui_options = UiOptions {
        sidebar: WaitPolicy::new(Duration::from_secs(wait_secs)),
        ..UiOptions::default()
    };

    let mut session = WebDriverSession::start(&options)?;
    let report = drivers::ui::run(
        &mut session,
        &config,
        creds.expose(),
        &ui_options,
        &mut io::stdout().lock(),
    )?;
    Ok(report.exit_code())
}

fn write_plan(config: &ProjectConfig, out: &mut dyn Write) -> Result<()> {
    writeln!(
        out,
        "Project: {} (ID: {})",
        config.repository_url, config.project_id
    )?;
    writeln!(out, "Field: {} (ID: {})", config.field_name, config.field_id)?;
    writeln!(out, "Issues: {}\n", config.priorities.len())?;
    for (issue, priority) in config.priorities.iter() {
        writeln!(
            out,
            "#{issue:<5} {:<9} item {:<32} option {}",
            priority.label(),
            config.item_id(issue).unwrap_or("<missing>"),
            config.option_id(priority).unwrap_or("<missing>"),
        )?;
    }
    Ok(())
}
