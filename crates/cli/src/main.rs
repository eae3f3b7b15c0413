//! Operator CLI for the definition stores.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use defstore_core::config::AppConfig;
use defstore_core::{Coordinates, Definition, PartialCoordinates};
use defstore_store::query::DefinitionQuery;
use defstore_store::{DEFAULT_FIND_PAGE_SIZE, DefinitionStore};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound on pages fetched by `find --all`.
const MAX_FIND_ALL_PAGES: usize = 100_000;

#[derive(Parser, Debug)]
#[command(name = "defstore")]
#[command(about = "Inspect and maintain definition stores")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "DEFSTORE_CONFIG",
        default_value = "config/defstore.toml"
    )]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect to every store and create indexes
    Init,
    /// Print a full definition
    Get {
        /// Coordinates, e.g. npm/npmjs/-/lodash/4.17.21
        coordinates: String,
    },
    /// List canonical keys under a coordinate prefix
    List {
        /// Leading coordinates, e.g. npm/npmjs/-/lodash (default: everything)
        prefix: Option<String>,
    },
    /// Query definitions (files omitted)
    Find {
        /// Query parameter as key=value (e.g. license=MIT, sort=releaseDate)
        #[arg(long = "param", short = 'p', value_parser = parse_key_val)]
        params: Vec<(String, String)>,
        /// Continuation token from a previous page
        #[arg(long, default_value = "")]
        token: String,
        /// Definitions per page
        #[arg(long, default_value_t = DEFAULT_FIND_PAGE_SIZE)]
        page_size: usize,
        /// Follow continuation tokens and print every match
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    /// Store a definition read from a JSON file
    Put {
        /// Definition JSON file
        file: PathBuf,
    },
    /// Delete a definition
    Delete {
        /// Coordinates, e.g. npm/npmjs/-/lodash/4.17.21
        coordinates: String,
    },
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.trim().is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

/// Load configuration from an optional TOML file overlaid with `DEFSTORE_`
/// environment variables (`__` separates nested keys).
fn load_config(path: &Path) -> Result<AppConfig> {
    let mut figment = Figment::new();
    let has_config_file = path.exists();

    if has_config_file {
        tracing::debug!(config_path = %path.display(), "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    }

    let has_env_config = std::env::vars()
        .any(|(key, _)| key.starts_with("DEFSTORE_") && key != "DEFSTORE_CONFIG");
    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: defstore --config /path/to/defstore.toml <command>\n  \
             2. Environment variables, e.g. \
             DEFSTORE_STORES='[{{kind=\"paged\",backend={{type=\"memory\"}}}}]'\n\n\
             See config/defstore.example.toml for example configuration.\n\
             Set DEFSTORE_CONFIG to change the default config file path."
        );
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("DEFSTORE_").ignore(&["CONFIG"]).split("__"))
        .extract()
        .context("failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn read_definition(path: &Path) -> Result<Definition> {
    let contents = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&contents)
        .with_context(|| format!("{} is not a valid definition", path.display()))
}

async fn find_all(
    store: &dyn DefinitionStore,
    query: &DefinitionQuery,
    mut token: String,
    page_size: usize,
) -> Result<Vec<Definition>> {
    let mut definitions = Vec::new();
    for _ in 0..MAX_FIND_ALL_PAGES {
        let page = store.find(query, &token, page_size).await?;
        definitions.extend(page.data);
        if page.continuation_token.is_empty() {
            return Ok(definitions);
        }
        token = page.continuation_token;
    }
    anyhow::bail!("find --all stopped after {MAX_FIND_ALL_PAGES} pages")
}

async fn run(command: Commands, store: &dyn DefinitionStore) -> Result<()> {
    match command {
        Commands::Init => {
            tracing::info!(store = store.store_name(), "Stores initialized");
        }
        Commands::Get { coordinates } => {
            let coordinates: Coordinates = coordinates.parse()?;
            match store.get(&coordinates).await? {
                Some(definition) => print_json(&definition)?,
                None => anyhow::bail!("definition not found: {coordinates}"),
            }
        }
        Commands::List { prefix } => {
            let prefix: PartialCoordinates = match prefix {
                Some(prefix) => prefix.parse()?,
                None => PartialCoordinates::default(),
            };
            print_json(&store.list(&prefix).await?)?;
        }
        Commands::Find {
            params,
            token,
            page_size,
            all,
        } => {
            let query = DefinitionQuery::from_params(params);
            if all {
                print_json(&find_all(store, &query, token, page_size).await?)?;
            } else {
                print_json(&store.find(&query, &token, page_size).await?)?;
            }
        }
        Commands::Put { file } => {
            let definition = read_definition(&file).await?;
            match store.store(&definition).await? {
                Some(ack) => print_json(&ack)?,
                None => anyhow::bail!("no store accepted {}", definition.key()),
            }
        }
        Commands::Delete { coordinates } => {
            let coordinates: Coordinates = coordinates.parse()?;
            store.delete(&coordinates).await?;
            tracing::info!(key = %coordinates, "Definition deleted");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries command output only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(Path::new(&cli.config))?;
    let store = defstore_store::from_configs(&config)
        .await
        .context("failed to create definition store")?;
    store
        .initialize()
        .await
        .context("failed to initialize definition store")?;

    run(cli.command, store.as_ref()).await
}
