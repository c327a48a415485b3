//! hoist: upload files to configured destinations.
//!
//! Configuration lives in `<home>/config.toml` with optional per-machine
//! overrides in `<home>/config.local.toml`; `<home>` is `--home`, then
//! $HOIST_HOME, then the platform config directory.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use hoist_cli::{config_home, history, init_tracing, parse_key_value};
use hoist_core::{RemoteName, Settings, STARTER_CONFIG};
use hoist_engine::{Orchestrator, UploadOptions};

const CONFIG_FILE: &str = "config.toml";
const LOCAL_CONFIG_FILE: &str = "config.local.toml";

#[derive(Parser)]
#[command(name = "hoist", about = "File upload orchestrator")]
struct Cli {
    /// Config directory (default: $HOIST_HOME or the platform config dir)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file and print its URL
    Upload {
        /// Path to the file to upload
        file: PathBuf,
        /// Uploader to use, overriding rules and priorities
        #[arg(long, short)]
        uploader: Option<String>,
        /// Remote name to upload under (default: the file's base name)
        #[arg(long)]
        rename: Option<String>,
        /// Plugin to run, in order; replaces any rule-supplied list
        #[arg(long = "plugin")]
        plugins: Vec<String>,
        /// Backend option as key=value; repeatable
        #[arg(long = "opt", value_parser = parse_key_value)]
        options: Vec<(String, String)>,
    },
    /// List configured uploaders
    List,
    /// Write a starter config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Show past uploads
    History {
        /// Maximum number of entries, newest last
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

fn load_settings(home: &std::path::Path) -> anyhow::Result<Settings> {
    let read_layer = |name: &str| -> anyhow::Result<Settings> {
        let path = home.join(name);
        if path.is_file() {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(Settings::from_toml(&text)?)
        } else {
            Ok(Settings::default())
        }
    };
    let app = read_layer(CONFIG_FILE)?;
    let user = read_layer(LOCAL_CONFIG_FILE)?;
    Ok(Settings::layered(app, user))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let home = config_home(cli.home.clone())?;

    match cli.command {
        Commands::Upload {
            file,
            uploader,
            rename,
            plugins,
            options,
        } => {
            let settings = load_settings(&home)?;
            let orchestrator = Orchestrator::builtin(&settings)?;

            let opts = UploadOptions {
                rename: rename.map(RemoteName::literal).unwrap_or_default(),
                uploader,
                plugins: if plugins.is_empty() {
                    None
                } else {
                    Some(plugins)
                },
                options: options.into_iter().collect::<BTreeMap<_, _>>(),
            };

            let outcome = orchestrator.upload_detailed(&file, opts).await?;
            println!("{}", outcome.url);

            let entry = history::HistoryEntry::now(
                file.to_string_lossy(),
                &outcome.uploader,
                &outcome.url,
            );
            if let Err(err) = history::append(&home, &entry) {
                tracing::warn!(error = %err, "Failed to record upload history");
            }
        }
        Commands::List => {
            let settings = load_settings(&home)?;
            let orchestrator = Orchestrator::builtin(&settings)?;

            if orchestrator.uploaders().is_empty() {
                println!("No uploaders configured. Run `hoist init` to get started.");
                return Ok(());
            }
            for uploader in orchestrator.uploaders().iter() {
                let status = if uploader.available() {
                    "available"
                } else {
                    "unavailable"
                };
                println!(
                    "{:<20} client={:<12} priority={:<3} {}",
                    uploader.name(),
                    uploader.client_name(),
                    uploader.priority(),
                    status
                );
            }
        }
        Commands::Init { force } => {
            let path = home.join(CONFIG_FILE);
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists; pass --force to overwrite",
                    path.display()
                );
            }
            std::fs::create_dir_all(&home)
                .with_context(|| format!("Failed to create {}", home.display()))?;
            std::fs::write(&path, STARTER_CONFIG)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        Commands::History { limit } => {
            let entries = history::read(&home)?;
            if entries.is_empty() {
                println!("No uploads recorded.");
                return Ok(());
            }
            let skip = entries.len().saturating_sub(limit);
            for entry in &entries[skip..] {
                println!(
                    "{}  {:<12} {}  {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.uploader,
                    entry.path,
                    entry.url
                );
            }
        }
    }

    Ok(())
}
