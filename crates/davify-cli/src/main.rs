//! davify — upload files to a WebDAV server for retrieval via https.
//!
//! Connection settings come from the environment or the user config file
//! written by `davify setup` (DAVIFY_SERVER, DAVIFY_USERNAME, ...).

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use davify_cli::{hash_file, init_tracing};
use davify_core::{
    compose, render_notification, version_suffix, LifetimeTable, Notification, WebDavConfig,
};
use davify_services::{archive_name, create_archive, sweep_directory, SweepService};
use davify_storage::WebDavClient;
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "davify",
    about = "Upload files to a WebDAV server under short-lived, unguessable names"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one file, or bundle several files/directories into an archive first
    Upload {
        /// File(s) to upload
        files: Vec<PathBuf>,
        /// Lifetime of the uploaded file; 'forever' means it is never deleted
        #[arg(long, default_value = "1 week")]
        lifetime: String,
        /// File name for the created archive (multi-file uploads only)
        #[arg(long, short = 'n')]
        archive_name: Option<String>,
        /// Print a SHA-256 digest of the uploaded content
        #[arg(long)]
        hash: bool,
    },
    /// Delete files in a directory whose encoded lifetime has elapsed
    Clean {
        /// The directory to clean
        directory: PathBuf,
        /// Keep running, sweeping on an interval instead of once
        #[arg(long)]
        watch: bool,
        /// Seconds between sweeps in --watch mode
        #[arg(long, default_value = "3600")]
        interval_secs: u64,
    },
    /// List the available lifetime choices
    Lifetimes,
    /// Interactively write the WebDAV connection config file
    Setup,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize report")?;
    println!("{}", out);
    Ok(())
}

fn prompt(label: &str, default: &str) -> anyhow::Result<String> {
    print!("{} ({}): ", label, default);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let line = line.trim();
    Ok(if line.is_empty() {
        default.to_string()
    } else {
        line.to_string()
    })
}

/// Quote a value for the dotenv-style config file.
fn quote_env(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

async fn upload(
    files: Vec<PathBuf>,
    lifetime: String,
    archive_name_override: Option<String>,
    with_hash: bool,
) -> anyhow::Result<()> {
    let table = LifetimeTable::canonical();
    if table.duration_for_label(&lifetime).is_err() {
        let choices: Vec<&str> = table.labels().collect();
        anyhow::bail!(
            "Invalid lifetime {:?} - valid choices:\n  {}",
            lifetime,
            choices.join("\n  ")
        );
    }
    if files.is_empty() {
        anyhow::bail!("No filename provided");
    }

    let config = WebDavConfig::from_env()?;
    let client = WebDavClient::new(config.clone())?;

    // A single regular file goes up as-is; several files or a directory are
    // bundled into one archive in a staging dir that lives until the PUT is done.
    let mut staging = None;
    let local_path = if files.len() == 1 && files[0].is_file() {
        files[0].clone()
    } else {
        let dir = tempfile::tempdir().context("Failed to create staging directory")?;
        let bundle_name = match archive_name_override {
            Some(name) => name,
            None => archive_name(&files[0])?,
        };
        let dest = dir.path().join(&bundle_name);
        let entries = create_archive(&dest, &files).await?;
        tracing::info!(archive = %dest.display(), entries, "Bundled inputs into archive");
        staging = Some(dir);
        dest
    };

    let name = compose(
        &local_path.to_string_lossy(),
        &lifetime,
        &version_suffix(),
        &table,
        &mut rand::rng(),
    )?;

    client.upload(&local_path, &name).await?;
    let url = config.file_url(&name);

    let hash_line = if with_hash {
        Some(format!("Hash (SHA-256): {}\n", hash_file(&local_path)?))
    } else {
        None
    };
    drop(staging);

    let message = render_notification(
        &config.notification_pattern,
        &Notification {
            url: &url,
            lifetime: &lifetime,
            hash: hash_line.as_deref(),
        },
    );
    println!("{}", message);
    Ok(())
}

fn setup() -> anyhow::Result<()> {
    println!("Setup WebDAV server connection.");
    println!("===============================");

    let protocol = prompt("Protocol", "https")?;
    let default_port = if protocol == "http" { "80" } else { "443" };
    let server = prompt("WebDAV server name", "localhost")?;
    let port = prompt("WebDAV server port", default_port)?;
    let path = prompt("WebDAV server path", "/")?;
    let default_user = std::env::var("USER").unwrap_or_default();
    let username = prompt("WebDAV server username", &default_user)?;
    let password = prompt("WebDAV server password", "")?;

    let config_path = WebDavConfig::user_config_path()
        .context("Cannot determine config path; set HOME or DAVIFY_CONFIG")?;
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let contents = format!(
        "DAVIFY_PROTOCOL={}\nDAVIFY_SERVER={}\nDAVIFY_PORT={}\nDAVIFY_REMOTE_PATH={}\nDAVIFY_USERNAME={}\nDAVIFY_PASSWORD={}\n",
        quote_env(&protocol),
        quote_env(&server),
        quote_env(&port),
        quote_env(&path),
        quote_env(&username),
        quote_env(&password),
    );
    std::fs::write(&config_path, contents)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    // The file holds a password; keep it private.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&config_path, std::fs::Permissions::from_mode(0o600))?;
    }

    println!("Wrote {}", config_path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            files,
            lifetime,
            archive_name,
            hash,
        } => {
            upload(files, lifetime, archive_name, hash).await?;
        }
        Commands::Clean {
            directory,
            watch,
            interval_secs,
        } => {
            let table = LifetimeTable::canonical();
            if watch {
                let service = Arc::new(
                    SweepService::new(Arc::new(table), directory)
                        .with_interval(Duration::from_secs(interval_secs)),
                );
                service.start().await?;
            } else {
                let report = sweep_directory(&directory, &table).await?;
                print_json(&report)?;
            }
        }
        Commands::Lifetimes => {
            let table = LifetimeTable::canonical();
            for label in table.labels() {
                println!("* {}", label);
            }
        }
        Commands::Setup => {
            setup()?;
        }
    }

    Ok(())
}
