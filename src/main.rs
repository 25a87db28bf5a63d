//! permaupload - stage a local folder, pay for it and upload it.
//!
//! Usage:
//!   permaupload choose <PATH>       Remember the root directory
//!   permaupload ls [--at DIR]       List a directory with its upload records
//!   permaupload collect             Show what an upload would send
//!   permaupload manifest            Print the manifest of the last upload
//!   permaupload upload              Upload against the dry-run network
//!   permaupload config              Show or change settings
//!   permaupload --help              Show help

mod settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, eyre};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use permaupload_core::{CollectConfig, CollectWarning, DirectoryEntry, ExcludePattern};
use permaupload_fs::{Browser, LocalDirectory, RootStore, collect, read_manifest};
use permaupload_upload::{Amount, DryRunNetwork, UploadPipeline};

use crate::settings::Settings;

#[derive(Parser)]
#[command(
    name = "permaupload",
    version,
    about = "Stage a local folder and upload it to permanent storage",
    long_about = "permaupload collects a local folder, tops up the storage balance when \
                  needed, uploads every file and writes manifest.json next to them.\n\n\
                  Choose a root once with `permaupload choose <PATH>`; later commands \
                  work inside it."
)]
struct Cli {
    /// Root directory (defaults to the remembered one)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Remember a root directory
    Choose {
        /// Directory to remember
        path: PathBuf,
    },

    /// List a directory with manifest information
    Ls {
        /// Directory inside the root, e.g. "img/icons"
        #[arg(long, default_value = "")]
        at: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Collect files the way an upload would
    Collect {
        /// Directory inside the root to collect from
        #[arg(long, default_value = "")]
        at: String,

        /// Extra glob to exclude by name (repeatable)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Maximum depth (0 = only the starting directory)
        #[arg(short = 'd', long)]
        max_depth: Option<u32>,

        /// Let --exclude replace the default exclusions
        #[arg(long)]
        include_hidden: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the manifest of a directory
    Manifest {
        /// Directory inside the root
        #[arg(long, default_value = "")]
        at: String,
    },

    /// Upload a directory using the dry-run network
    Upload {
        /// Directory inside the root to upload
        #[arg(long, default_value = "")]
        at: String,

        /// Price per byte (overrides settings)
        #[arg(long)]
        price_per_byte: Option<u64>,

        /// Starting balance (overrides settings)
        #[arg(long)]
        balance: Option<u64>,
    },

    /// Show or change persisted settings
    Config {
        /// Gateway for public URLs
        #[arg(long)]
        gateway: Option<String>,

        /// Dry-run price per byte
        #[arg(long)]
        price_per_byte: Option<u64>,

        /// Dry-run starting balance
        #[arg(long)]
        initial_balance: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load();
    debug!(?settings, "settings loaded");

    match cli.command {
        Command::Choose { path } => run_choose(&path).await?,
        Command::Ls { at, format } => {
            let browser = open_browser(cli.root, &settings, &at).await?;
            print_listing(&browser, format)?;
        }
        Command::Collect {
            at,
            exclude,
            max_depth,
            include_hidden,
            format,
        } => {
            let mut browser = open_browser(cli.root, &settings, &at).await?;
            let config = build_collect_config(&exclude, max_depth, include_hidden)?;
            run_collect(&mut browser, &config, format).await?;
        }
        Command::Manifest { at } => {
            let browser = open_browser(cli.root, &settings, &at).await?;
            match read_manifest(browser.cursor()).await {
                Some(manifest) => println!("{}", manifest.to_json_pretty()?),
                None => eprintln!("No manifest in {}", browser.cursor().full_path()),
            }
        }
        Command::Upload {
            at,
            price_per_byte,
            balance,
        } => {
            let mut browser = open_browser(cli.root, &settings, &at).await?;
            let network = Arc::new(DryRunNetwork::new(
                Amount::from(price_per_byte.unwrap_or(settings.price_per_byte)),
                Amount::from(balance.unwrap_or(settings.initial_balance)),
            ));
            run_upload(&mut browser, network).await?;
        }
        Command::Config {
            gateway,
            price_per_byte,
            initial_balance,
        } => run_config(settings, gateway, price_per_byte, initial_balance)?,
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Remember a root after checking it can be opened.
async fn run_choose(path: &Path) -> Result<()> {
    let dir = LocalDirectory::open(path)
        .await
        .with_context(|| format!("Cannot open {}", path.display()))?;
    let store = RootStore::user().ok_or_else(|| eyre!("No config directory"))?;
    store
        .put(dir.path())
        .with_context(|| format!("Failed to write {}", store.location().display()))?;
    info!(store = %store.location().display(), "root remembered");
    eprintln!("Root set to {}", dir.path().display());
    Ok(())
}

/// Open the root and walk down to `at`.
async fn open_browser(root: Option<PathBuf>, settings: &Settings, at: &str) -> Result<Browser> {
    let root = match root {
        Some(root) => root,
        None => RootStore::user()
            .and_then(|store| store.get())
            .ok_or_else(|| eyre!("No root chosen. Run `permaupload choose <PATH>` or pass --root"))?,
    };

    debug!(root = %root.display(), at, "opening root");
    let dir = LocalDirectory::open(&root)
        .await
        .with_context(|| format!("Cannot open root {}", root.display()))?;

    let mut browser = Browser::new(dir.into_ref()).with_gateway(settings.gateway.clone());
    for name in at.split('/').filter(|s| !s.is_empty()) {
        browser
            .cursor_mut()
            .descend(name)
            .await
            .with_context(|| format!("Cannot enter {name}"))?;
    }
    browser.refresh().await.context("Listing failed")?;
    Ok(browser)
}

#[derive(Serialize)]
struct ListingRow<'a> {
    name: &'a str,
    is_dir: bool,
    size: Option<u64>,
    content_type: Option<&'a str>,
    id: Option<&'a str>,
    url: Option<&'a str>,
}

fn print_listing(browser: &Browser, format: OutputFormat) -> Result<()> {
    let rows: Vec<ListingRow<'_>> = browser
        .entries()
        .iter()
        .map(|entry| {
            let info = browser.manifest_info().get(entry.name());
            ListingRow {
                name: entry.name(),
                is_dir: entry.is_dir(),
                size: entry.file().map(|f| f.size),
                content_type: entry.file().map(|f| f.content_type.as_str()),
                id: info.map(|i| i.id.as_str()),
                url: info.map(|i| i.url.as_str()),
            }
        })
        .collect();

    match format {
        OutputFormat::Text => {
            println!();
            println!(" {}", browser.path_items().join(" / "));
            if let Some(manifest_id) = browser.manifest_id() {
                println!(" manifest {manifest_id}");
            }
            println!("{}", "─".repeat(70));
            for (row, entry) in rows.iter().zip(browser.entries()) {
                print_entry(row, entry);
            }
            println!();
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}

fn print_entry(row: &ListingRow<'_>, entry: &DirectoryEntry) {
    match entry {
        DirectoryEntry::Directory(_) => println!("   {}/", row.name),
        DirectoryEntry::File { .. } => println!(
            "   {:<36} {:>10}  {}",
            truncate(row.name, 36),
            format_size(row.size.unwrap_or(0)),
            row.url.unwrap_or("-")
        ),
    }
}

fn build_collect_config(
    exclude: &[String],
    max_depth: Option<u32>,
    include_hidden: bool,
) -> Result<CollectConfig> {
    let mut builder = CollectConfig::builder();
    builder.include_hidden(include_hidden);

    if !exclude.is_empty() {
        let patterns = exclude
            .iter()
            .map(|glob| {
                ExcludePattern::glob(glob).with_context(|| format!("Invalid exclude pattern {glob:?}"))
            })
            .collect::<Result<Vec<_>>>()?;
        builder.exclude_patterns(patterns);
    }
    if let Some(depth) = max_depth {
        builder.max_depth(depth);
    }

    builder.build().context("Invalid collect options")
}

#[derive(Serialize)]
struct CollectReport<'a> {
    files: Vec<CollectedFile<'a>>,
    total_size: u64,
    skipped: &'a [String],
    warnings: &'a [CollectWarning],
}

#[derive(Serialize)]
struct CollectedFile<'a> {
    path: &'a str,
    size: u64,
    content_type: &'a str,
}

async fn run_collect(browser: &mut Browser, config: &CollectConfig, format: OutputFormat) -> Result<()> {
    eprintln!("Collecting {}...", browser.cursor().full_path());
    let files = collect(browser.cursor_mut(), config)
        .await
        .context("Collection failed")?;

    match format {
        OutputFormat::Text => {
            println!();
            println!("{}", "─".repeat(70));
            println!(
                " {} files, {}",
                files.file_count(),
                format_size(files.total_size)
            );
            println!("{}", "─".repeat(70));
            for staged in &files.files {
                println!(
                    "   {:<48} {:>10}",
                    truncate(&staged.path, 48),
                    format_size(staged.size())
                );
            }
            if !files.skipped.is_empty() {
                println!();
                println!(" Skipped: {}", files.skipped.join(", "));
            }
            if files.has_warnings() {
                println!();
                println!(" {} warning(s) during collection", files.warnings.len());
                for warning in &files.warnings {
                    println!("   {}: {}", warning.path, warning.message);
                }
            }
            println!();
        }
        OutputFormat::Json => {
            let report = CollectReport {
                files: files
                    .files
                    .iter()
                    .map(|f| CollectedFile {
                        path: &f.path,
                        size: f.size(),
                        content_type: &f.file.content_type,
                    })
                    .collect(),
                total_size: files.total_size,
                skipped: &files.skipped,
                warnings: &files.warnings,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

async fn run_upload(browser: &mut Browser, network: Arc<DryRunNetwork>) -> Result<()> {
    eprintln!("Uploading {} (dry run)...", browser.cursor().full_path());

    let pipeline = UploadPipeline::new(network.clone(), network)
        .with_completion_hook(|manifest_id| eprintln!("Upload complete: {manifest_id}"));

    let outcome = pipeline
        .run(Some(&mut *browser))
        .await
        .context("Upload failed")?
        .ok_or_else(|| eyre!("Nothing to upload"))?;

    println!();
    println!("{}", "─".repeat(70));
    println!(
        " {} files, {}, price {}",
        outcome.file_count,
        format_size(outcome.total_size),
        outcome.price
    );
    if let Some(funded) = outcome.funded {
        println!(" funded {funded}");
    }
    println!(" manifest {}", outcome.manifest_id);
    println!(
        " {}/{}",
        browser.gateway().trim_end_matches('/'),
        outcome.manifest_id
    );
    println!("{}", "─".repeat(70));
    println!();
    Ok(())
}

fn run_config(
    mut settings: Settings,
    gateway: Option<String>,
    price_per_byte: Option<u64>,
    initial_balance: Option<u64>,
) -> Result<()> {
    let changed = gateway.is_some() || price_per_byte.is_some() || initial_balance.is_some();
    if let Some(gateway) = gateway {
        settings.gateway = gateway;
    }
    if let Some(price) = price_per_byte {
        settings.price_per_byte = price;
    }
    if let Some(balance) = initial_balance {
        settings.initial_balance = balance;
    }

    if changed {
        settings.save().context("Failed to save settings")?;
        info!("settings saved");
    }

    print!("{}", toml::to_string_pretty(&settings)?);
    if let Some(path) = Settings::config_path() {
        eprintln!("({})", path.display());
    }
    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Truncate a string to max length.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 1).collect();
        format!("{kept}…")
    }
}
