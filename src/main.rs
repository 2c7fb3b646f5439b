use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use browser_data_export::browsing_data::{BrowsingData, OutputFormat, Registry, Status};
use browser_data_export::item::{parse_item_list, BrowserFamily, Item};

#[derive(Parser)]
#[command(name = "browser-data-export")]
#[command(about = "Extract, decrypt and export browser data", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export data from one browser profile
    Export {
        /// Browser profile directory (e.g. ~/.config/google-chrome/Default)
        #[arg(short, long)]
        profile_dir: PathBuf,

        /// Label used as the output file prefix
        #[arg(short, long, default_value = "Chrome")]
        browser_name: String,

        /// Items to export (comma-separated). Overrides --family
        #[arg(short, long)]
        items: Option<String>,

        /// Browser family whose items are all exported: chromium, yandex, firefox
        #[arg(long, default_value = "chromium")]
        family: String,

        /// Output format: json, anything else is csv
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output directory
        #[arg(short, long, default_value = "results")]
        dir: PathBuf,

        /// Base64 master key used to decrypt encrypted fields
        #[arg(short = 'k', long, env = "BROWSER_MASTER_KEY", default_value = "")]
        master_key: String,

        /// Exit with an error if any item failed
        #[arg(long)]
        strict: bool,
    },

    /// List every known item
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    match cli.command {
        Commands::Export {
            profile_dir,
            browser_name,
            items,
            family,
            format,
            dir,
            master_key,
            strict,
        } => {
            let items: Vec<Item> = match items {
                Some(list) => parse_item_list(&list)?,
                None => family
                    .parse::<BrowserFamily>()
                    .context("Invalid browser family")?
                    .items()
                    .to_vec(),
            };
            if items.is_empty() {
                bail!("No items selected");
            }

            let master_key = STANDARD
                .decode(master_key.trim())
                .context("Master key is not valid base64")?;
            if master_key.is_empty() {
                warn!("⚠️  No master key given; encrypted fields will fail to decrypt");
            }

            let registry = Registry::builtin(profile_dir.clone());
            let mut data = BrowsingData::new(&items, &registry);
            info!(
                "📖 Reading {} items from {}",
                data.len(),
                profile_dir.display()
            );

            let recovery = data.recovery(&master_key);
            let export = data.export(&dir, &browser_name, OutputFormat::from_flag(&format));

            let exported = export.succeeded().count();
            let failed = recovery.failures().count() + export.failures().count();
            info!("📊 Exported {} files, {} failures", exported, failed);
            for outcome in recovery.failures().chain(export.failures()) {
                if let Status::Failed(reason) = &outcome.status {
                    warn!("  ❌ {} ({}): {}", outcome.item, outcome.name, reason);
                }
            }

            if strict && failed > 0 {
                bail!("{} items failed", failed);
            }
        }

        Commands::List => {
            let registry = Registry::builtin(PathBuf::new());
            for family in [BrowserFamily::Chromium, BrowserFamily::Yandex, BrowserFamily::Firefox] {
                println!("{}:", family.name());
                for item in family.items() {
                    let note = if registry.contains(*item) { "" } else { " (not supported)" };
                    println!("  {:<26} {}{}", item.id(), item.store_files().join(" | "), note);
                }
            }
        }
    }

    Ok(())
}
