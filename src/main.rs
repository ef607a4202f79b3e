//! Asset-Sweep main entry point
//!
//! This is the command-line interface for the Asset-Sweep resolver.

use anyhow::{bail, Context};
use asset_sweep::catalog::{matcher_for, KeywordClassifier};
use asset_sweep::config::{load_config_with_hash, Config};
use asset_sweep::merge::DiscoveryMerger;
use asset_sweep::output::{generate_markdown_summary, load_statistics, print_statistics};
use asset_sweep::resolver::{plan_candidates, run_resolve};
use asset_sweep::storage::{open_ledger, CatalogStore, JsonCatalogStore};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Asset-Sweep: a concurrent asset resolver for game catalogs
///
/// Asset-Sweep probes candidate image locations for every game in a
/// catalog, downloads the best match per asset kind, and records the local
/// paths back into the catalog. It can also fold discovery pass files into
/// the catalog.
#[derive(Parser, Debug)]
#[command(name = "asset-sweep")]
#[command(version)]
#[command(about = "A concurrent asset resolver for game catalogs", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the candidate space without probing
    #[arg(long, conflicts_with_all = ["stats", "export_summary", "merge_pass"])]
    dry_run: bool,

    /// Show statistics of the latest run from the ledger and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary", "merge_pass"])]
    stats: bool,

    /// Generate a markdown summary of the latest run and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "merge_pass"])]
    export_summary: bool,

    /// Fold discovery pass files into the catalog instead of resolving
    #[arg(long, value_name = "FILE", num_args = 1..)]
    merge_pass: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else if !cli.merge_pass.is_empty() {
        handle_merge_pass(&config, &cli.merge_pass)?;
    } else {
        handle_resolve(config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("asset_sweep=info,warn"),
            1 => EnvFilter::new("asset_sweep=debug,info"),
            2 => EnvFilter::new("asset_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and reports the candidate space
///
/// Reads the catalog but never touches the network, the asset directory or
/// the ledger.
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Asset-Sweep Dry Run ===\n");

    println!("Resolver Configuration:");
    println!("  Languages: {}", config.resolver.languages.join(", "));
    println!("  Probe workers: {}", config.resolver.probe_workers);
    println!("  Fetch workers: {}", config.resolver.fetch_workers);
    println!("  Entity workers: {}", config.resolver.entity_workers);
    println!(
        "  Timeouts: probe {}ms, fetch {}ms",
        config.resolver.probe_timeout_ms, config.resolver.fetch_timeout_ms
    );
    if let Some(deadline) = config.resolver.deadline_secs {
        println!("  Deadline: {}s", deadline);
    }

    println!("\nRemote:");
    println!("  Base URL: {}", config.remote.base_url);
    println!("  User agent: {}", config.remote.user_agent);

    println!("\nStorage:");
    println!("  Catalog: {}", config.storage.catalog_path);
    println!("  Assets: {}", config.storage.asset_dir);
    println!("  Ledger: {}", config.storage.ledger_path);

    let catalog = JsonCatalogStore::new(&config.storage.catalog_path)
        .load()
        .context("Failed to load catalog")?;
    let plans = plan_candidates(config, &catalog)?;

    println!("\nEntities ({}):", plans.len());
    for plan in &plans {
        if plan.missing.is_empty() {
            println!("  - {}: complete", plan.entity_id);
        } else {
            let missing: Vec<&str> = plan.missing.iter().map(|k| k.to_db_string()).collect();
            println!(
                "  - {}: {} candidates for {}",
                plan.entity_id,
                plan.candidates,
                missing.join(", ")
            );
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would probe at most {} candidates across {} entities",
        plans.iter().map(|p| p.candidates).sum::<usize>(),
        plans.iter().filter(|p| !p.missing.is_empty()).count()
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the ledger
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let path = Path::new(&config.storage.ledger_path);
    println!("Ledger: {}\n", path.display());

    if !path.exists() {
        bail!("Ledger {} does not exist; run a resolution first", path.display());
    }

    let ledger = open_ledger(path)?;
    let stats = load_statistics(&ledger)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config) -> anyhow::Result<()> {
    let ledger_path = Path::new(&config.storage.ledger_path);
    let summary_path = Path::new(&config.storage.summary_path);

    println!("=== Exporting Resolution Summary ===\n");
    println!("Ledger: {}", ledger_path.display());
    println!("Output: {}", summary_path.display());
    println!();

    if !ledger_path.exists() {
        bail!("Ledger {} does not exist; run a resolution first", ledger_path.display());
    }

    let ledger = open_ledger(ledger_path)?;

    tracing::info!("Loading run data from ledger...");
    let stats = load_statistics(&ledger)?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&stats, summary_path)?;

    println!("✓ Summary exported to: {}", summary_path.display());

    Ok(())
}

/// Handles the --merge-pass mode: folds discovery pass files into the catalog
fn handle_merge_pass(config: &Config, files: &[PathBuf]) -> anyhow::Result<()> {
    let store = JsonCatalogStore::new(&config.storage.catalog_path);
    let mut catalog = store.load().context("Failed to load catalog")?;

    let merger = DiscoveryMerger::new(
        matcher_for(&config.merge),
        Box::new(KeywordClassifier::default()),
    );

    for file in files {
        if !file.exists() {
            bail!("Discovery pass {} does not exist", file.display());
        }
        let records = JsonCatalogStore::new(file)
            .load()
            .with_context(|| format!("Failed to read discovery pass {}", file.display()))?
            .into_entities();

        tracing::info!("Merging {} records from {}", records.len(), file.display());
        let report = merger.fold(&mut catalog, records);
        println!(
            "{}: {} created, {} updated, {} unchanged, {} rejected",
            file.display(),
            report.created,
            report.updated,
            report.unchanged,
            report.rejected
        );
    }

    store.save(&catalog).context("Failed to save catalog")?;
    println!("✓ Catalog saved: {} entities", catalog.len());

    Ok(())
}

/// Handles the main resolution run
async fn handle_resolve(config: Config, config_hash: String) -> anyhow::Result<()> {
    tracing::info!(
        "Languages: {}, windows: {}, keyword ranges: {}",
        config.resolver.languages.join(", "),
        config.windows.len(),
        config.keyword_ranges.len()
    );

    match run_resolve(config, config_hash).await {
        Ok(summary) => {
            summary.print_summary();
            Ok(())
        }
        Err(e) => {
            tracing::error!("Resolution failed: {}", e);
            Err(e.into())
        }
    }
}
