//! Misconfig Mapper CLI

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use misconfig_mapper::config::{self, ScanOverrides};
use misconfig_mapper::error::MapperError;
use misconfig_mapper::models::{ScanConfig, Verbosity};
use misconfig_mapper::report::text::{services_table, summary_table};
use misconfig_mapper::report::{JsonLinesReporter, Reporter, TextReporter};
use misconfig_mapper::scanner::{targets, ScanEngine};
use misconfig_mapper::templates::loader::catalog_path;
use misconfig_mapper::templates::{load_catalog, select_services, update, ServiceTemplate};

/// Misconfig Mapper - find exposed and misconfigured third-party services of an organization
#[derive(Parser)]
#[command(name = "misconfig-mapper", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a target for exposed or misconfigured services
    Scan {
        /// Company/organization name ("intigriti"), domain, or a file with one target per line
        #[arg(short, long)]
        target: String,

        /// Service ids or slugs, comma-separated ("0,1"), or "*" for all services
        #[arg(short, long)]
        service: Option<String>,

        /// Look for permutations of the target (cannot be combined with --as-domain)
        #[arg(long)]
        permutations: Option<String>,

        /// Treat the target as a domain (cannot be combined with --permutations)
        #[arg(long)]
        as_domain: Option<String>,

        /// Only check for existing instances, skipping misconfiguration checks
        #[arg(long)]
        skip_misconfiguration_checks: Option<String>,

        /// Request headers separated by double semicolons ("User-Agent: xyz;; Cookie: xyz")
        #[arg(short = 'H', long)]
        headers: Option<String>,

        /// Delay between requests in milliseconds
        #[arg(long)]
        delay: Option<u64>,

        /// Request timeout in milliseconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Maximum number of redirects to follow
        #[arg(long)]
        max_redirects: Option<usize>,

        /// Number of candidates probed concurrently
        #[arg(long)]
        threads: Option<usize>,

        /// Skip TLS certificate verification
        #[arg(long)]
        skip_ssl: bool,

        /// Templates directory (holding services.json)
        #[arg(long)]
        templates: Option<String>,

        /// Print results as JSON lines
        #[arg(long)]
        output_json: bool,

        /// Verbosity: 0 (silent, hits only), 1 (default), 2 (log everything)
        #[arg(short, long)]
        verbose: Option<u8>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List available services with their ids
    Services {
        /// Templates directory (holding services.json)
        #[arg(long)]
        templates: Option<String>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Pull the latest service templates
    Update {
        /// Templates directory (holding services.json)
        #[arg(long)]
        templates: Option<String>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn base_config(config_path: Option<&Path>) -> Result<ScanConfig, MapperError> {
    if let Some(path) = config_path {
        return config::load_config(path);
    }
    let default_path = Path::new("config/default.toml");
    if default_path.exists() {
        config::load_config(default_path)
    } else {
        Ok(ScanConfig::default())
    }
}

fn init_logging(verbosity: Verbosity) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Loads the local catalog, pulling a fresh copy once if it is missing or broken
async fn load_services(templates_dir: &Path) -> Result<Vec<ServiceTemplate>, MapperError> {
    let path = catalog_path(templates_dir);
    match load_catalog(&path) {
        Ok(services) => Ok(services),
        Err(e) => {
            warn!("Failed to load services ({e}), pulling latest templates");
            update::update_catalog(templates_dir).await?;
            load_catalog(&path)
        }
    }
}

async fn scan(config: ScanConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    if config.target.trim().is_empty() {
        return Err(MapperError::Config("no target specified, use --target".to_string()).into());
    }

    let services = load_services(Path::new(&config.templates_dir)).await?;
    let selected = select_services(&config.services, &services);
    if selected.is_empty() {
        eprintln!(
            "{} Service ID {:?} does not match any integrated service!\n\nAvailable Services:",
            "[-] Error:".red().bold(),
            config.services
        );
        eprintln!("{}", services_table(&services));
        return Err(MapperError::Config("no services selected".to_string()).into());
    }
    info!("{} services selected", selected.len());

    let seeds = targets::resolve_seeds(&config.target)?;
    let candidates = targets::generate(&seeds, config.permutations);
    info!("Checking {} possible targets", candidates.len());

    let engine = ScanEngine::from_config(&config)?;
    let reporter: Box<dyn Reporter> = if config.json {
        Box::new(JsonLinesReporter::stdout())
    } else {
        Box::new(TextReporter::new(engine.mode(), config.verbosity))
    };

    let summary = tokio::select! {
        summary = engine.run(&selected, &candidates, reporter.as_ref()) => summary,
        _ = tokio::signal::ctrl_c() => {
            warn!("Scan interrupted");
            return Ok(());
        }
    };

    if !config.json && config.verbosity >= Verbosity::Normal {
        println!("\n{}", summary_table(&summary));
    }

    Ok(())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            target,
            service,
            permutations,
            as_domain,
            skip_misconfiguration_checks,
            headers,
            delay,
            timeout,
            max_redirects,
            threads,
            skip_ssl,
            templates,
            output_json,
            verbose,
            config: config_path,
        } => {
            let mut scan_config = base_config(config_path.as_deref())?;
            config::merge_cli_args(
                &mut scan_config,
                ScanOverrides {
                    target,
                    services: service,
                    permutations,
                    as_domain,
                    skip_checks: skip_misconfiguration_checks,
                    headers,
                    delay_ms: delay,
                    timeout_ms: timeout,
                    max_redirects,
                    threads,
                    skip_ssl,
                    templates_dir: templates,
                    json: output_json,
                    verbosity: verbose,
                },
            );
            init_logging(scan_config.verbosity);

            scan(scan_config).await?;
        }

        Commands::Services {
            templates,
            config: config_path,
        } => {
            let mut scan_config = base_config(config_path.as_deref())?;
            if let Some(dir) = templates {
                scan_config.templates_dir = dir;
            }
            init_logging(scan_config.verbosity);

            let services = load_services(Path::new(&scan_config.templates_dir)).await?;
            println!("  {} {}\n", "Services loaded:".bold(), services.len().to_string().cyan());
            println!("{}", services_table(&services));
        }

        Commands::Update {
            templates,
            config: config_path,
        } => {
            let mut scan_config = base_config(config_path.as_deref())?;
            if let Some(dir) = templates {
                scan_config.templates_dir = dir;
            }
            init_logging(scan_config.verbosity);

            let path = update::update_catalog(Path::new(&scan_config.templates_dir)).await?;
            println!("  {} {}", "Templates saved to:".bold(), path.display().to_string().green());
        }
    }

    Ok(())
}
