use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use vendor_check::check::{StrategyResolver, UpdateChecker};
use vendor_check::config::{self, CheckConfig, DEFAULT_CACHE_TTL_SECS, DEFAULT_REGISTRY_URL};
use vendor_check::discovery::load_private_repos;
use vendor_check::parser::read_installed_packages;
use vendor_check::report::{self, OutputFormat, ProgressReporter};
use vendor_check::version::cache::ResultCache;
use vendor_check::version::fetcher::HttpFetcher;
use vendor_check::version::lookup::VersionLookup;
use vendor_check::version::patterns::PatternCatalog;

#[derive(Parser)]
#[command(name = "vendor-check")]
#[command(
    version,
    about = "Check installed Composer packages against vendor sites, private repositories and Packagist"
)]
struct Cli {
    /// Path to composer.lock
    #[arg(short, long, default_value = "./composer.lock")]
    path: PathBuf,

    /// Only check these packages (comma separated)
    #[arg(long, value_delimiter = ',')]
    packages: Vec<String>,

    /// Check a single vendor page URL instead of a lock file
    #[arg(short, long)]
    url: Option<String>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Shorthand for --format=json
    #[arg(short, long)]
    json: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Neither read nor write the result cache
    #[arg(long)]
    no_cache: bool,

    /// Delete cached results before checking
    #[arg(long)]
    clear_cache: bool,

    /// Cache lifetime in seconds
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS)]
    cache_ttl: i64,

    /// Package configuration file (JSON); the bundled one is used otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs to the data directory instead of stderr
    #[arg(long)]
    log_file: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }

    fn package_filter(&self) -> Vec<String> {
        self.packages
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

fn open_log_file(dir: &Path) -> anyhow::Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(config::LOG_FILE_NAME)
        .build(dir)
        .with_context(|| format!("opening log file in {}", dir.display()))
}

fn init_tracing(verbose: u8, log_file: bool) -> anyhow::Result<WorkerGuard> {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if log_file {
        let appender = open_log_file(&config::data_dir())?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(writer))
            .with(filter)
            .init();
        return Ok(guard);
    }

    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_target(false))
        .with(filter)
        .init();

    Ok(guard)
}

async fn check_single_url(lookup: &VersionLookup, url: &str, cli: &Cli) -> anyhow::Result<i32> {
    let json = cli.output_format() == OutputFormat::Json;

    match lookup.vendor_page_version(url, None).await {
        Ok(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Checking vendor URL: {}\n", url);
                println!("{}", report::format_lookup(&result, cli.verbose > 0));
            }
            Ok(0)
        }
        Err(e) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({ "error": e.to_string() }))?
                );
            } else {
                eprintln!("Error: {}", e);
            }
            Ok(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let format = cli.output_format();
    let config = CheckConfig::load(cli.config.as_deref()).context("loading package configuration")?;

    let fetcher = Arc::new(HttpFetcher::new());
    let lookup = VersionLookup::new(
        fetcher,
        DEFAULT_REGISTRY_URL,
        Arc::new(PatternCatalog::builtin()),
    );

    if let Some(url) = &cli.url {
        return check_single_url(&lookup, url, &cli).await;
    }

    let packages = match read_installed_packages(&cli.path) {
        Ok(packages) => packages,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(2);
        }
    };

    let project_dir = config::lock_dir(&cli.path);
    let private_repos = load_private_repos(&project_dir, &packages, &config)?;
    info!(
        "{} installed packages, {} served by private repositories",
        packages.len(),
        private_repos.len()
    );

    let cache = if cli.no_cache {
        None
    } else {
        let mut cache = ResultCache::new(&config::cache_dir_for(&cli.path), cli.cache_ttl);
        if cli.clear_cache {
            cache.clear().context("clearing result cache")?;
            if format == OutputFormat::Table {
                eprintln!("Cache cleared.");
            }
        }
        Some(cache)
    };

    let filter = cli.package_filter();
    let mut checker = UpdateChecker::new(
        StrategyResolver::new(&config, private_repos),
        lookup,
        cache,
        packages,
    );

    let mut progress = (format == OutputFormat::Table || cli.output.is_some()).then(|| {
        eprintln!("Checking packages from: {}\n", cli.path.display());
        ProgressReporter::new(std::io::stderr(), checker.selected_packages(&filter).len())
    });

    let records = checker
        .check_with_progress(&filter, |record| {
            if let Some(progress) = progress.as_mut() {
                progress.advance(record);
            }
        })
        .await;

    if let Some(progress) = progress.as_mut() {
        progress.finish();
    }

    let formatted = report::format(&records, format)?;
    match &cli.output {
        Some(path) => {
            report::write_to_file(&formatted, path)
                .with_context(|| format!("writing report to {}", path.display()))?;
            eprintln!("Results written to: {}", path.display());
        }
        None => println!("{}", formatted),
    }

    Ok(report::exit_code(&records))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let guard = init_tracing(cli.verbose, cli.log_file)?;
    if cli.log_file {
        eprintln!("Logging to {}", config::log_path().display());
    }

    let code = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))?;

    drop(guard);
    std::process::exit(code);
}
