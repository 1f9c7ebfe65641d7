use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use extprobe::{
    config::Config,
    error::ScanError,
    loader::{HttpLoader, LoaderKind, ProfileLoader, ResourceLoader},
    model::Browser,
    output::{format_report_to_string, print_report, OutputFormat, TerminalObserver},
    platform, DatasetSource, ScanEngine,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
}

#[derive(Parser)]
#[command(name = "extprobe")]
#[command(
    author,
    version,
    about = "Detect installed browser extensions by probing their web-accessible resources"
)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe every candidate and report the detected extensions
    Scan(ScanArgs),

    /// List browsers with a known profile location
    ListBrowsers,

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(clap::Args)]
struct ScanArgs {
    /// Candidate list (path or http(s) URL)
    #[arg(long)]
    candidates: Option<String>,

    /// Metadata dataset (path or http(s) URL)
    #[arg(long)]
    metadata: Option<String>,

    /// Resource loader (profile, http)
    #[arg(long)]
    loader: Option<String>,

    /// Profile, user data or Extensions directory
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Browser whose default profile is scanned
    #[arg(long)]
    browser: Option<String>,

    /// Origin serving extension resources for the http loader
    #[arg(long)]
    base_url: Option<String>,

    /// URL scheme of extension resources
    #[arg(long)]
    scheme: Option<String>,

    /// Probes in flight per batch
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Per-probe deadline in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Pause between batches in milliseconds
    #[arg(long)]
    batch_pause_ms: Option<u64>,

    /// Output format (table, json, html)
    #[arg(short, long)]
    format: Option<String>,

    /// Write output to file (table format is written as JSON)
    #[arg(short, long)]
    output: Option<String>,

    /// Hide the live progress display
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Commands::Scan(args) => {
            let config = apply_overrides(Config::load()?, &args)?;
            run_scan(config, args).await
        }
        Commands::ListBrowsers => {
            list_browsers();
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

/// Layers command-line flags over the loaded configuration.
fn apply_overrides(mut config: Config, args: &ScanArgs) -> Result<Config> {
    if let Some(candidates) = &args.candidates {
        config.candidates = candidates.clone();
    }
    if let Some(metadata) = &args.metadata {
        config.metadata = metadata.clone();
    }
    if let Some(kind) = &args.loader {
        config.loader.kind = LoaderKind::from_str(kind).map_err(|e| anyhow!(e))?;
    }
    if let Some(profile) = &args.profile {
        config.loader.profile = Some(profile.clone());
    }
    if let Some(browser) = &args.browser {
        config.loader.browser = Some(Browser::from_str(browser).map_err(|e| anyhow!(e))?);
    }
    if let Some(base_url) = &args.base_url {
        config.loader.base_url = Some(base_url.clone());
    }
    if let Some(scheme) = &args.scheme {
        config.scheme = scheme.clone();
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if let Some(batch_pause_ms) = args.batch_pause_ms {
        config.batch_pause_ms = batch_pause_ms;
    }
    if let Some(format) = &args.format {
        config.default_format = format.clone();
    }

    config.validate()?;
    Ok(config)
}

fn build_loader(config: &Config) -> Result<Arc<dyn ResourceLoader>> {
    match config.loader.kind {
        LoaderKind::Http => {
            let base_url = config
                .loader
                .base_url
                .clone()
                .ok_or_else(|| anyhow!("--base-url is required with --loader http"))?;
            Ok(Arc::new(HttpLoader::new(base_url)?))
        }
        LoaderKind::Profile => {
            let loader = match (&config.loader.profile, config.loader.browser) {
                (Some(dir), _) => ProfileLoader::discover(dir),
                (None, browser) => {
                    let browser = browser.unwrap_or(Browser::Chrome);
                    ProfileLoader::for_browser(browser).ok_or_else(|| {
                        anyhow!(
                            "No {} profile found. Pass --profile to point at one.",
                            browser.display_name()
                        )
                    })?
                }
            };

            if loader.extension_dirs().is_empty() {
                bail!("No Extensions directory found in the selected profile");
            }
            debug!(dirs = ?loader.extension_dirs(), "profile loader ready");
            Ok(Arc::new(loader))
        }
    }
}

async fn run_scan(config: Config, args: ScanArgs) -> Result<u8> {
    let format = OutputFormat::from_str(&config.default_format).map_err(|e| anyhow!(e))?;
    let interactive = format == OutputFormat::Table && !args.quiet;

    let loader = build_loader(&config)?;
    info!(loader = loader.name(), "starting scan");

    let engine = ScanEngine::new(config.scan_settings(), loader);
    let observer = TerminalObserver::new(interactive);
    let candidates: DatasetSource = config.candidates_source();
    let metadata: DatasetSource = config.metadata_source();

    let report = match engine.run(&candidates, &metadata, &observer).await {
        Ok(report) => report,
        Err(e @ ScanError::DatasetLoad(_)) => {
            eprintln!("{}", e);
            eprintln!(
                "Serve the datasets from a reachable origin or pass readable paths with \
                 --candidates and --metadata."
            );
            return Ok(exit_codes::ERROR);
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(path) = args.output {
        let content = format_report_to_string(&report, format)?;
        std::fs::write(&path, content)?;
        if interactive {
            println!("Results written to: {}", path);
        }
    } else {
        print_report(&report, format)?;
    }

    Ok(exit_codes::SUCCESS)
}

fn list_browsers() {
    println!("Known browsers:");
    println!();

    for browser in Browser::ALL {
        let location = platform::browser_user_data_dir(browser);
        let found = location
            .as_ref()
            .map(|dir| !platform::find_extension_dirs(dir).is_empty())
            .unwrap_or(false);

        println!(
            "  {:<10} {:<18} [found: {}]",
            browser.as_str(),
            browser.display_name(),
            if found { "yes" } else { "no" }
        );
        match location {
            Some(dir) => println!("  {:<10} Location: {}", "", dir.display()),
            None => println!("  {:<10} Location: unknown on this platform", ""),
        }
        println!();
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'extprobe config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
