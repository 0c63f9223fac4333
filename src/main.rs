use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use gofetch::{Api, Catalog, Config, DownloadEntry, Platform};

/// Upgrades the currently installed version of Go.
#[derive(Debug, Parser)]
#[command(
    name = "gofetch",
    version,
    after_help = concat!(
        "Examples:\n",
        "  Install Go version 1.19.4:\n",
        "    gofetch 1.19.4\n\n",
        "  Show archived Go download options:\n",
        "    gofetch -la"
    )
)]
struct Cli {
    /// Version to install: an exact version, or latest/stable/featured/unstable
    #[arg(value_name = "VERSION")]
    request: Option<String>,

    /// Include archived Go versions
    #[arg(short, long)]
    archived: bool,

    /// Install the featured version
    #[arg(short, long)]
    featured: bool,

    /// Available Go versions
    #[arg(short, long = "ls")]
    list: bool,

    /// Print the listing as JSON
    #[arg(long, requires = "list")]
    json: bool,

    /// Toolchain directory to replace (defaults to GOROOT)
    #[arg(long, value_name = "PATH")]
    goroot: Option<PathBuf>,

    /// Page listing the downloads
    #[arg(long, value_name = "URL")]
    downloads_url: Option<String>,

    /// Don't draw a download progress bar
    #[arg(long)]
    no_progress: bool,

    /// More log output on stderr (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn token(&self) -> Option<&str> {
        match (&self.request, self.featured) {
            (Some(v), _) => Some(v.as_str()),
            (None, true) => Some("latest"),
            (None, false) => None,
        }
    }

    fn config(&self) -> Config {
        let mut config = Config::new();
        if let Some(url) = &self.downloads_url {
            config = config.set_downloads_url(url);
        }
        if let Some(root) = &self.goroot {
            config = config.set_install_root(root);
        }
        if self.no_progress {
            config = config.no_progress();
        }
        config
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "gofetch=warn",
        1 => "gofetch=info",
        2 => "gofetch=debug",
        _ => "gofetch=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if !cli.list && cli.token().is_none() {
        // help goes to stdout; a failed write leaves nothing else to report
        let _ = Cli::command().print_help();
        println!();
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_not_found() => {
            println!("{e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "gofetch failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> gofetch::Result<()> {
    let api = Api::new(cli.config())?;
    let catalog = api.catalog()?;

    if cli.list {
        return show_available(&catalog, api.host(), cli.archived, cli.json);
    }

    let token = cli.token().unwrap_or_default();
    let entry = api.resolve(&catalog, token)?;

    println!(
        "installing version {} ({})",
        entry.version().unwrap_or_default(),
        entry.url()
    );
    let report = api.install(entry)?;
    println!(
        "installed version {} locally to {}",
        report.version.as_deref().unwrap_or_default(),
        report.destination.display()
    );
    Ok(())
}

fn show_available(
    catalog: &Catalog,
    host: &Platform,
    archived: bool,
    json: bool,
) -> gofetch::Result<()> {
    let entries: Vec<&DownloadEntry> = catalog.listing(host, archived).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in entries {
        println!("{}", listing_line(entry));
    }
    println!();
    Ok(())
}

fn listing_line(entry: &DownloadEntry) -> String {
    let marker = if entry.is_unstable() {
        "(unstable)"
    } else if entry.is_featured() {
        "(featured)"
    } else {
        ""
    };

    let version = entry.version().unwrap_or_default();
    let spacing = if version.len() >= 8 { "\t" } else { "\t\t" };
    format!("{version}{spacing}[{}] {marker}", entry.platform_label())
}
