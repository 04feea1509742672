use clap::Parser;
use snap_fetch::{resolve_bound, Bound, FetchConfig, Fetcher, HttpRemote, RetryPolicy, TimeRange};
use std::{
    error::Error,
    io::{self, BufRead, Write},
    path::PathBuf,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

/// Download timestamped images captured inside a time window.
///
/// Dates accept YYYYMMDD, YYMMDD, MMDD, DD, empty (today) or -N (N days ago).
/// Times accept HHMMSS, HHMM, HH, empty (start of day / end of day or now) or -N (N hours ago).
/// Any of the four window values not given as a flag is asked for interactively.
#[derive(Parser, Debug)]
#[command(name = "snap_fetch", version)]
struct Cli {
    #[arg(long, allow_hyphen_values = true)]
    start_date: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    start_time: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    end_date: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    end_time: Option<String>,

    /// Where files are saved [default: download/ next to the executable]
    #[arg(long)]
    download_dir: Option<PathBuf>,

    #[arg(long)]
    owner: Option<String>,

    #[arg(long)]
    repo: Option<String>,

    #[arg(long)]
    branch: Option<String>,

    /// Directory inside the repository that holds the images
    #[arg(long)]
    path: Option<String>,

    /// Full listing URL, overriding the one derived from the repository
    #[arg(long)]
    listing_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,

    /// Attempts per URL before moving to the next source
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,
}

impl Cli {
    fn config(&self) -> FetchConfig {
        let mut config = FetchConfig::default();

        if let Some(dir) = &self.download_dir {
            config.download_dir = dir.clone();
        }
        if let Some(owner) = &self.owner {
            config.owner = owner.clone();
        }
        if let Some(repo) = &self.repo {
            config.repo = repo.clone();
        }
        if let Some(branch) = &self.branch {
            config.branch = branch.clone();
        }
        if let Some(path) = &self.path {
            config.path = path.clone();
        }
        config.listing_url = self.listing_url.clone();
        config.request_timeout = Duration::from_secs(self.timeout_secs);
        config.accept_invalid_certs = self.insecure;
        config.retry = RetryPolicy {
            total_attempts: self.retries,
            ..RetryPolicy::default()
        };

        config
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Use the flag value if present, otherwise ask on stdin.
fn value_or_prompt(value: &Option<String>, prompt: &str) -> io::Result<String> {
    if let Some(value) = value {
        return Ok(value.clone());
    }

    print!("{}: ", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_owned())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let now = chrono::Local::now().naive_local();

    let start_date = value_or_prompt(&cli.start_date, "Start date (YYYYMMDD)")?;
    let start_time = value_or_prompt(&cli.start_time, "Start time (HHMMSS)")?;
    let start = resolve_bound(&start_date, &start_time, Bound::Start, now)?;

    let end_date = value_or_prompt(&cli.end_date, "End date (YYYYMMDD)")?;
    let end_time = value_or_prompt(&cli.end_time, "End time (HHMMSS)")?;
    let end = resolve_bound(&end_date, &end_time, Bound::End, now)?;

    let range = TimeRange::new(start, end);
    println!("Start: {}, end: {}", range.start(), range.end());

    let config = cli.config();
    let remote = HttpRemote::connect(&config)?;
    let fetcher = Fetcher::connect(config, remote);

    let matches = fetcher.find_matches(&range);
    if matches.files.is_empty() {
        println!("No files found in the requested time range.");
        return Ok(());
    }
    println!(
        "Found {} matching files, starting download...",
        matches.files.len()
    );

    match fetcher.download_all(&matches.files) {
        Ok(summary) => {
            println!(
                "Finished: {} downloaded, {} failed.",
                summary.downloaded, summary.failed
            );
        }
        Err(err) => {
            eprintln!("Download stopped: {}", err);
        }
    }

    Ok(())
}
