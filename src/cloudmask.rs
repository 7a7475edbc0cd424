use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use owo_colors::{OwoColorize, Stream::Stdout};
use range_match::{Matcher, RangeSource, State};
use tokio::io::AsyncBufReadExt;

use crate::common::cache;
use crate::common::logging::enable_logger;
use crate::common::source::{FileSource, HttpSource};

mod common;

/// Cloudflare's published IP range endpoint
const DEFAULT_SOURCE_URL: &str = "https://api.cloudflare.com/client/v4/ips";

#[derive(Parser)]
#[clap(author, version, about = "Check IP addresses against a network operator's published CIDR ranges", long_about = None)]
struct Args {
    /// URL publishing the operator's CIDR lists
    #[clap(long, default_value = DEFAULT_SOURCE_URL)]
    source_url: String,

    /// A local JSON file to read the CIDR lists from instead of the network
    #[clap(long, conflicts_with = "source_url")]
    source_file: Option<PathBuf>,

    /// File used to persist the loaded ranges between runs
    #[clap(long)]
    cache_file: Option<PathBuf>,

    /// Seconds between refreshes of the upstream CIDR lists
    #[clap(long, default_value = "86400")]
    refresh_interval: u64,

    /// Addresses to check; with none given, addresses are read from stdin
    addresses: Vec<String>,

    /// Enable verbose logging
    #[clap(short, long)]
    verbose: bool,
}

impl Args {
    fn source(&self) -> Arc<dyn RangeSource + Send + Sync> {
        match &self.source_file {
            Some(path) => Arc::new(FileSource::new(path.clone())),
            None => Arc::new(HttpSource::new(self.source_url.clone())),
        }
    }
}

#[tokio::main]
pub async fn main() -> ExitCode {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging
    enable_logger(args.verbose);

    let matcher = Arc::new(Matcher::new());

    // Warm-start from the snapshot cache if one is available
    if let Some(path) = &args.cache_file {
        match cache::load_snapshot(path) {
            Ok(Some(snapshot)) => {
                log::info!(
                    "Restored cached range snapshot (generation {}) from {}",
                    snapshot.generation(),
                    path.display()
                );
                if let Err(err) = matcher.restore(snapshot) {
                    log::warn!("Could not restore cached snapshot: {err}");
                }
            }
            Ok(None) => log::debug!("No snapshot cache at {}", path.display()),
            Err(err) => log::warn!("Ignoring unreadable snapshot cache: {err}"),
        }
    }

    // First load; a failure here is survivable if the cache already seeded us
    let source = args.source();
    refresh(&matcher, &source, args.cache_file.as_deref()).await;
    if matcher.state() == State::Empty {
        log::warn!("No range data loaded; every address will report \"no match\"");
    }

    // One-shot mode: check the addresses given on the command line and exit
    if !args.addresses.is_empty() {
        let mut failures = false;
        for address in &args.addresses {
            failures |= !check_address(&matcher, address);
        }
        return match failures {
            true => ExitCode::from(2),
            false => ExitCode::SUCCESS,
        };
    }

    // Long-running mode: refresh on an interval in the background...
    {
        let matcher = matcher.clone();
        let source = source.clone();
        let cache_file = args.cache_file.clone();
        let period = Duration::from_secs(args.refresh_interval.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately and the initial load already ran
            ticker.tick().await;
            loop {
                ticker.tick().await;
                refresh(&matcher, &source, cache_file.as_deref()).await;
            }
        });
    }

    // ...while answering one address per stdin line
    log::info!("Reading addresses from stdin");
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let address = line.trim();
        if !address.is_empty() {
            check_address(&matcher, address);
        }
    }
    ExitCode::SUCCESS
}

/// Print the verdict for one address. Returns false if the address itself was
/// malformed
fn check_address(matcher: &Matcher, address: &str) -> bool {
    match matcher.contains_str(address) {
        Ok(hit) => {
            println!(
                "{address}: {}",
                match hit {
                    true => "match"
                        .if_supports_color(Stdout, |text| text.green())
                        .to_string(),
                    false => "no match"
                        .if_supports_color(Stdout, |text| text.bright_black())
                        .to_string(),
                }
            );
            true
        }
        Err(err) => {
            log::error!("{err}");
            false
        }
    }
}

/// Run one refresh against the source, off the async runtime's worker threads
/// since the fetch blocks. A failure keeps the previous snapshot active
async fn refresh(
    matcher: &Arc<Matcher>,
    source: &Arc<dyn RangeSource + Send + Sync>,
    cache_file: Option<&std::path::Path>,
) {
    let task = {
        let matcher = matcher.clone();
        let source = source.clone();
        tokio::task::spawn_blocking(move || matcher.refresh_from(source.as_ref()))
    };
    match task.await {
        Ok(Ok(report)) => {
            log::info!(
                "Loaded {} IPv4 + {} IPv6 ranges from {} (generation {})",
                report.ipv4_intervals,
                report.ipv6_intervals,
                source.id(),
                report.generation
            );
            if report.skipped_entries > 0 {
                log::warn!("Skipped {} malformed upstream entries", report.skipped_entries);
            }
            if let Some(path) = cache_file {
                match cache::store_snapshot(path, &matcher.snapshot()) {
                    Ok(()) => log::debug!("Wrote snapshot cache to {}", path.display()),
                    Err(err) => log::warn!("Could not write snapshot cache: {err}"),
                }
            }
        }
        Ok(Err(err)) => log::warn!("Refresh failed, keeping previous ranges: {err}"),
        Err(err) => log::warn!("Refresh task failed: {err}"),
    }
}
