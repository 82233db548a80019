use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use skein_core::crawl::{CrawlOptions, CrawlOutcome, CrawlProgressCallback, execute_crawl};
use skein_core::fixtures::{GOLANG_ROOT, golang_fetcher, load_graph};
use skein_core::report::{ReportFormat, gather_report_data, generate_report, save_report};
use skein_scanner::{Fetcher, HttpFetcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (e.g. from tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn print_banner() {
    println!(
        "{} {} {}",
        "skein".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").bright_black(),
        "· deduplicating link-graph crawler".bright_black()
    );
}

// Helper functions for crawl handler

/// Load roots from either a file or a single root argument
pub fn load_roots_from_source(
    root: Option<&String>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_roots_from_file(hosts_file_path)
    } else if let Some(root) = root {
        Ok(vec![root.trim().to_string()])
    } else {
        Err("Either --root or --hosts-file must be provided".to_string())
    }
}

/// Load newline-delimited roots from a file, skipping blanks and `#` comments
pub fn load_roots_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let roots: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    if roots.is_empty() {
        return Err(format!("No roots found in {}", path.display()));
    }

    Ok(roots)
}

/// Parse a single line as a URL, trying to add http:// if needed.
/// The result is normalized so it matches the ids links resolve to.
pub fn parse_url_line(line: &str) -> Option<String> {
    if let Ok(url) = HttpFetcher::parse_root(line) {
        return Some(url);
    }

    let with_scheme = format!("http://{}", line);
    if let Ok(url) = HttpFetcher::parse_root(&with_scheme) {
        return Some(url);
    }

    eprintln!("⚠️  Skipping invalid URL '{}'", line);
    None
}

pub fn parse_report_format(format: &str) -> Result<ReportFormat> {
    ReportFormat::from_str(format).ok_or_else(|| anyhow!("Unknown report format '{}'", format))
}

/// Renders every outcome in one document of the requested format.
pub fn build_report(outcomes: &[CrawlOutcome], format: &ReportFormat) -> Result<String> {
    let data: Vec<_> = outcomes.iter().map(gather_report_data).collect();
    generate_report(&data, format).context("Failed to render report")
}

fn emit_report(outcomes: &[CrawlOutcome], sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let format = parse_report_format(
        sub_matches
            .get_one::<String>("format")
            .map(String::as_str)
            .unwrap_or("text"),
    )?;
    let report = build_report(outcomes, &format)?;

    match sub_matches.get_one::<String>("output") {
        Some(output) => {
            let expanded = shellexpand::tilde(output);
            let path = Path::new(expanded.as_ref());
            save_report(&report, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                println!("{} Report saved to {}", "✓".green().bold(), path.display());
            }
        }
        None => print!("{}", report),
    }

    Ok(())
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let root = sub_matches.get_one::<String>("root");
    let hosts_file = sub_matches.get_one::<PathBuf>("hosts-file");
    let graph = sub_matches.get_one::<String>("graph");
    let max_depth = *sub_matches.get_one::<usize>("depth").unwrap_or(&3);
    let max_in_flight = *sub_matches.get_one::<usize>("max-in-flight").unwrap_or(&0);
    let timeout = *sub_matches.get_one::<u64>("timeout").unwrap_or(&10);
    let follow_external = sub_matches.get_flag("follow-external");

    let roots = load_roots_from_source(root, hosts_file).map_err(anyhow::Error::msg)?;

    let (fetcher, roots): (Arc<dyn Fetcher<String>>, Vec<String>) = match graph {
        Some(path) => {
            debug!("Crawling graph file {}", path);
            let fetcher = load_graph(path).with_context(|| format!("Failed to load graph {}", path))?;
            (Arc::new(fetcher), roots)
        }
        None => {
            let roots: Vec<String> = roots.iter().filter_map(|r| parse_url_line(r)).collect();
            if roots.is_empty() {
                bail!("No valid URLs to crawl");
            }
            let fetcher = HttpFetcher::with_timeout(timeout)?.with_follow_external(follow_external);
            (Arc::new(fetcher), roots)
        }
    };

    if !quiet {
        println!("\n🕸️  Crawling {} root(s)", roots.len());
        println!("Max depth: {}", max_depth);
        if max_in_flight > 0 {
            println!("Fetch cap: {}", max_in_flight);
        } else {
            println!("Fetch cap: unbounded");
        }
        if graph.is_none() {
            let follow_mode_str = if follow_external {
                "follow external links"
            } else {
                "same host only"
            };
            println!("Links: {}\n", follow_mode_str);
        } else {
            println!();
        }
    }

    let options = CrawlOptions {
        roots,
        max_depth,
        max_in_flight,
        show_progress_bars: !quiet,
    };
    let progress_callback: CrawlProgressCallback = Arc::new(|msg: String| {
        println!("{}", msg);
    });

    let outcomes = execute_crawl(options, fetcher, (!quiet).then_some(progress_callback))
        .await
        .context("Crawl failed")?;

    if !quiet {
        println!("\n{} Crawl complete!\n", "✓".green().bold());
    }

    emit_report(&outcomes, sub_matches, quiet)
}

/// Crawls the built-in golang.org graph.
pub async fn handle_demo(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let max_depth = *sub_matches.get_one::<usize>("depth").unwrap_or(&4);

    let options = CrawlOptions {
        roots: vec![GOLANG_ROOT.to_string()],
        max_depth,
        ..CrawlOptions::default()
    };
    let outcomes = execute_crawl(options, Arc::new(golang_fetcher()), None).await?;

    emit_report(&outcomes, sub_matches, quiet)
}
