// Report generation from crawl outcomes

use crate::crawl::{CrawlOutcome, extract_url_path};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use skein_scanner::VisitState;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use url::Url;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const PREVIEW_CHARS: usize = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Fetched,
    Failed,
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub id: String,
    pub status: EntryStatus,
    pub content: String,
    pub links: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    pub fetched: usize,
    pub failed: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub root: String,
    pub max_depth: usize,
    pub elapsed_ms: u128,
    pub counts: StatusCounts,
    pub entries: Vec<ReportEntry>,
}

/// Flattens one outcome into report rows, sorted by node id.
pub fn gather_report_data(outcome: &CrawlOutcome) -> ReportData {
    let mut counts = StatusCounts::default();
    let mut entries: Vec<ReportEntry> = outcome
        .snapshot
        .iter()
        .map(|(id, state)| {
            let entry = match state {
                VisitState::Pending => ReportEntry {
                    id: id.clone(),
                    status: EntryStatus::Pending,
                    content: String::new(),
                    links: Vec::new(),
                    error: None,
                },
                VisitState::Done(record) => ReportEntry {
                    id: id.clone(),
                    status: if record.is_ok() {
                        EntryStatus::Fetched
                    } else {
                        EntryStatus::Failed
                    },
                    content: record.content.clone(),
                    links: record.links.clone(),
                    error: record.error.as_ref().map(|e| e.to_string()),
                },
            };
            match entry.status {
                EntryStatus::Fetched => counts.fetched += 1,
                EntryStatus::Failed => counts.failed += 1,
                EntryStatus::Pending => counts.pending += 1,
            }
            entry
        })
        .collect();
    entries.sort_by(|a, b| a.id.cmp(&b.id));

    ReportData {
        root: outcome.root.clone(),
        max_depth: outcome.max_depth,
        elapsed_ms: outcome.elapsed.as_millis(),
        counts,
        entries,
    }
}

pub fn generate_report(data: &[ReportData], format: &ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(data)),
        ReportFormat::Json => generate_json_report(data),
        ReportFormat::Markdown => Ok(generate_markdown_report(data)),
    }
}

pub fn generate_text_report(data: &[ReportData]) -> String {
    let mut report = String::new();

    for crawl in data {
        report.push_str(RULE);
        report.push('\n');
        report.push_str("                            SKEIN CRAWL REPORT\n");
        report.push_str(RULE);
        report.push_str("\n\n");

        report.push_str(&format!("Root:         {}\n", crawl.root));
        report.push_str(&format!("Max depth:    {}\n", crawl.max_depth));
        report.push_str(&format!("Duration:     {} ms\n", crawl.elapsed_ms));
        report.push_str(&format!(
            "Nodes:        {} ({} fetched, {} failed",
            crawl.entries.len(),
            crawl.counts.fetched,
            crawl.counts.failed
        ));
        if crawl.counts.pending > 0 {
            report.push_str(&format!(", {} unfinished", crawl.counts.pending));
        }
        report.push_str(")\n\n");

        for (host, entries) in group_by_host(&crawl.entries) {
            report.push_str(&format!("## {}\n", host));
            report.push_str(&format!("  {} nodes\n\n", entries.len()));

            for entry in entries {
                let path = extract_url_path(&entry.id);
                let line = match entry.status {
                    EntryStatus::Fetched => format!(
                        "  {} {}  {} {}",
                        "✓".green().bold(),
                        path,
                        preview(&entry.content),
                        format!("({} links)", entry.links.len()).bright_black()
                    ),
                    EntryStatus::Failed => format!(
                        "  {} {}  {}",
                        "✗".red().bold(),
                        path,
                        entry.error.as_deref().unwrap_or("unknown error").red()
                    ),
                    EntryStatus::Pending => {
                        format!("  {} {}  {}", "?".yellow().bold(), path, "unfinished".yellow())
                    }
                };
                report.push_str(&line);
                report.push('\n');
            }
            report.push('\n');
        }
    }

    report
}

pub fn generate_json_report(data: &[ReportData]) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "skein",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "summary": {
                "roots": data.len(),
                "total_nodes": data.iter().map(|d| d.entries.len()).sum::<usize>(),
                "fetched": data.iter().map(|d| d.counts.fetched).sum::<usize>(),
                "failed": data.iter().map(|d| d.counts.failed).sum::<usize>()
            },
            "crawls": data
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_markdown_report(data: &[ReportData]) -> String {
    let mut report = String::from("# Skein Crawl Report\n\n");

    for crawl in data {
        report.push_str(&format!("## {}\n\n", crawl.root));
        report.push_str(&format!(
            "- Max depth: {}\n- Nodes: {}\n- Fetched: {}\n- Failed: {}\n\n",
            crawl.max_depth,
            crawl.entries.len(),
            crawl.counts.fetched,
            crawl.counts.failed
        ));
        report.push_str("| Node | Status | Detail |\n");
        report.push_str("|------|--------|--------|\n");

        for entry in &crawl.entries {
            let (status, detail) = match entry.status {
                EntryStatus::Fetched => ("fetched", preview(&entry.content)),
                EntryStatus::Failed => (
                    "failed",
                    entry.error.clone().unwrap_or_else(|| "unknown error".to_string()),
                ),
                EntryStatus::Pending => ("unfinished", String::new()),
            };
            report.push_str(&format!(
                "| {} | {} | {} |\n",
                entry.id,
                status,
                detail.replace('|', "\\|")
            ));
        }
        report.push('\n');
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

// Ids that are not URLs all land under one heading.
fn group_by_host(entries: &[ReportEntry]) -> BTreeMap<String, Vec<&ReportEntry>> {
    let mut by_host: BTreeMap<String, Vec<&ReportEntry>> = BTreeMap::new();
    for entry in entries {
        let host = Url::parse(&entry.id)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "(graph)".to_string());
        by_host.entry(host).or_default().push(entry);
    }
    by_host
}

fn preview(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or_default().trim();
    if first_line.chars().count() > PREVIEW_CHARS {
        let cut: String = first_line.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{}...", cut)
    } else {
        first_line.to_string()
    }
}
