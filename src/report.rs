//! Output formatting for check results

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use crate::check::record::{CheckMethod, CheckRecord, UpdateStatus};
use crate::version::types::{LookupResult, Source};

const RULE_WIDTH: usize = 74;
const CSV_HEADER: &str = "Package,Installed Version,Latest Version,Status,Source,Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

pub fn format(records: &[CheckRecord], format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Table => Ok(format_table(records)),
        OutputFormat::Json => format_json(records),
        OutputFormat::Csv => Ok(format_csv(records)),
    }
}

pub fn format_json(records: &[CheckRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

pub fn format_csv(records: &[CheckRecord]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for record in records {
        let fields = [
            record.package.as_str(),
            record.installed_version.as_str(),
            record.latest_version.as_deref().unwrap_or(""),
            record.status.as_str(),
            record.source.map(|s| s.as_str()).unwrap_or(""),
            record.error.as_deref().unwrap_or(""),
        ];
        let line: Vec<String> = fields.iter().map(|field| csv_escape(field)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    out
}

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn status_symbol(status: UpdateStatus) -> &'static str {
    match status {
        UpdateStatus::UpToDate => "✓",
        UpdateStatus::UpdateAvailable => "↑",
        UpdateStatus::AheadOfVendor => "⚠",
        UpdateStatus::Unavailable => "?",
        UpdateStatus::Error => "✗",
    }
}

fn source_label(source: Option<Source>) -> &'static str {
    match source {
        Some(Source::Registry) => " [via Packagist]",
        Some(Source::PrivateRepo) => " [via Private Repo]",
        Some(Source::VendorPage) | None => "",
    }
}

pub fn format_table(records: &[CheckRecord]) -> String {
    let rule = format!("  {}", "─".repeat(RULE_WIDTH));
    let mut lines = vec![
        String::new(),
        "  Vendor Version Check Report".to_string(),
        rule.clone(),
        String::new(),
    ];
    let mut counts: HashMap<UpdateStatus, usize> = HashMap::new();

    for record in records {
        *counts.entry(record.status).or_default() += 1;

        lines.push(format!("  {}  {}", status_symbol(record.status), record.package));
        lines.push(format!(
            "      Installed: {:<20}  Latest: {}{}",
            record.installed_version,
            record.latest_version.as_deref().unwrap_or("-"),
            source_label(record.source)
        ));

        if let Some(changes) = &record.recent_changes {
            lines.push("      Recent changes:".to_string());
            for change in changes {
                lines.push(format!("        • {} - {}", change.version, change.date));
            }
        }
        if let Some(error) = &record.error {
            lines.push(format!("      Error: {}", error));
        }
        lines.push(String::new());
    }

    let count = |status| counts.get(&status).copied().unwrap_or(0);
    lines.push(rule);
    lines.push(format!(
        "  Summary: {} up-to-date, {} updates available, {} ahead, {} unavailable, {} errors",
        count(UpdateStatus::UpToDate),
        count(UpdateStatus::UpdateAvailable),
        count(UpdateStatus::AheadOfVendor),
        count(UpdateStatus::Unavailable),
        count(UpdateStatus::Error),
    ));
    lines.push(String::new());

    lines.join("\n")
}

/// Report for a single vendor page check
pub fn format_lookup(result: &LookupResult, verbose: bool) -> String {
    let mut lines = vec![format!(
        "Latest Version: {}",
        result.latest_version.as_deref().unwrap_or("not found")
    )];

    if verbose && !result.changelog.is_empty() {
        lines.push(String::new());
        lines.push("Recent Changes:".to_string());
        for entry in result.changelog.iter().take(5) {
            lines.push(format!("  {} - {}", entry.version, entry.date));
            for change in entry.changes.iter().take(3) {
                lines.push(format!("    - {}", change));
            }
        }
    }

    lines.join("\n")
}

/// Write `content`, creating parent directories as needed
pub fn write_to_file(content: &str, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
}

/// 2 if any record is an error, 1 if any update is available, else 0
pub fn exit_code(records: &[CheckRecord]) -> i32 {
    if records.iter().any(|r| r.status == UpdateStatus::Error) {
        2
    } else if records.iter().any(|r| r.status == UpdateStatus::UpdateAvailable) {
        1
    } else {
        0
    }
}

/// Per-package progress lines (`[ 3/12] amasty/promo  vendor_page OK`)
pub struct ProgressReporter<W: Write> {
    out: W,
    total: usize,
    current: usize,
}

impl<W: Write> ProgressReporter<W> {
    pub fn new(out: W, total: usize) -> Self {
        Self {
            out,
            total,
            current: 0,
        }
    }

    pub fn advance(&mut self, record: &CheckRecord) {
        self.current += 1;
        let width = self.total.to_string().len();
        let method = match record.check_method {
            Some(CheckMethod::Registry) => "registry",
            Some(CheckMethod::VendorPage) => "vendor_page",
            Some(CheckMethod::PrivateRepo) => "private_repo",
            Some(CheckMethod::Cached) => "cached",
            None => "",
        };
        let status = match record.status {
            UpdateStatus::UpToDate => "OK",
            UpdateStatus::UpdateAvailable => "UPDATE",
            UpdateStatus::AheadOfVendor => "AHEAD",
            UpdateStatus::Unavailable | UpdateStatus::Error => "ERR",
        };
        let line = format!(
            "  [{:>width$}/{}] {:<50} {} {}",
            self.current,
            self.total,
            record.package,
            method,
            status,
            width = width
        );
        let _ = writeln!(self.out, "{}", line.trim_end());
    }

    pub fn finish(&mut self) {
        let _ = writeln!(self.out);
    }
}
