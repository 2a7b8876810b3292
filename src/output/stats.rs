//! Run summaries
//!
//! This module condenses the records and reports of a run into counts and prints them the
//! way the command line shows them.

use crate::convert::{ConversionReport, ConversionStatus};
use crate::output::DiscoveryRecord;
use crate::state::DiscoveryStatus;
use crate::sync::{SyncReport, SyncStatus};
use std::collections::HashMap;

/// Order in which statuses are listed
const STATUS_ORDER: [DiscoveryStatus; 5] = [
    DiscoveryStatus::Available,
    DiscoveryStatus::Deleted,
    DiscoveryStatus::PermissionDenied,
    DiscoveryStatus::Invalid,
    DiscoveryStatus::Error,
];

/// Discovery statistics summary
#[derive(Debug, Clone, Default)]
pub struct DiscoveryStatistics {
    /// Total number of records
    pub total: usize,

    /// Count of records by status
    pub by_status: HashMap<DiscoveryStatus, usize>,
}

impl DiscoveryStatistics {
    /// Counts the records of a discovery run
    pub fn from_records(records: &[DiscoveryRecord]) -> Self {
        let mut by_status = HashMap::new();
        for record in records {
            *by_status.entry(record.status()).or_insert(0) += 1;
        }
        Self {
            total: records.len(),
            by_status,
        }
    }

    pub fn count(&self, status: DiscoveryStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Percentage of records that are available
    pub fn success_rate(&self) -> f64 {
        percentage(self.count(DiscoveryStatus::Available), self.total)
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Prints discovery statistics to stdout
pub fn print_discovery_statistics(stats: &DiscoveryStatistics) {
    println!("=== Discovery Statistics ===\n");

    println!("Records by Status:");
    for status in STATUS_ORDER {
        let count = stats.count(status);
        if count > 0 {
            println!(
                "  {}: {} ({:.1}%)",
                status,
                count,
                percentage(count, stats.total)
            );
        }
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} documents available)",
        stats.success_rate(),
        stats.count(DiscoveryStatus::Available),
        stats.total
    );
}

/// Prints a conversion report to stdout, failures included
pub fn print_conversion_report(report: &ConversionReport) {
    println!(
        "=== Conversion Report{} ===\n",
        if report.dry_run { " (dry run)" } else { "" }
    );

    println!("Overview:");
    println!("  Documents: {}", report.total());
    println!("  Converted: {}", report.converted());
    println!("  Stubbed: {}", report.stubbed());
    println!("  Failed: {}", report.failed());
    let links: usize = report.outcomes.iter().map(|o| o.links_rewritten).sum();
    println!("  Links rewritten: {}", links);
    if report.cleanup_failures > 0 {
        println!("  Temporary clones left behind: {}", report.cleanup_failures);
    }
    println!();

    if report.failed() > 0 {
        println!("Failures:");
        for outcome in report.failures() {
            if let ConversionStatus::Failed(e) = &outcome.status {
                println!("  - {} ({}): {}", outcome.title, outcome.link, e);
            }
        }
        println!();
    }
}

/// Prints a sync report to stdout, failures included
pub fn print_sync_report(report: &SyncReport) {
    println!(
        "=== Sync Report{} ===\n",
        if report.dry_run { " (dry run)" } else { "" }
    );

    println!("Overview:");
    println!("  Files: {}", report.total());
    println!("  Updated: {}", report.updated());
    println!("  Refreshed: {}", report.refreshed());
    println!("  Unchanged: {}", report.unchanged());
    println!("  Skipped: {}", report.skipped());
    println!("  Failed: {}", report.failed());
    if report.cleanup_failures > 0 {
        println!("  Temporary clones left behind: {}", report.cleanup_failures);
    }
    println!();

    let skipped: Vec<_> = report
        .outcomes
        .iter()
        .filter_map(|o| match &o.status {
            SyncStatus::Skipped(reason) => Some((o.path.display(), reason)),
            _ => None,
        })
        .collect();
    if !skipped.is_empty() {
        println!("Skipped:");
        for (path, reason) in skipped {
            println!("  - {}: {}", path, reason);
        }
        println!();
    }

    if report.failed() > 0 {
        println!("Failures:");
        for (path, e) in report.failures() {
            println!("  - {}: {}", path.display(), e);
        }
        println!();
    }
}
