//! Markdown report generation

use crate::report::types::ReportResult;
use crate::report::CrawlOutcome;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Broken pages listed in full before the report switches to a count
const MAX_LISTED_PAGES: usize = 200;

/// Writes the crawl outcome as markdown to `output_path`
pub fn generate_markdown_report(outcome: &CrawlOutcome, output_path: &Path) -> ReportResult<()> {
    let markdown = format_markdown_report(outcome);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl outcome as markdown
pub fn format_markdown_report(outcome: &CrawlOutcome) -> String {
    let mut md = String::new();
    let stats = &outcome.stats;
    let errors = &outcome.errors;

    md.push_str("# Sumi-Sweep Crawl Report\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", outcome.seed_url));
    md.push_str(&format!("- **Started**: {}\n", outcome.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", outcome.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        stats.elapsed_ms as f64 / 1000.0
    ));
    md.push_str(&format!(
        "- **Result**: {}\n",
        if errors.is_success() { "passed" } else { "failed" }
    ));
    if let Some(hash) = &outcome.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Pages Visited | {} |\n", stats.pages_visited));
    md.push_str(&format!("| Pages Loaded | {} |\n", stats.pages_succeeded));
    md.push_str(&format!("| Pages Failed | {} |\n", stats.pages_failed));
    md.push_str(&format!("| Pages Timed Out | {} |\n", stats.pages_timed_out));
    md.push_str(&format!("| Retries | {} |\n", stats.retries));
    md.push_str(&format!("| Links Discovered | {} |\n", stats.links_discovered));
    md.push_str(&format!("| Links Enqueued | {} |\n", stats.links_enqueued));
    md.push_str(&format!("| Links Rejected | {} |\n", stats.links_rejected));
    md.push_str(&format!("| Peak Concurrency | {} |\n\n", stats.peak_in_flight));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        stats.success_rate()
    ));

    if !stats.depth_breakdown.is_empty() {
        md.push_str("## Depth Breakdown\n\n");
        md.push_str("| Depth | Pages |\n");
        md.push_str("|-------|-------|\n");
        for (depth, count) in &stats.depth_breakdown {
            md.push_str(&format!("| {} | {} |\n", depth, count));
        }
        md.push('\n');
    }

    let counts = errors.counts_by_kind();
    if !counts.is_empty() || errors.ignored_count() > 0 {
        md.push_str("## Error Summary\n\n");
        md.push_str("| Error Type | Count |\n");
        md.push_str("|------------|-------|\n");
        for (kind, count) in &counts {
            md.push_str(&format!("| {} | {} |\n", kind, count));
        }
        if errors.ignored_count() > 0 {
            md.push_str(&format!("| ignored | {} |\n", errors.ignored_count()));
        }
        md.push('\n');
    }

    if !errors.pages.is_empty() {
        md.push_str("## Broken Pages\n\n");
        for page in errors.pages.iter().take(MAX_LISTED_PAGES) {
            md.push_str(&format!("### {}\n\n", page));
            for error in errors.errors_for(page) {
                match &error.failed_resource_url {
                    Some(resource) => md.push_str(&format!(
                        "- **{}** `{}`: {}{}\n",
                        error.kind,
                        resource,
                        error.message,
                        if error.ignored { " (ignored)" } else { "" }
                    )),
                    None => md.push_str(&format!("- **{}**: {}\n", error.kind, error.message)),
                }
            }
            md.push('\n');
        }
        if errors.pages.len() > MAX_LISTED_PAGES {
            md.push_str(&format!(
                "... and {} more\n\n",
                errors.pages.len() - MAX_LISTED_PAGES
            ));
        }
    } else {
        md.push_str("No broken pages found.\n");
    }

    md
}
