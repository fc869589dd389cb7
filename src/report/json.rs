//! JSON report generation

use crate::report::types::ReportResult;
use crate::report::CrawlOutcome;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the crawl outcome as pretty-printed JSON to `output_path`
pub fn generate_json_report(outcome: &CrawlOutcome, output_path: &Path) -> ReportResult<()> {
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, outcome)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
