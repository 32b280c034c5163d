//! Per-request result tables
//!
//! Layout: `RequestID`, then one fragment column per policy, then one
//! cumulative traversal column per policy, comma separated with a header row.

use crate::core::allocator::Policy;
use crate::core::simulation::StepRecord;
use crate::error::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Header row for `policies`
pub fn csv_header(policies: &[Policy]) -> String {
    let mut columns = vec!["RequestID".to_string()];
    columns.extend(
        policies
            .iter()
            .map(|p| format!("{}Fragments", p.column_prefix())),
    );
    columns.extend(
        policies
            .iter()
            .map(|p| format!("{}NodesTraversed", p.column_prefix())),
    );
    columns.join(", ")
}

/// Write the header and one row per record
pub fn write_steps_csv<W: Write>(
    mut writer: W,
    policies: &[Policy],
    records: &[StepRecord],
) -> Result<()> {
    writeln!(writer, "{}", csv_header(policies))?;

    for record in records {
        let mut row = vec![record.index.to_string()];
        row.extend(record.policies.iter().map(|p| p.fragments.to_string()));
        row.extend(
            record
                .policies
                .iter()
                .map(|p| p.cumulative_traversed.to_string()),
        );
        writeln!(writer, "{}", row.join(", "))?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the per-request table to a file, replacing it if present
pub fn save_steps_csv(
    path: impl AsRef<Path>,
    policies: &[Policy],
    records: &[StepRecord],
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_steps_csv(BufWriter::new(file), policies, records)?;
    info!("Wrote {} rows to {:?}", records.len(), path);
    Ok(())
}
