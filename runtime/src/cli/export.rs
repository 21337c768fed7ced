//! Result export: CSV file and JSON records.

use crate::cartography::page_classifier::PageRecord;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

pub const URL_HEADER: &str = "URL";
pub const CATEGORY_HEADER: &str = "Seitentyp";
pub const SUBTYPE_HEADER: &str = "Subtyp";

/// Write records as CSV with a header row. The subtype column is present
/// only when subtypes are enabled.
pub fn write_csv<W: Write>(writer: W, records: &[PageRecord], with_subtype: bool) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    if with_subtype {
        out.write_record([URL_HEADER, CATEGORY_HEADER, SUBTYPE_HEADER])?;
    } else {
        out.write_record([URL_HEADER, CATEGORY_HEADER])?;
    }
    for record in records {
        if with_subtype {
            out.write_record([&record.url, &record.category, &record.subtype])?;
        } else {
            out.write_record([&record.url, &record.category])?;
        }
    }
    out.flush()?;
    Ok(())
}

pub fn write_csv_file(path: &Path, records: &[PageRecord], with_subtype: bool) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_csv(file, records, with_subtype)
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Records as a JSON array, including error and signal fields.
pub fn records_json(records: &[PageRecord]) -> serde_json::Value {
    serde_json::to_value(records).unwrap_or_else(|_| serde_json::Value::Array(Vec::new()))
}
