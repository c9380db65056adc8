//! CSV report emission.
//!
//! Flattens the structured tables from the analysis pipeline into one CSV
//! file per report. Every table iterates ordered maps, so identical inputs
//! produce byte-identical files.

use std::collections::BTreeMap;
use std::path::Path;

use insights_core::error::Result;
use insights_core::models::Signature;
use insights_data::crosstab::{IndustryMatrix, StatusEventMatrix};
use insights_data::segments::StatusSummary;
use insights_data::sequences::SequenceCrosstab;

/// Separator between events in an emitted signature label.
pub const SIGNATURE_SEPARATOR: &str = " > ";

/// Render a signature as a single CSV cell.
fn signature_label(signature: &Signature) -> String {
    signature.join(SIGNATURE_SEPARATOR)
}

/// Render a numeric cell: integers without a decimal point, everything else
/// in the shortest float form.
fn format_cell(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

// ── Report writers ────────────────────────────────────────────────────────────

/// `event_frequency.csv`: one `event_type,count` row per event type.
pub fn write_event_frequency(dir: &Path, frequencies: &BTreeMap<String, u64>) -> Result<()> {
    let mut writer = csv::Writer::from_path(dir.join("event_frequency.csv"))?;
    for (event_type, count) in frequencies {
        writer.write_record([event_type.clone(), count.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// `ordered_events.csv`: one `count,signature` row per distinct signature
/// across all clients.
pub fn write_sequence_counts(dir: &Path, counts: &BTreeMap<Signature, u64>) -> Result<()> {
    let mut writer = csv::Writer::from_path(dir.join("ordered_events.csv"))?;
    for (signature, count) in counts {
        writer.write_record([count.to_string(), signature_label(signature)])?;
    }
    writer.flush()?;
    Ok(())
}

/// `sequences_by_segment.csv`: header row of segment labels, then one row
/// per signature in the global union, dense with zeros.
///
/// With `percentage` set, cells hold penetration rates instead of counts.
pub fn write_sequences_by_segment(
    dir: &Path,
    crosstab: &SequenceCrosstab,
    percentage: bool,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(dir.join("sequences_by_segment.csv"))?;

    let mut header: Vec<String> = vec![String::new()];
    header.extend(crosstab.segments.keys().cloned());
    writer.write_record(&header)?;

    let rates = if percentage {
        Some(crosstab.percentages())
    } else {
        None
    };

    for signature in &crosstab.signatures {
        let mut row: Vec<String> = vec![signature_label(signature)];
        for label in crosstab.segments.keys() {
            let cell = match &rates {
                Some(rates) => format_cell(rates[label][signature]),
                None => crosstab.count(label, signature).to_string(),
            };
            row.push(cell);
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// `interactions_per_client.csv`: one `client_id,count` row per client,
/// including zero-interaction clients.
pub fn write_interactions_per_client(
    dir: &Path,
    counts: &BTreeMap<String, u64>,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(dir.join("interactions_per_client.csv"))?;
    for (client_id, count) in counts {
        writer.write_record([client_id.clone(), count.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// `interactions_by_industry.csv`: header row of event values, one row per
/// industry.
pub fn write_interactions_by_industry(dir: &Path, matrix: &IndustryMatrix) -> Result<()> {
    let mut writer = csv::Writer::from_path(dir.join("interactions_by_industry.csv"))?;

    let mut header: Vec<String> = vec![String::new()];
    header.extend(matrix.event_values.iter().cloned());
    writer.write_record(&header)?;

    for (industry, row) in &matrix.rows {
        let mut record: Vec<String> = vec![industry.clone()];
        for value in &matrix.event_values {
            record.push(format_cell(row.get(value).copied().unwrap_or(0.0)));
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// `outreach_status_summary.csv`: header row of industries plus "Total",
/// one row per status threshold.
pub fn write_status_summary(dir: &Path, summary: &StatusSummary) -> Result<()> {
    let mut writer = csv::Writer::from_path(dir.join("outreach_status_summary.csv"))?;

    let mut header: Vec<String> = vec![String::new()];
    header.extend(summary.columns.iter().cloned());
    writer.write_record(&header)?;

    for (threshold, row) in &summary.rows {
        let mut record: Vec<String> = vec![threshold.to_string()];
        for column in &summary.columns {
            record.push(row.get(column).copied().unwrap_or(0).to_string());
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// `status_event_matrix.csv`: one row per (industry-or-All, status) cell,
/// columns for every event value observed in the dataset.
pub fn write_status_event_matrix(dir: &Path, matrix: &StatusEventMatrix) -> Result<()> {
    let mut writer = csv::Writer::from_path(dir.join("status_event_matrix.csv"))?;

    let mut header: Vec<String> = vec!["industry".to_string(), "status".to_string()];
    header.extend(matrix.event_values.iter().cloned());
    writer.write_record(&header)?;

    for ((group, status), distribution) in &matrix.cells {
        let mut record: Vec<String> = vec![group.clone(), status.to_string()];
        for value in &matrix.event_values {
            record.push(format_cell(distribution.get(value).copied().unwrap_or(0.0)));
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
