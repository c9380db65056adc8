//! Client segmentation.
//!
//! Segments are recomputed on demand from the live client slice; there is no
//! persisted segment entity. Two distinct grouping policies exist on purpose:
//! the threshold segmentation here (status >= K) and the exact-equality
//! matching used by the status/event matrix in [`crate::crosstab`].

use std::collections::{BTreeMap, BTreeSet};

use insights_core::models::{Client, OutreachStatus};

/// Label of the synthetic segment holding every client.
pub const ALL_SEGMENT: &str = "All";

/// Label of the summary column counting clients across all industries.
pub const TOTAL_COLUMN: &str = "Total";

/// Partition clients by their exact industry string.
///
/// Industry values are opaque; no case or whitespace normalization happens,
/// so `"Gaming"` and `"gaming"` are distinct segments.
pub fn by_industry(clients: &[Client]) -> BTreeMap<String, Vec<&Client>> {
    let mut segments: BTreeMap<String, Vec<&Client>> = BTreeMap::new();
    for client in clients {
        segments
            .entry(client.industry.clone())
            .or_default()
            .push(client);
    }
    segments
}

/// Group clients by outreach-status threshold.
///
/// Status is a progression counter, so "reached status K" means
/// "status >= K": the `"status>=K"` segment holds every client at or above
/// K, for K in 1..=5, and the synthetic [`ALL_SEGMENT`] holds every client
/// regardless of status. Segments are therefore nested:
/// segment(K+1) ⊆ segment(K).
pub fn by_status_threshold(clients: &[Client]) -> BTreeMap<String, Vec<&Client>> {
    let mut segments: BTreeMap<String, Vec<&Client>> = BTreeMap::new();
    for threshold in OutreachStatus::MIN..=OutreachStatus::MAX {
        let members: Vec<&Client> = clients
            .iter()
            .filter(|c| c.status.value() >= threshold)
            .collect();
        segments.insert(format!("status>={threshold}"), members);
    }
    segments.insert(ALL_SEGMENT.to_string(), clients.iter().collect());
    segments
}

/// Dense status-threshold × industry client-count grid.
#[derive(Debug, Clone)]
pub struct StatusSummary {
    /// Column labels: sorted industries followed by [`TOTAL_COLUMN`].
    pub columns: Vec<String>,
    /// Status threshold → column label → number of clients with
    /// status >= threshold (and matching industry, except for the total).
    pub rows: BTreeMap<u8, BTreeMap<String, usize>>,
}

/// Count, for every status threshold 1..=5, how many clients of each
/// industry have reached at least that status.
///
/// Every (threshold, industry) pair is present, zero when empty.
pub fn outreach_status_summary(clients: &[Client]) -> StatusSummary {
    let industries: BTreeSet<String> =
        clients.iter().map(|c| c.industry.clone()).collect();

    let mut columns: Vec<String> = industries.iter().cloned().collect();
    columns.push(TOTAL_COLUMN.to_string());

    let mut rows: BTreeMap<u8, BTreeMap<String, usize>> = BTreeMap::new();
    for threshold in OutreachStatus::MIN..=OutreachStatus::MAX {
        let mut row: BTreeMap<String, usize> = BTreeMap::new();
        for industry in &industries {
            let count = clients
                .iter()
                .filter(|c| c.status.value() >= threshold && &c.industry == industry)
                .count();
            row.insert(industry.clone(), count);
        }
        let total = clients
            .iter()
            .filter(|c| c.status.value() >= threshold)
            .count();
        row.insert(TOTAL_COLUMN.to_string(), total);
        rows.insert(threshold, row);
    }

    StatusSummary { columns, rows }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
