//! Frequency and crosstab computations.
//!
//! All functions here are pure over `(clients, events)` and return freshly
//! constructed maps; nothing is shared or mutated across reports. The metric
//! value universe is always taken from the full event table, so event types
//! belonging to no known client still appear as all-zero columns.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use insights_core::models::{Client, Interaction, Metric, OutreachStatus};

use crate::segments::ALL_SEGMENT;

// ── Event frequencies ─────────────────────────────────────────────────────────

/// Occurrences per `source_event` value.
///
/// With `unique_clients` set, each client is counted at most once per event
/// type (dedup on client id within the event-type subset), so the result is
/// "how many clients ever produced this event" rather than a raw row count.
pub fn event_frequencies(
    events: &[Interaction],
    unique_clients: bool,
) -> BTreeMap<String, u64> {
    let mut frequencies: BTreeMap<String, u64> = BTreeMap::new();
    if unique_clients {
        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        for interaction in events {
            if seen.insert((interaction.source_event.as_str(), interaction.client_id.as_str())) {
                *frequencies.entry(interaction.source_event.clone()).or_insert(0) += 1;
            }
        }
    } else {
        for interaction in events {
            *frequencies.entry(interaction.source_event.clone()).or_insert(0) += 1;
        }
    }
    frequencies
}

/// Attached-interaction count per client id.
///
/// Clients with no event rows appear with count 0; the attachment done at
/// load time makes this structural rather than a lookup that can miss.
pub fn interactions_per_client(clients: &[Client]) -> BTreeMap<String, u64> {
    clients
        .iter()
        .map(|c| (c.id.clone(), c.interactions.len() as u64))
        .collect()
}

// ── Industry crosstab ─────────────────────────────────────────────────────────

/// Dense industry × metric-value grid.
#[derive(Debug, Clone)]
pub struct IndustryMatrix {
    /// Sorted metric values observed anywhere in the event table.
    pub event_values: Vec<String>,
    /// Industry → metric value → count (or per-client average), dense over
    /// `event_values`.
    pub rows: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Sum interaction counts per (industry, metric value) pair.
///
/// The grid is dense: every industry present in the roster gets a row and
/// every metric value in the event table gets a column, zero-filled where no
/// interactions match. With `average` set, each industry's totals are
/// divided by that industry's client count; an industry with zero clients
/// cannot occur (rows exist only for observed industries), but the division
/// is still guarded and leaves zeros in place.
pub fn interactions_by_industry(
    clients: &[Client],
    events: &[Interaction],
    metric: Metric,
    average: bool,
) -> IndustryMatrix {
    let values: BTreeSet<String> = events
        .iter()
        .map(|i| metric.select(i).to_string())
        .collect();

    let mut industry_sizes: BTreeMap<String, usize> = BTreeMap::new();
    for client in clients {
        *industry_sizes.entry(client.industry.clone()).or_insert(0) += 1;
    }

    let mut rows: BTreeMap<String, BTreeMap<String, f64>> = industry_sizes
        .keys()
        .map(|industry| {
            let zeroed: BTreeMap<String, f64> =
                values.iter().map(|v| (v.clone(), 0.0)).collect();
            (industry.clone(), zeroed)
        })
        .collect();

    for client in clients {
        if let Some(row) = rows.get_mut(&client.industry) {
            for interaction in &client.interactions {
                if let Some(cell) = row.get_mut(metric.select(interaction)) {
                    *cell += 1.0;
                }
            }
        }
    }

    if average {
        for (industry, row) in rows.iter_mut() {
            let size = industry_sizes.get(industry).copied().unwrap_or(0);
            if size == 0 {
                continue;
            }
            for cell in row.values_mut() {
                *cell /= size as f64;
            }
        }
    }

    IndustryMatrix {
        event_values: values.into_iter().collect(),
        rows,
    }
}

// ── Status × event matrix ─────────────────────────────────────────────────────

/// Dense (industry ∪ "All") × exact-status × metric-value grid.
#[derive(Debug, Clone)]
pub struct StatusEventMatrix {
    /// Sorted metric values observed anywhere in the event table.
    pub event_values: Vec<String>,
    /// Row groups: sorted industries followed by [`ALL_SEGMENT`].
    pub groups: Vec<String>,
    /// (group, exact status) → metric value → count (or per-client
    /// average), dense over `event_values`.
    pub cells: BTreeMap<(String, u8), BTreeMap<String, f64>>,
}

/// Metric-value distribution for every (industry ∪ "All") × status cell.
///
/// Cell membership uses **exact** status equality, deliberately unlike the
/// threshold semantics of [`crate::segments::by_status_threshold`]; the two
/// policies coexist by design. Every metric value observed anywhere appears
/// in every cell, defaulting to 0, so the grid is rectangular, never
/// sparse. With `average` set, counts are divided by the cell's client
/// count; a cell with zero clients keeps its zeros instead of faulting.
pub fn status_event_matrix(
    clients: &[Client],
    events: &[Interaction],
    metric: Metric,
    average: bool,
) -> StatusEventMatrix {
    let values: BTreeSet<String> = events
        .iter()
        .map(|i| metric.select(i).to_string())
        .collect();

    let industries: BTreeSet<String> = clients.iter().map(|c| c.industry.clone()).collect();
    let mut groups: Vec<String> = industries.into_iter().collect();
    groups.push(ALL_SEGMENT.to_string());

    let mut cells: BTreeMap<(String, u8), BTreeMap<String, f64>> = BTreeMap::new();
    for group in &groups {
        for status in OutreachStatus::MIN..=OutreachStatus::MAX {
            let members: Vec<&Client> = clients
                .iter()
                .filter(|c| {
                    c.status.value() == status
                        && (group == ALL_SEGMENT || &c.industry == group)
                })
                .collect();

            let mut distribution: BTreeMap<String, f64> =
                values.iter().map(|v| (v.clone(), 0.0)).collect();
            for client in &members {
                for interaction in &client.interactions {
                    if let Some(cell) = distribution.get_mut(metric.select(interaction)) {
                        *cell += 1.0;
                    }
                }
            }

            if average && !members.is_empty() {
                let count = members.len() as f64;
                for cell in distribution.values_mut() {
                    *cell /= count;
                }
            }

            cells.insert((group.clone(), status), distribution);
        }
    }

    StatusEventMatrix {
        event_values: values.into_iter().collect(),
        groups,
        cells,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
