//! Sequence-signature extraction.
//!
//! Turns a client's ordered interaction history into a canonical
//! [`Signature`] under one of two collapsing policies, and counts how many
//! clients in each segment produced each distinct signature.

use std::collections::{BTreeMap, BTreeSet};

use insights_core::models::{Client, CollapseMode, Interaction, Signature};

// ── Signature extraction ──────────────────────────────────────────────────────

/// Collapse an ordered interaction history into its signature.
///
/// The history must already be sorted ascending by `received_at`; the loader
/// guarantees this for attached interactions. An empty history yields an
/// empty signature.
pub fn signature(history: &[Interaction], mode: CollapseMode) -> Signature {
    let mut collapsed: Signature = Vec::new();
    for interaction in history {
        let keep = match mode {
            // Drop only immediate repeats; A,B,A survives intact.
            CollapseMode::Adjacent => collapsed
                .last()
                .map(|prev| prev != &interaction.source_event)
                .unwrap_or(true),
            // Drop any repeat regardless of adjacency, first occurrence wins.
            CollapseMode::FullDedup => !collapsed.contains(&interaction.source_event),
        };
        if keep {
            collapsed.push(interaction.source_event.clone());
        }
    }
    collapsed
}

/// Count signatures across all clients, ignoring segment boundaries.
///
/// Clients with no interactions are skipped entirely rather than counted
/// under the empty signature.
pub fn sequence_counts(clients: &[Client], mode: CollapseMode) -> BTreeMap<Signature, u64> {
    let mut counts: BTreeMap<Signature, u64> = BTreeMap::new();
    for client in clients {
        if client.interactions.is_empty() {
            continue;
        }
        *counts.entry(signature(&client.interactions, mode)).or_insert(0) += 1;
    }
    counts
}

// ── Per-segment crosstab ──────────────────────────────────────────────────────

/// Signature counts for one segment.
#[derive(Debug, Clone, Default)]
pub struct SegmentSequences {
    /// Total clients in the segment, with or without interactions.
    pub client_total: usize,
    /// Signature → number of clients in the segment that produced it.
    pub counts: BTreeMap<Signature, u64>,
}

/// Signature counts per segment, plus the union of all signatures observed
/// anywhere so the emitted grid can be dense over a fixed row set.
#[derive(Debug, Clone, Default)]
pub struct SequenceCrosstab {
    /// Every distinct signature observed in any segment.
    pub signatures: BTreeSet<Signature>,
    /// Segment label → its signature counts.
    pub segments: BTreeMap<String, SegmentSequences>,
}

impl SequenceCrosstab {
    /// Count for one (segment, signature) cell, zero when absent.
    pub fn count(&self, segment: &str, sig: &Signature) -> u64 {
        self.segments
            .get(segment)
            .and_then(|s| s.counts.get(sig).copied())
            .unwrap_or(0)
    }

    /// Penetration rates: each cell divided by the segment's **total**
    /// client count, including clients with no interactions. The result is
    /// dense over [`SequenceCrosstab::signatures`]. A segment with zero
    /// clients reports 0.0 everywhere rather than faulting on the division.
    pub fn percentages(&self) -> BTreeMap<String, BTreeMap<Signature, f64>> {
        let mut out: BTreeMap<String, BTreeMap<Signature, f64>> = BTreeMap::new();
        for (label, segment) in &self.segments {
            let mut cells: BTreeMap<Signature, f64> = BTreeMap::new();
            for sig in &self.signatures {
                let value = if segment.client_total == 0 {
                    0.0
                } else {
                    segment.counts.get(sig).copied().unwrap_or(0) as f64
                        / segment.client_total as f64
                };
                cells.insert(sig.clone(), value);
            }
            out.insert(label.clone(), cells);
        }
        out
    }
}

/// Count, per segment, how many clients produced each distinct signature.
///
/// Clients with no interactions contribute to `client_total` but to no
/// signature count.
pub fn by_segment(
    segments: &BTreeMap<String, Vec<&Client>>,
    mode: CollapseMode,
) -> SequenceCrosstab {
    let mut crosstab = SequenceCrosstab::default();
    for (label, members) in segments {
        let mut segment = SegmentSequences {
            client_total: members.len(),
            counts: BTreeMap::new(),
        };
        for client in members {
            if client.interactions.is_empty() {
                continue;
            }
            let sig = signature(&client.interactions, mode);
            crosstab.signatures.insert(sig.clone());
            *segment.counts.entry(sig).or_insert(0) += 1;
        }
        crosstab.segments.insert(label.clone(), segment);
    }
    crosstab
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments;
    use chrono::{TimeZone, Utc};
    use insights_core::models::OutreachStatus;

    fn make_history(events: &[&str]) -> Vec<Interaction> {
        events
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let ts = Utc
                    .with_ymd_and_hms(2017, 8, 1, 10, i as u32, 0)
                    .unwrap();
                Interaction::new("a@x.com", ts, "app", *name)
            })
            .collect()
    }

    fn make_client(id: &str, industry: &str, status: u8, events: &[&str]) -> Client {
        Client {
            id: id.to_string(),
            name: id.to_string(),
            company: "Acme".to_string(),
            city: "London".to_string(),
            industry: industry.to_string(),
            status: OutreachStatus::new(status).unwrap(),
            interactions: make_history(events),
        }
    }

    // ── signature ─────────────────────────────────────────────────────────────

    #[test]
    fn test_adjacent_collapse_keeps_non_adjacent_repeats() {
        let history = make_history(&["A", "A", "B", "B", "A"]);
        let sig = signature(&history, CollapseMode::Adjacent);
        assert_eq!(sig, vec!["app_A", "app_B", "app_A"]);
    }

    #[test]
    fn test_full_dedup_drops_all_repeats() {
        let history = make_history(&["A", "A", "B", "B", "A"]);
        let sig = signature(&history, CollapseMode::FullDedup);
        assert_eq!(sig, vec!["app_A", "app_B"]);
    }

    #[test]
    fn test_adjacent_collapse_aba_is_preserved() {
        let history = make_history(&["A", "B", "A"]);
        let sig = signature(&history, CollapseMode::Adjacent);
        assert_eq!(sig, vec!["app_A", "app_B", "app_A"]);
    }

    #[test]
    fn test_signature_empty_history() {
        assert!(signature(&[], CollapseMode::Adjacent).is_empty());
        assert!(signature(&[], CollapseMode::FullDedup).is_empty());
    }

    // ── sequence_counts ───────────────────────────────────────────────────────

    #[test]
    fn test_sequence_counts_groups_identical_signatures() {
        let clients = vec![
            make_client("a", "Gaming", 1, &["A", "B"]),
            make_client("b", "Gaming", 1, &["A", "A", "B"]),
            make_client("c", "Gaming", 1, &["B"]),
        ];
        let counts = sequence_counts(&clients, CollapseMode::Adjacent);

        // a and b collapse to the same signature.
        assert_eq!(counts[&vec!["app_A".to_string(), "app_B".to_string()]], 2);
        assert_eq!(counts[&vec!["app_B".to_string()]], 1);
    }

    #[test]
    fn test_sequence_counts_skips_empty_histories() {
        let clients = vec![
            make_client("a", "Gaming", 1, &[]),
            make_client("b", "Gaming", 1, &["A"]),
        ];
        let counts = sequence_counts(&clients, CollapseMode::Adjacent);

        assert!(!counts.contains_key(&Vec::<String>::new()));
        assert_eq!(counts.values().sum::<u64>(), 1);
    }

    // ── by_segment ────────────────────────────────────────────────────────────

    #[test]
    fn test_by_segment_counts_sum_to_clients_with_interactions() {
        let clients = vec![
            make_client("a", "Gaming", 1, &["A"]),
            make_client("b", "Gaming", 1, &["B"]),
            make_client("c", "Gaming", 1, &[]),
            make_client("d", "Fintech", 1, &["A", "B"]),
        ];
        let crosstab = by_segment(&segments::by_industry(&clients), CollapseMode::Adjacent);

        let gaming = &crosstab.segments["Gaming"];
        assert_eq!(gaming.client_total, 3);
        assert_eq!(gaming.counts.values().sum::<u64>(), 2);

        let fintech = &crosstab.segments["Fintech"];
        assert_eq!(fintech.counts.values().sum::<u64>(), 1);
    }

    #[test]
    fn test_by_segment_tracks_global_signature_union() {
        let clients = vec![
            make_client("a", "Gaming", 1, &["A"]),
            make_client("b", "Fintech", 1, &["B"]),
        ];
        let crosstab = by_segment(&segments::by_industry(&clients), CollapseMode::Adjacent);

        assert_eq!(crosstab.signatures.len(), 2);
        // Dense lookup: the signature observed only in Fintech reads 0 in Gaming.
        let sig_b = vec!["app_B".to_string()];
        assert_eq!(crosstab.count("Gaming", &sig_b), 0);
        assert_eq!(crosstab.count("Fintech", &sig_b), 1);
    }

    #[test]
    fn test_percentages_use_total_client_count() {
        // 4 clients in the segment, one with no interactions; the signature
        // produced by 2 of them must read 2/4, not 2/3.
        let clients = vec![
            make_client("a", "Gaming", 1, &["A"]),
            make_client("b", "Gaming", 1, &["A"]),
            make_client("c", "Gaming", 1, &["B"]),
            make_client("d", "Gaming", 1, &[]),
        ];
        let crosstab = by_segment(&segments::by_industry(&clients), CollapseMode::Adjacent);
        let rates = crosstab.percentages();

        let sig_a = vec!["app_A".to_string()];
        assert!((rates["Gaming"][&sig_a] - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentages_zero_client_segment_reports_zero() {
        // status>=5 has no members but must still yield defined cells.
        let clients = vec![make_client("a", "Gaming", 1, &["A"])];
        let crosstab =
            by_segment(&segments::by_status_threshold(&clients), CollapseMode::Adjacent);
        let rates = crosstab.percentages();

        let sig_a = vec!["app_A".to_string()];
        assert_eq!(rates["status>=5"][&sig_a], 0.0);
        assert!((rates["All"][&sig_a] - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_by_segment_full_dedup_converges_signatures() {
        let clients = vec![
            make_client("a", "Gaming", 1, &["A", "B", "A"]),
            make_client("b", "Gaming", 1, &["A", "B"]),
        ];
        let adjacent = by_segment(&segments::by_industry(&clients), CollapseMode::Adjacent);
        let dedup = by_segment(&segments::by_industry(&clients), CollapseMode::FullDedup);

        assert_eq!(adjacent.signatures.len(), 2);
        assert_eq!(dedup.signatures.len(), 1);
    }
}
