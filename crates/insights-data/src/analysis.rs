//! Main analysis pipeline for Lead Insights.
//!
//! Runs every report computation over an already-loaded client set and event
//! table, returning an [`AnalysisResult`] ready for the report emitter. All
//! inputs are explicit parameters and every table is a freshly constructed
//! value, so each report is testable in isolation and none shares state with
//! another.

use std::collections::BTreeMap;

use chrono::Utc;
use insights_core::models::{Client, CollapseMode, Interaction, Metric, SegmentKey, Signature};

use crate::crosstab::{self, IndustryMatrix, StatusEventMatrix};
use crate::segments::{self, StatusSummary};
use crate::sequences::{self, SequenceCrosstab};

// ── Public types ──────────────────────────────────────────────────────────────

/// Knobs controlling how the reports are computed.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Collapsing policy for sequence signatures.
    pub collapse_mode: CollapseMode,
    /// Interaction column counted by the crosstab reports.
    pub metric: Metric,
    /// Segmentation key for the sequence crosstab.
    pub segment_by: SegmentKey,
    /// Count each client at most once per event type in the frequency report.
    pub unique_clients: bool,
    /// Emit the sequence crosstab as penetration rates instead of counts.
    pub percentage: bool,
    /// Emit the crosstab grids as per-client averages instead of counts.
    pub average: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            collapse_mode: CollapseMode::Adjacent,
            metric: Metric::SourceEvent,
            segment_by: SegmentKey::Industry,
            unique_clients: false,
            percentage: false,
            average: false,
        }
    }
}

/// Metadata produced alongside the report tables.
#[derive(Debug, Clone)]
pub struct AnalysisMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Number of clients processed.
    pub clients_processed: usize,
    /// Number of event rows processed.
    pub interactions_processed: usize,
    /// Wall-clock seconds spent computing the report tables.
    pub transform_time_seconds: f64,
}

/// The complete output of [`analyze`]: every report table plus metadata.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// `source_event` → occurrence count (raw or unique-client).
    pub event_frequencies: BTreeMap<String, u64>,
    /// Signature → client count, across all clients.
    pub sequence_counts: BTreeMap<Signature, u64>,
    /// Signature counts per segment, dense over all observed signatures.
    pub sequences_by_segment: SequenceCrosstab,
    /// Client id → attached interaction count.
    pub interactions_per_client: BTreeMap<String, u64>,
    /// Industry × metric-value grid.
    pub interactions_by_industry: IndustryMatrix,
    /// Status-threshold × industry client-count summary.
    pub status_summary: StatusSummary,
    /// (Industry ∪ "All") × exact-status × metric-value grid.
    pub status_event_matrix: StatusEventMatrix,
    /// Metadata about this analysis run.
    pub metadata: AnalysisMetadata,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Compute every report over the loaded data.
///
/// Pure apart from clock reads for the metadata; identical inputs produce
/// identical tables (all maps are ordered), which is what makes the emitted
/// files byte-identical across runs.
pub fn analyze(
    clients: &[Client],
    events: &[Interaction],
    options: &ReportOptions,
) -> AnalysisResult {
    let transform_start = std::time::Instant::now();

    let segment_map = match options.segment_by {
        SegmentKey::Industry => segments::by_industry(clients),
        SegmentKey::Status => segments::by_status_threshold(clients),
    };

    let event_frequencies = crosstab::event_frequencies(events, options.unique_clients);
    let sequence_counts = sequences::sequence_counts(clients, options.collapse_mode);
    let sequences_by_segment = sequences::by_segment(&segment_map, options.collapse_mode);
    let interactions_per_client = crosstab::interactions_per_client(clients);
    let interactions_by_industry =
        crosstab::interactions_by_industry(clients, events, options.metric, options.average);
    let status_summary = segments::outreach_status_summary(clients);
    let status_event_matrix =
        crosstab::status_event_matrix(clients, events, options.metric, options.average);

    let transform_time = transform_start.elapsed().as_secs_f64();
    tracing::debug!(
        "Computed 7 report tables over {} clients / {} events in {:.3}s",
        clients.len(),
        events.len(),
        transform_time
    );

    AnalysisResult {
        event_frequencies,
        sequence_counts,
        sequences_by_segment,
        interactions_per_client,
        interactions_by_industry,
        status_summary,
        status_event_matrix,
        metadata: AnalysisMetadata {
            generated_at: Utc::now().to_rfc3339(),
            clients_processed: clients.len(),
            interactions_processed: events.len(),
            transform_time_seconds: transform_time,
        },
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
