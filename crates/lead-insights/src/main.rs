mod bootstrap;
mod emitter;

use anyhow::Result;
use clap::Parser;
use insights_core::models::{CollapseMode, Metric, SegmentKey};
use insights_core::settings::Settings;
use insights_data::analysis::{analyze, ReportOptions};
use insights_data::loader;

fn main() -> Result<()> {
    let settings = Settings::parse();
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("lead-insights v{} starting", env!("CARGO_PKG_VERSION"));

    // Resolve the typed configuration before touching any input, so an
    // unknown mode or metric fails here and not mid-aggregation.
    let options = ReportOptions {
        collapse_mode: settings.collapse_mode.parse::<CollapseMode>()?,
        metric: settings.metric.parse::<Metric>()?,
        segment_by: settings.segment_by.parse::<SegmentKey>()?,
        unique_clients: settings.unique_clients,
        percentage: settings.percentage,
        average: settings.average,
    };

    let load_start = std::time::Instant::now();
    let events = loader::load_interactions(&settings.events)?;
    let clients = loader::load_clients(&settings.clients, &events)?;
    tracing::info!(
        "Loaded {} clients and {} interactions in {:.2}s",
        clients.len(),
        events.len(),
        load_start.elapsed().as_secs_f64()
    );

    let result = analyze(&clients, &events, &options);

    bootstrap::ensure_output_dir(&settings.output)?;

    // Reports are independent; a failed write is logged and the remaining
    // files are still produced.
    let out = settings.output.as_path();
    let outcomes = [
        (
            "event_frequency.csv",
            emitter::write_event_frequency(out, &result.event_frequencies),
        ),
        (
            "ordered_events.csv",
            emitter::write_sequence_counts(out, &result.sequence_counts),
        ),
        (
            "sequences_by_segment.csv",
            emitter::write_sequences_by_segment(
                out,
                &result.sequences_by_segment,
                options.percentage,
            ),
        ),
        (
            "interactions_per_client.csv",
            emitter::write_interactions_per_client(out, &result.interactions_per_client),
        ),
        (
            "interactions_by_industry.csv",
            emitter::write_interactions_by_industry(out, &result.interactions_by_industry),
        ),
        (
            "outreach_status_summary.csv",
            emitter::write_status_summary(out, &result.status_summary),
        ),
        (
            "status_event_matrix.csv",
            emitter::write_status_event_matrix(out, &result.status_event_matrix),
        ),
    ];

    let report_count = outcomes.len();
    let mut failures = 0usize;
    for (name, outcome) in outcomes {
        match outcome {
            Ok(()) => tracing::info!("Wrote {}", out.join(name).display()),
            Err(err) => {
                failures += 1;
                tracing::error!("Failed to write {name}: {err}");
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} report(s) failed to write");
    }

    tracing::info!(
        "Done: {} reports in {:.3}s of aggregation",
        report_count,
        result.metadata.transform_time_seconds
    );
    Ok(())
}
