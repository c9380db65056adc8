use clap::Parser;
use std::path::PathBuf;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Batch analytics over a client roster and a timestamped event log
#[derive(Parser, Debug, Clone)]
#[command(
    name = "lead-insights",
    about = "Batch analytics over a client roster and a timestamped event log",
    version
)]
pub struct Settings {
    /// Path to the client roster CSV
    #[arg(long, default_value = "data/leads.csv")]
    pub clients: PathBuf,

    /// Path to the event log CSV
    #[arg(long, default_value = "data/events.csv")]
    pub events: PathBuf,

    /// Directory the report files are written to
    #[arg(long, default_value = "analysis")]
    pub output: PathBuf,

    /// How repeated events collapse into sequence signatures
    #[arg(long, default_value = "adjacent", value_parser = ["adjacent", "full-dedup"])]
    pub collapse_mode: String,

    /// Interaction column counted by the crosstab reports
    #[arg(long, default_value = "source-event", value_parser = ["source-event", "source", "event"])]
    pub metric: String,

    /// Segmentation key for the sequence crosstab
    #[arg(long, default_value = "industry", value_parser = ["industry", "status"])]
    pub segment_by: String,

    /// Count each client at most once per event type in the frequency report
    #[arg(long)]
    pub unique_clients: bool,

    /// Report sequence counts as a share of each segment's client total
    #[arg(long)]
    pub percentage: bool,

    /// Report crosstab cells as per-client averages
    #[arg(long)]
    pub average: bool,

    /// Log level
    #[arg(long, default_value = "info", value_parser = ["debug", "info", "warn", "error"])]
    pub log_level: String,
}
