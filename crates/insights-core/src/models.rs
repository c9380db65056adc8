use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::InsightsError;

/// The canonical collapsed sequence of `source_event` values for one client.
///
/// Two clients share a signature iff their collapsed sequences are identical
/// element-for-element, including order.
pub type Signature = Vec<String>;

/// How repeated events in a client's history are collapsed into a
/// [`Signature`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollapseMode {
    /// Drop an event equal to its immediate predecessor. Non-adjacent
    /// repeats are preserved: `A,B,A` stays `A,B,A`, `A,A,B` becomes `A,B`.
    Adjacent,
    /// Drop every event already seen earlier in the history, keeping
    /// first-occurrence order: `A,A,B,B,A` becomes `A,B`.
    FullDedup,
}

impl FromStr for CollapseMode {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adjacent" => Ok(Self::Adjacent),
            "full-dedup" => Ok(Self::FullDedup),
            other => Err(InsightsError::Config(format!(
                "unknown collapse mode: {other}"
            ))),
        }
    }
}

/// Which interaction column the crosstab reports count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// The combined `source_event` value.
    SourceEvent,
    /// The origin channel alone.
    Source,
    /// The action name alone.
    Event,
}

impl Metric {
    /// Select this metric's column from an interaction.
    pub fn select<'a>(&self, interaction: &'a Interaction) -> &'a str {
        match self {
            Metric::SourceEvent => &interaction.source_event,
            Metric::Source => &interaction.source,
            Metric::Event => &interaction.event,
        }
    }
}

impl FromStr for Metric {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source-event" => Ok(Self::SourceEvent),
            "source" => Ok(Self::Source),
            "event" => Ok(Self::Event),
            other => Err(InsightsError::Config(format!("unknown metric: {other}"))),
        }
    }
}

/// Segmentation key for the sequence crosstab report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKey {
    /// Exact-match partition on the industry string.
    Industry,
    /// Outreach-status threshold segments plus a synthetic "All" segment.
    Status,
}

impl FromStr for SegmentKey {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "industry" => Ok(Self::Industry),
            "status" => Ok(Self::Status),
            other => Err(InsightsError::Config(format!(
                "unknown segment key: {other}"
            ))),
        }
    }
}

/// Ordinal position in the engagement funnel, always in 1..=5.
///
/// Derived from the raw roster status string by taking its leading digit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct OutreachStatus(u8);

impl OutreachStatus {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Build a status from an already-validated ordinal.
    pub fn new(value: u8) -> Result<Self, InsightsError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(InsightsError::InvalidStatus(value.to_string()))
        }
    }

    /// Parse the leading digit of a raw roster status string, e.g.
    /// `"3 - responded"` parses to status 3.
    pub fn parse(raw: &str) -> Result<Self, InsightsError> {
        raw.chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .map(|d| d as u8)
            .ok_or_else(|| InsightsError::InvalidStatus(raw.to_string()))
            .and_then(|d| {
                Self::new(d).map_err(|_| InsightsError::InvalidStatus(raw.to_string()))
            })
    }

    /// The ordinal value, in 1..=5.
    pub fn value(self) -> u8 {
        self.0
    }
}

/// Combine an interaction's origin channel and action name into the derived
/// `source_event` column.
pub fn source_event(source: &str, event: &str) -> String {
    format!("{source}_{event}")
}

/// A single timestamped action by a client, read from the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Client identifier the event belongs to.
    pub client_id: String,
    /// UTC timestamp when the event was received.
    pub received_at: DateTime<Utc>,
    /// Origin channel of the event.
    pub source: String,
    /// Action / event name.
    pub event: String,
    /// Derived `"{source}_{event}"` column.
    pub source_event: String,
}

impl Interaction {
    /// Build an interaction, deriving `source_event` from its parts.
    pub fn new(
        client_id: impl Into<String>,
        received_at: DateTime<Utc>,
        source: impl Into<String>,
        event: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let event = event.into();
        let source_event = source_event(&source, &event);
        Self {
            client_id: client_id.into(),
            received_at,
            source,
            event,
            source_event,
        }
    }
}

/// An entity in the roster, with its attached interaction history.
///
/// The interaction list is populated once at load time, sorted ascending by
/// `received_at`, and never mutated afterwards. A client with no matching
/// event rows owns an empty list, so "zero interactions" is a structural
/// guarantee rather than a lookup that can fail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Unique client identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Company name.
    pub company: String,
    /// City.
    pub city: String,
    /// Industry, an opaque free-text string (no case or whitespace
    /// normalization, mirroring the unvalidated source data).
    pub industry: String,
    /// Position in the engagement funnel.
    pub status: OutreachStatus,
    /// Interaction history, sorted ascending by `received_at`.
    pub interactions: Vec<Interaction>,
}
