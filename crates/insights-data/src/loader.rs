//! CSV ingestion for Lead Insights.
//!
//! Reads the event log and the client roster from disk, converts them into
//! [`Interaction`] and [`Client`] structs and attaches each client's
//! interaction subset in timestamp order. Malformed rows are fatal: the
//! downstream aggregations assume clean input.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use insights_core::error::{InsightsError, Result};
use insights_core::models::{Client, Interaction, OutreachStatus};
use serde::Deserialize;
use tracing::{debug, info};

// ── Raw CSV rows ──────────────────────────────────────────────────────────────

/// One row of the event log. Expected header:
/// `email,received_at,source,event`.
#[derive(Debug, Deserialize)]
struct EventRow {
    email: String,
    received_at: String,
    source: String,
    event: String,
}

/// One row of the client roster. Expected header:
/// `id,name,company,city,industry,status`.
#[derive(Debug, Deserialize)]
struct ClientRow {
    id: String,
    name: String,
    company: String,
    city: String,
    industry: String,
    status: String,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load and normalize the event log.
///
/// * Exact-duplicate rows are dropped (first occurrence wins).
/// * The derived `source_event` column is attached to every row.
/// * The result is sorted ascending by `(client_id, received_at)`, the order
///   the sequence extractor depends on.
pub fn load_interactions(path: &Path) -> Result<Vec<Interaction>> {
    let mut reader = open_csv(path)?;

    let mut interactions: Vec<Interaction> = Vec::new();
    let mut seen: HashSet<(String, DateTime<Utc>, String, String)> = HashSet::new();
    let mut duplicates = 0u64;

    for row in reader.deserialize::<EventRow>() {
        let row = row?;
        let received_at = parse_timestamp(&row.received_at)?;
        let key = (
            row.email.clone(),
            received_at,
            row.source.clone(),
            row.event.clone(),
        );
        if !seen.insert(key) {
            duplicates += 1;
            continue;
        }
        interactions.push(Interaction::new(row.email, received_at, row.source, row.event));
    }

    interactions.sort_by(|a, b| {
        a.client_id
            .cmp(&b.client_id)
            .then(a.received_at.cmp(&b.received_at))
    });

    debug!(
        "Loaded {} interactions from {} ({} duplicate rows dropped)",
        interactions.len(),
        path.display(),
        duplicates
    );

    Ok(interactions)
}

/// Load the client roster and attach each client's interaction subset.
///
/// The outreach status is the leading digit of the raw status column; a row
/// whose status does not parse aborts the load. Clients without matching
/// event rows end up with an empty interaction list.
pub fn load_clients(path: &Path, interactions: &[Interaction]) -> Result<Vec<Client>> {
    let mut reader = open_csv(path)?;

    let mut clients: Vec<Client> = Vec::new();
    for row in reader.deserialize::<ClientRow>() {
        let row = row?;
        let status = OutreachStatus::parse(&row.status)?;
        clients.push(Client {
            id: row.id,
            name: row.name,
            company: row.company,
            city: row.city,
            industry: row.industry,
            status,
            interactions: Vec::new(),
        });
    }

    attach_interactions(&mut clients, interactions);

    info!(
        "Loaded {} clients from {}",
        clients.len(),
        path.display()
    );

    Ok(clients)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn open_csv(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    let file = std::fs::File::open(path).map_err(|source| InsightsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(csv::Reader::from_reader(file))
}

/// Parse an event-log timestamp.
///
/// Accepts RFC 3339, `"%Y-%m-%d %H:%M:%S"` (with optional fraction), its
/// `T`-separated variant, and bare dates (midnight UTC).
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(InsightsError::TimestampParse(raw.to_string()))
}

/// Hand each client ownership of its interaction subset.
///
/// `interactions` is already sorted by `(client_id, received_at)`, so the
/// per-client lists come out sorted by timestamp.
fn attach_interactions(clients: &mut [Client], interactions: &[Interaction]) {
    let mut by_client: HashMap<&str, Vec<Interaction>> = HashMap::new();
    for interaction in interactions {
        by_client
            .entry(interaction.client_id.as_str())
            .or_default()
            .push(interaction.clone());
    }
    for client in clients.iter_mut() {
        client.interactions = by_client.remove(client.id.as_str()).unwrap_or_default();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn write_csv(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    const EVENTS_HEADER: &str = "email,received_at,source,event";
    const CLIENTS_HEADER: &str = "id,name,company,city,industry,status";

    // ── load_interactions ─────────────────────────────────────────────────────

    #[test]
    fn test_load_interactions_basic() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "events.csv",
            &[
                EVENTS_HEADER,
                "a@x.com,2017-08-01 10:00:00,email,opened",
                "b@y.com,2017-08-01 11:00:00,web,visit",
            ],
        );

        let interactions = load_interactions(&path).unwrap();
        assert_eq!(interactions.len(), 2);
        assert_eq!(interactions[0].client_id, "a@x.com");
        assert_eq!(interactions[0].source_event, "email_opened");
    }

    #[test]
    fn test_load_interactions_drops_exact_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "events.csv",
            &[
                EVENTS_HEADER,
                "a@x.com,2017-08-01 10:00:00,email,opened",
                "a@x.com,2017-08-01 10:00:00,email,opened",
            ],
        );

        let interactions = load_interactions(&path).unwrap();
        assert_eq!(interactions.len(), 1);
    }

    #[test]
    fn test_load_interactions_keeps_same_timestamp_different_event() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "events.csv",
            &[
                EVENTS_HEADER,
                "a@x.com,2017-08-01 10:00:00,email,opened",
                "a@x.com,2017-08-01 10:00:00,email,clicked",
            ],
        );

        let interactions = load_interactions(&path).unwrap();
        assert_eq!(interactions.len(), 2);
    }

    #[test]
    fn test_load_interactions_sorted_by_client_then_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "events.csv",
            &[
                EVENTS_HEADER,
                "b@y.com,2017-08-01 09:00:00,web,visit",
                "a@x.com,2017-08-02 10:00:00,email,opened",
                "a@x.com,2017-08-01 10:00:00,email,clicked",
            ],
        );

        let interactions = load_interactions(&path).unwrap();
        assert_eq!(interactions[0].client_id, "a@x.com");
        assert_eq!(interactions[0].event, "clicked");
        assert_eq!(interactions[1].event, "opened");
        assert_eq!(interactions[2].client_id, "b@y.com");
    }

    #[test]
    fn test_load_interactions_malformed_timestamp_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "events.csv",
            &[EVENTS_HEADER, "a@x.com,yesterday,email,opened"],
        );

        let err = load_interactions(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid timestamp format"));
    }

    #[test]
    fn test_load_interactions_missing_file() {
        let err = load_interactions(Path::new("/tmp/does-not-exist-insights/events.csv"))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }

    // ── parse_timestamp ───────────────────────────────────────────────────────

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let ts = parse_timestamp("2017-08-01T10:00:00Z").unwrap();
        assert_eq!(ts.to_rfc3339(), "2017-08-01T10:00:00+00:00");
    }

    #[test]
    fn test_parse_timestamp_space_separated() {
        assert!(parse_timestamp("2017-08-01 10:00:00").is_ok());
    }

    #[test]
    fn test_parse_timestamp_date_only_is_midnight() {
        let ts = parse_timestamp("2017-08-01").unwrap();
        assert_eq!(ts.to_rfc3339(), "2017-08-01T00:00:00+00:00");
    }

    // ── load_clients ──────────────────────────────────────────────────────────

    #[test]
    fn test_load_clients_attaches_interactions_in_order() {
        let dir = TempDir::new().unwrap();
        let events_path = write_csv(
            dir.path(),
            "events.csv",
            &[
                EVENTS_HEADER,
                "a@x.com,2017-08-02 10:00:00,email,opened",
                "a@x.com,2017-08-01 10:00:00,web,visit",
            ],
        );
        let clients_path = write_csv(
            dir.path(),
            "leads.csv",
            &[
                CLIENTS_HEADER,
                "a@x.com,Ada,Acme,London,Gaming,3 - responded",
            ],
        );

        let interactions = load_interactions(&events_path).unwrap();
        let clients = load_clients(&clients_path, &interactions).unwrap();

        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].status.value(), 3);
        assert_eq!(clients[0].interactions.len(), 2);
        assert!(clients[0].interactions[0].received_at <= clients[0].interactions[1].received_at);
    }

    #[test]
    fn test_load_clients_without_events_gets_empty_history() {
        let dir = TempDir::new().unwrap();
        let clients_path = write_csv(
            dir.path(),
            "leads.csv",
            &[CLIENTS_HEADER, "b@y.com,Bo,Initech,Berlin,Fintech,1 - cold"],
        );

        let clients = load_clients(&clients_path, &[]).unwrap();
        assert_eq!(clients.len(), 1);
        assert!(clients[0].interactions.is_empty());
    }

    #[test]
    fn test_load_clients_invalid_status_is_fatal() {
        let dir = TempDir::new().unwrap();
        let clients_path = write_csv(
            dir.path(),
            "leads.csv",
            &[CLIENTS_HEADER, "c@z.com,Cy,Umbrella,Oslo,Biotech,unknown"],
        );

        let err = load_clients(&clients_path, &[]).unwrap_err();
        assert!(err.to_string().contains("Invalid outreach status"));
    }

    #[test]
    fn test_attached_count_matches_event_rows() {
        let dir = TempDir::new().unwrap();
        let events_path = write_csv(
            dir.path(),
            "events.csv",
            &[
                EVENTS_HEADER,
                "a@x.com,2017-08-01 10:00:00,email,opened",
                "a@x.com,2017-08-02 10:00:00,email,clicked",
                "b@y.com,2017-08-01 10:00:00,web,visit",
            ],
        );
        let clients_path = write_csv(
            dir.path(),
            "leads.csv",
            &[
                CLIENTS_HEADER,
                "a@x.com,Ada,Acme,London,Gaming,3 - responded",
                "b@y.com,Bo,Initech,Berlin,Fintech,1 - cold",
            ],
        );

        let interactions = load_interactions(&events_path).unwrap();
        let clients = load_clients(&clients_path, &interactions).unwrap();

        for client in &clients {
            let matching = interactions
                .iter()
                .filter(|i| i.client_id == client.id)
                .count();
            assert_eq!(client.interactions.len(), matching);
        }
    }
}
