use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use loft_types::api::IngestEvent;
use loft_types::models::AnalyticsEvent;

use crate::Store;

/// Filters for per-user event retrieval. Each predicate is independent;
/// an inverted date range therefore yields an empty result, not an error.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Allow-list on event names; empty means "all".
    pub event_names: Vec<String>,
    pub limit: Option<usize>,
}

impl Store {
    /// Ingest a batch of client-reported events. `event_id` is the
    /// idempotency key: ids already stored are skipped, so the first
    /// ingestion wins and a later payload for the same id is discarded
    /// silently. Returns the number of newly stored events; an empty batch
    /// is a legal no-op.
    pub fn ingest_events(&self, batch: Vec<IngestEvent>) -> Result<usize> {
        let now = Utc::now();
        let ingested = self.with_tables_mut(|tables| {
            let mut ingested = 0;
            for event in batch {
                if tables.events.contains_key(&event.event_id) {
                    debug!("Skipping duplicate analytics event {}", event.event_id);
                    continue;
                }
                let record = AnalyticsEvent {
                    event_id: event.event_id.clone(),
                    user_id: event.identity.user_id,
                    event_name: event.event_name,
                    properties: event.properties,
                    timestamp: event.timestamp,
                    session_id: event.identity.session_id,
                    device_id: event.identity.device_id,
                    platform: event.platform,
                    app_version: event.app_version,
                    created_at: now,
                };
                tables.events.insert(event.event_id, record);
                ingested += 1;
            }
            Ok(ingested)
        })?;

        if ingested > 0 {
            info!("Ingested {} analytics event(s)", ingested);
        }
        Ok(ingested)
    }

    /// A user's events, newest first. Anonymous events (no user id) are
    /// never returned. Date bounds are inclusive on both ends; the name
    /// allow-list applies only when non-empty; `limit` truncates only when
    /// positive.
    pub fn query_events(&self, user_id: Uuid, filter: &EventFilter) -> Result<Vec<AnalyticsEvent>> {
        self.with_tables(|tables| {
            let mut events: Vec<AnalyticsEvent> = tables
                .events
                .values()
                .filter(|e| e.user_id == Some(user_id))
                .filter(|e| filter.start_date.is_none_or(|start| e.timestamp >= start))
                .filter(|e| filter.end_date.is_none_or(|end| e.timestamp <= end))
                .filter(|e| {
                    filter.event_names.is_empty() || filter.event_names.contains(&e.event_name)
                })
                .cloned()
                .collect();

            events.sort_by(|a, b| {
                b.timestamp
                    .cmp(&a.timestamp)
                    .then(b.event_id.cmp(&a.event_id))
            });
            if let Some(limit) = filter.limit {
                if limit > 0 {
                    events.truncate(limit);
                }
            }
            Ok(events)
        })
    }

    /// Remove every event stored for a user (data-erasure requests). The
    /// whole sweep happens under one lock hold, so it is all-or-nothing.
    pub fn delete_user_events(&self, user_id: Uuid) -> Result<usize> {
        let deleted = self.with_tables_mut(|tables| {
            let before = tables.events.len();
            tables.events.retain(|_, e| e.user_id != Some(user_id));
            Ok(before - tables.events.len())
        })?;

        info!("Deleted {} analytics event(s) for user {}", deleted, user_id);
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use loft_types::api::EventIdentity;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap()
    }

    fn event(id: &str, user: Option<Uuid>, name: &str, day: u32) -> IngestEvent {
        IngestEvent {
            event_id: id.into(),
            event_name: name.into(),
            properties: serde_json::json!({}),
            timestamp: at(day),
            identity: EventIdentity {
                user_id: user,
                device_id: None,
                session_id: None,
            },
            platform: None,
            app_version: None,
        }
    }

    #[test]
    fn ingestion_is_idempotent_first_payload_wins() {
        let store = Store::new();
        let user = Uuid::new_v4();

        let mut first = event("e1", Some(user), "open", 1);
        first.properties = serde_json::json!({ "source": "push" });
        assert_eq!(store.ingest_events(vec![first]).unwrap(), 1);

        let mut replay = event("e1", Some(user), "open", 2);
        replay.properties = serde_json::json!({ "source": "deep-link" });
        assert_eq!(store.ingest_events(vec![replay]).unwrap(), 0);

        let events = store.query_events(user, &EventFilter::default()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].properties, serde_json::json!({ "source": "push" }));
        assert_eq!(events[0].timestamp, at(1));
    }

    #[test]
    fn empty_batch_is_a_noop() {
        let store = Store::new();
        assert_eq!(store.ingest_events(vec![]).unwrap(), 0);
    }

    #[test]
    fn identity_is_projected_onto_scoping_fields() {
        let store = Store::new();
        let user = Uuid::new_v4();
        let mut payload = event("e1", Some(user), "open", 1);
        payload.identity.device_id = Some("pixel-9".into());
        payload.identity.session_id = Some("s-42".into());
        store.ingest_events(vec![payload]).unwrap();

        let events = store.query_events(user, &EventFilter::default()).unwrap();
        assert_eq!(events[0].device_id.as_deref(), Some("pixel-9"));
        assert_eq!(events[0].session_id.as_deref(), Some("s-42"));
        assert!(events[0].created_at >= at(1));
    }

    #[test]
    fn anonymous_events_excluded_from_user_queries() {
        let store = Store::new();
        let user = Uuid::new_v4();
        store
            .ingest_events(vec![
                event("mine", Some(user), "open", 1),
                event("anon", None, "open", 1),
            ])
            .unwrap();

        let events = store.query_events(user, &EventFilter::default()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_id, "mine");
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let store = Store::new();
        let user = Uuid::new_v4();
        store
            .ingest_events(vec![
                event("d1", Some(user), "open", 1),
                event("d2", Some(user), "open", 2),
                event("d3", Some(user), "open", 3),
            ])
            .unwrap();

        let filter = EventFilter {
            start_date: Some(at(2)),
            end_date: Some(at(3)),
            ..Default::default()
        };
        let events = store.query_events(user, &filter).unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["d3", "d2"]);
    }

    #[test]
    fn inverted_date_range_yields_empty() {
        let store = Store::new();
        let user = Uuid::new_v4();
        store.ingest_events(vec![event("e", Some(user), "open", 2)]).unwrap();

        let filter = EventFilter {
            start_date: Some(at(3)),
            end_date: Some(at(1)),
            ..Default::default()
        };
        assert!(store.query_events(user, &filter).unwrap().is_empty());
    }

    #[test]
    fn name_allow_list_filters_when_non_empty() {
        let store = Store::new();
        let user = Uuid::new_v4();
        store
            .ingest_events(vec![
                event("a", Some(user), "open", 1),
                event("b", Some(user), "tap", 2),
                event("c", Some(user), "close", 3),
            ])
            .unwrap();

        let filter = EventFilter {
            event_names: vec!["open".into(), "close".into()],
            ..Default::default()
        };
        let events = store.query_events(user, &filter).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.event_name != "tap"));
    }

    #[test]
    fn newest_first_with_positive_limit() {
        let store = Store::new();
        let user = Uuid::new_v4();
        store
            .ingest_events(vec![
                event("old", Some(user), "open", 1),
                event("new", Some(user), "open", 5),
                event("mid", Some(user), "open", 3),
            ])
            .unwrap();

        let filter = EventFilter {
            limit: Some(2),
            ..Default::default()
        };
        let events = store.query_events(user, &filter).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_id, "new");
        assert_eq!(events[1].event_id, "mid");

        // A zero limit means "no truncation".
        let filter = EventFilter {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(store.query_events(user, &filter).unwrap().len(), 3);
    }

    #[test]
    fn equal_timestamps_order_by_event_id_descending() {
        let store = Store::new();
        let user = Uuid::new_v4();
        store
            .ingest_events(vec![
                event("alpha", Some(user), "open", 2),
                event("beta", Some(user), "open", 2),
                event("gamma", Some(user), "open", 2),
            ])
            .unwrap();

        let events = store.query_events(user, &EventFilter::default()).unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["gamma", "beta", "alpha"]);
    }

    #[test]
    fn delete_for_user_removes_only_theirs() {
        let store = Store::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store
            .ingest_events(vec![
                event("a1", Some(alice), "open", 1),
                event("a2", Some(alice), "tap", 2),
                event("b1", Some(bob), "open", 1),
                event("anon", None, "open", 1),
            ])
            .unwrap();

        assert_eq!(store.delete_user_events(alice).unwrap(), 2);
        assert!(store.query_events(alice, &EventFilter::default()).unwrap().is_empty());
        assert_eq!(store.query_events(bob, &EventFilter::default()).unwrap().len(), 1);

        // Idempotent on re-run.
        assert_eq!(store.delete_user_events(alice).unwrap(), 0);
    }
}
