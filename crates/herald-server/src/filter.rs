//! Staleness admission for change events.
//!
//! Two windows guard the pipeline.  The subscription itself only delivers
//! messages created after service start minus a grace period, which covers
//! the race between process start and the first poll.  The in-pipeline
//! double check then drops admitted messages that are older than the
//! processing-staleness bound: after a long outage the backlog would
//! otherwise arrive all at once as a storm of stale notifications.
//!
//! Boundary policy: strictly older than a bound drops, exactly on it
//! admits.  A missing or malformed `createdAt` admits — a client that
//! failed to write the timestamp must not have its message silently
//! suppressed.

use chrono::{DateTime, Duration, Utc};

use herald_store::{ChangeEvent, ChangeKind};

/// Why an event was let through or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Process the event.
    Admitted,
    /// Not a newly created message (update or delete).
    NotAnInsert,
    /// Created before the service's admission threshold.
    BeforeStartWindow,
    /// Older than the processing-staleness bound.
    TooStale,
}

/// Admission rules shared by every event, fixed at startup.
#[derive(Debug, Clone)]
pub struct StalenessFilter {
    started_at: DateTime<Utc>,
    grace: Duration,
    max_age: Duration,
}

impl StalenessFilter {
    pub fn new(started_at: DateTime<Utc>, grace_secs: u64, max_age_secs: u64) -> Self {
        Self {
            started_at,
            grace: Duration::seconds(grace_secs as i64),
            max_age: Duration::seconds(max_age_secs as i64),
        }
    }

    /// The subscription's lower bound: messages created at or before this
    /// instant must never be delivered at all.
    pub fn lower_bound(&self) -> DateTime<Utc> {
        self.started_at - self.grace
    }

    /// Decide an event against the current wall clock.
    pub fn admit(&self, event: &ChangeEvent) -> Admission {
        self.admit_at(event, Utc::now())
    }

    /// Decide an event at an explicit instant.
    pub fn admit_at(&self, event: &ChangeEvent, now: DateTime<Utc>) -> Admission {
        if event.kind != ChangeKind::Added {
            return Admission::NotAnInsert;
        }

        let Some(created_at) = event.message.created_at else {
            return Admission::Admitted;
        };

        if created_at < self.lower_bound() {
            return Admission::BeforeStartWindow;
        }
        if created_at < now - self.max_age {
            return Admission::TooStale;
        }

        Admission::Admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use herald_store::Message;

    fn event(kind: ChangeKind, created_at: Option<DateTime<Utc>>) -> ChangeEvent {
        ChangeEvent {
            kind,
            message: Message {
                id: "msg-1".to_string(),
                chat_id: "chat-1".to_string(),
                sender_id: "alice".to_string(),
                display_name: Some("Alice".to_string()),
                created_at,
            },
        }
    }

    fn filter_at(start: DateTime<Utc>) -> StalenessFilter {
        StalenessFilter::new(start, 60, 90)
    }

    #[test]
    fn test_fresh_insert_is_admitted() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let filter = filter_at(start);
        let now = start + Duration::seconds(30);

        let e = event(ChangeKind::Added, Some(now - Duration::seconds(1)));
        assert_eq!(filter.admit_at(&e, now), Admission::Admitted);
    }

    #[test]
    fn test_updates_and_deletes_are_dropped() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let filter = filter_at(start);

        let e = event(ChangeKind::Modified, Some(start));
        assert_eq!(filter.admit_at(&e, start), Admission::NotAnInsert);

        let e = event(ChangeKind::Removed, Some(start));
        assert_eq!(filter.admit_at(&e, start), Admission::NotAnInsert);
    }

    #[test]
    fn test_created_before_start_window_is_dropped() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let filter = filter_at(start);

        let e = event(
            ChangeKind::Added,
            Some(start - Duration::seconds(61)),
        );
        assert_eq!(filter.admit_at(&e, start), Admission::BeforeStartWindow);
    }

    #[test]
    fn test_start_window_boundary_admits() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let filter = filter_at(start);

        // Exactly on the lower bound: not strictly older, so it stays.
        let e = event(ChangeKind::Added, Some(start - Duration::seconds(60)));
        assert_eq!(filter.admit_at(&e, start), Admission::Admitted);
    }

    #[test]
    fn test_stale_insert_is_dropped_despite_start_window() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let filter = filter_at(start);
        // Created just inside the grace window, but observed long after.
        let created = start - Duration::seconds(30);
        let now = created + Duration::seconds(91);

        let e = event(ChangeKind::Added, Some(created));
        assert_eq!(filter.admit_at(&e, now), Admission::TooStale);
    }

    #[test]
    fn test_staleness_boundary_admits() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let filter = filter_at(start);
        let created = start + Duration::seconds(10);
        let now = created + Duration::seconds(90);

        let e = event(ChangeKind::Added, Some(created));
        assert_eq!(filter.admit_at(&e, now), Admission::Admitted);
    }

    #[test]
    fn test_missing_timestamp_is_admitted() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let filter = filter_at(start);

        let e = event(ChangeKind::Added, None);
        assert_eq!(filter.admit_at(&e, start), Admission::Admitted);
    }

    #[test]
    fn test_lower_bound_is_start_minus_grace() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let filter = filter_at(start);
        assert_eq!(filter.lower_bound(), start - Duration::seconds(60));
    }
}
