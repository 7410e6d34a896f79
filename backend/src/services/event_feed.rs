use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::models::EventRow;
use shared::{Event, EventChanges, EventFilters, FeedServerMessage};

/// Sender for feed messages
pub type FeedSender = mpsc::UnboundedSender<FeedServerMessage>;

/// Snapshot window when a subscriber gives no explicit range.
const DEFAULT_WINDOW_DAYS: i64 = 365;

/// Upper bound on the advisory event cache.
const EVENT_CACHE_CAPACITY: usize = 512;

/// A single observed mutation of the events collection.
#[derive(Debug, Clone)]
pub enum EventChange {
    Added(Event),
    Modified(Event),
    Removed { id: Uuid, family_id: Uuid },
}

impl EventChange {
    pub fn family_id(&self) -> Uuid {
        match self {
            EventChange::Added(event) | EventChange::Modified(event) => event.family_id,
            EventChange::Removed { family_id, .. } => *family_id,
        }
    }
}

/// One live subscription scoped to a family, with optional filters/range.
#[derive(Debug)]
struct Subscription {
    sender: FeedSender,
    family_id: Uuid,
    filters: EventFilters,
    range_start: Option<DateTime<Utc>>,
    range_end: Option<DateTime<Utc>>,
}

/// Bounded id -> last-seen-event map fed from observed changes.
///
/// Advisory only: it avoids refetches on point lookups and is invalidated on
/// every observed change, never treated as the source of truth.
struct EventCache {
    entries: HashMap<Uuid, Event>,
    order: VecDeque<Uuid>,
}

impl EventCache {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn insert(&mut self, event: Event) {
        if !self.entries.contains_key(&event.id) {
            self.order.push_back(event.id);
        }
        self.entries.insert(event.id, event);

        while self.order.len() > EVENT_CACHE_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    fn invalidate(&mut self, id: &Uuid) {
        self.entries.remove(id);
    }

    fn get(&self, id: &Uuid) -> Option<Event> {
        self.entries.get(id).cloned()
    }
}

/// Live event feed manager
/// Tracks family-scoped subscribers and fans observed changes out to them,
/// each delivery carrying a fresh full snapshot plus the delta.
pub struct EventFeed {
    subscriptions: RwLock<HashMap<Uuid, Subscription>>,
    cache: RwLock<EventCache>,
}

impl EventFeed {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            subscriptions: RwLock::new(HashMap::new()),
            cache: RwLock::new(EventCache::new()),
        })
    }

    /// Register a subscription for a session. Re-subscribing under the same
    /// session id replaces the previous subscription.
    pub async fn subscribe(
        &self,
        session_id: Uuid,
        family_id: Uuid,
        filters: EventFilters,
        range_start: Option<DateTime<Utc>>,
        range_end: Option<DateTime<Utc>>,
        sender: FeedSender,
    ) {
        let subscription = Subscription {
            sender,
            family_id,
            filters,
            range_start,
            range_end,
        };
        self.subscriptions
            .write()
            .await
            .insert(session_id, subscription);
        log::debug!("Feed subscription registered: {} -> {}", session_id, family_id);
    }

    /// Remove a subscription. Idempotent: unknown session ids are a no-op.
    pub async fn unsubscribe(&self, session_id: &Uuid) {
        self.subscriptions.write().await.remove(session_id);
        log::debug!("Feed subscription removed: {}", session_id);
    }

    #[allow(dead_code)]
    pub async fn subscriber_count(&self, family_id: &Uuid) -> usize {
        self.subscriptions
            .read()
            .await
            .values()
            .filter(|s| s.family_id == *family_id)
            .count()
    }

    /// Cached copy of an event, if one was observed recently.
    pub async fn cached(&self, event_id: &Uuid) -> Option<Event> {
        self.cache.read().await.get(event_id)
    }

    /// Fill the cache from a read path (read-through).
    pub async fn remember(&self, event: Event) {
        self.cache.write().await.insert(event);
    }

    /// Fan a change out to every subscriber of its family, rebuilding each
    /// subscriber's snapshot from the store.
    pub async fn publish(&self, pool: &SqlitePool, change: EventChange) {
        {
            let mut cache = self.cache.write().await;
            match &change {
                EventChange::Added(event) | EventChange::Modified(event) => {
                    cache.insert(event.clone());
                }
                EventChange::Removed { id, .. } => cache.invalidate(id),
            }
        }

        let family_id = change.family_id();
        let subscriptions = self.subscriptions.read().await;
        for subscription in subscriptions
            .values()
            .filter(|s| s.family_id == family_id)
        {
            let changes = changes_for(&change, &subscription.filters);
            if changes.added.is_empty()
                && changes.modified.is_empty()
                && changes.removed.is_empty()
            {
                continue;
            }

            let snapshot = self.snapshot(pool, subscription).await;
            let _ = subscription
                .sender
                .send(FeedServerMessage::Update { snapshot, changes });
        }
    }

    async fn snapshot(&self, pool: &SqlitePool, subscription: &Subscription) -> Vec<Event> {
        let now = Utc::now();
        let start = subscription
            .range_start
            .unwrap_or(now - Duration::days(DEFAULT_WINDOW_DAYS));
        let end = subscription
            .range_end
            .unwrap_or(now + Duration::days(DEFAULT_WINDOW_DAYS));

        let rows: Result<Vec<EventRow>, sqlx::Error> = sqlx::query_as(
            r#"
            SELECT * FROM events
            WHERE family_id = ? AND start_time >= ? AND start_time <= ?
            ORDER BY start_time ASC
            "#,
        )
        .bind(subscription.family_id.to_string())
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await;

        match rows {
            Ok(rows) => rows
                .iter()
                .map(|row| row.to_shared())
                .filter(|event| subscription.filters.matches(event))
                .collect(),
            Err(err) => {
                log::error!("Feed snapshot query failed: {:?}", err);
                Vec::new()
            }
        }
    }
}

fn changes_for(change: &EventChange, filters: &EventFilters) -> EventChanges {
    let mut changes = EventChanges::default();
    match change {
        EventChange::Added(event) => {
            if filters.matches(event) {
                changes.added.push(event.clone());
            }
        }
        EventChange::Modified(event) => {
            if filters.matches(event) {
                changes.modified.push(event.clone());
            }
        }
        EventChange::Removed { id, .. } => changes.removed.push(*id),
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_pool;
    use shared::{EventStatus, EventType};

    fn sample_event(family_id: Uuid) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            family_id,
            title: "Swim class".to_string(),
            description: "".to_string(),
            location: "".to_string(),
            event_type: EventType::Activity,
            status: EventStatus::Confirmed,
            start_time: now,
            end_time: now + Duration::hours(1),
            timezone: "UTC".to_string(),
            child_id: None,
            child_name: None,
            attending_parent_id: None,
            attendees: vec![],
            linked_documents: vec![],
            created_by: Uuid::new_v4(),
            last_modified_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_subscribe_and_receive_added_change() {
        let pool = setup_pool().await;
        let feed = EventFeed::new();
        let family_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let (tx, mut rx) = mpsc::unbounded_channel();

        feed.subscribe(session_id, family_id, EventFilters::default(), None, None, tx)
            .await;
        assert_eq!(feed.subscriber_count(&family_id).await, 1);

        let event = sample_event(family_id);
        feed.publish(&pool, EventChange::Added(event.clone())).await;

        match rx.recv().await.unwrap() {
            FeedServerMessage::Update { changes, .. } => {
                assert_eq!(changes.added.len(), 1);
                assert_eq!(changes.added[0].id, event.id);
                assert!(changes.modified.is_empty());
                assert!(changes.removed.is_empty());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_removed_change_delivered_with_empty_snapshot() {
        let pool = setup_pool().await;
        let feed = EventFeed::new();
        let family_id = Uuid::new_v4();
        let (tx, mut rx) = mpsc::unbounded_channel();

        feed.subscribe(Uuid::new_v4(), family_id, EventFilters::default(), None, None, tx)
            .await;

        let event_id = Uuid::new_v4();
        feed.publish(
            &pool,
            EventChange::Removed {
                id: event_id,
                family_id,
            },
        )
        .await;

        match rx.recv().await.unwrap() {
            FeedServerMessage::Update { snapshot, changes } => {
                assert_eq!(changes.removed, vec![event_id]);
                assert!(snapshot.iter().all(|e| e.id != event_id));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_filters_suppress_non_matching_changes() {
        let pool = setup_pool().await;
        let feed = EventFeed::new();
        let family_id = Uuid::new_v4();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let filters = EventFilters {
            child_id: None,
            event_type: Some(EventType::Birthday),
        };
        feed.subscribe(Uuid::new_v4(), family_id, filters, None, None, tx)
            .await;

        // An activity event must not reach a birthday-only subscriber.
        feed.publish(&pool, EventChange::Added(sample_event(family_id)))
            .await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let feed = EventFeed::new();
        let session_id = Uuid::new_v4();
        let family_id = Uuid::new_v4();
        let (tx, _rx) = mpsc::unbounded_channel();

        feed.subscribe(session_id, family_id, EventFilters::default(), None, None, tx)
            .await;
        feed.unsubscribe(&session_id).await;
        feed.unsubscribe(&session_id).await;

        assert_eq!(feed.subscriber_count(&family_id).await, 0);
    }

    #[tokio::test]
    async fn test_cache_tracks_changes_and_stays_bounded() {
        let pool = setup_pool().await;
        let feed = EventFeed::new();
        let family_id = Uuid::new_v4();

        let event = sample_event(family_id);
        feed.publish(&pool, EventChange::Added(event.clone())).await;
        assert!(feed.cached(&event.id).await.is_some());

        feed.publish(
            &pool,
            EventChange::Removed {
                id: event.id,
                family_id,
            },
        )
        .await;
        assert!(feed.cached(&event.id).await.is_none());

        for _ in 0..(EVENT_CACHE_CAPACITY + 10) {
            feed.remember(sample_event(family_id)).await;
        }
        assert!(feed.cache.read().await.entries.len() <= EVENT_CACHE_CAPACITY);
    }
}
