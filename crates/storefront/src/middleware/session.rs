//! Session middleware configuration.
//!
//! Sessions live in process memory, like the carts they point at: a restart
//! signs everyone out and empties every cart. Records idle for longer than
//! the session expiry are evicted from the store.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore, session_store};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "souq_session";

/// Session expiry after the last request, in days.
const SESSION_EXPIRY_DAYS: u32 = 7;

/// In-memory session store with idle eviction.
#[derive(Clone, Debug)]
pub struct MokaSessionStore {
    records: Cache<Id, Record>,
}

impl MokaSessionStore {
    /// Create a store that drops records untouched for `idle_timeout`.
    #[must_use]
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            records: Cache::builder().time_to_idle(idle_timeout).build(),
        }
    }
}

#[async_trait]
impl SessionStore for MokaSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        loop {
            let value = record.clone();
            let entry = self
                .records
                .entry(record.id)
                .or_insert_with(async { value })
                .await;
            if entry.is_fresh() {
                return Ok(());
            }
            // Id collision: draw a new one.
            record.id = Id::default();
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.records.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let Some(record) = self.records.get(session_id).await else {
            return Ok(None);
        };

        if record.expiry_date > OffsetDateTime::now_utc() {
            Ok(Some(record))
        } else {
            self.records.invalidate(session_id).await;
            Ok(None)
        }
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records.invalidate(session_id).await;
        Ok(())
    }
}

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MokaSessionStore> {
    SessionManagerLayer::new(MokaSessionStore::new(session_idle_timeout()))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::days(i64::from(SESSION_EXPIRY_DAYS)),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Idle timeout matching the session cookie's inactivity expiry.
fn session_idle_timeout() -> Duration {
    Duration::from_secs(u64::from(SESSION_EXPIRY_DAYS) * 24 * 60 * 60)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_sessions::cookie::time::Duration as TimeDuration;

    use super::*;

    fn record(expires_in: TimeDuration) -> Record {
        Record {
            id: Id::default(),
            data: std::collections::HashMap::default(),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_save_load_delete() {
        let store = MokaSessionStore::new(Duration::from_secs(60));
        let mut rec = record(TimeDuration::minutes(30));
        rec.data
            .insert("cart_id".to_string(), serde_json::json!("abc"));

        store.create(&mut rec).await.unwrap();
        let loaded = store.load(&rec.id).await.unwrap().unwrap();
        assert_eq!(loaded.data, rec.data);

        store.delete(&rec.id).await.unwrap();
        assert!(store.load(&rec.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_replaces_colliding_id() {
        let store = MokaSessionStore::new(Duration::from_secs(60));
        let mut first = record(TimeDuration::minutes(30));
        store.create(&mut first).await.unwrap();

        let mut second = record(TimeDuration::minutes(30));
        second.id = first.id;
        store.create(&mut second).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(store.load(&first.id).await.unwrap().is_some());
        assert!(store.load(&second.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_record_is_dropped_on_load() {
        let store = MokaSessionStore::new(Duration::from_secs(60));
        let rec = record(TimeDuration::seconds(-1));
        store.save(&rec).await.unwrap();

        assert!(store.load(&rec.id).await.unwrap().is_none());
        store.records.run_pending_tasks().await;
        assert_eq!(store.records.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_idle_records_are_evicted() {
        let store = MokaSessionStore::new(Duration::from_millis(50));
        let rec = record(TimeDuration::minutes(30));
        store.save(&rec).await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(store.load(&rec.id).await.unwrap().is_none());
        store.records.run_pending_tasks().await;
        assert_eq!(store.records.entry_count(), 0);
    }

    #[test]
    fn test_idle_timeout_matches_cookie_expiry() {
        assert_eq!(session_idle_timeout(), Duration::from_secs(7 * 24 * 60 * 60));
    }
}
