use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::record::WorkflowRecord;

/// Snapshots older than this are treated as absent.
pub const FRESHNESS_MS: i64 = 3_600_000;

/// Cached copy of the accumulated records plus pagination progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub captured_at: DateTime<Utc>,
    pub records: Vec<WorkflowRecord>,
    pub total_count: u64,
    pub next_page: u32,
}

impl CacheSnapshot {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.captured_at)
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.age(now) < Duration::milliseconds(FRESHNESS_MS)
    }
}

/// A string-valued key-value slot store.
pub trait CacheStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn put(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

pub fn load_snapshot<C: CacheStore + ?Sized>(store: &C, key: &str) -> Result<Option<CacheSnapshot>> {
    match store.get(key)? {
        Some(raw) => {
            let snap = serde_json::from_str(&raw)
                .with_context(|| format!("cache slot '{}' holds malformed snapshot", key))?;
            Ok(Some(snap))
        }
        None => Ok(None),
    }
}

/// Replaces the slot wholesale.
pub fn save_snapshot<C: CacheStore + ?Sized>(store: &mut C, key: &str, snap: &CacheSnapshot) -> Result<()> {
    let raw = serde_json::to_string(snap)?;
    store.put(key, &raw)
}

/// Returns the snapshot only when it is still fresh at `now`.
pub fn load_fresh<C: CacheStore + ?Sized>(
    store: &C,
    key: &str,
    now: DateTime<Utc>,
) -> Result<Option<CacheSnapshot>> {
    Ok(load_snapshot(store, key)?.filter(|s| s.is_fresh(now)))
}

pub struct SqliteCache {
    conn: Connection,
}

impl SqliteCache {
    pub fn new(path: &str) -> Result<Self> {
        Ok(Self { conn: Connection::open(path)? })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self { conn: Connection::open_in_memory()? })
    }

    pub fn init(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS cache_slots (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            );
            COMMIT;",
        )?;
        Ok(())
    }
}

impl CacheStore for SqliteCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM cache_slots WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO cache_slots (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM cache_slots WHERE key = ?1", params![key])?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    slots: HashMap<String, String>,
    pub writes: usize,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.writes += 1;
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.slots.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap_at(captured_at: DateTime<Utc>) -> CacheSnapshot {
        CacheSnapshot {
            captured_at,
            records: Vec::new(),
            total_count: 0,
            next_page: 1,
        }
    }

    #[test]
    fn test_freshness_window() {
        let now: DateTime<Utc> = "2024-01-01T12:00:00Z".parse().unwrap();
        assert!(snap_at(now - Duration::minutes(59)).is_fresh(now));
        assert!(!snap_at(now - Duration::minutes(61)).is_fresh(now));
        assert!(!snap_at(now - Duration::milliseconds(FRESHNESS_MS)).is_fresh(now));
        assert!(snap_at(now - Duration::milliseconds(FRESHNESS_MS - 1)).is_fresh(now));
    }

    #[test]
    fn test_sqlite_slot_replaces_value() {
        let mut store = SqliteCache::in_memory().unwrap();
        store.init().unwrap();
        assert_eq!(store.get("workflows").unwrap(), None);
        store.put("workflows", "a").unwrap();
        store.put("workflows", "b").unwrap();
        assert_eq!(store.get("workflows").unwrap().as_deref(), Some("b"));
        store.remove("workflows").unwrap();
        assert_eq!(store.get("workflows").unwrap(), None);
    }

    #[test]
    fn test_malformed_snapshot_is_error() {
        let mut store = MemoryCache::new();
        store.put("workflows", "{not json").unwrap();
        assert!(load_snapshot(&store, "workflows").is_err());
    }

    #[test]
    fn test_load_fresh_filters_expired() {
        let now: DateTime<Utc> = "2024-01-01T12:00:00Z".parse().unwrap();
        let mut store = MemoryCache::new();
        save_snapshot(&mut store, "workflows", &snap_at(now - Duration::minutes(61))).unwrap();
        assert!(load_snapshot(&store, "workflows").unwrap().is_some());
        assert!(load_fresh(&store, "workflows", now).unwrap().is_none());
    }
}
