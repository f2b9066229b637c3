use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::CACHE_FILE_NAME;
use crate::version::error::CacheError;

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    /// Seconds since UNIX epoch
    cached_at: i64,
}

/// Persisted key -> result map with a time-to-live.
///
/// The backing SQLite file is read once on first access and written at most
/// once per [`flush`](Self::flush). Expired entries are hidden from
/// [`get`](Self::get) but stay in memory until overwritten.
///
/// Concurrent processes sharing a cache directory are not coordinated; the
/// last flush wins.
pub struct ResultCache<T> {
    cache_dir: PathBuf,
    ttl_secs: i64,
    entries: Option<HashMap<String, Entry<T>>>,
    dirty: bool,
}

impl<T> ResultCache<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    pub fn new(cache_dir: &Path, ttl_secs: i64) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            ttl_secs,
            entries: None,
            dirty: false,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.cache_dir.join(CACHE_FILE_NAME)
    }

    /// Fresh value for `key`, if any
    pub fn get(&mut self, key: &str) -> Option<T> {
        let ttl_secs = self.ttl_secs;
        let now = current_timestamp();
        self.entries()
            .get(key)
            .filter(|entry| now - entry.cached_at <= ttl_secs)
            .map(|entry| entry.value.clone())
    }

    pub fn has(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn set(&mut self, key: &str, value: T) {
        let entry = Entry {
            value,
            cached_at: current_timestamp(),
        };
        self.entries().insert(key.to_string(), entry);
        self.dirty = true;
    }

    /// Persist buffered changes; does nothing when nothing changed
    pub fn flush(&mut self) -> Result<(), CacheError> {
        if !self.dirty {
            return Ok(());
        }
        let Some(entries) = &self.entries else {
            return Ok(());
        };

        std::fs::create_dir_all(&self.cache_dir)?;
        let mut conn = Connection::open(self.db_path())?;
        create_schema(&conn)?;

        let tx = conn.transaction()?;
        tx.execute("DELETE FROM results", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO results (package, result, cached_at) VALUES (?1, ?2, ?3)",
            )?;
            for (key, entry) in entries {
                let json = serde_json::to_string(&entry.value)?;
                stmt.execute(rusqlite::params![key, json, entry.cached_at])?;
            }
        }
        tx.commit()?;

        debug!("Flushed {} cache entries to {:?}", entries.len(), self.db_path());
        self.dirty = false;
        Ok(())
    }

    /// Delete the backing store and forget everything in memory
    pub fn clear(&mut self) -> Result<(), CacheError> {
        let path = self.db_path();
        match std::fs::remove_file(&path) {
            Ok(()) => info!("Removed cache {:?}", path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.entries = Some(HashMap::new());
        self.dirty = false;
        Ok(())
    }

    fn entries(&mut self) -> &mut HashMap<String, Entry<T>> {
        let path = self.db_path();
        self.entries.get_or_insert_with(|| match load(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Ignoring unreadable cache {:?}: {}", path, e);
                HashMap::new()
            }
        })
    }
}

/// Get current timestamp in seconds since UNIX epoch
fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

fn create_schema(conn: &Connection) -> Result<(), CacheError> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS results (
            package TEXT PRIMARY KEY,
            result TEXT NOT NULL,
            cached_at INTEGER NOT NULL
        )
        "#,
        [],
    )?;
    Ok(())
}

fn load<T: DeserializeOwned>(path: &Path) -> Result<HashMap<String, Entry<T>>, CacheError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut stmt = conn.prepare("SELECT package, result, cached_at FROM results")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
        ))
    })?;

    let mut entries = HashMap::new();
    for row in rows {
        let (key, json, cached_at) = row?;
        match serde_json::from_str(&json) {
            Ok(value) => {
                entries.insert(key, Entry { value, cached_at });
            }
            Err(e) => debug!("Dropping undecodable cache entry {}: {}", key, e),
        }
    }

    debug!("Loaded {} cache entries from {:?}", entries.len(), path);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        latest: String,
    }

    fn sample(latest: &str) -> Sample {
        Sample {
            latest: latest.to_string(),
        }
    }

    fn backdate(cache_dir: &Path, key: &str, secs: i64) {
        let conn = Connection::open(cache_dir.join(CACHE_FILE_NAME)).unwrap();
        conn.execute(
            "UPDATE results SET cached_at = cached_at - ?1 WHERE package = ?2",
            rusqlite::params![secs, key],
        )
        .unwrap();
    }

    #[test]
    fn get_returns_none_for_missing_store() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache: ResultCache<Sample> = ResultCache::new(temp_dir.path(), 3600);

        assert_eq!(cache.get("amasty/promo"), None);
        assert!(!cache.has("amasty/promo"));
    }

    #[test]
    fn set_then_get_returns_value_before_flush() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = ResultCache::new(temp_dir.path(), 3600);

        cache.set("amasty/promo", sample("2.14.1"));

        assert_eq!(cache.get("amasty/promo"), Some(sample("2.14.1")));
        assert!(!cache.db_path().exists());
    }

    #[test]
    fn flush_persists_for_next_instance() {
        let temp_dir = TempDir::new().unwrap();
        let cache_dir = temp_dir.path().join(".vendor-check-cache");

        let mut cache = ResultCache::new(&cache_dir, 3600);
        cache.set("amasty/promo", sample("2.14.1"));
        cache.set("mageplaza/module-smtp", sample("4.7.6"));
        cache.flush().unwrap();

        let mut reloaded: ResultCache<Sample> = ResultCache::new(&cache_dir, 3600);
        assert_eq!(reloaded.get("amasty/promo"), Some(sample("2.14.1")));
        assert_eq!(reloaded.get("mageplaza/module-smtp"), Some(sample("4.7.6")));
    }

    #[test]
    fn flush_without_changes_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache: ResultCache<Sample> = ResultCache::new(temp_dir.path(), 3600);

        assert_eq!(cache.get("amasty/promo"), None);
        cache.flush().unwrap();

        assert!(!cache.db_path().exists());
    }

    #[test]
    fn get_hides_expired_entries() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = ResultCache::new(temp_dir.path(), 3600);
        cache.set("amasty/promo", sample("2.14.1"));
        cache.set("xtento/orderexport", sample("2.16.4"));
        cache.flush().unwrap();

        backdate(temp_dir.path(), "amasty/promo", 3601);

        let mut reloaded: ResultCache<Sample> = ResultCache::new(temp_dir.path(), 3600);
        assert_eq!(reloaded.get("amasty/promo"), None);
        assert_eq!(reloaded.get("xtento/orderexport"), Some(sample("2.16.4")));
    }

    #[test]
    fn expired_entries_survive_next_flush() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = ResultCache::new(temp_dir.path(), 3600);
        cache.set("amasty/promo", sample("2.14.1"));
        cache.flush().unwrap();
        backdate(temp_dir.path(), "amasty/promo", 7200);

        let mut reloaded = ResultCache::new(temp_dir.path(), 3600);
        assert!(!reloaded.has("amasty/promo"));
        reloaded.set("xtento/orderexport", sample("2.16.4"));
        reloaded.flush().unwrap();

        let mut long_ttl: ResultCache<Sample> = ResultCache::new(temp_dir.path(), 86400);
        assert_eq!(long_ttl.get("amasty/promo"), Some(sample("2.14.1")));
    }

    #[test]
    fn clear_removes_store_and_memory() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache = ResultCache::new(temp_dir.path(), 3600);
        cache.set("amasty/promo", sample("2.14.1"));
        cache.flush().unwrap();

        cache.clear().unwrap();

        assert!(!cache.db_path().exists());
        assert_eq!(cache.get("amasty/promo"), None);
    }

    #[test]
    fn clear_without_store_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let mut cache: ResultCache<Sample> = ResultCache::new(temp_dir.path(), 3600);

        assert!(cache.clear().is_ok());
    }

    #[test]
    fn unreadable_store_is_treated_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(CACHE_FILE_NAME), "not a database").unwrap();

        let mut cache: ResultCache<Sample> = ResultCache::new(temp_dir.path(), 3600);

        assert_eq!(cache.get("amasty/promo"), None);
    }
}
