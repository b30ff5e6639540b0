//! SQLite-backed partitioned response store
//!
//! Entries are keyed by (partition, URL) and carry an explicit monotonic
//! insertion index, so FIFO eviction order is a property of this store rather
//! than of SQLite's enumeration order.

use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

use crate::cache::{MAX_DYNAMIC_ENTRIES, current_partitions, dynamic_partition};
use crate::client::SiteResponse;
use crate::error::CacheError;

/// Schema version - increment to trigger nuke-and-rebuild
const SCHEMA_VERSION: i32 = 2;

type Result<T> = std::result::Result<T, CacheError>;

/// A cached response with its storage metadata
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub partition: String,
    pub response: SiteResponse,
    pub stored_at: i64,
}

/// Partitioned response store
pub struct CacheStore {
    conn: Connection,
}

impl CacheStore {
    /// Open the store at the default XDG cache location
    pub fn open() -> Result<Self> {
        Self::open_at(&Self::default_dir()?)
    }

    /// The default cache directory (~/.cache/offsite on Linux/macOS)
    pub fn default_dir() -> Result<PathBuf> {
        let base = dirs::cache_dir().ok_or(CacheError::NoCacheDir)?;
        Ok(base.join("offsite"))
    }

    /// Open the store at a specific directory.
    ///
    /// Opening doubles as the "activate" lifecycle step: partitions whose
    /// names are not in the current versioned set are purged.
    pub fn open_at(cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create cache dir: {}", e)))?;

        let db_path = cache_dir.join("cache.db");
        let conn = Connection::open(&db_path)?;

        // Check schema version - nuke if mismatched
        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != SCHEMA_VERSION {
            log::info!(
                "Cache schema version mismatch ({} != {}), rebuilding",
                version,
                SCHEMA_VERSION
            );
            drop(conn);
            std::fs::remove_file(&db_path)
                .map_err(|e| CacheError::Io(format!("Failed to remove cache DB: {}", e)))?;
            return Self::open_at(cache_dir);
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                partition TEXT NOT NULL,
                url TEXT NOT NULL,
                status INTEGER NOT NULL,
                headers TEXT NOT NULL,
                body BLOB NOT NULL,
                seq INTEGER NOT NULL,
                stored_at INTEGER NOT NULL,
                PRIMARY KEY (partition, url)
            );

            CREATE INDEX IF NOT EXISTS idx_partition_seq ON entries(partition, seq);
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        let store = Self { conn };
        store.purge_stale_partitions()?;
        Ok(store)
    }

    /// Delete every partition not in the current versioned set
    fn purge_stale_partitions(&self) -> Result<()> {
        let current = current_partitions();
        let removed = self.conn.execute(
            "DELETE FROM entries WHERE partition NOT IN (?1, ?2, ?3)",
            params![current[0], current[1], current[2]],
        )?;
        if removed > 0 {
            log::info!("Purged {} entries from stale cache partitions", removed);
        }
        Ok(())
    }

    /// Store a response under a partition.
    ///
    /// Only status-200 responses are stored; anything else is silently
    /// skipped. Writes to the dynamic partition are trimmed back to
    /// [`MAX_DYNAMIC_ENTRIES`] before returning.
    pub fn put(&self, partition: &str, url: &str, response: &SiteResponse) -> Result<()> {
        if response.status != 200 {
            log::debug!("Not caching {} (status {})", url, response.status);
            return Ok(());
        }

        let headers = serde_json::to_string(&response.headers)
            .map_err(|e| CacheError::Io(e.to_string()))?;
        let now = chrono::Utc::now().timestamp();

        // Re-inserting a URL refreshes its insertion position: the cap
        // tracks recency of insertion, not of access.
        let next_seq: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM entries",
            [],
            |r| r.get(0),
        )?;

        self.conn.execute(
            "INSERT OR REPLACE INTO entries
             (partition, url, status, headers, body, seq, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                partition,
                url,
                response.status,
                headers,
                response.body,
                next_seq,
                now
            ],
        )?;

        if partition == dynamic_partition() {
            self.trim(partition, MAX_DYNAMIC_ENTRIES)?;
        }

        Ok(())
    }

    /// Delete the oldest entries until the partition is at or under `cap`
    fn trim(&self, partition: &str, cap: usize) -> Result<()> {
        loop {
            let count: i64 = self.conn.query_row(
                "SELECT COUNT(*) FROM entries WHERE partition = ?1",
                [partition],
                |r| r.get(0),
            )?;
            if count as usize <= cap {
                return Ok(());
            }

            let oldest: Option<String> = self
                .conn
                .query_row(
                    "SELECT url FROM entries WHERE partition = ?1 ORDER BY seq ASC LIMIT 1",
                    [partition],
                    |r| r.get(0),
                )
                .optional()?;

            match oldest {
                Some(url) => {
                    log::debug!("Evicting {} from {}", url, partition);
                    self.conn.execute(
                        "DELETE FROM entries WHERE partition = ?1 AND url = ?2",
                        params![partition, url],
                    )?;
                }
                None => return Ok(()),
            }
        }
    }

    /// Look up a URL in a specific partition
    pub fn get(&self, partition: &str, url: &str) -> Result<Option<SiteResponse>> {
        let row: Option<(u16, String, Vec<u8>)> = self
            .conn
            .query_row(
                "SELECT status, headers, body FROM entries
                 WHERE partition = ?1 AND url = ?2",
                params![partition, url],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .optional()?;

        match row {
            Some((status, headers, body)) => {
                let headers = serde_json::from_str(&headers).unwrap_or_default();
                Ok(Some(SiteResponse {
                    status,
                    headers,
                    body,
                }))
            }
            None => Ok(None),
        }
    }

    /// Look up a URL across all current partitions (shell, static, dynamic)
    pub fn get_any(&self, url: &str) -> Result<Option<CachedResponse>> {
        for partition in current_partitions() {
            let row: Option<(u16, String, Vec<u8>, i64)> = self
                .conn
                .query_row(
                    "SELECT status, headers, body, stored_at FROM entries
                     WHERE partition = ?1 AND url = ?2",
                    params![partition, url],
                    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
                )
                .optional()?;

            if let Some((status, headers, body, stored_at)) = row {
                let headers = serde_json::from_str(&headers).unwrap_or_default();
                return Ok(Some(CachedResponse {
                    partition,
                    response: SiteResponse {
                        status,
                        headers,
                        body,
                    },
                    stored_at,
                }));
            }
        }
        Ok(None)
    }

    /// URLs of a partition in insertion order, oldest first
    pub fn urls(&self, partition: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM entries WHERE partition = ?1 ORDER BY seq ASC")?;
        let urls = stmt
            .query_map([partition], |r| r.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(urls)
    }

    /// Entry count of a partition
    pub fn len(&self, partition: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE partition = ?1",
            [partition],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    }

    /// Per-partition statistics for `offsite cache status`
    pub fn stats(&self) -> Result<Vec<PartitionStats>> {
        let mut result = Vec::new();
        for partition in current_partitions() {
            let (entries, size_bytes, oldest, newest): (i64, i64, Option<i64>, Option<i64>) =
                self.conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(LENGTH(body)), 0),
                            MIN(stored_at), MAX(stored_at)
                     FROM entries WHERE partition = ?1",
                    [partition.as_str()],
                    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
                )?;

            result.push(PartitionStats {
                partition,
                entries: entries as usize,
                size_bytes: size_bytes as usize,
                oldest,
                newest,
            });
        }
        Ok(result)
    }

    /// Clear all cache entries
    pub fn clear_all(&self) -> Result<ClearStats> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |r| r.get(0))?;
        self.conn.execute("DELETE FROM entries", [])?;
        Ok(ClearStats {
            entries_removed: count as usize,
        })
    }
}

/// Statistics for one partition
#[derive(Debug)]
pub struct PartitionStats {
    pub partition: String,
    pub entries: usize,
    pub size_bytes: usize,
    pub oldest: Option<i64>,
    pub newest: Option<i64>,
}

/// Statistics about a clear operation
#[derive(Debug)]
pub struct ClearStats {
    pub entries_removed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{shell_partition, static_partition};
    use tempfile::TempDir;

    fn test_store() -> (CacheStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open_at(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn test_put_get_round_trip() {
        let (store, _dir) = test_store();
        let partition = static_partition();
        let mut resp = SiteResponse::ok("body bytes");
        resp.headers
            .push(("content-type".to_string(), "text/css".to_string()));

        store.put(&partition, "https://example.com/site.css", &resp).unwrap();

        let got = store
            .get(&partition, "https://example.com/site.css")
            .unwrap()
            .unwrap();
        assert_eq!(got, resp);
    }

    #[test]
    fn test_only_200_responses_are_stored() {
        let (store, _dir) = test_store();
        let partition = dynamic_partition();

        for status in [201, 204, 301, 404, 500] {
            let resp = SiteResponse::with_status(status, "nope");
            store.put(&partition, "https://example.com/x", &resp).unwrap();
        }

        assert!(store.get(&partition, "https://example.com/x").unwrap().is_none());
    }

    #[test]
    fn test_dynamic_partition_capped_at_limit() {
        let (store, _dir) = test_store();
        let partition = dynamic_partition();

        for i in 0..(MAX_DYNAMIC_ENTRIES + 20) {
            let url = format!("https://example.com/page-{i}");
            store.put(&partition, &url, &SiteResponse::ok("html")).unwrap();
            assert!(store.len(&partition).unwrap() <= MAX_DYNAMIC_ENTRIES);
        }

        assert_eq!(store.len(&partition).unwrap(), MAX_DYNAMIC_ENTRIES);
    }

    #[test]
    fn test_eviction_is_fifo() {
        let (store, _dir) = test_store();
        let partition = dynamic_partition();

        for i in 0..(MAX_DYNAMIC_ENTRIES + 1) {
            let url = format!("https://example.com/page-{i}");
            store.put(&partition, &url, &SiteResponse::ok("html")).unwrap();
        }

        // page-0 was written first, so it goes first
        assert!(store.get(&partition, "https://example.com/page-0").unwrap().is_none());
        assert!(store.get(&partition, "https://example.com/page-1").unwrap().is_some());

        let urls = store.urls(&partition).unwrap();
        assert_eq!(urls.first().unwrap(), "https://example.com/page-1");
    }

    #[test]
    fn test_reinsert_refreshes_insertion_order() {
        let (store, _dir) = test_store();
        let partition = dynamic_partition();

        store.put(&partition, "https://example.com/a", &SiteResponse::ok("a")).unwrap();
        store.put(&partition, "https://example.com/b", &SiteResponse::ok("b")).unwrap();
        store.put(&partition, "https://example.com/a", &SiteResponse::ok("a2")).unwrap();

        let urls = store.urls(&partition).unwrap();
        assert_eq!(urls, vec!["https://example.com/b", "https://example.com/a"]);
    }

    #[test]
    fn test_static_partition_is_not_capped() {
        let (store, _dir) = test_store();
        let partition = static_partition();

        for i in 0..(MAX_DYNAMIC_ENTRIES + 10) {
            let url = format!("https://example.com/asset-{i}.css");
            store.put(&partition, &url, &SiteResponse::ok("css")).unwrap();
        }

        assert_eq!(store.len(&partition).unwrap(), MAX_DYNAMIC_ENTRIES + 10);
    }

    #[test]
    fn test_get_any_searches_all_partitions() {
        let (store, _dir) = test_store();

        store
            .put(&shell_partition(), "https://example.com/offline", &SiteResponse::ok("offline page"))
            .unwrap();

        let found = store.get_any("https://example.com/offline").unwrap().unwrap();
        assert_eq!(found.partition, shell_partition());
        assert_eq!(found.response.body, b"offline page");

        assert!(store.get_any("https://example.com/missing").unwrap().is_none());
    }

    #[test]
    fn test_stale_versioned_partitions_purged_on_open() {
        let dir = TempDir::new().unwrap();
        {
            let store = CacheStore::open_at(dir.path()).unwrap();
            // Simulate an entry left behind by a previous deploy
            store
                .conn
                .execute(
                    "INSERT INTO entries (partition, url, status, headers, body, seq, stored_at)
                     VALUES ('dynamic-v1', 'https://example.com/old', 200, '[]', X'00', 1, 0)",
                    [],
                )
                .unwrap();
            store
                .put(&dynamic_partition(), "https://example.com/new", &SiteResponse::ok("new"))
                .unwrap();
        }

        let store = CacheStore::open_at(dir.path()).unwrap();
        assert!(store.get("dynamic-v1", "https://example.com/old").unwrap().is_none());
        assert!(store.get_any("https://example.com/new").unwrap().is_some());
    }

    #[test]
    fn test_clear_all() {
        let (store, _dir) = test_store();
        let partition = dynamic_partition();

        store.put(&partition, "https://example.com/a", &SiteResponse::ok("a")).unwrap();
        store.put(&partition, "https://example.com/b", &SiteResponse::ok("b")).unwrap();

        let stats = store.clear_all().unwrap();
        assert_eq!(stats.entries_removed, 2);
        assert_eq!(store.len(&partition).unwrap(), 0);
    }

    #[test]
    fn test_stats_reports_all_partitions() {
        let (store, _dir) = test_store();
        store
            .put(&static_partition(), "https://example.com/site.css", &SiteResponse::ok("css"))
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.len(), 3);

        let static_stats = stats
            .iter()
            .find(|s| s.partition == static_partition())
            .unwrap();
        assert_eq!(static_stats.entries, 1);
        assert!(static_stats.size_bytes > 0);
        assert!(static_stats.oldest.is_some());
    }
}
