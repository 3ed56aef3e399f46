//! Repository Pattern for the content store
//!
//! The content repository (items, categories, item metadata) is an external
//! collaborator of the permalink core. This module defines the narrow trait the
//! core calls through, plus two implementations:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │   SequenceAllocator / PermalinkBuilder / RouteResolver      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   ContentRepository                         │
//! └─────────────────────────────────────────────────────────────┘
//!                   │                         │
//!                   ▼                         ▼
//!          ┌─────────────────┐       ┌─────────────────┐
//!          │     SQLite      │       │      Mock       │
//!          │  Implementation │       │ Implementation  │
//!          └─────────────────┘       └─────────────────┘
//! ```
//!
//! Sequence assignments are plain metadata entries (`{prefix}{category_id}` ->
//! integer), so every query that touches them takes the metadata key.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::error::Result;
use crate::models::{Category, CategoryId, Item, ItemId};

// ============================================================================
// Repository Trait
// ============================================================================

/// Repository for items, categories and item metadata
pub trait ContentRepository: Send + Sync {
    /// Get item by ID (with categories and metadata)
    fn get_item(&self, id: ItemId) -> Result<Option<Item>>;

    /// Get the item published at a plain path (`about-us`, `2020/hello`)
    fn get_item_by_path(&self, path: &str) -> Result<Option<Item>>;

    /// Get category by ID
    fn get_category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// Get category by its exact slug
    fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// List all categories ordered by ID
    fn list_categories(&self) -> Result<Vec<Category>>;

    /// Site-relative archive path of a category
    fn get_category_link(&self, id: CategoryId) -> Result<Option<String>> {
        Ok(self
            .get_category(id)?
            .map(|c| format!("category/{}/", c.slug)))
    }

    /// Items attached to `category` whose `meta_key` equals `sequence`
    fn get_items_by_category_and_sequence(
        &self,
        category: CategoryId,
        meta_key: &str,
        sequence: u64,
    ) -> Result<Vec<ItemId>>;

    /// Items attached to `category` holding `meta_key`, by numeric value descending
    fn get_items_by_category_with_meta_key(
        &self,
        category: CategoryId,
        meta_key: &str,
    ) -> Result<Vec<(ItemId, u64)>>;

    /// All items whose `meta_key` equals `value`, attached to the category or not
    fn get_items_by_meta_value(&self, meta_key: &str, value: u64) -> Result<Vec<ItemId>>;

    /// All items holding `meta_key`, by numeric value descending
    fn get_items_with_meta_key(&self, meta_key: &str) -> Result<Vec<(ItemId, u64)>>;

    /// Read one metadata value
    fn get_item_meta(&self, item: ItemId, key: &str) -> Result<Option<String>>;

    /// List the metadata keys an item holds
    fn item_meta_keys(&self, item: ItemId) -> Result<Vec<String>>;

    /// Insert or replace a metadata value
    fn update_item_meta(&self, item: ItemId, key: &str, value: &str) -> Result<()>;

    /// Delete a metadata value (no error when absent)
    fn delete_item_meta(&self, item: ItemId, key: &str) -> Result<()>;

    /// Insert or replace a category
    fn put_category(&self, category: &Category) -> Result<()>;

    /// Insert or replace an item, including its categories and metadata
    fn put_item(&self, item: &Item) -> Result<()>;

    /// Delete an item and everything attached to it; returns whether it existed
    fn delete_item(&self, id: ItemId) -> Result<bool>;

    /// Delete a category and detach it from every item; returns whether it existed
    ///
    /// Item metadata scoped to the category is left in place.
    fn delete_category(&self, id: CategoryId) -> Result<bool>;

    /// Run `span` holding the store's write lock
    ///
    /// Nothing else writes to the store, in this process or another, until
    /// the span returns. Writes commit when it returns `Ok` and are rolled
    /// back otherwise.
    fn sequence_span(&self, span: &mut dyn FnMut(&mut dyn SequenceTxn) -> Result<()>)
        -> Result<()>;
}

/// Metadata access inside [`ContentRepository::sequence_span`]
pub trait SequenceTxn {
    /// Check the item exists
    fn item_exists(&self, item: ItemId) -> Result<bool>;

    /// All items holding `meta_key`, by numeric value descending
    fn items_with_meta_key(&self, meta_key: &str) -> Result<Vec<(ItemId, u64)>>;

    /// All items whose `meta_key` equals `value`
    fn items_by_meta_value(&self, meta_key: &str, value: u64) -> Result<Vec<ItemId>>;

    /// Read one metadata value
    fn get_meta(&self, item: ItemId, key: &str) -> Result<Option<String>>;

    /// Metadata keys the item holds
    fn meta_keys(&self, item: ItemId) -> Result<Vec<String>>;

    /// Insert or replace a metadata value
    fn set_meta(&mut self, item: ItemId, key: &str, value: &str) -> Result<()>;

    /// Delete a metadata value (no error when absent)
    fn delete_meta(&mut self, item: ItemId, key: &str) -> Result<()>;
}

fn parse_sequence(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|v| *v > 0)
}

// ============================================================================
// SQLite Implementation
// ============================================================================

/// How long a connection waits for another connection's write lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// SQLite implementation of ContentRepository
///
/// Uses a `Mutex` to ensure thread-safety for the SQLite connection.
/// Sequence spans run as `BEGIN IMMEDIATE` transactions, so several
/// processes can share one database file.
pub struct SqliteContentRepository {
    conn: Mutex<Connection>,
}

impl SqliteContentRepository {
    /// Open (or create) a SQLite repository
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        // Enable WAL mode for better concurrency
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite content repository initialized");
        Ok(repo)
    }

    /// Create in-memory repository (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;
        Ok(repo)
    }

    /// Create database schema
    fn create_schema(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS categories (
                    id INTEGER PRIMARY KEY,
                    slug TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS items (
                    id INTEGER PRIMARY KEY,
                    item_type TEXT NOT NULL,
                    slug TEXT NOT NULL,
                    title TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_items_slug ON items(slug);

                CREATE TABLE IF NOT EXISTS item_categories (
                    item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
                    category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                    PRIMARY KEY (item_id, category_id)
                );

                CREATE INDEX IF NOT EXISTS idx_item_categories_category
                    ON item_categories(category_id);

                CREATE TABLE IF NOT EXISTS item_meta (
                    item_id INTEGER NOT NULL REFERENCES items(id) ON DELETE CASCADE,
                    meta_key TEXT NOT NULL,
                    meta_value TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    PRIMARY KEY (item_id, meta_key)
                );

                CREATE INDEX IF NOT EXISTS idx_item_meta_key_value
                    ON item_meta(meta_key, meta_value);
                "#,
        )?;

        Ok(())
    }

    fn load_item(conn: &Connection, id: ItemId) -> Result<Option<Item>> {
        let row = conn
            .query_row(
                "SELECT id, item_type, slug, title FROM items WHERE id = ?1",
                params![id.0 as i64],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, item_type, slug, title)) = row else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT category_id FROM item_categories WHERE item_id = ?1 ORDER BY category_id",
        )?;
        let categories = stmt
            .query_map(params![id], |row| row.get::<_, i64>(0))?
            .map(|r| r.map(|v| CategoryId(v as u64)))
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt =
            conn.prepare("SELECT meta_key, meta_value FROM item_meta WHERE item_id = ?1")?;
        let meta = stmt
            .query_map(params![id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;

        Ok(Some(Item {
            id: ItemId(id as u64),
            item_type,
            slug,
            title,
            categories,
            meta,
        }))
    }

    fn query_categories(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Category>> {
        let mut stmt = conn.prepare(sql)?;
        let categories = stmt
            .query_map(params, |row| {
                Ok(Category {
                    id: CategoryId(row.get::<_, i64>(0)? as u64),
                    slug: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    fn query_pairs(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<(ItemId, u64)>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, value)| parse_sequence(&value).map(|v| (ItemId(id as u64), v)))
            .collect())
    }

    fn item_exists(conn: &Connection, id: ItemId) -> Result<bool> {
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM items WHERE id = ?1",
                params![id.0 as i64],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn meta_holders(conn: &Connection, meta_key: &str, value: u64) -> Result<Vec<ItemId>> {
        let mut stmt = conn.prepare(
            "SELECT item_id FROM item_meta
             WHERE meta_key = ?1 AND CAST(meta_value AS INTEGER) = ?2
             ORDER BY item_id",
        )?;
        let ids = stmt
            .query_map(params![meta_key, value as i64], |row| row.get::<_, i64>(0))?
            .map(|r| r.map(|v| ItemId(v as u64)))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    fn meta_pairs(conn: &Connection, meta_key: &str) -> Result<Vec<(ItemId, u64)>> {
        Self::query_pairs(
            conn,
            "SELECT item_id, meta_value FROM item_meta WHERE meta_key = ?1
             ORDER BY CAST(meta_value AS INTEGER) DESC, item_id",
            params![meta_key],
        )
    }

    fn meta_value(conn: &Connection, item: ItemId, key: &str) -> Result<Option<String>> {
        let value = conn
            .query_row(
                "SELECT meta_value FROM item_meta WHERE item_id = ?1 AND meta_key = ?2",
                params![item.0 as i64, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn meta_keys(conn: &Connection, item: ItemId) -> Result<Vec<String>> {
        let mut stmt =
            conn.prepare("SELECT meta_key FROM item_meta WHERE item_id = ?1 ORDER BY meta_key")?;
        let keys = stmt
            .query_map(params![item.0 as i64], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(keys)
    }

    fn upsert_meta(conn: &Connection, item: ItemId, key: &str, value: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        conn.execute(
            r#"
                INSERT INTO item_meta (item_id, meta_key, meta_value, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(item_id, meta_key) DO UPDATE SET
                    meta_value = excluded.meta_value,
                    updated_at = excluded.updated_at
                "#,
            params![item.0 as i64, key, value, now],
        )?;
        Ok(())
    }

    fn remove_meta(conn: &Connection, item: ItemId, key: &str) -> Result<()> {
        conn.execute(
            "DELETE FROM item_meta WHERE item_id = ?1 AND meta_key = ?2",
            params![item.0 as i64, key],
        )?;
        Ok(())
    }
}

/// Sequence span over an open `BEGIN IMMEDIATE` transaction
struct SqliteSequenceTxn<'a> {
    conn: &'a Connection,
}

impl SequenceTxn for SqliteSequenceTxn<'_> {
    fn item_exists(&self, item: ItemId) -> Result<bool> {
        SqliteContentRepository::item_exists(self.conn, item)
    }

    fn items_with_meta_key(&self, meta_key: &str) -> Result<Vec<(ItemId, u64)>> {
        SqliteContentRepository::meta_pairs(self.conn, meta_key)
    }

    fn items_by_meta_value(&self, meta_key: &str, value: u64) -> Result<Vec<ItemId>> {
        SqliteContentRepository::meta_holders(self.conn, meta_key, value)
    }

    fn get_meta(&self, item: ItemId, key: &str) -> Result<Option<String>> {
        SqliteContentRepository::meta_value(self.conn, item, key)
    }

    fn meta_keys(&self, item: ItemId) -> Result<Vec<String>> {
        SqliteContentRepository::meta_keys(self.conn, item)
    }

    fn set_meta(&mut self, item: ItemId, key: &str, value: &str) -> Result<()> {
        SqliteContentRepository::upsert_meta(self.conn, item, key, value)
    }

    fn delete_meta(&mut self, item: ItemId, key: &str) -> Result<()> {
        SqliteContentRepository::remove_meta(self.conn, item, key)
    }
}

impl ContentRepository for SqliteContentRepository {
    fn get_item(&self, id: ItemId) -> Result<Option<Item>> {
        let conn = self.conn.lock();
        Self::load_item(&conn, id)
    }

    fn get_item_by_path(&self, path: &str) -> Result<Option<Item>> {
        let slug = path.trim_matches('/');
        if slug.is_empty() {
            return Ok(None);
        }

        let conn = self.conn.lock();
        let id: Option<i64> = conn
            .query_row(
                "SELECT id FROM items WHERE slug = ?1 ORDER BY id LIMIT 1",
                params![slug],
                |row| row.get(0),
            )
            .optional()?;

        match id {
            Some(id) => Self::load_item(&conn, ItemId(id as u64)),
            None => Ok(None),
        }
    }

    fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let conn = self.conn.lock();
        let mut found = Self::query_categories(
            &conn,
            "SELECT id, slug, name FROM categories WHERE id = ?1",
            params![id.0 as i64],
        )?;
        Ok(found.pop())
    }

    fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let conn = self.conn.lock();
        let mut found = Self::query_categories(
            &conn,
            "SELECT id, slug, name FROM categories WHERE slug = ?1",
            params![slug],
        )?;
        Ok(found.pop())
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn.lock();
        Self::query_categories(&conn, "SELECT id, slug, name FROM categories ORDER BY id", [])
    }

    fn get_items_by_category_and_sequence(
        &self,
        category: CategoryId,
        meta_key: &str,
        sequence: u64,
    ) -> Result<Vec<ItemId>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"
                SELECT m.item_id FROM item_meta m
                JOIN item_categories c ON c.item_id = m.item_id AND c.category_id = ?1
                WHERE m.meta_key = ?2 AND CAST(m.meta_value AS INTEGER) = ?3
                ORDER BY m.item_id
                "#,
        )?;
        let ids = stmt
            .query_map(
                params![category.0 as i64, meta_key, sequence as i64],
                |row| row.get::<_, i64>(0),
            )?
            .map(|r| r.map(|v| ItemId(v as u64)))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    fn get_items_by_category_with_meta_key(
        &self,
        category: CategoryId,
        meta_key: &str,
    ) -> Result<Vec<(ItemId, u64)>> {
        let conn = self.conn.lock();
        Self::query_pairs(
            &conn,
            r#"
                SELECT m.item_id, m.meta_value FROM item_meta m
                JOIN item_categories c ON c.item_id = m.item_id AND c.category_id = ?1
                WHERE m.meta_key = ?2
                ORDER BY CAST(m.meta_value AS INTEGER) DESC, m.item_id
                "#,
            params![category.0 as i64, meta_key],
        )
    }

    fn get_items_by_meta_value(&self, meta_key: &str, value: u64) -> Result<Vec<ItemId>> {
        let conn = self.conn.lock();
        Self::meta_holders(&conn, meta_key, value)
    }

    fn get_items_with_meta_key(&self, meta_key: &str) -> Result<Vec<(ItemId, u64)>> {
        let conn = self.conn.lock();
        Self::meta_pairs(&conn, meta_key)
    }

    fn get_item_meta(&self, item: ItemId, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        Self::meta_value(&conn, item, key)
    }

    fn item_meta_keys(&self, item: ItemId) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        Self::meta_keys(&conn, item)
    }

    fn update_item_meta(&self, item: ItemId, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        Self::upsert_meta(&conn, item, key, value)
    }

    fn delete_item_meta(&self, item: ItemId, key: &str) -> Result<()> {
        let conn = self.conn.lock();
        Self::remove_meta(&conn, item, key)
    }

    fn put_category(&self, category: &Category) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"
                INSERT INTO categories (id, slug, name) VALUES (?1, ?2, ?3)
                ON CONFLICT(id) DO UPDATE SET slug = excluded.slug, name = excluded.name
                "#,
            params![category.id.0 as i64, category.slug, category.name],
        )?;
        Ok(())
    }

    fn put_item(&self, item: &Item) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let id = item.id.0 as i64;
        let now = Utc::now().to_rfc3339();

        tx.execute(
            r#"
                INSERT INTO items (id, item_type, slug, title) VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(id) DO UPDATE SET
                    item_type = excluded.item_type,
                    slug = excluded.slug,
                    title = excluded.title
                "#,
            params![id, item.item_type, item.slug, item.title],
        )?;

        tx.execute("DELETE FROM item_categories WHERE item_id = ?1", params![id])?;
        for category in &item.categories {
            tx.execute(
                "INSERT OR IGNORE INTO item_categories (item_id, category_id) VALUES (?1, ?2)",
                params![id, category.0 as i64],
            )?;
        }

        tx.execute("DELETE FROM item_meta WHERE item_id = ?1", params![id])?;
        for (key, value) in &item.meta {
            tx.execute(
                "INSERT INTO item_meta (item_id, meta_key, meta_value, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, key, value, now],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn delete_item(&self, id: ItemId) -> Result<bool> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM items WHERE id = ?1", params![id.0 as i64])?;
        Ok(removed > 0)
    }

    fn delete_category(&self, id: CategoryId) -> Result<bool> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM categories WHERE id = ?1", params![id.0 as i64])?;
        Ok(removed > 0)
    }

    fn sequence_span(
        &self,
        span: &mut dyn FnMut(&mut dyn SequenceTxn) -> Result<()>,
    ) -> Result<()> {
        let mut conn = self.conn.lock();
        // Write lock is held from BEGIN, before the first read
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        span(&mut SqliteSequenceTxn { conn: &tx })?;
        tx.commit()?;
        Ok(())
    }
}

// ============================================================================
// Mock Implementation (for testing)
// ============================================================================

#[derive(Default, Clone)]
struct MockState {
    categories: BTreeMap<CategoryId, Category>,
    items: BTreeMap<ItemId, Item>,
}

impl MockState {
    fn meta_pairs(&self, meta_key: &str) -> Vec<(ItemId, u64)> {
        let pairs = self
            .items
            .values()
            .filter_map(|item| item.meta_u64(meta_key).map(|v| (item.id, v)))
            .collect();
        MockContentRepository::sorted_desc(pairs)
    }

    fn meta_holders(&self, meta_key: &str, value: u64) -> Vec<ItemId> {
        self.items
            .values()
            .filter(|item| item.meta_u64(meta_key) == Some(value))
            .map(|item| item.id)
            .collect()
    }

    fn meta_value(&self, item: ItemId, key: &str) -> Option<String> {
        self.items.get(&item).and_then(|i| i.meta.get(key).cloned())
    }

    fn keys_of(&self, item: ItemId) -> Vec<String> {
        self.items
            .get(&item)
            .map(|i| i.meta.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn insert_meta(&mut self, item: ItemId, key: &str, value: &str) {
        if let Some(i) = self.items.get_mut(&item) {
            i.meta.insert(key.to_string(), value.to_string());
        }
    }

    fn remove_meta(&mut self, item: ItemId, key: &str) {
        if let Some(i) = self.items.get_mut(&item) {
            i.meta.remove(key);
        }
    }
}

impl SequenceTxn for MockState {
    fn item_exists(&self, item: ItemId) -> Result<bool> {
        Ok(self.items.contains_key(&item))
    }

    fn items_with_meta_key(&self, meta_key: &str) -> Result<Vec<(ItemId, u64)>> {
        Ok(self.meta_pairs(meta_key))
    }

    fn items_by_meta_value(&self, meta_key: &str, value: u64) -> Result<Vec<ItemId>> {
        Ok(self.meta_holders(meta_key, value))
    }

    fn get_meta(&self, item: ItemId, key: &str) -> Result<Option<String>> {
        Ok(self.meta_value(item, key))
    }

    fn meta_keys(&self, item: ItemId) -> Result<Vec<String>> {
        Ok(self.keys_of(item))
    }

    fn set_meta(&mut self, item: ItemId, key: &str, value: &str) -> Result<()> {
        self.insert_meta(item, key, value);
        Ok(())
    }

    fn delete_meta(&mut self, item: ItemId, key: &str) -> Result<()> {
        self.remove_meta(item, key);
        Ok(())
    }
}

/// In-memory mock implementation of ContentRepository
///
/// Useful for testing without database dependencies.
#[derive(Default)]
pub struct MockContentRepository {
    state: RwLock<MockState>,
}

impl MockContentRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of items
    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.state.read().items.is_empty()
    }

    /// Clear all records
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.items.clear();
        state.categories.clear();
    }

    fn sorted_desc(mut pairs: Vec<(ItemId, u64)>) -> Vec<(ItemId, u64)> {
        pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        pairs
    }
}

impl ContentRepository for MockContentRepository {
    fn get_item(&self, id: ItemId) -> Result<Option<Item>> {
        Ok(self.state.read().items.get(&id).cloned())
    }

    fn get_item_by_path(&self, path: &str) -> Result<Option<Item>> {
        let slug = path.trim_matches('/');
        if slug.is_empty() {
            return Ok(None);
        }
        Ok(self
            .state
            .read()
            .items
            .values()
            .find(|item| item.slug == slug)
            .cloned())
    }

    fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.state.read().categories.get(&id).cloned())
    }

    fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        Ok(self
            .state
            .read()
            .categories
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.state.read().categories.values().cloned().collect())
    }

    fn get_items_by_category_and_sequence(
        &self,
        category: CategoryId,
        meta_key: &str,
        sequence: u64,
    ) -> Result<Vec<ItemId>> {
        Ok(self
            .state
            .read()
            .items
            .values()
            .filter(|item| item.has_category(category) && item.meta_u64(meta_key) == Some(sequence))
            .map(|item| item.id)
            .collect())
    }

    fn get_items_by_category_with_meta_key(
        &self,
        category: CategoryId,
        meta_key: &str,
    ) -> Result<Vec<(ItemId, u64)>> {
        let pairs = self
            .state
            .read()
            .items
            .values()
            .filter(|item| item.has_category(category))
            .filter_map(|item| item.meta_u64(meta_key).map(|v| (item.id, v)))
            .collect();
        Ok(Self::sorted_desc(pairs))
    }

    fn get_items_by_meta_value(&self, meta_key: &str, value: u64) -> Result<Vec<ItemId>> {
        Ok(self.state.read().meta_holders(meta_key, value))
    }

    fn get_items_with_meta_key(&self, meta_key: &str) -> Result<Vec<(ItemId, u64)>> {
        Ok(self.state.read().meta_pairs(meta_key))
    }

    fn get_item_meta(&self, item: ItemId, key: &str) -> Result<Option<String>> {
        Ok(self.state.read().meta_value(item, key))
    }

    fn item_meta_keys(&self, item: ItemId) -> Result<Vec<String>> {
        Ok(self.state.read().keys_of(item))
    }

    fn update_item_meta(&self, item: ItemId, key: &str, value: &str) -> Result<()> {
        self.state.write().insert_meta(item, key, value);
        Ok(())
    }

    fn delete_item_meta(&self, item: ItemId, key: &str) -> Result<()> {
        self.state.write().remove_meta(item, key);
        Ok(())
    }

    fn put_category(&self, category: &Category) -> Result<()> {
        self.state
            .write()
            .categories
            .insert(category.id, category.clone());
        Ok(())
    }

    fn put_item(&self, item: &Item) -> Result<()> {
        let mut item = item.clone();
        let mut seen = HashSet::new();
        item.categories.retain(|c| seen.insert(*c));
        item.categories.sort();
        self.state.write().items.insert(item.id, item);
        Ok(())
    }

    fn delete_item(&self, id: ItemId) -> Result<bool> {
        Ok(self.state.write().items.remove(&id).is_some())
    }

    fn delete_category(&self, id: CategoryId) -> Result<bool> {
        let mut state = self.state.write();
        let existed = state.categories.remove(&id).is_some();
        for item in state.items.values_mut() {
            item.categories.retain(|c| *c != id);
        }
        Ok(existed)
    }

    fn sequence_span(
        &self,
        span: &mut dyn FnMut(&mut dyn SequenceTxn) -> Result<()>,
    ) -> Result<()> {
        let mut state = self.state.write();
        let mut working = state.clone();
        span(&mut working)?;
        *state = working;
        Ok(())
    }
}

// ============================================================================
// Shared Repository Types
// ============================================================================

/// Thread-safe shared repository wrapper
pub type SharedContentRepository = Arc<dyn ContentRepository>;

/// Create a shared SQLite repository
pub fn create_sqlite_repository(path: impl AsRef<Path>) -> Result<SharedContentRepository> {
    let repo = SqliteContentRepository::new(path)?;
    Ok(Arc::new(repo))
}

/// Create a shared mock repository
pub fn create_mock_repository() -> SharedContentRepository {
    Arc::new(MockContentRepository::new())
}

// ============================================================================
// Tests
// ============================================================================
