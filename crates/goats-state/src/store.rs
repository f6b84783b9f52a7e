//! KvStore — redb-backed namespaces for goats and favorites.
//!
//! The store supports both on-disk and in-memory backends (the latter for
//! tests and for running without a data directory).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use goats_core::{Goat, GoatId};

use crate::error::{StateError, StateResult};
use crate::tables::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

type Table = TableDefinition<'static, &'static str, &'static [u8]>;

#[derive(Clone)]
pub struct KvStore {
    db: Arc<Database>,
}

impl KvStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "kv store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store.
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory kv store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(GOATS).map_err(map_err!(Table))?;
        txn.open_table(FAVORITES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Generic helpers ────────────────────────────────────────────

    fn put_json<T: Serialize + ?Sized>(&self, table: Table, key: &str, value: &T) -> StateResult<()> {
        let bytes = serde_json::to_vec(value).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(table).map_err(map_err!(Table))?;
            table
                .insert(key, bytes.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, table: Table, key: &str) -> StateResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let value = serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, table: Table, key: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(table).map_err(map_err!(Table))?;
            existed = table.remove(key).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }

    // ── Goats ──────────────────────────────────────────────────────

    /// Replace the featured goat catalogue.
    pub fn put_featured_goats(&self, goats: &[Goat]) -> StateResult<()> {
        self.put_json(GOATS, FEATURED_KEY, goats)?;
        debug!(count = goats.len(), "featured goats stored");
        Ok(())
    }

    /// The featured goat catalogue, in display order.
    pub fn featured_goats(&self) -> StateResult<Vec<Goat>> {
        self.get_json(GOATS, FEATURED_KEY)?
            .ok_or_else(|| StateError::NotFound(FEATURED_KEY.to_string()))
    }

    // ── Favorites ──────────────────────────────────────────────────

    /// Favorites stored for a user id, if any.
    pub fn get_favorites(&self, user_id: &str) -> StateResult<Option<Vec<GoatId>>> {
        self.get_json(FAVORITES, user_id)
    }

    pub fn put_favorites(&self, user_id: &str, favorites: &[GoatId]) -> StateResult<()> {
        self.put_json(FAVORITES, user_id, favorites)?;
        debug!(count = favorites.len(), "favorites stored");
        Ok(())
    }

    /// Delete a user's favorites. Returns true if a record existed.
    pub fn delete_favorites(&self, user_id: &str) -> StateResult<bool> {
        let existed = self.delete(FAVORITES, user_id)?;
        debug!(existed, "favorites deleted");
        Ok(existed)
    }

    /// Number of visitors with a favorites record.
    pub fn favorites_count(&self) -> StateResult<usize> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(FAVORITES).map_err(map_err!(Table))?;
        let mut count = 0;
        for entry in table.iter().map_err(map_err!(Read))? {
            entry.map_err(map_err!(Read))?;
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goat(id: GoatId, name: &str) -> Goat {
        Goat {
            id,
            name: name.to_string(),
            image: format!("/images/{id}.jpg"),
            image_small: format!("/images/{id}_small.jpg"),
        }
    }

    // ── Goats ──────────────────────────────────────────────────────

    #[test]
    fn featured_goats_missing_is_not_found() {
        let store = KvStore::open_in_memory().unwrap();
        let err = store.featured_goats().unwrap_err();
        assert!(matches!(err, StateError::NotFound(key) if key == "featured"));
    }

    #[test]
    fn featured_goats_put_and_get_keep_order() {
        let store = KvStore::open_in_memory().unwrap();
        store
            .put_featured_goats(&[goat(2, "Nanny"), goat(1, "Billy")])
            .unwrap();

        let goats = store.featured_goats().unwrap();
        assert_eq!(goats.len(), 2);
        assert_eq!(goats[0].name, "Nanny");
        assert_eq!(goats[1].id, 1);
    }

    #[test]
    fn featured_goats_replaced_on_put() {
        let store = KvStore::open_in_memory().unwrap();
        store.put_featured_goats(&[goat(1, "Billy")]).unwrap();
        store.put_featured_goats(&[goat(5, "Gruff")]).unwrap();

        let goats = store.featured_goats().unwrap();
        assert_eq!(goats, vec![goat(5, "Gruff")]);
    }

    // ── Favorites ──────────────────────────────────────────────────

    #[test]
    fn favorites_crud() {
        let store = KvStore::open_in_memory().unwrap();
        assert!(store.get_favorites("abc").unwrap().is_none());

        store.put_favorites("abc", &[3, 1]).unwrap();
        assert_eq!(store.get_favorites("abc").unwrap(), Some(vec![3, 1]));
        assert_eq!(store.favorites_count().unwrap(), 1);

        assert!(store.delete_favorites("abc").unwrap());
        assert!(!store.delete_favorites("abc").unwrap());
        assert!(store.get_favorites("abc").unwrap().is_none());
        assert_eq!(store.favorites_count().unwrap(), 0);
    }

    #[test]
    fn favorites_are_isolated_per_user() {
        let store = KvStore::open_in_memory().unwrap();
        store.put_favorites("u1", &[1]).unwrap();
        store.put_favorites("u2", &[2, 3]).unwrap();

        assert_eq!(store.get_favorites("u1").unwrap(), Some(vec![1]));
        assert_eq!(store.get_favorites("u2").unwrap(), Some(vec![2, 3]));
        assert_eq!(store.favorites_count().unwrap(), 2);
    }

    #[test]
    fn corrupt_favorites_surface_deserialize_error() {
        let store = KvStore::open_in_memory().unwrap();
        store.put_json(FAVORITES, "bad", "not a list").unwrap();
        let err = store.get_favorites("bad").unwrap_err();
        assert!(matches!(err, StateError::Deserialize(_)));
    }

    // ── Persistence (on-disk) ──────────────────────────────────────

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("goats.redb");

        {
            let store = KvStore::open(&db_path).unwrap();
            store.put_featured_goats(&[goat(1, "Billy")]).unwrap();
            store.put_favorites("abc", &[1]).unwrap();
        }

        let store = KvStore::open(&db_path).unwrap();
        assert_eq!(store.featured_goats().unwrap().len(), 1);
        assert_eq!(store.get_favorites("abc").unwrap(), Some(vec![1]));
    }
}
