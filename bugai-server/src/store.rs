//! PostgreSQL-backed history store.

use bugai_core::{HistoryEntry, HistoryStore, StoreError};
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};

use crate::db::DbPool;
use crate::models::{HistoryRecord, NewHistoryRecord};
use crate::schema::history;

/// History store persisting entries in the `history` table.
#[derive(Clone)]
pub struct PgHistoryStore {
    pool: DbPool,
}

impl PgHistoryStore {
    /// Wrap an initialized connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>, StoreError> {
        self.pool
            .get()
            .map_err(|err| StoreError::new(format!("failed to fetch database connection: {err}")))
    }
}

impl HistoryStore for PgHistoryStore {
    fn insert(&self, entry: &HistoryEntry) -> Result<(), StoreError> {
        let record = NewHistoryRecord::from_entry(entry, Utc::now().naive_utc())?;
        let mut conn = self.conn()?;
        diesel::insert_into(history::table)
            .values(&record)
            .execute(&mut conn)
            .map_err(|err| StoreError::new(format!("insert history entry {}: {err}", entry.id)))?;
        Ok(())
    }

    fn list(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut conn = self.conn()?;
        let records = history::table
            .order((history::timestamp.desc(), history::row_id.desc()))
            .limit(limit)
            .select(HistoryRecord::as_select())
            .load::<HistoryRecord>(&mut conn)
            .map_err(|err| StoreError::new(format!("load history: {err}")))?;
        records.into_iter().map(HistoryRecord::into_entry).collect()
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let mut conn = self.conn()?;
        diesel::delete(history::table)
            .execute(&mut conn)
            .map_err(|err| StoreError::new(format!("clear history: {err}")))
    }
}
