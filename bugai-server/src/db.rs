//! Database connection pool utilities.

use bugai_core::StoreError;
#[cfg(test)]
use diesel::RunQueryDsl;
use diesel::pg::PgConnection;
use diesel::r2d2::{self, ConnectionManager};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

/// Pooled PostgreSQL connections for the BugAI server.
pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Embedded Diesel migrations.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Connect to `database_url` and apply pending migrations.
pub fn init_pool(database_url: &str) -> Result<DbPool, StoreError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .map_err(|err| StoreError::new(format!("failed to create database pool: {err}")))?;
    run_migrations(&pool)?;
    Ok(pool)
}

/// Run pending Diesel migrations.
pub fn run_migrations(pool: &DbPool) -> Result<(), StoreError> {
    let mut conn = pool
        .get()
        .map_err(|err| StoreError::new(format!("failed to fetch database connection: {err}")))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| StoreError::new(format!("failed to run migrations: {err}")))?;
    Ok(())
}

#[cfg(test)]
fn split_database_url(database_url: &str) -> Option<(String, String)> {
    let (url_base, query) = database_url.split_once('?').unwrap_or((database_url, ""));
    let (base, _db_name) = url_base.rsplit_once('/')?;
    let query_suffix = if query.is_empty() {
        String::new()
    } else {
        format!("?{query}")
    };
    Some((base.to_string(), query_suffix))
}

#[cfg(test)]
/// A temporary PostgreSQL database for tests.
pub(crate) struct TestDatabase {
    database_url: String,
    admin_url: String,
    db_name: String,
    pool: Option<DbPool>,
}

#[cfg(test)]
impl TestDatabase {
    /// Create an isolated database on the server named by `TEST_DATABASE_URL`.
    ///
    /// Returns `None` when the variable is unset so PostgreSQL tests can be skipped.
    pub(crate) fn from_env() -> Option<Self> {
        use diesel::Connection;

        let base_url = std::env::var("TEST_DATABASE_URL").ok()?;
        let (base, query_suffix) =
            split_database_url(&base_url).expect("TEST_DATABASE_URL must include a database name");
        let db_name = format!("bugai_test_{}", uuid::Uuid::new_v4().simple());
        let admin_url = format!("{base}/postgres{query_suffix}");
        let database_url = format!("{base}/{db_name}{query_suffix}");

        let mut admin_conn = PgConnection::establish(&admin_url).expect("connect admin database");
        diesel::sql_query(format!("CREATE DATABASE \"{db_name}\""))
            .execute(&mut admin_conn)
            .expect("create test database");

        Some(Self {
            database_url,
            admin_url,
            db_name,
            pool: None,
        })
    }

    /// Return the test database URL.
    pub(crate) fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Get a pooled connection for the test database (runs migrations once).
    pub(crate) fn pool(&mut self) -> DbPool {
        if self.pool.is_none() {
            let manager = ConnectionManager::<PgConnection>::new(self.database_url.clone());
            let pool = r2d2::Pool::builder()
                .max_size(1)
                .build(manager)
                .expect("pool");
            run_migrations(&pool).expect("migrations");
            self.pool = Some(pool);
        }
        self.pool.as_ref().expect("pool").clone()
    }
}

#[cfg(test)]
impl Drop for TestDatabase {
    fn drop(&mut self) {
        use diesel::Connection;

        let _ = self.pool.take();
        if let Ok(mut conn) = PgConnection::establish(&self.admin_url) {
            let escaped = self.db_name.replace('\'', "''");
            let _ = diesel::sql_query(format!(
                "SELECT pg_terminate_backend(pid) \
                 FROM pg_stat_activity \
                 WHERE datname = '{escaped}' AND pid <> pg_backend_pid()"
            ))
            .execute(&mut conn);
            let _ = diesel::sql_query(format!("DROP DATABASE IF EXISTS \"{}\"", self.db_name))
                .execute(&mut conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TestDatabase, init_pool, split_database_url};
    use diesel::prelude::*;
    use diesel::sql_types::Text;

    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        name: String,
    }

    #[test]
    fn split_database_url_keeps_query() {
        assert_eq!(
            split_database_url("postgres://user@localhost:5432/bugai?sslmode=disable"),
            Some((
                "postgres://user@localhost:5432".to_string(),
                "?sslmode=disable".to_string()
            ))
        );
        assert_eq!(
            split_database_url("postgres://localhost/bugai"),
            Some(("postgres://localhost".to_string(), String::new()))
        );
        assert_eq!(split_database_url("bugai"), None);
    }

    #[test]
    fn init_pool_runs_migrations() {
        let Some(test_db) = TestDatabase::from_env() else {
            return;
        };
        let pool = init_pool(test_db.database_url()).expect("pool");

        let mut conn = pool.get().expect("conn");
        let tables: Vec<TableName> = diesel::sql_query(
            "SELECT tablename AS name FROM pg_tables WHERE schemaname = 'public' AND tablename = 'history'",
        )
        .load(&mut conn)
        .expect("query tables");

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "history");
    }
}
