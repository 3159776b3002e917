//! Storage gateway for Lunchly (sqlite + sqlx)
//!
//! Usage:
//! let db = Db::connect("sqlite://lunchly.db").await?;
//! db.execute("CREATE TABLE ...").await?;
//! db.fetch_all_with::<Customer>("SELECT ... WHERE id = ?", &[Param::Int(1)]).await?
pub use futures::future::BoxFuture;
use chrono::NaiveDateTime;
use log::{debug, error, info, warn};
use sha2::{Digest, Sha256};
pub use sqlx::FromRow;
use sqlx::sqlite::{SqliteArguments, SqlitePoolOptions, SqliteRow};
use sqlx::{Arguments, Executor, SqlitePool};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use walkdir::WalkDir;

use crate::settings::DatabaseSettings;

const MIGRATIONS_TABLE: &str = "__lunchly_migrations";

/// An async database pool wrapper. One instance is shared by every repository.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

/// A value bound to a `?` placeholder of a parameterized statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Param {
    Null,
    Int(i64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Int(value)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<Option<String>> for Param {
    fn from(value: Option<String>) -> Self {
        value.map_or(Param::Null, Param::Text)
    }
}

impl From<NaiveDateTime> for Param {
    fn from(value: NaiveDateTime) -> Self {
        Param::Timestamp(value)
    }
}

fn arguments(params: &[Param]) -> Result<SqliteArguments<'_>, sqlx::Error> {
    let mut args = SqliteArguments::default();
    for param in params {
        match param {
            Param::Null => args.add(None::<String>),
            Param::Int(v) => args.add(*v),
            Param::Text(v) => args.add(v.as_str()),
            Param::Timestamp(v) => args.add(*v),
        }
        .map_err(sqlx::Error::Encode)?;
    }
    Ok(args)
}

/// Migration function pointer for a model.
/// Each model registers a `fn(Arc<Db>) -> BoxFuture<'static, Result<(), sqlx::Error>>`.
pub type MigrationFn = fn(Arc<Db>) -> BoxFuture<'static, Result<(), sqlx::Error>>;

pub struct Migration(pub MigrationFn);

impl std::ops::Deref for Migration {
    type Target = MigrationFn;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait::async_trait]
pub trait Model: Send + Sync {
    fn table_name() -> &'static str;
    fn create_table_sql() -> String;
    fn columns() -> Vec<(String, String)>;

    async fn migrate(db: Arc<Db>) -> Result<(), sqlx::Error> {
        let table_name = Self::table_name();
        let create_sql = Self::create_table_sql();
        let schema_hash = hash(&create_sql);

        ensure_migrations_table(&db).await?;

        let recorded: Option<(String,)> = db
            .fetch_optional_with(
                &format!("SELECT hash FROM {MIGRATIONS_TABLE} WHERE table_name = ?"),
                &[Param::from(table_name)],
            )
            .await?;

        let Some((recorded_hash,)) = recorded else {
            db.execute(&create_sql).await?;
            db.execute_with(
                &format!(
                    "INSERT INTO {MIGRATIONS_TABLE} (table_name, schema_sql, hash) VALUES (?, ?, ?)"
                ),
                &[
                    Param::from(table_name),
                    Param::from(create_sql.as_str()),
                    Param::from(schema_hash),
                ],
            )
            .await?;
            info!(
                "Migrated `{}` (table created, initial schema applied).",
                table_name
            );
            return Ok(());
        };

        if recorded_hash == schema_hash {
            info!("No schema changes detected for `{}`.", table_name);
            return Ok(());
        }

        // Existing columns straight from sqlite
        let existing: Vec<(String,)> = db
            .fetch_all(&format!("SELECT name FROM pragma_table_info('{}')", table_name))
            .await?;
        let cols: Vec<String> = existing.into_iter().map(|(name,)| name).collect();

        let mut added = Vec::new();
        for (name, sqltype) in Self::columns() {
            if !cols.contains(&name) {
                db.execute(&format!(
                    "ALTER TABLE {} ADD COLUMN {} {};",
                    table_name, name, sqltype
                ))
                .await?;
                added.push((name, sqltype));
            }
        }

        if added.is_empty() {
            info!("Schema hash changed for `{}` but no columns were added.", table_name);
        } else {
            info!(
                "Schema changes detected for `{}`, the following columns were added:",
                table_name
            );
            for (name, sqltype) in &added {
                info!("  - {} {}", name, sqltype);
            }
        }

        db.execute_with(
            &format!(
                "UPDATE {MIGRATIONS_TABLE} \
                 SET schema_sql = ?, hash = ?, applied_at = CURRENT_TIMESTAMP \
                 WHERE table_name = ?"
            ),
            &[
                Param::from(create_sql.as_str()),
                Param::from(schema_hash),
                Param::from(table_name),
            ],
        )
        .await?;
        Ok(())
    }
}

async fn ensure_migrations_table(db: &Db) -> Result<(), sqlx::Error> {
    db.execute(&format!(
        "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            filename TEXT UNIQUE,
            table_name TEXT UNIQUE,
            schema_sql TEXT,
            hash TEXT,
            applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )"
    ))
    .await
}

// Helper function to hash a SQL string
fn hash(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl Db {
    /// Connect (or create) a SQLite database at the given URI
    pub async fn connect(uri: &str) -> Result<Self, sqlx::Error> {
        info!("Connecting to SQLite database at URI: {}", uri);
        let pool = SqlitePool::connect(uri).await?;
        info!("Connected to SQLite database: {}", uri);
        Ok(Db { pool })
    }

    /// Connect using the pool limits from settings.
    pub async fn connect_with(settings: &DatabaseSettings) -> Result<Self, sqlx::Error> {
        info!(
            "Connecting to SQLite database at URI: {} (max {} connections)",
            settings.url, settings.max_connections
        );
        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
            .connect(&settings.url)
            .await?;
        Ok(Db { pool })
    }

    /// A private in-memory database held open by a single connection.
    pub async fn connect_in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        debug!("Opened in-memory SQLite database");
        Ok(Db { pool })
    }

    /// Close every pooled connection. Called once at shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("SQLite pool closed");
    }

    /// Execute an arbitrary SQL statement, e.g. DDL, INSERT, UPDATE.
    pub async fn execute(&self, sql: &str) -> Result<(), sqlx::Error> {
        debug!("Executing SQL: {}", sql);
        let result = self.pool.execute(sql).await;
        match &result {
            Ok(_) => debug!("SQL executed successfully"),
            Err(e) => error!("SQL execution failed: {}", e),
        }
        result.map(|_| ())
    }

    /// Execute a parameterized statement and return the number of rows it touched.
    pub async fn execute_with(&self, sql: &str, params: &[Param]) -> Result<u64, sqlx::Error> {
        debug!("Executing SQL: {} with {} params", sql, params.len());
        let result = sqlx::query_with(sql, arguments(params)?)
            .execute(&self.pool)
            .await;
        match &result {
            Ok(done) => debug!("SQL affected {} rows", done.rows_affected()),
            Err(e) => error!("SQL execution failed: {}", e),
        }
        result.map(|done| done.rows_affected())
    }

    /// Fetch all rows and map to a type implementing `FromRow`.
    pub async fn fetch_all<T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin>(
        &self,
        sql: &str,
    ) -> Result<Vec<T>, sqlx::Error> {
        self.fetch_all_with(sql, &[]).await
    }

    /// Fetch all rows of a parameterized query.
    pub async fn fetch_all_with<T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin>(
        &self,
        sql: &str,
        params: &[Param],
    ) -> Result<Vec<T>, sqlx::Error> {
        debug!("Fetching rows with SQL: {}", sql);
        let result = sqlx::query_as_with(sql, arguments(params)?)
            .fetch_all(&self.pool)
            .await;
        match &result {
            Ok(rows) => debug!("Fetched {} rows successfully", rows.len()),
            Err(e) => error!("Row fetch failed: {}", e),
        }
        result
    }

    /// Fetch exactly one row; no row is `sqlx::Error::RowNotFound`.
    pub async fn fetch_one_with<T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin>(
        &self,
        sql: &str,
        params: &[Param],
    ) -> Result<T, sqlx::Error> {
        debug!("Fetching one row with SQL: {}", sql);
        let result = sqlx::query_as_with(sql, arguments(params)?)
            .fetch_one(&self.pool)
            .await;
        if let Err(e) = &result {
            error!("Row fetch failed: {}", e);
        }
        result
    }

    /// Fetch at most one row.
    pub async fn fetch_optional_with<T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin>(
        &self,
        sql: &str,
        params: &[Param],
    ) -> Result<Option<T>, sqlx::Error> {
        debug!("Fetching optional row with SQL: {}", sql);
        let result = sqlx::query_as_with(sql, arguments(params)?)
            .fetch_optional(&self.pool)
            .await;
        if let Err(e) = &result {
            error!("Row fetch failed: {}", e);
        }
        result
    }
}

/// Migrate all registered models using the inventory pattern.
pub async fn auto_migrate(db: Arc<Db>) -> Result<(), sqlx::Error> {
    info!("Starting auto migration of all registered models...");
    let mut total = 0;
    for m in inventory::iter::<Migration> {
        total += 1;
        if let Err(e) = m(db.clone()).await {
            error!("Auto-migration failed for a model: {}", e);
            return Err(e);
        }
    }
    info!("Auto migration completed for {} models.", total);
    Ok(())
}

/// Applies file-based migrations located in the `migrations_dir` directory.
/// Each migration file should be a *.sql file.
/// Already-applied migrations are skipped based on filename tracking.
pub async fn apply_migration_files(db: Arc<Db>, migrations_dir: &str) -> Result<usize, sqlx::Error> {
    ensure_migrations_table(&db).await?;

    // List .sql files in migrations directory, sorted by filename
    let mut files: Vec<_> = WalkDir::new(migrations_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|f| f.file_type().is_file())
        .filter(|f| f.path().extension().map(|e| e == "sql").unwrap_or(false))
        .collect();
    files.sort_by_key(|f| f.file_name().to_os_string());

    let mut applied_now = 0;
    for entry in files {
        let filename = entry.file_name().to_string_lossy().to_string();
        let applied: Option<(String,)> = db
            .fetch_optional_with(
                &format!("SELECT filename FROM {MIGRATIONS_TABLE} WHERE filename = ?"),
                &[Param::from(filename.as_str())],
            )
            .await?;
        if applied.is_some() {
            info!("Migration `{}` already applied.", filename);
            continue;
        }

        let sql = fs::read_to_string(entry.path()).map_err(|e| {
            warn!("Cannot read migration file `{}`: {}", filename, e);
            sqlx::Error::Io(e)
        })?;
        info!("Applying migration file: {}", filename);
        db.execute(&sql).await?;
        db.execute_with(
            &format!("INSERT INTO {MIGRATIONS_TABLE} (filename) VALUES (?)"),
            &[Param::from(filename.as_str())],
        )
        .await?;
        info!("Migration `{}` applied.", filename);
        applied_now += 1;
    }

    Ok(applied_now)
}
