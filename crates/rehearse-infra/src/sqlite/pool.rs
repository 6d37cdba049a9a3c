//! Connection pools for the review database.
//!
//! Answers are read-modify-write cycles on a single row, so every write goes
//! through a writer pool holding exactly one connection; a transaction on it
//! cannot interleave with another. Lookups (`Repeat`, `Exists`, `List`, the
//! reminder's due counts) use a separate read-only pool. WAL lets those reads
//! proceed while a review transaction is open.

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// Concurrent lookups allowed at once.
const READER_CONNECTIONS: u32 = 8;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Reader and writer pools over one SQLite file.
#[derive(Clone)]
pub struct DatabasePool {
    /// Read-only connections for lookups.
    pub reader: SqlitePool,
    /// The single connection every write transaction runs on.
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (or create) the database and bring the base tables up to date.
    ///
    /// The base schema migrations run on the writer before the reader pool
    /// connects. The legacy stage upgrade is not part of these; it runs when
    /// the item store is opened.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = connect_options(database_url)?;

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone().create_if_missing(true))
            .await?;
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(READER_CONNECTIONS)
            .connect_with(options.read_only(true))
            .await?;

        tracing::debug!(url = database_url, "database pools ready");
        Ok(Self { reader, writer })
    }
}

fn connect_options(database_url: &str) -> Result<SqliteConnectOptions, sqlx::Error> {
    Ok(SqliteConnectOptions::from_str(database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT))
}

/// Returns the default database URL based on `REHEARSE_DATA_DIR` env var,
/// falling back to `~/.rehearse/rehearse.db`.
pub fn default_database_url() -> String {
    let data_dir = crate::config::resolve_data_dir();
    format!("sqlite://{}?mode=rwc", data_dir.join("rehearse.db").display())
}
