use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use duckdb::Connection;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::config::{Config, DatabaseFormat};
use crate::error::{DataSourceError, StatsError};
use crate::query::snapshot::{Item, LogEntry, Snapshot};
use crate::query::timestamps::normalize_timestamps;
use crate::storage::{schema, sqlite};

/// The two tables the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTable {
    Items,
    Logs,
}

impl SourceTable {
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Logs => "logs",
        }
    }
}

impl fmt::Display for SourceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// A source row before timestamp normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub alias: String,
    pub created: Option<String>,
}

impl RawRow {
    pub fn new(alias: &str, created: Option<&str>) -> Self {
        Self {
            alias: alias.to_string(),
            created: created.map(str::to_string),
        }
    }
}

/// Where the `items` and `logs` tables live.
#[derive(Clone)]
pub enum DataSource {
    /// A SQLite file (the PocketBase `data.db`), opened read-only.
    Sqlite(PathBuf),
    /// A DuckDB database file, opened read-only.
    DuckDb(PathBuf),
    /// An already-open connection, shared with the caller.
    Shared(Arc<Mutex<Connection>>),
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(path) => write!(f, "Sqlite({})", path.display()),
            Self::DuckDb(path) => write!(f, "DuckDb({})", path.display()),
            Self::Shared(_) => f.write_str("Shared"),
        }
    }
}

impl DataSource {
    pub fn from_config(config: &Config) -> Self {
        match config.database_format {
            DatabaseFormat::Sqlite => Self::Sqlite(config.database_path.clone()),
            DatabaseFormat::DuckDb => Self::DuckDb(config.database_path.clone()),
        }
    }

    /// Short description for logs and health output.
    pub fn describe(&self) -> String {
        match self {
            Self::Sqlite(path) => format!("sqlite:{}", path.display()),
            Self::DuckDb(path) => format!("duckdb:{}", path.display()),
            Self::Shared(_) => "shared connection".to_string(),
        }
    }

    /// Read the raw `items` and `logs` rows.
    fn read_tables(&self) -> Result<(Vec<RawRow>, Vec<RawRow>), StatsError> {
        match self {
            Self::Sqlite(path) => {
                ensure_exists(path)?;
                sqlite::read_tables(path)
            }
            Self::DuckDb(path) => {
                ensure_exists(path)?;
                let flags = duckdb::Config::default()
                    .access_mode(duckdb::AccessMode::ReadOnly)
                    .map_err(|e| unreachable_source(path, &e))?;
                let conn = Connection::open_with_flags(path, flags)
                    .map_err(|e| unreachable_source(path, &e))?;
                read_duckdb_tables(&conn)
            }
            Self::Shared(conn) => read_duckdb_tables(&conn.lock()),
        }
    }
}

fn read_duckdb_tables(conn: &Connection) -> Result<(Vec<RawRow>, Vec<RawRow>), StatsError> {
    schema::verify_schema(conn)?;
    let items = fetch_rows(conn, SourceTable::Items)?;
    let logs = fetch_rows(conn, SourceTable::Logs)?;
    Ok((items, logs))
}

fn unreachable_source(path: &Path, err: &dyn fmt::Display) -> DataSourceError {
    DataSourceError::Unreachable {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

fn ensure_exists(path: &Path) -> Result<(), DataSourceError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(unreachable_source(path, &"no such file"))
    }
}

/// Read every row of `table` as `(alias, created)` text.
pub fn fetch_rows(conn: &Connection, table: SourceTable) -> Result<Vec<RawRow>, StatsError> {
    // Table names come from a fixed enum.
    let sql = format!(
        "SELECT alias, CAST(created AS VARCHAR) FROM {}",
        table.table_name()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, Option<String>>(0)?,
            row.get::<_, Option<String>>(1)?,
        ))
    })?;

    let mut out = Vec::new();
    for (index, row) in rows.enumerate() {
        let (alias, created) = row?;
        let alias = alias.ok_or(DataSourceError::NullAlias { table, row: index })?;
        out.push(RawRow { alias, created });
    }
    Ok(out)
}

/// Read and normalize both tables from `source`.
///
/// The connection is released before timestamps are normalized.
pub fn load_snapshot(source: &DataSource) -> Result<Snapshot, StatsError> {
    let (raw_items, raw_logs) = source.read_tables()?;

    let items: Vec<Item> = normalize_timestamps(SourceTable::Items, raw_items)?;
    let logs: Vec<LogEntry> = normalize_timestamps(SourceTable::Logs, raw_logs)?;

    tracing::info!(
        source = %source.describe(),
        items = items.len(),
        logs = logs.len(),
        "Loaded snapshot"
    );
    Ok(Snapshot::new(items, logs))
}
