use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use crate::error::{DataSourceError, StatsError};
use crate::storage::schema;
use crate::storage::source::{RawRow, SourceTable};

/// Open a links service `data.db` read-only.
///
/// `SQLITE_OPEN_NO_MUTEX` is fine here: the connection never leaves the
/// blocking task that loads the snapshot.
pub fn open_read_only(path: &Path) -> Result<Connection, DataSourceError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags).map_err(|e| {
        DataSourceError::Unreachable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    // PocketBase keeps writing while the dashboard reads.
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(conn)
}

/// Lowercased column names of `table`. Empty when the table does not exist.
pub fn table_columns(
    conn: &Connection,
    table: SourceTable,
) -> Result<Vec<String>, rusqlite::Error> {
    // Table names come from a fixed enum.
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table.table_name()))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .map(|name| name.map(|n| n.to_lowercase()))
        .collect::<Result<Vec<String>, _>>()?;
    Ok(columns)
}

/// Check that both tables exist and carry `alias` and `created`.
pub fn verify_schema(conn: &Connection) -> Result<(), StatsError> {
    for table in [SourceTable::Items, SourceTable::Logs] {
        schema::check_columns(table, &table_columns(conn, table)?)?;
    }
    Ok(())
}

/// Read every row of `table` as `(alias, created)` text.
///
/// `created` is cast so integer or real timestamps reach the normalizer as
/// text rather than failing the row read.
pub fn fetch_rows(conn: &Connection, table: SourceTable) -> Result<Vec<RawRow>, StatsError> {
    let sql = format!(
        "SELECT CAST(alias AS TEXT), CAST(created AS TEXT) FROM {}",
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

/// Read both tables from the SQLite file at `path`.
pub fn read_tables(path: &Path) -> Result<(Vec<RawRow>, Vec<RawRow>), StatsError> {
    let conn = open_read_only(path)?;
    verify_schema(&conn)?;
    let items = fetch_rows(&conn, SourceTable::Items)?;
    let logs = fetch_rows(&conn, SourceTable::Logs)?;
    Ok((items, logs))
}
