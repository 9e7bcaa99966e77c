use duckdb::Connection;

use crate::error::{DataSourceError, StatsError};
use crate::storage::source::SourceTable;

/// Columns the dashboard reads from both tables.
pub const REQUIRED_COLUMNS: [&str; 2] = ["alias", "created"];

/// `items` as the links service lays it out. Used for fixtures and local
/// DuckDB copies; the dashboard never writes to a real source.
pub const CREATE_ITEMS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS items (
    id      VARCHAR,
    name    VARCHAR,
    alias   VARCHAR,
    url     VARCHAR,
    tags    VARCHAR,
    created VARCHAR,
    updated VARCHAR
)
";

/// `logs` as the links service lays it out.
pub const CREATE_LOGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS logs (
    id      VARCHAR,
    alias   VARCHAR,
    args    VARCHAR,
    device  VARCHAR,
    created VARCHAR,
    updated VARCHAR
)
";

/// Create both tables in a DuckDB database.
pub fn init_schema(conn: &Connection) -> Result<(), duckdb::Error> {
    conn.execute_batch(CREATE_ITEMS_TABLE)?;
    conn.execute_batch(CREATE_LOGS_TABLE)?;
    Ok(())
}

/// Column names of `table` in the connection's default catalog.
/// Empty when the table does not exist.
pub fn table_columns(conn: &Connection, table: SourceTable) -> Result<Vec<String>, duckdb::Error> {
    let mut stmt = conn.prepare(
        "SELECT lower(column_name) FROM information_schema.columns
         WHERE table_name = ?
           AND table_catalog = current_database()
           AND table_schema = current_schema()
         ORDER BY ordinal_position",
    )?;
    let columns = stmt
        .query_map([table.table_name()], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(columns)
}

/// Check that both tables exist and carry the columns the loader selects.
pub fn verify_schema(conn: &Connection) -> Result<(), StatsError> {
    for table in [SourceTable::Items, SourceTable::Logs] {
        check_columns(table, &table_columns(conn, table)?)?;
    }
    Ok(())
}

/// Validate the lowercased column list of `table`. An empty list means the
/// table does not exist.
pub fn check_columns(table: SourceTable, columns: &[String]) -> Result<(), StatsError> {
    if columns.is_empty() {
        return Err(DataSourceError::MissingTable(table).into());
    }
    for column in REQUIRED_COLUMNS {
        if !columns.iter().any(|c| c == column) {
            return Err(DataSourceError::MissingColumn { table, column }.into());
        }
    }
    Ok(())
}
