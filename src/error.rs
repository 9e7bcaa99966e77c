use std::path::PathBuf;

use crate::storage::source::SourceTable;

/// Errors raised while loading or summarizing the source tables.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error("unparseable timestamp {value:?} in {table} row {row}")]
    TimestampParse {
        table: SourceTable,
        row: usize,
        value: String,
    },

    /// The creation span is zero days, so a per-day rate has no meaning.
    #[error("creation span is zero days")]
    DegenerateRange,
}

/// The data source could not be read as a links database.
#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error("data source {} is unreachable: {reason}", path.display())]
    Unreachable { path: PathBuf, reason: String },

    #[error("table `{0}` is missing from the data source")]
    MissingTable(SourceTable),

    #[error("table `{table}` has no `{column}` column")]
    MissingColumn {
        table: SourceTable,
        column: &'static str,
    },

    #[error("table `{table}` row {row} has a NULL alias")]
    NullAlias { table: SourceTable, row: usize },

    #[error("query failed: {0}")]
    Query(#[from] duckdb::Error),

    #[error("sqlite query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl From<duckdb::Error> for StatsError {
    fn from(e: duckdb::Error) -> Self {
        Self::DataSource(DataSourceError::Query(e))
    }
}

impl From<rusqlite::Error> for StatsError {
    fn from(e: rusqlite::Error) -> Self {
        Self::DataSource(DataSourceError::Sqlite(e))
    }
}
