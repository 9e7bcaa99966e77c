pub mod schema;
pub mod source;
pub mod sqlite;
