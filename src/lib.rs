pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod query;
pub mod server;
pub mod state;
pub mod storage;
