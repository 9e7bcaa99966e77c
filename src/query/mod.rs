pub mod breakdowns;
pub mod cache;
pub mod metrics;
pub mod recent;
pub mod snapshot;
pub mod timeseries;
pub mod timestamps;
