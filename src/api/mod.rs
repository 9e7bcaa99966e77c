pub mod errors;
pub mod stats;
