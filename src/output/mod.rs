//! Pass summaries and database statistics

pub mod stats;

pub use stats::{load_statistics, print_statistics, PassStats, StoreStatistics};
