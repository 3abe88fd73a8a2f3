//! Notification records: scope-and-date filtering, the fixed statistics
//! aggregations, the record store seam, and the `Registry` facade the HTTP
//! layer calls into.

pub mod filter;
pub mod memory;
pub mod service;
pub mod stats;
pub mod store;

pub use filter::{is_stillbirth, paginate, DateRange, Page};
pub use memory::MemoryRecordStore;
pub use service::Registry;
pub use stats::{MonthBucket, StillbirthStats, TodaySnapshot};
pub use store::{PgRecordStore, RecordStore};
