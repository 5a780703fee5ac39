//! Brigade cache system.
//!
//! - [`RestaurantDataCache`]: the snapshot of every collection for the
//!   selected restaurant, loaded in one parallel batch.
//! - [`QueryCache`]: short-lived responses of direct list queries.
//!
//! ## Configuration
//!
//! Cache behavior is controlled via `brigade.toml`:
//!
//! ```toml
//! [cache]
//! page_size = 20
//! query_page_size = 10
//! query_ttl_seconds = 300
//! restaurant_slots = 1
//! # ... see config.rs for all options
//! ```

mod config;
mod lock;
mod query_cache;
mod snapshot;
mod store;
pub mod trigger;

pub use config::CacheConfig;
pub use query_cache::QueryCache;
pub use snapshot::{RestaurantSnapshot, SnapshotCounts};
pub use store::{CacheStatus, LOAD_ERROR_MESSAGE, LoadOutcome, RestaurantDataCache};
pub use trigger::TriggerDecision;
