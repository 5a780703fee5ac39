//! Application services: list views over the cache or direct queries, and
//! mutations that resync the cache.

pub mod cached;
pub mod error;
pub mod listing;
pub mod mutations;
pub mod query;
pub mod repos;
