//! Brigade: restaurant-scoped data cache and list views for the staff
//! training backend.
//!
//! The [`cache::RestaurantDataCache`] holds the full set of collections for the
//! selected restaurant; [`application::cached`] and [`application::query`]
//! derive filtered, sorted and paginated list views from it or from direct
//! backend queries.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

#[cfg(test)]
pub(crate) mod testing;
