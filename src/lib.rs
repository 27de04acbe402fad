//! Velibstat - backend for a bike-share statistics dashboard.
//!
//! Fetches live station availability from the Vélib' Métropole open-data
//! feeds, attaches each station to its department and commune with a
//! point-in-polygon region resolver, and aggregates the result for the
//! dashboard frontend.

pub mod config;
pub mod gbfs;
pub mod locate;
pub mod models;
pub mod stats;

pub use locate::{LocateError, RegionResolver};
pub use models::{Resolution, Snapshot, StationRecord, TripRecord};
