//! # MediaRank Common Library
//!
//! Shared code for the MediaRank service:
//! - Data model (media snapshots, ranks, rankings, profiles, families)
//! - Rank upsert, statistics and list presentation logic
//! - SQLite persistence
//! - Identity assertion checks
//! - Configuration loading

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod family;
pub mod models;
pub mod session;
pub mod stats;
pub mod store;
pub mod time;
pub mod upsert;
pub mod uuid_utils;
pub mod view;

pub use error::{Error, Result};
