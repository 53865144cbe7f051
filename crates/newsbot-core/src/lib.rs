//! Core domain + pipeline logic for the feed digest bot.
//!
//! This crate is framework-agnostic. HTTP feed fetching, SQLite persistence,
//! Discord and Telegram live behind ports (traits) implemented in adapter crates.

pub mod aggregator;
pub mod app;
pub mod categories;
pub mod config;
pub mod cycle;
pub mod delivery;
pub mod domain;
pub mod errors;
pub mod feed;
pub mod formatting;
pub mod logging;
pub mod packer;
pub mod paginator;
pub mod scheduler;
pub mod store;

pub use errors::{Error, Result};
