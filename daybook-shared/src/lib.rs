//! # Daybook Shared Library
//!
//! Service layer of the Daybook journaling backend: accounts, daily journal
//! entries, search and writing streaks, on top of a pluggable document store
//! and mailer.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, session tokens, random tokens and ids
//! - `config`: Service configuration
//! - `error`: Domain error type
//! - `mail`: Mailer trait, backends and templates
//! - `models`: Users and journal entries
//! - `services`: Account, journal and search services
//! - `store`: Document store trait, query model and backends

pub mod auth;
pub mod config;
pub mod error;
pub mod mail;
pub mod models;
pub mod services;
pub mod store;

/// Current version of the Daybook shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
