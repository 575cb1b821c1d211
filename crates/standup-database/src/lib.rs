//! # standup-database
//!
//! Persistence for users, credentials, sessions, and verification tokens.
//!
//! The [`store`] traits describe the primitives the auth layer relies on,
//! including the atomic ones (conditional consume, read-and-extend, and the
//! multi-row transactions for credential replacement and soft delete).
//! [`PgStore`] implements them on PostgreSQL and [`MemoryStore`] in process.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use repositories::PgStore;
pub use store::{ConsumeOutcome, SessionStore, Stores, TokenStore, UserStore};
