//! # standup-entity
//!
//! Domain entity models for Standup. Every struct in this crate represents a
//! database table row or a domain value object. All entities derive `Debug`
//! and `Clone`; database entities additionally derive `sqlx::FromRow`.
//!
//! Secrets never live here in plaintext: session handles and verification
//! tokens are stored as SHA-256 digests, passwords as PHC-encoded hashes.

pub mod credential;
pub mod session;
pub mod token;
pub mod user;
