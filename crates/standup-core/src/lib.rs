//! # standup-core
//!
//! Core crate for Standup. Contains configuration schemas with boot-time
//! validation, typed identifiers, and the unified error system shared by
//! the auth, service, and RPC layers.
//!
//! This crate has **no** internal dependencies on other Standup crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
