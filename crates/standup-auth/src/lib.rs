//! # standup-auth
//!
//! Credential, token, and session primitives for Standup.
//!
//! ## Modules
//!
//! - `password` — Argon2id password hashing and policy enforcement
//! - `secret` — opaque random secrets and their storage digests
//! - `token` — single-use, purpose-bound verification tokens
//! - `credential` — user identity records and password credentials
//! - `session` — session lifecycle (create, validate, refresh, revoke) and the sweeper

pub mod credential;
pub mod password;
pub mod secret;
pub mod session;
pub mod token;

pub use credential::CredentialStore;
pub use password::{PasswordHasher, PasswordValidator};
pub use session::{IssuedSession, SessionManager, SessionSweeper, ValidatedSession};
pub use token::{IssuedToken, Redemption, TokenService};
