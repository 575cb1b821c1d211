//! Session lifecycle management including creation, refresh, and revocation.

pub mod cleanup;
pub mod manager;

pub use cleanup::{SessionSweeper, SweepReport};
pub use manager::{IssuedSession, SessionManager, ValidatedSession};
