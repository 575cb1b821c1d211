//! Verification token entities.

pub mod model;
pub mod purpose;

pub use model::{NewToken, VerificationToken};
pub use purpose::TokenPurpose;
