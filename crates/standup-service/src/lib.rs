//! # standup-service
//!
//! Application-level use cases for Standup. The [`Authenticator`] sequences
//! sign-up, sign-in, and every credential-changing flow over the auth
//! primitives; [`mail`] renders and delivers the links those flows send.
//!
//! Services follow constructor injection — all dependencies are provided
//! at construction time via `Arc` references.

pub mod auth;
pub mod mail;

pub use auth::{Authenticator, SignInOutcome, SignUpOutcome};
pub use mail::{LogMailer, MailDispatcher, MailMessage, Mailer, ResendMailer};
