//! Core type definitions used across the Standup workspace.

pub mod id;

pub use id::*;
