//! Procedure inputs and outputs. Field names are camelCase on the wire.

pub mod request;
pub mod response;
