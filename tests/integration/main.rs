//! Integration tests driving the HTTP router against the in-memory store.

mod helpers;

mod account_test;
mod auth_test;
mod rpc_test;
mod session_test;
