//! The application's procedure catalogue.

pub mod admin;
pub mod auth;
pub mod hello;
pub mod user;

use std::sync::Arc;

use standup_service::Authenticator;

use crate::router::ProcedureRouter;

/// Builds the router with every procedure registered.
pub fn catalogue(auth: Arc<Authenticator>) -> ProcedureRouter {
    let mut router = ProcedureRouter::new();
    hello::register(&mut router);
    auth::register(&mut router, &auth);
    user::register(&mut router, &auth);
    admin::register(&mut router, &auth);
    router
}
