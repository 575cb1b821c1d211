//! Liveness procedure.

use standup_core::result::AppResult;

use crate::capability::Capability;
use crate::context::RequestContext;
use crate::router::{NoInput, ProcedureRouter, Reply};

/// Registers `hello`.
pub fn register(router: &mut ProcedureRouter) {
    router.register("hello", Capability::Public, hello);
}

async fn hello(_: NoInput, _: RequestContext) -> AppResult<Reply<&'static str>> {
    Ok(Reply::new("Hello world"))
}
