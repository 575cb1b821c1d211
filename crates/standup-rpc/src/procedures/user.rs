//! `user.*` procedures for the signed-in caller.

use std::sync::Arc;

use standup_core::result::AppResult;
use standup_service::Authenticator;

use crate::capability::Capability;
use crate::context::RequestContext;
use crate::dto::request::UpdateProfileInput;
use crate::dto::response::UserResponse;
use crate::router::{NoInput, ProcedureRouter, Reply};

/// Registers the self-service procedures.
pub fn register(router: &mut ProcedureRouter, auth: &Arc<Authenticator>) {
    router.register_with("user.me", Capability::Authenticated, auth.clone(), me);
    router.register_with(
        "user.updateProfile",
        Capability::Authenticated,
        auth.clone(),
        update_profile,
    );
}

async fn me(
    auth: Arc<Authenticator>,
    _: NoInput,
    ctx: RequestContext,
) -> AppResult<Reply<UserResponse>> {
    let (user_id, _) = ctx.caller()?;
    Ok(Reply::new(auth.user(user_id).await?.into()))
}

async fn update_profile(
    auth: Arc<Authenticator>,
    input: UpdateProfileInput,
    ctx: RequestContext,
) -> AppResult<Reply<UserResponse>> {
    let (user_id, _) = ctx.caller()?;
    let user = auth.update_profile(user_id, input.name.as_deref()).await?;
    Ok(Reply::new(user.into()))
}
