//! `admin.*` procedures.

use std::sync::Arc;

use tracing::info;

use standup_core::result::AppResult;
use standup_service::Authenticator;

use crate::capability::Capability;
use crate::context::RequestContext;
use crate::dto::request::{SetRoleInput, UserIdInput};
use crate::dto::response::{RevokedResponse, UserResponse};
use crate::router::{ProcedureRouter, Reply};

/// Registers the administration procedures.
pub fn register(router: &mut ProcedureRouter, auth: &Arc<Authenticator>) {
    router.register_with("admin.getUser", Capability::Admin, auth.clone(), get_user);
    router.register_with("admin.setRole", Capability::Admin, auth.clone(), set_role);
    router.register_with(
        "admin.revokeUserSessions",
        Capability::Admin,
        auth.clone(),
        revoke_user_sessions,
    );
}

async fn get_user(
    auth: Arc<Authenticator>,
    input: UserIdInput,
    _: RequestContext,
) -> AppResult<Reply<UserResponse>> {
    Ok(Reply::new(auth.user(input.user_id).await?.into()))
}

async fn set_role(
    auth: Arc<Authenticator>,
    input: SetRoleInput,
    ctx: RequestContext,
) -> AppResult<Reply<UserResponse>> {
    let (admin_id, _) = ctx.caller()?;
    let user = auth.credentials().set_role(input.user_id, input.role).await?;
    info!(admin_id = %admin_id, user_id = %user.id, role = %user.role, "Role assigned");
    Ok(Reply::new(user.into()))
}

async fn revoke_user_sessions(
    auth: Arc<Authenticator>,
    input: UserIdInput,
    ctx: RequestContext,
) -> AppResult<Reply<RevokedResponse>> {
    let (admin_id, _) = ctx.caller()?;
    let revoked = auth.revoke_sessions(input.user_id).await?;
    info!(admin_id = %admin_id, user_id = %input.user_id, revoked, "Sessions revoked by admin");
    Ok(Reply::new(RevokedResponse { revoked }))
}
