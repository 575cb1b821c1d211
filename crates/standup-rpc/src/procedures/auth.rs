//! `auth.*` procedures.

use std::sync::Arc;

use standup_core::result::AppResult;
use standup_service::Authenticator;

use crate::capability::Capability;
use crate::context::RequestContext;
use crate::dto::request::{
    ChangeEmailInput, ChangePasswordInput, EmailInput, ResetPasswordInput, SignInInput,
    SignUpInput, TokenInput,
};
use crate::dto::response::{
    DeletedResponse, MailResponse, RevokedResponse, SessionResponse, SignInResponse,
    SignUpResponse, UserResponse,
};
use crate::router::{NoInput, ProcedureRouter, Reply};

type Auth = Arc<Authenticator>;

/// Registers the authentication procedures.
pub fn register(router: &mut ProcedureRouter, auth: &Auth) {
    use Capability::{Authenticated, Public};

    router.register_with("auth.signUp", Public, auth.clone(), sign_up);
    router.register_with("auth.signIn", Public, auth.clone(), sign_in);
    router.register_with("auth.signOut", Authenticated, auth.clone(), sign_out);
    router.register_with("auth.getSession", Public, auth.clone(), get_session);
    router.register_with(
        "auth.sendVerificationEmail",
        Public,
        auth.clone(),
        send_verification_email,
    );
    router.register_with("auth.verifyEmail", Public, auth.clone(), verify_email);
    router.register_with(
        "auth.requestPasswordReset",
        Public,
        auth.clone(),
        request_password_reset,
    );
    router.register_with("auth.resetPassword", Public, auth.clone(), reset_password);
    router.register_with("auth.changePassword", Authenticated, auth.clone(), change_password);
    router.register_with("auth.changeEmail", Authenticated, auth.clone(), change_email);
    router.register_with("auth.confirmEmailChange", Public, auth.clone(), confirm_email_change);
    router.register_with("auth.deleteAccount", Authenticated, auth.clone(), delete_account);
    router.register_with(
        "auth.confirmAccountDeletion",
        Public,
        auth.clone(),
        confirm_account_deletion,
    );
    router.register_with("auth.revokeSessions", Authenticated, auth.clone(), revoke_sessions);
}

async fn sign_up(auth: Auth, input: SignUpInput, _: RequestContext) -> AppResult<Reply<SignUpResponse>> {
    let outcome = auth
        .sign_up(&input.email, &input.password, input.name.as_deref())
        .await?;
    Ok(Reply::new(SignUpResponse {
        user: outcome.user.into(),
        verification_sent: outcome.verification_sent,
    }))
}

async fn sign_in(auth: Auth, input: SignInInput, ctx: RequestContext) -> AppResult<Reply<SignInResponse>> {
    let outcome = auth
        .sign_in(&input.email, &input.password, ctx.metadata().clone())
        .await?;
    let handle = outcome.session.handle;
    let expires_at = outcome.session.session.expires_at;
    Ok(Reply::set_session(
        SignInResponse {
            user: outcome.user.into(),
            token: handle.clone(),
            expires_at,
        },
        handle,
        expires_at,
    ))
}

/// Revokes the session the request came in on and clears the carrier.
async fn sign_out(auth: Auth, _: NoInput, ctx: RequestContext) -> AppResult<Reply<()>> {
    if let Some(handle) = ctx.session_handle() {
        auth.sign_out(handle).await?;
    }
    Ok(Reply::clear_session(()))
}

async fn get_session(
    auth: Auth,
    _: NoInput,
    ctx: RequestContext,
) -> AppResult<Reply<Option<SessionResponse>>> {
    let Ok((user_id, session_id)) = ctx.caller() else {
        return Ok(Reply::new(None));
    };
    let user = auth.credentials().find_by_id(user_id).await?;
    Ok(Reply::new(user.map(|user| SessionResponse {
        session_id,
        user: user.into(),
    })))
}

async fn send_verification_email(auth: Auth, input: EmailInput, _: RequestContext) -> AppResult<Reply<()>> {
    auth.send_verification_email(&input.email).await?;
    Ok(Reply::new(()))
}

async fn verify_email(auth: Auth, input: TokenInput, _: RequestContext) -> AppResult<Reply<UserResponse>> {
    let user = auth.verify_email(&input.token).await?;
    Ok(Reply::new(user.into()))
}

async fn request_password_reset(auth: Auth, input: EmailInput, _: RequestContext) -> AppResult<Reply<()>> {
    auth.request_password_reset(&input.email).await?;
    Ok(Reply::new(()))
}

async fn reset_password(auth: Auth, input: ResetPasswordInput, _: RequestContext) -> AppResult<Reply<()>> {
    auth.reset_password(&input.token, &input.new_password).await?;
    Ok(Reply::new(()))
}

/// Keeps the calling session; every other session of the user is revoked.
async fn change_password(
    auth: Auth,
    input: ChangePasswordInput,
    ctx: RequestContext,
) -> AppResult<Reply<()>> {
    let (user_id, session_id) = ctx.caller()?;
    auth.change_password(user_id, session_id, &input.current_password, &input.new_password)
        .await?;
    Ok(Reply::new(()))
}

async fn change_email(
    auth: Auth,
    input: ChangeEmailInput,
    ctx: RequestContext,
) -> AppResult<Reply<()>> {
    let (user_id, _) = ctx.caller()?;
    auth.change_email(user_id, &input.new_email).await?;
    Ok(Reply::new(()))
}

async fn confirm_email_change(auth: Auth, input: TokenInput, _: RequestContext) -> AppResult<Reply<UserResponse>> {
    let user = auth.confirm_email_change(&input.token).await?;
    Ok(Reply::new(user.into()))
}

async fn delete_account(auth: Auth, _: NoInput, ctx: RequestContext) -> AppResult<Reply<MailResponse>> {
    let (user_id, _) = ctx.caller()?;
    let mail_sent = auth.delete_account(user_id).await?;
    Ok(Reply::new(MailResponse { mail_sent }))
}

async fn confirm_account_deletion(
    auth: Auth,
    input: TokenInput,
    _: RequestContext,
) -> AppResult<Reply<DeletedResponse>> {
    let user_id = auth.confirm_account_deletion(&input.token).await?;
    Ok(Reply::clear_session(DeletedResponse { user_id }))
}

async fn revoke_sessions(auth: Auth, _: NoInput, ctx: RequestContext) -> AppResult<Reply<RevokedResponse>> {
    let (user_id, _) = ctx.caller()?;
    let revoked = auth.revoke_sessions(user_id).await?;
    Ok(Reply::clear_session(RevokedResponse { revoked }))
}
