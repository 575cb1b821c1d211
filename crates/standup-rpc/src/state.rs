//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use standup_auth::{
    CredentialStore, PasswordHasher, PasswordValidator, SessionManager, SessionSweeper,
    TokenService,
};
use standup_core::config::{AppConfig, ConfigError};
use standup_database::Stores;
use standup_service::mail::{MailDispatcher, Mailer};
use standup_service::Authenticator;

use crate::context::ContextBuilder;
use crate::engine::RpcEngine;
use crate::procedures;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Persistent stores
    pub stores: Stores,
    /// Session lifecycle manager
    pub sessions: Arc<SessionManager>,
    /// Verification token service
    pub tokens: Arc<TokenService>,
    /// Authentication flows
    pub authenticator: Arc<Authenticator>,
    /// RPC pipeline
    pub engine: Arc<RpcEngine>,
}

impl AppState {
    /// Wires every component from validated configuration.
    ///
    /// Fails only when the password hashing parameters are unusable.
    pub fn build(
        config: AppConfig,
        stores: Stores,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, ConfigError> {
        let hasher = Arc::new(PasswordHasher::new(&config.auth.password)?);
        let credentials = Arc::new(CredentialStore::new(
            Arc::clone(&stores.users),
            hasher,
            PasswordValidator::new(&config.auth.password),
        ));
        let sessions = Arc::new(SessionManager::new(
            Arc::clone(&stores.sessions),
            &config.session,
        ));
        let tokens = Arc::new(TokenService::new(
            Arc::clone(&stores.tokens),
            config.tokens.clone(),
        ));
        let mail = MailDispatcher::new(
            mailer,
            config.app.clone(),
            Duration::from_secs(config.mail.timeout_seconds),
        );

        let authenticator = Arc::new(Authenticator::new(
            credentials,
            Arc::clone(&sessions),
            Arc::clone(&tokens),
            mail,
        ));
        let engine = Arc::new(RpcEngine::new(
            ContextBuilder::new(Arc::clone(&sessions)),
            procedures::catalogue(Arc::clone(&authenticator)),
            Duration::from_secs(config.server.request_timeout_seconds),
        ));

        Ok(Self {
            config: Arc::new(config),
            stores,
            sessions,
            tokens,
            authenticator,
            engine,
        })
    }

    /// Background sweeper for expired sessions and tokens.
    pub fn sweeper(&self) -> SessionSweeper {
        SessionSweeper::new(
            Arc::clone(&self.sessions),
            Arc::clone(&self.tokens),
            &self.config.session,
        )
    }
}
