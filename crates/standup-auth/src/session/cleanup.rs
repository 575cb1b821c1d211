//! Periodic purge of expired and revoked sessions and spent tokens.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time;
use tracing::{error, info};

use standup_core::config::SessionConfig;
use standup_core::error::AppError;

use crate::token::TokenService;

use super::manager::SessionManager;

/// Rows removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Sessions deleted.
    pub sessions: u64,
    /// Tokens deleted.
    pub tokens: u64,
}

/// Deletes rows that can no longer be used.
///
/// Rows are kept for the configured retention after they expire or are
/// revoked, so a stale handle still reports `SessionExpired` for a while.
#[derive(Clone)]
pub struct SessionSweeper {
    /// Session manager.
    sessions: Arc<SessionManager>,
    /// Token service.
    tokens: Arc<TokenService>,
    /// Time between sweeps. Zero disables the loop.
    interval: Duration,
    /// Grace period before spent rows are deleted.
    retention: chrono::Duration,
}

impl std::fmt::Debug for SessionSweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSweeper")
            .field("interval", &self.interval)
            .field("retention", &self.retention)
            .finish()
    }
}

impl SessionSweeper {
    /// Creates a sweeper from session configuration.
    pub fn new(
        sessions: Arc<SessionManager>,
        tokens: Arc<TokenService>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            sessions,
            tokens,
            interval: Duration::from_secs(config.sweep_interval_seconds),
            retention: config.sweep_retention(),
        }
    }

    /// Runs one sweep.
    pub async fn run_once(&self) -> Result<SweepReport, AppError> {
        let before = Utc::now() - self.retention;
        let report = SweepReport {
            sessions: self.sessions.purge_expired(before).await?,
            tokens: self.tokens.purge_expired(before).await?,
        };

        if report.sessions > 0 || report.tokens > 0 {
            info!(
                sessions = report.sessions,
                tokens = report.tokens,
                "Sweep completed"
            );
        }
        Ok(report)
    }

    /// Sweeps on every interval until the cancel signal is received.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        if self.interval.is_zero() {
            info!("Session sweeper disabled");
            return;
        }

        info!(interval_seconds = self.interval.as_secs(), "Session sweeper started");
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once().await {
                        error!(error = %e, "Sweep failed");
                    }
                }
            }
        }

        info!("Session sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use standup_core::config::{RefreshPolicy, TokenConfig};
    use standup_database::MemoryStore;
    use standup_database::store::UserStore;
    use standup_entity::session::SessionMetadata;
    use standup_entity::token::TokenPurpose;
    use standup_entity::user::NewUser;

    #[tokio::test]
    async fn test_sweep_removes_only_stale_rows() {
        let config = SessionConfig {
            policy: RefreshPolicy::Fixed,
            ttl_seconds: 60,
            refresh_window_seconds: None,
            cookie_name: "standup_session".to_string(),
            cookie_secure: false,
            sweep_interval_seconds: 0,
            sweep_retention_seconds: 3600,
        };
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                email: "ada@example.com".to_string(),
                name: None,
                password_hash: "$argon2id$stub".to_string(),
            })
            .await
            .unwrap();

        let sessions = Arc::new(SessionManager::new(Arc::new(store.clone()), &config));
        let tokens = Arc::new(TokenService::new(
            Arc::new(store.clone()),
            TokenConfig {
                verify_email_ttl_seconds: 60,
                reset_password_ttl_seconds: 60,
                change_email_ttl_seconds: 60,
                delete_account_ttl_seconds: 60,
            },
        ));

        let long_ago = Utc::now() - chrono::Duration::days(1);
        sessions
            .create_at(user.id, SessionMetadata::default(), long_ago)
            .await
            .unwrap();
        let fresh = sessions.create(user.id, SessionMetadata::default()).await.unwrap();
        tokens
            .issue(TokenPurpose::VerifyEmail, user.id, None, chrono::Duration::seconds(-7200))
            .await
            .unwrap();

        let sweeper = SessionSweeper::new(sessions.clone(), tokens, &config);
        let report = sweeper.run_once().await.unwrap();
        assert_eq!(report, SweepReport { sessions: 1, tokens: 1 });
        assert!(sessions.validate(&fresh.handle).await.is_ok());
    }

    #[tokio::test]
    async fn test_disabled_sweeper_returns_immediately() {
        let config = SessionConfig {
            policy: RefreshPolicy::Fixed,
            ttl_seconds: 60,
            refresh_window_seconds: None,
            cookie_name: "standup_session".to_string(),
            cookie_secure: false,
            sweep_interval_seconds: 0,
            sweep_retention_seconds: 0,
        };
        let store = Arc::new(MemoryStore::new());
        let sweeper = SessionSweeper::new(
            Arc::new(SessionManager::new(store.clone(), &config)),
            Arc::new(TokenService::new(
                store,
                TokenConfig {
                    verify_email_ttl_seconds: 60,
                    reset_password_ttl_seconds: 60,
                    change_email_ttl_seconds: 60,
                    delete_account_ttl_seconds: 60,
                },
            )),
            &config,
        );
        let (_tx, rx) = watch::channel(false);
        sweeper.run(rx).await;
    }
}
