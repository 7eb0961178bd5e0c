// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Sweeper
//!
//! Background task that drops expired sessions and pending authorizations
//! every `interval` (default 60 s). Lookups already reject expired records;
//! the sweep only bounds memory.
//!
//! Stops when its `CancellationToken` is cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::SessionEngine;
use crate::oauth::OAuthFlow;

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub struct SessionSweeper {
    sessions: Arc<SessionEngine>,
    oauth: Arc<OAuthFlow>,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(sessions: Arc<SessionEngine>, oauth: Arc<OAuthFlow>) -> Self {
        Self {
            sessions,
            oauth,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "Session sweeper starting");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Session sweeper shutting down");
                    return;
                }
            }

            self.sweep_step();
        }
    }

    /// One pass. Returns `(sessions, pending)` removed.
    pub fn sweep_step(&self) -> (usize, usize) {
        let sessions = self.sessions.sweep();
        let pending = self.oauth.sweep();
        if sessions > 0 || pending > 0 {
            debug!(sessions, pending, "Swept expired records");
        }
        (sessions, pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::oauth::{AuthProvider, ProviderCredentials};
    use crate::session::{SessionRequest, SESSION_TTL};
    use crate::storage::InMemoryStorage;
    use crate::tee::{AttestationProvider, TeeBackend};
    use alloy::primitives::Address;
    use std::collections::HashMap;

    fn components(clock: Arc<ManualClock>) -> (Arc<SessionEngine>, Arc<OAuthFlow>) {
        let attestor = Arc::new(
            AttestationProvider::new(TeeBackend::Simulated, Address::ZERO, clock.clone()).unwrap(),
        );
        let engine = Arc::new(SessionEngine::new(
            Arc::new(InMemoryStorage::new()),
            attestor,
            None,
            clock.clone(),
        ));
        let mut credentials = HashMap::new();
        credentials.insert(
            AuthProvider::Google,
            ProviderCredentials::new("client", "secret"),
        );
        let oauth = Arc::new(
            OAuthFlow::new(engine.clone(), credentials, clock as Arc<dyn Clock>, false).unwrap(),
        );
        (engine, oauth)
    }

    #[tokio::test]
    async fn sweep_step_clears_both_tables() {
        let clock = Arc::new(ManualClock::new(1_000));
        let (engine, oauth) = components(clock.clone());

        engine
            .create_session(SessionRequest {
                provider: AuthProvider::Wallet,
                provider_id: "0xabc".into(),
                handle: None,
                app_id: "app".into(),
                session_id: None,
                smart_account: None,
            })
            .await
            .unwrap();
        oauth
            .init(AuthProvider::Google, "app", "https://app.example/cb")
            .unwrap();

        let sweeper = SessionSweeper::new(engine.clone(), oauth.clone());
        assert_eq!(sweeper.sweep_step(), (0, 0));

        clock.advance(SESSION_TTL);
        assert_eq!(sweeper.sweep_step(), (1, 1));
        assert_eq!(oauth.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_on_cancel() {
        let clock = Arc::new(ManualClock::new(0));
        let (engine, oauth) = components(clock);
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(
            SessionSweeper::new(engine, oauth)
                .with_interval(Duration::from_secs(1))
                .run(shutdown.clone()),
        );
        tokio::time::sleep(Duration::from_secs(3)).await;
        shutdown.cancel();
        handle.await.unwrap();
    }
}
