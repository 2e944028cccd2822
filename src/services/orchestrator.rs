use crate::browser::login::{LoginFlow, LoginOutcome};
use crate::browser::session::SessionStore;
use crate::collector::{CollectSummary, ReportCollector};
use crate::config::Config;
use crate::error::CollectorError;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Single entry point for "collect, logging in first if needed". Guarantees
/// at most one login attempt in flight per credential store and never starts
/// collection on an unverified session.
pub struct Orchestrator {
    config: Arc<Config>,
    store: SessionStore,
    login_gate: Mutex<()>,
}

impl Orchestrator {
    pub fn new(config: Arc<Config>) -> Self {
        let store = SessionStore::new(&config.data_dir);
        Self {
            config,
            store,
            login_gate: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub async fn auto_collect(
        &self,
        start: &str,
        end: &str,
        output: &Path,
    ) -> Result<CollectSummary, CollectorError> {
        if self.needs_login().await {
            tracing::info!("🔐 no usable session, starting interactive login");
            self.login_and_wait().await?;
        } else {
            tracing::info!("✅ stored session is valid, skipping login");
        }

        let collector = ReportCollector::new(self.config.clone(), self.store.clone())?;
        collector.collect(start, end, output).await
    }

    /// Decision table: login when credentials are absent, unreadable, or no
    /// longer accepted by the site.
    pub async fn needs_login(&self) -> bool {
        if !self.store.exists() {
            tracing::info!("no credential file found");
            return true;
        }
        !self.probe_session().await
    }

    async fn probe_session(&self) -> bool {
        let collector = match ReportCollector::new(self.config.clone(), self.store.clone()) {
            Ok(collector) => collector,
            Err(e) => {
                tracing::warn!("could not build probe client: {}", e);
                return false;
            }
        };

        match collector.load_credentials() {
            Ok(()) => collector.check_session_valid().await,
            Err(e) => {
                tracing::warn!("stored credentials unusable: {}", e);
                false
            }
        }
    }

    /// Runs the interactive login as a background task and races it against
    /// a timer that re-probes the store, so waiting ends as soon as a valid
    /// session appears. The task's result is consumed exactly once: either
    /// by the select arm or by the detached reaper on an early poll win.
    pub async fn login_and_wait(&self) -> Result<(), CollectorError> {
        let _flight = self.login_gate.lock().await;

        // The session may have become valid while we waited on the gate.
        if !self.needs_login().await {
            tracing::info!("✅ session became valid while waiting for the login gate");
            return Ok(());
        }

        let flow = LoginFlow::new(self.config.clone(), self.store.clone());
        let mut handle: JoinHandle<LoginOutcome> = tokio::spawn(async move { flow.run().await });

        let mut ticker = tokio::time::interval(self.config.status_poll);

        enum Waited {
            Task(Result<LoginOutcome, tokio::task::JoinError>),
            EarlySession,
        }

        let waited = loop {
            tokio::select! {
                joined = &mut handle => break Waited::Task(joined),
                _ = ticker.tick() => {
                    if self.store.exists() && self.probe_session().await {
                        break Waited::EarlySession;
                    }
                    tracing::debug!("⏳ still waiting for the login to finish...");
                }
            }
        };

        match waited {
            Waited::EarlySession => {
                tracing::info!("✅ valid session appeared before the login task reported back");
                // Let the flow finish its own teardown; drain the handle off
                // to the side so the result is still consumed exactly once.
                tokio::spawn(async move {
                    let _ = handle.await;
                });
                Ok(())
            }
            Waited::Task(Err(e)) => Err(CollectorError::LaunchFailed(format!(
                "login task failed: {e}"
            ))),
            Waited::Task(Ok(outcome)) => {
                let cookies = outcome.into_result()?;
                tracing::info!("🎉 login finished with {} cookies stored", cookies);
                Ok(())
            }
        }
    }
}
