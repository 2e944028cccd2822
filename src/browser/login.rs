use crate::browser::control::{BrowserControl, WebDriverSession};
use crate::browser::driver::create_webdriver_client;
use crate::browser::session::SessionStore;
use crate::config::Config;
use crate::error::CollectorError;
use crate::utils::mask_sensitive;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Terminal state of one interactive login attempt. `TimedOut` and
/// `ExtractionFailed` are deliberately distinct: the first may be cured by a
/// longer deadline, the second will not be.
#[derive(Debug)]
pub enum LoginOutcome {
    Authenticated { cookies: usize },
    TimedOut { waited: Duration },
    LaunchFailed { reason: String },
    ExtractionFailed { reason: String },
}

impl LoginOutcome {
    pub fn into_result(self) -> Result<usize, CollectorError> {
        match self {
            LoginOutcome::Authenticated { cookies } => Ok(cookies),
            LoginOutcome::TimedOut { waited } => Err(CollectorError::LoginTimeout(waited)),
            LoginOutcome::LaunchFailed { reason } => Err(CollectorError::LaunchFailed(reason)),
            LoginOutcome::ExtractionFailed { reason } => {
                Err(CollectorError::ExtractionFailed(reason))
            }
        }
    }
}

/// Drives a headed browser through the interactive SSO login and commits the
/// resulting cookies to the store. There is no programmatic signal for "a
/// human finished the external flow", so the only observable proxy is the
/// browser's current URL returning to the application host.
pub struct LoginFlow {
    config: Arc<Config>,
    store: SessionStore,
}

impl LoginFlow {
    pub fn new(config: Arc<Config>, store: SessionStore) -> Self {
        Self { config, store }
    }

    pub async fn run(&self) -> LoginOutcome {
        tracing::info!(
            "🔐 launching browser login (timeout {:?})",
            self.config.login_timeout
        );

        let client = match create_webdriver_client(&self.config, &self.store.profile_dir()).await {
            Ok(client) => client,
            Err(e) => {
                tracing::error!("❌ browser launch failed: {}", e);
                return LoginOutcome::LaunchFailed {
                    reason: e.to_string(),
                };
            }
        };

        let browser = WebDriverSession::new(client);
        let outcome = self.drive(&browser).await;

        // Teardown on every terminal state.
        browser.close().await;
        outcome
    }

    pub(crate) async fn drive(&self, browser: &dyn BrowserControl) -> LoginOutcome {
        let app_host = match self.config.app_host() {
            Some(host) => host,
            None => {
                return LoginOutcome::LaunchFailed {
                    reason: format!("invalid base url: {}", self.config.base_url),
                }
            }
        };

        let target = self.config.report_url();
        tracing::info!("📄 opening {}", target);

        // An error here usually means an unauthenticated redirect bounced
        // the navigation; polling sorts it out.
        if let Err(e) = browser.navigate(&target).await {
            tracing::warn!(
                "⚠️ initial navigation failed (login redirect expected): {}; entry page is {}",
                e,
                self.config.login_url()
            );
        }

        tracing::info!("⏳ waiting for the login to complete in the browser...");

        match self.poll_until_returned(browser, &app_host, &target).await {
            PollVerdict::Returned => {}
            PollVerdict::DeadlineExceeded { waited } => {
                tracing::warn!("⌛ login timed out after {:?}", waited);
                return LoginOutcome::TimedOut { waited };
            }
        }

        tracing::info!("✓ login detected, extracting cookies...");

        let credentials = match browser.cookies().await {
            Ok(credentials) => credentials,
            Err(e) => {
                return LoginOutcome::ExtractionFailed {
                    reason: format!("cookie read failed: {}", e),
                }
            }
        };

        for c in &credentials {
            tracing::debug!("  cookie {} = {} ({})", c.name, mask_sensitive(&c.value), c.domain);
        }

        if let Err(e) = self.store.save(&credentials) {
            return LoginOutcome::ExtractionFailed {
                reason: format!("credential commit failed: {}", e),
            };
        }

        // Grace period so any residual cookie writes settle before teardown.
        tokio::time::sleep(self.config.settle_delay).await;

        tracing::info!("🎉 login complete, {} cookies stored", credentials.len());
        LoginOutcome::Authenticated {
            cookies: credentials.len(),
        }
    }

    /// Polls the browser URL until control returns to the application host
    /// or the deadline elapses. Elapsed time is tracked from an explicit
    /// start instant, never derived from the deadline.
    async fn poll_until_returned(
        &self,
        browser: &dyn BrowserControl,
        app_host: &str,
        target: &str,
    ) -> PollVerdict {
        let started = Instant::now();

        loop {
            if started.elapsed() >= self.config.login_timeout {
                return PollVerdict::DeadlineExceeded {
                    waited: started.elapsed(),
                };
            }

            match browser.current_url().await {
                Ok(url) => {
                    let host = url.host_str().unwrap_or("");
                    tracing::debug!("  [{:?}] at {}", started.elapsed(), url);

                    if host == app_host && host != self.config.sso_host {
                        tracing::info!("  ✓ back on {}", host);

                        if !url.path().starts_with(&self.config.report_path) {
                            // Some providers land on an intermediate page;
                            // steer once towards the listing.
                            tracing::info!("  ↪ correcting navigation to {}", target);
                            if let Err(e) = browser.navigate(target).await {
                                tracing::warn!("  ⚠️ corrective navigation failed: {}", e);
                            }
                        }

                        return PollVerdict::Returned;
                    }

                    tracing::debug!("  ⏳ still on {}", host);
                }
                Err(e) => tracing::warn!("  could not read current url: {}", e),
            }

            tokio::time::sleep(self.config.login_poll).await;
        }
    }
}

enum PollVerdict {
    Returned,
    DeadlineExceeded { waited: Duration },
}
