pub mod parser;
pub mod period;
pub mod render;

pub use period::expand_period_range;

use crate::browser::session::SessionStore;
use crate::config::Config;
use crate::error::CollectorError;
use reqwest::cookie::Jar;
use reqwest::{header, StatusCode};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// One listing entry: display text plus an optional link, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportItem {
    pub text: String,
    pub link: Option<String>,
}

/// Result of one collection run. Partial success is still success; failed
/// periods are listed so the caller can decide whether to retry them.
#[derive(Debug)]
pub struct CollectSummary {
    pub periods: usize,
    pub failed_periods: Vec<String>,
    pub total_items: usize,
    pub output_path: PathBuf,
}

/// Stateless HTTP side of the system: a cookie-jarred client seeded from the
/// stored credential set, pointed at the report listing endpoint.
pub struct ReportCollector {
    client: reqwest::Client,
    jar: Arc<Jar>,
    store: SessionStore,
    config: Arc<Config>,
}

impl ReportCollector {
    pub fn new(config: Arc<Config>, store: SessionStore) -> Result<Self, CollectorError> {
        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            jar,
            store,
            config,
        })
    }

    /// Seeds the cookie jar from the store. An empty set is an error here -
    /// a collector without credentials can only ever see the login page.
    pub fn load_credentials(&self) -> Result<(), CollectorError> {
        let credentials = self.store.load()?;
        if credentials.is_empty() {
            return Err(CollectorError::NoCredentials);
        }

        let base: Url = self
            .config
            .base_url
            .parse()
            .map_err(|e| CollectorError::Http(format!("invalid base url: {e}")))?;

        for c in &credentials {
            let path = if c.path.is_empty() { "/" } else { c.path.as_str() };
            let mut cookie = format!("{}={}; Path={}", c.name, c.value, path);
            if !c.domain.is_empty() {
                cookie.push_str(&format!("; Domain={}", c.domain));
            }
            self.jar.add_cookie_str(&cookie, &base);
        }

        tracing::info!("🔑 cookie jar seeded with {} credentials", credentials.len());
        Ok(())
    }

    /// Probes the protected listing endpoint. Valid iff the response is OK
    /// and we were not bounced to a login page. Never errors.
    pub async fn check_session_valid(&self) -> bool {
        let response = match self
            .client
            .get(self.config.report_url())
            .header(header::ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header(header::ACCEPT_LANGUAGE, self.config.accept_language.as_str())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("session probe failed: {}", e);
                return false;
            }
        };

        let ok = response.status() == StatusCode::OK;
        let bounced = response.url().as_str().contains("login");
        ok && !bounced
    }

    /// Fetches one month's listing and parses it into report items.
    pub async fn fetch_period(&self, month: &str) -> Result<Vec<ReportItem>, CollectorError> {
        let response = self
            .client
            .get(self.config.report_url())
            .query(&[("month", month)])
            .header(header::ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header(header::ACCEPT_LANGUAGE, self.config.accept_language.as_str())
            .send()
            .await
            .map_err(|e| CollectorError::Fetch {
                period: month.to_string(),
                reason: e.to_string(),
            })?;

        if response.status() != StatusCode::OK {
            return Err(CollectorError::Fetch {
                period: month.to_string(),
                reason: format!("http status {}", response.status()),
            });
        }

        let body = response.text().await.map_err(|e| CollectorError::Fetch {
            period: month.to_string(),
            reason: e.to_string(),
        })?;

        Ok(parser::parse_report_items(&body))
    }

    /// Collects the inclusive month range and writes the markdown artifact.
    /// A single failed period is skipped, not fatal; the summary reports it.
    pub async fn collect(
        &self,
        start: &str,
        end: &str,
        output: &Path,
    ) -> Result<CollectSummary, CollectorError> {
        // Absence of stored credentials is not fatal here; the validity
        // probe below is what decides.
        if self.store.exists() {
            self.load_credentials()?;
        }

        if !self.check_session_valid().await {
            return Err(CollectorError::NotAuthenticated);
        }

        let months = expand_period_range(start, end)?;
        tracing::info!("📊 collecting {} period(s): {} .. {}", months.len(), start, end);

        let mut collected: Vec<(String, Vec<ReportItem>)> = Vec::new();
        let mut failed_periods = Vec::new();

        for month in &months {
            tracing::info!("📥 fetching {} ...", month);
            match self.fetch_period(month).await {
                Ok(items) => {
                    tracing::info!("  ✅ {} items", items.len());
                    collected.push((month.clone(), items));
                }
                Err(e) => {
                    tracing::warn!("  ❌ skipping {}: {}", month, e);
                    failed_periods.push(month.clone());
                    collected.push((month.clone(), Vec::new()));
                }
            }
        }

        render::write_markdown(&collected, output)?;

        let total_items = collected.iter().map(|(_, items)| items.len()).sum();
        tracing::info!(
            "🎉 collection done: {} items over {} period(s), {} failed",
            total_items,
            months.len(),
            failed_periods.len()
        );

        Ok(CollectSummary {
            periods: months.len(),
            failed_periods,
            total_items,
            output_path: output.to_path_buf(),
        })
    }
}
