use crate::browser::session::Credential;
use crate::error::CollectorError;
use async_trait::async_trait;
use fantoccini::Client;
use url::Url;

/// What the login flow needs from a live browser. The WebDriver client sits
/// behind this so the state machine can be driven by a scripted fake.
#[async_trait]
pub trait BrowserControl: Send + Sync {
    async fn current_url(&self) -> Result<Url, CollectorError>;

    async fn navigate(&self, url: &str) -> Result<(), CollectorError>;

    /// Every cookie visible to the browser context, mapped into credential
    /// form.
    async fn cookies(&self) -> Result<Vec<Credential>, CollectorError>;
}

pub struct WebDriverSession {
    client: Client,
}

impl WebDriverSession {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn close(self) {
        if let Err(e) = self.client.close().await {
            tracing::warn!("⚠️ browser teardown failed: {}", e);
        }
    }
}

#[async_trait]
impl BrowserControl for WebDriverSession {
    async fn current_url(&self) -> Result<Url, CollectorError> {
        Ok(self.client.current_url().await?)
    }

    async fn navigate(&self, url: &str) -> Result<(), CollectorError> {
        Ok(self.client.goto(url).await?)
    }

    async fn cookies(&self) -> Result<Vec<Credential>, CollectorError> {
        let raw = self.client.get_all_cookies().await?;
        Ok(raw
            .into_iter()
            .map(|c| Credential {
                name: c.name().to_string(),
                value: c.value().to_string(),
                domain: c.domain().unwrap_or("").to_string(),
                path: c.path().unwrap_or("/").to_string(),
            })
            .collect())
    }
}
