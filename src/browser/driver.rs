use crate::config::Config;
use crate::error::CollectorError;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use std::path::Path;

/// Connects to chromedriver with a headed browser bound to the isolated
/// profile directory. The login is human-driven, so headless is never an
/// option here.
pub async fn create_webdriver_client(
    config: &Config,
    profile_dir: &Path,
) -> Result<Client, CollectorError> {
    let mut caps = serde_json::Map::new();

    let mut chrome_opts = serde_json::Map::new();

    let args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        format!("--user-data-dir={}", profile_dir.display()),
        format!("--user-agent={}", config.user_agent),
        "--window-size=1920,1080".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
    ];

    chrome_opts.insert("args".to_string(), json!(args));
    chrome_opts.insert("excludeSwitches".to_string(), json!(["enable-automation"]));

    caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("acceptInsecureCerts".to_string(), json!(true));

    tracing::info!("🌐 connecting to WebDriver at {}", config.webdriver_url);

    let client = ClientBuilder::native()
        .capabilities(caps)
        .connect(&config.webdriver_url)
        .await?;

    tracing::info!("✅ WebDriver session created");

    Ok(client)
}
