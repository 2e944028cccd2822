use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    // Target application
    pub base_url: String,
    pub login_path: String,
    pub report_path: String,
    /// External identity-provider host; a URL on this host means the login
    /// flow has not returned to the application yet.
    pub sso_host: String,

    // Browser
    pub webdriver_url: String,
    pub user_agent: String,
    pub accept_language: String,

    // Storage
    pub data_dir: PathBuf,

    // Timeouts & intervals
    pub login_timeout: Duration,
    pub login_poll: Duration,
    pub settle_delay: Duration,
    pub status_poll: Duration,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Config {
            base_url: env::var("KPI_BASE_URL")
                .unwrap_or_else(|_| "https://kpi.drojian.dev".to_string()),
            login_path: env::var("KPI_LOGIN_PATH")
                .unwrap_or_else(|_| "/site/login".to_string()),
            report_path: env::var("KPI_REPORT_PATH")
                .unwrap_or_else(|_| "/report/report-daily/my-list".to_string()),
            sso_host: env::var("SSO_HOST")
                .unwrap_or_else(|_| "accounts.google.com".to_string()),

            webdriver_url: env::var("WEBDRIVER_URL")
                .unwrap_or_else(|_| "http://localhost:9515".to_string()),
            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| {
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36".to_string()
            }),
            accept_language: env::var("ACCEPT_LANGUAGE")
                .unwrap_or_else(|_| "zh-CN,zh-TW;q=0.9,zh;q=0.8,en;q=0.7".to_string()),

            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_data_dir()),

            login_timeout: secs_from_env("LOGIN_TIMEOUT_SECS", 360),
            login_poll: secs_from_env("LOGIN_POLL_SECS", 7),
            settle_delay: secs_from_env("SETTLE_SECS", 2),
            status_poll: secs_from_env("STATUS_POLL_SECS", 3),
            request_timeout: secs_from_env("REQUEST_TIMEOUT_SECS", 30),
        }
    }

    pub fn report_url(&self) -> String {
        format!("{}{}", self.base_url, self.report_path)
    }

    pub fn login_url(&self) -> String {
        format!("{}{}", self.base_url, self.login_path)
    }

    /// Host component of `base_url`, if it parses.
    pub fn app_host(&self) -> Option<String> {
        Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
    }
}

fn secs_from_env(key: &str, default: u64) -> Duration {
    let secs = env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}

/// Default credential/profile location. A resolution helper, not part of the
/// store contract - pass an explicit `DATA_DIR` to override.
pub fn default_data_dir() -> PathBuf {
    match env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".kpi-collector").join("data"),
        Err(_) => PathBuf::from("data"),
    }
}
