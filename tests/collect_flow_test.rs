use kpi_collector::browser::{Credential, SessionStore};
use kpi_collector::collector::ReportCollector;
use kpi_collector::services::Orchestrator;
use kpi_collector::{CollectorError, Config};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const LISTING_HTML: &str = r##"
<html><body>
  <ul id="report_list">
    <li><a href="/report/view?id=1">Week 1 summary</a></li>
    <li><a href="/report/view?id=2">Week 2 summary</a></li>
    <li>Ad-hoc note without link</li>
    <li>   </li>
  </ul>
</body></html>
"##;

fn test_config(addr: SocketAddr, data_dir: &Path) -> Arc<Config> {
    Arc::new(Config {
        base_url: format!("http://{addr}"),
        login_path: "/site/login".into(),
        report_path: "/report/report-daily/my-list".into(),
        sso_host: "accounts.google.com".into(),
        webdriver_url: "http://localhost:9515".into(),
        user_agent: "kpi-collector-test".into(),
        accept_language: "en".into(),
        data_dir: data_dir.to_path_buf(),
        login_timeout: Duration::from_secs(1),
        login_poll: Duration::from_millis(10),
        settle_delay: Duration::ZERO,
        status_poll: Duration::from_millis(10),
        request_timeout: Duration::from_secs(5),
    })
}

/// Reads until the end of the request headers (GET requests carry no body).
async fn read_request_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

/// Minimal HTTP/1.1 responder; `route` maps the request line to a status
/// line and body.
async fn spawn_stub(route: fn(&str) -> (&'static str, String)) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let request = read_request_head(&mut socket).await;
                let request_line = request.lines().next().unwrap_or("").to_string();

                let (status, body) = route(&request_line);
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

fn authenticated_route(request_line: &str) -> (&'static str, String) {
    if request_line.contains("month=2025-01") {
        ("200 OK", LISTING_HTML.to_string())
    } else if request_line.contains("month=2025-02") {
        ("500 Internal Server Error", "boom".to_string())
    } else if request_line.contains("/report/report-daily/my-list") {
        // Validity probe: no month query.
        ("200 OK", "<html><body>dashboard</body></html>".to_string())
    } else {
        ("404 Not Found", "nope".to_string())
    }
}

/// Logged-out stub: every protected path 302-bounces to the login page.
/// Built separately because the redirect needs a Location header.
async fn spawn_logged_out_stub() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let request = read_request_head(&mut socket).await;
                let request_line = request.lines().next().unwrap_or("");

                let response = if request_line.contains("/site/login") {
                    let body = "<html><body>please log in</body></html>";
                    format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    )
                } else {
                    "HTTP/1.1 302 Found\r\nLocation: /site/login\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                        .to_string()
                };
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

#[tokio::test]
async fn test_partial_success_is_still_success() {
    let addr = spawn_stub(authenticated_route).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(addr, dir.path());

    let store = SessionStore::new(dir.path().join("data"));
    let collector = ReportCollector::new(config, store).unwrap();

    let output = dir.path().join("digest.md");
    let summary = collector.collect("2025-01", "2025-02", &output).await.unwrap();

    assert_eq!(summary.periods, 2);
    assert_eq!(summary.total_items, 3);
    assert_eq!(summary.failed_periods, vec!["2025-02".to_string()]);

    let rendered = std::fs::read_to_string(&output).unwrap();
    assert!(rendered.contains("## 2025-01 (3 items)"));
    assert!(rendered.contains("### 1. Week 1 summary"));
    assert!(rendered.contains("Link: /report/view?id=1"));
    assert!(rendered.contains("## 2025-02 (0 items)"));
    assert!(rendered.contains("*no data*"));
}

#[tokio::test]
async fn test_collect_seeds_jar_from_stored_credentials() {
    let addr = spawn_stub(authenticated_route).await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(addr, dir.path());

    let store = SessionStore::new(dir.path().join("data"));
    store
        .save(&[Credential {
            name: "PHPSESSID".into(),
            value: "fixture".into(),
            domain: "".into(),
            path: "/".into(),
        }])
        .unwrap();

    let collector = ReportCollector::new(config, store).unwrap();
    let output = dir.path().join("digest.md");
    let summary = collector.collect("2025-01", "2025-01", &output).await.unwrap();
    assert_eq!(summary.total_items, 3);
    assert!(summary.failed_periods.is_empty());
}

#[tokio::test]
async fn test_not_authenticated_when_bounced_to_login() {
    let addr = spawn_logged_out_stub().await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(addr, dir.path());

    let store = SessionStore::new(dir.path().join("data"));
    let collector = ReportCollector::new(config, store).unwrap();

    assert!(!collector.check_session_valid().await);

    let output = dir.path().join("digest.md");
    let result = collector.collect("2025-01", "2025-01", &output).await;
    assert!(matches!(result, Err(CollectorError::NotAuthenticated)));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_session_probe_false_on_unreachable_transport() {
    // Grab a port, then close it again so connections are refused.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let config = test_config(addr, dir.path());
    let store = SessionStore::new(dir.path().join("data"));
    let collector = ReportCollector::new(config, store).unwrap();

    assert!(!collector.check_session_valid().await);
}

#[tokio::test]
async fn test_load_credentials_requires_non_empty_set() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_stub(authenticated_route).await;
    let config = test_config(addr, dir.path());

    let store = SessionStore::new(dir.path().join("data"));
    store.save(&[]).unwrap();

    let collector = ReportCollector::new(config, store).unwrap();
    assert!(matches!(
        collector.load_credentials(),
        Err(CollectorError::NoCredentials)
    ));
}

#[tokio::test]
async fn test_orchestrator_decision_table() {
    let dir = tempfile::tempdir().unwrap();

    // Valid stored session: collect directly, no login.
    let addr = spawn_stub(authenticated_route).await;
    let config = test_config(addr, &dir.path().join("valid"));
    let orchestrator = Orchestrator::new(config);
    orchestrator
        .store()
        .save(&[Credential {
            name: "PHPSESSID".into(),
            value: "fixture".into(),
            domain: "".into(),
            path: "/".into(),
        }])
        .unwrap();
    assert!(!orchestrator.needs_login().await);

    // Absent credentials: login required.
    let config = test_config(addr, &dir.path().join("absent"));
    let orchestrator = Orchestrator::new(config);
    assert!(orchestrator.needs_login().await);

    // Present but invalid session: login required.
    let addr = spawn_logged_out_stub().await;
    let config = test_config(addr, &dir.path().join("stale"));
    let orchestrator = Orchestrator::new(config);
    orchestrator
        .store()
        .save(&[Credential {
            name: "PHPSESSID".into(),
            value: "expired".into(),
            domain: "".into(),
            path: "/".into(),
        }])
        .unwrap();
    assert!(orchestrator.needs_login().await);
}
