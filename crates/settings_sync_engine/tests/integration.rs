//! End-to-end tests: engine and status monitor against the reference server
//! over the loopback transport.

use serde_json::json;
use settings_sync_engine::fields::*;
use settings_sync_engine::{
    ids, Affordance, EngineConfig, ErrorClass, HttpFailure, HttpTransport, LoopbackClient,
    LoopbackServer, MemoryWidgets, MonitorConfig, SettingsEngine, SettingsError, StatusMonitor,
    StatusReport, TopicFeed, WidgetHost,
};
use settings_sync_protocol::{FieldMap, FieldValue};
use settings_sync_server::{ServerConfig, ServerError, SettingsServer};
use std::sync::Arc;

const BASE_URL: &str = "http://palette.local";

struct Loopback(Arc<SettingsServer>);

impl LoopbackServer for Loopback {
    fn handle_get(&self, path: &str) -> Result<Vec<u8>, HttpFailure> {
        self.0.handle_get(path).map_err(into_failure)
    }

    fn handle_post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, HttpFailure> {
        self.0.handle_post(path, body).map_err(into_failure)
    }
}

fn into_failure(err: ServerError) -> HttpFailure {
    HttpFailure::status(err.status_code(), err.reason())
}

type Transport = HttpTransport<LoopbackClient<Loopback>>;

struct Page {
    server: Arc<SettingsServer>,
    widgets: Arc<MemoryWidgets>,
    engine: Arc<SettingsEngine<Arc<Transport>>>,
    transport: Arc<Transport>,
}

fn initial_settings() -> FieldMap {
    FieldMap::new()
        .with(SERVER_URL, "https://a.com")
        .with(TABLEAU_SERVER_URL, "https://tableau.a.com")
        .with(MAIL_SERVER_TYPE, "smtp")
        .with(ALERT_EMAIL_NAME, "Palette")
        .with(ALERT_EMAIL_ADDRESS, "alerts@a.com")
        .with(SMTP_SERVER, "")
        .with(SMTP_PORT, "")
        .with(SMTP_USERNAME, "")
        .with(ENABLE_SSL, false)
        .with(TIMEZONE, "UTC")
        .with(AUTHENTICATION_TYPE, "local")
}

fn page_widgets() -> Arc<MemoryWidgets> {
    let widgets = MemoryWidgets::new();
    for field in [
        SERVER_URL,
        TABLEAU_SERVER_URL,
        PASSWORD,
        CONFIRM_PASSWORD,
        MAIL_SERVER_TYPE,
        ALERT_EMAIL_NAME,
        ALERT_EMAIL_ADDRESS,
        SMTP_SERVER,
        SMTP_PORT,
        SMTP_USERNAME,
        SMTP_PASSWORD,
        TEST_EMAIL_RECIPIENT,
        SSL_CERTIFICATE_FILE,
        SSL_CERTIFICATE_KEY_FILE,
        SSL_CERTIFICATE_CHAIN_FILE,
        TIMEZONE,
        AUTHENTICATION_TYPE,
    ] {
        widgets.add(field, "");
    }
    widgets.add(ENABLE_SSL, false);
    Arc::new(widgets)
}

async fn open_page(config: ServerConfig) -> Page {
    let server = Arc::new(SettingsServer::new(config));
    let transport = Arc::new(HttpTransport::new(
        BASE_URL,
        LoopbackClient::new(Loopback(Arc::clone(&server))),
    ));
    let widgets = page_widgets();
    let engine = Arc::new(SettingsEngine::new(
        EngineConfig::new(BASE_URL),
        Arc::clone(&transport),
    ));
    engine.register_standard(widgets.clone()).unwrap();
    engine.bind(widgets.as_ref());
    engine.load().await.unwrap();

    Page {
        server,
        widgets,
        engine,
        transport,
    }
}

async fn default_page() -> Page {
    open_page(ServerConfig::new(initial_settings())).await
}

fn both_disabled(page: &Page, section: &str) -> bool {
    let affordance = page.engine.affordance(section).unwrap();
    !affordance.save_enabled && !affordance.cancel_enabled
}

#[tokio::test]
async fn load_populates_every_section() {
    let page = default_page().await;

    assert_eq!(
        page.widgets.get_value(SERVER_URL),
        Some(FieldValue::from("https://a.com"))
    );
    assert_eq!(
        page.widgets.get_value(MAIL_SERVER_TYPE),
        Some(FieldValue::from("smtp"))
    );
    for id in ids::ALL {
        assert!(both_disabled(&page, id), "{id}");
        assert!(!page.engine.is_dirty(id).unwrap());
    }
    assert_eq!(
        page.engine.baseline(ids::TZ).unwrap(),
        FieldMap::new().with(TIMEZONE, "UTC")
    );
}

#[tokio::test]
async fn url_scenario() {
    let page = default_page().await;

    page.widgets.edit(SERVER_URL, "not a url");
    let affordance = page.engine.affordance(ids::URL).unwrap();
    assert!(!affordance.save_enabled);
    assert!(affordance.cancel_enabled);

    page.widgets.edit(SERVER_URL, "https://b.com");
    let affordance = page.engine.affordance(ids::URL).unwrap();
    assert!(affordance.save_enabled);
    assert!(affordance.cancel_enabled);

    page.engine.save(ids::URL).await.unwrap();
    assert_eq!(page.server.setup_document().text(SERVER_URL), "https://b.com");
    assert_eq!(
        page.engine.baseline(ids::URL).unwrap().text(SERVER_URL),
        "https://b.com"
    );
    assert!(both_disabled(&page, ids::URL));
}

#[tokio::test]
async fn admin_password_is_stored_hashed() {
    let page = default_page().await;

    page.widgets.edit(PASSWORD, "secret");
    assert!(!page.engine.affordance(ids::ADMIN).unwrap().save_enabled);
    page.widgets.edit(CONFIRM_PASSWORD, "secret");
    assert!(page.engine.affordance(ids::ADMIN).unwrap().save_enabled);

    page.engine.save(ids::ADMIN).await.unwrap();

    assert!(page.server.verify_admin_password("secret"));
    assert!(!page.server.setup_document().contains(PASSWORD));
    assert_eq!(page.widgets.get_value(PASSWORD), Some(FieldValue::empty()));
    assert_eq!(
        page.widgets.get_value(CONFIRM_PASSWORD),
        Some(FieldValue::empty())
    );
    assert!(both_disabled(&page, ids::ADMIN));
}

#[tokio::test]
async fn mail_relay_scenario() {
    let page = default_page().await;

    page.widgets.edit(SMTP_SERVER, "mail.x.com");
    page.widgets.edit(SMTP_PORT, "25");
    assert!(page.engine.is_dirty(ids::MAIL).unwrap());
    assert!(page.engine.affordance(ids::MAIL).unwrap().save_enabled);

    page.widgets.edit(SMTP_USERNAME, "admin");
    let affordance = page.engine.affordance(ids::MAIL).unwrap();
    assert!(!affordance.save_enabled);
    assert!(affordance.cancel_enabled);
    assert_eq!(
        page.engine.issues(ids::MAIL)[0].message,
        "The password is required when a username is specified."
    );

    page.widgets.edit(SMTP_PASSWORD, "secret");
    assert!(page.engine.affordance(ids::MAIL).unwrap().save_enabled);

    page.engine.save(ids::MAIL).await.unwrap();
    let stored = page.server.store().document();
    assert_eq!(stored.text(SMTP_SERVER), "mail.x.com");
    assert_eq!(stored.text(SMTP_PASSWORD), "secret");
    assert_eq!(page.server.setup_document().text(SMTP_PASSWORD), "secret");
    assert!(both_disabled(&page, ids::MAIL));
}

#[tokio::test]
async fn reloaded_relay_credentials_match_the_server() {
    let settings = initial_settings()
        .with(SMTP_SERVER, "mail.x.com")
        .with(SMTP_PORT, "25")
        .with(SMTP_USERNAME, "admin")
        .with(SMTP_PASSWORD, "secret");
    let page = open_page(ServerConfig::new(settings)).await;

    let baseline = page.engine.baseline(ids::MAIL).unwrap();
    assert_eq!(baseline.text(SMTP_USERNAME), "admin");
    assert_eq!(baseline.text(SMTP_PASSWORD), "secret");
    assert!(both_disabled(&page, ids::MAIL));

    page.widgets.edit(ALERT_EMAIL_ADDRESS, "ops@a.com");
    let affordance = page.engine.affordance(ids::MAIL).unwrap();
    assert!(affordance.save_enabled);
    assert!(affordance.cancel_enabled);
    assert!(page.engine.issues(ids::MAIL).is_empty());

    page.engine.save(ids::MAIL).await.unwrap();
    let stored = page.server.store().document();
    assert_eq!(stored.text(ALERT_EMAIL_ADDRESS), "ops@a.com");
    assert_eq!(stored.text(SMTP_PASSWORD), "secret");
}

#[tokio::test]
async fn relay_without_alert_email_cannot_save() {
    let settings = initial_settings().with(ALERT_EMAIL_ADDRESS, "");
    let page = open_page(ServerConfig::new(settings)).await;

    page.widgets.edit(SMTP_SERVER, "mail.x.com");
    page.widgets.edit(SMTP_PORT, "25");
    let affordance = page.engine.affordance(ids::MAIL).unwrap();
    assert!(!affordance.save_enabled);
    assert!(affordance.cancel_enabled);
    assert_eq!(page.engine.issues(ids::MAIL)[0].message, "The email address is invalid.");
}

#[tokio::test]
async fn mail_test_reports_outcome() {
    let page = open_page(
        ServerConfig::new(initial_settings()).with_mail_test_failure("relay refused"),
    )
    .await;

    assert!(!page.engine.affordance(ids::MAIL).unwrap().can_test());
    page.widgets.edit(TEST_EMAIL_RECIPIENT, "ops@a.com");
    assert!(page.engine.affordance(ids::MAIL).unwrap().can_test());

    let outcome = page.engine.test(ids::MAIL).await.unwrap();
    assert_eq!(outcome.to_string(), "FAILED: relay refused");
    assert_eq!(page.server.store().save_count("mail"), 0);
}

#[tokio::test]
async fn tls_scenario() {
    let page = default_page().await;

    page.widgets.edit(SSL_CERTIFICATE_FILE, "stale.pem");
    page.widgets.edit(SSL_CERTIFICATE_KEY_FILE, "stale.key");
    assert!(both_disabled(&page, ids::SSL));

    page.widgets.edit(ENABLE_SSL, true);
    page.widgets.edit(SSL_CERTIFICATE_FILE, "a.pem");
    page.widgets.edit(SSL_CERTIFICATE_KEY_FILE, "");
    let affordance = page.engine.affordance(ids::SSL).unwrap();
    assert!(!affordance.save_enabled);
    assert!(affordance.cancel_enabled);

    page.widgets.edit(SSL_CERTIFICATE_KEY_FILE, "a.key");
    assert!(page.engine.affordance(ids::SSL).unwrap().save_enabled);

    page.engine.save(ids::SSL).await.unwrap();
    assert!(page.server.setup_document().flag(ENABLE_SSL));
    assert_eq!(
        page.widgets.get_value(SSL_CERTIFICATE_FILE),
        Some(FieldValue::empty())
    );
    assert!(both_disabled(&page, ids::SSL));
}

#[tokio::test]
async fn cancel_restores_the_loaded_values() {
    let page = default_page().await;
    page.widgets.edit(TIMEZONE, "Asia/Tokyo");
    page.widgets.edit(TABLEAU_SERVER_URL, "https://other.com");

    page.engine.cancel(ids::TZ).unwrap();
    assert_eq!(
        page.widgets.get_value(TIMEZONE),
        Some(FieldValue::from("UTC"))
    );
    assert!(both_disabled(&page, ids::TZ));
    assert!(page.engine.affordance(ids::TABLEAU_URL).unwrap().cancel_enabled);
}

#[tokio::test]
async fn failed_save_leaves_baseline_and_reports_url() {
    let page = default_page().await;
    page.server.fail_next(
        "/rest/setup/tz",
        ServerError::Internal("database locked".into()),
    );
    page.widgets.edit(TIMEZONE, "Asia/Tokyo");

    let err = page.engine.save(ids::TZ).await.unwrap_err();
    assert!(err.is_retryable());

    let notice = page.engine.notice(ids::TZ).unwrap();
    assert_eq!(notice.class, ErrorClass::Transport);
    assert_eq!(
        notice.message,
        "http://palette.local/rest/setup/tz: 500 (Internal Server Error)"
    );
    assert_eq!(page.engine.baseline(ids::TZ).unwrap().text(TIMEZONE), "UTC");
    assert_eq!(page.server.setup_document().text(TIMEZONE), "UTC");
    assert!(page.engine.affordance(ids::TZ).unwrap().save_enabled);

    page.engine.save(ids::TZ).await.unwrap();
    assert_eq!(page.server.setup_document().text(TIMEZONE), "Asia/Tokyo");
    assert!(page.engine.notice(ids::TZ).is_none());
    assert_eq!(page.engine.affordance(ids::TZ), Some(Affordance::default()));
}

#[tokio::test]
async fn client_errors_are_not_retryable() {
    let page = default_page().await;
    page.server.fail_next(
        "/rest/setup/auth",
        ServerError::NotFound("/rest/setup/auth".into()),
    );
    page.widgets.edit(AUTHENTICATION_TYPE, "active-directory");

    let err = page.engine.save(ids::AUTH).await.unwrap_err();
    assert!(matches!(err, SettingsError::Transport { retryable: false, .. }));
    assert_eq!(
        page.transport.last_error().as_deref(),
        Some("http://palette.local/rest/setup/auth: 404 (Not Found)")
    );
}

#[tokio::test]
async fn sections_commit_independently() {
    let page = default_page().await;
    page.widgets.edit(TIMEZONE, "Asia/Tokyo");
    page.widgets.edit(AUTHENTICATION_TYPE, "active-directory");
    let auth_before = page.engine.baseline(ids::AUTH).unwrap();

    page.engine.save(ids::TZ).await.unwrap();

    assert_eq!(page.engine.baseline(ids::AUTH).unwrap(), auth_before);
    assert!(page.engine.affordance(ids::AUTH).unwrap().save_enabled);
    assert_eq!(page.server.store().save_count("auth"), 0);
}

#[tokio::test]
async fn status_transitions_are_broadcast_once() {
    let page = default_page().await;
    let feed = Arc::new(TopicFeed::new());
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    feed.subscribe("state", move |report: &StatusReport| {
        sink.lock().push(report.state().map(str::to_string));
    });
    let monitor = StatusMonitor::new(
        Arc::clone(&page.transport),
        MonitorConfig::default(),
        Arc::clone(&feed),
    );

    let a = json!({ "state": "RUNNING", "text": "OK", "color": "green" });
    let b = json!({ "state": "STOPPED", "text": "STOPPED", "color": "red" });
    let mut broadcasts = 0;
    for status in [&a, &a, &b, &b, &a] {
        page.server.set_status(status.clone());
        if monitor.poll_once().await.is_published() {
            broadcasts += 1;
        }
    }
    assert_eq!(broadcasts, 3);

    page.server.fail_next("/rest/monitor", ServerError::Unavailable("agent".into()));
    assert!(monitor.poll_once().await.is_published());
    assert_eq!(monitor.last_serialized().as_deref(), Some(r#"{"text":"error"}"#));

    assert_eq!(
        *seen.lock(),
        vec![
            Some("RUNNING".to_string()),
            Some("STOPPED".to_string()),
            Some("RUNNING".to_string()),
            None,
        ]
    );
}
