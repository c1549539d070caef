//! Page fixtures.
//!
//! A `TestPage` is a widget host carrying every standard field, an engine
//! with the standard sections registered and bound, and the transport it
//! loaded from.

use settings_sync_engine::fields::*;
use settings_sync_engine::{
    Affordance, EngineConfig, HttpFailure, HttpTransport, LoopbackClient, LoopbackServer,
    MemoryWidgets, MockTransport, SettingsEngine, SettingsTransport, WidgetHost,
};
use settings_sync_protocol::{FieldMap, FieldValue};
use settings_sync_server::{ServerConfig, ServerError, SettingsServer};
use std::sync::Arc;

/// Base URL used by loopback pages.
pub const TEST_BASE_URL: &str = "http://palette.test";

/// Every text-valued field on the settings page.
pub const TEXT_FIELDS: [&str; 17] = [
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
];

/// Creates a widget host with every page field present and empty.
pub fn page_widgets() -> Arc<MemoryWidgets> {
    let widgets = MemoryWidgets::new();
    for field in TEXT_FIELDS {
        widgets.add(field, "");
    }
    widgets.add(ENABLE_SSL, false);
    Arc::new(widgets)
}

/// A setup document with valid values for every section.
pub fn setup_document() -> FieldMap {
    FieldMap::new()
        .with(SERVER_URL, "https://palette.example.com")
        .with(TABLEAU_SERVER_URL, "https://tableau.example.com")
        .with(MAIL_SERVER_TYPE, "direct")
        .with(ALERT_EMAIL_NAME, "Palette")
        .with(ALERT_EMAIL_ADDRESS, "alerts@example.com")
        .with(SMTP_SERVER, "")
        .with(SMTP_PORT, "")
        .with(SMTP_USERNAME, "")
        .with(ENABLE_SSL, false)
        .with(TIMEZONE, "UTC")
        .with(AUTHENTICATION_TYPE, "local")
}

/// Exposes a `SettingsServer` to the loopback HTTP client.
pub struct ServerLoopback(pub Arc<SettingsServer>);

impl LoopbackServer for ServerLoopback {
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

/// HTTP transport wired to an in-process server.
pub type LoopbackTransport = HttpTransport<LoopbackClient<ServerLoopback>>;

/// A loaded settings page.
pub struct TestPage<T: SettingsTransport> {
    /// Widget host backing the page.
    pub widgets: Arc<MemoryWidgets>,
    /// Engine with the standard sections registered and bound.
    pub engine: Arc<SettingsEngine<Arc<T>>>,
    /// Transport the engine talks to.
    pub transport: Arc<T>,
}

impl TestPage<MockTransport> {
    /// Opens a page over a mock transport serving `setup_document()`.
    pub async fn mock() -> Self {
        Self::mock_with(setup_document()).await
    }

    /// Opens a page over a mock transport serving `setup`.
    pub async fn mock_with(setup: FieldMap) -> Self {
        let transport = Arc::new(MockTransport::new());
        transport.set_setup(setup);
        Self::open(EngineConfig::default(), transport).await
    }
}

impl TestPage<LoopbackTransport> {
    /// Opens a page over loopback HTTP to `server`.
    pub async fn loopback(server: Arc<SettingsServer>) -> Self {
        let transport = Arc::new(HttpTransport::new(
            TEST_BASE_URL,
            LoopbackClient::new(ServerLoopback(server)),
        ));
        Self::open(EngineConfig::new(TEST_BASE_URL), transport).await
    }

    /// Opens a page over loopback HTTP to a fresh server seeded with
    /// `setup_document()`.
    pub async fn with_server() -> (Self, Arc<SettingsServer>) {
        let server = Arc::new(SettingsServer::new(ServerConfig::new(setup_document())));
        (Self::loopback(Arc::clone(&server)).await, server)
    }

    /// The server behind the transport.
    pub fn server(&self) -> &Arc<SettingsServer> {
        &self.transport.client().server().0
    }
}

impl<T: SettingsTransport + 'static> TestPage<T> {
    async fn open(config: EngineConfig, transport: Arc<T>) -> Self {
        let widgets = page_widgets();
        let engine = Arc::new(SettingsEngine::new(config, Arc::clone(&transport)));
        engine
            .register_standard(widgets.clone())
            .expect("Failed to register standard sections");
        engine.bind(widgets.as_ref());
        engine.load().await.expect("Failed to load setup document");

        Self {
            widgets,
            engine,
            transport,
        }
    }

    /// Cached affordance of a registered section.
    pub fn affordance(&self, section: &str) -> Affordance {
        self.engine
            .affordance(section)
            .unwrap_or_else(|| panic!("section {section} is not registered"))
    }

    /// Current widget values for the fields of a section's baseline.
    pub fn section_values(&self, section: &str) -> FieldMap {
        let baseline = self
            .engine
            .baseline(section)
            .unwrap_or_else(|| panic!("section {section} is not registered"));
        baseline
            .names()
            .map(|name| {
                let value = self.widgets.get_value(name).unwrap_or_else(FieldValue::empty);
                (name.to_string(), value)
            })
            .collect()
    }

    /// Registered section ids.
    pub fn sections(&self) -> Vec<String> {
        self.engine.section_ids()
    }
}

/// Builds a single-threaded runtime for driving async fixtures from sync
/// test bodies such as proptest cases.
pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build test runtime")
}
