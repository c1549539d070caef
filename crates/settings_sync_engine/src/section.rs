//! Section descriptors and the standard settings-page sections.

use crate::accessor::{FieldAccessor, FieldSpec, WidgetAccessor};
use crate::rules::{AdminRules, ChangeRules, MailRules, SectionRules, TlsRules, UrlRules};
use crate::widget::WidgetHost;
use settings_sync_protocol::fields::*;
use settings_sync_protocol::FieldMap;
use std::fmt;
use std::sync::Arc;

/// Ids of the standard sections.
pub mod ids {
    /// Primary server URL.
    pub const URL: &str = "url";
    /// Secondary (Tableau) server URL.
    pub const TABLEAU_URL: &str = "tableau-url";
    /// Administrator password.
    pub const ADMIN: &str = "admin";
    /// Outbound mail.
    pub const MAIL: &str = "mail";
    /// TLS certificates.
    pub const SSL: &str = "ssl";
    /// Server timezone.
    pub const TZ: &str = "tz";
    /// Authentication mode.
    pub const AUTH: &str = "auth";

    /// All standard ids in page order.
    pub const ALL: [&str; 7] = [URL, TABLEAU_URL, ADMIN, MAIL, SSL, TZ, AUTH];
}

/// Endpoint prefix shared by the standard section endpoints.
pub const SETUP_PREFIX: &str = "/rest/setup";

/// Binds a section id to its accessor, its rules and its endpoint.
#[derive(Clone)]
pub struct SectionDescriptor {
    id: String,
    endpoint: String,
    accessor: Arc<dyn FieldAccessor>,
    rules: Arc<dyn SectionRules>,
    test_fields: Option<Arc<dyn FieldAccessor>>,
}

impl SectionDescriptor {
    /// Creates a descriptor.
    pub fn new(
        id: impl Into<String>,
        endpoint: impl Into<String>,
        accessor: Arc<dyn FieldAccessor>,
        rules: Arc<dyn SectionRules>,
    ) -> Self {
        Self {
            id: id.into(),
            endpoint: endpoint.into(),
            accessor,
            rules,
            test_fields: None,
        }
    }

    /// Attaches the fields a test action reads from outside the section.
    pub fn with_test_fields(mut self, accessor: Arc<dyn FieldAccessor>) -> Self {
        self.test_fields = Some(accessor);
        self
    }

    /// Section id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Commit endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Section rules.
    pub fn rules(&self) -> &dyn SectionRules {
        self.rules.as_ref()
    }

    /// Returns true if the section has a test action.
    pub fn has_test(&self) -> bool {
        self.test_fields.is_some()
    }

    /// Returns true if the section's widgets exist on the page.
    pub fn is_present(&self) -> bool {
        self.accessor.is_present()
    }

    /// Snapshot of the section's fields.
    pub fn gather(&self) -> FieldMap {
        self.accessor.gather()
    }

    /// Writes fields back to the section's widgets.
    pub fn set_all(&self, fields: &FieldMap) {
        self.accessor.set_all(fields);
    }

    /// Snapshot of the test action's extra fields; empty without a test action.
    pub fn gather_test_fields(&self) -> FieldMap {
        self.test_fields
            .as_ref()
            .map(|accessor| accessor.gather())
            .unwrap_or_default()
    }

    /// Save predicate.
    pub fn is_save_eligible(&self, current: &FieldMap, baseline: &FieldMap) -> bool {
        self.rules.is_save_eligible(current, baseline)
    }

    /// Cancel predicate.
    pub fn is_cancel_eligible(&self, current: &FieldMap, baseline: &FieldMap) -> bool {
        self.rules.is_cancel_eligible(current, baseline)
    }

    /// Builds the standard section with the given id, if it is one.
    pub fn standard(id: &str, host: Arc<dyn WidgetHost>) -> Option<Self> {
        let section = match id {
            ids::URL => Self::server_url(host),
            ids::TABLEAU_URL => Self::tableau_url(host),
            ids::ADMIN => Self::admin(host),
            ids::MAIL => Self::mail(host),
            ids::SSL => Self::tls(host),
            ids::TZ => Self::timezone(host),
            ids::AUTH => Self::authentication(host),
            _ => return None,
        };
        Some(section)
    }

    /// Primary server URL section.
    pub fn server_url(host: Arc<dyn WidgetHost>) -> Self {
        standard_section(
            ids::URL,
            host,
            vec![FieldSpec::text(SERVER_URL)],
            Arc::new(UrlRules::new(SERVER_URL)),
        )
    }

    /// Secondary server URL section.
    pub fn tableau_url(host: Arc<dyn WidgetHost>) -> Self {
        standard_section(
            ids::TABLEAU_URL,
            host,
            vec![FieldSpec::text(TABLEAU_SERVER_URL)],
            Arc::new(UrlRules::new(TABLEAU_SERVER_URL)),
        )
    }

    /// Administrator password section.
    pub fn admin(host: Arc<dyn WidgetHost>) -> Self {
        standard_section(
            ids::ADMIN,
            host,
            vec![FieldSpec::text(PASSWORD), FieldSpec::text(CONFIRM_PASSWORD)],
            Arc::new(AdminRules),
        )
    }

    /// Outbound mail section, with a test action.
    pub fn mail(host: Arc<dyn WidgetHost>) -> Self {
        let recipient = Arc::new(WidgetAccessor::new(
            Arc::clone(&host),
            vec![FieldSpec::text(TEST_EMAIL_RECIPIENT)],
        ));
        standard_section(
            ids::MAIL,
            host,
            vec![
                FieldSpec::choice(MAIL_SERVER_TYPE),
                FieldSpec::text(ALERT_EMAIL_NAME),
                FieldSpec::text(ALERT_EMAIL_ADDRESS),
                FieldSpec::text(SMTP_SERVER),
                FieldSpec::text(SMTP_PORT),
                FieldSpec::text(SMTP_USERNAME),
                FieldSpec::text(SMTP_PASSWORD),
            ],
            Arc::new(MailRules),
        )
        .with_test_fields(recipient)
    }

    /// TLS certificate section.
    pub fn tls(host: Arc<dyn WidgetHost>) -> Self {
        standard_section(
            ids::SSL,
            host,
            vec![
                FieldSpec::switch(ENABLE_SSL),
                FieldSpec::text(SSL_CERTIFICATE_FILE),
                FieldSpec::text(SSL_CERTIFICATE_KEY_FILE),
                FieldSpec::text(SSL_CERTIFICATE_CHAIN_FILE),
            ],
            Arc::new(TlsRules),
        )
    }

    /// Timezone section.
    pub fn timezone(host: Arc<dyn WidgetHost>) -> Self {
        standard_section(
            ids::TZ,
            host,
            vec![FieldSpec::choice(TIMEZONE)],
            Arc::new(ChangeRules),
        )
    }

    /// Authentication mode section.
    pub fn authentication(host: Arc<dyn WidgetHost>) -> Self {
        standard_section(
            ids::AUTH,
            host,
            vec![FieldSpec::choice(AUTHENTICATION_TYPE)],
            Arc::new(ChangeRules),
        )
    }
}

impl fmt::Debug for SectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionDescriptor")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("has_test", &self.has_test())
            .finish()
    }
}

fn standard_section(
    id: &str,
    host: Arc<dyn WidgetHost>,
    fields: Vec<FieldSpec>,
    rules: Arc<dyn SectionRules>,
) -> SectionDescriptor {
    SectionDescriptor::new(
        id,
        format!("{SETUP_PREFIX}/{id}"),
        Arc::new(WidgetAccessor::new(host, fields)),
        rules,
    )
}

/// Builds every standard section whose widgets exist on `host`, in page order.
pub fn standard_sections(host: Arc<dyn WidgetHost>) -> Vec<SectionDescriptor> {
    ids::ALL
        .iter()
        .filter_map(|id| SectionDescriptor::standard(id, Arc::clone(&host)))
        .filter(SectionDescriptor::is_present)
        .collect()
}
