//! Property-based test generators using proptest.
//!
//! Text values are drawn from a mix of well-formed and malformed URLs,
//! addresses and ports so that generated edits exercise both sides of every
//! section rule.

use crate::fixtures::TEXT_FIELDS;
use proptest::prelude::*;
use settings_sync_engine::fields::*;
use settings_sync_engine::MemoryWidgets;
use settings_sync_protocol::{FieldMap, FieldValue};

/// A single user edit.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEdit {
    /// Field id.
    pub field: &'static str,
    /// New value.
    pub value: FieldValue,
}

impl FieldEdit {
    /// Applies the edit as a user change.
    pub fn apply(&self, widgets: &MemoryWidgets) {
        widgets.edit(self.field, self.value.clone());
    }
}

/// Strategy for URL-ish text, valid or not.
pub fn url_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("https?://[a-z]{1,8}\\.(com|org|net)(/[a-z]{0,6})?")
            .expect("Invalid regex"),
        prop::string::string_regex("[a-z]{1,8}(\\.[a-z]{2,3})?").expect("Invalid regex"),
        Just("not a url".to_string()),
    ]
}

/// Strategy for email-ish text, valid or not.
pub fn email_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[a-z]{1,8}@[a-z]{1,8}\\.(com|org)").expect("Invalid regex"),
        prop::string::string_regex("[a-z]{1,8}@?").expect("Invalid regex"),
    ]
}

/// Strategy for port text, in range or not.
pub fn port_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (1u32..=65535).prop_map(|p| p.to_string()),
        Just("0".to_string()),
        Just("70000".to_string()),
        Just("smtp".to_string()),
    ]
}

/// Strategy for any text value a page field might hold.
pub fn text_value_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        2 => Just(String::new()),
        2 => url_strategy(),
        2 => email_strategy(),
        1 => port_strategy(),
        1 => prop::sample::select(vec!["none", "direct", "smtp", "relay"]).prop_map(String::from),
        1 => prop::string::string_regex("[a-zA-Z0-9 ./_-]{0,12}").expect("Invalid regex"),
    ]
}

/// Strategy for generating a single edit to any page field.
pub fn field_edit_strategy() -> impl Strategy<Value = FieldEdit> {
    prop_oneof![
        6 => (prop::sample::select(TEXT_FIELDS.to_vec()), text_value_strategy()).prop_map(
            |(field, text)| FieldEdit {
                field,
                value: FieldValue::Text(text),
            }
        ),
        1 => any::<bool>().prop_map(|on| FieldEdit {
            field: ENABLE_SSL,
            value: FieldValue::Flag(on),
        }),
    ]
}

/// Strategy for generating a sequence of edits.
pub fn edit_sequence_strategy(
    min_edits: usize,
    max_edits: usize,
) -> impl Strategy<Value = Vec<FieldEdit>> {
    prop::collection::vec(field_edit_strategy(), min_edits..max_edits)
}

/// Strategy for generating a setup document the server could serve.
pub fn setup_document_strategy() -> impl Strategy<Value = FieldMap> {
    (
        url_strategy(),
        url_strategy(),
        prop::sample::select(vec!["none", "direct", "smtp"]),
        email_strategy(),
        any::<bool>(),
        prop::sample::select(vec!["UTC", "Asia/Tokyo", "America/New_York"]),
    )
        .prop_map(|(server_url, tableau_url, mail, address, tls, tz)| {
            FieldMap::new()
                .with(SERVER_URL, server_url)
                .with(TABLEAU_SERVER_URL, tableau_url)
                .with(MAIL_SERVER_TYPE, mail)
                .with(ALERT_EMAIL_NAME, "Palette")
                .with(ALERT_EMAIL_ADDRESS, address)
                .with(ENABLE_SSL, tls)
                .with(TIMEZONE, tz)
                .with(AUTHENTICATION_TYPE, "local")
        })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 128,
            max_shrink_iters: 500,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 5000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
