//! Deep equality between field maps.
//!
//! Every dirty check goes through `Comparison` so that "ignore this field
//! while its switch is off" rules live next to the data they describe rather
//! than being repeated in each section.

use crate::value::FieldMap;
use std::collections::BTreeSet;

/// Ignore `fields` whenever the flag `switch` is off in the current map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InactiveRule {
    /// Name of the gating switch.
    pub switch: String,
    /// Fields that are inert while the switch is off.
    pub fields: Vec<String>,
}

/// Parameters for comparing a current snapshot with its baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    ignored: Vec<String>,
    inactive: Vec<InactiveRule>,
}

impl Comparison {
    /// A comparison that observes every field.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Never compares the named field.
    pub fn ignoring(mut self, field: impl Into<String>) -> Self {
        self.ignored.push(field.into());
        self
    }

    /// Ignores `fields` while `switch` is off.
    pub fn ignore_when_off<I, S>(mut self, switch: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inactive.push(InactiveRule {
            switch: switch.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }

    fn is_ignored(&self, name: &str, current: &FieldMap) -> bool {
        if self.ignored.iter().any(|f| f == name) {
            return true;
        }
        self.inactive
            .iter()
            .any(|rule| !current.flag(&rule.switch) && rule.fields.iter().any(|f| f == name))
    }

    /// Names of observed fields whose values differ, in key order.
    ///
    /// A field present on one side only counts as changed.
    pub fn changed_fields(&self, current: &FieldMap, baseline: &FieldMap) -> Vec<String> {
        let names: BTreeSet<&str> = current.names().chain(baseline.names()).collect();
        names
            .into_iter()
            .filter(|name| !self.is_ignored(name, current))
            .filter(|name| current.get(name) != baseline.get(name))
            .map(str::to_string)
            .collect()
    }

    /// Returns true if any observed field differs.
    pub fn differs(&self, current: &FieldMap, baseline: &FieldMap) -> bool {
        let mut names = current.names().chain(baseline.names());
        names.any(|name| !self.is_ignored(name, current) && current.get(name) != baseline.get(name))
    }
}

impl FieldMap {
    /// Returns true if this snapshot differs from `baseline` under `comparison`.
    pub fn differs_from(&self, baseline: &FieldMap, comparison: &Comparison) -> bool {
        comparison.differs(self, baseline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldValue;

    fn tls(enabled: bool, cert: &str) -> FieldMap {
        FieldMap::new()
            .with("enable-ssl", enabled)
            .with("ssl-certificate-file", cert)
    }

    #[test]
    fn strict_comparison_sees_everything() {
        let cmp = Comparison::strict();
        assert!(!tls(true, "a.pem").differs_from(&tls(true, "a.pem"), &cmp));
        assert!(tls(true, "b.pem").differs_from(&tls(true, "a.pem"), &cmp));
    }

    #[test]
    fn missing_field_counts_as_change() {
        let cmp = Comparison::strict();
        let current = FieldMap::new().with("a", "");
        let baseline = FieldMap::new();
        assert!(current.differs_from(&baseline, &cmp));
        assert_eq!(cmp.changed_fields(&current, &baseline), vec!["a".to_string()]);
    }

    #[test]
    fn inactive_fields_are_ignored_while_switch_off() {
        let cmp = Comparison::strict()
            .ignoring("enable-ssl")
            .ignore_when_off("enable-ssl", ["ssl-certificate-file"]);

        assert!(!tls(false, "stale.pem").differs_from(&tls(false, ""), &cmp));
        assert!(tls(true, "a.pem").differs_from(&tls(false, ""), &cmp));
    }

    fn field_map_strategy() -> impl proptest::strategy::Strategy<Value = FieldMap> {
        use proptest::prelude::*;
        prop::collection::btree_map(
            "[a-d]",
            prop_oneof![
                any::<bool>().prop_map(FieldValue::from),
                "[xy]{0,2}".prop_map(FieldValue::from)
            ],
            0..4,
        )
        .prop_map(|m| m.into_iter().collect::<FieldMap>())
    }

    proptest::proptest! {
        #[test]
        fn differs_agrees_with_changed_fields(
            current in field_map_strategy(),
            baseline in field_map_strategy(),
        ) {
            let cmp = Comparison::strict().ignore_when_off("a", ["b"]);
            proptest::prop_assert_eq!(
                cmp.differs(&current, &baseline),
                !cmp.changed_fields(&current, &baseline).is_empty()
            );
            proptest::prop_assert!(!current.differs_from(&current, &cmp));
        }
    }

    #[test]
    fn changed_fields_are_sorted() {
        let cmp = Comparison::strict();
        let current = FieldMap::new().with("z", "1").with("a", "1").with("m", "same");
        let baseline = FieldMap::new().with("m", "same");
        assert_eq!(cmp.changed_fields(&current, &baseline), vec!["a", "z"]);
    }
}
