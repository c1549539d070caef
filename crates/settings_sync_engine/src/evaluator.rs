//! Dirty/validity evaluation of a single section.

use crate::rules::FieldIssue;
use crate::section::SectionDescriptor;
use settings_sync_protocol::FieldMap;

/// Enabled state of a section's action buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Affordance {
    /// Save button enabled.
    pub save_enabled: bool,
    /// Cancel button enabled.
    pub cancel_enabled: bool,
    /// Test button enabled; `None` for sections without a test action.
    pub test_enabled: Option<bool>,
}

impl Affordance {
    /// Every affordance disabled.
    pub fn disabled(has_test: bool) -> Self {
        Self {
            save_enabled: false,
            cancel_enabled: false,
            test_enabled: has_test.then_some(false),
        }
    }

    /// Returns true if the test affordance exists and is enabled.
    pub fn can_test(&self) -> bool {
        self.test_enabled.unwrap_or(false)
    }
}

/// Result of evaluating one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Section id.
    pub section: String,
    /// Computed affordances.
    pub affordance: Affordance,
    /// True if the section differs from its baseline under its comparison.
    pub dirty: bool,
    /// Field-level messages; only reported for sections with edits.
    pub issues: Vec<FieldIssue>,
}

/// Evaluates a section against its baseline.
///
/// Reads widgets through the accessor and nothing else, so two calls with no
/// intervening edit return equal results. A pending section reports every
/// affordance disabled.
pub fn evaluate(section: &SectionDescriptor, baseline: &FieldMap, pending: bool) -> Evaluation {
    let current = section.gather();
    let rules = section.rules();

    let dirty = current.differs_from(baseline, &rules.comparison());
    let cancel_enabled = rules.is_cancel_eligible(&current, baseline);
    let issues = if cancel_enabled {
        rules.issues(&current)
    } else {
        Vec::new()
    };

    let affordance = if pending {
        Affordance::disabled(section.has_test())
    } else {
        Affordance {
            save_enabled: cancel_enabled && issues.is_empty(),
            cancel_enabled,
            test_enabled: section.has_test().then(|| {
                rules.is_test_eligible(&current, baseline, &section.gather_test_fields())
            }),
        }
    };

    Evaluation {
        section: section.id().to_string(),
        affordance,
        dirty,
        issues,
    }
}
