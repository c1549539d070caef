//! Page-wide invariant checks.
//!
//! Each check returns a description of the first violation found so that
//! property tests can report it through `prop_assert!`.

use crate::fixtures::TestPage;
use settings_sync_engine::{Affordance, SettingsTransport};

/// Checks every invariant that must hold between user actions.
pub fn check_page<T: SettingsTransport + 'static>(page: &TestPage<T>) -> Result<(), String> {
    check_save_implies_cancel(page)?;
    check_stable_evaluation(page)?;
    check_idle(page)
}

/// Save is never enabled without Cancel.
pub fn check_save_implies_cancel<T: SettingsTransport + 'static>(
    page: &TestPage<T>,
) -> Result<(), String> {
    for section in page.sections() {
        let affordance = page.affordance(&section);
        if affordance.save_enabled && !affordance.cancel_enabled {
            return Err(format!("{section}: save enabled without cancel"));
        }
    }
    Ok(())
}

/// Re-evaluating without an intervening edit changes nothing.
pub fn check_stable_evaluation<T: SettingsTransport + 'static>(
    page: &TestPage<T>,
) -> Result<(), String> {
    let cached: Vec<_> = page
        .sections()
        .iter()
        .map(|section| page.engine.evaluation(section))
        .collect();
    let first = page.engine.evaluate_all();
    let second = page.engine.evaluate_all();

    if first != second {
        return Err("evaluate_all is not idempotent".into());
    }
    for (before, after) in cached.iter().zip(&first) {
        if before.as_ref() != Some(after) {
            return Err(format!("{}: cached evaluation was stale", after.section));
        }
    }
    Ok(())
}

/// No section is left pending once its action has returned.
pub fn check_idle<T: SettingsTransport + 'static>(page: &TestPage<T>) -> Result<(), String> {
    match page.sections().into_iter().find(|s| page.engine.is_pending(s)) {
        Some(section) => Err(format!("{section}: still pending")),
        None => Ok(()),
    }
}

/// Checks the state a section must be in right after a successful cancel or
/// save: widgets equal the baseline and both affordances are disabled.
pub fn check_settled<T: SettingsTransport + 'static>(
    page: &TestPage<T>,
    section: &str,
) -> Result<(), String> {
    let baseline = page
        .engine
        .baseline(section)
        .ok_or_else(|| format!("{section}: not registered"))?;
    if page.section_values(section) != baseline {
        return Err(format!("{section}: widgets differ from baseline"));
    }

    let affordance = page.affordance(section);
    let settled = Affordance {
        test_enabled: affordance.test_enabled,
        ..Affordance::default()
    };
    if affordance != settled {
        return Err(format!("{section}: affordances still enabled: {affordance:?}"));
    }
    Ok(())
}
