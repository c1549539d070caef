//! The section synchronization engine.
//!
//! The engine owns every section's baseline, evaluates all sections whenever a
//! widget changes, and runs the save, cancel and test actions. Locks are
//! only held for short synchronous stretches; none is held across an
//! `.await`.

use crate::baseline::BaselineStore;
use crate::config::EngineConfig;
use crate::error::{Action, SettingsError, SettingsResult};
use crate::evaluator::{evaluate, Affordance, Evaluation};
use crate::notice::{Notice, NoticeBoard};
use crate::rules::FieldIssue;
use crate::section::{standard_sections, SectionDescriptor};
use crate::transport::SettingsTransport;
use crate::widget::{ChangeSource, WidgetHost};
use parking_lot::{Mutex, RwLock};
use settings_sync_protocol::{CommitRequest, CommitResponse, FieldMap, FieldValue};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// Result of a test action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestOutcome {
    /// The server exercised the configuration successfully.
    Passed,
    /// The test failed, with the error text when one was given.
    Failed(Option<String>),
}

impl TestOutcome {
    /// Returns true for a passed test.
    pub fn is_ok(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Passed => f.write_str("OK"),
            TestOutcome::Failed(None) => f.write_str("FAILED"),
            TestOutcome::Failed(Some(err)) => write!(f, "FAILED: {err}"),
        }
    }
}

/// Synchronizes settings sections with a remote store.
pub struct SettingsEngine<T: SettingsTransport> {
    config: EngineConfig,
    transport: T,
    sections: RwLock<Vec<Arc<SectionDescriptor>>>,
    baselines: BaselineStore,
    evaluations: RwLock<HashMap<String, Evaluation>>,
    pending: Mutex<HashSet<String>>,
    notices: NoticeBoard,
}

impl<T: SettingsTransport> SettingsEngine<T> {
    /// Creates an engine with no sections.
    pub fn new(config: EngineConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            sections: RwLock::new(Vec::new()),
            baselines: BaselineStore::new(),
            evaluations: RwLock::new(HashMap::new()),
            pending: Mutex::new(HashSet::new()),
            notices: NoticeBoard::new(),
        }
    }

    /// Configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Registers a section.
    ///
    /// The section's baseline is seeded from its current widgets, with
    /// transient fields blank, and the section is evaluated once.
    pub fn register(&self, section: SectionDescriptor) -> SettingsResult<()> {
        let section = Arc::new(section);
        {
            let mut sections = self.sections.write();
            if sections.iter().any(|s| s.id() == section.id()) {
                return Err(SettingsError::DuplicateSection(section.id().to_string()));
            }
            sections.push(Arc::clone(&section));
        }

        let baseline = section.gather().merged(&transient_blanks(&section));
        self.baselines.set(section.id(), baseline);
        debug!(section = %section.id(), endpoint = %section.endpoint(), "registered section");
        self.evaluate_section(&section);
        Ok(())
    }

    /// Registers every standard section whose widgets exist on `host`.
    ///
    /// Returns the number of sections registered.
    pub fn register_standard(&self, host: Arc<dyn WidgetHost>) -> SettingsResult<usize> {
        let sections = standard_sections(host);
        let count = sections.len();
        for section in sections {
            self.register(section)?;
        }
        Ok(count)
    }

    /// Registered section ids in registration order.
    pub fn section_ids(&self) -> Vec<String> {
        self.sections
            .read()
            .iter()
            .map(|s| s.id().to_string())
            .collect()
    }

    /// Fetches the setup document, pushes it into every section's widgets and
    /// reseeds every baseline from a fresh gather.
    pub async fn load(&self) -> SettingsResult<()> {
        let endpoint = self.config.setup_endpoint.as_str();
        let document = match self.transport.load(endpoint).await {
            Ok(document) => document,
            Err(err) => {
                warn!(endpoint = %endpoint, error = %err, "failed to load settings");
                return Err(err);
            }
        };

        for section in self.snapshot() {
            let blanks = transient_blanks(&section);
            section.set_all(&document.without(section.rules().transient_fields()));
            section.set_all(&blanks);
            self.baselines
                .set(section.id(), section.gather().merged(&blanks));
        }

        info!(endpoint = %endpoint, fields = document.len(), "loaded settings");
        self.evaluate_all();
        Ok(())
    }

    /// Re-evaluates every section in registration order.
    pub fn evaluate_all(&self) -> Vec<Evaluation> {
        self.snapshot()
            .iter()
            .map(|section| self.evaluate_section(section))
            .collect()
    }

    /// Cached affordances of a section.
    pub fn affordance(&self, section: &str) -> Option<Affordance> {
        self.evaluations.read().get(section).map(|e| e.affordance)
    }

    /// Cached evaluation of a section.
    pub fn evaluation(&self, section: &str) -> Option<Evaluation> {
        self.evaluations.read().get(section).cloned()
    }

    /// Field-level messages from the last evaluation.
    pub fn issues(&self, section: &str) -> Vec<FieldIssue> {
        self.evaluations
            .read()
            .get(section)
            .map(|e| e.issues.clone())
            .unwrap_or_default()
    }

    /// Returns true if the section's widgets differ from its baseline.
    pub fn is_dirty(&self, section: &str) -> SettingsResult<bool> {
        let section = self.section(section)?;
        let baseline = self.baselines.get(section.id()).unwrap_or_default();
        Ok(section
            .gather()
            .differs_from(&baseline, &section.rules().comparison()))
    }

    /// Last confirmed values of a section.
    pub fn baseline(&self, section: &str) -> Option<FieldMap> {
        self.baselines.get(section)
    }

    /// Last failure surfaced for a section.
    pub fn notice(&self, section: &str) -> Option<Notice> {
        self.notices.get(section)
    }

    /// Returns true while a save or test for the section is in flight.
    pub fn is_pending(&self, section: &str) -> bool {
        self.pending.lock().contains(section)
    }

    /// Saves a section.
    ///
    /// On success the baseline becomes the submitted fields with transient
    /// fields blank, and the transient widgets are cleared. On failure the
    /// baseline is untouched and the error is recorded as the section's
    /// notice. Either way every section is re-evaluated.
    pub async fn save(&self, section: &str) -> SettingsResult<()> {
        let section = self.section(section)?;
        let guard = self.begin(&section, Action::Save)?;
        let id = section.id();

        let submitted = section.gather();
        let request = CommitRequest::save(submitted.without(section.rules().withheld_fields()));
        info!(section = %id, endpoint = %section.endpoint(), "saving section");

        let result = self
            .transport
            .request(section.endpoint(), &request)
            .await
            .and_then(into_result);

        match &result {
            Ok(()) => {
                let blanks = transient_blanks(&section);
                self.baselines.set(id, submitted.merged(&blanks));
                section.set_all(&blanks);
                self.notices.clear(id);
                info!(section = %id, "section saved");
            }
            Err(err) => {
                warn!(section = %id, error = %err, "save failed");
                self.notices.record(id, Action::Save, err);
            }
        }

        drop(guard);
        result
    }

    /// Restores a section's widgets from its baseline.
    pub fn cancel(&self, section: &str) -> SettingsResult<()> {
        let section = self.section(section)?;
        let id = section.id();
        if self.is_pending(id) {
            return Err(SettingsError::CommitInFlight(id.to_string()));
        }
        if !self.affordance(id).is_some_and(|a| a.cancel_enabled) {
            return Err(SettingsError::NotEligible {
                section: id.to_string(),
                action: Action::Cancel,
            });
        }

        let baseline = self.baselines.get(id).unwrap_or_default();
        section.set_all(&baseline);
        info!(section = %id, "section reverted");
        self.evaluate_all();
        Ok(())
    }

    /// Runs a section's test action against its committed configuration.
    ///
    /// Transport and server failures are reported in the outcome; only usage
    /// errors are returned as `Err`.
    pub async fn test(&self, section: &str) -> SettingsResult<TestOutcome> {
        let section = self.section(section)?;
        let guard = self.begin(&section, Action::Test)?;
        let id = section.id();

        let fields = section.gather().merged(&section.gather_test_fields());
        info!(section = %id, endpoint = %section.endpoint(), "testing section");

        let outcome = match self
            .transport
            .request(section.endpoint(), &CommitRequest::test(fields))
            .await
        {
            Ok(response) if response.is_ok() => TestOutcome::Passed,
            Ok(response) => TestOutcome::Failed(response.error),
            Err(err) => {
                warn!(section = %id, error = %err, "test request failed");
                TestOutcome::Failed(Some(Notice::from_error(Action::Test, &err).message))
            }
        };

        info!(section = %id, outcome = %outcome, "test finished");
        drop(guard);
        Ok(outcome)
    }

    fn section(&self, id: &str) -> SettingsResult<Arc<SectionDescriptor>> {
        self.sections
            .read()
            .iter()
            .find(|s| s.id() == id)
            .cloned()
            .ok_or_else(|| SettingsError::UnknownSection(id.to_string()))
    }

    fn snapshot(&self) -> Vec<Arc<SectionDescriptor>> {
        self.sections.read().clone()
    }

    /// Evaluates a section and caches the result.
    ///
    /// Baseline and pending state are read while the cache is write-locked, so
    /// a concurrent evaluation can never store a result older than the one
    /// stored by `begin`.
    fn evaluate_section(&self, section: &SectionDescriptor) -> Evaluation {
        let mut evaluations = self.evaluations.write();
        let baseline = self.baselines.get(section.id()).unwrap_or_default();
        let pending = self.is_pending(section.id());
        let evaluation = evaluate(section, &baseline, pending);

        debug!(
            section = %evaluation.section,
            save = evaluation.affordance.save_enabled,
            cancel = evaluation.affordance.cancel_enabled,
            test = ?evaluation.affordance.test_enabled,
            dirty = evaluation.dirty,
            pending,
            "evaluated section"
        );
        evaluations.insert(evaluation.section.clone(), evaluation.clone());
        evaluation
    }

    /// Marks a section pending after checking the action is allowed.
    fn begin<'a>(
        &'a self,
        section: &'a Arc<SectionDescriptor>,
        action: Action,
    ) -> SettingsResult<PendingGuard<'a, T>> {
        let id = section.id();
        let allowed = self.affordance(id).is_some_and(|a| match action {
            Action::Save => a.save_enabled,
            Action::Cancel => a.cancel_enabled,
            Action::Test => a.can_test(),
        });

        {
            let mut pending = self.pending.lock();
            if pending.contains(id) {
                return Err(SettingsError::CommitInFlight(id.to_string()));
            }
            if !allowed {
                return Err(SettingsError::NotEligible {
                    section: id.to_string(),
                    action,
                });
            }
            pending.insert(id.to_string());
        }

        self.evaluate_section(section);
        Ok(PendingGuard {
            engine: self,
            section: id,
        })
    }
}

impl<T: SettingsTransport + 'static> SettingsEngine<T> {
    /// Re-evaluates every section whenever `source` reports a change.
    ///
    /// The handler holds a weak reference, so binding does not keep the
    /// engine alive.
    pub fn bind(self: &Arc<Self>, source: &dyn ChangeSource) {
        let engine: Weak<Self> = Arc::downgrade(self);
        source.on_change(Arc::new(move || {
            if let Some(engine) = engine.upgrade() {
                engine.evaluate_all();
            }
        }));
    }
}

/// Clears a section's pending flag on drop, then re-evaluates every section.
///
/// Dropping a commit future part-way still releases the section.
struct PendingGuard<'a, T: SettingsTransport> {
    engine: &'a SettingsEngine<T>,
    section: &'a str,
}

impl<T: SettingsTransport> Drop for PendingGuard<'_, T> {
    fn drop(&mut self) {
        self.engine.pending.lock().remove(self.section);
        self.engine.evaluate_all();
    }
}

fn into_result(response: CommitResponse) -> SettingsResult<()> {
    if response.is_ok() {
        Ok(())
    } else {
        Err(SettingsError::Server(
            response.error.unwrap_or_else(|| "ERROR".to_string()),
        ))
    }
}

fn transient_blanks(section: &SectionDescriptor) -> FieldMap {
    section
        .rules()
        .transient_fields()
        .iter()
        .map(|field| (*field, FieldValue::empty()))
        .collect()
}
