//! Test-runner hook for settings overrides
//!
//! A `TestSuite` is a named list of cases. Suite-level overrides wrap every
//! case whose name starts with `test`; case-level overrides wrap just that
//! case and are applied inside the suite-level ones. Every override is
//! entered right before the body and exited right after it, even when the
//! body panics.

use crate::contract::{SettingsApi, SettingsError};
use crate::domain::{OverrideGuard, OverrideSettings};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Prefix marking a case as a test method
pub const TEST_PREFIX: &str = "test";

pub type TestBody<'a> = Box<dyn Fn(&dyn SettingsApi) -> anyhow::Result<()> + 'a>;

struct TestCase<'a> {
    name: String,
    overrides: Option<OverrideSettings>,
    body: TestBody<'a>,
}

impl TestCase<'_> {
    fn is_test(&self) -> bool {
        self.name.starts_with(TEST_PREFIX)
    }
}

/// Outcome of a suite run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SuiteReport {
    pub passed: Vec<String>,
    /// (case name, failure message)
    pub failed: Vec<(String, String)>,
}

impl SuiteReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct TestSuite<'a> {
    name: String,
    overrides: Vec<OverrideSettings>,
    cases: Vec<TestCase<'a>>,
}

impl<'a> TestSuite<'a> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overrides: Vec::new(),
            cases: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a case
    pub fn case<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&dyn SettingsApi) -> anyhow::Result<()> + 'a,
    {
        self.push(name.into(), None, Box::new(body))
    }

    /// Add a case that runs with its own overrides
    pub fn case_with<F>(self, name: impl Into<String>, overrides: OverrideSettings, body: F) -> Self
    where
        F: Fn(&dyn SettingsApi) -> anyhow::Result<()> + 'a,
    {
        self.push(name.into(), Some(overrides), Box::new(body))
    }

    /// Wrap every test case of the suite in `overrides`
    ///
    /// Later calls nest inside earlier ones.
    pub fn with_overrides(mut self, overrides: OverrideSettings) -> Self {
        self.overrides.push(overrides);
        self
    }

    fn push(mut self, name: String, overrides: Option<OverrideSettings>, body: TestBody<'a>) -> Self {
        self.cases.push(TestCase {
            name,
            overrides,
            body,
        });
        self
    }

    /// Run every case in order
    pub fn run(&self, settings: &dyn SettingsApi) -> SuiteReport {
        let mut report = SuiteReport::default();
        for case in &self.cases {
            match self.run_case(case, settings) {
                Ok(()) => {
                    tracing::debug!(suite = %self.name, case = %case.name, "case passed");
                    report.passed.push(case.name.clone());
                }
                Err(message) => {
                    tracing::warn!(suite = %self.name, case = %case.name, %message, "case failed");
                    report.failed.push((case.name.clone(), message));
                }
            }
        }
        report
    }

    fn run_case(&self, case: &TestCase<'a>, settings: &dyn SettingsApi) -> Result<(), String> {
        let suite_overrides: &[OverrideSettings] = if case.is_test() {
            &self.overrides
        } else {
            &[]
        };

        let mut guards = Vec::new();
        let entered = enter_all(
            suite_overrides.iter().chain(case.overrides.as_ref()),
            settings,
            &mut guards,
        );

        let outcome = match entered {
            Ok(()) => match catch_unwind(AssertUnwindSafe(|| (case.body)(settings))) {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(format!("{:#}", e)),
                Err(panic) => Err(panic_message(panic.as_ref())),
            },
            Err(e) => Err(format!("failed to enter settings override: {}", e)),
        };

        // Innermost first
        let mut exit_error = None;
        while let Some(guard) = guards.pop() {
            if let Err(e) = guard.finish() {
                exit_error.get_or_insert(e);
            }
        }

        match (outcome, exit_error) {
            (Err(message), _) => Err(message),
            (Ok(()), Some(e)) => Err(format!("failed to exit settings override: {}", e)),
            (Ok(()), None) => Ok(()),
        }
    }
}

fn enter_all<'s, 'o>(
    overrides: impl Iterator<Item = &'o OverrideSettings>,
    settings: &'s dyn SettingsApi,
    guards: &mut Vec<OverrideGuard<'s, dyn SettingsApi + 's>>,
) -> Result<(), SettingsError> {
    for o in overrides {
        guards.push(o.apply(settings)?);
    }
    Ok(())
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "test panicked".to_string()
    }
}
