//! Scripted backend for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use diagsmoke_registry::Sample;

use crate::backend::{AnalyzerBackend, AnalyzerConfig, InvocationError};
use crate::diagnostic::{ActualDiagnostic, Finding, Severity};

/// What the mock returns for a sample.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Findings returned as-is.
    Findings(Vec<Finding>),
    /// `(rule, line)` warnings placed in the sample's own source file.
    Rules(Vec<(String, u32)>),
    Fail(InvocationError),
}

/// Backend returning scripted responses keyed by sample id.
///
/// Samples without a script produce no findings. Every completed call is
/// recorded in completion order.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    responses: HashMap<String, MockResponse>,
    delays: HashMap<String, Duration>,
    completed: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, sample_id: &str, response: MockResponse) -> Self {
        self.responses.insert(sample_id.to_string(), response);
        self
    }

    pub fn with_findings(self, sample_id: &str, findings: Vec<Finding>) -> Self {
        self.with_response(sample_id, MockResponse::Findings(findings))
    }

    pub fn with_rules(self, sample_id: &str, rules: &[(&str, u32)]) -> Self {
        let rules = rules.iter().map(|(r, l)| (r.to_string(), *l)).collect();
        self.with_response(sample_id, MockResponse::Rules(rules))
    }

    pub fn with_failure(self, sample_id: &str, error: InvocationError) -> Self {
        self.with_response(sample_id, MockResponse::Fail(error))
    }

    pub fn with_delay(mut self, sample_id: &str, delay: Duration) -> Self {
        self.delays.insert(sample_id.to_string(), delay);
        self
    }

    /// Sample ids in the order their invocations finished.
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl AnalyzerBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn analyze(
        &self,
        sample: &Sample,
        _config: &AnalyzerConfig,
    ) -> Result<Vec<Finding>, InvocationError> {
        if let Some(delay) = self.delays.get(&sample.id) {
            tokio::time::sleep(*delay).await;
        }

        if let Ok(mut completed) = self.completed.lock() {
            completed.push(sample.id.clone());
        }

        match self.responses.get(&sample.id) {
            None => Ok(Vec::new()),
            Some(MockResponse::Findings(findings)) => Ok(findings.clone()),
            Some(MockResponse::Rules(rules)) => Ok(rules
                .iter()
                .map(|(rule, line)| {
                    Finding::Diagnostic(ActualDiagnostic {
                        rule: rule.clone(),
                        severity: Severity::Warning,
                        file: sample.source.clone(),
                        line: *line,
                        column: 1,
                        message: format!("mock {}", rule),
                    })
                })
                .collect()),
            Some(MockResponse::Fail(err)) => Err(err.clone()),
        }
    }
}
