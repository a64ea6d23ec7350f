//! Step definitions, step results and scenarios

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ScenarioError;

/// Placeholder in a path template replaced by the configured host
pub const HOST_PLACEHOLDER: &str = "{host}";

/// HTTP methods a step can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        };
        f.write_str(name)
    }
}

/// A single named HTTP request within a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Label used when reporting
    pub name: String,
    #[serde(default)]
    pub method: HttpMethod,
    /// Either a full template containing `{host}` or a path joined to the host
    #[serde(rename = "path")]
    pub path_template: String,
    /// Request headers, sent in definition order
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

impl Step {
    pub fn new(
        name: impl Into<String>,
        method: HttpMethod,
        path_template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            method,
            path_template: path_template.into(),
            headers: IndexMap::new(),
        }
    }

    pub fn get(name: impl Into<String>, path_template: impl Into<String>) -> Self {
        Self::new(name, HttpMethod::Get, path_template)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Build the full request URL for `host`.
    ///
    /// `{host}` is substituted with the host minus any trailing slash. A
    /// template without the placeholder is joined to the host with exactly
    /// one `/`.
    pub fn resolve_url(&self, host: &str) -> String {
        let host = host.trim().trim_end_matches('/');
        if self.path_template.contains(HOST_PLACEHOLDER) {
            return self.path_template.replace(HOST_PLACEHOLDER, host);
        }

        let path = self.path_template.trim_start_matches('/');
        if path.is_empty() {
            host.to_string()
        } else {
            format!("{host}/{path}")
        }
    }
}

/// Pass/fail classification of an executed step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Success,
    Failure,
}

/// Outcome record produced once per executed step
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    /// Name of the step that produced this result
    pub step: String,
    /// Resolved request URL
    pub url: String,
    /// Status code, absent on transport errors
    pub status: Option<u16>,
    pub outcome: StepOutcome,
    /// Error or context message
    pub detail: String,
    /// Time from sending the request to classifying it
    pub elapsed: Duration,
}

impl StepResult {
    pub fn is_success(&self) -> bool {
        self.outcome == StepOutcome::Success
    }
}

/// Ordered list of steps executed once per runner invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// The product catalogue scenario: list every product, then fetch one by id
    pub fn products(product_id: u64) -> Self {
        Self::new(vec![
            Step::get("List all products", "{host}/products")
                .with_header("Accept", "application/json"),
            Step::get("Get product by ID", format!("{{host}}/products/{product_id}"))
                .with_header("Accept", "application/json"),
        ])
    }

    /// Parse a JSON scenario. Step names must be unique, since results are
    /// reported and tallied by name.
    pub fn from_json_str(source: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = serde_json::from_str(source)?;
        scenario.check_unique_names()?;
        Ok(scenario)
    }

    fn check_unique_names(&self) -> Result<(), ScenarioError> {
        let mut seen = HashSet::with_capacity(self.steps.len());
        for step in &self.steps {
            if !seen.insert(step.name.as_str()) {
                return Err(ScenarioError::DuplicateStep(step.name.clone()));
            }
        }
        Ok(())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }
}
