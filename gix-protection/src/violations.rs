//! The ordered, never short-circuiting collection of policy violations.

/// A single coded policy violation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Violation {
    /// Stable, machine-readable code, like `pullreq.approvals.require_minimum_count`.
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

/// All violations found by one evaluation, in the order they were found.
///
/// The bypass flags are never set by the verifier itself. Callers apply their own authorization
/// outcome with [`RuleViolations::with_bypass()`].
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RuleViolations {
    /// Whether the acting principal could bypass these violations.
    #[serde(default)]
    pub bypassable: bool,
    /// Whether the violations were bypassed.
    #[serde(default)]
    pub bypassed: bool,
    /// The violations, in evaluation order.
    #[serde(default)]
    pub violations: Vec<Violation>,
}

impl RuleViolations {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a violation.
    pub fn add(&mut self, code: &str, message: impl Into<String>) {
        self.violations.push(Violation {
            code: code.to_owned(),
            message: message.into(),
        });
    }

    /// Returns true if nothing was violated.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// The number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Iterate over violation codes in evaluation order.
    pub fn codes(&self) -> impl Iterator<Item = &str> + '_ {
        self.violations.iter().map(|v| v.code.as_str())
    }

    /// Returns true if a violation with `code` is present.
    pub fn contains(&self, code: &str) -> bool {
        self.codes().any(|c| c == code)
    }

    /// Record whether the caller decided that the acting principal may bypass, and does.
    pub fn with_bypass(mut self, bypass: bool) -> Self {
        self.bypassable = bypass;
        self.bypassed = bypass;
        self
    }

    /// Returns true if there are violations which were not bypassed, blocking the merge.
    pub fn is_critical(&self) -> bool {
        !self.violations.is_empty() && !self.bypassed
    }
}

impl<'a> IntoIterator for &'a RuleViolations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}
