//! Verification results.
//!
//! A report lists every interaction of every pact in pact order, with the
//! full mismatch list for failures.

use chrono::{DateTime, Utc};
use pact_matching::Mismatch;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

/// The provider version that was verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderVersion {
    /// Application version
    pub version: String,
    /// Source branch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Version tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ProviderVersion {
    /// Create a version without branch or tags.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            branch: None,
            tags: Vec::new(),
        }
    }
}

/// How one interaction fared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// The provider satisfied the interaction
    Passed,
    /// The provider answered, but not as expected
    Failed(Vec<Mismatch>),
    /// The interaction could not be verified
    Error(String),
}

impl InteractionOutcome {
    /// Whether the interaction passed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Result of verifying one interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionResult {
    /// Interaction description
    pub description: String,
    /// Provider states, joined for display
    pub provider_state: String,
    /// Broker interaction identifier
    pub interaction_id: Option<String>,
    /// Outcome
    pub outcome: InteractionOutcome,
}

impl InteractionResult {
    fn to_json(&self) -> Value {
        let mut json = json!({
            "description": self.description,
            "providerState": self.provider_state,
            "success": self.outcome.is_success(),
        });
        if let Some(id) = &self.interaction_id {
            json["interactionId"] = json!(id);
        }
        match &self.outcome {
            InteractionOutcome::Passed => {}
            InteractionOutcome::Failed(mismatches) => {
                json["mismatches"] = Value::Array(mismatches.iter().map(Mismatch::to_json).collect());
            }
            InteractionOutcome::Error(message) => json["error"] = json!(message),
        }
        json
    }
}

/// Results for one pact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PactVerification {
    /// Consumer of the pact
    pub consumer: String,
    /// Where the pact came from
    pub source: String,
    /// Failures of pending pacts do not fail the run
    pub pending: bool,
    /// Broker notices
    pub notices: Vec<String>,
    /// Per-interaction results in pact order
    pub interactions: Vec<InteractionResult>,
}

impl PactVerification {
    /// Whether every interaction passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.interactions.iter().all(|result| result.outcome.is_success())
    }
}

/// Results of a verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    /// Provider name
    pub provider: String,
    /// Provider version, when known
    pub provider_version: Option<ProviderVersion>,
    /// Per-pact results
    pub pacts: Vec<PactVerification>,
    /// When the run finished
    pub verified_at: DateTime<Utc>,
}

impl VerificationReport {
    /// Create an empty report.
    #[must_use]
    pub fn new(provider: impl Into<String>, provider_version: Option<ProviderVersion>) -> Self {
        Self {
            provider: provider.into(),
            provider_version,
            pacts: Vec::new(),
            verified_at: Utc::now(),
        }
    }

    /// Whether the run succeeded. Failures in pending pacts are ignored.
    #[must_use]
    pub fn success(&self) -> bool {
        self.pacts.iter().filter(|pact| !pact.pending).all(PactVerification::all_passed)
    }

    /// Check if deployment should be allowed.
    #[must_use]
    pub fn can_deploy(&self) -> bool {
        self.success()
    }

    /// Number of verified interactions.
    #[must_use]
    pub fn interaction_count(&self) -> usize {
        self.pacts.iter().map(|pact| pact.interactions.len()).sum()
    }

    /// Failed interactions with their pact, in report order.
    pub fn failures(&self) -> impl Iterator<Item = (&PactVerification, &InteractionResult)> {
        self.pacts.iter().flat_map(|pact| {
            pact.interactions
                .iter()
                .filter(|result| !result.outcome.is_success())
                .map(move |result| (pact, result))
        })
    }

    /// Render the report as JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "provider": self.provider,
            "providerVersion": self.provider_version,
            "success": self.success(),
            "verifiedAt": self.verified_at.to_rfc3339(),
            "pacts": self.pacts.iter().map(|pact| json!({
                "consumer": pact.consumer,
                "source": pact.source,
                "pending": pact.pending,
                "notices": pact.notices,
                "interactions": pact.interactions.iter().map(InteractionResult::to_json).collect::<Vec<_>>(),
            })).collect::<Vec<_>>(),
        })
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Verifying provider {}", self.provider)?;
        for pact in &self.pacts {
            let pending = if pact.pending { " [pending]" } else { "" };
            writeln!(f, "  Pact with {} from {}{pending}", pact.consumer, pact.source)?;
            for result in &pact.interactions {
                let status = match &result.outcome {
                    InteractionOutcome::Passed => "OK",
                    InteractionOutcome::Failed(_) => "FAILED",
                    InteractionOutcome::Error(_) => "ERROR",
                };
                writeln!(f, "    {} given {}: {status}", result.description, result.provider_state)?;
                match &result.outcome {
                    InteractionOutcome::Passed => {}
                    InteractionOutcome::Failed(mismatches) => {
                        for (index, mismatch) in mismatches.iter().enumerate() {
                            writeln!(f, "      {}) {mismatch}", index + 1)?;
                        }
                    }
                    InteractionOutcome::Error(message) => writeln!(f, "      {message}")?,
                }
            }
        }
        let failures = self.failures().count();
        write!(
            f,
            "{} interactions, {failures} failed{}",
            self.interaction_count(),
            if self.success() { "" } else { " - verification FAILED" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(description: &str, outcome: InteractionOutcome) -> InteractionResult {
        InteractionResult {
            description: description.to_string(),
            provider_state: "None".to_string(),
            interaction_id: None,
            outcome,
        }
    }

    fn pact(pending: bool, outcomes: Vec<InteractionOutcome>) -> PactVerification {
        PactVerification {
            consumer: "order-web".to_string(),
            source: "file pacts/order-web.json".to_string(),
            pending,
            notices: Vec::new(),
            interactions: outcomes
                .into_iter()
                .enumerate()
                .map(|(i, outcome)| result(&format!("interaction {i}"), outcome))
                .collect(),
        }
    }

    fn status_mismatch() -> Mismatch {
        Mismatch::StatusMismatch {
            expected: 200,
            actual: 500,
            mismatch: "Expected status code 200 but received 500".to_string(),
        }
    }

    #[test]
    fn test_successful_report() {
        let mut report = VerificationReport::new("order-service", Some(ProviderVersion::new("2.0.0")));
        report.pacts.push(pact(false, vec![InteractionOutcome::Passed, InteractionOutcome::Passed]));
        assert!(report.success());
        assert!(report.can_deploy());
        assert_eq!(report.interaction_count(), 2);
        assert_eq!(report.failures().count(), 0);
    }

    #[test]
    fn test_failures_fail_the_report() {
        let mut report = VerificationReport::new("order-service", None);
        report.pacts.push(pact(
            false,
            vec![InteractionOutcome::Passed, InteractionOutcome::Failed(vec![status_mismatch()])],
        ));
        assert!(!report.success());
        let failures: Vec<_> = report.failures().map(|(_, r)| r.description.clone()).collect();
        assert_eq!(failures, vec!["interaction 1"]);
        assert!(report.to_string().contains("1) StatusMismatch"));
    }

    #[test]
    fn test_pending_failures_do_not_fail_the_report() {
        let mut report = VerificationReport::new("order-service", None);
        report.pacts.push(pact(true, vec![InteractionOutcome::Error("boom".to_string())]));
        report.pacts.push(pact(false, vec![InteractionOutcome::Passed]));
        assert!(report.success());
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_json_rendering() {
        let mut report = VerificationReport::new("order-service", Some(ProviderVersion::new("2.0.0")));
        report.pacts.push(pact(false, vec![InteractionOutcome::Failed(vec![status_mismatch()])]));
        let json = report.to_json();
        assert_eq!(json["success"], json!(false));
        assert_eq!(json["providerVersion"]["version"], json!("2.0.0"));
        let interaction = &json["pacts"][0]["interactions"][0];
        assert_eq!(interaction["mismatches"][0]["type"], json!("StatusMismatch"));
    }
}
