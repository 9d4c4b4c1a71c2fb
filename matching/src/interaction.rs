//! Whole-interaction comparison: requests, responses and messages.
//!
//! Every part is compared and all mismatches are reported; an empty list
//! means the actual interaction satisfies the expected one.

use crate::body::match_body;
use crate::headers::match_headers;
use crate::matchers::match_rules;
use crate::metadata::match_metadata;
use crate::mismatch::Mismatch;
use crate::query::match_query;
use crate::registry::MatchingConfig;
use pact_common::{PactError, PactResult};
use pact_models::matchingrules::{PATH, STATUS};
use pact_models::{HttpPart, Interaction, MatchingRules, Message, Request, Response};
use tracing::{debug, instrument};

fn match_method(expected: &str, actual: &str) -> Option<Mismatch> {
    (!expected.eq_ignore_ascii_case(actual)).then(|| Mismatch::MethodMismatch {
        expected: expected.to_uppercase(),
        actual: actual.to_uppercase(),
    })
}

fn match_path(expected: &str, actual: &str, rules: &MatchingRules) -> Vec<Mismatch> {
    let failures = match rules.rules_for(PATH, "") {
        Some(rules) => match_rules(expected, actual, rules),
        None if expected == actual => Vec::new(),
        None => vec![format!("Expected path '{expected}' but received '{actual}'")],
    };
    failures
        .into_iter()
        .map(|mismatch| Mismatch::PathMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
            mismatch,
        })
        .collect()
}

fn match_status(expected: u16, actual: u16, rules: &MatchingRules) -> Vec<Mismatch> {
    let failures = match rules.rules_for(STATUS, "") {
        Some(rules) => match_rules(expected.to_string().as_str(), actual.to_string().as_str(), rules),
        None if expected == actual => Vec::new(),
        None => vec![format!("Expected status code {expected} but received {actual}")],
    };
    failures
        .into_iter()
        .map(|mismatch| Mismatch::StatusMismatch {
            expected,
            actual,
            mismatch,
        })
        .collect()
}

/// Compare an actual request against the expected one.
#[must_use]
#[instrument(skip_all, fields(method = %expected.method, path = %expected.path))]
pub fn match_request(expected: &Request, actual: &Request, config: &MatchingConfig) -> Vec<Mismatch> {
    let rules = &expected.matching_rules;
    let mut mismatches: Vec<Mismatch> = match_method(&expected.method, &actual.method).into_iter().collect();
    mismatches.extend(match_path(&expected.path, &actual.path, rules));
    mismatches.extend(match_query(&expected.query, &actual.query, rules));
    mismatches.extend(match_headers(&expected.headers, &actual.headers, rules));
    mismatches.extend(match_body(
        &expected.body,
        &expected.determine_content_type(),
        &actual.body,
        &actual.determine_content_type(),
        rules,
        config,
    ));
    debug!(mismatches = mismatches.len(), "request compared");
    mismatches
}

/// Compare an actual response against the expected one.
#[must_use]
#[instrument(skip_all, fields(status = expected.status))]
pub fn match_response(expected: &Response, actual: &Response, config: &MatchingConfig) -> Vec<Mismatch> {
    let rules = &expected.matching_rules;
    let mut mismatches = match_status(expected.status, actual.status, rules);
    mismatches.extend(match_headers(&expected.headers, &actual.headers, rules));
    mismatches.extend(match_body(
        &expected.body,
        &expected.determine_content_type(),
        &actual.body,
        &actual.determine_content_type(),
        rules,
        config,
    ));
    debug!(mismatches = mismatches.len(), "response compared");
    mismatches
}

/// Compare an actual message against the expected one: metadata first, then
/// the contents.
#[must_use]
#[instrument(skip_all, fields(description = %expected.description))]
pub fn match_message(expected: &Message, actual: &Message, config: &MatchingConfig) -> Vec<Mismatch> {
    let rules = &expected.matching_rules;
    let mut mismatches = match_metadata(&expected.metadata, &actual.metadata, rules);
    mismatches.extend(match_body(
        &expected.contents,
        &expected.content_type(),
        &actual.contents,
        &actual.content_type(),
        rules,
        config,
    ));
    debug!(mismatches = mismatches.len(), "message compared");
    mismatches
}

/// Compare an actual interaction against the expected one.
///
/// # Errors
///
/// Returns [`PactError::InvalidPact`] when the interactions are of
/// different kinds.
pub fn match_interaction(
    expected: &Interaction,
    actual: &Interaction,
    config: &MatchingConfig,
) -> PactResult<Vec<Mismatch>> {
    match (expected, actual) {
        (Interaction::RequestResponse(expected), Interaction::RequestResponse(actual)) => {
            let mut mismatches = match_request(&expected.request, &actual.request, config);
            mismatches.extend(match_response(&expected.response, &actual.response, config));
            Ok(mismatches)
        }
        (Interaction::Message(expected), Interaction::Message(actual)) => {
            Ok(match_message(expected, actual, config))
        }
        _ => Err(PactError::invalid_pact(format!(
            "Cannot compare interaction '{}' with an interaction of a different kind",
            expected.description()
        ))),
    }
}
