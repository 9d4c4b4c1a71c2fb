//! Body comparison dispatch.
//!
//! The expected content type selects the body matcher through the
//! [`MatchingConfig`]; content types without a matcher are compared byte for
//! byte.

use crate::context::MatchingContext;
use crate::form::match_form;
use crate::json::match_json;
use crate::matchers::match_content_type;
use crate::mismatch::Mismatch;
use crate::multipart::match_multipart;
use crate::registry::{BodyMatcherKind, MatchingConfig};
use crate::text::match_text;
use crate::xml::match_xml;
use pact_models::{ContentType, DocPath, MatchingRule, MatchingRules, OptionalBody};
use tracing::debug;

/// Length of the schema registry wire header preceding Kafka JSON payloads.
const KAFKA_SCHEMA_HEADER_LEN: usize = 5;

/// Compare an expected body against an actual one.
///
/// `expected_content_type` and `actual_content_type` are the content types
/// resolved for the owning parts, which may come from headers or metadata.
#[must_use]
pub fn match_body(
    expected: &OptionalBody,
    expected_content_type: &ContentType,
    actual: &OptionalBody,
    actual_content_type: &ContentType,
    rules: &MatchingRules,
    config: &MatchingConfig,
) -> Vec<Mismatch> {
    let context = MatchingContext::for_body(rules, config);
    match_body_with_context(expected, expected_content_type, actual, actual_content_type, &context)
}

fn body_mismatch(expected: Option<String>, actual: Option<String>, mismatch: String) -> Mismatch {
    Mismatch::BodyMismatch {
        path: DocPath::root().to_string(),
        expected,
        actual,
        mismatch,
    }
}

pub(crate) fn match_body_with_context(
    expected: &OptionalBody,
    expected_content_type: &ContentType,
    actual: &OptionalBody,
    actual_content_type: &ContentType,
    context: &MatchingContext,
) -> Vec<Mismatch> {
    let expected_bytes = match expected {
        OptionalBody::Missing => return Vec::new(),
        OptionalBody::Null => &[][..],
        OptionalBody::Present(bytes, _) => bytes.as_slice(),
    };

    if expected_bytes.is_empty() {
        return if actual.is_present() {
            vec![body_mismatch(
                None,
                Some(actual.value_as_string()),
                format!("Expected an empty body but received '{}'", actual.value_as_string()),
            )]
        } else {
            Vec::new()
        };
    }

    let Some(actual_bytes) = actual.value().filter(|bytes| !bytes.is_empty()) else {
        return vec![body_mismatch(
            Some(expected.value_as_string()),
            None,
            format!("Expected body '{}' but was missing", expected.value_as_string()),
        )];
    };

    if let Some(mismatches) = match_root_content_type(actual_bytes, context) {
        return mismatches;
    }

    if !expected_content_type.is_unknown()
        && !actual_content_type.is_unknown()
        && expected_content_type.base_type() != actual_content_type.base_type()
    {
        return vec![Mismatch::BodyTypeMismatch {
            expected: expected_content_type.base_type(),
            actual: actual_content_type.base_type(),
            mismatch: format!(
                "Expected a body of '{}' but the actual content type was '{}'",
                expected_content_type.base_type(),
                actual_content_type.base_type()
            ),
        }];
    }

    let kind = context.config.lookup_body_matcher(expected_content_type);
    debug!(content_type = %expected_content_type, matcher = ?kind, "comparing bodies");
    match kind {
        Some(BodyMatcherKind::Json) => match_json(expected_bytes, actual_bytes, context),
        Some(BodyMatcherKind::KafkaJsonSchema) => match_json(
            strip_schema_header(expected_bytes),
            strip_schema_header(actual_bytes),
            context,
        ),
        Some(BodyMatcherKind::Xml) => match_xml(expected_bytes, actual_bytes, context),
        Some(BodyMatcherKind::PlainText) => match_text(expected_bytes, actual_bytes, context),
        Some(BodyMatcherKind::FormUrlEncoded) => match_form(expected_bytes, actual_bytes, context),
        Some(BodyMatcherKind::Multipart) => match_multipart(
            expected_bytes,
            expected_content_type,
            actual_bytes,
            actual_content_type,
            context,
        ),
        None => match_bytes(expected_bytes, actual_bytes),
    }
}

/// A `contentType` rule at the root checks the detected type of the actual
/// body instead of its contents.
fn match_root_content_type(actual: &[u8], context: &MatchingContext) -> Option<Vec<Mismatch>> {
    let rules = context.rules.rules_at_exact_path(&DocPath::root())?;
    let content_types: Vec<&String> = rules
        .rules
        .iter()
        .filter_map(|rule| match rule {
            MatchingRule::ContentType(content_type) => Some(content_type),
            _ => None,
        })
        .collect();
    if content_types.is_empty() {
        return None;
    }
    Some(
        content_types
            .into_iter()
            .filter_map(|content_type| match_content_type(content_type, actual).err())
            .map(|failure| body_mismatch(None, None, failure))
            .collect(),
    )
}

/// Strip the magic byte and schema id written by schema registry serializers.
fn strip_schema_header(bytes: &[u8]) -> &[u8] {
    if bytes.len() > KAFKA_SCHEMA_HEADER_LEN && bytes.first() == Some(&0) {
        &bytes[KAFKA_SCHEMA_HEADER_LEN..]
    } else {
        bytes
    }
}

fn match_bytes(expected: &[u8], actual: &[u8]) -> Vec<Mismatch> {
    if expected == actual {
        Vec::new()
    } else {
        vec![body_mismatch(
            None,
            None,
            format!(
                "Actual body [{} bytes] is not equal to the expected body [{} bytes]",
                actual.len(),
                expected.len()
            ),
        )]
    }
}
