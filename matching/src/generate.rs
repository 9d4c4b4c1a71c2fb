//! Applying generators to requests, responses and messages.
//!
//! Generation never mutates its input: each function returns a copy with the
//! generated values in place. Body generators apply to JSON bodies; bodies of
//! other content types are returned unchanged.

use pact_common::{PactError, PactResult};
use pact_models::headers::{find_header, json_to_string};
use pact_models::{
    ContentType, GeneratorCategory, GeneratorContext, Generators, Headers, HttpPart, Message, OptionalBody,
    Request, Response,
};
use serde_json::Value;
use tracing::{debug, warn};

fn single_value(generators: &Generators, category: GeneratorCategory, context: &GeneratorContext) -> PactResult<Option<Value>> {
    Ok(generators.apply(category, context)?.into_values().next())
}

fn set_header(headers: &mut Headers, name: &str, value: String) {
    let key = find_header(headers, name).map_or_else(|| name.to_string(), |(key, _)| key.clone());
    headers.insert(key, vec![value]);
}

/// Apply body generators to a body of the given content type.
///
/// # Errors
///
/// Propagates generation errors.
pub fn generate_body(
    body: &OptionalBody,
    content_type: &ContentType,
    generators: &Generators,
    context: &GeneratorContext,
) -> PactResult<OptionalBody> {
    let has_body_generators = generators
        .category(GeneratorCategory::Body)
        .is_some_and(|body_generators| !body_generators.is_empty());
    let OptionalBody::Present(bytes, declared) = body else {
        return Ok(body.clone());
    };
    if !has_body_generators || bytes.is_empty() {
        return Ok(body.clone());
    }
    if !content_type.is_json() {
        debug!(%content_type, "body generators only apply to JSON bodies");
        return Ok(body.clone());
    }

    let mut document: Value = match serde_json::from_slice(bytes) {
        Ok(document) => document,
        Err(err) => {
            warn!(error = %err, "body is not valid JSON, skipping body generators");
            return Ok(body.clone());
        }
    };
    generators.apply_to_json(&mut document, context)?;
    Ok(OptionalBody::present(serde_json::to_vec(&document)?, declared.clone()))
}

/// Apply the generators of a request.
///
/// # Errors
///
/// Propagates generation errors; a provider state generator naming a missing
/// parameter fails with [`PactError::ProviderStateValueNotFound`].
pub fn generate_request(request: &Request, context: &GeneratorContext) -> PactResult<Request> {
    let generators = &request.generators;
    let mut generated = request.clone();

    if let Some(method) = single_value(generators, GeneratorCategory::Method, context)? {
        generated.method = json_to_string(&method).to_uppercase();
    }
    if let Some(path) = single_value(generators, GeneratorCategory::Path, context)? {
        generated.path = json_to_string(&path);
    }
    for (name, value) in generators.apply(GeneratorCategory::Header, context)? {
        set_header(&mut generated.headers, &name, json_to_string(&value));
    }
    for (name, value) in generators.apply(GeneratorCategory::Query, context)? {
        let values = match value {
            Value::Array(items) => items.iter().map(json_to_string).collect(),
            other => vec![json_to_string(&other)],
        };
        generated.query.insert(name, values);
    }
    generated.body = generate_body(&request.body, &request.determine_content_type(), generators, context)?;
    Ok(generated)
}

/// Apply the generators of a response.
///
/// # Errors
///
/// Propagates generation errors, and fails with [`PactError::Generator`]
/// when a generated status is not a valid status code.
pub fn generate_response(response: &Response, context: &GeneratorContext) -> PactResult<Response> {
    let generators = &response.generators;
    let mut generated = response.clone();

    if let Some(status) = single_value(generators, GeneratorCategory::Status, context)? {
        generated.status = status
            .as_u64()
            .or_else(|| status.as_str().and_then(|s| s.parse().ok()))
            .and_then(|code| u16::try_from(code).ok())
            .filter(|code| (100..=599).contains(code))
            .ok_or_else(|| PactError::generator(format!("Generated status {status} is not a valid status code")))?;
    }
    for (name, value) in generators.apply(GeneratorCategory::Header, context)? {
        set_header(&mut generated.headers, &name, json_to_string(&value));
    }
    generated.body = generate_body(&response.body, &response.determine_content_type(), generators, context)?;
    Ok(generated)
}

/// Apply the generators of a message to its contents and metadata.
///
/// # Errors
///
/// Propagates generation errors.
pub fn generate_message(message: &Message, context: &GeneratorContext) -> PactResult<Message> {
    let generators = &message.generators;
    let mut generated = message.clone();
    for (key, value) in generators.apply(GeneratorCategory::Metadata, context)? {
        generated.metadata.insert(key, value);
    }
    generated.contents = generate_body(&message.contents, &message.content_type(), generators, context)?;
    Ok(generated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pact_models::{DataType, Generator};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn provider_context() -> GeneratorContext {
        let mut params = BTreeMap::new();
        params.insert("orderId".to_string(), json!(42));
        GeneratorContext::provider(params).with_seed(7)
    }

    #[test]
    fn test_request_generators() {
        let mut generators = Generators::new();
        generators.add_generator(
            GeneratorCategory::Path,
            "",
            Generator::ProviderState("/orders/${orderId}".to_string(), None),
        );
        generators.add_generator(GeneratorCategory::Header, "x-request-id", Generator::Uuid);
        generators.add_generator(GeneratorCategory::Query, "page", Generator::RandomInt(1, 1));
        let request = Request::new("GET", "/orders/10")
            .with_header("X-Request-Id", "fixed")
            .with_generators(generators);

        let generated = generate_request(&request, &provider_context()).unwrap();
        assert_eq!(generated.path, "/orders/42");
        assert_eq!(generated.headers.len(), 1);
        assert_ne!(generated.headers["X-Request-Id"], vec!["fixed".to_string()]);
        assert_eq!(generated.query["page"], vec!["1".to_string()]);
        // the input is untouched
        assert_eq!(request.path, "/orders/10");
    }

    #[test]
    fn test_response_body_generators() {
        let mut generators = Generators::new();
        generators.add_generator(
            GeneratorCategory::Body,
            "$.id",
            Generator::ProviderState("${orderId}".to_string(), Some(DataType::Integer)),
        );
        generators.add_generator(GeneratorCategory::Status, "", Generator::RandomInt(201, 201));
        let response = Response::new(200)
            .with_header("Content-Type", "application/json")
            .with_body(OptionalBody::from_json(&json!({"id": 10, "status": "open"})))
            .with_generators(generators);

        let generated = generate_response(&response, &provider_context()).unwrap();
        assert_eq!(generated.status, 201);
        let body: Value = serde_json::from_slice(generated.body.value().unwrap()).unwrap();
        assert_eq!(body, json!({"id": 42, "status": "open"}));
    }

    #[test]
    fn test_missing_provider_state_value_is_an_error() {
        let mut generators = Generators::new();
        generators.add_generator(
            GeneratorCategory::Path,
            "",
            Generator::ProviderState("/orders/${missing}".to_string(), None),
        );
        let request = Request::new("GET", "/orders/10").with_generators(generators);
        let err = generate_request(&request, &provider_context()).unwrap_err();
        assert!(matches!(err, PactError::ProviderStateValueNotFound { key } if key == "missing"));
    }

    #[test]
    fn test_non_json_bodies_are_unchanged() {
        let mut generators = Generators::new();
        generators.add_generator(GeneratorCategory::Body, "$.id", Generator::RandomInt(1, 9));
        let body = OptionalBody::present("<id>1</id>", ContentType::xml());
        let generated = generate_body(&body, &ContentType::xml(), &generators, &GeneratorContext::consumer()).unwrap();
        assert_eq!(generated, body);
    }

    #[test]
    fn test_message_metadata_generators() {
        let mut generators = Generators::new();
        generators.add_generator(GeneratorCategory::Metadata, "partition", Generator::RandomInt(3, 3));
        let message = Message::new("event").with_generators(generators);
        let generated = generate_message(&message, &GeneratorContext::consumer()).unwrap();
        assert_eq!(generated.metadata["partition"], json!(3));
    }
}
