//! Multi-valued header and query parameter maps.

use crate::spec_version::PactSpecVersion;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use url::form_urlencoded;

/// Insertion ordered, multi-valued header map.
pub type Headers = IndexMap<String, Vec<String>>;

/// Insertion ordered, multi-valued query parameter map.
pub type QueryParams = IndexMap<String, Vec<String>>;

/// Headers whose values may legitimately contain commas.
const SINGLE_VALUE_HEADERS: &[&str] = &[
    "date",
    "expires",
    "last-modified",
    "if-modified-since",
    "if-unmodified-since",
    "retry-after",
    "set-cookie",
    "www-authenticate",
];

/// Case-insensitive header lookup.
#[must_use]
pub fn find_header<'a>(headers: &'a Headers, name: &str) -> Option<(&'a String, &'a Vec<String>)> {
    headers.iter().find(|(key, _)| key.eq_ignore_ascii_case(name))
}

/// Split a raw header value into its comma separated parts.
#[must_use]
pub fn parse_header_value(name: &str, value: &str) -> Vec<String> {
    if SINGLE_VALUE_HEADERS.contains(&name.to_lowercase().as_str()) {
        vec![value.trim().to_string()]
    } else {
        value
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect()
    }
}

/// Parse the `headers` object of a pact document.
#[must_use]
pub fn headers_from_json(json: Option<&Value>) -> Headers {
    let Some(Value::Object(map)) = json else {
        return Headers::new();
    };
    map.iter()
        .map(|(name, value)| {
            let values = match value {
                Value::Array(items) => items.iter().map(json_to_string).collect(),
                Value::String(s) => parse_header_value(name, s),
                other => vec![json_to_string(other)],
            };
            (name.clone(), values)
        })
        .collect()
}

/// Render headers for a pact document. V4 keeps multiple values as arrays.
#[must_use]
pub fn headers_to_json(headers: &Headers, version: PactSpecVersion) -> Value {
    let map: Map<String, Value> = headers
        .iter()
        .map(|(name, values)| {
            let value = if version >= PactSpecVersion::V4 && values.len() > 1 {
                Value::Array(values.iter().cloned().map(Value::String).collect())
            } else {
                Value::String(values.join(", "))
            };
            (name.clone(), value)
        })
        .collect();
    Value::Object(map)
}

/// Parse a URL encoded query string such as `a=1&b=2&a=3`.
#[must_use]
pub fn parse_query_string(query: &str) -> QueryParams {
    let mut params = QueryParams::new();
    for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        params.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    params
}

/// Render query parameters as a URL encoded string.
#[must_use]
pub fn query_to_string(query: &QueryParams) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, values) in query {
        for value in values {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}

/// Parse the `query` field of a request, accepting both the V2 string form
/// and the V3 object form.
#[must_use]
pub fn query_from_json(json: Option<&Value>) -> QueryParams {
    match json {
        Some(Value::String(query)) => parse_query_string(query),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(key, value)| {
                let values = match value {
                    Value::Array(items) => items.iter().map(json_to_string).collect(),
                    other => vec![json_to_string(other)],
                };
                (key.clone(), values)
            })
            .collect(),
        _ => QueryParams::new(),
    }
}

/// Render query parameters for a pact document.
#[must_use]
pub fn query_to_json(query: &QueryParams, version: PactSpecVersion) -> Value {
    if version >= PactSpecVersion::V3 {
        Value::Object(
            query
                .iter()
                .map(|(key, values)| {
                    (
                        key.clone(),
                        Value::Array(values.iter().cloned().map(Value::String).collect()),
                    )
                })
                .collect(),
        )
    } else {
        Value::String(query_to_string(query))
    }
}

/// Render a JSON value as a plain string, without quotes for strings.
#[must_use]
pub fn json_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_header_is_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), vec!["application/json".to_string()]);
        let (key, values) = find_header(&headers, "content-type").unwrap();
        assert_eq!(key, "Content-Type");
        assert_eq!(values, &vec!["application/json".to_string()]);
        assert!(find_header(&headers, "accept").is_none());
    }

    #[test]
    fn test_header_values_split_on_commas() {
        let headers = headers_from_json(Some(&json!({
            "Accept": "application/json, text/plain",
            "Date": "Tue, 15 Nov 1994 08:12:31 GMT"
        })));
        assert_eq!(headers["Accept"], vec!["application/json", "text/plain"]);
        assert_eq!(headers["Date"], vec!["Tue, 15 Nov 1994 08:12:31 GMT"]);
    }

    #[test]
    fn test_headers_round_trip() {
        let json = json!({"Accept": "application/json, text/plain"});
        let headers = headers_from_json(Some(&json));
        assert_eq!(headers_to_json(&headers, PactSpecVersion::V3), json);
        assert_eq!(
            headers_to_json(&headers, PactSpecVersion::V4),
            json!({"Accept": ["application/json", "text/plain"]})
        );
    }

    #[test]
    fn test_query_string_forms() {
        let query = parse_query_string("a=1&b=x%20y&a=2");
        assert_eq!(query["a"], vec!["1", "2"]);
        assert_eq!(query["b"], vec!["x y"]);
        assert_eq!(query_to_string(&query), "a=1&a=2&b=x+y");
        assert_eq!(
            query_to_json(&query, PactSpecVersion::V3),
            json!({"a": ["1", "2"], "b": ["x y"]})
        );
        assert_eq!(query_from_json(Some(&json!({"a": ["1", "2"], "b": "x y"}))), query);
    }
}
