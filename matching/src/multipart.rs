//! Multipart body comparison.
//!
//! Parts are paired by the `name` of their `Content-Disposition` header, or
//! by position for unnamed parts. Part headers are compared like request
//! headers and reported at `$.<name>.<header>`. Part bodies are compared
//! with the body matcher for the part's content type, using the body rules
//! below `$.<name>` re-rooted at the part.

use crate::body::match_body_with_context;
use crate::context::MatchingContext;
use crate::headers::match_headers;
use crate::mismatch::Mismatch;
use pact_models::headers::{find_header, parse_header_value};
use pact_models::{ContentType, DocPath, Headers, MatchingRules, OptionalBody, detect_content_type};

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Name from the `Content-Disposition` header
    pub name: Option<String>,
    /// Part headers
    pub headers: Headers,
    /// Part content
    pub body: Vec<u8>,
}

impl Part {
    /// Content type of the part, sniffed when it has no `Content-Type` header.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        find_header(&self.headers, "content-type")
            .and_then(|(_, values)| values.first())
            .map_or_else(|| detect_content_type(&self.body), |value| ContentType::parse(value))
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|position| position + from)
}

fn strip_line_break_prefix(bytes: &[u8]) -> &[u8] {
    bytes
        .strip_prefix(b"\r\n")
        .or_else(|| bytes.strip_prefix(b"\n"))
        .unwrap_or(bytes)
}

fn strip_line_break_suffix(bytes: &[u8]) -> &[u8] {
    bytes
        .strip_suffix(b"\r\n")
        .or_else(|| bytes.strip_suffix(b"\n"))
        .unwrap_or(bytes)
}

fn disposition_name(headers: &Headers) -> Option<String> {
    let (_, values) = find_header(headers, "content-disposition")?;
    values.iter().flat_map(|value| value.split(';')).find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("name")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

fn parse_part(segment: &[u8]) -> Part {
    let segment = strip_line_break_suffix(strip_line_break_prefix(segment));
    let (header_block, body) = match find_bytes(segment, b"\r\n\r\n", 0) {
        Some(split) => (&segment[..split], &segment[split + 4..]),
        None => match find_bytes(segment, b"\n\n", 0) {
            Some(split) => (&segment[..split], &segment[split + 2..]),
            None => (&segment[..0], segment),
        },
    };

    let mut headers = Headers::new();
    for line in String::from_utf8_lossy(header_block).lines() {
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim().to_string();
            let values = parse_header_value(&name, value.trim());
            headers.entry(name).or_default().extend(values);
        }
    }
    Part {
        name: disposition_name(&headers),
        headers,
        body: body.to_vec(),
    }
}

/// Split a multipart body into its parts.
///
/// # Errors
///
/// Returns a description of the problem when the boundary never occurs.
pub fn parse_multipart(body: &[u8], boundary: &str) -> Result<Vec<Part>, String> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();
    let Some(mut start) = find_bytes(body, delimiter, 0) else {
        return Err(format!("boundary '{boundary}' not found in body"));
    };

    let mut parts = Vec::new();
    loop {
        let content_start = start + delimiter.len();
        if body[content_start..].starts_with(b"--") {
            break;
        }
        match find_bytes(body, delimiter, content_start) {
            Some(next) => {
                parts.push(parse_part(&body[content_start..next]));
                start = next;
            }
            None => {
                // unterminated final part
                parts.push(parse_part(&body[content_start..]));
                break;
            }
        }
    }
    Ok(parts)
}

fn prefix_path(mismatch: Mismatch, name: &str) -> Mismatch {
    match mismatch {
        Mismatch::BodyMismatch { path, expected, actual, mismatch } => Mismatch::BodyMismatch {
            path: format!("{}{}", DocPath::root().join(name), path.trim_start_matches('$')),
            expected,
            actual,
            mismatch,
        },
        other => other,
    }
}

/// Header differences of a part pair. A differing base content type is left
/// to the body comparison, which reports it as a type mismatch.
fn match_part_headers(expected: &Part, actual: &Part, name: &str, part_path: &DocPath) -> Vec<Mismatch> {
    let types_differ = expected.content_type().base_type() != actual.content_type().base_type();
    let expected_headers: Headers = expected
        .headers
        .iter()
        .filter(|(header, _)| !(types_differ && header.eq_ignore_ascii_case("content-type")))
        .map(|(header, values)| (header.clone(), values.clone()))
        .collect();

    match_headers(&expected_headers, &actual.headers, &MatchingRules::new())
        .into_iter()
        .map(|mismatch| match mismatch {
            Mismatch::HeaderMismatch { key, expected, actual, mismatch } => Mismatch::BodyMismatch {
                path: part_path.join(key).to_string(),
                expected: Some(expected),
                actual: Some(actual),
                mismatch: format!("Multipart part '{name}': {mismatch}"),
            },
            other => other,
        })
        .collect()
}

fn multipart_mismatch(path: String, mismatch: String) -> Mismatch {
    Mismatch::BodyMismatch {
        path,
        expected: None,
        actual: None,
        mismatch,
    }
}

/// Compare two multipart bodies.
#[must_use]
pub fn match_multipart(
    expected: &[u8],
    expected_content_type: &ContentType,
    actual: &[u8],
    actual_content_type: &ContentType,
    context: &MatchingContext,
) -> Vec<Mismatch> {
    let root = DocPath::root().to_string();
    let (Some(expected_boundary), Some(actual_boundary)) =
        (expected_content_type.boundary(), actual_content_type.boundary())
    else {
        return vec![multipart_mismatch(
            root,
            "Multipart content type has no boundary".to_string(),
        )];
    };

    let expected_parts = match parse_multipart(expected, expected_boundary) {
        Ok(parts) => parts,
        Err(err) => return vec![multipart_mismatch(root, format!("Failed to parse the expected body: {err}"))],
    };
    let actual_parts = match parse_multipart(actual, actual_boundary) {
        Ok(parts) => parts,
        Err(err) => return vec![multipart_mismatch(root, format!("Failed to parse the actual body: {err}"))],
    };

    let mut mismatches = Vec::new();
    for (index, expected_part) in expected_parts.iter().enumerate() {
        let name = expected_part.name.clone().unwrap_or_else(|| index.to_string());
        let part_path = DocPath::root().join(name.clone());
        let actual_part = match &expected_part.name {
            Some(part_name) => actual_parts
                .iter()
                .find(|part| part.name.as_deref() == Some(part_name.as_str())),
            None => actual_parts.get(index),
        };
        let Some(actual_part) = actual_part else {
            mismatches.push(multipart_mismatch(
                part_path.to_string(),
                format!("Expected a multipart part '{name}' but was missing"),
            ));
            continue;
        };

        mismatches.extend(match_part_headers(expected_part, actual_part, &name, &part_path));

        let expected_ct = expected_part.content_type();
        let actual_ct = actual_part.content_type();
        let part_context = context.rerooted(&part_path);
        let part_mismatches = match_body_with_context(
            &OptionalBody::present(expected_part.body.clone(), expected_ct.clone()),
            &expected_ct,
            &OptionalBody::present(actual_part.body.clone(), actual_ct.clone()),
            &actual_ct,
            &part_context,
        );
        mismatches.extend(part_mismatches.into_iter().map(|mismatch| prefix_path(mismatch, &name)));
    }
    mismatches
}
