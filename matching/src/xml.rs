//! Structural comparison of XML documents.
//!
//! Locations follow the element names: `$.order.item[0]` is the first `item`
//! child of the root `order` element, `$.order.item[0].@id` one of its
//! attributes and `$.order.item[0].#text` its text content. Children are
//! grouped by name and compared in document order; a type rule on a group
//! lets its size vary, with every actual child compared against the first
//! expected one. Sibling order is significant across groups too, except for
//! groups whose size a type or each-value rule lets vary.

use crate::context::MatchingContext;
use crate::matchers::{match_cardinality, match_rules};
use crate::mismatch::Mismatch;
use indexmap::IndexMap;
use pact_models::{DocPath, MatchingRule};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{BTreeMap, HashSet};

/// A parsed element: name, attributes, text content and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Qualified element name
    pub name: String,
    /// Attributes, without namespace declarations
    pub attributes: BTreeMap<String, String>,
    /// Concatenated text and CDATA content, trimmed
    pub text: String,
    /// Child elements in document order
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, String> {
        let mut attributes = BTreeMap::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|err| err.to_string())?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            if key == "xmlns" || key.starts_with("xmlns:") {
                continue;
            }
            let value = attribute.unescape_value().map_err(|err| err.to_string())?;
            attributes.insert(key, value.into_owned());
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            ..Self::default()
        })
    }

    fn children_by_name(&self) -> IndexMap<&str, Vec<&Self>> {
        let mut groups: IndexMap<&str, Vec<&Self>> = IndexMap::new();
        for child in &self.children {
            groups.entry(child.name.as_str()).or_default().push(child);
        }
        groups
    }
}

/// Parse an XML document into its root element.
///
/// # Errors
///
/// Returns a description of the parse failure.
pub fn parse_xml(bytes: &[u8]) -> Result<XmlElement, String> {
    let text = std::str::from_utf8(bytes).map_err(|err| err.to_string())?;
    let mut reader = Reader::from_str(text.trim());
    reader.trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;
    loop {
        match reader.read_event().map_err(|err| err.to_string())? {
            Event::Start(start) => stack.push(XmlElement::from_start(&start)?),
            Event::Empty(start) => close_element(XmlElement::from_start(&start)?, &mut stack, &mut root),
            Event::End(_) => {
                if let Some(mut element) = stack.pop() {
                    element.text = element.text.trim().to_string();
                    close_element(element, &mut stack, &mut root);
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|err| err.to_string())?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    root.ok_or_else(|| "document has no root element".to_string())
}

fn close_element(element: XmlElement, stack: &mut [XmlElement], root: &mut Option<XmlElement>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Compare two XML bodies.
#[must_use]
pub fn match_xml(expected: &[u8], actual: &[u8], context: &MatchingContext) -> Vec<Mismatch> {
    let root = DocPath::root();
    let expected = match parse_xml(expected) {
        Ok(element) => element,
        Err(err) => {
            return vec![Mismatch::body(
                root.to_string(),
                None,
                None,
                format!("Failed to parse the expected body: {err}"),
            )];
        }
    };
    let actual = match parse_xml(actual) {
        Ok(element) => element,
        Err(err) => {
            return vec![Mismatch::body(
                root.to_string(),
                None,
                None,
                format!("Failed to parse the actual body: {err}"),
            )];
        }
    };

    let mut mismatches = Vec::new();
    compare_element(&root.join(expected.name.clone()), &expected, &actual, context, &mut mismatches);
    mismatches
}

fn text_mismatch(path: &DocPath, expected: Option<&str>, actual: Option<&str>, mismatch: String) -> Mismatch {
    Mismatch::BodyMismatch {
        path: path.to_string(),
        expected: expected.map(str::to_string),
        actual: actual.map(str::to_string),
        mismatch,
    }
}

fn compare_element(
    path: &DocPath,
    expected: &XmlElement,
    actual: &XmlElement,
    context: &MatchingContext,
    mismatches: &mut Vec<Mismatch>,
) {
    if expected.name != actual.name {
        mismatches.push(text_mismatch(
            path,
            Some(&expected.name),
            Some(&actual.name),
            format!("Expected element {} but received {}", expected.name, actual.name),
        ));
        return;
    }
    compare_attributes(path, expected, actual, context, mismatches);
    compare_text(path, expected, actual, context, mismatches);
    compare_children(path, expected, actual, context, mismatches);
}

fn compare_attributes(
    path: &DocPath,
    expected: &XmlElement,
    actual: &XmlElement,
    context: &MatchingContext,
    mismatches: &mut Vec<Mismatch>,
) {
    for (key, expected_value) in &expected.attributes {
        let attribute_path = path.join(format!("@{key}"));
        let Some(actual_value) = actual.attributes.get(key) else {
            mismatches.push(text_mismatch(
                &attribute_path,
                Some(expected_value),
                None,
                format!("Expected attribute '{key}' but was missing"),
            ));
            continue;
        };
        if let Some(rules) = context.select_best_matcher(&attribute_path) {
            for failure in match_rules(expected_value.as_str(), actual_value.as_str(), &rules) {
                mismatches.push(text_mismatch(&attribute_path, Some(expected_value), Some(actual_value), failure));
            }
        } else if expected_value != actual_value {
            mismatches.push(text_mismatch(
                &attribute_path,
                Some(expected_value),
                Some(actual_value),
                format!("Expected attribute '{key}' to have value '{expected_value}' but received '{actual_value}'"),
            ));
        }
    }

    if context.reject_unexpected_keys() {
        for (key, value) in actual.attributes.iter().filter(|(key, _)| !expected.attributes.contains_key(*key)) {
            mismatches.push(text_mismatch(
                &path.join(format!("@{key}")),
                None,
                Some(value),
                format!("Did not expect attribute '{key}'"),
            ));
        }
    }
}

fn compare_text(
    path: &DocPath,
    expected: &XmlElement,
    actual: &XmlElement,
    context: &MatchingContext,
    mismatches: &mut Vec<Mismatch>,
) {
    let text_path = path.join("#text");
    if let Some(rules) = context.select_best_matcher(&text_path) {
        for failure in match_rules(expected.text.as_str(), actual.text.as_str(), &rules) {
            mismatches.push(text_mismatch(&text_path, Some(&expected.text), Some(&actual.text), failure));
        }
    } else if expected.text != actual.text {
        mismatches.push(text_mismatch(
            &text_path,
            Some(&expected.text),
            Some(&actual.text),
            format!(
                "Expected value '{}' but received '{}'",
                expected.text, actual.text
            ),
        ));
    }
}

fn compare_children(
    path: &DocPath,
    expected: &XmlElement,
    actual: &XmlElement,
    context: &MatchingContext,
    mismatches: &mut Vec<Mismatch>,
) {
    let expected_groups = expected.children_by_name();
    let actual_groups = actual.children_by_name();
    let mut variable_groups = HashSet::new();

    for (name, expected_children) in &expected_groups {
        let group_path = path.join(*name);
        let actual_children = actual_groups.get(name).map(Vec::as_slice).unwrap_or_default();
        let Some(first) = expected_children.first() else {
            continue;
        };

        if context
            .select_best_matcher(&group_path)
            .is_some_and(|rules| rules.rules.iter().any(|rule| matches!(rule, MatchingRule::EachValue(_))))
        {
            variable_groups.insert(*name);
        }
        match context.select_best_matcher(&group_path).filter(|rules| rules.type_matcher_defined()) {
            Some(rules) => {
                variable_groups.insert(*name);
                if !rules.cascaded {
                    for failure in match_cardinality(name, actual_children.len(), &rules) {
                        mismatches.push(text_mismatch(&group_path, None, None, failure));
                    }
                }
                for (index, child) in actual_children.iter().enumerate() {
                    let template = expected_children.get(index).unwrap_or(first);
                    compare_element(&group_path.join_index(index), template, child, context, mismatches);
                }
            }
            None => {
                if actual_children.is_empty() {
                    mismatches.push(text_mismatch(
                        &group_path,
                        Some(*name),
                        None,
                        format!("Expected child <{name}/> but was missing"),
                    ));
                    continue;
                }
                if expected_children.len() != actual_children.len() {
                    mismatches.push(text_mismatch(
                        &group_path,
                        None,
                        None,
                        format!(
                            "Expected {} <{name}/> child element(s) but received {}",
                            expected_children.len(),
                            actual_children.len()
                        ),
                    ));
                }
                for (index, (e, a)) in expected_children.iter().zip(actual_children).enumerate() {
                    compare_element(&group_path.join_index(index), e, a, context, mismatches);
                }
            }
        }
    }

    compare_child_order(path, expected, actual, &expected_groups, &variable_groups, mismatches);

    if context.reject_unexpected_keys() {
        for name in actual_groups.keys().filter(|name| !expected_groups.contains_key(*name)) {
            mismatches.push(text_mismatch(
                &path.join(*name),
                None,
                Some(*name),
                format!("Did not expect child <{name}/>"),
            ));
        }
    }
}

/// Sibling order of the fixed-size groups. Only checked when the same
/// elements are present, otherwise the group comparison already reported
/// the difference.
fn compare_child_order(
    path: &DocPath,
    expected: &XmlElement,
    actual: &XmlElement,
    expected_groups: &IndexMap<&str, Vec<&XmlElement>>,
    variable_groups: &HashSet<&str>,
    mismatches: &mut Vec<Mismatch>,
) {
    let fixed = |name: &&str| expected_groups.contains_key(name) && !variable_groups.contains(name);
    let expected_order: Vec<&str> = expected.children.iter().map(|c| c.name.as_str()).filter(fixed).collect();
    let actual_order: Vec<&str> = actual.children.iter().map(|c| c.name.as_str()).filter(fixed).collect();
    if expected_order == actual_order {
        return;
    }

    let mut expected_sorted = expected_order.clone();
    let mut actual_sorted = actual_order.clone();
    expected_sorted.sort_unstable();
    actual_sorted.sort_unstable();
    if expected_sorted != actual_sorted {
        return;
    }

    let render = |names: &[&str]| names.iter().map(|name| format!("<{name}/>")).collect::<Vec<_>>().join(", ");
    let expected_rendered = render(expected_order.as_slice());
    let actual_rendered = render(actual_order.as_slice());
    mismatches.push(text_mismatch(
        path,
        Some(&expected_rendered),
        Some(&actual_rendered),
        format!("Expected child elements in the order {expected_rendered} but received {actual_rendered}"),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MatchingConfig;
    use pact_models::matchingrules::BODY;
    use pact_models::{MatchingRule, MatchingRules};

    fn context(rules: &[(&str, MatchingRule)]) -> MatchingContext {
        let mut matching_rules = MatchingRules::new();
        let body = matching_rules.add_category(BODY);
        for (path, rule) in rules {
            body.add_rule(*path, rule.clone());
        }
        MatchingContext::for_body(&matching_rules, &MatchingConfig::new())
    }

    const ORDER: &str = r#"<?xml version="1.0"?>
        <order id="10" xmlns="urn:orders">
            <item sku="A-1">2</item>
            <note><![CDATA[leave at door]]></note>
        </order>"#;

    #[test]
    fn test_parse() {
        let root = parse_xml(ORDER.as_bytes()).unwrap();
        assert_eq!(root.name, "order");
        assert_eq!(root.attributes.get("id").map(String::as_str), Some("10"));
        assert!(!root.attributes.contains_key("xmlns"));
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].text, "2");
        assert_eq!(root.children[1].text, "leave at door");
    }

    #[test]
    fn test_identical_documents_match() {
        assert!(match_xml(ORDER.as_bytes(), ORDER.as_bytes(), &context(&[])).is_empty());
    }

    #[test]
    fn test_attribute_and_text_mismatches() {
        let actual = ORDER.replace("sku=\"A-1\"", "sku=\"B-2\"").replace(">2<", ">3<");
        let mismatches = match_xml(ORDER.as_bytes(), actual.as_bytes(), &context(&[]));
        let locations: Vec<String> = mismatches.iter().map(Mismatch::location).collect();
        assert_eq!(locations, vec!["$.order.item[0].@sku", "$.order.item[0].#text"]);
    }

    #[test]
    fn test_rules_on_attributes_and_text() {
        let ctx = context(&[
            ("$.order.item[*].@sku", MatchingRule::Regex("[A-Z]-\\d".to_string())),
            ("$.order.item[*].#text", MatchingRule::Integer),
        ]);
        let actual = ORDER.replace("sku=\"A-1\"", "sku=\"B-2\"").replace(">2<", ">7<");
        assert!(match_xml(ORDER.as_bytes(), actual.as_bytes(), &ctx).is_empty());

        let actual = ORDER.replace(">2<", ">two<");
        assert_eq!(match_xml(ORDER.as_bytes(), actual.as_bytes(), &ctx).len(), 1);
    }

    #[test]
    fn test_type_rule_allows_repeated_children() {
        let ctx = context(&[("$.order.item", MatchingRule::MinType(1))]);
        let actual = ORDER.replace(
            "<item sku=\"A-1\">2</item>",
            "<item sku=\"X\">5</item><item sku=\"Y\">6</item>",
        );
        assert!(match_xml(ORDER.as_bytes(), actual.as_bytes(), &ctx).is_empty());

        let without_items = ORDER.replace("<item sku=\"A-1\">2</item>", "");
        let mismatches = match_xml(ORDER.as_bytes(), without_items.as_bytes(), &ctx);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].location(), "$.order.item");
    }

    #[test]
    fn test_missing_child_and_wrong_root() {
        let actual = ORDER.replace("<note><![CDATA[leave at door]]></note>", "");
        let mismatches = match_xml(ORDER.as_bytes(), actual.as_bytes(), &context(&[]));
        assert_eq!(mismatches.len(), 1);
        assert!(mismatches[0].description().contains("<note/> but was missing"));

        let mismatches = match_xml(b"<a/>", b"<b/>", &context(&[]));
        assert_eq!(mismatches.len(), 1);
    }

    #[test]
    fn test_sibling_order_is_significant() {
        let expected = b"<order><id>1</id><status>open</status></order>";
        let swapped = b"<order><status>open</status><id>1</id></order>";
        let mismatches = match_xml(expected, swapped, &context(&[]));
        assert_eq!(mismatches.len(), 1, "{mismatches:?}");
        assert_eq!(mismatches[0].location(), "$.order");
        assert!(mismatches[0].description().contains("<id/>, <status/>"));

        let extra = b"<order><id>1</id><status>open</status><note>x</note></order>";
        assert!(match_xml(expected, extra, &context(&[])).is_empty());
    }

    #[test]
    fn test_repeated_groups_may_interleave() {
        let ctx = context(&[("$.order.item", MatchingRule::Type)]);
        let expected = b"<order><id>1</id><item>a</item><status>open</status></order>";
        let actual = b"<order><item>b</item><id>1</id><item>c</item><status>open</status></order>";
        assert!(match_xml(expected, actual, &ctx).is_empty());

        let swapped = b"<order><status>open</status><item>b</item><id>1</id></order>";
        assert_eq!(match_xml(expected, swapped, &ctx).len(), 1);
    }

    #[test]
    fn test_invalid_document() {
        let mismatches = match_xml(b"<a/>", b"<a><b></a>", &context(&[]));
        assert_eq!(mismatches.len(), 1);
        assert!(mismatches[0].description().starts_with("Failed to parse the actual body"));
    }
}
