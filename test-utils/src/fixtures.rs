//! Sample pact documents.
//!
//! One document per specification generation, all describing the same small
//! order service so tests can compare behaviour across versions.

use serde_json::{Value, json};

/// Consumer name used by the fixtures.
pub const CONSUMER: &str = "order-web";

/// Provider name used by the fixtures.
pub const PROVIDER: &str = "order-service";

/// A V2 document: singular provider state, query string, flattened rules.
#[must_use]
pub fn v2_pact() -> Value {
    json!({
        "consumer": {"name": CONSUMER},
        "provider": {"name": PROVIDER},
        "interactions": [
            {
                "description": "a request for an order",
                "providerState": "order 10 exists",
                "request": {
                    "method": "GET",
                    "path": "/orders/10",
                    "query": "expand=items&expand=customer",
                    "headers": {"Accept": "application/json"}
                },
                "response": {
                    "status": 200,
                    "headers": {"Content-Type": "application/json"},
                    "body": {"id": 10, "status": "open", "items": [{"sku": "A-1", "qty": 2}]},
                    "matchingRules": {
                        "$.body.id": {"match": "type"},
                        "$.body.status": {"match": "regex", "regex": "open|closed"},
                        "$.body.items": {"min": 1},
                        "$.body.items[*].qty": {"match": "type"}
                    }
                }
            }
        ],
        "metadata": {"pact-specification": {"version": "2.0.0"}}
    })
}

/// A V3 document: provider states with parameters, structured query,
/// category rules and generators.
#[must_use]
pub fn v3_pact() -> Value {
    json!({
        "consumer": {"name": CONSUMER},
        "provider": {"name": PROVIDER},
        "interactions": [
            {
                "description": "a request for an order",
                "providerStates": [{"name": "an order exists", "params": {"orderId": 10}}],
                "request": {
                    "method": "GET",
                    "path": "/orders/10",
                    "query": {"expand": ["items"]},
                    "headers": {"Accept": "application/json"},
                    "matchingRules": {
                        "path": {"matchers": [{"match": "regex", "regex": "/orders/\\d+"}], "combine": "AND"}
                    },
                    "generators": {
                        "path": {"type": "ProviderState", "expression": "/orders/${orderId}"}
                    }
                },
                "response": {
                    "status": 200,
                    "headers": {"Content-Type": "application/json"},
                    "body": {"id": 10, "status": "open", "created": "2024-01-31"},
                    "matchingRules": {
                        "body": {
                            "$.id": {"matchers": [{"match": "integer"}], "combine": "AND"},
                            "$.status": {"matchers": [{"match": "regex", "regex": "open|closed"}], "combine": "AND"},
                            "$.created": {"matchers": [{"match": "date", "format": "yyyy-MM-dd"}], "combine": "AND"}
                        }
                    },
                    "generators": {
                        "body": {"$.id": {"type": "ProviderState", "expression": "${orderId}", "dataType": "INTEGER"}}
                    }
                }
            },
            {
                "description": "a request to create an order",
                "request": {
                    "method": "POST",
                    "path": "/orders",
                    "headers": {"Content-Type": "application/json"},
                    "body": {"items": [{"sku": "A-1", "qty": 1}]}
                },
                "response": {"status": 201}
            }
        ],
        "metadata": {"pactSpecification": {"version": "3.0.0"}}
    })
}

/// A V3 message document.
#[must_use]
pub fn v3_message_pact() -> Value {
    json!({
        "consumer": {"name": "order-events-consumer"},
        "provider": {"name": PROVIDER},
        "messages": [
            {
                "description": "an order created event",
                "providerStates": [{"name": "an order is created"}],
                "contents": {"orderId": 10, "total": 12.5},
                "metaData": {"contentType": "application/json", "topic": "orders"},
                "matchingRules": {
                    "body": {
                        "$.orderId": {"matchers": [{"match": "integer"}], "combine": "AND"},
                        "$.total": {"matchers": [{"match": "decimal"}], "combine": "AND"}
                    }
                }
            }
        ],
        "metadata": {"pactSpecification": {"version": "3.0.0"}}
    })
}

/// A V4 document using V4-only rules.
#[must_use]
pub fn v4_pact() -> Value {
    json!({
        "consumer": {"name": CONSUMER},
        "provider": {"name": PROVIDER},
        "interactions": [
            {
                "type": "Synchronous/HTTP",
                "description": "a request for order tags",
                "request": {"method": "GET", "path": "/orders/10/tags"},
                "response": {
                    "status": 200,
                    "headers": {"Content-Type": ["application/json"]},
                    "body": {
                        "content": {"tags": {"priority": "high"}, "version": "1.2.0"},
                        "contentType": "application/json",
                        "encoded": false
                    },
                    "matchingRules": {
                        "body": {
                            "$.tags": {
                                "matchers": [{"match": "eachKey", "rules": [{"match": "regex", "regex": "[a-z]+"}]}],
                                "combine": "AND"
                            },
                            "$.version": {"matchers": [{"match": "semver"}], "combine": "AND"}
                        }
                    }
                }
            }
        ],
        "metadata": {"pactSpecification": {"version": "4.0"}}
    })
}

/// A document referencing a matcher that does not exist.
#[must_use]
pub fn unknown_matcher_pact() -> Value {
    json!({
        "consumer": {"name": CONSUMER},
        "provider": {"name": PROVIDER},
        "interactions": [
            {
                "description": "uses a custom matcher",
                "request": {"method": "GET", "path": "/"},
                "response": {
                    "status": 200,
                    "matchingRules": {"body": {"$.a": {"matchers": [{"match": "fuzzy"}]}}}
                }
            }
        ],
        "metadata": {"pactSpecification": {"version": "3.0.0"}}
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pact_models::{Pact, PactSpecVersion};

    #[test]
    fn test_fixtures_parse() {
        assert_eq!(Pact::from_json(&v2_pact()).unwrap().spec_version(), PactSpecVersion::V2);
        assert_eq!(Pact::from_json(&v3_pact()).unwrap().interaction_count(), 2);
        assert!(Pact::from_json(&v3_message_pact()).unwrap().is_message_pact());
        assert_eq!(Pact::from_json(&v4_pact()).unwrap().spec_version(), PactSpecVersion::V4);
        assert!(Pact::from_json(&unknown_matcher_pact()).is_err());
    }
}
