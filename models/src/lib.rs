//! Pact document model.
//!
//! Consumers, providers, provider states, HTTP requests and responses,
//! messages, matching rules, path expressions and generators, with
//! serialization to and from version-tagged pact documents (V1 to V4).
//!
//! Parsing and serialization are pure transforms: no I/O, no shared state.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod body;
pub mod content_type;
pub mod date_format;
pub mod generators;
pub mod headers;
pub mod http_part;
pub mod interaction;
pub mod matchingrules;
pub mod message;
pub mod pact;
pub mod path_exp;
pub mod provider_state;
pub mod request;
pub mod response;
pub mod spec_version;

pub use body::OptionalBody;
pub use content_type::{ContentType, detect_content_type};
pub use generators::{
    DataType, Generator, GeneratorCategory, GeneratorContext, GeneratorTestMode, Generators,
};
pub use headers::{Headers, QueryParams};
pub use http_part::HttpPart;
pub use interaction::{Interaction, RequestResponseInteraction};
pub use matchingrules::{Category, MatchingRule, MatchingRuleDefinition, MatchingRules, RuleList, RuleLogic};
pub use message::Message;
pub use pact::{Consumer, MessagePact, Pact, PactSource, Participant, Provider, RequestResponsePact};
pub use path_exp::{DocPath, PathExpressionError, PathToken};
pub use provider_state::ProviderState;
pub use request::Request;
pub use response::Response;
pub use spec_version::PactSpecVersion;
