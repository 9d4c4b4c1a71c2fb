//! Path expressions locating values inside structured bodies.
//!
//! Grammar: `$` is the root, `.name` an object field, `['name']` a field with
//! special characters, `[n]` an array index, `[*]` any index and `.*` any
//! field. The same type represents concrete locations, which never contain
//! wildcards.

use pact_common::PactError;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One segment of a path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathToken {
    /// `$`
    Root,
    /// `.name` or `['name']`
    Field(String),
    /// `[n]`
    Index(usize),
    /// `.*`
    Star,
    /// `[*]`
    StarIndex,
}

impl PathToken {
    /// Weight of this expression token against a concrete token; 0 when it
    /// does not match. Concrete segments weigh more than wildcards.
    #[must_use]
    pub fn match_weight(&self, concrete: &Self) -> usize {
        match (self, concrete) {
            (Self::Root, Self::Root) => 2,
            (Self::Field(a), Self::Field(b)) if a == b => 2,
            (Self::Index(a), Self::Index(b)) if a == b => 2,
            // indices of XML elements and form values are sometimes addressed by name
            (Self::Field(a), Self::Index(b)) if a.parse::<usize>().ok() == Some(*b) => 2,
            (Self::Star, Self::Field(_)) | (Self::StarIndex, Self::Index(_)) => 1,
            _ => 0,
        }
    }

    /// Whether this token is a wildcard.
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        matches!(self, Self::Star | Self::StarIndex)
    }
}

/// Errors raised while parsing a path expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathExpressionError {
    /// The expression was empty
    #[error("Path expression is empty")]
    Empty,

    /// The expression did not start with `$`
    #[error("Path expression '{0}' does not start with '$'")]
    MissingRoot(String),

    /// A bracket or quote was not closed
    #[error("Path expression '{expression}' has an unterminated segment at position {position}")]
    Unterminated {
        /// The expression being parsed
        expression: String,
        /// Character offset of the open segment
        position: usize,
    },

    /// A bracket held something other than an index, `*` or a quoted name
    #[error("Path expression '{expression}' has an invalid index '{index}'")]
    InvalidIndex {
        /// The expression being parsed
        expression: String,
        /// Contents of the bracket
        index: String,
    },

    /// A field segment had no name
    #[error("Path expression '{expression}' has an empty field name at position {position}")]
    EmptyField {
        /// The expression being parsed
        expression: String,
        /// Character offset of the empty field
        position: usize,
    },
}

impl From<PathExpressionError> for PactError {
    fn from(err: PathExpressionError) -> Self {
        Self::InvalidPact(err.to_string())
    }
}

/// A parsed path expression or concrete location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    tokens: Vec<PathToken>,
}

impl DocPath {
    /// The root path `$`.
    #[must_use]
    pub fn root() -> Self {
        Self {
            tokens: vec![PathToken::Root],
        }
    }

    /// Parse a path expression.
    ///
    /// # Errors
    ///
    /// Returns an error if the expression is malformed.
    pub fn parse(expression: &str) -> Result<Self, PathExpressionError> {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(PathExpressionError::Empty);
        }

        let chars: Vec<char> = expression.chars().collect();
        let mut tokens = vec![PathToken::Root];
        let mut pos = match chars[0] {
            '$' => 1,
            // relative expressions such as `.items[0]` are rooted implicitly
            '.' | '[' => 0,
            _ => return Err(PathExpressionError::MissingRoot(expression.to_string())),
        };

        while pos < chars.len() {
            match chars[pos] {
                '.' => {
                    let start = pos + 1;
                    let mut end = start;
                    while end < chars.len() && chars[end] != '.' && chars[end] != '[' {
                        end += 1;
                    }
                    let name: String = chars[start..end].iter().collect();
                    if name.is_empty() {
                        return Err(PathExpressionError::EmptyField {
                            expression: expression.to_string(),
                            position: pos,
                        });
                    }
                    tokens.push(if name == "*" {
                        PathToken::Star
                    } else {
                        PathToken::Field(name)
                    });
                    pos = end;
                }
                '[' => {
                    let (token, next) = parse_bracket(expression, &chars, pos)?;
                    tokens.push(token);
                    pos = next;
                }
                _ => {
                    return Err(PathExpressionError::MissingRoot(expression.to_string()));
                }
            }
        }

        Ok(Self { tokens })
    }

    /// The tokens of this path.
    #[must_use]
    pub fn tokens(&self) -> &[PathToken] {
        &self.tokens
    }

    /// Number of tokens, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the path has no tokens. Parsed paths always contain the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether this is the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.tokens == [PathToken::Root]
    }

    /// Append a field segment.
    #[must_use]
    pub fn join(&self, field: impl Into<String>) -> Self {
        let mut tokens = self.tokens.clone();
        let field = field.into();
        tokens.push(if field == "*" {
            PathToken::Star
        } else {
            PathToken::Field(field)
        });
        Self { tokens }
    }

    /// Append an index segment.
    #[must_use]
    pub fn join_index(&self, index: usize) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(PathToken::Index(index));
        Self { tokens }
    }

    /// The last segment as a field name or index string.
    #[must_use]
    pub fn last_field(&self) -> Option<String> {
        match self.tokens.last()? {
            PathToken::Field(name) => Some(name.clone()),
            PathToken::Index(i) => Some(i.to_string()),
            _ => None,
        }
    }

    /// Specificity weight of this expression against a concrete path.
    ///
    /// Returns 0 when the expression does not match. An expression matches a
    /// concrete path when every expression token matches the concrete token at
    /// the same position; shorter expressions match descendants too. The
    /// weight is the product of token weights, so every concrete segment
    /// doubles it and longer, more concrete expressions rank higher.
    #[must_use]
    pub fn match_weight(&self, path: &Self) -> usize {
        if self.tokens.len() > path.tokens.len() {
            return 0;
        }
        self.tokens
            .iter()
            .zip(path.tokens.iter())
            .try_fold(1usize, |weight, (exp, concrete)| match exp.match_weight(concrete) {
                0 => None,
                w => Some(weight.saturating_mul(w)),
            })
            .unwrap_or(0)
    }

    /// Whether this expression addresses exactly the concrete path, rather
    /// than one of its ancestors.
    #[must_use]
    pub fn matches_exactly(&self, path: &Self) -> bool {
        self.tokens.len() == path.tokens.len() && self.match_weight(path) > 0
    }

    /// Number of wildcard segments.
    #[must_use]
    pub fn wildcard_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.is_wildcard()).count()
    }

    /// Whether this expression starts with the given prefix expression.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.tokens.starts_with(&prefix.tokens)
    }

    /// Remove a prefix, keeping the root. Returns `None` if the prefix does not apply.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &Self) -> Option<Self> {
        if !self.starts_with(prefix) {
            return None;
        }
        let mut tokens = vec![PathToken::Root];
        tokens.extend(self.tokens[prefix.tokens.len()..].iter().cloned());
        Some(Self { tokens })
    }
}

fn parse_bracket(
    expression: &str,
    chars: &[char],
    open: usize,
) -> Result<(PathToken, usize), PathExpressionError> {
    let unterminated = || PathExpressionError::Unterminated {
        expression: expression.to_string(),
        position: open,
    };

    let start = open + 1;
    if start >= chars.len() {
        return Err(unterminated());
    }

    if chars[start] == '\'' || chars[start] == '"' {
        let quote = chars[start];
        let mut end = start + 1;
        while end < chars.len() && chars[end] != quote {
            end += 1;
        }
        if end + 1 >= chars.len() || chars[end + 1] != ']' {
            return Err(unterminated());
        }
        let name: String = chars[start + 1..end].iter().collect();
        return Ok((PathToken::Field(name), end + 2));
    }

    let mut end = start;
    while end < chars.len() && chars[end] != ']' {
        end += 1;
    }
    if end >= chars.len() {
        return Err(unterminated());
    }
    let content: String = chars[start..end].iter().collect();
    let token = if content == "*" {
        PathToken::StarIndex
    } else {
        content
            .trim()
            .parse::<usize>()
            .map(PathToken::Index)
            .map_err(|_| PathExpressionError::InvalidIndex {
                expression: expression.to_string(),
                index: content.clone(),
            })?
    };
    Ok((token, end + 1))
}

fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '@' | '#' | ':' | '$'))
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            match token {
                PathToken::Root => write!(f, "$")?,
                PathToken::Field(name) if is_plain_identifier(name) => write!(f, ".{name}")?,
                PathToken::Field(name) => write!(f, "['{name}']")?,
                PathToken::Index(i) => write!(f, "[{i}]")?,
                PathToken::Star => write!(f, ".*")?,
                PathToken::StarIndex => write!(f, "[*]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for DocPath {
    type Err = PathExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
