//! Field paths for addressing within records
//!
//! Provides [`FieldPath`] for dotted addressing of fields in a record's
//! serialized form. One segment may carry a value filter
//! (`members[value eq "u1"]`) selecting elements of a multi-valued field;
//! the segments after it address members of the selected elements.
//!
//! A leading schema URN (`urn:ietf:params:scim:schemas:core:2.0:Group:`)
//! is accepted and dropped.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Literal compared against an element attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl FilterValue {
    /// As JSON value
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
        }
    }

    fn from_literal(literal: &str) -> Result<Self, PathError> {
        let invalid = || PathError::InvalidFilter(literal.to_string());
        match serde_json::from_str::<Value>(literal).map_err(|_| invalid())? {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(b)),
            Value::Number(n) => Ok(Self::Number(n)),
            Value::String(s) => Ok(Self::String(s)),
            Value::Array(_) | Value::Object(_) => Err(invalid()),
        }
    }
}

impl Display for FilterValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

/// `attribute eq literal` selector over array elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueFilter {
    attribute: String,
    value: FilterValue,
}

impl ValueFilter {
    /// Create filter matching elements whose `attribute` equals `value`
    #[must_use]
    pub fn equals(attribute: impl Into<String>, value: FilterValue) -> Self {
        Self {
            attribute: attribute.into(),
            value,
        }
    }

    /// Compared attribute
    #[inline]
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Expected value
    #[inline]
    #[must_use]
    pub fn value(&self) -> &FilterValue {
        &self.value
    }

    /// Check an array element
    ///
    /// Attribute names match ignoring ASCII case. Elements that are not
    /// objects never match.
    #[must_use]
    pub fn matches(&self, element: &Value) -> bool {
        let Value::Object(object) = element else {
            return false;
        };
        let expected = self.value.to_value();
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(&self.attribute))
            .is_some_and(|(_, actual)| *actual == expected)
    }
}

impl Display for ValueFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} eq {}", self.attribute, self.value)
    }
}

impl FromStr for ValueFilter {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PathError::InvalidFilter(s.to_string());

        let (attribute, rest) = s.trim().split_once(char::is_whitespace).ok_or_else(invalid)?;
        let (operator, literal) = rest.trim_start().split_once(char::is_whitespace).ok_or_else(invalid)?;
        if !operator.eq_ignore_ascii_case("eq") {
            return Err(PathError::UnsupportedFilterOperator(operator.to_string()));
        }
        check_name(attribute)?;

        Ok(Self::equals(attribute, FilterValue::from_literal(literal.trim())?))
    }
}

/// One path segment: a field name, optionally filtering its elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    name: String,
    filter: Option<ValueFilter>,
}

impl Segment {
    /// Plain field segment
    #[inline]
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filter: None,
        }
    }

    /// Field segment selecting elements by `filter`
    #[inline]
    #[must_use]
    pub fn filtered(name: impl Into<String>, filter: ValueFilter) -> Self {
        Self {
            name: name.into(),
            filter: Some(filter),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn filter(&self) -> Option<&ValueFilter> {
        self.filter.as_ref()
    }
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.filter {
            Some(filter) => write!(f, "{}[{}]", self.name, filter),
            None => f.write_str(&self.name),
        }
    }
}

/// Path to a field within a record
///
/// # Examples
/// - `["displayName"]` → `displayName`
/// - `["name", "givenName"]` → `name.givenName`
/// - `members[value eq "u1"].display`
///
/// The empty path addresses the record itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    /// Create path from a single field segment
    #[inline]
    #[must_use]
    pub fn single(segment: impl Into<String>) -> Self {
        Self(vec![Segment::field(segment)])
    }

    /// Empty path (the record itself)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is the root
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Get first field name (if not root)
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(Segment::name)
    }

    /// Check if any segment filters elements
    #[inline]
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        self.0.iter().any(|s| s.filter.is_some())
    }

    /// Append a field segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        self.with_segment(Segment::field(segment))
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn with_segment(&self, segment: Segment) -> Self {
        let mut new = self.clone();
        new.0.push(segment);
        new
    }

    /// Check if the first segment equals `name`, ignoring ASCII case
    #[inline]
    #[must_use]
    pub fn starts_with_field(&self, name: &str) -> bool {
        self.first().is_some_and(|s| s.eq_ignore_ascii_case(name))
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = strip_schema(s.trim());
        if s.is_empty() {
            return Ok(Self::root());
        }

        let (head, filter, tail) = match s.split_once('[') {
            None => (s, None, None),
            Some((head, rest)) => {
                let (filter, after) = rest.split_once(']').ok_or(PathError::UnclosedFilter)?;
                let tail = match after {
                    "" => None,
                    more => Some(more.strip_prefix('.').ok_or_else(|| {
                        PathError::InvalidSegment(more.to_string())
                    })?),
                };
                (head, Some(filter.parse::<ValueFilter>()?), tail)
            }
        };

        let mut segments = dotted(head)?;
        if let Some(filter) = filter {
            let last = segments.last_mut().ok_or(PathError::EmptySegment)?;
            last.filter = Some(filter);
        }
        if let Some(tail) = tail {
            if tail.contains('[') {
                return Err(PathError::InvalidSegment(tail.to_string()));
            }
            segments.extend(dotted(tail)?);
        }

        Ok(Self(segments))
    }
}

/// Drop a leading `urn:...:` schema prefix
fn strip_schema(s: &str) -> &str {
    let is_urn = s.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("urn:"));
    if !is_urn {
        return s;
    }
    let head = s.split_once('[').map_or(s, |(head, _)| head);
    match head.rfind(':') {
        Some(idx) => &s[idx + 1..],
        None => s,
    }
}

fn dotted(s: &str) -> Result<Vec<Segment>, PathError> {
    s.split('.')
        .map(|seg| check_name(seg).map(|()| Segment::field(seg)))
        .collect()
}

fn check_name(seg: &str) -> Result<(), PathError> {
    if seg.is_empty() {
        Err(PathError::EmptySegment)
    } else if seg.contains(|c: char| !c.is_alphanumeric() && c != '_') {
        Err(PathError::InvalidSegment(seg.to_string()))
    } else {
        Ok(())
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

impl Default for FieldPath {
    fn default() -> Self {
        Self::root()
    }
}

/// Errors related to field paths
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Invalid segment characters
    #[error("invalid segment: {0} (must be alphanumeric or underscore)")]
    InvalidSegment(String),

    /// `[` without matching `]`
    #[error("unclosed value filter")]
    UnclosedFilter,

    /// Filter is not `attribute op literal`
    #[error("invalid value filter: {0}")]
    InvalidFilter(String),

    /// Filter operator other than `eq`
    #[error("unsupported filter operator: {0}")]
    UnsupportedFilterOperator(String),
}
