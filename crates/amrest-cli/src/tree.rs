//! Tree walking over `serde_json::Value`: key stripping, key ordering, and
//! dot-path selection.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;

/// Server-managed bookkeeping attributes removed from output by default.
pub(crate) const METADATA_ATTRIBUTES: [&str; 4] = [
    "createdBy",
    "creationDate",
    "lastModifiedBy",
    "lastModifiedDate",
];

/// Visit every object in the tree, parents before children.
pub(crate) fn for_each_object_mut<F>(value: &mut Value, visit: &mut F)
where
    F: FnMut(&mut Map<String, Value>),
{
    match value {
        Value::Object(map) => {
            visit(map);
            for child in map.values_mut() {
                for_each_object_mut(child, visit);
            }
        }
        Value::Array(items) => {
            for item in items {
                for_each_object_mut(item, visit);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
    }
}

/// Remove `keys` from every object in the tree.
pub(crate) fn strip_keys(value: &mut Value, keys: &[&str]) {
    for_each_object_mut(value, &mut |map: &mut Map<String, Value>| {
        for key in keys {
            map.remove(*key);
        }
    });
}

/// Reorder every object so that keys iterate in lexical order.
pub(crate) fn sort_keys(value: &mut Value) {
    for_each_object_mut(value, &mut |map: &mut Map<String, Value>| {
        let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
        entries.sort_by(|left, right| left.0.cmp(&right.0));
        map.extend(entries);
    });
}

/// One step of a filter path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathSegment {
    Field(String),
    Index(usize),
}

impl Display for PathSegment {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => formatter.write_str(name),
            Self::Index(index) => write!(formatter, "{index}"),
        }
    }
}

/// Dot-separated selection such as `.result.0.name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FilterPath {
    segments: Vec<PathSegment>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum FilterPathError {
    #[error("empty component in filter '{expression}'")]
    EmptySegment { expression: String },
    #[error("index '{segment}' in filter '{expression}' is too large")]
    InvalidIndex { expression: String, segment: String },
    #[error("no field '{field}' at '{at}'")]
    MissingField { at: String, field: String },
    #[error("index {index} out of range at '{at}' (length {len})")]
    IndexOutOfRange { at: String, index: usize, len: usize },
    #[error("cannot apply '{segment}' to {found} at '{at}'")]
    Mismatch {
        at: String,
        segment: String,
        found: &'static str,
    },
}

impl FromStr for FilterPath {
    type Err = FilterPathError;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        let trimmed = expression.strip_prefix('.').unwrap_or(expression);
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        let segments = trimmed
            .split('.')
            .map(|segment| {
                if segment.is_empty() {
                    Err(FilterPathError::EmptySegment {
                        expression: expression.to_string(),
                    })
                } else if segment.bytes().all(|byte| byte.is_ascii_digit()) {
                    segment
                        .parse()
                        .map(PathSegment::Index)
                        .map_err(|_| FilterPathError::InvalidIndex {
                            expression: expression.to_string(),
                            segment: segment.to_string(),
                        })
                } else {
                    Ok(PathSegment::Field(segment.to_string()))
                }
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { segments })
    }
}

impl FilterPath {
    pub(crate) fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Select the value the path points at.
    pub(crate) fn apply(&self, value: Value) -> Result<Value, FilterPathError> {
        let mut current = value;
        for (depth, segment) in self.segments.iter().enumerate() {
            let at = self.prefix(depth);
            current = match (segment, current) {
                (PathSegment::Field(field), Value::Object(mut map)) => {
                    map.remove(field).ok_or_else(|| FilterPathError::MissingField {
                        at,
                        field: field.clone(),
                    })?
                }
                (PathSegment::Index(index), Value::Array(mut items)) => {
                    let len = items.len();
                    if *index >= len {
                        return Err(FilterPathError::IndexOutOfRange {
                            at,
                            index: *index,
                            len,
                        });
                    }
                    items.swap_remove(*index)
                }
                (segment, other) => {
                    return Err(FilterPathError::Mismatch {
                        at,
                        segment: segment.to_string(),
                        found: kind_name(&other),
                    });
                }
            };
        }
        Ok(current)
    }

    fn prefix(&self, depth: usize) -> String {
        let joined = self.segments[..depth]
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".");
        format!(".{joined}")
    }
}

const fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(expression: &str) -> FilterPath {
        expression.parse().unwrap_or_default()
    }

    #[test]
    fn strip_removes_metadata_at_every_depth() {
        let mut value = json!({
            "name": "root",
            "creationDate": "2017-01-01",
            "children": [
                {"name": "a", "creationDate": "x", "createdBy": "amadmin"},
                {"nested": {"creationDate": "y", "keep": true}}
            ]
        });
        strip_keys(&mut value, &METADATA_ATTRIBUTES);
        assert_eq!(
            value,
            json!({
                "name": "root",
                "children": [
                    {"name": "a"},
                    {"nested": {"keep": true}}
                ]
            })
        );
    }

    #[test]
    fn strip_is_idempotent() {
        let mut value = json!([{"lastModifiedBy": "x", "id": 1}, 3, "creationDate", null]);
        strip_keys(&mut value, &METADATA_ATTRIBUTES);
        let once = value.clone();
        strip_keys(&mut value, &METADATA_ATTRIBUTES);
        assert_eq!(value, once);
        assert_eq!(value, json!([{"id": 1}, 3, "creationDate", null]));
    }

    #[test]
    fn sort_keys_orders_nested_objects() -> Result<(), serde_json::Error> {
        let mut value = json!({"b": 1, "a": {"z": 1, "m": [{"y": 0, "c": 0}]}});
        sort_keys(&mut value);
        assert_eq!(
            serde_json::to_string(&value)?,
            r#"{"a":{"m":[{"c":0,"y":0}],"z":1},"b":1}"#
        );
        Ok(())
    }

    #[test]
    fn filter_path_indexes_into_arrays() -> Result<(), FilterPathError> {
        let value = json!({"a": [{"b": 1}, {"b": 2}]});
        assert_eq!("a.1.b".parse::<FilterPath>()?.apply(value)?, json!(2));
        Ok(())
    }

    #[test]
    fn filter_path_strips_one_leading_dot() -> Result<(), FilterPathError> {
        let value = json!({"result": [{"name": "p1"}]});
        assert_eq!(
            ".result.0.name".parse::<FilterPath>()?.apply(value)?,
            json!("p1")
        );
        Ok(())
    }

    #[test]
    fn filter_path_out_of_range_fails() {
        let value = json!({"a": [{"b": 1}, {"b": 2}]});
        assert_eq!(
            path("a.5.b").apply(value),
            Err(FilterPathError::IndexOutOfRange {
                at: ".a".into(),
                index: 5,
                len: 2
            })
        );
    }

    #[test]
    fn filter_path_rejects_shape_mismatch() {
        let value = json!({"a": {"0": "zero"}, "s": "text"});
        assert!(matches!(
            path("a.0").apply(value.clone()),
            Err(FilterPathError::Mismatch { found: "an object", .. })
        ));
        assert!(matches!(
            path("s.len").apply(value.clone()),
            Err(FilterPathError::Mismatch { found: "a string", .. })
        ));
        assert!(matches!(
            path("missing").apply(value),
            Err(FilterPathError::MissingField { .. })
        ));
    }

    #[test]
    fn empty_filter_selects_whole_value() -> Result<(), FilterPathError> {
        for expression in ["", "."] {
            let filter: FilterPath = expression.parse()?;
            assert!(filter.is_empty());
            assert_eq!(filter.apply(json!({"a": 1}))?, json!({"a": 1}));
        }
        Ok(())
    }

    #[test]
    fn filter_parse_rejects_empty_components() {
        assert!(matches!(
            "a..b".parse::<FilterPath>(),
            Err(FilterPathError::EmptySegment { .. })
        ));
        assert!(matches!(
            "a.".parse::<FilterPath>(),
            Err(FilterPathError::EmptySegment { .. })
        ));
        assert!(matches!(
            "99999999999999999999999".parse::<FilterPath>(),
            Err(FilterPathError::InvalidIndex { .. })
        ));
    }

    #[test]
    fn mixed_components_parse_by_kind() -> Result<(), FilterPathError> {
        let filter: FilterPath = "users.10.a1".parse()?;
        assert_eq!(
            filter.segments,
            vec![
                PathSegment::Field("users".into()),
                PathSegment::Index(10),
                PathSegment::Field("a1".into()),
            ]
        );
        Ok(())
    }
}
