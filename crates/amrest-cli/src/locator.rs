//! Resource addressing: which collection, and which items within it.

use once_cell::sync::Lazy;
use regex::Regex;

// `<field> <operator> ...`; `pr` (present) takes no operand.
const FILTER_EXPRESSION_PATTERN: &str = r"^\s*\S+\s+(?:co|eq|ge|gt|le|lt|sw|pr)(?:\s|$)";

static FILTER_EXPRESSION: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(FILTER_EXPRESSION_PATTERN).ok());

/// How items of a collection are selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Identifier {
    /// Every item of the collection.
    ListAll,
    /// A single item by name or UUID.
    LiteralName(String),
    /// A server-side query filter, passed through verbatim.
    RawFilter(String),
}

impl Identifier {
    /// Classify the optional identifier given on the command line.
    pub(crate) fn classify(raw: Option<&str>) -> Self {
        match raw {
            None => Self::ListAll,
            Some(value) if is_filter_expression(value) => Self::RawFilter(value.to_string()),
            Some(value) => Self::LiteralName(value.to_string()),
        }
    }
}

fn is_filter_expression(value: &str) -> bool {
    FILTER_EXPRESSION
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(value))
}

/// Target collection plus item selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResourceLocator {
    pub(crate) section: String,
    pub(crate) identifier: Identifier,
}

impl ResourceLocator {
    pub(crate) fn new(section: impl Into<String>, identifier: Option<&str>) -> Self {
        Self {
            section: section.into(),
            identifier: Identifier::classify(identifier),
        }
    }

    pub(crate) fn named(section: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            identifier: Identifier::LiteralName(name.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_pattern_compiles() {
        assert!(FILTER_EXPRESSION.is_some());
    }

    #[test]
    fn absent_identifier_lists_everything() {
        assert_eq!(Identifier::classify(None), Identifier::ListAll);
    }

    #[test]
    fn operator_expressions_are_raw_filters() {
        for expression in [
            r#"name eq "agent1""#,
            r#"uid co "adm""#,
            "sn sw Smi",
            "age ge 21",
            "age gt 21",
            "age le 65",
            "age lt 65",
            "mail pr",
            r#"(name eq "a") or (name eq "b")"#,
        ] {
            assert_eq!(
                Identifier::classify(Some(expression)),
                Identifier::RawFilter(expression.to_string()),
                "{expression}"
            );
        }
    }

    #[test]
    fn everything_else_is_a_literal_name() {
        for name in [
            "employees",
            "3f2a9c1e-8b7d-4e5f-9a0b-1c2d3e4f5a6b",
            "my agent",
            "web eqx",
            "eq",
            "name equals x",
            "Sales Team Policy",
        ] {
            assert_eq!(
                Identifier::classify(Some(name)),
                Identifier::LiteralName(name.to_string()),
                "{name}"
            );
        }
    }

    #[test]
    fn locator_classifies_identifier() {
        let locator = ResourceLocator::new("users", Some("demo"));
        assert_eq!(locator.section, "users");
        assert_eq!(locator.identifier, Identifier::LiteralName("demo".into()));

        let named = ResourceLocator::named("policies", "uid pr");
        assert_eq!(named.identifier, Identifier::LiteralName("uid pr".into()));
    }
}
