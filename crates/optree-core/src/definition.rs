//! Option definitions
//!
//! An [`OptionDefinition`] is the value one layer assigns to an option:
//! nothing at all, an evaluated value, or a verbatim Nix expression.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};

/// Module-system marker for expressions that cannot be evaluated to JSON
const LITERAL_EXPRESSION: &str = "literalExpression";

/// Shared undefined sentinel, for lookups that return a reference
pub static UNDEFINED: OptionDefinition = OptionDefinition::Undefined;

/// Value assigned to an option at one layer
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OptionDefinition {
    /// No value at this layer
    #[default]
    Undefined,

    /// Evaluated value
    Value(Value),

    /// Verbatim Nix expression text
    Expression(String),
}

impl OptionDefinition {
    /// The undefined sentinel
    #[inline]
    #[must_use]
    pub const fn undefined() -> Self {
        Self::Undefined
    }

    /// Definition holding an evaluated value
    #[inline]
    #[must_use]
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Definition holding expression text
    #[inline]
    #[must_use]
    pub fn expression(text: impl Into<String>) -> Self {
        Self::Expression(text.into())
    }

    /// Check for the undefined sentinel
    #[inline]
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Check for a concrete definition
    #[inline]
    #[must_use]
    pub fn is_defined(&self) -> bool {
        !self.is_undefined()
    }

    /// Render as Nix expression text; `None` when undefined
    #[must_use]
    pub fn to_expression(&self) -> Option<String> {
        match self {
            Self::Undefined => None,
            Self::Expression(text) => Some(text.clone()),
            Self::Value(value) => {
                let mut out = String::new();
                write_nix(&mut out, value);
                Some(out)
            }
        }
    }

    /// Wire form used by evaluator dumps; `None` when undefined
    ///
    /// Undefined has no wire form of its own: it is the absence of an entry.
    #[must_use]
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::Undefined => None,
            Self::Value(value) => Some(value.clone()),
            Self::Expression(text) => {
                let mut map = Map::new();
                map.insert("_type".into(), Value::String(LITERAL_EXPRESSION.into()));
                map.insert("text".into(), Value::String(text.clone()));
                Some(Value::Object(map))
            }
        }
    }

    /// Interpret the wire form used by evaluator dumps
    ///
    /// `{"_type": "literalExpression", "text": ..}` is an expression;
    /// everything else, `null` included, is an evaluated value.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map)
                if map.get("_type").and_then(Value::as_str) == Some(LITERAL_EXPRESSION) =>
            {
                let text = map.get("text").and_then(Value::as_str).map(str::to_string);
                match text {
                    Some(text) => Self::Expression(text),
                    None => Self::Value(Value::Object(map)),
                }
            }
            other => Self::Value(other),
        }
    }
}

fn write_nix_string(out: &mut String, s: &str) {
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_nix(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_nix_string(out, s),
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[ ]");
                return;
            }
            out.push('[');
            for item in items {
                out.push(' ');
                // negative numbers need parens inside lists
                let needs_parens = matches!(item, Value::Number(n) if n.as_f64().is_some_and(|f| f < 0.0));
                if needs_parens {
                    out.push('(');
                }
                write_nix(out, item);
                if needs_parens {
                    out.push(')');
                }
            }
            out.push_str(" ]");
        }
        Value::Object(map) => {
            if map.is_empty() {
                out.push_str("{ }");
                return;
            }
            out.push('{');
            for (key, item) in map {
                out.push(' ');
                let segment = crate::attribute::Segment::name(key.clone());
                out.push_str(&segment.to_string());
                out.push_str(" = ");
                write_nix(out, item);
                out.push(';');
            }
            out.push_str(" }");
        }
    }
}

impl Display for OptionDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.to_expression() {
            Some(text) => f.write_str(&text),
            None => f.write_str("<undefined>"),
        }
    }
}

impl From<Value> for OptionDefinition {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}

/// Undefined serializes as `null`; maps of definitions should skip it
impl Serialize for OptionDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OptionDefinition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_json)
    }
}
