//! Declarative response/DTO schemas
//!
//! A [`Schema`] is plain data: required and optional properties, types,
//! numeric minimums, string lengths and formats, enums, nullability.
//! [`Validator`] wraps one schema and answers both "is this valid?" and
//! "why not?" from the same walk, so the two can never disagree. Adding a
//! constraint means editing a schema in [`catalog`], not writing a check.

pub mod catalog;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{HarnessError, HarnessResult};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$")
        .unwrap_or_else(|_| unreachable!("email pattern is a valid regex"))
});

/// String formats understood by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// RFC 3339 timestamp
    DateTime,
    Email,
}

impl Format {
    fn name(&self) -> &'static str {
        match self {
            Format::DateTime => "date-time",
            Format::Email => "email",
        }
    }

    fn matches(&self, s: &str) -> bool {
        match self {
            Format::DateTime => chrono::DateTime::parse_from_rfc3339(s).is_ok(),
            Format::Email => EMAIL.is_match(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: &'static str,
    pub schema: Schema,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    String {
        min_length: Option<usize>,
        format: Option<Format>,
    },
    Number {
        minimum: Option<f64>,
    },
    Boolean,
    Enum(Vec<&'static str>),
    Array {
        items: Box<Schema>,
        min_items: Option<usize>,
    },
    Object {
        properties: Vec<Property>,
        additional_properties: bool,
    },
    Nullable(Box<Schema>),
}

impl Schema {
    pub fn string() -> Self {
        Schema::String {
            min_length: None,
            format: None,
        }
    }

    pub fn number() -> Self {
        Schema::Number { minimum: None }
    }

    pub fn boolean() -> Self {
        Schema::Boolean
    }

    pub fn one_of(values: &[&'static str]) -> Self {
        Schema::Enum(values.to_vec())
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array {
            items: Box::new(items),
            min_items: None,
        }
    }

    /// Closed object: unknown properties are violations unless
    /// [`Schema::allow_additional`] is applied.
    pub fn object() -> Self {
        Schema::Object {
            properties: Vec::new(),
            additional_properties: false,
        }
    }

    pub fn min_length(self, n: usize) -> Self {
        match self {
            Schema::String { format, .. } => Schema::String {
                min_length: Some(n),
                format,
            },
            other => other,
        }
    }

    pub fn format(self, format: Format) -> Self {
        match self {
            Schema::String { min_length, .. } => Schema::String {
                min_length,
                format: Some(format),
            },
            other => other,
        }
    }

    pub fn minimum(self, minimum: f64) -> Self {
        match self {
            Schema::Number { .. } => Schema::Number { minimum: Some(minimum) },
            other => other,
        }
    }

    pub fn min_items(self, n: usize) -> Self {
        match self {
            Schema::Array { items, .. } => Schema::Array {
                items,
                min_items: Some(n),
            },
            other => other,
        }
    }

    pub fn nullable(self) -> Self {
        match self {
            Schema::Nullable(_) => self,
            other => Schema::Nullable(Box::new(other)),
        }
    }

    pub fn required(self, name: &'static str, schema: Schema) -> Self {
        self.property(name, schema, true)
    }

    pub fn optional(self, name: &'static str, schema: Schema) -> Self {
        self.property(name, schema, false)
    }

    pub fn allow_additional(self) -> Self {
        match self {
            Schema::Object { properties, .. } => Schema::Object {
                properties,
                additional_properties: true,
            },
            other => other,
        }
    }

    fn property(self, name: &'static str, schema: Schema, required: bool) -> Self {
        match self {
            Schema::Object {
                mut properties,
                additional_properties,
            } => {
                properties.retain(|p| p.name != name);
                properties.push(Property { name, schema, required });
                Schema::Object {
                    properties,
                    additional_properties,
                }
            }
            other => other,
        }
    }

    /// Copy of an object schema with every property optional; the shape of
    /// a PATCH body.
    pub fn partial(&self) -> Self {
        match self {
            Schema::Object {
                properties,
                additional_properties,
            } => Schema::Object {
                properties: properties
                    .iter()
                    .map(|p| Property {
                        required: false,
                        ..p.clone()
                    })
                    .collect(),
                additional_properties: *additional_properties,
            },
            other => other.clone(),
        }
    }

    /// Copy of an object schema without the named properties.
    pub fn without(&self, names: &[&str]) -> Self {
        match self {
            Schema::Object {
                properties,
                additional_properties,
            } => Schema::Object {
                properties: properties.iter().filter(|p| !names.contains(&p.name)).cloned().collect(),
                additional_properties: *additional_properties,
            },
            other => other.clone(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Schema::String { .. } | Schema::Enum(_) => "string",
            Schema::Number { .. } => "number",
            Schema::Boolean => "boolean",
            Schema::Array { .. } => "array",
            Schema::Object { .. } => "object",
            Schema::Nullable(inner) => inner.type_name(),
        }
    }

    fn walk(&self, value: &Value, path: &mut Vec<String>, out: &mut Vec<Violation>) {
        match (self, value) {
            (Schema::Nullable(_), Value::Null) => {}
            (Schema::Nullable(inner), _) => inner.walk(value, path, out),

            (Schema::String { min_length, format }, Value::String(s)) => {
                if let Some(min) = min_length {
                    if s.chars().count() < *min {
                        out.push(Violation::at(path, format!("must NOT have fewer than {} characters", min)));
                    }
                }
                if let Some(format) = format {
                    if !format.matches(s) {
                        out.push(Violation::at(path, format!("must match format \"{}\"", format.name())));
                    }
                }
            }

            (Schema::Number { minimum }, Value::Number(n)) => {
                if let (Some(min), Some(v)) = (minimum, n.as_f64()) {
                    if v < *min {
                        out.push(Violation::at(path, format!("must be >= {}", min)));
                    }
                }
            }

            (Schema::Boolean, Value::Bool(_)) => {}

            (Schema::Enum(allowed), Value::String(s)) => {
                if !allowed.contains(&s.as_str()) {
                    out.push(Violation::at(
                        path,
                        format!("must be equal to one of the allowed values ({})", allowed.join(", ")),
                    ));
                }
            }

            (Schema::Array { items, min_items }, Value::Array(elements)) => {
                if let Some(min) = min_items {
                    if elements.len() < *min {
                        out.push(Violation::at(path, format!("must NOT have fewer than {} items", min)));
                    }
                }
                for (index, element) in elements.iter().enumerate() {
                    path.push(index.to_string());
                    items.walk(element, path, out);
                    path.pop();
                }
            }

            (
                Schema::Object {
                    properties,
                    additional_properties,
                },
                Value::Object(map),
            ) => walk_object(properties, *additional_properties, map, path, out),

            (schema, _) => out.push(Violation::at(path, format!("must be {}", schema.type_name()))),
        }
    }
}

fn walk_object(
    properties: &[Property],
    additional_properties: bool,
    map: &Map<String, Value>,
    path: &mut Vec<String>,
    out: &mut Vec<Violation>,
) {
    for property in properties {
        match map.get(property.name) {
            Some(value) => {
                path.push(property.name.to_string());
                property.schema.walk(value, path, out);
                path.pop();
            }
            None if property.required => {
                out.push(Violation::at(
                    path,
                    format!("must have required property '{}'", property.name),
                ));
            }
            None => {}
        }
    }

    if !additional_properties {
        for key in map.keys() {
            if !properties.iter().any(|p| p.name == key) {
                out.push(Violation::at(path, format!("must NOT have additional property '{}'", key)));
            }
        }
    }
}

/// One failed constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// JSON pointer to the offending value, `/` for the root
    pub path: String,
    pub message: String,
}

impl Violation {
    fn at(path: &[String], message: String) -> Self {
        Self {
            path: format!("/{}", path.join("/")),
            message,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.message)
    }
}

/// A named, compiled schema
#[derive(Debug, Clone, PartialEq)]
pub struct Validator {
    name: &'static str,
    schema: Schema,
}

impl Validator {
    pub fn new(name: &'static str, schema: Schema) -> Self {
        Self { name, schema }
    }

    /// Array of `element`, each item checked against the element schema
    pub fn list_of(name: &'static str, element: &Validator) -> Self {
        Self::new(name, Schema::array(element.schema.clone()))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn violations(&self, candidate: &Value) -> Vec<Violation> {
        let mut out = Vec::new();
        self.schema.walk(candidate, &mut Vec::new(), &mut out);
        out
    }

    pub fn is_valid(&self, candidate: &Value) -> bool {
        self.violations(candidate).is_empty()
    }

    /// `"<path> <message>"` per violation; empty when valid
    pub fn errors(&self, candidate: &Value) -> Vec<String> {
        self.violations(candidate).iter().map(ToString::to_string).collect()
    }

    pub fn check(&self, candidate: &Value) -> HarnessResult<()> {
        let violations = self.errors(candidate);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(HarnessError::SchemaViolation {
                schema: self.name.to_string(),
                violations,
            })
        }
    }

    /// Validate a typed value through its JSON encoding.
    pub fn check_serialized<T: Serialize + ?Sized>(&self, candidate: &T) -> HarnessResult<()> {
        self.check(&serde_json::to_value(candidate)?)
    }
}
