//! Translation of a tool's declarative input schema into editable argument
//! descriptors, and the form control each descriptor is edited with.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Value, json};

use crate::shared::{error::ConsoleError, types::InputSchema};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    /// Declared type this client does not know; carried through untouched.
    Unknown(String),
}

impl ArgType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "string" => Self::String,
            "number" => Self::Number,
            "integer" | "int" => Self::Integer,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Unknown(raw) => raw,
        }
    }

    /// Value a field starts with when the schema declares no default.
    pub fn fallback_value(&self) -> Value {
        match self {
            Self::String => json!(""),
            Self::Number | Self::Integer => json!(0),
            Self::Boolean => json!(false),
            Self::Array => json!("[]"),
            Self::Object => json!("{}"),
            Self::Unknown(_) => Value::Null,
        }
    }

    /// Arrays and objects are edited as serialized JSON text.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Array | Self::Object)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub arg_type: ArgType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    pub required: bool,
    pub value: Value,
}

/// Produce one descriptor per schema property, in the schema's own order.
pub fn transform_schema(schema: &InputSchema) -> Vec<ArgDescriptor> {
    schema
        .properties
        .iter()
        .map(|(name, property)| {
            let arg_type = ArgType::parse(&property.kind);
            let value = match property.default.as_ref() {
                Some(default) if !default.is_null() => editable_default(&arg_type, default),
                _ => arg_type.fallback_value(),
            };
            ArgDescriptor {
                name: name.clone(),
                description: property.description.clone(),
                required: schema.required.iter().any(|req| req == name),
                enum_values: property.enum_values.clone(),
                arg_type,
                value,
            }
        })
        .collect()
}

fn editable_default(arg_type: &ArgType, default: &Value) -> Value {
    if arg_type.is_structured() && !default.is_string() {
        return Value::String(default.to_string());
    }
    default.clone()
}

impl ArgDescriptor {
    /// Whether this argument blocks a run: required and still an empty or
    /// whitespace-only string.
    pub fn is_missing(&self) -> bool {
        self.required
            && self
                .value
                .as_str()
                .map(|text| text.trim().is_empty())
                .unwrap_or(false)
    }

    pub fn options(&self) -> Option<&[Value]> {
        self.enum_values
            .as_deref()
            .filter(|options| !options.is_empty())
    }

    /// Convert user-typed text into the value representation this argument
    /// holds while being edited.
    pub fn parse_input(&self, raw: &str) -> Result<Value, ConsoleError> {
        if let Some(options) = self.options() {
            return options
                .iter()
                .find(|option| option_matches(option, raw))
                .cloned()
                .ok_or_else(|| {
                    let allowed: Vec<String> = options.iter().map(option_label).collect();
                    ConsoleError::invalid_argument(
                        &self.name,
                        format!("'{raw}' is not one of [{}]", allowed.join(", ")),
                    )
                });
        }
        match &self.arg_type {
            ArgType::String | ArgType::Array | ArgType::Object => {
                Ok(Value::String(raw.to_string()))
            }
            ArgType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| ConsoleError::invalid_argument(&self.name, "expected an integer")),
            ArgType::Number => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| ConsoleError::invalid_argument(&self.name, "expected a number")),
            ArgType::Boolean => match raw.trim() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(ConsoleError::invalid_argument(
                    &self.name,
                    "expected true or false",
                )),
            },
            ArgType::Unknown(_) => Ok(serde_json::from_str(raw)
                .unwrap_or_else(|_| Value::String(raw.to_string()))),
        }
    }

    /// Value sent to the backend: array and object text is parsed into
    /// structured JSON of the matching shape.
    pub fn submission_value(&self) -> Result<Value, ConsoleError> {
        if !self.arg_type.is_structured() {
            return Ok(self.value.clone());
        }
        let parsed = match &self.value {
            Value::String(text) => serde_json::from_str::<Value>(text).map_err(|err| {
                ConsoleError::invalid_argument(&self.name, format!("invalid JSON: {err}"))
            })?,
            other => other.clone(),
        };
        let shape_ok = match self.arg_type {
            ArgType::Array => parsed.is_array(),
            _ => parsed.is_object(),
        };
        if !shape_ok {
            return Err(ConsoleError::invalid_argument(
                &self.name,
                format!("expected a JSON {}", self.arg_type.as_str()),
            ));
        }
        Ok(parsed)
    }
}

/// Ordered argument map for a debug call. Null values, the fallback of
/// unknown types, are left out.
pub fn build_tool_args(args: &[ArgDescriptor]) -> Result<IndexMap<String, Value>, ConsoleError> {
    let mut tool_args = IndexMap::with_capacity(args.len());
    for arg in args {
        let value = arg.submission_value()?;
        if value.is_null() {
            continue;
        }
        tool_args.insert(arg.name.clone(), value);
    }
    Ok(tool_args)
}

fn option_matches(option: &Value, raw: &str) -> bool {
    match option {
        Value::String(text) => text == raw,
        other => other.to_string() == raw.trim(),
    }
}

pub fn option_label(option: &Value) -> String {
    match option {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Control used to edit an argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "control", rename_all = "snake_case")]
pub enum FormControl {
    Select { options: Vec<String> },
    TextArea,
    BooleanSelect,
    IntegerInput,
    NumberInput,
    JsonEditor,
}

impl FormControl {
    /// Enums take precedence over the declared type. Unknown types get no
    /// control.
    pub fn for_arg(arg: &ArgDescriptor) -> Option<Self> {
        if let Some(options) = arg.options() {
            return Some(Self::Select {
                options: options.iter().map(option_label).collect(),
            });
        }
        match arg.arg_type {
            ArgType::String => Some(Self::TextArea),
            ArgType::Boolean => Some(Self::BooleanSelect),
            ArgType::Integer => Some(Self::IntegerInput),
            ArgType::Number => Some(Self::NumberInput),
            ArgType::Array | ArgType::Object => Some(Self::JsonEditor),
            ArgType::Unknown(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Select { .. } => "select",
            Self::TextArea => "text",
            Self::BooleanSelect => "true/false",
            Self::IntegerInput => "integer",
            Self::NumberInput => "number",
            Self::JsonEditor => "json",
        }
    }
}
