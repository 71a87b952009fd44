//! JSON mode support for structured output.
//!
//! Provides configuration for the `response_format` request parameter and
//! parsing of the model's reply back into validated JSON.

use crate::structured::error::{ValidationError, ValidationResult};
use crate::structured::validator::OutputValidator;
use crate::{Error, ErrorContext};
use once_cell::sync::Lazy;
use regex::Regex;

/// JSON mode options for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonMode {
    /// Standard JSON mode - guarantees valid JSON output
    Json,

    /// JSON with schema validation - requires strict schema compliance
    JsonSchema,

    /// Disabled - no JSON mode enforcement
    Off,
}

impl JsonMode {
    /// Get the string representation for API requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonMode::Json => "json_object",
            JsonMode::JsonSchema => "json_schema",
            JsonMode::Off => "",
        }
    }
}

impl std::fmt::Display for JsonMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JsonMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json_object" => Ok(JsonMode::Json),
            "json_schema" => Ok(JsonMode::JsonSchema),
            "off" | "" => Ok(JsonMode::Off),
            _ => Err(format!("Unknown JSON mode: {}", s)),
        }
    }
}

/// Configuration for JSON mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonModeConfig {
    pub mode: JsonMode,

    /// JSON schema (only used for JsonSchema mode)
    pub schema: Option<serde_json::Value>,

    /// Name for the schema (used in OpenAI format)
    pub schema_name: String,

    /// Whether to enforce strict schema compliance
    pub strict: bool,
}

impl JsonModeConfig {
    /// Create a config for simple JSON object mode.
    pub fn json_object() -> Self {
        Self {
            mode: JsonMode::Json,
            schema: None,
            schema_name: "response".to_string(),
            strict: true,
        }
    }

    /// Create a config from a JSON schema.
    ///
    /// ```
    /// use ai_enrich::structured::{JsonMode, JsonModeConfig};
    /// use serde_json::json;
    ///
    /// let schema = json!({
    ///     "type": "object",
    ///     "properties": {"message": {"type": "string"}},
    ///     "required": ["message"]
    /// });
    ///
    /// let config = JsonModeConfig::from_schema(schema, "SetupProbe", true);
    /// assert_eq!(config.mode, JsonMode::JsonSchema);
    /// ```
    pub fn from_schema(schema: serde_json::Value, name: impl Into<String>, strict: bool) -> Self {
        Self {
            mode: JsonMode::JsonSchema,
            schema: Some(schema),
            schema_name: name.into(),
            strict,
        }
    }

    /// Build the `response_format` value for the Chat Completions API.
    ///
    /// Returns `None` when JSON mode is off.
    pub fn to_response_format(&self) -> crate::Result<Option<serde_json::Value>> {
        match self.mode {
            JsonMode::Off => Ok(None),
            JsonMode::Json => Ok(Some(serde_json::json!({ "type": self.mode.as_str() }))),
            JsonMode::JsonSchema => {
                let schema = self.schema.as_ref().ok_or_else(|| {
                    Error::configuration_with_context(
                        "json_schema mode requires a schema",
                        ErrorContext::new().with_field_path("response_format.json_schema.schema"),
                    )
                })?;
                Ok(Some(serde_json::json!({
                    "type": self.mode.as_str(),
                    "json_schema": {
                        "name": self.schema_name,
                        "strict": self.strict,
                        "schema": schema
                    }
                })))
            }
        }
    }
}

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("valid regex"));
static EMBEDDED_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid regex"));

/// Structured output result with validation.
#[derive(Debug, Clone)]
pub struct StructuredOutput {
    /// Raw response content as string
    pub raw: String,

    /// Parsed JSON data (None if parsing failed)
    pub parsed: Option<serde_json::Value>,

    pub validation_result: ValidationResult,
}

impl StructuredOutput {
    /// Parse and validate raw model output.
    ///
    /// Unparseable content yields an invalid result.
    pub fn from_response(content: impl Into<String>, validator: &OutputValidator) -> Self {
        let raw = content.into();
        let parsed = Self::parse_json(raw.trim());
        let validation_result = match &parsed {
            Some(value) => validator.validate(value),
            None => ValidationError::without_path("response is not valid JSON").into(),
        };
        Self {
            raw,
            parsed,
            validation_result,
        }
    }

    /// Parse JSON from text, with support for markdown code blocks.
    fn parse_json(text: &str) -> Option<serde_json::Value> {
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(text) {
            return Some(parsed);
        }

        if let Some(inner) = FENCED_JSON.captures(text).and_then(|c| c.get(1)) {
            if let Ok(parsed) = serde_json::from_str(inner.as_str().trim()) {
                return Some(parsed);
            }
        }

        EMBEDDED_OBJECT
            .find(text)
            .and_then(|m| serde_json::from_str(m.as_str()).ok())
    }

    pub fn is_valid(&self) -> bool {
        self.validation_result.is_valid()
    }

    pub fn parsed(&self) -> Option<&serde_json::Value> {
        self.parsed.as_ref()
    }

    /// Deserialize the validated data into `T`.
    pub fn into_typed<T: serde::de::DeserializeOwned>(self) -> crate::Result<T> {
        let data = self.validation_result.into_result().map_err(|errors| Error::Structured {
            message: "model response does not match the requested schema".to_string(),
            errors,
        })?;
        Ok(serde_json::from_value(data)?)
    }
}
