//! Structured output module.
//!
//! Turns a Rust type into a strict JSON schema, asks the model for output in
//! that shape, and validates what comes back:
//! - [`json_schema_from_type`] / [`strict_schema`]: schema generation via `schemars`
//! - [`JsonModeConfig`]: the `response_format` request parameter
//! - [`OutputValidator`]: schema validation via `jsonschema`
//! - [`StructuredOutput`]: parsing and validating the model's reply
//!
//! # Examples
//!
//! ```
//! use ai_enrich::structured::{OutputValidator, StructuredOutput};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {"status": {"type": "string"}},
//!     "required": ["status"]
//! });
//!
//! let validator = OutputValidator::new(schema).unwrap();
//! let output = StructuredOutput::from_response(r#"{"status": "ok"}"#, &validator);
//!
//! assert!(output.is_valid());
//! ```

pub mod error;
pub mod json_mode;
pub mod schema;
pub mod validator;

pub use error::{ValidationError, ValidationResult};
pub use json_mode::{JsonMode, JsonModeConfig, StructuredOutput};
pub use schema::{json_schema_from_type, schema_name_for, strict_schema};
pub use validator::OutputValidator;
