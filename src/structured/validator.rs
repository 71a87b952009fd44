//! Output validator for structured responses, backed by `jsonschema`.

use crate::structured::error::{ValidationError, ValidationResult};
use crate::{Error, ErrorContext};
use jsonschema::JSONSchema;
use serde_json::Value;

/// Validator compiled once from a JSON schema.
pub struct OutputValidator {
    compiled: JSONSchema,
}

impl OutputValidator {
    /// Compile a validator for `schema`.
    pub fn new(schema: Value) -> crate::Result<Self> {
        let compiled = JSONSchema::compile(&schema).map_err(|e| {
            Error::validation_with_context(
                format!("invalid JSON schema: {}", e),
                ErrorContext::new()
                    .with_field_path(e.schema_path.to_string())
                    .with_source("output_validator"),
            )
        })?;
        Ok(Self { compiled })
    }

    /// Validate data against the schema.
    pub fn validate(&self, data: &Value) -> ValidationResult {
        match self.compiled.validate(data) {
            Ok(()) => ValidationResult::success(data.clone()),
            Err(errors) => ValidationResult::failure(
                errors
                    .map(|e| ValidationError::with_path(e.to_string(), e.instance_path.to_string()))
                    .collect(),
            ),
        }
    }
}

impl std::fmt::Debug for OutputValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputValidator").finish_non_exhaustive()
    }
}
