use crate::error::{OrmError, Result};
use crate::schema::RecordSchema;
use crate::value::Value;

/// Result of checking an outgoing row against its record type
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Header names of required columns holding no value.
    pub missing: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Walk `headers` and `row` in lockstep and collect every required column
/// whose cell is blank (`Empty` or the empty string).
///
/// Headers that are not columns of `schema` are ignored. A row shorter than
/// the header list reads as blank past its end.
pub fn check_required(schema: &RecordSchema, headers: &[String], row: &[Value]) -> ValidationResult {
    let missing = headers
        .iter()
        .enumerate()
        .filter(|(_, header)| schema.column(header).is_some_and(|c| c.required))
        .filter(|(i, _)| row.get(*i).map_or(true, Value::is_blank))
        .map(|(_, header)| header.clone())
        .collect();

    ValidationResult { missing }
}

/// Validate a row and turn missing columns into an error naming all of them.
pub fn validate_row(schema: &RecordSchema, headers: &[String], row: &[Value]) -> Result<()> {
    let result = check_required(schema, headers, row);
    if !result.is_ok() {
        return Err(OrmError::Validation {
            record: schema.name().to_string(),
            missing: result.missing,
        });
    }
    Ok(())
}
