//! Evaluates translated expressions against a stored row, following
//! PostgreSQL semantics for `->`, `->>`, casts and array length.

use super::expr::{FieldType, SqlExpr, SqlValue};
use crate::error::{Error, Result};
use crate::metadata::StoredRow;
use serde_json::Value as JsonValue;

impl SqlExpr {
    pub fn evaluate(&self, row: &StoredRow) -> Result<SqlValue> {
        match self {
            SqlExpr::Column(column) => {
                let text = row.get(&column.name).ok_or_else(|| {
                    Error::Evaluation(format!("Column '{}' not found in row", column.name))
                })?;
                match text {
                    None => Ok(SqlValue::Null),
                    Some(text) if column.mapping.is_json() => parse_json(text).map(SqlValue::Json),
                    Some(text) => Ok(SqlValue::Text(text.clone())),
                }
            }
            SqlExpr::Constant(value) => Ok(value.clone()),
            SqlExpr::JsonTraversal(traversal) => {
                let mut current = match traversal.base.evaluate(row)? {
                    SqlValue::Null => return Ok(SqlValue::Null),
                    SqlValue::Json(value) => value,
                    SqlValue::Text(text) => parse_json(&text)?,
                    other => {
                        return Err(Error::Evaluation(format!(
                            "Cannot traverse non-JSON value {}",
                            other
                        )));
                    }
                };

                for step in &traversal.path {
                    let next = match step.evaluate(row)? {
                        SqlValue::Null => None,
                        SqlValue::Text(key) => current.get(&key).cloned(),
                        SqlValue::Integer(index) if index >= 0 => current.get(index as usize).cloned(),
                        SqlValue::Integer(_) => None,
                        other => {
                            return Err(Error::Evaluation(format!(
                                "JSON path step must be text or integer, found {}",
                                other
                            )));
                        }
                    };
                    match next {
                        Some(value) => current = value,
                        None => return Ok(SqlValue::Null),
                    }
                }

                if !traversal.returns_text {
                    return Ok(SqlValue::Json(current));
                }
                Ok(match current {
                    JsonValue::Null => SqlValue::Null,
                    JsonValue::String(s) => SqlValue::Text(s),
                    other => SqlValue::Text(other.to_string()),
                })
            }
            SqlExpr::Convert {
                operand,
                field_type,
            } => cast(operand.evaluate(row)?, field_type),
            SqlExpr::Function { name, args, .. } => call(name, args, row),
        }
    }
}

fn parse_json(text: &str) -> Result<JsonValue> {
    serde_json::from_str(text).map_err(|e| Error::Evaluation(format!("Invalid JSON: {}", e)))
}

fn cast(value: SqlValue, field_type: &FieldType) -> Result<SqlValue> {
    let invalid = |text: &str| {
        Error::Evaluation(format!(
            "Invalid input syntax for type {}: {:?}",
            field_type.sql_name().unwrap_or("json"),
            text
        ))
    };

    let text = match value {
        SqlValue::Null => return Ok(SqlValue::Null),
        SqlValue::Text(text) => text,
        SqlValue::Json(JsonValue::String(text)) => text,
        SqlValue::Json(other) => other.to_string(),
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Double(d) => d.to_string(),
        SqlValue::Boolean(b) => b.to_string(),
    };
    let trimmed = text.trim();

    match field_type {
        FieldType::Text => Ok(SqlValue::Text(text)),
        FieldType::Integer => trimmed
            .parse::<i32>()
            .map(|i| SqlValue::Integer(i64::from(i)))
            .map_err(|_| invalid(&text)),
        FieldType::BigInt => trimmed
            .parse::<i64>()
            .map(SqlValue::Integer)
            .map_err(|_| invalid(&text)),
        FieldType::Real | FieldType::Double => trimmed
            .parse::<f64>()
            .map(SqlValue::Double)
            .map_err(|_| invalid(&text)),
        FieldType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "t" | "true" | "yes" | "on" | "1" => Ok(SqlValue::Boolean(true)),
            "f" | "false" | "no" | "off" | "0" => Ok(SqlValue::Boolean(false)),
            _ => Err(invalid(&text)),
        },
        FieldType::Document(_) | FieldType::List(_) => parse_json(&text).map(SqlValue::Json),
    }
}

fn call(name: &str, args: &[SqlExpr], row: &StoredRow) -> Result<SqlValue> {
    match name {
        "json_array_length" | "jsonb_array_length" => {
            let [arg] = args else {
                return Err(Error::Evaluation(format!("{} takes one argument", name)));
            };
            match arg.evaluate(row)? {
                SqlValue::Null => Ok(SqlValue::Null),
                SqlValue::Json(JsonValue::Array(items)) => Ok(SqlValue::Integer(items.len() as i64)),
                SqlValue::Text(text) => match parse_json(&text)? {
                    JsonValue::Array(items) => Ok(SqlValue::Integer(items.len() as i64)),
                    _ => Err(Error::Evaluation("Cannot get array length of a non-array".into())),
                },
                _ => Err(Error::Evaluation("Cannot get array length of a non-array".into())),
            }
        }
        other => Err(Error::Evaluation(format!("Unknown function: {}", other))),
    }
}
