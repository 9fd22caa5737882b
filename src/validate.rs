//! Inbound search request validation.
//!
//! Works on the raw JSON body so that every violated field can be reported
//! at once, rather than failing on the first deserialization error.
//!
//! | Field | Rule |
//! |-------|------|
//! | `query` | string, non-empty after trimming |
//! | `slug` | string, non-empty after trimming, only `[a-z0-9_-]` |
//! | `limit` | optional integer in `[1, 100]`, default 20 |
//! | `offset` | optional integer `>= 0`, default 0 |

use serde::Serialize;
use serde_json::Value;

use crate::models::{SearchRequest, DEFAULT_LIMIT, MAX_LIMIT};

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a raw search body into a [`SearchRequest`].
///
/// Every rule is checked independently; on failure all violations are
/// returned together.
pub fn validate_search_request(body: &Value) -> Result<SearchRequest, Vec<FieldError>> {
    let mut errors = Vec::new();

    let query = required_string(body, "query", &mut errors);

    let tenant_id = required_string(body, "slug", &mut errors).and_then(|slug| {
        if is_valid_tenant_id(&slug) {
            Some(slug)
        } else {
            errors.push(FieldError::new(
                "slug",
                "slug may only contain lowercase letters, digits, '_' and '-'",
            ));
            None
        }
    });

    let limit = optional_integer(body, "limit", &mut errors).and_then(|limit| {
        if (1..=i128::from(MAX_LIMIT)).contains(&limit) {
            Some(limit as u32)
        } else {
            errors.push(FieldError::new(
                "limit",
                format!("limit must be an integer between 1 and {}", MAX_LIMIT),
            ));
            None
        }
    });

    let offset = optional_integer(body, "offset", &mut errors).and_then(|offset| {
        if offset < 0 {
            errors.push(FieldError::new(
                "offset",
                "offset must be an integer greater than or equal to 0",
            ));
            return None;
        }
        match u64::try_from(offset) {
            Ok(offset) => Some(offset),
            Err(_) => {
                errors.push(FieldError::new(
                    "offset",
                    format!("offset must not exceed {}", u64::MAX),
                ));
                None
            }
        }
    });

    match (query, tenant_id) {
        (Some(query), Some(tenant_id)) if errors.is_empty() => Ok(SearchRequest {
            query,
            tenant_id,
            limit: limit.unwrap_or(DEFAULT_LIMIT),
            offset: offset.unwrap_or(0),
        }),
        _ => Err(errors),
    }
}

/// Whether `tenant_id` is a non-empty run of `[a-z0-9_-]`.
pub fn is_valid_tenant_id(tenant_id: &str) -> bool {
    !tenant_id.is_empty()
        && tenant_id
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-'))
}

fn required_string(body: &Value, field: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    match body.get(field) {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(field, format!("{} is required", field)));
            None
        }
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                errors.push(FieldError::new(field, format!("{} must not be empty", field)));
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(_) => {
            errors.push(FieldError::new(field, format!("{} must be a string", field)));
            None
        }
    }
}

/// Read an optional integer field. Absent or `null` yields `None` silently;
/// a present but non-integer value records an error.
///
/// Widened to `i128` so every `u64` and every negative `i64` survives
/// parsing and range checks report the right message.
fn optional_integer(body: &Value, field: &str, errors: &mut Vec<FieldError>) -> Option<i128> {
    let value = match body.get(field) {
        None | Some(Value::Null) => return None,
        Some(v) => v,
    };

    match parse_integer(value) {
        Some(n) => Some(n),
        None => {
            errors.push(FieldError::new(field, format!("{} must be an integer", field)));
            None
        }
    }
}

fn parse_integer(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i128::MAX as f64)
                    .map(|f| f as i128)
            }),
        Value::String(s) => s.trim().parse::<i128>().ok(),
        _ => None,
    }
}
