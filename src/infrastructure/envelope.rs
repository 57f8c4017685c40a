//! Validated parsing of the `{ success, data, error, warnings }` envelope
//! every endpoint replies with. Anything that does not fit becomes
//! [`ApiError::Shape`] here instead of leaking half-parsed values upward.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::list::Pagination;
use crate::errors::ApiError;

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    warnings: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub data: T,
    pub warnings: Vec<String>,
}

/// Checks `success` and returns the raw `data` (null when absent).
pub fn open(body: Value) -> Result<Parsed<Value>, ApiError> {
    if !body.is_object() {
        return Err(ApiError::Shape(format!("expected a JSON object, got {}", kind_of(&body))));
    }
    let mut messages = error_messages(&body);
    let envelope: Envelope = serde_json::from_value(body)
        .map_err(|e| ApiError::Shape(format!("invalid response envelope: {e}")))?;
    if !envelope.success {
        if messages.is_empty() {
            messages.push("The request was not successful".to_string());
        }
        return Err(ApiError::Domain(messages));
    }
    Ok(Parsed {
        data: envelope.data.unwrap_or(Value::Null),
        warnings: envelope.warnings.iter().map(warning_text).collect(),
    })
}

/// Parses `data` as `T`.
pub fn parse_data<T: DeserializeOwned>(body: Value) -> Result<Parsed<T>, ApiError> {
    let Parsed { data, warnings } = open(body)?;
    if data.is_null() {
        return Err(ApiError::Shape("response has no data".to_string()));
    }
    let data = serde_json::from_value(data)?;
    Ok(Parsed { data, warnings })
}

/// Parses `data.<key>` as `T`, falling back to `data` itself when the key is
/// absent.
pub fn parse_keyed<T: DeserializeOwned>(body: Value, key: &str) -> Result<Parsed<T>, ApiError> {
    let Parsed { data, warnings } = open(body)?;
    let inner = match data {
        Value::Object(mut map) if map.contains_key(key) => map.remove(key).unwrap_or(Value::Null),
        Value::Null => return Err(ApiError::Shape("response has no data".to_string())),
        other => other,
    };
    let data = serde_json::from_value(inner)
        .map_err(|e| ApiError::Shape(format!("invalid `{key}` payload: {e}")))?;
    Ok(Parsed { data, warnings })
}

/// Parses a paginated list: `data.<collection>` plus `data.pagination`.
pub fn parse_list<T: DeserializeOwned>(
    body: Value,
    collection: &str,
) -> Result<(Vec<T>, Pagination), ApiError> {
    let Parsed { data, .. } = open(body)?;
    let Value::Object(mut map) = data else {
        return Err(ApiError::Shape(format!(
            "expected `data` to be an object, got {}",
            kind_of(&data)
        )));
    };
    let items = map
        .remove(collection)
        .ok_or_else(|| ApiError::Shape(format!("missing `data.{collection}`")))?;
    let items: Vec<T> = serde_json::from_value(items)
        .map_err(|e| ApiError::Shape(format!("invalid `{collection}` item: {e}")))?;
    let mut pagination: Pagination = match map.remove("pagination") {
        Some(p) => serde_json::from_value(p)
            .map_err(|e| ApiError::Shape(format!("invalid pagination: {e}")))?,
        None => {
            return Err(ApiError::Shape("missing `data.pagination`".to_string()));
        }
    };
    // pages are 1-based
    pagination.page = pagination.page.max(1);
    pagination.limit = pagination.limit.max(1);
    Ok((items, pagination))
}

/// Messages from an error body: every entry of `errors` (a string or an
/// object with `msg`), else `error` or `error.message`, else `message`.
/// Blank entries are dropped.
pub fn error_messages(body: &Value) -> Vec<String> {
    let text = |v: &Value| v.as_str().map(str::trim).filter(|s| !s.is_empty()).map(String::from);
    let listed: Vec<String> = body
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| text(e).or_else(|| e.get("msg").and_then(text)))
                .collect()
        })
        .unwrap_or_default();
    if !listed.is_empty() {
        return listed;
    }
    body.get("error")
        .and_then(|e| text(e).or_else(|| e.get("message").and_then(text)))
        .or_else(|| body.get("message").and_then(text))
        .into_iter()
        .collect()
}

fn warning_text(warning: &Value) -> String {
    match warning {
        Value::String(s) => s.clone(),
        other => other
            .get("message")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| other.to_string()),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: String,
    }

    #[test]
    fn unsuccessful_reply_is_a_domain_error() {
        let err = open(json!({ "success": false, "error": "Slot already booked" }))
            .expect_err("domain error");
        assert_eq!(err.messages(), vec!["Slot already booked".to_string()]);
        assert_eq!(err.kind(), crate::errors::ErrorKind::Domain);
    }

    #[test]
    fn unsuccessful_reply_keeps_every_listed_error() {
        let err = open(json!({
            "success": false,
            "message": "Checkout failed",
            "errors": ["Vehicle camry is sold", { "msg": "Slot 10:00 is taken" }]
        }))
        .expect_err("domain error");
        assert_eq!(
            err.messages(),
            vec![
                "Vehicle camry is sold".to_string(),
                "Slot 10:00 is taken".to_string()
            ]
        );
    }

    #[test]
    fn unsuccessful_reply_without_message_gets_a_default() {
        let err = open(json!({ "success": false })).expect_err("domain error");
        assert_eq!(err.to_string(), "The request was not successful");
    }

    #[test]
    fn missing_success_flag_is_a_shape_error() {
        let err = open(json!({ "data": [] })).expect_err("shape error");
        assert!(matches!(err, ApiError::Shape(_)));
    }

    #[test]
    fn non_object_body_is_a_shape_error() {
        let err = open(json!([1, 2, 3])).expect_err("shape error");
        assert_eq!(
            err.to_string(),
            "Unexpected response: expected a JSON object, got an array"
        );
    }

    #[test]
    fn list_requires_collection_and_pagination() {
        let (items, pagination) = parse_list::<Item>(
            json!({
                "success": true,
                "data": {
                    "leads": [{ "id": "a" }, { "id": "b" }],
                    "pagination": { "page": 2, "limit": 2, "total": 7, "totalPages": 4 }
                }
            }),
            "leads",
        )
        .expect("list");
        assert_eq!(items.len(), 2);
        assert_eq!(pagination.page, 2);
        assert_eq!(pagination.total_pages, 4);

        let err = parse_list::<Item>(
            json!({ "success": true, "data": { "vehicles": [] , "pagination": {} } }),
            "leads",
        )
        .expect_err("wrong collection");
        assert_eq!(err.to_string(), "Unexpected response: missing `data.leads`");
    }

    #[test]
    fn zero_page_is_read_as_the_first() {
        let (_, pagination) = parse_list::<Item>(
            json!({
                "success": true,
                "data": {
                    "leads": [],
                    "pagination": { "page": 0, "limit": 0, "total": 0, "totalPages": 0 }
                }
            }),
            "leads",
        )
        .expect("list");
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, 1);
        assert_eq!(pagination.total, 0);
    }

    #[test]
    fn keyed_payload_falls_back_to_data() {
        let wrapped: Parsed<Item> =
            parse_keyed(json!({ "success": true, "data": { "lead": { "id": "x" } } }), "lead")
                .expect("wrapped");
        let flat: Parsed<Item> =
            parse_keyed(json!({ "success": true, "data": { "id": "x" } }), "lead").expect("flat");
        assert_eq!(wrapped.data, flat.data);
    }

    #[test]
    fn warnings_accept_strings_and_objects() {
        let parsed = open(json!({
            "success": true,
            "data": {},
            "warnings": ["Dealer closed on Sundays", { "message": "Vehicle on hold" }]
        }))
        .expect("parsed");
        assert_eq!(
            parsed.warnings,
            vec![
                "Dealer closed on Sundays".to_string(),
                "Vehicle on hold".to_string()
            ]
        );
    }

    #[test]
    fn error_message_sources() {
        assert_eq!(
            error_messages(&json!({ "message": "Unauthorized" })),
            vec!["Unauthorized".to_string()]
        );
        assert_eq!(
            error_messages(&json!({ "error": { "message": "Token expired" } })),
            vec!["Token expired".to_string()]
        );
        assert_eq!(
            error_messages(&json!({ "errors": [{ "msg": "Invalid email" }, "  ", { "msg": "Weak password" }] })),
            vec!["Invalid email".to_string(), "Weak password".to_string()]
        );
        assert!(error_messages(&json!({ "error": "  " })).is_empty());
    }
}
