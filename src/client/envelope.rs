// Response shapes of the SR backend.
//
// List endpoints answer with either a bare array or an envelope such as
// {"success": true, "data": [...]} or {"data": {"list": [...]}}.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ClientError;

const LIST_KEYS: &[&str] = &["data", "list", "content", "items", "result"];

/// Find the row array inside a list response
pub fn into_rows(value: Value) -> Result<Vec<Value>, ClientError> {
    match value {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut map) => {
            for key in LIST_KEYS {
                if let Some(inner) = map.remove(*key) {
                    if inner.is_array() || inner.is_object() {
                        return into_rows(inner);
                    }
                }
            }
            Err(ClientError::Decode("response does not contain a row list".to_string()))
        }
        Value::Null => Ok(Vec::new()),
        other => Err(ClientError::Decode(format!("expected a row list, got {}", other))),
    }
}

/// Strip a `{"data": {...}}` wrapper around an object response
pub fn into_object(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.get("data").map_or(false, Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Login and refresh responses
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    #[serde(alias = "access_token", alias = "token")]
    pub access_token: String,
    #[serde(default, alias = "refresh_token")]
    pub refresh_token: Option<String>,
    #[serde(default, alias = "expires_in")]
    pub expires_in: Option<i64>,
    #[serde(default, alias = "user_id", alias = "usrId")]
    pub user_id: Option<String>,
    #[serde(default, alias = "authorCode", alias = "role_code")]
    pub role_code: Option<String>,
}

impl TokenResponse {
    pub fn from_value(value: Value) -> Result<Self, ClientError> {
        Ok(serde_json::from_value(into_object(value))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_array() {
        let rows = into_rows(json!([{ "a": 1 }, { "a": 2 }])).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_nested_envelopes() {
        assert_eq!(into_rows(json!({ "success": true, "data": [{}] })).unwrap().len(), 1);
        assert_eq!(into_rows(json!({ "data": { "list": [{}, {}] } })).unwrap().len(), 2);
        assert_eq!(into_rows(json!({ "content": [] })).unwrap().len(), 0);
        assert!(into_rows(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_not_a_list() {
        assert!(into_rows(json!({ "message": "ok" })).is_err());
        assert!(into_rows(json!("text")).is_err());
    }

    #[test]
    fn test_token_response_spellings() {
        let camel = TokenResponse::from_value(json!({
            "data": {
                "accessToken": "a",
                "refreshToken": "r",
                "expiresIn": 3600,
                "authorCode": "ROLE_ADMIN"
            }
        }))
        .unwrap();
        assert_eq!(camel.access_token, "a");
        assert_eq!(camel.refresh_token.as_deref(), Some("r"));
        assert_eq!(camel.expires_in, Some(3600));
        assert_eq!(camel.role_code.as_deref(), Some("ROLE_ADMIN"));

        let snake =
            TokenResponse::from_value(json!({ "access_token": "b", "user_id": "kim" })).unwrap();
        assert_eq!(snake.access_token, "b");
        assert_eq!(snake.user_id.as_deref(), Some("kim"));
        assert!(snake.refresh_token.is_none());
    }
}
