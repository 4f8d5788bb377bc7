//! Request payload extraction
//!
//! POST bodies arrive as JSON or as urlencoded forms. Both become a JSON
//! object for the validator; form values are always strings. An empty body
//! is an empty object, so a bare POST reports its missing fields.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Form,
};
use serde_json::{json, Map, Value};

use crate::api::ErrorSignal;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A request body as a JSON object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = ErrorSignal;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map_or(false, |value| value.starts_with(FORM_CONTENT_TYPE));

        if is_form {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|rejection| rejected(rejection.status(), rejection.body_text()))?;

            let fields = pairs
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();
            return Ok(Payload(fields));
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| rejected(rejection.status(), rejection.body_text()))?;

        parse_json_object(&body).map(Payload)
    }
}

/// Body rejections keep the status axum chose (413 for oversized bodies)
fn rejected(status: StatusCode, message: String) -> ErrorSignal {
    ErrorSignal::new(status.as_u16(), message)
}

/// Parse a raw body into a JSON object
pub fn parse_json_object(body: &[u8]) -> Result<Map<String, Value>, ErrorSignal> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(ErrorSignal::bad_request("Request body must be a JSON object")),
        Err(e) => Err(ErrorSignal::bad_request("Malformed JSON body")
            .with_details(json!({ "reason": e.to_string() }))),
    }
}
