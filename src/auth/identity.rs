//! Identity claims returned by the authority.

use serde_json::Value;

/// Keys accepted for the subject, in lookup order.
const SUBJECT_KEYS: &[&str] = &["subject", "sub", "email"];

/// Verified identity for the duration of one inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityClaim {
    pub subject_id: String,
    pub role: String,
    /// The authority's full response body, untouched.
    pub raw: Value,
}

impl IdentityClaim {
    /// Decode an authority response body.
    ///
    /// The body must be a JSON object with a `role` string and a subject
    /// under `subject` (or `sub` / `email`), either a string or a number.
    pub fn from_value(raw: Value) -> Result<Self, String> {
        let object = raw
            .as_object()
            .ok_or_else(|| "identity claim is not a JSON object".to_string())?;

        let subject_id = SUBJECT_KEYS
            .iter()
            .find_map(|key| match object.get(*key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| "identity claim has no subject".to_string())?;

        let role = object
            .get("role")
            .and_then(Value::as_str)
            .ok_or_else(|| "identity claim has no role".to_string())?
            .to_string();

        Ok(Self {
            subject_id,
            role,
            raw,
        })
    }
}
