use serde_json::Value;

use crate::error::PosError;

/// What a non-success response body says, if anything readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyMessage {
    /// A single message: a bare string, `detail`, `message` or `error`.
    Plain(String),
    /// Field validation errors rendered as `field: msg, msg; field: msg`,
    /// fields in the order the server sent them.
    Fields(String),
}

/// Decode a DRF-style error body.
pub fn describe_body(body: &Value) -> Option<BodyMessage> {
    match body {
        Value::String(s) if !s.trim().is_empty() => Some(BodyMessage::Plain(s.clone())),
        Value::Array(items) if !items.is_empty() => Some(BodyMessage::Plain(join_messages(items))),
        Value::Object(map) => {
            for key in ["detail", "message", "error"] {
                if let Some(value) = map.get(key) {
                    return Some(BodyMessage::Plain(value_text(value)));
                }
            }
            if map.is_empty() {
                return None;
            }
            let fields: Vec<String> = map
                .iter()
                .map(|(field, messages)| {
                    let text = match messages {
                        Value::Array(items) => join_messages(items),
                        other => value_text(other),
                    };
                    format!("{}: {}", field, text)
                })
                .collect();
            Some(BodyMessage::Fields(fields.join("; ")))
        }
        _ => None,
    }
}

fn join_messages(items: &[Value]) -> String {
    items.iter().map(value_text).collect::<Vec<_>>().join(", ")
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Map a failed response to the error taxonomy.
///
/// 401 is always an auth error; field maps on 4xx are server validation
/// errors; everything else keeps the status and the decoded message.
pub fn error_from_response(status: u16, body: &str) -> PosError {
    let decoded = match serde_json::from_str::<Value>(body) {
        Ok(value) => describe_body(&value),
        Err(_) => {
            let text = body.trim();
            (!text.is_empty() && !text.starts_with('<'))
                .then(|| BodyMessage::Plain(text.to_string()))
        }
    };

    if status == 401 {
        let message = match decoded {
            Some(BodyMessage::Plain(m)) | Some(BodyMessage::Fields(m)) => m,
            None => "Authentication required".to_string(),
        };
        return PosError::Auth(message);
    }

    match decoded {
        Some(BodyMessage::Fields(message)) if (400..500).contains(&status) => {
            PosError::ServerValidation(message)
        }
        Some(BodyMessage::Plain(message)) | Some(BodyMessage::Fields(message)) => {
            PosError::Http { status, message }
        }
        None => PosError::Http {
            status,
            message: String::new(),
        },
    }
}
