use serde::Serialize;
pub(crate) mod event_controller;
pub(crate) mod health_check_controller;

/// Acknowledgment body returned by the ingress endpoint and by every rejection.
#[derive(Debug, Serialize)]
pub struct Ack {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_ok_ack() {
        let serialized = serde_json::to_string(&Ack::ok()).unwrap();
        assert_eq!(serialized, json!({"ok": true}).to_string());
    }

    #[test]
    fn test_serialize_error_ack() {
        let serialized = serde_json::to_value(Ack::error("Unauthorized")).unwrap();
        assert_eq!(serialized, json!({"ok": false, "error": "Unauthorized"}));
    }
}
