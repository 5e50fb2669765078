use serde::{Deserialize, Serialize};

/// Message exchanged with the chat page over the WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    UserInput { text: String },
    Response { text: String },
    Error { text: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_input_wire_format() {
        let parsed: Envelope =
            serde_json::from_str(r#"{"type":"user_input","text":"book for tomorrow"}"#).unwrap();
        assert_eq!(
            parsed,
            Envelope::UserInput {
                text: "book for tomorrow".to_string()
            }
        );
    }

    #[test]
    fn test_response_wire_format() {
        let json = serde_json::to_value(Envelope::Response {
            text: "hello".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type": "response", "text": "hello"}));
    }
}
