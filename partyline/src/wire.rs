//! The JSON wire protocol spoken over each client's WebSocket. Event names
//! and field spellings are shared with the browser clients, so they are
//! pinned by tests below.

use serde::{Deserialize, Serialize};

use crate::conversation::Message;

/// A client's self-reported role on the line. Transmitted as a string enum
/// for the benefit of the existing clients.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "0")]
    Newcomer,
    #[serde(rename = "1")]
    Local,
    #[serde(rename = "2")]
    Admin,
}

/// Everything a client can ask of the exchange. A connection closing is the
/// disconnect signal; it has no frame of its own.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientRequest {
    /// Ring the physical bell.
    Ring,
    /// Relay a chat message to everyone else on the line.
    SendMessage { content: String },
    /// Clear the shared conversation for everyone.
    ResetConversation,
    /// Self-report a role, which selects which events this client sees.
    SetRole { role: Role },
    /// Leave the newcomer/local pairing; the role returns to unset.
    StopPairing,
}

/// Everything the exchange pushes to clients.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// A digit was dialed on the rotary dial.
    Dial { digit: u8 },
    /// The handset was picked up (`isUp == true`) or put back down.
    Receiver { is_up: bool },
    /// Another client said something.
    ReceiveMessage { message: Message },
    /// The full conversation, sent on connect and after a reset.
    UpdateConversation { messages: Vec<Message> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_parse_by_tag() {
        let parsed: ClientRequest = serde_json::from_str(r#"{"type":"ring"}"#).unwrap();
        assert_eq!(parsed, ClientRequest::Ring);

        let parsed: ClientRequest =
            serde_json::from_str(r#"{"type":"send-message","content":"hello?"}"#).unwrap();
        assert_eq!(
            parsed,
            ClientRequest::SendMessage {
                content: "hello?".to_owned()
            }
        );

        let parsed: ClientRequest =
            serde_json::from_str(r#"{"type":"set-role","role":"2"}"#).unwrap();
        assert_eq!(parsed, ClientRequest::SetRole { role: Role::Admin });
    }

    #[test]
    fn malformed_requests_are_rejected() {
        assert!(serde_json::from_str::<ClientRequest>(r#"{"type":"set-role","role":"9"}"#).is_err());
        assert!(serde_json::from_str::<ClientRequest>(r#"{"type":"send-message"}"#).is_err());
        assert!(serde_json::from_str::<ClientRequest>(r#"{"content":"untyped"}"#).is_err());
    }

    #[test]
    fn events_keep_their_wire_spelling() {
        let event = ServerEvent::Dial { digit: 0 };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"type":"dial","digit":0}"#
        );

        let event = ServerEvent::Receiver { is_up: true };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"type":"receiver","isUp":true}"#
        );

        let event = ServerEvent::UpdateConversation {
            messages: Vec::new(),
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"type":"update-conversation","messages":[]}"#
        );
    }

    #[test]
    fn roles_travel_as_digit_strings() {
        assert_eq!(serde_json::to_string(&Role::Newcomer).unwrap(), r#""0""#);
        assert_eq!(serde_json::to_string(&Role::Local).unwrap(), r#""1""#);
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""2""#);
    }
}
