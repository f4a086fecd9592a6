use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Frames a browser sends. Signals are opaque WebRTC payloads and are relayed untouched.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: String },
    #[serde(rename_all = "camelCase")]
    SendingSignal {
        user_to_signal: Uuid,
        caller_id: Uuid,
        signal: Value,
    },
    #[serde(rename_all = "camelCase")]
    ReturningSignal { caller_id: Uuid, signal: Value },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// First frame on every connection: the handle other peers address it by.
    Connected { id: Uuid },
    AllUsers { users: Vec<Uuid> },
    RoomFull,
    #[serde(rename_all = "camelCase")]
    UserJoined { signal: Value, caller_id: Uuid },
    ReceivingReturnedSignal { signal: Value, id: Uuid },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_frames_use_kebab_tags() {
        let m: ClientMessage =
            serde_json::from_value(json!({"type": "join-room", "roomId": "r1"})).unwrap();
        assert_eq!(
            m,
            ClientMessage::JoinRoom {
                room_id: "r1".into()
            }
        );

        let id = Uuid::new_v4();
        let m: ClientMessage = serde_json::from_value(json!({
            "type": "returning-signal",
            "callerId": id,
            "signal": {"sdp": "x"}
        }))
        .unwrap();
        assert!(matches!(m, ClientMessage::ReturningSignal { caller_id, .. } if caller_id == id));
    }

    #[test]
    fn server_frames_serialize() {
        assert_eq!(
            serde_json::to_value(ServerMessage::RoomFull).unwrap(),
            json!({"type": "room-full"})
        );
        let id = Uuid::new_v4();
        let v = serde_json::to_value(ServerMessage::UserJoined {
            signal: json!(1),
            caller_id: id,
        })
        .unwrap();
        assert_eq!(v["type"], "user-joined");
        assert_eq!(v["callerId"], json!(id));
    }
}
