//! Session event channel contract
//!
//! Every frame on the session socket is an envelope
//! `{"event_type": "<tag>", "event_body": <payload or null>}`.
//!
//! - Inbound frames decode into [`ServerEvent`]; tags this client does not
//!   know decode to [`ServerEvent::Unknown`] rather than failing.
//! - The only outbound frame is the [`ClientEvent::JoinSession`] subscription.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use scryer_domain::{
    ClientId, PlayerInput, PlayerMessage, Role, RollRequest, SessionId, DUNGEON_MASTER_NAME,
};

/// Wire tags of the session channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RequestRoll,
    ReceiveRoll,
    ReceiveMessage,
    /// Older servers deliver DM secrets under their own tag
    ReceiveSecret,
    ReceiveOrderUpdate,
    #[serde(rename = "receive_client_uuid")]
    ReceiveClientId,
    EndSession,
    JoinSession,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestRoll => "request_roll",
            Self::ReceiveRoll => "receive_roll",
            Self::ReceiveMessage => "receive_message",
            Self::ReceiveSecret => "receive_secret",
            Self::ReceiveOrderUpdate => "receive_order_update",
            Self::ReceiveClientId => "receive_client_uuid",
            Self::EndSession => "end_session",
            Self::JoinSession => "join_session",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = EventDecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "request_roll" => Self::RequestRoll,
            "receive_roll" => Self::ReceiveRoll,
            "receive_message" => Self::ReceiveMessage,
            "receive_secret" => Self::ReceiveSecret,
            "receive_order_update" => Self::ReceiveOrderUpdate,
            "receive_client_uuid" => Self::ReceiveClientId,
            "end_session" => Self::EndSession,
            "join_session" => Self::JoinSession,
            other => return Err(EventDecodeError::UnknownTag(other.to_string())),
        })
    }
}

/// Raw frame as it travels on the socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_type: String,
    #[serde(default)]
    pub event_body: Option<Value>,
}

#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("malformed event frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown event type '{0}'")]
    UnknownTag(String),

    #[error("event '{event_type}' requires a body")]
    MissingBody { event_type: EventType },

    #[error("invalid body for event '{event_type}': {source}")]
    InvalidBody {
        event_type: EventType,
        #[source]
        source: serde_json::Error,
    },
}

/// `{client_uuid}` body assigning a connection its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdBody {
    pub client_uuid: ClientId,
}

/// Body of the legacy secret tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SecretBody {
    secret: String,
    client_uuids: Vec<ClientId>,
}

/// Inbound events, one variant per payload shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// The DM asks the addressed players to roll
    RequestRoll(RollRequest),
    /// A player answered a roll request; the body is informational only
    ReceiveRoll(Option<PlayerInput>),
    /// Someone changed the creatures; refetch order and roster
    ReceiveOrderUpdate,
    ReceiveMessage(PlayerMessage),
    /// The server assigned this connection an id
    ReceiveClientId(ClientId),
    EndSession,
    /// Handshake nudge: reply with a [`ClientEvent::JoinSession`]
    JoinSession,
    /// A tag this client does not handle
    Unknown(String),
}

impl ServerEvent {
    /// Decode one text frame.
    pub fn decode(text: &str) -> Result<Self, EventDecodeError> {
        let envelope: EventEnvelope = serde_json::from_str(text)?;
        Self::try_from(envelope)
    }

    /// Encode as a text frame, the way the session server broadcasts it.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_envelope()?)
    }

    pub fn event_type(&self) -> Option<EventType> {
        Some(match self {
            Self::RequestRoll(_) => EventType::RequestRoll,
            Self::ReceiveRoll(_) => EventType::ReceiveRoll,
            Self::ReceiveOrderUpdate => EventType::ReceiveOrderUpdate,
            Self::ReceiveMessage(_) => EventType::ReceiveMessage,
            Self::ReceiveClientId(_) => EventType::ReceiveClientId,
            Self::EndSession => EventType::EndSession,
            Self::JoinSession => EventType::JoinSession,
            Self::Unknown(_) => return None,
        })
    }

    pub fn to_envelope(&self) -> Result<EventEnvelope, serde_json::Error> {
        let body = match self {
            Self::RequestRoll(request) => Some(serde_json::to_value(request)?),
            Self::ReceiveRoll(input) => input.as_ref().map(serde_json::to_value).transpose()?,
            Self::ReceiveMessage(message) => Some(serde_json::to_value(message)?),
            Self::ReceiveClientId(client_uuid) => Some(serde_json::to_value(ClientIdBody {
                client_uuid: *client_uuid,
            })?),
            Self::ReceiveOrderUpdate | Self::EndSession | Self::JoinSession | Self::Unknown(_) => {
                None
            }
        };
        let event_type = match self {
            Self::Unknown(tag) => tag.clone(),
            other => other
                .event_type()
                .map(|t| t.as_str().to_string())
                .unwrap_or_default(),
        };
        Ok(EventEnvelope {
            event_type,
            event_body: body,
        })
    }
}

fn required_body<T: serde::de::DeserializeOwned>(
    event_type: EventType,
    body: Option<Value>,
) -> Result<T, EventDecodeError> {
    match body {
        None | Some(Value::Null) => Err(EventDecodeError::MissingBody { event_type }),
        Some(value) => serde_json::from_value(value)
            .map_err(|source| EventDecodeError::InvalidBody { event_type, source }),
    }
}

impl TryFrom<EventEnvelope> for ServerEvent {
    type Error = EventDecodeError;

    fn try_from(envelope: EventEnvelope) -> Result<Self, Self::Error> {
        let event_type = match envelope.event_type.parse::<EventType>() {
            Ok(event_type) => event_type,
            Err(EventDecodeError::UnknownTag(tag)) => return Ok(Self::Unknown(tag)),
            Err(other) => return Err(other),
        };
        let body = envelope.event_body;

        Ok(match event_type {
            EventType::RequestRoll => Self::RequestRoll(required_body(event_type, body)?),
            EventType::ReceiveRoll => {
                // Servers differ in what they attach here; the body is never needed.
                Self::ReceiveRoll(body.and_then(|value| serde_json::from_value(value).ok()))
            }
            EventType::ReceiveMessage => Self::ReceiveMessage(required_body(event_type, body)?),
            EventType::ReceiveSecret => {
                let secret: SecretBody = required_body(event_type, body)?;
                Self::ReceiveMessage(PlayerMessage::new(
                    DUNGEON_MASTER_NAME,
                    secret.secret,
                    secret.client_uuids,
                ))
            }
            EventType::ReceiveOrderUpdate => Self::ReceiveOrderUpdate,
            EventType::ReceiveClientId => {
                let assigned: ClientIdBody = required_body(event_type, body)?;
                Self::ReceiveClientId(assigned.client_uuid)
            }
            EventType::EndSession => Self::EndSession,
            EventType::JoinSession => Self::JoinSession,
        })
    }
}

/// Identity sent in reply to the join nudge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSessionBody {
    pub session_uuid: SessionId,
    pub role: Role,
    pub name: String,
    /// Nil when the client has not been assigned an id yet
    pub client_uuid: ClientId,
}

/// Outbound events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", content = "event_body", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinSession(JoinSessionBody),
}

impl ClientEvent {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
