use crate::auth::{AuthResult, AuthTokens};
use crate::error::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Wire tag of a sign-in request sent by the embedded page
pub const AUTH_REQUEST_TYPE: &str = "GOOGLE_AUTH_REQUEST";

/// Wire tag of the sign-in result sent back into the embedded page
pub const AUTH_RESPONSE_TYPE: &str = "GOOGLE_AUTH_RESPONSE";

/// A message exchanged between the embedding screen and the embedded page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum BridgeMessage {
    /// Page asks the host to sign the user in
    #[serde(rename = "GOOGLE_AUTH_REQUEST")]
    AuthRequest,

    /// Host reports the sign-in outcome
    #[serde(rename = "GOOGLE_AUTH_RESPONSE")]
    AuthResponse { success: bool, data: AuthPayload },
}

/// Payload of an [`BridgeMessage::AuthResponse`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AuthPayload {
    Failure { error: String },
    Tokens(AuthTokens),
}

/// A message as it arrives from a content surface, before validation
#[derive(Debug, Clone, PartialEq)]
pub enum RawMessage {
    /// JSON-serialized envelope (native substrate)
    Text(String),
    /// Structured envelope (frame substrate)
    Object(Value),
}

/// Why an inbound message could not be turned into a [`BridgeMessage`]
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("message is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("message has no string 'type' field")]
    MissingType,

    #[error("unrecognized message type '{0}'")]
    UnknownType(String),
}

impl BridgeMessage {
    /// Build the response relayed after a sign-in attempt
    pub fn auth_response(result: AuthResult) -> Self {
        match result {
            Ok(tokens) => BridgeMessage::AuthResponse {
                success: true,
                data: AuthPayload::Tokens(tokens),
            },
            Err(err) => BridgeMessage::AuthResponse {
                success: false,
                data: AuthPayload::Failure { error: err.to_string() },
            },
        }
    }

    /// Wire tag of this message
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeMessage::AuthRequest => AUTH_REQUEST_TYPE,
            BridgeMessage::AuthResponse { .. } => AUTH_RESPONSE_TYPE,
        }
    }

    /// Decode an inbound envelope, validating the `type` field first
    pub fn decode(raw: RawMessage) -> std::result::Result<Self, DecodeError> {
        let value = match raw {
            RawMessage::Text(text) => serde_json::from_str(&text)?,
            // Some pages stringify even on the object substrate
            RawMessage::Object(Value::String(text)) => serde_json::from_str(&text)?,
            RawMessage::Object(value) => value,
        };

        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingType)?;

        match tag {
            AUTH_REQUEST_TYPE | AUTH_RESPONSE_TYPE => Ok(serde_json::from_value(value)?),
            other => Err(DecodeError::UnknownType(other.to_string())),
        }
    }

    /// Encode as a JSON string
    pub fn to_text(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Encode as a structured object
    pub fn to_object(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// JSON Schema describing the message envelope, for page authors
pub fn envelope_schema() -> schemars::Schema {
    schemars::schema_for!(BridgeMessage)
}
