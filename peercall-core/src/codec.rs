//! Text codec for [`SignalingMessage`].
//!
//! The wire form is a flat JSON object:
//!
//! ```text
//! {"MessageType":3,"Data":"candidate:...|0|audio","TargetId":"bob","IceDataSeparator":"|"}
//! ```
//!
//! The Ice separator travels with each message so that peers running an older
//! build can still split payloads produced with a different separator.

use crate::model::{IceCandidate, MessageType, PeerId, SignalingMessage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("payload is not a valid signaling message: {0}")]
    Json(String),

    #[error("unknown message type tag {0}")]
    UnknownMessageType(u8),

    #[error("ice message without a separator")]
    MissingSeparator,

    #[error("ice separator {0:?} is not a single character")]
    InvalidSeparator(String),

    #[error("ice payload has {found} fields, expected 3")]
    IceArity { found: usize },

    #[error("ice payload field {index} is empty")]
    EmptyIceField { index: usize },

    #[error("invalid sdp media-line index {0:?}")]
    InvalidLineIndex(String),

    #[error("{0:?} message does not carry an ice candidate")]
    NotIce(MessageType),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("failed to serialize signaling message: {0}")]
    Json(String),

    #[error("ice separator must not be empty")]
    EmptySeparator,

    #[error("ice separator {0:?} is not a single character")]
    InvalidSeparator(String),

    #[error("ice candidate fields must not be empty")]
    EmptyIceField,

    #[error("ice payload has {found} fields, expected 3")]
    IceArity { found: usize },

    #[error("invalid sdp media-line index {0:?}")]
    InvalidLineIndex(String),

    #[error("ice payload does not split: {0}")]
    InvalidIce(DecodeError),

    #[error("ice field contains the separator {separator:?}")]
    SeparatorInField { separator: String },

    #[error("ice message without a separator")]
    MissingSeparator,

    #[error("{0:?} message must not carry an ice separator")]
    UnexpectedSeparator(MessageType),
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct WireOut<'a> {
    message_type: u8,
    data: &'a str,
    target_id: &'a str,
    #[serde(rename = "IceDataSeparator", skip_serializing_if = "Option::is_none")]
    ice_separator: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireIn {
    message_type: u8,
    #[serde(default)]
    data: String,
    #[serde(default)]
    target_id: String,
    #[serde(rename = "IceDataSeparator", default)]
    ice_separator: Option<String>,
}

/// Serializes a message. Ice messages are validated first so that every
/// encoded payload decodes again.
pub fn encode(message: &SignalingMessage) -> Result<String, EncodeError> {
    match (message.message_type, message.ice_separator.as_deref()) {
        (MessageType::Ice, None) => return Err(EncodeError::MissingSeparator),
        (MessageType::Ice, Some(separator)) => {
            IceCandidate::split(&message.data, separator).map_err(|e| match e {
                DecodeError::MissingSeparator => EncodeError::EmptySeparator,
                DecodeError::InvalidSeparator(separator) => EncodeError::InvalidSeparator(separator),
                DecodeError::IceArity { found } => EncodeError::IceArity { found },
                DecodeError::EmptyIceField { .. } => EncodeError::EmptyIceField,
                DecodeError::InvalidLineIndex(index) => EncodeError::InvalidLineIndex(index),
                other => EncodeError::InvalidIce(other),
            })?;
        }
        (other, Some(_)) => return Err(EncodeError::UnexpectedSeparator(other)),
        (_, None) => {}
    }

    let wire = WireOut {
        message_type: message.message_type.tag(),
        data: &message.data,
        target_id: message.target_id.as_str(),
        ice_separator: message.ice_separator.as_deref(),
    };

    serde_json::to_string(&wire).map_err(|e| EncodeError::Json(e.to_string()))
}

/// Parses a message. Ice payloads must split into exactly three non-empty
/// fields; a separator attached to any other message type is discarded.
pub fn decode(text: &str) -> Result<SignalingMessage, DecodeError> {
    let wire: WireIn = serde_json::from_str(text).map_err(|e| DecodeError::Json(e.to_string()))?;

    let message_type = MessageType::from_tag(wire.message_type)
        .ok_or(DecodeError::UnknownMessageType(wire.message_type))?;

    let ice_separator = match message_type {
        MessageType::Ice => {
            let separator = wire
                .ice_separator
                .filter(|s| !s.is_empty())
                .ok_or(DecodeError::MissingSeparator)?;
            IceCandidate::split(&wire.data, &separator)?;
            Some(separator)
        }
        _ => None,
    };

    Ok(SignalingMessage {
        message_type,
        data: wire.data,
        target_id: PeerId(wire.target_id),
        ice_separator,
    })
}
